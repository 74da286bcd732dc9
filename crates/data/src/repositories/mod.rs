//! Database repositories for the newsflow engine.
//!
//! Every statement binds its values as parameters.

pub mod author_repo;
pub mod executed_trade_repo;
pub mod queued_trade_repo;
pub mod tweet_process_repo;

pub use author_repo::AuthorRepository;
pub use executed_trade_repo::{ExecutedTradeRepository, ExecutedTradeStatistics};
pub use queued_trade_repo::{QueuedTradeRepository, QueuedTradeStatistics};
pub use tweet_process_repo::{Transition, TweetProcessRepository};

use sqlx::PgPool;

/// Creates all repositories from a single database pool.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub authors: AuthorRepository,
    pub tweet_processes: TweetProcessRepository,
    pub queued_trades: QueuedTradeRepository,
    pub executed_trades: ExecutedTradeRepository,
}

impl Repositories {
    /// Creates a new set of repositories from a database pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            authors: AuthorRepository::new(pool.clone()),
            tweet_processes: TweetProcessRepository::new(pool.clone()),
            queued_trades: QueuedTradeRepository::new(pool.clone()),
            executed_trades: ExecutedTradeRepository::new(pool),
        }
    }
}

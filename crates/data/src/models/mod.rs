//! Database models for the newsflow engine.

pub mod author;
pub mod executed_trade;
pub mod queued_trade;
pub mod tweet_process;

pub use author::AuthorRecord;
pub use executed_trade::ExecutedTradeRecord;
pub use queued_trade::QueuedTradeRecord;
pub use tweet_process::{TweetProcessRecord, TweetProcessStatus};

//! Persistence for the newsflow trading engine.
//!
//! This crate provides:
//! - Database client for `PostgreSQL`, with embedded migrations
//! - Models for authors, tweet processes, queued trades and executed trades
//! - Repositories for typed database access

pub mod database;
pub mod models;
pub mod repositories;

pub use database::DatabaseClient;

pub use models::{
    AuthorRecord, ExecutedTradeRecord, QueuedTradeRecord, TweetProcessRecord, TweetProcessStatus,
};

pub use repositories::{
    AuthorRepository, ExecutedTradeRepository, ExecutedTradeStatistics, QueuedTradeRepository,
    QueuedTradeStatistics, Repositories, Transition, TweetProcessRepository,
};

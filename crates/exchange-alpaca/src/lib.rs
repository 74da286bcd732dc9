//! Alpaca brokerage integration for the newsflow trading engine.
//!
//! This crate provides:
//! - [`Brokerage`], the trait the execution engine depends on
//! - [`AlpacaClient`], a rate-limited REST implementation of it
//! - Wire types for quotes, options contracts, orders and positions
//!
//! # API Endpoints
//!
//! Trading endpoint:
//! - `GET /v2/options/contracts` - List options contracts (paginated)
//! - `POST /v2/orders` - Submit order
//! - `GET /v2/orders` - List orders
//! - `GET /v2/positions` - List positions
//! - `DELETE /v2/positions/{symbol}` - Close position
//!
//! Market-data endpoint:
//! - `GET /v2/stocks/{symbol}/quotes/latest`
//! - `GET /v2/stocks/{symbol}/trades/latest`
//! - `GET /v1beta1/options/snapshots`

pub mod broker;
pub mod client;
pub mod error;
pub mod types;

pub use broker::Brokerage;
pub use client::AlpacaClient;
pub use error::{AlpacaError, Result};
pub use types::{
    ContractPage, ContractQuery, OptionContract, OptionSnapshot, Order, OrderQuery, OrderRequest,
    OrderSide, OrderType, Position, Quote, TimeInForce, Trade,
};

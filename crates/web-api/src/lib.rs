//! HTTP surface of the newsflow engine: workflow trigger and callback,
//! dashboard listings, manual orders and brokerage pass-through.

pub mod error;
pub mod handlers;
pub mod server;
pub mod state;
pub mod trigger;
pub mod webhook;

pub use error::{ApiError, ApiResult};
pub use server::ApiServer;
pub use state::AppState;
pub use trigger::{TriggerError, WorkflowTrigger};

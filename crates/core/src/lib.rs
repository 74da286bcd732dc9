pub mod clock;
pub mod config;
pub mod config_loader;
pub mod intent;
pub mod market_clock;
pub mod policy;
pub mod webhook;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    AppConfig, BrokerageConfig, DatabaseConfig, ServerConfig, TradingPolicy, WorkflowConfig,
};
pub use config_loader::ConfigLoader;
pub use intent::{InstrumentKind, OptionRight, TradeAction, TradeIntent};
pub use market_clock::{is_open, trading_date};
pub use policy::{PlanError, TradePlan};
pub use webhook::{decode_workflow_result, WebhookError, WorkflowResult, WorkflowStatus};

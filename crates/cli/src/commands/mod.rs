pub mod add_author;
pub mod market_status;
pub mod migrate;
pub mod serve;

pub use add_author::{run_add_author, AddAuthorArgs};
pub use market_status::{run_market_status, MarketStatusArgs};
pub use migrate::{run_migrate, MigrateArgs};
pub use serve::{run_serve, ServeArgs};

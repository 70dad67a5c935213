pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader};
pub use schema::{
    BrowserConfig, BudgetScope, LoadingConfig, LucentConfig, ResolverConfig, VerificationConfig,
    WaiterConfig,
};

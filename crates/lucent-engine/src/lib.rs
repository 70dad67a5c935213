pub mod cli;
pub mod config;
pub mod driver;
pub mod executor;
pub mod http_judge;
pub mod judge;
pub mod loading;
pub mod parser;
pub mod resolution;
pub mod verifier;
pub mod waiter;

pub use lucent_common::error_mapping;
pub use lucent_common::protocol;
pub use lucent_common::{DriverError, JudgeError, VerifyError};

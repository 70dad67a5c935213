pub mod error;
pub mod error_mapping;
pub mod protocol;

pub use error::{DriverError, JudgeError, VerifyError};
pub use protocol::{
    AccessibleSnapshot, AccessibleTree, FrontendNodeId, JudgmentResult, Key, LiveNode, Locator,
    NodeRef, Screenshot, SelectBy,
};

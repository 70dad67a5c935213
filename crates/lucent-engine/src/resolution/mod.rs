pub mod interactor;
pub mod resolver;
pub mod role;

pub use interactor::Interactor;
pub use resolver::{ElementHandle, ElementResolver, default_marker_attribute};
pub use role::{ClickPlan, NodeRole, RolePolicy, SelectPlan};

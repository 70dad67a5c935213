pub mod backend;
pub mod cdp;
pub mod inject;
pub mod page;

pub use backend::HeadlessDriver;
pub use page::CdpPage;

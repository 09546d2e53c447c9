//! OData resource operations

mod batch;
mod collection;
mod execute;
mod options;
pub mod query;
mod service;

pub use batch::*;
pub use collection::*;
pub use options::*;
pub use service::*;

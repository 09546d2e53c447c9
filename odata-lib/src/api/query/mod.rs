//! Query construction for OData resources.
//!
//! - [`QueryBuilder`] - resource path plus query options, rendered as a
//!   relative URL
//! - [`ODataOptions`] - the typed option bag behind a query
//! - [`Filter`], [`OrderBy`], [`GroupBy`], [`ExpandBuilder`] - option values
//! - [`EntitySet`] / [`ODataPages`] - decoded results and paging

mod apply;
mod builder;
mod entity_set;
mod expand;
mod filter;
mod options;
mod order;
mod pages;
mod path;
pub mod url;

pub use apply::Aggregate;
pub use apply::AggregateMethod;
pub use apply::GroupBy;
pub use builder::QueryBuilder;
pub use entity_set::EntitySet;
pub use expand::ExpandBuilder;
pub use filter::Filter;
pub use options::ODataOptions;
pub use options::OptionKey;
pub use options::OptionValue;
pub use options::QueryOption;
pub use options::key;
pub use order::Direction;
pub use order::OrderBy;
pub use pages::ODataPages;
pub use path::EntityKey;
pub use path::ResourcePath;
pub use path::Segment;

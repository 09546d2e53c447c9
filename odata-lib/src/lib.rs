//! OData v4 client library
//!
//! A Rust async client for OData v4 services: typed query building, entity
//! set decoding and paging, CRUD shortcuts, and `$batch` requests.
//!
//! ```ignore
//! use odata_lib::ODataClient;
//! use odata_lib::api::query::{Filter, QueryBuilder};
//! use odata_lib::transport::HttpTransport;
//!
//! let client = ODataClient::builder()
//!     .service_root("https://services.odata.org/V4/TripPinServiceRW")
//!     .transport(HttpTransport::new()?)
//!     .build()?;
//!
//! let query = QueryBuilder::new("People")?
//!     .filter(Filter::eq("Gender", "Female"))
//!     .top(5);
//! let people = client.get_entity_set::<Person>(&query, &Default::default()).await?;
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod transport;

mod client;

pub use client::*;

//! The ODataEntity trait

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::query::EntityKey;

/// A type stored in an OData entity set.
///
/// Implementors name their entity set and know how to extract their key, which
/// is all [`EntityService`](crate::api::EntityService) needs to build URLs.
///
/// # Example
///
/// ```
/// use odata_lib::api::query::EntityKey;
/// use odata_lib::model::ODataEntity;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// #[serde(rename_all = "PascalCase")]
/// struct Person {
///     user_name: Option<String>,
///     first_name: String,
///     #[serde(rename = "@odata.etag", skip_serializing)]
///     etag: Option<String>,
/// }
///
/// impl ODataEntity for Person {
///     const ENTITY_SET: &'static str = "People";
///
///     fn key(&self) -> Option<EntityKey> {
///         self.user_name.clone().map(EntityKey::from)
///     }
///
///     fn etag(&self) -> Option<&str> {
///         self.etag.as_deref()
///     }
/// }
/// ```
pub trait ODataEntity: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Name of the entity set the entity lives in (e.g. `"People"`).
    const ENTITY_SET: &'static str;

    /// The entity key, or `None` for an entity not yet persisted.
    fn key(&self) -> Option<EntityKey>;

    /// The `@odata.etag` of the entity, sent as `If-Match` on writes.
    fn etag(&self) -> Option<&str> {
        None
    }
}

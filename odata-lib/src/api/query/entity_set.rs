//! Decoded entity set responses.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::error::Error;

/// One page of an entity set response.
///
/// Decodes the OData JSON collection shape:
///
/// ```json
/// {
///   "@odata.context": "...",
///   "@odata.count": 20,
///   "@odata.nextLink": "People?$skip=8",
///   "value": [ ... ]
/// }
/// ```
///
/// `skip` is taken from the `$skip` parameter of the next link, which is how
/// servers report their page size under server-driven paging.
#[derive(Debug, Clone)]
pub struct EntitySet<T> {
    entities: Vec<T>,
    count: Option<usize>,
    skip: Option<usize>,
    next_link: Option<String>,
    context: Option<String>,
}

#[derive(Deserialize)]
struct RawEntitySet<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "@odata.count", default)]
    count: Option<usize>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
    #[serde(rename = "@odata.context", default)]
    context: Option<String>,
}

impl<T: DeserializeOwned> EntitySet<T> {
    /// Decodes an entity set from a response body.
    pub fn from_json(body: &str) -> Result<Self, Error> {
        let raw: RawEntitySet<T> = serde_json::from_str(body)
            .map_err(|e| ApiError::parse_with_body(e.to_string(), body))?;
        Ok(Self::from_raw(raw))
    }

    /// Decodes an entity set from an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, Error> {
        let raw: RawEntitySet<T> = serde_json::from_value(value)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawEntitySet<T>) -> Self {
        let skip = raw.next_link.as_deref().and_then(skip_from_link);
        Self {
            entities: raw.value,
            count: raw.count,
            skip,
            next_link: raw.next_link,
            context: raw.context,
        }
    }
}

impl<T> EntitySet<T> {
    /// Creates an entity set from already decoded entities.
    pub fn new(entities: Vec<T>) -> Self {
        Self {
            entities,
            count: None,
            skip: None,
            next_link: None,
            context: None,
        }
    }

    /// Returns the entities on this page.
    pub fn entities(&self) -> &[T] {
        &self.entities
    }

    /// Consumes the set and returns the entities.
    pub fn into_entities(self) -> Vec<T> {
        self.entities
    }

    /// Total number of matching entities (`@odata.count`), when requested.
    pub fn count(&self) -> Option<usize> {
        self.count
    }

    /// The `$skip` of the next link, if any.
    pub fn skip(&self) -> Option<usize> {
        self.skip
    }

    /// The `@odata.nextLink`, if more results are available.
    pub fn next_link(&self) -> Option<&str> {
        self.next_link.as_deref()
    }

    /// The `@odata.context` URL.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns the number of entities on this page.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if this page has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns `true` if the server reported a next link.
    pub fn has_more(&self) -> bool {
        self.next_link.is_some()
    }
}

impl<T> IntoIterator for EntitySet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

/// Extracts `$skip` from a next link. Relative links are resolved against a
/// placeholder base so only the query matters.
fn skip_from_link(link: &str) -> Option<usize> {
    let parsed = match ::url::Url::parse(link) {
        Ok(url) => url,
        Err(::url::ParseError::RelativeUrlWithoutBase) => {
            let base = ::url::Url::parse("http://localhost/").ok()?;
            base.join(link).ok()?
        }
        Err(_) => return None,
    };

    parsed
        .query_pairs()
        .find(|(name, _)| name == "$skip")
        .and_then(|(_, value)| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        #[serde(rename = "UserName")]
        user_name: String,
    }

    #[test]
    fn test_decodes_annotations() {
        let body = json!({
            "@odata.context": "http://host/svc/$metadata#People",
            "@odata.count": 20,
            "@odata.nextLink": "http://host/svc/People?%24count=true&%24skip=8",
            "value": [{"UserName": "russellwhyte"}, {"UserName": "scottketchum"}]
        })
        .to_string();

        let set: EntitySet<Person> = EntitySet::from_json(&body).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.count(), Some(20));
        assert_eq!(set.skip(), Some(8));
        assert!(set.has_more());
        assert_eq!(set.context(), Some("http://host/svc/$metadata#People"));
        assert_eq!(set.entities()[0].user_name, "russellwhyte");
    }

    #[test]
    fn test_relative_next_link() {
        let body = r#"{"value": [], "@odata.nextLink": "People?$skip=16"}"#;
        let set: EntitySet<Person> = EntitySet::from_json(body).unwrap();
        assert_eq!(set.skip(), Some(16));
        assert!(set.is_empty());
        assert_eq!(set.count(), None);
    }

    #[test]
    fn test_last_page_has_no_skip() {
        let body = r#"{"value": [{"UserName": "a"}]}"#;
        let set: EntitySet<Person> = EntitySet::from_json(body).unwrap();
        assert_eq!(set.skip(), None);
        assert!(!set.has_more());
    }

    #[test]
    fn test_invalid_body() {
        let err = EntitySet::<Person>::from_json("<html>").unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Parse { .. })));
    }
}

//! Resource paths: entity sets, keys, navigation and operations.

use uuid::Uuid;

use super::url::encode_component;
use super::url::escape_string;
use super::url::value_to_odata;
use crate::model::Value;

/// The key addressing a single entity, rendered in parentheses after the set.
///
/// # Example
///
/// ```
/// use odata_lib::api::query::EntityKey;
///
/// assert_eq!(EntityKey::from(1).to_string(), "(1)");
/// assert_eq!(EntityKey::from("russellwhyte").to_string(), "('russellwhyte')");
/// assert_eq!(
///     EntityKey::composite([("OrderID", 1), ("ProductID", 7)]).to_string(),
///     "(OrderID=1,ProductID=7)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKey {
    /// Integer key.
    Int(i64),
    /// String key.
    String(String),
    /// GUID key.
    Guid(Uuid),
    /// Multi-part key (`name=value,...`).
    Composite(Vec<(String, Value)>),
}

impl EntityKey {
    /// Creates a composite key from `name => value` pairs.
    pub fn composite<K, V>(parts: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        EntityKey::Composite(
            parts
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKey::Int(n) => write!(f, "({})", n),
            EntityKey::String(s) => write!(f, "({})", escape_string(s)),
            EntityKey::Guid(g) => write!(f, "({})", g),
            EntityKey::Composite(parts) => write!(f, "({})", render_parameters(parts)),
        }
    }
}

impl From<i32> for EntityKey {
    fn from(v: i32) -> Self {
        EntityKey::Int(v.into())
    }
}

impl From<i64> for EntityKey {
    fn from(v: i64) -> Self {
        EntityKey::Int(v)
    }
}

impl From<u32> for EntityKey {
    fn from(v: u32) -> Self {
        EntityKey::Int(v.into())
    }
}

impl From<&str> for EntityKey {
    fn from(v: &str) -> Self {
        EntityKey::String(v.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(v: String) -> Self {
        EntityKey::String(v)
    }
}

impl From<Uuid> for EntityKey {
    fn from(v: Uuid) -> Self {
        EntityKey::Guid(v)
    }
}

/// One segment of a resource path.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Entity set (`People`), always the first segment of a query.
    EntitySet(String),
    /// Entity key (`('russellwhyte')`), appended without a separator.
    Key(EntityKey),
    /// Navigation property (`/Friends`).
    Navigation(String),
    /// Structural property (`/FirstName`).
    Property(String),
    /// Function call with parameters (`/NS.GetFavoriteAirline()`).
    Function {
        name: String,
        parameters: Vec<(String, Value)>,
    },
    /// Action (`/NS.ShareTrip`).
    Action(String),
    /// `/$count`
    Count,
    /// `/$ref`
    Ref,
    /// `/$value`
    Value,
}

impl Segment {
    fn render(&self) -> String {
        match self {
            Segment::EntitySet(name) | Segment::Navigation(name) | Segment::Property(name) => {
                encode_component(name)
            }
            Segment::Key(key) => encode_component(&key.to_string()),
            Segment::Function { name, parameters } => {
                encode_component(&format!("{}({})", name, render_parameters(parameters)))
            }
            Segment::Action(name) => encode_component(name),
            Segment::Count => "$count".to_string(),
            Segment::Ref => "$ref".to_string(),
            Segment::Value => "$value".to_string(),
        }
    }
}

fn render_parameters(parameters: &[(String, Value)]) -> String {
    parameters
        .iter()
        .map(|(name, value)| format!("{}={}", name, value_to_odata(value)))
        .collect::<Vec<_>>()
        .join(",")
}

/// An ordered list of segments rendered as a relative URL path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePath {
    segments: Vec<Segment>,
}

impl ResourcePath {
    /// Creates a path starting with `root`.
    pub fn new(root: Segment) -> Self {
        Self {
            segments: vec![root],
        }
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Returns the segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the last segment.
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }
}

impl std::fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && !matches!(segment, Segment::Key(_)) {
                f.write_str("/")?;
            }
            f.write_str(&segment.render())?;
        }
        Ok(())
    }
}

//! Filter expressions for `$filter`.

use crate::model::Value;

/// A filter condition for querying entities.
///
/// Filters combine with logical operators (`And`, `Or`, `Not`) and lambda
/// operators (`Any`, `All`) to build arbitrarily nested expressions. They are
/// rendered to OData syntax when the query string is built.
///
/// # Example
///
/// ```
/// use odata_lib::api::query::Filter;
///
/// // Simple equality filter
/// let filter = Filter::eq("FirstName", "Russell");
///
/// // Combined filter
/// let filter = Filter::and([
///     Filter::eq("Gender", "Male"),
///     Filter::gt("Age", 30),
/// ]);
///
/// // Any over a collection navigation property
/// let filter = Filter::any("Trips", "t", Filter::gt("t/Budget", 1000));
///
/// // Negation
/// let filter = Filter::contains("LastName", "Whyte").not();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field eq value`
    Eq(String, Value),
    /// `field ne value`
    Ne(String, Value),
    /// `field gt value`
    Gt(String, Value),
    /// `field ge value`
    Ge(String, Value),
    /// `field lt value`
    Lt(String, Value),
    /// `field le value`
    Le(String, Value),
    /// `field in (v1,v2,...)`
    In(String, Vec<Value>),
    /// `contains(field,'value')`
    Contains(String, String),
    /// `startswith(field,'value')`
    StartsWith(String, String),
    /// `endswith(field,'value')`
    EndsWith(String, String),
    /// `field eq null`
    IsNull(String),
    /// `field ne null`
    IsNotNull(String),
    /// `collection/any(var:filter)`
    Any {
        collection: String,
        variable: String,
        filter: Box<Filter>,
    },
    /// `collection/all(var:filter)`
    All {
        collection: String,
        variable: String,
        filter: Box<Filter>,
    },
    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// `not (filter)`
    Not(Box<Filter>),
    /// Raw filter string, passed through as-is.
    Raw(String),
}

impl Filter {
    /// Creates an equality filter: `field eq value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    /// Creates a not-equal filter: `field ne value`.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    /// Creates a greater-than filter: `field gt value`.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(field.into(), value.into())
    }

    /// Creates a greater-than-or-equal filter: `field ge value`.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ge(field.into(), value.into())
    }

    /// Creates a less-than filter: `field lt value`.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt(field.into(), value.into())
    }

    /// Creates a less-than-or-equal filter: `field le value`.
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Le(field.into(), value.into())
    }

    /// Creates a membership filter: `field in (v1,v2)`.
    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Creates a contains filter: `contains(field,'value')`.
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Contains(field.into(), value.into())
    }

    /// Creates a starts-with filter: `startswith(field,'value')`.
    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::StartsWith(field.into(), value.into())
    }

    /// Creates an ends-with filter: `endswith(field,'value')`.
    pub fn ends_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::EndsWith(field.into(), value.into())
    }

    /// Creates an is-null filter: `field eq null`.
    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::IsNull(field.into())
    }

    /// Creates an is-not-null filter: `field ne null`.
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Filter::IsNotNull(field.into())
    }

    /// Matches when at least one member of `collection` satisfies `filter`.
    ///
    /// Inside `filter`, refer to the member through `variable` (e.g. `t/Name`).
    pub fn any(collection: impl Into<String>, variable: impl Into<String>, filter: Filter) -> Self {
        Filter::Any {
            collection: collection.into(),
            variable: variable.into(),
            filter: Box::new(filter),
        }
    }

    /// Matches when every member of `collection` satisfies `filter`.
    pub fn all(collection: impl Into<String>, variable: impl Into<String>, filter: Filter) -> Self {
        Filter::All {
            collection: collection.into(),
            variable: variable.into(),
            filter: Box::new(filter),
        }
    }

    /// Creates a logical AND of multiple filters.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Creates a logical OR of multiple filters.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Creates a raw filter string.
    pub fn raw(filter: impl Into<String>) -> Self {
        Filter::Raw(filter.into())
    }

    /// Combines this filter with another using logical AND.
    pub fn and_also(self, other: Filter) -> Self {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            _ => Filter::And(vec![self, other]),
        }
    }

    /// Combines this filter with another using logical OR.
    pub fn or_else(self, other: Filter) -> Self {
        match self {
            Filter::Or(mut filters) => {
                filters.push(other);
                Filter::Or(filters)
            }
            _ => Filter::Or(vec![self, other]),
        }
    }

    /// Negates this filter.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Filter::Not(Box::new(self))
    }
}

impl From<&str> for Filter {
    fn from(raw: &str) -> Self {
        Filter::Raw(raw.to_string())
    }
}

impl From<String> for Filter {
    fn from(raw: String) -> Self {
        Filter::Raw(raw)
    }
}

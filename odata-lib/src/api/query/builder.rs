//! OData query builder.

use super::EntityKey;
use super::ExpandBuilder;
use super::Filter;
use super::GroupBy;
use super::ODataOptions;
use super::OrderBy;
use super::QueryOption;
use super::ResourcePath;
use super::Segment;
use super::key;
use super::url::query_string;
use crate::error::Error;
use crate::error::require_not_empty;
use crate::model::Value;

/// Builder for an OData request URL: a resource path plus query options.
///
/// The builder is a plain value. Cloning it yields an independent copy, so
/// variants of one query can be derived without affecting each other.
/// Rendering (`to_string()`) produces the URL relative to the service root.
///
/// # Example
///
/// ```
/// use odata_lib::api::query::{Filter, OrderBy, QueryBuilder};
///
/// let query = QueryBuilder::new("People")?
///     .select(&["FirstName", "LastName"])
///     .filter(Filter::eq("Gender", "Female"))
///     .order_by(OrderBy::asc("LastName"))
///     .top(10);
///
/// assert_eq!(
///     query.to_string(),
///     "People?$select=FirstName,LastName&$filter=Gender%20eq%20'Female'&$orderby=LastName%20asc&$top=10"
/// );
/// # Ok::<(), odata_lib::error::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    path: ResourcePath,
    options: ODataOptions,
}

impl QueryBuilder {
    /// Creates a query rooted at the entity set `set`.
    ///
    /// Fails if `set` is empty.
    pub fn new(set: impl Into<String>) -> Result<Self, Error> {
        Self::from_options(set, ODataOptions::new())
    }

    /// Creates a query rooted at `set` with the given options.
    pub fn from_options(set: impl Into<String>, options: ODataOptions) -> Result<Self, Error> {
        let set = set.into();
        require_not_empty(&set, "set")?;
        Ok(Self {
            path: ResourcePath::new(Segment::EntitySet(set)),
            options,
        })
    }

    /// Creates a query for an unbound function at the service root.
    pub fn function_import<K, V>(
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, Error>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let name = name.into();
        require_not_empty(&name, "function")?;
        Ok(Self {
            path: ResourcePath::new(Segment::Function {
                name,
                parameters: collect_parameters(parameters),
            }),
            options: ODataOptions::new(),
        })
    }

    /// Creates a query for an unbound action at the service root.
    pub fn action_import(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        require_not_empty(&name, "action")?;
        Ok(Self {
            path: ResourcePath::new(Segment::Action(name)),
            options: ODataOptions::new(),
        })
    }

    /// Returns the root segment name (entity set, function or action).
    pub fn set_name(&self) -> &str {
        match self.path.segments().first() {
            Some(Segment::EntitySet(name)) | Some(Segment::Action(name)) => name,
            Some(Segment::Function { name, .. }) => name,
            _ => "",
        }
    }

    /// Returns the resource path.
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// Returns the query options.
    pub fn options(&self) -> &ODataOptions {
        &self.options
    }

    /// Returns the query options for in-place edits.
    pub fn options_mut(&mut self) -> &mut ODataOptions {
        &mut self.options
    }

    /// Returns a copy of the query options.
    pub fn to_options(&self) -> ODataOptions {
        self.options.clone()
    }

    /// Returns the encoded query string (without `?`).
    pub fn query_string(&self) -> String {
        query_string(&self.options)
    }

    // -------------------------------------------------------------------------
    // Path navigation
    // -------------------------------------------------------------------------

    /// Addresses a single entity by key.
    pub fn key(mut self, key: impl Into<EntityKey>) -> Self {
        self.path.push(Segment::Key(key.into()));
        self
    }

    /// Follows a navigation property.
    pub fn navigation(mut self, name: impl Into<String>) -> Self {
        self.path.push(Segment::Navigation(name.into()));
        self
    }

    /// Addresses a structural property.
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.path.push(Segment::Property(name.into()));
        self
    }

    /// Calls a bound function with the given parameters.
    pub fn function<K, V>(mut self, name: impl Into<String>, parameters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.path.push(Segment::Function {
            name: name.into(),
            parameters: collect_parameters(parameters),
        });
        self
    }

    /// Invokes a bound action.
    pub fn action(mut self, name: impl Into<String>) -> Self {
        self.path.push(Segment::Action(name.into()));
        self
    }

    /// Addresses the entity reference (`/$ref`).
    pub fn reference(mut self) -> Self {
        self.path.push(Segment::Ref);
        self
    }

    /// Addresses the raw value of a property (`/$value`).
    pub fn raw_value(mut self) -> Self {
        self.path.push(Segment::Value);
        self
    }

    /// Derives the `/$count` query for this resource.
    ///
    /// Only `$filter` and `$search` carry over.
    pub fn count_query(&self) -> Self {
        let mut query = self.clone();
        query.path.push(Segment::Count);
        query
            .options
            .keep(&[QueryOption::Filter, QueryOption::Search]);
        query
    }

    // -------------------------------------------------------------------------
    // Query options
    // -------------------------------------------------------------------------

    /// Specifies which fields to select.
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.options
            .set::<key::Select>(fields.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Sets the filter condition.
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.options.set::<key::Filter>(filter.into());
        self
    }

    /// Sets the free-text search expression.
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.options.set::<key::Search>(search.into());
        self
    }

    /// Groups results (`$apply=groupby(...)`).
    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.options.set::<key::GroupBy>(group_by);
        self
    }

    /// Appends a raw `$apply` transformation step, applied before any
    /// `group_by`.
    pub fn transform(mut self, step: impl Into<String>) -> Self {
        let step = step.into();
        match self.options.get_mut::<key::Transform>() {
            Some(steps) => steps.push(step),
            None => {
                self.options.set::<key::Transform>(vec![step]);
            }
        }
        self
    }

    /// Sets the ordering of results.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.options.set::<key::OrderBy>(order);
        self
    }

    /// Limits the number of results.
    pub fn top(mut self, n: usize) -> Self {
        self.options.set::<key::Top>(n);
        self
    }

    /// Skips the first `n` results.
    pub fn skip(mut self, n: usize) -> Self {
        self.options.set::<key::Skip>(n);
        self
    }

    /// Requests the total count (`$count=true`).
    pub fn count(mut self, count: bool) -> Self {
        self.options.set::<key::Count>(count);
        self
    }

    /// Expands a navigation property.
    ///
    /// # Example
    ///
    /// ```
    /// use odata_lib::api::query::QueryBuilder;
    ///
    /// let query = QueryBuilder::new("People")?
    ///     .expand("Friends", |e| e.select(&["UserName"]))
    ///     .expand("Trips", |e| e.top(1));
    /// assert_eq!(
    ///     query.to_string(),
    ///     "People?$expand=Friends($select=UserName),Trips($top=1)"
    /// );
    /// # Ok::<(), odata_lib::error::Error>(())
    /// ```
    pub fn expand<F>(mut self, navigation_property: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(ExpandBuilder) -> ExpandBuilder,
    {
        let expand = build(ExpandBuilder::new(navigation_property));
        match self.options.get_mut::<key::Expand>() {
            Some(expands) => expands.push(expand),
            None => {
                self.options.set::<key::Expand>(vec![expand]);
            }
        }
        self
    }

    /// Removes an option.
    pub fn unset(mut self, option: QueryOption) -> Self {
        self.options.remove(option);
        self
    }

    /// Merges `options` into this query, `options` winning on conflicts.
    pub fn merge(mut self, options: &ODataOptions) -> Self {
        self.options.merge(options);
        self
    }
}

impl std::fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)?;
        let query = self.query_string();
        if !query.is_empty() {
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}

fn collect_parameters<K, V>(parameters: impl IntoIterator<Item = (K, V)>) -> Vec<(String, Value)>
where
    K: Into<String>,
    V: Into<Value>,
{
    parameters
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::query::Aggregate;
    use crate::api::query::AggregateMethod;

    #[test]
    fn test_empty_set_is_rejected() {
        assert!(matches!(QueryBuilder::new(""), Err(Error::Validation(_))));
        assert!(matches!(QueryBuilder::new("   "), Err(Error::Validation(_))));
        assert!(QueryBuilder::action_import("").is_err());
    }

    #[test]
    fn test_plain_set() {
        let query = QueryBuilder::new("People").unwrap();
        assert_eq!(query.to_string(), "People");
        assert_eq!(query.set_name(), "People");
    }

    #[test]
    fn test_clone_is_independent() {
        let original = QueryBuilder::new("People").unwrap().top(10);
        let variant = original.clone().top(5).skip(10).key("russellwhyte");

        assert_eq!(original.to_string(), "People?$top=10");
        assert_eq!(variant.to_string(), "People('russellwhyte')?$top=5&$skip=10");
    }

    #[test]
    fn test_entity_navigation() {
        let query = QueryBuilder::new("People")
            .unwrap()
            .key("russellwhyte")
            .navigation("Trips")
            .key(0)
            .navigation("PlanItems");
        assert_eq!(query.to_string(), "People('russellwhyte')/Trips(0)/PlanItems");
    }

    #[test]
    fn test_bound_operations() {
        let function = QueryBuilder::new("People")
            .unwrap()
            .key("russellwhyte")
            .function("NS.GetFriendsTrips", [("userName", "scottketchum")]);
        assert_eq!(
            function.to_string(),
            "People('russellwhyte')/NS.GetFriendsTrips(userName='scottketchum')"
        );

        let action = QueryBuilder::new("People")
            .unwrap()
            .key("russellwhyte")
            .action("NS.ShareTrip");
        assert_eq!(action.to_string(), "People('russellwhyte')/NS.ShareTrip");
    }

    #[test]
    fn test_function_import() {
        let query = QueryBuilder::function_import("GetNearestAirport", [("lat", 33), ("lon", -118)])
            .unwrap();
        assert_eq!(query.to_string(), "GetNearestAirport(lat=33,lon=-118)");
        assert_eq!(query.set_name(), "GetNearestAirport");

        let empty: [(&str, i32); 0] = [];
        let query = QueryBuilder::function_import("GetPersonWithMostFriends", empty).unwrap();
        assert_eq!(query.to_string(), "GetPersonWithMostFriends()");
    }

    #[test]
    fn test_count_query_keeps_filter_and_search() {
        let query = QueryBuilder::new("People")
            .unwrap()
            .filter(Filter::eq("Gender", "Male"))
            .search("blue")
            .top(10)
            .select(&["FirstName"])
            .count(true);

        assert_eq!(
            query.count_query().to_string(),
            "People/$count?$filter=Gender%20eq%20'Male'&$search=blue"
        );
        assert!(query.options().contains(QueryOption::Top));
    }

    #[test]
    fn test_reference_and_value() {
        let query = QueryBuilder::new("People")
            .unwrap()
            .key("russellwhyte")
            .navigation("Friends")
            .reference();
        assert_eq!(query.to_string(), "People('russellwhyte')/Friends/$ref");

        let query = QueryBuilder::new("Photos")
            .unwrap()
            .key(1)
            .raw_value();
        assert_eq!(query.to_string(), "Photos(1)/$value");
    }

    #[test]
    fn test_unset_and_merge() {
        let mut extra = ODataOptions::new();
        extra.set::<key::Skip>(30);

        let query = QueryBuilder::new("People")
            .unwrap()
            .top(10)
            .count(true)
            .unset(QueryOption::Count)
            .merge(&extra);
        assert_eq!(query.to_string(), "People?$top=10&$skip=30");
    }

    #[test]
    fn test_group_by_and_transform() {
        let query = QueryBuilder::new("Trips")
            .unwrap()
            .transform("filter(Budget gt 100)")
            .group_by(
                GroupBy::new(["Name"]).aggregate(Aggregate::new("Budget", AggregateMethod::Sum, "Total")),
            );
        assert_eq!(
            query.to_string(),
            "Trips?$apply=filter(Budget%20gt%20100)/groupby((Name),aggregate(Budget%20with%20sum%20as%20Total))"
        );
    }

    #[test]
    fn test_options_round_trip() {
        let query = QueryBuilder::new("People").unwrap().top(3).search("x");
        let rebuilt = QueryBuilder::from_options("People", query.to_options()).unwrap();
        assert_eq!(query, rebuilt);
    }
}

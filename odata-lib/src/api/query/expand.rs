//! `$expand` clauses with nested query options.

use super::Filter;
use super::ODataOptions;
use super::OrderBy;
use super::key;
use super::url::nested_query;

/// Builder for one `$expand` item.
///
/// Nested options are held in their own [`ODataOptions`] bag and rendered
/// inside parentheses, separated by `;`.
///
/// # Example
///
/// ```
/// use odata_lib::api::query::{ExpandBuilder, Filter};
///
/// let expand = ExpandBuilder::new("Trips")
///     .select(&["Name", "Budget"])
///     .filter(Filter::gt("Budget", 1000))
///     .top(5);
/// assert_eq!(
///     expand.to_odata(),
///     "Trips($select=Name,Budget;$filter=Budget gt 1000;$top=5)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandBuilder {
    navigation_property: String,
    options: ODataOptions,
}

impl ExpandBuilder {
    /// Creates an expand for a navigation property.
    pub fn new(navigation_property: impl Into<String>) -> Self {
        Self {
            navigation_property: navigation_property.into(),
            options: ODataOptions::new(),
        }
    }

    /// Selects fields of the expanded entity.
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.options
            .set::<key::Select>(fields.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Filters the expanded entities.
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.options.set::<key::Filter>(filter.into());
        self
    }

    /// Orders the expanded entities.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.options.set::<key::OrderBy>(order);
        self
    }

    /// Limits the number of expanded entities.
    pub fn top(mut self, n: usize) -> Self {
        self.options.set::<key::Top>(n);
        self
    }

    /// Skips the first `n` expanded entities.
    pub fn skip(mut self, n: usize) -> Self {
        self.options.set::<key::Skip>(n);
        self
    }

    /// Includes the count of expanded entities.
    pub fn count(mut self, count: bool) -> Self {
        self.options.set::<key::Count>(count);
        self
    }

    /// Expands a navigation property of the expanded entity.
    pub fn expand<F>(mut self, navigation_property: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(ExpandBuilder) -> ExpandBuilder,
    {
        let nested = build(ExpandBuilder::new(navigation_property));
        match self.options.get_mut::<key::Expand>() {
            Some(expands) => expands.push(nested),
            None => {
                self.options.set::<key::Expand>(vec![nested]);
            }
        }
        self
    }

    /// Returns the navigation property being expanded.
    pub fn navigation_property(&self) -> &str {
        &self.navigation_property
    }

    /// Returns the nested options.
    pub fn options(&self) -> &ODataOptions {
        &self.options
    }

    /// Renders the expand item (`Nav` or `Nav(opt;opt)`).
    pub fn to_odata(&self) -> String {
        let nested = nested_query(&self.options);
        if nested.is_empty() {
            self.navigation_property.clone()
        } else {
            format!("{}({})", self.navigation_property, nested)
        }
    }
}

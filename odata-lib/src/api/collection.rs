//! Paginated collections
//!
//! A [`Collection`] wraps a query and tracks which page of it was last
//! fetched. Page size, record count and page count are learned from the
//! responses (`@odata.count` and the `$skip` of `@odata.nextLink`), so a
//! collection over a service without server-driven paging simply stays on
//! one page until [`Collection::size`] is called.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::RequestOptions;
use super::query::EntitySet;
use super::query::ExpandBuilder;
use super::query::Filter;
use super::query::GroupBy;
use super::query::OrderBy;
use super::query::QueryBuilder;
use super::query::key;
use crate::ODataClient;
use crate::error::Error;
use crate::error::ValidationError;
use crate::model::Value;

/// Pagination state of a [`Collection`].
///
/// `page` is 1-indexed. Everything is `None` until learned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionState {
    pub page: Option<usize>,
    pub size: Option<usize>,
    pub records: Option<usize>,
    pub pages: Option<usize>,
}

impl CollectionState {
    /// Updates the state from the annotations of a response.
    ///
    /// Absent annotations leave the corresponding fields untouched.
    pub fn populate(&mut self, count: Option<usize>, skip: Option<usize>) {
        if let Some(count) = count {
            self.records = Some(count);
        }
        if let Some(skip) = skip.filter(|s| *s > 0) {
            self.size = Some(skip);
        }
        if let (Some(records), Some(size)) = (self.records, self.size) {
            if size > 0 {
                self.pages = Some(records.div_ceil(size));
            }
        }
    }

    /// `$top` and `$skip` for the current page, when the page size is known.
    pub fn window(&self) -> Option<(usize, usize)> {
        let size = self.size?;
        let page = self.page.unwrap_or(1).max(1);
        Some((size, size * (page - 1)))
    }
}

/// A paginated view over an entity set query.
///
/// # Example
///
/// ```ignore
/// let mut people = client.collection::<Person>(QueryBuilder::new("People")?);
/// people.size(10).await?;
/// loop {
///     for person in people.iter() {
///         println!("{:?}", person.user_name);
///     }
///     match (people.state().page, people.state().pages) {
///         (Some(page), Some(pages)) if page < pages => {
///             people.next_page().await?;
///         }
///         _ => break,
///     }
/// }
/// ```
pub struct Collection<T> {
    client: ODataClient,
    query: QueryBuilder,
    options: RequestOptions,
    state: CollectionState,
    entities: Vec<T>,
}

impl<T> Collection<T> {
    pub(crate) fn new(client: ODataClient, query: QueryBuilder) -> Self {
        Self {
            client,
            query,
            options: RequestOptions::new(),
            state: CollectionState::default(),
            entities: Vec::new(),
        }
    }

    /// Sets the request options used for every fetch.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the pagination state.
    pub fn state(&self) -> &CollectionState {
        &self.state
    }

    /// Returns the underlying query.
    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    /// Returns the entities of the last fetched page.
    pub fn entities(&self) -> &[T] {
        &self.entities
    }

    /// Iterates over the entities of the last fetched page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entities.iter()
    }

    /// Returns the number of entities on the last fetched page.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the last fetched page was empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Replaces the entities and updates the state from the set's annotations.
    pub fn populate(&mut self, set: EntitySet<T>) -> &[T] {
        self.state.populate(set.count(), set.skip());
        log::debug!(
            "collection {} populated: page {:?} of {:?}, {:?} records",
            self.query.set_name(),
            self.state.page,
            self.state.pages,
            self.state.records
        );
        self.entities = set.into_entities();
        &self.entities
    }

    // -------------------------------------------------------------------------
    // Query mutators
    // -------------------------------------------------------------------------

    /// Sets `$select`.
    pub fn select(&mut self, fields: &[&str]) -> &mut Self {
        self.query
            .options_mut()
            .set::<key::Select>(fields.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Sets `$filter`.
    pub fn filter(&mut self, filter: impl Into<Filter>) -> &mut Self {
        self.query.options_mut().set::<key::Filter>(filter.into());
        self
    }

    /// Sets `$search`.
    pub fn search(&mut self, search: impl Into<String>) -> &mut Self {
        self.query.options_mut().set::<key::Search>(search.into());
        self
    }

    /// Sets `$orderby`.
    pub fn order_by(&mut self, order: OrderBy) -> &mut Self {
        self.query.options_mut().set::<key::OrderBy>(order);
        self
    }

    /// Adds an `$expand` clause.
    pub fn expand<F>(&mut self, navigation_property: impl Into<String>, build: F) -> &mut Self
    where
        F: FnOnce(ExpandBuilder) -> ExpandBuilder,
    {
        let expand = build(ExpandBuilder::new(navigation_property));
        let options = self.query.options_mut();
        match options.get_mut::<key::Expand>() {
            Some(expands) => expands.push(expand),
            None => {
                options.set::<key::Expand>(vec![expand]);
            }
        }
        self
    }

    /// Sets the `groupby` step of `$apply`.
    pub fn group_by(&mut self, group_by: GroupBy) -> &mut Self {
        self.query.options_mut().set::<key::GroupBy>(group_by);
        self
    }

    // -------------------------------------------------------------------------
    // Bound operations
    // -------------------------------------------------------------------------

    /// Builds a call of a function bound to this collection.
    pub fn function<K, V>(&self, name: impl Into<String>, parameters: impl IntoIterator<Item = (K, V)>) -> QueryBuilder
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.query.clone().function(name, parameters)
    }

    /// Builds a call of an action bound to this collection.
    pub fn action(&self, name: impl Into<String>) -> QueryBuilder {
        self.query.clone().action(name)
    }
}

impl<T: DeserializeOwned> Collection<T> {
    /// Fetches the current page (page 1 on the first call).
    ///
    /// Requests `$count=true`, and `$top`/`$skip` once the page size is known.
    pub async fn fetch(&mut self) -> Result<&[T], Error> {
        let page = self.state.page.unwrap_or(1);
        self.fetch_window(page, self.state.size).await
    }

    /// Fetches page `page`. Page 0 is treated as page 1.
    pub async fn page(&mut self, page: usize) -> Result<&[T], Error> {
        self.fetch_window(page, self.state.size).await
    }

    /// Sets the page size and fetches page 1.
    pub async fn size(&mut self, size: usize) -> Result<&[T], Error> {
        if size == 0 {
            return Err(ValidationError::new("size", "must be greater than zero").into());
        }
        self.fetch_window(1, Some(size)).await
    }

    /// Fetches `page` with page size `size`.
    ///
    /// The state moves to the new page and size only once the response
    /// arrives.
    async fn fetch_window(&mut self, page: usize, size: Option<usize>) -> Result<&[T], Error> {
        let target = CollectionState {
            page: Some(page.max(1)),
            size,
            ..self.state
        };

        let mut query = self.query.clone().count(true);
        if let Some((top, skip)) = target.window() {
            query = query.top(top).skip(skip);
        }

        log::debug!("collection {} fetching page {:?}", self.query.set_name(), target.page);
        let set = self.client.get_entity_set::<T>(&query, &self.options).await?;
        self.state.page = target.page;
        self.state.size = target.size;
        Ok(self.populate(set))
    }

    /// Fetches page 1.
    pub async fn first_page(&mut self) -> Result<&[T], Error> {
        self.page(1).await
    }

    /// Fetches the previous page; stays on page 1 when already there.
    ///
    /// Without a current page this is a plain fetch.
    pub async fn previous_page(&mut self) -> Result<&[T], Error> {
        match self.state.page {
            Some(page) => self.page(page.saturating_sub(1)).await,
            None => self.fetch().await,
        }
    }

    /// Fetches the next page.
    ///
    /// Without a current page this is a plain fetch.
    pub async fn next_page(&mut self) -> Result<&[T], Error> {
        match self.state.page {
            Some(page) => self.page(page + 1).await,
            None => self.fetch().await,
        }
    }

    /// Fetches the last page.
    ///
    /// Without a known page count this is a plain fetch.
    pub async fn last_page(&mut self) -> Result<&[T], Error> {
        match self.state.pages {
            Some(pages) => self.page(pages).await,
            None => self.fetch().await,
        }
    }

    /// Counts the entities matched by the query with a `$count` request.
    pub async fn count(&self) -> Result<usize, Error> {
        self.client.count(&self.query, &self.options).await
    }
}

impl<T: Serialize> Collection<T> {
    /// Serializes the entities of the last fetched page as a JSON array.
    pub fn to_json(&self) -> Result<serde_json::Value, Error> {
        Ok(serde_json::to_value(&self.entities)?)
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populate_computes_pages() {
        let mut state = CollectionState::default();
        state.populate(Some(20), Some(8));
        assert_eq!(state.records, Some(20));
        assert_eq!(state.size, Some(8));
        assert_eq!(state.pages, Some(3));
    }

    #[test]
    fn test_populate_exact_division() {
        let mut state = CollectionState {
            size: Some(5),
            ..Default::default()
        };
        state.populate(Some(20), None);
        assert_eq!(state.pages, Some(4));
        assert_eq!(state.size, Some(5));
    }

    #[test]
    fn test_populate_without_annotations_keeps_state() {
        let mut state = CollectionState {
            page: Some(2),
            size: Some(10),
            records: Some(35),
            pages: Some(4),
        };
        let before = state;
        state.populate(None, None);
        assert_eq!(state, before);
    }

    #[test]
    fn test_populate_count_only() {
        let mut state = CollectionState::default();
        state.populate(Some(7), None);
        assert_eq!(state.records, Some(7));
        assert_eq!(state.size, None);
        assert_eq!(state.pages, None);
    }

    #[test]
    fn test_populate_zero_records() {
        let mut state = CollectionState {
            size: Some(10),
            ..Default::default()
        };
        state.populate(Some(0), None);
        assert_eq!(state.pages, Some(0));
    }

    #[test]
    fn test_window() {
        let mut state = CollectionState::default();
        assert_eq!(state.window(), None);

        state.size = Some(10);
        assert_eq!(state.window(), Some((10, 0)));

        state.page = Some(3);
        assert_eq!(state.window(), Some((10, 20)));
    }
}

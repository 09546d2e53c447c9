//! Async iteration over server-driven paging.

use futures::Stream;
use serde::de::DeserializeOwned;

use super::EntitySet;
use super::QueryBuilder;
use crate::ODataClient;
use crate::api::RequestOptions;
use crate::error::Error;

/// Async iterator that yields pages of an entity set.
///
/// Follows `@odata.nextLink` until the server stops returning one. The
/// first error ends the iteration.
///
/// # Example
///
/// ```ignore
/// let query = QueryBuilder::new("People")?;
/// let mut pages = client.pages::<Person>(&query, RequestOptions::new());
///
/// while let Some(page) = pages.next().await {
///     for person in page?.entities() {
///         println!("{}", person.user_name);
///     }
/// }
/// ```
pub struct ODataPages<T> {
    client: ODataClient,
    options: RequestOptions,
    next_url: Option<String>,
    done: bool,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ODataPages<T> {
    pub(crate) fn new(client: ODataClient, query: &QueryBuilder, options: RequestOptions) -> Self {
        Self {
            client,
            options,
            next_url: Some(query.to_string()),
            done: false,
            _marker: std::marker::PhantomData,
        }
    }

    /// Fetches the next page.
    ///
    /// Returns `None` when all pages have been consumed.
    pub async fn next(&mut self) -> Option<Result<EntitySet<T>, Error>> {
        if self.done {
            return None;
        }

        let Some(url) = self.next_url.take() else {
            self.done = true;
            return None;
        };

        match self.client.get_entity_set_at::<T>(&url, &self.options).await {
            Ok(page) => {
                match page.next_link() {
                    Some(link) => self.next_url = Some(link.to_string()),
                    None => self.done = true,
                }
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }

    /// Converts the iterator into a `Stream` of pages.
    pub fn into_stream(mut self) -> impl Stream<Item = Result<EntitySet<T>, Error>> {
        async_stream::stream! {
            while let Some(page) = self.next().await {
                yield page;
            }
        }
    }

    /// Fetches every remaining page and concatenates the entities.
    pub async fn collect_all(mut self) -> Result<Vec<T>, Error> {
        let mut entities = Vec::new();
        while let Some(page) = self.next().await {
            entities.extend(page?.into_entities());
        }
        Ok(entities)
    }
}

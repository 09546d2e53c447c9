//! CRUD shortcuts for a typed entity set

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::RequestOptions;
use super::query::EntityKey;
use super::query::EntitySet;
use super::query::ODataPages;
use super::query::QueryBuilder;
use crate::ODataClient;
use crate::error::Error;
use crate::error::ValidationError;
use crate::model::ODataEntity;
use crate::model::Value;
use crate::transport::HttpResponse;

/// CRUD operations on the entity set of `T`.
///
/// Obtained from [`ODataClient::service`]. Writes send the entity's etag as
/// `If-Match` when it has one.
///
/// # Example
///
/// ```ignore
/// let people = client.service::<Person>();
///
/// let russell = people.fetch_or_create(&Person::new("russellwhyte")).await?;
/// let trips: EntitySet<Trip> = people
///     .navigation_property_set(&russell, "Trips", &RequestOptions::new())
///     .await?;
/// ```
pub struct EntityService<T> {
    client: ODataClient,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityService<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ODataEntity> EntityService<T> {
    pub(crate) fn new(client: ODataClient) -> Self {
        Self {
            client,
            _marker: PhantomData,
        }
    }

    /// Returns the client.
    pub fn client(&self) -> &ODataClient {
        &self.client
    }

    // -------------------------------------------------------------------------
    // URLs
    // -------------------------------------------------------------------------

    /// Query for the entity set of `T`.
    pub fn set(&self) -> Result<QueryBuilder, Error> {
        QueryBuilder::new(T::ENTITY_SET)
    }

    /// Query for `entity`, addressed by its key.
    ///
    /// Fails if the entity has no key.
    pub fn entity(&self, entity: &T) -> Result<QueryBuilder, Error> {
        let key = entity.key().ok_or_else(|| ValidationError::missing("key"))?;
        self.entity_of(key)
    }

    /// Query for the entity with key `key`.
    pub fn entity_of(&self, key: impl Into<EntityKey>) -> Result<QueryBuilder, Error> {
        Ok(self.set()?.key(key))
    }

    /// Returns `true` if `entity` has no key yet.
    pub fn is_new(&self, entity: &T) -> bool {
        entity.key().is_none()
    }

    // -------------------------------------------------------------------------
    // Entity actions
    // -------------------------------------------------------------------------

    /// Fetches the first page of the entity set.
    pub async fn all(&self) -> Result<EntitySet<T>, Error> {
        self.client
            .get_entity_set(&self.set()?, &RequestOptions::new())
            .await
    }

    /// Iterates over every page of the entity set.
    pub fn pages(&self) -> Result<ODataPages<T>, Error> {
        Ok(self.client.pages(&self.set()?, RequestOptions::new()))
    }

    /// Fetches `entity` by its key.
    pub async fn fetch(&self, entity: &T) -> Result<T, Error> {
        self.client
            .get_json(&self.entity(entity)?, &RequestOptions::new())
            .await
    }

    /// Creates `entity` and returns the stored version.
    ///
    /// Returns `entity` itself when the service does not echo it.
    pub async fn create(&self, entity: &T) -> Result<T, Error> {
        let options = RequestOptions::new().return_representation();
        let response = self.client.post(&self.set()?, entity, &options).await?;
        representation_or(response, entity)
    }

    /// Fetches `entity`, creating it when the service answers 404.
    ///
    /// Any other error is returned unchanged.
    pub async fn fetch_or_create(&self, entity: &T) -> Result<T, Error> {
        match self.fetch(entity).await {
            Err(e) if e.is_not_found() => {
                log::debug!("{} not found, creating it", T::ENTITY_SET);
                self.create(entity).await
            }
            other => other,
        }
    }

    /// Replaces `entity` (PUT) and returns the stored version.
    pub async fn update(&self, entity: &T) -> Result<T, Error> {
        let options = with_etag(RequestOptions::new().return_representation(), entity.etag());
        let response = self.client.put(&self.entity(entity)?, entity, &options).await?;
        representation_or(response, entity)
    }

    /// Applies `changes` to `entity` (PATCH).
    pub async fn assign<P: Serialize + ?Sized>(
        &self,
        entity: &T,
        changes: &P,
        options: &RequestOptions,
    ) -> Result<(), Error> {
        let options = with_etag(options.clone(), entity.etag());
        self.client.patch(&self.entity(entity)?, changes, &options).await?;
        Ok(())
    }

    /// Deletes `entity`.
    pub async fn destroy(&self, entity: &T, options: &RequestOptions) -> Result<(), Error> {
        let options = with_etag(options.clone(), entity.etag());
        self.client.delete(&self.entity(entity)?, &options).await?;
        Ok(())
    }

    /// Creates `entity` if it is new, updates it otherwise.
    pub async fn save(&self, entity: &T) -> Result<T, Error> {
        if self.is_new(entity) {
            self.create(entity).await
        } else {
            self.update(entity).await
        }
    }

    // -------------------------------------------------------------------------
    // Navigation and properties
    // -------------------------------------------------------------------------

    /// Fetches a single-valued navigation property of `entity`.
    pub async fn navigation_property<P: DeserializeOwned>(
        &self,
        entity: &T,
        name: &str,
        options: &RequestOptions,
    ) -> Result<P, Error> {
        let query = self.entity(entity)?.navigation(name);
        self.client.get_json(&query, options).await
    }

    /// Fetches a collection-valued navigation property of `entity`.
    pub async fn navigation_property_set<P: DeserializeOwned>(
        &self,
        entity: &T,
        name: &str,
        options: &RequestOptions,
    ) -> Result<EntitySet<P>, Error> {
        let query = self.entity(entity)?.navigation(name);
        self.client.get_entity_set(&query, options).await
    }

    /// Fetches a structural property of `entity`.
    pub async fn property<P: DeserializeOwned>(
        &self,
        entity: &T,
        name: &str,
        options: &RequestOptions,
    ) -> Result<P, Error> {
        let query = self.entity(entity)?.property(name);
        self.client.get_property(&query, options).await
    }

    // -------------------------------------------------------------------------
    // References
    // -------------------------------------------------------------------------

    /// Points the single-valued navigation property `name` at `target`.
    pub async fn create_ref(
        &self,
        entity: &T,
        name: &str,
        target: &QueryBuilder,
        options: &RequestOptions,
    ) -> Result<(), Error> {
        let query = self.entity(entity)?.navigation(name).reference();
        let body = json!({ "@odata.id": self.client.endpoint_url(target) });
        let options = with_etag(options.clone(), entity.etag());
        self.client.put(&query, &body, &options).await?;
        Ok(())
    }

    /// Adds `target` to the collection-valued navigation property `name`.
    pub async fn create_collection_ref(
        &self,
        entity: &T,
        name: &str,
        target: &QueryBuilder,
        options: &RequestOptions,
    ) -> Result<(), Error> {
        let query = self.entity(entity)?.navigation(name).reference();
        let body = json!({ "@odata.id": self.client.endpoint_url(target) });
        self.client.post(&query, &body, options).await?;
        Ok(())
    }

    /// Clears the single-valued navigation property `name`.
    pub async fn delete_ref(&self, entity: &T, name: &str, options: &RequestOptions) -> Result<(), Error> {
        let query = self.entity(entity)?.navigation(name).reference();
        let options = with_etag(options.clone(), entity.etag());
        self.client.delete(&query, &options).await?;
        Ok(())
    }

    /// Removes `target` from the collection-valued navigation property `name`.
    pub async fn delete_collection_ref(
        &self,
        entity: &T,
        name: &str,
        target: &QueryBuilder,
        options: &RequestOptions,
    ) -> Result<(), Error> {
        let query = self.entity(entity)?.navigation(name).reference();
        let options = with_etag(options.clone(), entity.etag()).param("$id", self.client.endpoint_url(target));
        self.client.delete(&query, &options).await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Bound actions
    // -------------------------------------------------------------------------

    /// Invokes the action `name` bound to `entity`.
    ///
    /// Returns `None` when the action has no return value.
    pub async fn custom_action<P: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        entity: &T,
        name: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<Option<P>, Error> {
        let query = self.entity(entity)?.action(name);
        optional_json(self.client.post(&query, body, options).await?)
    }

    /// Invokes the action `name` bound to `entity`, decoding an entity set.
    pub async fn custom_action_set<P: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        entity: &T,
        name: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<EntitySet<P>, Error> {
        let query = self.entity(entity)?.action(name);
        EntitySet::from_json(&self.client.post(&query, body, options).await?.body)
    }

    /// Invokes the action `name` bound to `entity`, decoding a property value.
    pub async fn custom_action_property<P: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        entity: &T,
        name: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<P, Error> {
        let query = self.entity(entity)?.action(name);
        property_value(self.client.post(&query, body, options).await?)
    }

    /// Invokes the action `name` bound to the entity set.
    pub async fn custom_collection_action<P: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        name: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<Option<P>, Error> {
        let query = self.set()?.action(name);
        optional_json(self.client.post(&query, body, options).await?)
    }

    /// Invokes the action `name` bound to the entity set, decoding an entity set.
    pub async fn custom_collection_action_set<P: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        name: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<EntitySet<P>, Error> {
        let query = self.set()?.action(name);
        EntitySet::from_json(&self.client.post(&query, body, options).await?.body)
    }

    /// Invokes the action `name` bound to the entity set, decoding a property value.
    pub async fn custom_collection_action_property<P: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        name: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<P, Error> {
        let query = self.set()?.action(name);
        property_value(self.client.post(&query, body, options).await?)
    }

    // -------------------------------------------------------------------------
    // Bound functions
    // -------------------------------------------------------------------------

    /// Calls the function `name` bound to `entity`.
    pub async fn custom_function<P, K, V>(
        &self,
        entity: &T,
        name: &str,
        parameters: impl IntoIterator<Item = (K, V)>,
        options: &RequestOptions,
    ) -> Result<P, Error>
    where
        P: DeserializeOwned,
        K: Into<String>,
        V: Into<Value>,
    {
        let query = self.entity(entity)?.function(name, parameters);
        self.client.get_json(&query, options).await
    }

    /// Calls the function `name` bound to `entity`, decoding an entity set.
    pub async fn custom_function_set<P, K, V>(
        &self,
        entity: &T,
        name: &str,
        parameters: impl IntoIterator<Item = (K, V)>,
        options: &RequestOptions,
    ) -> Result<EntitySet<P>, Error>
    where
        P: DeserializeOwned,
        K: Into<String>,
        V: Into<Value>,
    {
        let query = self.entity(entity)?.function(name, parameters);
        self.client.get_entity_set(&query, options).await
    }

    /// Calls the function `name` bound to `entity`, decoding a property value.
    pub async fn custom_function_property<P, K, V>(
        &self,
        entity: &T,
        name: &str,
        parameters: impl IntoIterator<Item = (K, V)>,
        options: &RequestOptions,
    ) -> Result<P, Error>
    where
        P: DeserializeOwned,
        K: Into<String>,
        V: Into<Value>,
    {
        let query = self.entity(entity)?.function(name, parameters);
        self.client.get_property(&query, options).await
    }

    /// Calls the function `name` bound to the entity set.
    pub async fn custom_collection_function<P, K, V>(
        &self,
        name: &str,
        parameters: impl IntoIterator<Item = (K, V)>,
        options: &RequestOptions,
    ) -> Result<P, Error>
    where
        P: DeserializeOwned,
        K: Into<String>,
        V: Into<Value>,
    {
        let query = self.set()?.function(name, parameters);
        self.client.get_json(&query, options).await
    }

    /// Calls the function `name` bound to the entity set, decoding an entity set.
    pub async fn custom_collection_function_set<P, K, V>(
        &self,
        name: &str,
        parameters: impl IntoIterator<Item = (K, V)>,
        options: &RequestOptions,
    ) -> Result<EntitySet<P>, Error>
    where
        P: DeserializeOwned,
        K: Into<String>,
        V: Into<Value>,
    {
        let query = self.set()?.function(name, parameters);
        self.client.get_entity_set(&query, options).await
    }

    /// Calls the function `name` bound to the entity set, decoding a property value.
    pub async fn custom_collection_function_property<P, K, V>(
        &self,
        name: &str,
        parameters: impl IntoIterator<Item = (K, V)>,
        options: &RequestOptions,
    ) -> Result<P, Error>
    where
        P: DeserializeOwned,
        K: Into<String>,
        V: Into<Value>,
    {
        let query = self.set()?.function(name, parameters);
        self.client.get_property(&query, options).await
    }
}

fn with_etag(options: RequestOptions, etag: Option<&str>) -> RequestOptions {
    match etag {
        Some(etag) => options.if_match(etag),
        None => options,
    }
}

fn representation_or<T: ODataEntity>(response: HttpResponse, submitted: &T) -> Result<T, Error> {
    if response.is_empty() {
        Ok(submitted.clone())
    } else {
        response.json()
    }
}

fn optional_json<P: DeserializeOwned>(response: HttpResponse) -> Result<Option<P>, Error> {
    if response.is_empty() {
        Ok(None)
    } else {
        response.json().map(Some)
    }
}

fn property_value<P: DeserializeOwned>(response: HttpResponse) -> Result<P, Error> {
    let mut body: serde_json::Value = response.json()?;
    match body.get_mut("value") {
        Some(value) => Ok(serde_json::from_value(value.take())?),
        None => Ok(serde_json::from_value(body)?),
    }
}

//! Request execution
//!
//! Every request made by the crate funnels through [`ODataClient::request`],
//! which applies the default OData headers, the per-request options, and maps
//! non-success statuses to [`ApiError::Http`].

use reqwest::Method;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::IF_MATCH;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::RequestOptions;
use super::query::EntitySet;
use super::query::ODataPages;
use super::query::QueryBuilder;
use super::query::url::encode_component;
use crate::ODataClient;
use crate::client::parse_header;
use crate::error::ApiError;
use crate::error::Error;
use crate::transport::HttpRequest;
use crate::transport::HttpResponse;

impl ODataClient {
    /// Sends a request to `target` and returns the raw response.
    ///
    /// `target` is either a path relative to the service root (query string
    /// included) or an absolute URL. Non-2xx responses become
    /// [`ApiError::Http`], with the OData error document decoded when present.
    pub async fn request(
        &self,
        method: Method,
        target: &str,
        body: Option<String>,
        options: &RequestOptions,
    ) -> Result<HttpResponse, Error> {
        let url = append_params(self.resolve_url(target), options);
        let headers = self.build_headers(body.is_some(), options)?;

        log::debug!("{} {}", method, url);

        let response = self
            .transport()
            .send(HttpRequest {
                method: method.clone(),
                url: url.clone(),
                headers,
                body,
            })
            .await?;

        if response.is_success() {
            Ok(response)
        } else {
            log::warn!("{} {} failed with status {}", method, url, response.status);
            Err(ApiError::from_response(response.status.as_u16(), &response.body).into())
        }
    }

    fn build_headers(&self, has_body: bool, options: &RequestOptions) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert("OData-Version", HeaderValue::from_static("4.0"));
        headers.insert("OData-MaxVersion", HeaderValue::from_static("4.0"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        for (name, value) in self.default_headers() {
            headers.insert(name.clone(), value.clone());
        }

        if options.wants_representation() {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        if let Some(etag) = options.etag() {
            let value = HeaderValue::from_str(etag).map_err(|_| ApiError::InvalidHeader {
                name: IF_MATCH.to_string(),
            })?;
            headers.insert(IF_MATCH, value);
        }

        for (name, value) in options.headers() {
            let (name, value) = parse_header(name, value)?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    /// GETs `query`.
    pub async fn get(&self, query: &QueryBuilder, options: &RequestOptions) -> Result<HttpResponse, Error> {
        self.request(Method::GET, &query.to_string(), None, options).await
    }

    /// POSTs `body` as JSON to `query`.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        query: &QueryBuilder,
        body: &B,
        options: &RequestOptions,
    ) -> Result<HttpResponse, Error> {
        let body = serde_json::to_string(body)?;
        self.request(Method::POST, &query.to_string(), Some(body), options).await
    }

    /// PUTs `body` as JSON to `query`.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        query: &QueryBuilder,
        body: &B,
        options: &RequestOptions,
    ) -> Result<HttpResponse, Error> {
        let body = serde_json::to_string(body)?;
        self.request(Method::PUT, &query.to_string(), Some(body), options).await
    }

    /// PATCHes `query` with `body` as JSON.
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        query: &QueryBuilder,
        body: &B,
        options: &RequestOptions,
    ) -> Result<HttpResponse, Error> {
        let body = serde_json::to_string(body)?;
        self.request(Method::PATCH, &query.to_string(), Some(body), options).await
    }

    /// DELETEs `query`.
    pub async fn delete(&self, query: &QueryBuilder, options: &RequestOptions) -> Result<HttpResponse, Error> {
        self.request(Method::DELETE, &query.to_string(), None, options).await
    }

    /// GETs `query` and decodes the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        query: &QueryBuilder,
        options: &RequestOptions,
    ) -> Result<T, Error> {
        self.get(query, options).await?.json()
    }

    /// GETs `query` and decodes it as an entity set.
    pub async fn get_entity_set<T: DeserializeOwned>(
        &self,
        query: &QueryBuilder,
        options: &RequestOptions,
    ) -> Result<EntitySet<T>, Error> {
        self.get_entity_set_at(&query.to_string(), options).await
    }

    /// GETs an entity set from a path or absolute URL such as a next link.
    pub async fn get_entity_set_at<T: DeserializeOwned>(
        &self,
        target: &str,
        options: &RequestOptions,
    ) -> Result<EntitySet<T>, Error> {
        let response = self.request(Method::GET, target, None, options).await?;
        EntitySet::from_json(&response.body)
    }

    /// GETs a single property and returns its `value`.
    pub async fn get_property<T: DeserializeOwned>(
        &self,
        query: &QueryBuilder,
        options: &RequestOptions,
    ) -> Result<T, Error> {
        let response = self.get(query, options).await?;
        let mut body: serde_json::Value = response.json()?;
        let value = body
            .get_mut("value")
            .map(serde_json::Value::take)
            .ok_or_else(|| ApiError::parse_with_body("response has no 'value'", response.body.clone()))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Counts the entities matched by `query` via `/$count`.
    ///
    /// Only `$filter` and `$search` of `query` apply.
    pub async fn count(&self, query: &QueryBuilder, options: &RequestOptions) -> Result<usize, Error> {
        let options = options.clone().header("Accept", "text/plain");
        let response = self.get(&query.count_query(), &options).await?;
        response
            .body
            .trim()
            .trim_start_matches('\u{feff}')
            .parse::<usize>()
            .map_err(|_| Error::from(ApiError::parse_with_body("count is not a number", response.body.clone())))
    }

    /// Returns an async iterator over all pages of `query`.
    pub fn pages<T: DeserializeOwned>(&self, query: &QueryBuilder, options: RequestOptions) -> ODataPages<T> {
        ODataPages::new(self.clone(), query, options)
    }
}

fn append_params(mut url: String, options: &RequestOptions) -> String {
    for (name, value) in options.params() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&encode_component(name));
        url.push('=');
        url.push_str(&encode_component(value));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_params() {
        let options = RequestOptions::new().param("a", "1").param("b", "x y");
        assert_eq!(
            append_params("https://h/svc/People".to_string(), &options),
            "https://h/svc/People?a=1&b=x%20y"
        );
        assert_eq!(
            append_params("https://h/svc/People?$top=1".to_string(), &options),
            "https://h/svc/People?$top=1&a=1&b=x%20y"
        );
        assert_eq!(
            append_params("https://h/svc/People".to_string(), &RequestOptions::new()),
            "https://h/svc/People"
        );
    }
}

//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use odata_lib::ODataClient;
use odata_lib::api::query::EntityKey;
use odata_lib::error::Error;
use odata_lib::model::ODataEntity;
use odata_lib::transport::HttpRequest;
use odata_lib::transport::HttpResponse;
use odata_lib::transport::Transport;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;

pub const SERVICE_ROOT: &str = "https://example.org/TripPinService";

/// In-memory transport that records requests and replays scripted responses.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a response.
    pub fn respond(&self, response: HttpResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Queues a JSON response.
    pub fn respond_json(&self, status: u16, body: serde_json::Value) {
        self.respond(
            HttpResponse::new(StatusCode::from_u16(status).unwrap(), body.to_string())
                .with_header("Content-Type", "application/json"),
        );
    }

    /// Queues a response with an empty body.
    pub fn respond_empty(&self, status: u16) {
        self.respond(HttpResponse::new(StatusCode::from_u16(status).unwrap(), ""));
    }

    /// Returns every request sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns the `n`-th request sent.
    pub fn request(&self, n: usize) -> HttpRequest {
        self.requests.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        self.requests.lock().unwrap().push(request);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left");
        Ok(response)
    }
}

/// Creates a client backed by `transport`.
pub fn client(transport: &Arc<MockTransport>) -> ODataClient {
    ODataClient::builder()
        .service_root(SERVICE_ROOT)
        .transport(transport.clone())
        .build()
        .unwrap()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Person {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "@odata.etag", default, skip_serializing)]
    pub etag: Option<String>,
}

impl Person {
    pub fn new(user_name: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            user_name: Some(user_name.to_string()),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            etag: None,
        }
    }
}

impl ODataEntity for Person {
    const ENTITY_SET: &'static str = "People";

    fn key(&self) -> Option<EntityKey> {
        self.user_name.clone().map(EntityKey::from)
    }

    fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }
}

/// JSON of an entity set page with `n` people starting at index `from`.
pub fn people_page(from: usize, n: usize, count: Option<usize>, next_skip: Option<usize>) -> serde_json::Value {
    let value: Vec<_> = (from..from + n)
        .map(|i| {
            serde_json::json!({
                "UserName": format!("user{}", i),
                "FirstName": "First",
                "LastName": format!("Last{}", i),
            })
        })
        .collect();

    let mut page = serde_json::json!({ "value": value });
    if let Some(count) = count {
        page["@odata.count"] = count.into();
    }
    if let Some(skip) = next_skip {
        page["@odata.nextLink"] = format!("{}/People?%24skip={}", SERVICE_ROOT, skip).into();
    }
    page
}

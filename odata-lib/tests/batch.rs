//! Integration tests for `$batch` execution.

mod common;

use common::MockTransport;
use common::Person;
use common::SERVICE_ROOT;
use common::client;
use odata_lib::api::BatchItem;
use odata_lib::api::RequestOptions;
use odata_lib::api::query::QueryBuilder;
use odata_lib::error::Error;
use odata_lib::transport::HttpResponse;
use reqwest::Method;
use reqwest::StatusCode;

const RESPONSE: &str = "--batchresponse_1\r\n\
Content-Type: application/http\r\n\
Content-Transfer-Encoding: binary\r\n\
\r\n\
HTTP/1.1 200 OK\r\n\
Content-Type: application/json\r\n\
\r\n\
{\"value\":[{\"UserName\":\"russellwhyte\",\"FirstName\":\"Russell\",\"LastName\":\"Whyte\"}]}\r\n\
--batchresponse_1\r\n\
Content-Type: multipart/mixed; boundary=changesetresponse_1\r\n\
\r\n\
--changesetresponse_1\r\n\
Content-Type: application/http\r\n\
Content-Transfer-Encoding: binary\r\n\
Content-ID: 1\r\n\
\r\n\
HTTP/1.1 201 Created\r\n\
Content-Type: application/json\r\n\
\r\n\
{\"UserName\":\"lewisblack\",\"FirstName\":\"Lewis\",\"LastName\":\"Black\"}\r\n\
--changesetresponse_1\r\n\
Content-Type: application/http\r\n\
Content-Transfer-Encoding: binary\r\n\
Content-ID: 2\r\n\
\r\n\
HTTP/1.1 404 Not Found\r\n\
Content-Type: application/json\r\n\
\r\n\
{\"error\":{\"code\":\"NotFound\",\"message\":\"No person\"}}\r\n\
--changesetresponse_1--\r\n\
--batchresponse_1--\r\n";

fn people() -> QueryBuilder {
    QueryBuilder::new("People").unwrap()
}

#[tokio::test]
async fn test_execute_posts_multipart_body() {
    let transport = MockTransport::new();
    transport.respond(
        HttpResponse::new(StatusCode::OK, RESPONSE)
            .with_header("Content-Type", "multipart/mixed; boundary=batchresponse_1"),
    );
    let client = client(&transport);

    let mut batch = client.batch();
    batch.set_batch_boundary("batch_test");
    batch
        .get(people().top(1))
        .post(people(), &Person::new("lewisblack", "Lewis", "Black"))
        .unwrap()
        .delete(people().key("vincentcalabrese"));
    let expected_body = batch.body();
    assert!(expected_body.contains("GET People?$top=1 HTTP/1.1\r\n"));

    let response = batch.execute(&client, &RequestOptions::new()).await.unwrap();

    let request = transport.request(0);
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url, format!("{}/$batch", SERVICE_ROOT));
    assert_eq!(request.header("Content-Type"), Some("multipart/mixed;boundary=batch_test"));
    assert_eq!(request.header("Accept"), Some("multipart/mixed"));
    assert_eq!(request.header("OData-Version"), Some("4.0"));

    let sent = request.body.unwrap();
    assert!(sent.starts_with("--batch_test\r\n"));
    assert!(sent.ends_with("--batch_test--"));
    assert!(sent.contains("DELETE People('vincentcalabrese') HTTP/1.1\r\n"));

    assert_eq!(response.len(), 2);
    assert!(!response.all_succeeded());

    let BatchItem::Part(get) = &response.items()[0] else {
        panic!("expected a standalone part");
    };
    let listed: serde_json::Value = get.json().unwrap();
    assert_eq!(listed["value"][0]["UserName"], "russellwhyte");

    let created: Person = response.by_content_id("1").unwrap().json().unwrap();
    assert_eq!(created, Person::new("lewisblack", "Lewis", "Black"));

    let failed = response.by_content_id("2").unwrap();
    assert_eq!(failed.status, 404);
    assert_eq!(failed.error().and_then(|e| e.status_code()), Some(404));
}

#[tokio::test]
async fn test_execute_option_headers_override_defaults() {
    let transport = MockTransport::new();
    transport.respond(
        HttpResponse::new(StatusCode::OK, RESPONSE)
            .with_header("Content-Type", "multipart/mixed; boundary=batchresponse_1"),
    );
    let client = client(&transport);

    let mut batch = client.batch();
    batch.get(people());
    let options = RequestOptions::new().header("Prefer", "odata.continue-on-error");
    batch.execute(&client, &options).await.unwrap();

    assert_eq!(
        transport.request(0).header("Prefer"),
        Some("odata.continue-on-error")
    );
}

#[tokio::test]
async fn test_empty_batch_is_sent_with_empty_body() {
    let transport = MockTransport::new();
    transport.respond(
        HttpResponse::new(StatusCode::OK, "--batchresponse_2--\r\n")
            .with_header("Content-Type", "multipart/mixed; boundary=batchresponse_2"),
    );
    let client = client(&transport);

    let response = client.batch().execute(&client, &RequestOptions::new()).await.unwrap();

    assert!(response.is_empty());
    let request = transport.request(0);
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url, format!("{}/$batch", SERVICE_ROOT));
    assert_eq!(request.body.as_deref(), Some(""));
}

#[tokio::test]
async fn test_batch_level_error_is_returned() {
    let transport = MockTransport::new();
    transport.respond_json(
        400,
        serde_json::json!({"error": {"code": "BadRequest", "message": "Malformed batch"}}),
    );
    let client = client(&transport);

    let mut batch = client.batch();
    batch.get(people());
    let err = batch.execute(&client, &RequestOptions::new()).await.unwrap_err();

    assert_eq!(err.status_code(), Some(400));
}

#[tokio::test]
async fn test_response_without_boundary_fails() {
    let transport = MockTransport::new();
    transport.respond_json(200, serde_json::json!({}));
    let client = client(&transport);

    let mut batch = client.batch();
    batch.get(people());
    let result = batch.execute(&client, &RequestOptions::new()).await;

    assert!(matches!(result, Err(Error::Api(_))));
}

//! Batch response parsing.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::error::Error;

// =============================================================================
// Batch Part
// =============================================================================

/// The HTTP response of one request inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPart {
    /// The `Content-ID` of the part, set for requests inside a changeset.
    pub content_id: Option<String>,
    /// The HTTP status code.
    pub status: u16,
    /// Response headers, in order of appearance.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: String,
}

impl BatchPart {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::Api(ApiError::parse_with_body(e.to_string(), self.body.clone())))
    }

    /// Returns the error of a failed part.
    pub fn error(&self) -> Option<ApiError> {
        if self.is_success() {
            None
        } else {
            Some(ApiError::from_response(self.status, &self.body))
        }
    }
}

// =============================================================================
// Batch Item
// =============================================================================

/// A top-level item of a batch response.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem {
    /// A standalone request (GETs).
    Part(BatchPart),
    /// The responses of one changeset.
    Changeset(Vec<BatchPart>),
}

// =============================================================================
// Batch Response
// =============================================================================

/// Parsed `multipart/mixed` batch response.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse {
    items: Vec<BatchItem>,
}

impl BatchResponse {
    /// Parses a multipart batch response delimited by `boundary`.
    pub fn parse(response_body: &str, boundary: &str) -> Result<Self, Error> {
        let mut items = Vec::new();

        for part in split_multipart(response_body, boundary) {
            let (mime_headers, content) = split_head(part);
            let mime_headers = parse_headers(mime_headers);

            let nested = find_header(&mime_headers, "content-type")
                .filter(|ct| ct.to_ascii_lowercase().starts_with("multipart/mixed"))
                .and_then(extract_boundary);

            match nested {
                Some(changeset_boundary) => {
                    let parts = split_multipart(content, &changeset_boundary)
                        .into_iter()
                        .map(parse_http_part)
                        .collect::<Result<Vec<_>, _>>()?;
                    items.push(BatchItem::Changeset(parts));
                }
                None => items.push(BatchItem::Part(parse_http_part(part)?)),
            }
        }

        Ok(BatchResponse { items })
    }

    /// Returns the number of top-level items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the top-level items.
    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    /// Iterates over every part, flattening changesets.
    pub fn parts(&self) -> impl Iterator<Item = &BatchPart> {
        self.items.iter().flat_map(|item| match item {
            BatchItem::Part(part) => std::slice::from_ref(part),
            BatchItem::Changeset(parts) => parts.as_slice(),
        })
    }

    /// Finds a changeset part by its `Content-ID`.
    pub fn by_content_id(&self, content_id: &str) -> Option<&BatchPart> {
        self.parts()
            .find(|part| part.content_id.as_deref() == Some(content_id))
    }

    /// Checks if all parts succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.parts().all(BatchPart::is_success)
    }

    /// Returns the items as a vector.
    pub fn into_items(self) -> Vec<BatchItem> {
        self.items
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Splits a multipart body into its parts, dropping the preamble and the
/// closing delimiter.
fn split_multipart<'a>(body: &'a str, boundary: &str) -> Vec<&'a str> {
    let marker = format!("--{}", boundary);
    body.split(marker.as_str())
        .skip(1)
        .take_while(|part| !part.starts_with("--"))
        .map(|part| part.trim_start_matches(['\r', '\n']))
        .collect()
}

/// Splits a block at the first blank line into (head, rest).
fn split_head(block: &str) -> (&str, &str) {
    let crlf = block.find("\r\n\r\n").map(|i| (i, 4));
    let lf = block.find("\n\n").map(|i| (i, 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };
    match split {
        Some((i, len)) => (&block[..i], &block[i + len..]),
        None => (block, ""),
    }
}

fn parse_headers(head: &str) -> Vec<(String, String)> {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Parses one `application/http` part.
fn parse_http_part(part: &str) -> Result<BatchPart, Error> {
    let (mime_head, message) = split_head(part);
    let content_id = find_header(&parse_headers(mime_head), "content-id").map(str::to_string);

    let (head, body) = split_head(message);
    let mut lines = head.lines();
    let status_line = lines
        .find(|line| line.starts_with("HTTP/"))
        .ok_or_else(|| ApiError::parse_with_body("batch part has no HTTP status line", part))?;

    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::parse_with_body("invalid batch part status", status_line))?;

    let headers = parse_headers(&lines.collect::<Vec<_>>().join("\n"));

    Ok(BatchPart {
        content_id,
        status,
        headers,
        body: body.trim_end_matches(['\r', '\n']).to_string(),
    })
}

/// Extracts the boundary from a response Content-Type header value.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .find_map(|part| part.trim().strip_prefix("boundary="))
        .map(|boundary| boundary.trim_matches('"').to_string())
        .filter(|boundary| !boundary.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "--batchresponse_1\r\n\
Content-Type: application/http\r\n\
Content-Transfer-Encoding: binary\r\n\
\r\n\
HTTP/1.1 200 OK\r\n\
Content-Type: application/json; odata.metadata=minimal\r\n\
\r\n\
{\"value\":[{\"UserName\":\"russellwhyte\"}]}\r\n\
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
ETag: W/\"08D1\"\r\n\
\r\n\
{\"UserName\":\"lewisblack\"}\r\n\
--changesetresponse_1\r\n\
Content-Type: application/http\r\n\
Content-Transfer-Encoding: binary\r\n\
Content-ID: 2\r\n\
\r\n\
HTTP/1.1 204 No Content\r\n\
\r\n\
\r\n\
--changesetresponse_1--\r\n\
--batchresponse_1--\r\n";

    #[test]
    fn test_parse_parts_and_changesets() {
        let response = BatchResponse::parse(RESPONSE, "batchresponse_1").unwrap();
        assert_eq!(response.len(), 2);

        let BatchItem::Part(get) = &response.items()[0] else {
            panic!("expected a standalone part");
        };
        assert_eq!(get.status, 200);
        assert_eq!(get.content_id, None);
        let value: serde_json::Value = get.json().unwrap();
        assert_eq!(value["value"][0]["UserName"], "russellwhyte");

        let BatchItem::Changeset(parts) = &response.items()[1] else {
            panic!("expected a changeset");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].status, 201);
        assert_eq!(parts[0].header("etag"), Some("W/\"08D1\""));
        assert_eq!(parts[0].body, "{\"UserName\":\"lewisblack\"}");
        assert_eq!(parts[1].status, 204);
        assert_eq!(parts[1].body, "");

        assert!(response.all_succeeded());
        assert_eq!(response.by_content_id("2").map(|p| p.status), Some(204));
        assert_eq!(response.parts().count(), 3);
    }

    #[test]
    fn test_failed_part_exposes_odata_error() {
        let body = "--b\r\n\
Content-Type: application/http\r\n\
\r\n\
HTTP/1.1 404 Not Found\r\n\
Content-Type: application/json\r\n\
\r\n\
{\"error\":{\"code\":\"NotFound\",\"message\":\"No entity\"}}\r\n\
--b--";

        let response = BatchResponse::parse(body, "b").unwrap();
        assert!(!response.all_succeeded());

        let part = response.parts().next().unwrap();
        let error = part.error().unwrap();
        assert_eq!(error.status_code(), Some(404));
        assert_eq!(error.error_code(), Some("NotFound"));
    }

    #[test]
    fn test_missing_status_line() {
        let body = "--b\r\nContent-Type: application/http\r\n\r\ngarbage\r\n--b--";
        assert!(BatchResponse::parse(body, "b").is_err());
    }

    #[test]
    fn test_extract_boundary() {
        assert_eq!(
            extract_boundary("multipart/mixed; boundary=batchresponse_abc"),
            Some("batchresponse_abc".to_string())
        );
        assert_eq!(
            extract_boundary("multipart/mixed;boundary=\"quoted\""),
            Some("quoted".to_string())
        );
        assert_eq!(extract_boundary("application/json"), None);
    }
}

//! Multipart MIME request builder for batch operations.
//!
//! GET requests are written as standalone batch parts. Consecutive non-GET
//! requests share one changeset, which is closed as soon as a GET follows or
//! the batch ends. Non-GET parts are numbered with `Content-ID` from 1.

use reqwest::Method;
use uuid::Uuid;

use super::BatchRequest;

const CRLF: &str = "\r\n";

/// Generates a unique boundary string, e.g. `changeset_<uuid>`.
pub fn generate_boundary(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4())
}

/// Builds the multipart batch request body.
///
/// Returns an empty string for an empty request list.
pub fn build_batch_body(requests: &[BatchRequest], batch_boundary: &str) -> String {
    build_batch_body_with(requests, batch_boundary, || generate_boundary("changeset"))
}

/// Same as [`build_batch_body`], with changeset boundaries taken from
/// `next_changeset`.
pub(crate) fn build_batch_body_with(
    requests: &[BatchRequest],
    batch_boundary: &str,
    next_changeset: impl FnMut() -> String,
) -> String {
    let mut writer = BodyWriter {
        out: String::new(),
        batch_boundary,
        changeset: None,
        next_changeset,
        content_id: 1,
    };

    for request in requests {
        writer.write_request(request);
    }

    writer.finish()
}

/// Serialization state for one pass over the requests.
struct BodyWriter<'a, F> {
    out: String,
    batch_boundary: &'a str,
    changeset: Option<String>,
    next_changeset: F,
    content_id: u32,
}

impl<F: FnMut() -> String> BodyWriter<'_, F> {
    fn line(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push_str(CRLF);
    }

    fn close_changeset(&mut self) {
        if let Some(changeset) = self.changeset.take() {
            self.line(&format!("--{}--", changeset));
        }
    }

    fn write_request(&mut self, request: &BatchRequest) {
        let is_get = request.method == Method::GET;

        if is_get {
            self.close_changeset();
        }

        if self.changeset.is_none() {
            self.line(&format!("--{}", self.batch_boundary));
        }

        if !is_get {
            let changeset = match &self.changeset {
                Some(changeset) => changeset.clone(),
                None => {
                    let changeset = (self.next_changeset)();
                    self.line(&format!("Content-Type: multipart/mixed; boundary={}", changeset));
                    self.line("");
                    self.changeset = Some(changeset.clone());
                    changeset
                }
            };
            self.line(&format!("--{}", changeset));
        }

        self.line("Content-Type: application/http");
        self.line("Content-Transfer-Encoding: binary");
        if !is_get {
            let id = self.content_id;
            self.content_id += 1;
            self.line(&format!("Content-ID: {}", id));
        }

        self.line("");
        self.line(&format!("{} {} HTTP/1.1", request.method, request.query));

        if carries_body(&request.method) {
            self.line("Content-Type: application/json");
        }
        for (name, value) in &request.headers {
            self.line(&format!("{}: {}", name, value));
        }
        self.line("");

        match (&request.body, carries_body(&request.method)) {
            (Some(body), true) => self.line(&body.to_string()),
            _ => self.line(""),
        }
    }

    fn finish(mut self) -> String {
        if self.out.is_empty() {
            return self.out;
        }
        self.close_changeset();
        self.out.push_str(&format!("--{}--", self.batch_boundary));
        self.out
    }
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

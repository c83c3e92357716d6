//! Common test utilities shared across all integration test files.
//!
//! Usage in test files:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

use agrigpt_client::{
    AgriClient, ApiError, BuildMode, ImageFile, InboundResponse, Interceptor, MemoryStore,
    OutboundRequest, RequestContext,
};
use reqwest::header::CONTENT_TYPE;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{MockServer, Request};

/// Smallest valid PNG (1x1 red pixel).
#[allow(dead_code)]
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0xFC,
    0xCF, 0xC0, 0xF0, 0x1F, 0x00, 0x05, 0x05, 0x02, 0x00, 0x5F, 0xC8, 0xF1, 0xD2, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[allow(dead_code)]
pub fn sample_png() -> ImageFile {
    ImageFile::new("leaf.png", "image/png", TINY_PNG.to_vec())
}

/// A client pointed at `server`, with an in-memory session store.
#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> AgriClient {
    AgriClient::builder()
        .base_url(server.uri())
        .timeout(Duration::from_secs(10))
        .mode(BuildMode::Development)
        .session_store(MemoryStore::new())
        .build()
        .expect("client should build")
}

/// A base URL on which nothing is listening.
#[allow(dead_code)]
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// Records every pipeline hook invocation as a line of text.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    pub events: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl Interceptor for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn on_request(&self, request: &mut OutboundRequest) {
        self.push(format!(
            "request {} {} content-type={}",
            request.method,
            request.path,
            request.headers.contains_key(CONTENT_TYPE)
        ));
    }

    fn on_response(&self, context: &RequestContext, response: &InboundResponse) {
        self.push(format!("response {} {}", context.path, response.status));
    }

    fn on_error(&self, context: &RequestContext, error: &ApiError) {
        self.push(format!(
            "error {} {} {}",
            context.path, error.status, error.message
        ));
    }
}

/// One part of a received `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[allow(dead_code)]
impl FormPart {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn quoted_param(header: &str, key: &str) -> Option<String> {
    let marker = format!("{key}=\"");
    let start = header.find(&marker)? + marker.len();
    let end = header[start..].find('"')? + start;
    Some(header[start..end].to_string())
}

/// Splits a received multipart request into its parts.
///
/// # Panics
///
/// Panics if the request is not a well-formed multipart request.
#[allow(dead_code)]
pub fn parse_multipart(request: &Request) -> Vec<FormPart> {
    let content_type = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .expect("multipart request should carry a content-type");
    let boundary = content_type
        .split("boundary=")
        .nth(1)
        .expect("content-type should carry a boundary")
        .trim_matches('"');
    let delimiter = format!("--{boundary}").into_bytes();
    let body = &request.body;

    let mut parts = Vec::new();
    let mut cursor = find(body, &delimiter, 0).expect("opening delimiter") + delimiter.len();

    loop {
        if body[cursor..].starts_with(b"--") {
            break;
        }
        let header_start = cursor + 2; // CRLF after the delimiter
        let header_end = find(body, b"\r\n\r\n", header_start).expect("part headers");
        let next = find(body, &delimiter, header_end).expect("closing delimiter");

        let headers = String::from_utf8_lossy(&body[header_start..header_end]).into_owned();
        let data = body[header_end + 4..next - 2].to_vec(); // strip trailing CRLF

        let mut name = String::new();
        let mut file_name = None;
        let mut part_type = None;
        for line in headers.split("\r\n") {
            let lower = line.to_ascii_lowercase();
            if lower.starts_with("content-disposition:") {
                name = quoted_param(line, "name").unwrap_or_default();
                file_name = quoted_param(line, "filename");
            } else if lower.starts_with("content-type:") {
                part_type = line.split_once(':').map(|(_, v)| v.trim().to_string());
            }
        }

        parts.push(FormPart {
            name,
            file_name,
            content_type: part_type,
            data,
        });
        cursor = next + delimiter.len();
    }

    parts
}

/// The first part named `name`, if any.
#[allow(dead_code)]
pub fn form_part<'a>(parts: &'a [FormPart], name: &str) -> Option<&'a FormPart> {
    parts.iter().find(|p| p.name == name)
}

/// All requests the mock server has seen so far.
#[allow(dead_code)]
pub async fn received(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording should be enabled")
}

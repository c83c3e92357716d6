//! Assembly of the three ask requests.
//!
//! Each builder produces a multipart [`OutboundRequest`] whose form starts
//! with the session identifier followed by the operation's own fields.
//! Absent fields are skipped. Queries are trimmed but never rejected: an
//! empty query is sent as an empty string and left to the server to judge.
//!
//! The requests are marked `Content-Type: multipart/form-data` so intent is
//! visible to stages; the header fix stage strips it before sending so the
//! transport can add the boundary.

use crate::http::common::{Endpoint, FILE_FIELD, QUERY_FIELD, SESSION_FIELD};
use crate::http::gateway::{OutboundRequest, RequestBody};
use crate::payload::{ImageFile, Payload};
use reqwest::header::{CONTENT_TYPE, HeaderValue};

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

fn multipart_request(endpoint: Endpoint, payload: Payload) -> OutboundRequest {
    OutboundRequest::for_endpoint(&endpoint)
        .with_header(CONTENT_TYPE, HeaderValue::from_static(MULTIPART_FORM_DATA))
        .with_body(RequestBody::Multipart(payload))
}

/// `POST /ask/text` with `{session_id, query}`.
#[must_use]
pub fn text_request(session_id: &str, query: &str) -> OutboundRequest {
    let payload = Payload::new()
        .text(SESSION_FIELD, session_id)
        .text(QUERY_FIELD, query.trim());
    multipart_request(Endpoint::AskText, payload)
}

/// `POST /ask/image` with `{session_id, file}`.
#[must_use]
pub fn image_request(session_id: &str, image: ImageFile) -> OutboundRequest {
    let payload = Payload::new()
        .text(SESSION_FIELD, session_id)
        .file(FILE_FIELD, image);
    multipart_request(Endpoint::AskImage, payload)
}

/// `POST /ask/chat` with `{session_id, query}` and `file` when an image is given.
#[must_use]
pub fn chat_request(session_id: &str, query: &str, image: Option<ImageFile>) -> OutboundRequest {
    let payload = Payload::new()
        .text(SESSION_FIELD, session_id)
        .text(QUERY_FIELD, query.trim())
        .optional_file(FILE_FIELD, image);
    multipart_request(Endpoint::AskChat, payload)
}

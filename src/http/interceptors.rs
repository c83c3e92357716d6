//! Request and response stages composed around every gateway call.
//!
//! Stages run in registration order. Request stages may rewrite the
//! [`OutboundRequest`] before it is sent; response and error stages only
//! observe.

use super::gateway::{InboundResponse, OutboundRequest, RequestContext};
use crate::errors::ApiError;
use reqwest::header::CONTENT_TYPE;
use std::fmt::Debug;

/// A cross-cutting stage in the gateway pipeline.
///
/// All hooks default to no-ops so implementations only override what they
/// need.
///
/// # Example
///
/// ```
/// use agrigpt_client::{Interceptor, OutboundRequest};
///
/// #[derive(Debug)]
/// struct ClientTag;
///
/// impl Interceptor for ClientTag {
///     fn name(&self) -> &'static str {
///         "client-tag"
///     }
///
///     fn on_request(&self, request: &mut OutboundRequest) {
///         request.headers.insert("x-client", "field-app".parse().unwrap());
///     }
/// }
/// ```
pub trait Interceptor: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Called before the request is converted to a transport request.
    fn on_request(&self, _request: &mut OutboundRequest) {}

    /// Called with every successful (2xx) response, before decoding.
    fn on_response(&self, _context: &RequestContext, _response: &InboundResponse) {}

    /// Called with the normalized error, just before it is returned.
    fn on_error(&self, _context: &RequestContext, _error: &ApiError) {}
}

/// Drops any caller-set `Content-Type` from multipart requests.
///
/// The multipart boundary is only known once the form is encoded, so the
/// transport must write the header itself. A pre-set
/// `multipart/form-data` header without a boundary would make the body
/// unparseable on the server.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultipartHeaderFix;

impl Interceptor for MultipartHeaderFix {
    fn name(&self) -> &'static str {
        "multipart-header-fix"
    }

    fn on_request(&self, request: &mut OutboundRequest) {
        if request.is_multipart() && request.headers.remove(CONTENT_TYPE).is_some() {
            tracing::trace!("Removed explicit Content-Type from multipart request to {}", request.path);
        }
    }
}

/// Development-mode logging of outgoing requests and normalized errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogger;

impl Interceptor for RequestLogger {
    fn name(&self) -> &'static str {
        "request-logger"
    }

    fn on_request(&self, request: &mut OutboundRequest) {
        tracing::debug!("[API] {} {}", request.method, request.path);
    }

    fn on_error(&self, context: &RequestContext, error: &ApiError) {
        tracing::warn!(
            "[API ERROR] {} {} -> {} {}",
            context.method,
            context.path,
            error.status,
            error.message
        );
    }
}

//! The shared, interceptor-equipped HTTP transport.
//!
//! Every call goes through the same sequence:
//!
//! 1. request stages rewrite the [`OutboundRequest`] in registration order,
//! 2. the request is converted to a `reqwest` request and sent,
//! 3. a 2xx response runs the response stages and is decoded,
//! 4. any failure along the way is normalized into an [`ApiError`] and run
//!    through the error stages before it is returned.
//!
//! Callers only ever see decoded values or [`ApiError`].

use super::common::{Endpoint, construct_url};
use super::interceptors::{Interceptor, MultipartHeaderFix, RequestLogger};
use super::loud_wire;
use crate::config::ClientConfig;
use crate::errors::{ApiError, ConfigError, TransportError};
use crate::payload::Payload;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Method};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Body of an outbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    Multipart(Payload),
}

/// A transport-independent description of one request.
///
/// This is what request stages see and may modify.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Path relative to the base URL, starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl OutboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Starts a request for `endpoint` with its method, path and query.
    #[must_use]
    pub fn for_endpoint(endpoint: &Endpoint) -> Self {
        let mut request = Self::new(endpoint.method(), endpoint.path());
        request.query = endpoint.query_params();
        request
    }

    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.body, RequestBody::Multipart(_))
    }

    #[must_use]
    pub fn payload(&self) -> Option<&Payload> {
        match &self.body {
            RequestBody::Multipart(payload) => Some(payload),
            RequestBody::Empty => None,
        }
    }
}

/// Identifies one in-flight call for response and error stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Per-process request number, shared with `LOUD_WIRE` output
    pub id: usize,
    pub method: Method,
    pub path: String,
}

/// A successful (2xx) response with its body fully read.
#[derive(Debug, Clone)]
pub struct InboundResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundResponse {
    fn decode<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// The single configured transport used by every operation.
///
/// Cloning is cheap; clones share the connection pool and stages.
#[derive(Debug, Clone)]
pub struct Gateway {
    base_url: String,
    http_client: ReqwestClient,
    interceptors: Arc<Vec<Arc<dyn Interceptor>>>,
}

impl Gateway {
    /// Builds a gateway with the default stages for `config.mode`.
    ///
    /// The header fix always runs; the request logger is only installed
    /// outside production mode.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the base URL is invalid or the underlying
    /// HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        Self::with_interceptors(config, Vec::new())
    }

    /// Builds a gateway with the default stages followed by `extra`.
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::new`].
    pub fn with_interceptors(
        config: &ClientConfig,
        extra: Vec<Arc<dyn Interceptor>>,
    ) -> Result<Self, ConfigError> {
        let base_url = config.normalized_base_url()?;

        let mut builder = ReqwestClient::builder().timeout(config.timeout);
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        let http_client = builder.build()?;

        let mut interceptors: Vec<Arc<dyn Interceptor>> = vec![Arc::new(MultipartHeaderFix)];
        if !config.mode.is_production() {
            interceptors.push(Arc::new(RequestLogger));
        }
        interceptors.extend(extra);

        tracing::debug!(
            "Gateway ready: base_url={}, timeout={:?}, stages={:?}",
            base_url,
            config.timeout,
            interceptors.iter().map(|i| i.name()).collect::<Vec<_>>()
        );

        Ok(Self {
            base_url,
            http_client,
            interceptors: Arc::new(interceptors),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Names of the installed stages, in the order they run.
    #[must_use]
    pub fn interceptor_names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Sends `request` through the pipeline and decodes the JSON body as `T`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for connection failures, timeouts,
    /// non-2xx statuses and bodies that do not decode as `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        mut request: OutboundRequest,
    ) -> Result<T, ApiError> {
        for interceptor in self.interceptors.iter() {
            interceptor.on_request(&mut request);
        }

        let context = RequestContext {
            id: loud_wire::next_request_id(),
            method: request.method.clone(),
            path: request.path.clone(),
        };

        let result = match self.dispatch(&context, request).await {
            Ok(response) => {
                for interceptor in self.interceptors.iter() {
                    interceptor.on_response(&context, &response);
                }
                response.decode::<T>()
            }
            Err(e) => Err(e),
        };

        result.map_err(|e| self.fail(&context, e))
    }

    async fn dispatch(
        &self,
        context: &RequestContext,
        request: OutboundRequest,
    ) -> Result<InboundResponse, TransportError> {
        let url = construct_url(&self.base_url, &request.path, &request.query);
        loud_wire::log_request(context.id, request.method.as_str(), &url, request.payload());

        let mut headers = request.headers;
        let builder = match request.body {
            RequestBody::Empty => self.http_client.request(request.method, &url).headers(headers),
            RequestBody::Multipart(payload) => {
                // Stages added after the header fix may have set one again;
                // reqwest appends its own boundary-carrying header.
                headers.remove(CONTENT_TYPE);
                self.http_client
                    .request(request.method, &url)
                    .headers(headers)
                    .multipart(payload.into_form()?)
            }
        };

        let response = builder.send().await?;

        let status = response.status().as_u16();
        loud_wire::log_response_status(context.id, status);

        if !response.status().is_success() {
            // The status is authoritative even when the error body is cut short.
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!("Failed to read error body for HTTP {}: {}", status, e);
                    Bytes::new()
                }
            };
            loud_wire::log_response_body(context.id, &body);
            return Err(TransportError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let headers = response.headers().clone();
        let body = response.bytes().await?;
        loud_wire::log_response_body(context.id, &body);

        Ok(InboundResponse {
            status,
            headers,
            body,
        })
    }

    fn fail(&self, context: &RequestContext, error: TransportError) -> ApiError {
        let error = error.normalize();
        loud_wire::log_error(context.id, &error);
        for interceptor in self.interceptors.iter() {
            interceptor.on_error(context, &error);
        }
        error
    }
}

//! # agrigpt-client
//!
//! A session-scoped async client for the AgriGPT backend: text, image and
//! multimodal "ask" endpoints, plus weather and health lookups.
//!
//! The client does four things for every call:
//!
//! - attaches a per-profile **session identifier**, created once and kept in
//!   a pluggable [`SessionStore`],
//! - encodes text and image inputs as one `multipart/form-data` form,
//! - runs the request through a pipeline of [`Interceptor`] stages
//!   (header correction, development logging, anything you add),
//! - turns every failure into one shape, [`ApiError`] `{ status, message }`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use agrigpt_client::{AgriClient, FileStore, ImageFile};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileStore::new("session.json");
//! let client = AgriClient::builder()
//!     .base_url("http://localhost:8000")
//!     .session_store(store)
//!     .build()?;
//!
//! let reply = client.ask_text("How can I increase maize yield?").await?;
//! println!("{}", reply.analysis);
//!
//! let photo = ImageFile::from_path("leaf.jpg").await?;
//! match client.ask_chat("What is wrong with this leaf?", Some(photo)).await {
//!     Ok(reply) => println!("{}", reply.analysis),
//!     Err(err) => eprintln!("HTTP {}: {}", err.status, err.message),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`ClientConfig::from_env`] reads `AGRIGPT_API_URL`, `AGRIGPT_TIMEOUT_MS`
//! and `AGRIGPT_MODE`. Set `LOUD_WIRE=1` to print every request and response
//! to stderr.

mod client;
mod config;
mod errors;
mod http;
mod payload;
mod request_builder;
mod session;
mod types;

pub use client::{AgriClient, ClientBuilder};
pub use config::{
    BASE_URL_ENV, BuildMode, ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, MODE_ENV,
    TIMEOUT_MS_ENV,
};
pub use errors::{ApiError, ConfigError, DEFAULT_ERROR_STATUS, UNKNOWN_ERROR_MESSAGE};
pub use http::common::{Endpoint, FILE_FIELD, QUERY_FIELD, SESSION_FIELD, construct_url};
pub use http::gateway::{Gateway, InboundResponse, OutboundRequest, RequestBody, RequestContext};
pub use http::interceptors::{Interceptor, MultipartHeaderFix, RequestLogger};
pub use payload::{FALLBACK_MIME_TYPE, FieldValue, ImageFile, Payload, detect_mime_type};
pub use request_builder::{chat_request, image_request, text_request};
pub use session::{
    FileStore, MemoryStore, SESSION_KEY, SessionIdentity, SessionStore, generate_session_id,
};
pub use types::{
    AskResponse, HealthModels, HealthStatus, WeatherCondition, WeatherReport, WeatherResponse,
};

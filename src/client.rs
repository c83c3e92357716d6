use crate::config::{BuildMode, ClientConfig};
use crate::errors::{ApiError, ConfigError};
use crate::http::common::Endpoint;
use crate::http::gateway::{Gateway, OutboundRequest};
use crate::http::interceptors::Interceptor;
use crate::payload::ImageFile;
use crate::request_builder::{chat_request, image_request, text_request};
use crate::session::{MemoryStore, SessionIdentity, SessionStore};
use crate::types::{AskResponse, HealthStatus, WeatherResponse};
use std::sync::Arc;
use std::time::Duration;

/// Session-scoped client for the AgriGPT backend.
///
/// Cloning is cheap: clones share the connection pool, the interceptor
/// stages and the session store, so one client can serve many concurrent
/// asks. Completion order of concurrent calls is not guaranteed.
#[derive(Debug, Clone)]
pub struct AgriClient {
    pub(crate) gateway: Gateway,
    pub(crate) session: SessionIdentity,
}

/// Builder for [`AgriClient`] instances.
///
/// # Example
///
/// ```
/// use agrigpt_client::{AgriClient, MemoryStore};
/// use std::time::Duration;
///
/// let client = AgriClient::builder()
///     .base_url("http://localhost:8000")
///     .timeout(Duration::from_secs(90))
///     .session_store(MemoryStore::new())
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn SessionStore>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl ClientBuilder {
    /// Starts from an existing configuration, e.g. [`ClientConfig::from_env`].
    #[must_use]
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            store: None,
            interceptors: Vec::new(),
        }
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Sets the total request timeout.
    ///
    /// Backend inference may take tens of seconds; the default is 60 s.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    ///
    /// If not set, uses reqwest's default.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: BuildMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Sets where the session identifier is persisted.
    ///
    /// If not set, an in-memory store is used and the identifier lasts only
    /// as long as the client.
    #[must_use]
    pub fn session_store(mut self, store: impl SessionStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Shares one store between several clients.
    #[must_use]
    pub fn shared_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Appends a stage after the built-in ones.
    #[must_use]
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the base URL is invalid, the timeout is
    /// zero or the HTTP client cannot be built.
    pub fn build(self) -> Result<AgriClient, ConfigError> {
        if self.config.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "timeout must be greater than zero".to_string(),
            ));
        }

        let gateway = Gateway::with_interceptors(&self.config, self.interceptors)?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));

        Ok(AgriClient {
            gateway,
            session: SessionIdentity::from_shared(store),
        })
    }
}

impl AgriClient {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::from_config(ClientConfig::default())
    }

    /// Creates a client from explicit configuration and a session store.
    ///
    /// # Errors
    ///
    /// Same as [`ClientBuilder::build`].
    pub fn new(
        config: ClientConfig,
        store: impl SessionStore + 'static,
    ) -> Result<Self, ConfigError> {
        ClientBuilder::from_config(config).session_store(store).build()
    }

    /// Creates a client configured from `AGRIGPT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the environment holds invalid values.
    pub fn from_env(store: impl SessionStore + 'static) -> Result<Self, ConfigError> {
        Self::new(ClientConfig::from_env()?, store)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.gateway.base_url()
    }

    /// The session identifier sent with every ask, created on first use.
    #[must_use]
    pub fn session_id(&self) -> String {
        self.session.get_or_create()
    }

    /// Asks a text-only question.
    ///
    /// The query is trimmed; an empty query is still sent.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn ask_text(&self, query: &str) -> Result<AskResponse, ApiError> {
        let request = text_request(&self.session_id(), query);
        self.ask(request).await
    }

    /// Asks for a diagnosis of an image alone.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure. The backend
    /// accepts JPEG and PNG up to 8 MB and answers 415 or 413 otherwise.
    pub async fn ask_image(&self, image: ImageFile) -> Result<AskResponse, ApiError> {
        let request = image_request(&self.session_id(), image);
        self.ask(request).await
    }

    /// Asks a question, optionally with an image.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn ask_chat(
        &self,
        query: &str,
        image: Option<ImageFile>,
    ) -> Result<AskResponse, ApiError> {
        let request = chat_request(&self.session_id(), query, image);
        self.ask(request).await
    }

    async fn ask(&self, request: OutboundRequest) -> Result<AskResponse, ApiError> {
        let path = request.path.clone();
        let response: AskResponse = self.gateway.execute(request).await?;
        tracing::debug!(
            "Ask {} answered: request_id={:?}, elapsed_ms={:?}",
            path,
            response.request_id,
            response.elapsed_ms
        );
        Ok(response)
    }

    /// Looks up current weather at a coordinate.
    ///
    /// No session identifier is sent.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on transport or HTTP failure. An
    /// unavailable upstream weather service is reported as
    /// [`WeatherResponse::Unavailable`], not as an error.
    pub async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherResponse, ApiError> {
        let request = OutboundRequest::for_endpoint(&Endpoint::CurrentWeather { lat, lon });
        self.gateway.execute(request).await
    }

    /// Fetches backend liveness and model information.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let request = OutboundRequest::for_endpoint(&Endpoint::Health);
        self.gateway.execute(request).await
    }
}

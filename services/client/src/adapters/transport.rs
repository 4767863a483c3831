//! services/client/src/adapters/transport.rs
//!
//! The HTTP transport shared by every REST adapter. It attaches the bearer
//! token from the `SessionContext`, tags each request with an id, and maps
//! failed responses into `PortError`. A 401 clears the session and fires the
//! injected unauthorized handler.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use screening_core::domain::FieldError;
use screening_core::ports::{PortError, PortResult};
use screening_core::session::{SessionContext, UnauthorizedHandler};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Body of a failed response, when the service sends one.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Maps a non-success response to `PortError::Status`. Bodies that are not
/// JSON (or not the expected shape) leave `message` and `errors` empty.
pub fn error_from_response(status: u16, body: &str) -> PortError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let errors = parsed
        .errors
        .unwrap_or_default()
        .into_iter()
        .map(|(field, messages)| FieldError { field, messages })
        .collect();
    PortError::Status {
        status,
        message: parsed.message.filter(|m| !m.trim().is_empty()),
        errors,
    }
}

/// Ids containing `/`, `?` or `#` stay inside their own path segment.
pub fn join_segments(base: &Url, segments: &[&str]) -> PortResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| PortError::Unexpected(format!("Base URL {} cannot take a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn network_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Network("Request timed out".to_string())
    } else if e.is_connect() {
        PortError::Network("Could not reach the screening service".to_string())
    } else {
        PortError::Network(e.to_string())
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    session: Arc<SessionContext>,
    on_unauthorized: UnauthorizedHandler,
}

impl HttpTransport {
    pub fn new(
        base_url: Url,
        timeout: Duration,
        session: Arc<SessionContext>,
        on_unauthorized: UnauthorizedHandler,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            session,
            on_unauthorized,
        })
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    pub fn url(&self, segments: &[&str]) -> PortResult<Url> {
        join_segments(&self.base_url, segments)
    }

    /// Starts a request carrying the JSON accept header, the bearer token
    /// when signed in, and a fresh request id.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Sends the request and decodes a JSON success body into `T`.
    pub async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> PortResult<T> {
        let request = builder
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let method = request.method().clone();
        let url = request.url().clone();
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        debug!(%method, %url, request_id = %request_id, "Sending request");
        let response = self.client.execute(request).await.map_err(|e| {
            warn!(%method, %url, request_id = %request_id, "Request failed before a response: {}", e);
            network_error(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;
        debug!(%method, %url, request_id = %request_id, status = status.as_u16(), "Response received");

        if status == StatusCode::UNAUTHORIZED {
            warn!(request_id = %request_id, "Session rejected by the service, signing out");
            self.session.clear();
            (self.on_unauthorized)();
        }

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!(%url, request_id = %request_id, "Unexpected response body: {}", e);
            PortError::Unexpected(format!("Unexpected response from the service: {}", e))
        })
    }
}

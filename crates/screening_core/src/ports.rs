//! crates/screening_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client core depends on.
//! These traits form the boundary of the hexagonal architecture: the REST
//! service, token storage and the UI shell (toasts, navigation, document
//! title) are all reached through them.

use async_trait::async_trait;

use crate::domain::{
    AuthUser, Candidate, CreatedOpening, Credentials, FieldError, JobOpening, LoginResponse,
    NewOpening, Route, UploadFile, UploadReceipt,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors of the transport (HTTP client, storage).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// The service answered with a non-success status.
    /// `message` and `errors` are taken from a `{ message?, errors? }` body when present.
    #[error("Request failed with status code {status}")]
    Status {
        status: u16,
        message: Option<String>,
        errors: Vec<FieldError>,
    },
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("{0}")]
    Network(String),
    #[error("Job opening not found.")]
    MissingJobOpening,
    #[error("{0}")]
    Unexpected(String),
}

impl PortError {
    pub const UNPROCESSABLE: u16 = 422;
    pub const UNAUTHORIZED: u16 = 401;

    pub fn status(&self) -> Option<u16> {
        match self {
            PortError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait JobOpeningService: Send + Sync {
    /// GET /jds
    async fn list_openings(&self) -> PortResult<Vec<JobOpening>>;

    /// POST /jds (multipart: `title`, `job_description`)
    async fn create_opening(&self, opening: NewOpening) -> PortResult<CreatedOpening>;
}

#[async_trait]
pub trait CandidateService: Send + Sync {
    /// GET /jds/{jd_id}/candidates
    async fn list_candidates(&self, jd_id: &str) -> PortResult<Vec<Candidate>>;

    /// GET /jds/{jd_id}/candidates?candidateId=
    async fn get_candidate(&self, jd_id: &str, candidate_id: &str) -> PortResult<Candidate>;
}

#[async_trait]
pub trait ResumeUploadService: Send + Sync {
    /// POST /jds/{jd_id}/resumes (multipart: repeated `resumes[]`)
    async fn upload_resumes(&self, jd_id: &str, files: &[UploadFile]) -> PortResult<UploadReceipt>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> PortResult<LoginResponse>;
    async fn me(&self) -> PortResult<AuthUser>;
}

/// Durable storage for the bearer token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> PortResult<()>;
    fn clear(&self) -> PortResult<()>;
}

//=========================================================================================
// UI Shell Ports
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// A follow-up action offered on a toast. Activating it navigates to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToastAction {
    pub label: String,
    pub target: Route,
    pub opening: Option<JobOpening>,
}

/// A one-shot, dismissable notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub description: Option<String>,
    pub action: Option<ToastAction>,
}

impl Toast {
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            title: title.into(),
            description: None,
            action: None,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            ..Self::error(title)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_action(mut self, action: ToastAction) -> Self {
        self.action = Some(action);
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Client-side routing and the query string of the current location.
pub trait Navigator: Send + Sync {
    /// Pushes a new location, optionally carrying the opening it concerns.
    fn navigate(&self, route: Route, opening: Option<JobOpening>);

    /// The opening carried by the current location, if any.
    fn location_opening(&self) -> Option<JobOpening>;

    fn search_param(&self, key: &str) -> Option<String>;

    /// Sets (`Some`) or deletes (`None`) a query parameter, replacing the
    /// current history entry instead of pushing a new one.
    fn replace_search_param(&self, key: &str, value: Option<&str>);
}

pub trait TitleSink: Send + Sync {
    fn set_title(&self, title: &str);
}

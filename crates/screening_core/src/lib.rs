pub mod auth;
pub mod debounce;
pub mod domain;
pub mod errors;
pub mod pages;
pub mod ports;
pub mod search;
pub mod session;
pub mod store;
pub mod upload;

pub use auth::{AuthState, AuthStatus, AuthStore};
pub use domain::{
    AuthUser, Candidate, CreatedOpening, Credentials, FieldError, FitBand, JobOpening,
    LoginResponse, NewOpening, Route, UploadFile, UploadReceipt,
};
pub use errors::{classify, extract_error_message, Failure, DEFAULT_ERROR_MESSAGE};
pub use pages::{AddCandidatesPage, OpeningDetailPage, OpeningListPage, Shell};
pub use ports::{
    AuthService, CandidateService, JobOpeningService, Navigator, Notifier, PortError,
    PortResult, ResumeUploadService, TitleSink, Toast, TokenStore,
};
pub use session::{SessionContext, UnauthorizedHandler};
pub use store::{CandidateStore, FetchOutcome, OpeningStore, Store, StoreState, StoreStatus};
pub use upload::{UploadQueue, RESUME_UPLOAD_LIMIT};

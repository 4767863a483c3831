//! crates/screening_core/src/auth.rs
//!
//! Sign-in state: login, logout, profile refresh and start-up hydration.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::{AuthUser, Credentials, FieldError};
use crate::ports::{AuthService, PortResult};
use crate::session::SessionContext;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Idle,
    Loading,
    Authenticated,
}

#[derive(Debug, Clone)]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<AuthUser>,
}

/// Checks the login form before anything is sent.
pub fn validate_credentials(credentials: &Credentials) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let email = credentials.email.trim();
    let email_message = if email.is_empty() {
        Some("Enter your email.")
    } else if !looks_like_email(email) {
        Some("Enter a valid email.")
    } else {
        None
    };
    if let Some(message) = email_message {
        errors.push(FieldError {
            field: "email".into(),
            messages: vec![message.into()],
        });
    }

    let password_message = if credentials.password.is_empty() {
        Some("Enter your password.".to_string())
    } else if credentials.password.chars().count() < MIN_PASSWORD_LEN {
        Some(format!(
            "Password must be at least {} characters long.",
            MIN_PASSWORD_LEN
        ))
    } else {
        None
    };
    if let Some(message) = password_message {
        errors.push(FieldError {
            field: "password".into(),
            messages: vec![message],
        });
    }

    errors
}

/// One `@`, no whitespace, and a dotted domain with no empty labels.
static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").ok());

fn looks_like_email(value: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value))
}

pub struct AuthStore {
    service: Arc<dyn AuthService>,
    session: Arc<SessionContext>,
    state: watch::Sender<AuthState>,
}

impl AuthStore {
    pub fn new(service: Arc<dyn AuthService>, session: Arc<SessionContext>) -> Self {
        let (state, _) = watch::channel(AuthState {
            status: AuthStatus::Idle,
            user: None,
        });
        Self {
            service,
            session,
            state,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub async fn login(&self, credentials: &Credentials) -> PortResult<AuthUser> {
        self.state.send_modify(|s| s.status = AuthStatus::Loading);
        match self.service.login(credentials).await {
            Ok(response) => {
                self.session.set_token(&response.token);
                info!(user_id = %response.user.id, "Signed in");
                let user = response.user;
                self.state.send_replace(AuthState {
                    status: AuthStatus::Authenticated,
                    user: Some(user.clone()),
                });
                Ok(user)
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                self.state.send_modify(|s| s.status = AuthStatus::Idle);
                Err(e)
            }
        }
    }

    pub fn logout(&self) {
        self.session.clear();
        self.state.send_replace(AuthState {
            status: AuthStatus::Idle,
            user: None,
        });
    }

    /// Refreshes the profile. Without a token there is nothing to ask for.
    /// Any failure signs the user out.
    pub async fn me(&self) -> PortResult<Option<AuthUser>> {
        if !self.session.is_signed_in() {
            return Ok(None);
        }
        self.state.send_modify(|s| s.status = AuthStatus::Loading);
        match self.service.me().await {
            Ok(user) => {
                self.state.send_replace(AuthState {
                    status: AuthStatus::Authenticated,
                    user: Some(user.clone()),
                });
                Ok(Some(user))
            }
            Err(e) => {
                warn!("Failed to fetch profile: {}", e);
                self.logout();
                Err(e)
            }
        }
    }

    /// Restores the signed-in user from a persisted token at start-up.
    pub async fn hydrate(&self) {
        if let Err(e) = self.me().await {
            warn!("Discarding persisted session: {}", e);
        }
    }
}

//! Authentication state machine.
//!
//! Drives login, registration, and logout against the backend, persisting
//! the issued bearer token through the session store. One operation is
//! logically in flight at a time; a second resolution simply overwrites the
//! phase.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{Api, LoginRequest, RegisterRequest};
use crate::session::{SessionError, SessionStore};
use crate::token;

const LOGIN_FALLBACK: &str = "Login failed";
const REGISTER_FALLBACK: &str = "Registration failed";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Field-level input failure. Never sent to the network.
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    Idle,
    Pending,
    Authenticated { email: String },
    /// Registration succeeded; the account still has to log in.
    RegisteredOk,
    Failed { message: String },
}

pub struct Auth {
    phase: AuthPhase,
    store: Arc<dyn SessionStore>,
}

impl Auth {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            phase: AuthPhase::Idle,
            store,
        }
    }

    /// Construct, adopting a still-valid persisted token if one exists.
    pub fn resume(store: Arc<dyn SessionStore>) -> Result<Self, SessionError> {
        let phase = match store.load()? {
            // load() already rejected expired or undecodable tokens, so a
            // decode failure here means the slot changed underneath us;
            // treat it as logged out.
            Some(raw) => match token::decode(&raw) {
                Ok(claims) => {
                    tracing::debug!(email = %claims.email, "Resumed persisted session");
                    AuthPhase::Authenticated {
                        email: claims.email,
                    }
                }
                Err(_) => AuthPhase::Idle,
            },
            None => AuthPhase::Idle,
        };
        Ok(Self { phase, store })
    }

    pub fn phase(&self) -> &AuthPhase {
        &self.phase
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.phase, AuthPhase::Authenticated { .. })
    }

    /// Register a new account. Success is a terminal `RegisteredOk` signal,
    /// not an authenticated session.
    pub async fn register(
        &mut self,
        api: &Api,
        request: &RegisterRequest,
    ) -> Result<&AuthPhase, AuthError> {
        validate_register(request)?;
        self.phase = AuthPhase::Pending;

        self.phase = match api.register(request).await {
            Ok(()) => {
                tracing::debug!(email = %request.email, "Registration accepted");
                AuthPhase::RegisteredOk
            }
            Err(e) => AuthPhase::Failed {
                message: e.user_message(REGISTER_FALLBACK),
            },
        };
        Ok(&self.phase)
    }

    /// Log in and persist the issued token with its own expiry.
    pub async fn login(
        &mut self,
        api: &Api,
        request: &LoginRequest,
    ) -> Result<&AuthPhase, AuthError> {
        validate_login(request)?;
        self.phase = AuthPhase::Pending;

        self.phase = match api.login(request).await {
            Ok(raw) => match token::decode(&raw) {
                Ok(claims) => {
                    self.store.save(&raw, claims.expires_at())?;
                    tracing::debug!(email = %claims.email, "Login succeeded");
                    AuthPhase::Authenticated {
                        email: claims.email,
                    }
                }
                // The call succeeded but the token is unusable. Never adopt
                // an unparseable token.
                Err(e) => {
                    tracing::warn!(error = %e, "Login returned an undecodable token");
                    AuthPhase::Failed {
                        message: LOGIN_FALLBACK.to_string(),
                    }
                }
            },
            Err(e) => AuthPhase::Failed {
                message: e.user_message(LOGIN_FALLBACK),
            },
        };
        Ok(&self.phase)
    }

    /// Clear the session and return to `Idle`, discarding any in-flight
    /// request state.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.store.clear()?;
        self.phase = AuthPhase::Idle;
        tracing::debug!("Logged out");
        Ok(())
    }

    /// Explicit reset: any phase back to `Idle` without touching the store.
    pub fn reset(&mut self) {
        self.phase = AuthPhase::Idle;
    }
}

// ============================================================================
// Field validation
// ============================================================================

fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(AuthError::Validation {
            field: "email",
            message: "not a valid email address",
        })
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < 8 {
        return Err(AuthError::Validation {
            field: "password",
            message: "must be at least 8 characters",
        });
    }
    Ok(())
}

fn validate_login(request: &LoginRequest) -> Result<(), AuthError> {
    validate_email(&request.email)?;
    validate_password(&request.password)
}

fn validate_register(request: &RegisterRequest) -> Result<(), AuthError> {
    validate_email(&request.email)?;
    if request.first_name.trim().is_empty() {
        return Err(AuthError::Validation {
            field: "first_name",
            message: "cannot be empty",
        });
    }
    if request.last_name.trim().is_empty() {
        return Err(AuthError::Validation {
            field: "last_name",
            message: "cannot be empty",
        });
    }
    validate_password(&request.password)
}

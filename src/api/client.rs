use std::sync::Arc;

use chrono::Utc;
use reqwest::multipart;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::envelope::{error_message, Envelope};
use crate::catalog::{Banner, Service};
use crate::profile::{Profile, ProfileUpdate};
use crate::session::{SessionError, SessionStore};
use crate::wallet::Transaction;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("Response envelope is missing data")]
    MissingData,
}

impl ApiError {
    /// Backend-provided message for this failure, if the payload carried one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(msg) | ApiError::Rejected { message: msg, .. }
                if !msg.is_empty() =>
            {
                Some(msg.as_str())
            }
            _ => None,
        }
    }

    /// Message to show the user, falling back to one generic string per
    /// operation when the backend payload lacks its own.
    pub fn user_message(&self, fallback: &str) -> String {
        self.backend_message().unwrap_or(fallback).to_string()
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The backend expects the client to propose an expiry with the credentials.
#[derive(Debug, Serialize)]
struct LoginPayload<'a> {
    email: &'a str,
    password: &'a str,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct BalanceData {
    balance: u64,
}

#[derive(Debug, Serialize)]
struct TopUpRequest {
    top_up_amount: u64,
}

#[derive(Debug, Serialize)]
struct PaymentRequest {
    service_code: String,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    records: Vec<Transaction>,
}

/// How long a login session lasts when the backend honors our proposal.
const LOGIN_TTL_SECONDS: i64 = 12 * 60 * 60;

/// Endpoint paths all start with `/`, so a trailing slash on the base URL
/// would produce `host//path`.
fn normalize_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for the PPOB backend.
///
/// Every request attaches the persisted bearer token when one exists, and
/// any 401 response clears the session slot before the error is surfaced —
/// the cross-cutting interceptor lives here, not at call sites.
pub struct Api {
    base_url: String,
    http: reqwest::Client,
    store: Arc<dyn SessionStore>,
}

impl Api {
    pub fn new(
        base_url: impl Into<String>,
        timeout_seconds: u64,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: normalize_base_url(base_url.into()),
            http,
            store,
        })
    }

    /// Build around a caller-supplied client. Tests use this with proxies
    /// disabled so loopback requests never route through the environment.
    pub fn with_http_client(
        base_url: impl Into<String>,
        http: reqwest::Client,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            http,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Send a request with the current bearer token attached, mapping
    /// non-success statuses to [`ApiError`]. A 401 from any endpoint drops
    /// the local session unconditionally.
    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let request = match self.store.load()? {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.store.clear()?;
            tracing::debug!("Backend returned 401, session cleared");
            let body = response.bytes().await.unwrap_or_default();
            return Err(ApiError::Unauthorized(
                error_message(&body).unwrap_or_default(),
            ));
        }

        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(ApiError::Rejected {
                status,
                message: error_message(&body).unwrap_or_default(),
            });
        }

        Ok(response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[cfg(test)]
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.dispatch(self.http.get(self.url(path))).await?;
        let envelope: Envelope<T> = response.json().await?;
        envelope.data.ok_or(ApiError::MissingData)
    }

    async fn post_data<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .dispatch(self.http.post(self.url(path)).json(body))
            .await?;
        let envelope: Envelope<T> = response.json().await?;
        envelope.data.ok_or(ApiError::MissingData)
    }

    async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.dispatch(self.http.post(self.url(path)).json(body))
            .await?;
        Ok(())
    }

    async fn put_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.dispatch(self.http.put(self.url(path)).json(body))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Endpoints
    // ========================================================================

    /// `POST /registration`. Success does not imply login.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.post_unit("/registration", request).await
    }

    /// `POST /login`. Returns the raw bearer token from the response
    /// envelope; the caller owns decoding and persistence.
    pub async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
        let payload = LoginPayload {
            email: &request.email,
            password: &request.password,
            exp: Utc::now().timestamp() + LOGIN_TTL_SECONDS,
        };
        let data: LoginData = self.post_data("/login", &payload).await?;
        Ok(data.token)
    }

    /// `GET /profile`.
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.get_data("/profile").await
    }

    /// `PUT /profile/update`.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        self.put_unit("/profile/update", update).await
    }

    /// `PUT /profile/image` with a multipart file field.
    pub async fn update_profile_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<(), ApiError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(ApiError::Network)?;
        let form = multipart::Form::new().part("file", part);

        self.dispatch(self.http.put(self.url("/profile/image")).multipart(form))
            .await?;
        Ok(())
    }

    /// `GET /balance`.
    pub async fn balance(&self) -> Result<u64, ApiError> {
        let data: BalanceData = self.get_data("/balance").await?;
        Ok(data.balance)
    }

    /// `POST /topup`. Returns the new balance.
    pub async fn top_up(&self, amount: u64) -> Result<u64, ApiError> {
        let data: BalanceData = self
            .post_data("/topup", &TopUpRequest {
                top_up_amount: amount,
            })
            .await?;
        Ok(data.balance)
    }

    /// `GET /services`.
    pub async fn services(&self) -> Result<Vec<Service>, ApiError> {
        self.get_data("/services").await
    }

    /// `GET /banner`.
    pub async fn banners(&self) -> Result<Vec<Banner>, ApiError> {
        self.get_data("/banner").await
    }

    /// `POST /transaction` — pay for a service from the balance.
    pub async fn pay(&self, service_code: &str) -> Result<(), ApiError> {
        self.post_unit("/transaction", &PaymentRequest {
            service_code: service_code.to_string(),
        })
        .await
    }

    /// `GET /transaction/history` with offset/limit pagination.
    pub async fn transaction_history(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Transaction>, ApiError> {
        let data: HistoryData = self
            .get_data(&format!("/transaction/history?offset={offset}&limit={limit}"))
            .await?;
        Ok(data.records)
    }
}

//! HTTP client for the MoneyMate auth API.
//!
//! `ApiClient` is the single path for outgoing requests: it attaches the
//! session's bearer token when one is present, and it owns the one
//! response-driven state transition in the client - an HTTP 401 clears
//! the session before the error reaches the caller. Every other failure
//! passes through untouched; interpretation and messaging belong to the
//! caller. There are no retries.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::{Session, SessionData};
use crate::models::{SignupRequest, User};

use super::ApiError;

/// HTTP request timeout in seconds.
/// Matches the original client: long enough for a slow backend, short
/// enough that a dead connection fails while the user is still watching.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Success body for login and OTP verification.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    user: User,
}

/// API client for the MoneyMate backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling, and the session is shared.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    resend_otp_path: String,
    session: Arc<Mutex<Session>>,
}

impl ApiClient {
    /// Create a client against `base_url`, sharing `session` with the
    /// caller. `resend_otp_path` is configurable because the backend
    /// contract for resending an OTP is unsettled (`/auth/resend-otp`
    /// vs re-POSTing `/auth/signup`).
    pub fn new(
        base_url: &str,
        resend_otp_path: &str,
        session: Arc<Mutex<Session>>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            resend_otp_path: resend_otp_path.to_string(),
            session,
        })
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bearer_token(&self) -> Option<String> {
        self.lock_session().token().map(str::to_string)
    }

    /// Check a response status, applying the single cross-cutting policy:
    /// 401 clears the session, everything else passes through as-is.
    async fn check_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            info!("Unauthorized response; clearing session");
            self.lock_session().clear();
        }
        Err(ApiError::from_status(status, &body))
    }

    /// GET returning a JSON body, for follow-on requests after
    /// authentication. Attaches the session's bearer token when one is
    /// held; sends unauthenticated otherwise.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.get(&url);
        if let Some(token) = self.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = self.check_response(request.send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{url}: {e}")))
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(token) = self.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = self.check_response(request.send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{url}: {e}")))
    }

    /// POST where the caller only cares about success, not the body.
    async fn post_unit<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(token) = self.bearer_token() {
            request = request.bearer_auth(token);
        }

        self.check_response(request.send().await?).await?;
        Ok(())
    }

    // ===== Auth operations =====

    /// Log in with email and password. On success the session is updated
    /// (and persisted) before this returns.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionData, ApiError> {
        let auth: AuthResponse = self
            .post(
                "/auth/login",
                &serde_json::json!({ "email": email, "password": password }),
            )
            .await?;

        let data = SessionData::new(auth.token, auth.user);
        self.lock_session().update(data.clone());
        debug!(user = %data.user.display_name(), "Login succeeded");
        Ok(data)
    }

    /// Create an account. Success means the backend dispatched an OTP to
    /// the given email; the session is not touched until verification.
    pub async fn signup(&self, request: &SignupRequest) -> Result<(), ApiError> {
        self.post_unit("/auth/signup", request).await
    }

    /// Verify the signup OTP. Like login, a success establishes the
    /// session before returning.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<SessionData, ApiError> {
        let auth: AuthResponse = self
            .post(
                "/auth/signup/verify",
                &serde_json::json!({ "email": email, "otp": otp }),
            )
            .await?;

        let data = SessionData::new(auth.token, auth.user);
        self.lock_session().update(data.clone());
        debug!(user = %data.user.display_name(), "OTP verification succeeded");
        Ok(data)
    }

    /// Ask the backend to resend the signup OTP. Posts to the configured
    /// resend path.
    pub async fn resend_otp(&self, email: &str) -> Result<(), ApiError> {
        self.post_unit(&self.resend_otp_path, &serde_json::json!({ "email": email }))
            .await
    }

    /// Log out locally: clears the session (memory and durable storage).
    /// The backend holds no server-side session to invalidate.
    pub fn logout(&self) {
        self.lock_session().clear();
        info!("Logged out");
    }

    /// Whether the shared session currently holds a token.
    pub fn is_authenticated(&self) -> bool {
        self.lock_session().is_authenticated()
    }
}

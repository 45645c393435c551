use serde::{Deserialize, Serialize};

/// User record as returned by the auth endpoints.
///
/// The backend is not consistent about which fields accompany the token
/// (the web and mobile clients observed different shapes), so everything
/// except `email` is optional and unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl User {
    /// Preferred display name: username if the backend sent one, else email.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.email)
    }
}

/// Request body for POST /auth/signup.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
}

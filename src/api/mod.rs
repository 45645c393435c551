//! REST client module for the MoneyMate backend.
//!
//! `ApiClient` wraps every outgoing request: it attaches the session's
//! bearer token and centralizes the 401-clears-session policy. All calls
//! share one fixed-timeout `reqwest` client; nothing is retried.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;

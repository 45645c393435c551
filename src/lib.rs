//! Client library for the MoneyMate personal-finance API.
//!
//! The library's core is the session/auth boundary: a [`auth::Session`]
//! holding the bearer token (persisted across restarts via
//! [`auth::TokenStorage`]) and an [`api::ApiClient`] that attaches the
//! token to outgoing requests and clears the session on an HTTP 401.
//! Everything user-facing lives in the `moneymate` binary.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

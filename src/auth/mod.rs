//! Session management for the MoneyMate client.
//!
//! This module provides:
//! - `Session`: the in-memory authentication state (Anonymous or
//!   Authenticated with a bearer token)
//! - `TokenStorage`: pluggable durable persistence so a session survives
//!   process restart
//!
//! Credentials (passwords, OTP codes) are never persisted; only the token
//! and the user record returned by the backend are.

pub mod session;

pub use session::{FileStorage, MemoryStorage, Session, SessionData, TokenStorage};

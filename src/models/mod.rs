//! Wire types shared between the API client and the CLI.

pub mod user;

pub use user::{SignupRequest, User};

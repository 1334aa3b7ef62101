//! REST client module for the remote auth service.
//!
//! This module provides the `AuthClient` for the register, login,
//! phone-OTP, password-reset, and profile endpoints, plus the `ApiError`
//! taxonomy used to classify failures at the session manager boundary.

pub mod client;
pub mod error;

pub use client::AuthClient;
pub use error::ApiError;

//! Wire models for the remote auth service.
//!
//! These are read-only snapshots of server JSON. `Profile` is owned by the
//! session and replaced wholesale on each successful fetch, never mutated
//! in place.

use serde::{Deserialize, Serialize};

/// User profile returned by `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Token payload returned by the register/login/verify endpoints.
/// Extra fields in the response are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// One field-level message from the server's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub msg: String,
}

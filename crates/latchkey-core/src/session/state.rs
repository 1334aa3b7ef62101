//! The observable session record.

use std::fmt;

use crate::models::{FieldError, Profile};

/// Authentication status of the client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    Authenticating,
    Authenticated,
    /// The credential store rejected the token write after issuance; the
    /// session cannot be made durable until the user acts again.
    Error,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Unauthenticated => write!(f, "unauthenticated"),
            SessionStatus::Authenticating => write!(f, "authenticating"),
            SessionStatus::Authenticated => write!(f, "authenticated"),
            SessionStatus::Error => write!(f, "error"),
        }
    }
}

/// Classified failure recorded on the session after a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// The server rejected the submission with field-level messages,
    /// kept in server order.
    Validation(Vec<FieldError>),
    /// 401 / expired / invalid token.
    Auth,
    /// Transport failure or a response the client could not interpret.
    Network(String),
    /// The credential store rejected the token write after issuance.
    Storage(String),
}

/// Client-held record of the current authentication session.
///
/// Exactly one exists per session manager; it is the single source of
/// truth for auth observers. Invariant: `Authenticated` requires both a
/// token and a profile in memory (and the same token in the store, which
/// the manager guarantees by persisting before the profile fetch).
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub status: SessionStatus,
    pub user: Option<Profile>,
    pub token: Option<String>,
    pub last_error: Option<AuthFailure>,
}

impl Session {
    /// The initial, logged-out session.
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            user: None,
            token: None,
            last_error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// The transient bearer token, if one is held.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Check the in-memory half of the session invariant.
    pub fn invariant_holds(&self) -> bool {
        match self.status {
            SessionStatus::Authenticated => self.token.is_some() && self.user.is_some(),
            SessionStatus::Unauthenticated | SessionStatus::Error => self.user.is_none(),
            SessionStatus::Authenticating => true,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

//! latchkey core - the client-side authentication session lifecycle.
//!
//! A session manager for clients of a remote JSON auth API: it owns the
//! one `Session` per client, coordinates the remote service and the secure
//! token store, and emits ephemeral notices for the UI layer to render.
//!
//! This crate provides:
//! - `session`: the session state machine and its single-writer manager
//! - `api`: HTTP client for the remote auth service
//! - `store`: pluggable token storage (keyring, file, memory)
//! - `models`: wire types (`Profile`, token and error payloads)
//! - `notify`: ephemeral notifications
//! - `config`: server URL and backend configuration

pub mod api;
pub mod config;
pub mod models;
pub mod notify;
pub mod session;
pub mod store;

pub use api::{ApiError, AuthClient};
pub use config::Config;
pub use models::Profile;
pub use notify::{Notice, Severity};
pub use session::{AuthFailure, Intent, Session, SessionManager, SessionStatus};
pub use store::{FileStore, KeyringStore, MemoryStore, TokenStore};

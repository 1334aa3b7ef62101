//! Authentication session lifecycle.
//!
//! This module provides:
//! - `state`: the observable `Session` record and its invariant
//! - `machine`: pure intent/event transitions returning side-effect commands
//! - `manager`: the single-writer executor that owns the session
//!
//! Observers (UI layers) only ever see the `Session` plus drained notices;
//! raw errors never cross the manager boundary.

pub mod machine;
pub mod manager;
pub mod state;

pub use machine::{ApiCall, Command, Event, Intent, Step};
pub use manager::SessionManager;
pub use state::{AuthFailure, Session, SessionStatus};

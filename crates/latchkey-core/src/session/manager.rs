//! Single-writer session manager.
//!
//! Owns the `Session`, the HTTP client, the token store, and the notice
//! buffer. Each dispatched intent runs to quiescence before `dispatch`
//! returns: commands execute in order, store writes are awaited before
//! anything that depends on them, and every command outcome is fed back
//! through the machine. `&mut self` makes concurrent session mutation
//! unrepresentable.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::api::{ApiError, AuthClient};
use crate::models::AuthResponse;
use crate::notify::Notice;
use crate::store::TokenStore;

use super::machine::{self, ApiCall, Command, Event, Intent, Step};
use super::state::{AuthFailure, Session, SessionStatus};

pub struct SessionManager<S> {
    session: Session,
    api: AuthClient,
    store: S,
    notices: Vec<Notice>,
}

impl<S: TokenStore> SessionManager<S> {
    pub fn new(api: AuthClient, store: S) -> Self {
        Self {
            session: Session::new(),
            api,
            store,
            notices: Vec::new(),
        }
    }

    /// The current session. Observers render from this.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drain the notices accumulated since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Dispatch one intent and run it to a terminal state.
    ///
    /// No retries: a failed call is terminal for this intent and the user
    /// must re-submit. Callers must not dispatch while a previous dispatch
    /// is still running; exclusive access enforces that here.
    pub async fn dispatch(&mut self, intent: Intent) -> &Session {
        let label = intent.label();
        debug!(intent = label, "Dispatching intent");

        let step = machine::on_intent(&self.session, intent);
        if step.commands.is_empty() && step.session.status == SessionStatus::Authenticating {
            warn!(intent = label, "Intent ignored while an attempt is in flight");
        }
        self.advance(step).await;

        debug!(status = %self.session.status, "Intent settled");
        &self.session
    }

    async fn advance(&mut self, step: Step) {
        self.session = step.session;
        let mut queue: VecDeque<Command> = step.commands.into();

        while let Some(command) = queue.pop_front() {
            match command {
                Command::Emit(batch) => self.notices.extend(batch),

                Command::ReadToken => {
                    // A store read failure at bootstrap fails closed: no token.
                    let token = match self.store.get().await {
                        Ok(token) => token,
                        Err(e) => {
                            warn!(error = %e, "Token store read failed; treating as absent");
                            None
                        }
                    };
                    self.feed(Event::StoredToken(token), &mut queue);
                }

                Command::PersistToken { token } => {
                    if let Err(e) = self.store.set(&token).await {
                        warn!(error = %e, "Failed to persist token");
                        // Abort the chained profile fetch; nothing durable exists
                        queue.clear();
                        self.feed(
                            Event::TokenPersistFailed {
                                reason: e.to_string(),
                            },
                            &mut queue,
                        );
                    }
                }

                Command::DiscardToken => {
                    // Logout and fail-closed resets never surface store errors
                    if let Err(e) = self.store.delete().await {
                        warn!(error = %e, "Failed to delete stored token");
                    }
                }

                Command::CallApi(call) => {
                    let event = self.execute(call).await;
                    self.feed(event, &mut queue);
                }
            }
        }
    }

    fn feed(&mut self, event: Event, queue: &mut VecDeque<Command>) {
        let step = machine::on_event(&self.session, event);
        self.session = step.session;
        // Commands produced by this event run before anything still queued
        for command in step.commands.into_iter().rev() {
            queue.push_front(command);
        }
    }

    async fn execute(&mut self, call: ApiCall) -> Event {
        match call {
            ApiCall::Register {
                name,
                email,
                password,
            } => attempt_outcome(self.api.register(&name, &email, &password).await),

            ApiCall::Login { email, password } => {
                attempt_outcome(self.api.login(&email, &password).await)
            }

            ApiCall::VerifyOtp { phone, code } => {
                attempt_outcome(self.api.verify_otp(&phone, &code).await)
            }

            ApiCall::RegisterPhone { phone } => match self.api.register_phone(&phone).await {
                Ok(()) => Event::CodeDispatched,
                Err(e) => Event::AttemptFailed(classify(e)),
            },

            ApiCall::ForgotPassword { email } => match self.api.forgot_password(&email).await {
                Ok(()) => Event::ResetLinkSent { email },
                Err(e) => Event::SideRequestFailed(classify(e)),
            },

            ApiCall::ResetPassword { reset_id, password } => {
                match self.api.reset_password(&reset_id, &password).await {
                    Ok(()) => Event::PasswordChanged,
                    Err(e) => Event::SideRequestFailed(classify(e)),
                }
            }

            ApiCall::FetchProfile => {
                // The machine only issues a fetch with a token in hand;
                // fail closed if that ever stops holding.
                let Some(token) = self.session.token().map(str::to_string) else {
                    return Event::ProfileRejected;
                };
                match self.api.fetch_profile(&token).await {
                    Ok(profile) => Event::ProfileLoaded(profile),
                    Err(e) => {
                        debug!(error = %e, "Profile fetch failed");
                        Event::ProfileRejected
                    }
                }
            }
        }
    }
}

fn attempt_outcome(result: Result<AuthResponse, ApiError>) -> Event {
    match result {
        Ok(response) => Event::TokenIssued {
            token: response.token,
        },
        Err(e) => Event::AttemptFailed(classify(e)),
    }
}

/// Collapse the API error taxonomy into the machine-level classification.
/// Nothing here is ever thrown past the manager boundary.
fn classify(error: ApiError) -> AuthFailure {
    match error {
        ApiError::Validation(fields) => AuthFailure::Validation(fields),
        ApiError::Unauthorized => AuthFailure::Auth,
        other => AuthFailure::Network(other.to_string()),
    }
}

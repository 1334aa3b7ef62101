//! Session lifecycle state machine.
//!
//! Pure transition functions: the current `Session` plus an `Intent` or
//! `Event` produce a `Step` - the next session and the side-effect
//! commands the manager must execute, in order. Transitions perform no
//! I/O, so the whole lifecycle table is testable without a server or a
//! keychain.

use crate::models::Profile;
use crate::notify::Notice;

use super::state::{AuthFailure, Session, SessionStatus};

/// A user- or system-triggered request to change authentication state.
/// Transient, never persisted.
#[derive(Debug, Clone)]
pub enum Intent {
    Register {
        name: String,
        email: String,
        password: String,
    },
    Login {
        email: String,
        password: String,
    },
    RegisterPhone {
        phone: String,
    },
    VerifyOtp {
        phone: String,
        code: String,
    },
    ForgotPassword {
        email: String,
    },
    ResetPassword {
        reset_id: String,
        password: String,
    },
    Logout,
    Bootstrap,
}

impl Intent {
    /// Short name for logging. Never includes credential material.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Register { .. } => "register",
            Intent::Login { .. } => "login",
            Intent::RegisterPhone { .. } => "register_phone",
            Intent::VerifyOtp { .. } => "verify_otp",
            Intent::ForgotPassword { .. } => "forgot_password",
            Intent::ResetPassword { .. } => "reset_password",
            Intent::Logout => "logout",
            Intent::Bootstrap => "bootstrap",
        }
    }
}

/// Outcome of an executed command, fed back into the machine.
#[derive(Debug, Clone)]
pub enum Event {
    /// The bootstrap store read finished.
    StoredToken(Option<String>),
    /// Register/login/OTP-verify returned a token.
    TokenIssued { token: String },
    /// The credential store rejected the token write.
    TokenPersistFailed { reason: String },
    /// Phone registration accepted; the code was dispatched out of band.
    CodeDispatched,
    /// The profile fetch succeeded.
    ProfileLoaded(Profile),
    /// The profile fetch failed, for any reason.
    ProfileRejected,
    /// A register/login/phone/OTP attempt failed.
    AttemptFailed(AuthFailure),
    /// The forgot-password request was accepted.
    ResetLinkSent { email: String },
    /// The password reset was accepted.
    PasswordChanged,
    /// A forgot/reset request failed.
    SideRequestFailed(AuthFailure),
}

/// HTTP call for the manager to execute against the remote auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Register {
        name: String,
        email: String,
        password: String,
    },
    Login {
        email: String,
        password: String,
    },
    RegisterPhone {
        phone: String,
    },
    VerifyOtp {
        phone: String,
        code: String,
    },
    ForgotPassword {
        email: String,
    },
    ResetPassword {
        reset_id: String,
        password: String,
    },
    /// Uses the session's transient token.
    FetchProfile,
}

/// Side effect produced by a transition, executed by the manager in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CallApi(ApiCall),
    ReadToken,
    PersistToken { token: String },
    DiscardToken,
    Emit(Vec<Notice>),
}

/// Result of one transition: the next session plus its side effects.
#[derive(Debug, Clone)]
pub struct Step {
    pub session: Session,
    pub commands: Vec<Command>,
}

impl Step {
    fn with(session: Session, commands: Vec<Command>) -> Self {
        Self { session, commands }
    }

    /// A step with no side effects.
    fn quiet(session: Session) -> Self {
        Self {
            session,
            commands: Vec::new(),
        }
    }
}

/// Handle a submitted intent.
pub fn on_intent(session: &Session, intent: Intent) -> Step {
    match intent {
        // Unconditional: logout must always succeed from the UI's view,
        // and it clears the profile along with everything else.
        Intent::Logout => Step::with(Session::new(), vec![Command::DiscardToken]),

        Intent::Bootstrap => match session.status {
            SessionStatus::Unauthenticated | SessionStatus::Error => {
                Step::with(Session::new(), vec![Command::ReadToken])
            }
            _ => Step::quiet(session.clone()),
        },

        Intent::Register {
            name,
            email,
            password,
        } => begin_attempt(
            session,
            ApiCall::Register {
                name,
                email,
                password,
            },
        ),
        Intent::Login { email, password } => {
            begin_attempt(session, ApiCall::Login { email, password })
        }
        Intent::RegisterPhone { phone } => begin_attempt(session, ApiCall::RegisterPhone { phone }),
        Intent::VerifyOtp { phone, code } => {
            begin_attempt(session, ApiCall::VerifyOtp { phone, code })
        }

        // Neither of these authenticates; status is left alone.
        Intent::ForgotPassword { email } => Step::with(
            session.clone(),
            vec![Command::CallApi(ApiCall::ForgotPassword { email })],
        ),
        Intent::ResetPassword { reset_id, password } => Step::with(
            session.clone(),
            vec![Command::CallApi(ApiCall::ResetPassword { reset_id, password })],
        ),
    }
}

/// Credential-bearing intents only start from a logged-out state. An
/// attempt already in flight wins; gating re-submission is the caller's
/// responsibility.
fn begin_attempt(session: &Session, call: ApiCall) -> Step {
    match session.status {
        SessionStatus::Unauthenticated | SessionStatus::Error => {
            let next = Session {
                status: SessionStatus::Authenticating,
                user: None,
                token: None,
                last_error: None,
            };
            Step::with(next, vec![Command::CallApi(call)])
        }
        _ => Step::quiet(session.clone()),
    }
}

/// Handle the outcome of an executed command.
pub fn on_event(session: &Session, event: Event) -> Step {
    match event {
        Event::StoredToken(Some(token)) => {
            if session.status == SessionStatus::Unauthenticated {
                let next = Session {
                    status: SessionStatus::Authenticating,
                    user: None,
                    token: Some(token),
                    last_error: None,
                };
                Step::with(next, vec![Command::CallApi(ApiCall::FetchProfile)])
            } else {
                Step::quiet(session.clone())
            }
        }

        // No stored token: bootstrap is a no-op and never touches the network.
        Event::StoredToken(None) => Step::quiet(session.clone()),

        Event::TokenIssued { token } => {
            // Persist before the profile fetch. The manager executes these
            // in order and aborts the chain if the write fails.
            let next = Session {
                status: SessionStatus::Authenticating,
                user: None,
                token: Some(token.clone()),
                last_error: None,
            };
            Step::with(
                next,
                vec![
                    Command::PersistToken { token },
                    Command::CallApi(ApiCall::FetchProfile),
                ],
            )
        }

        Event::TokenPersistFailed { reason } => Step::quiet(Session {
            status: SessionStatus::Error,
            user: None,
            token: None,
            last_error: Some(AuthFailure::Storage(reason)),
        }),

        // No token was issued; the machine returns to logged-out awaiting
        // the OTP verification.
        Event::CodeDispatched => Step::quiet(Session::new()),

        Event::ProfileLoaded(profile) => {
            if session.status == SessionStatus::Authenticating && session.token.is_some() {
                Step::quiet(Session {
                    status: SessionStatus::Authenticated,
                    user: Some(profile),
                    token: session.token.clone(),
                    last_error: None,
                })
            } else {
                Step::quiet(session.clone())
            }
        }

        // Fail closed: any ambiguity about the remote session's validity
        // defaults to logged out, with the stored token removed.
        Event::ProfileRejected => Step::with(Session::new(), vec![Command::DiscardToken]),

        Event::AttemptFailed(failure) => {
            let commands = notices_for(&failure);
            let next = Session {
                status: SessionStatus::Unauthenticated,
                user: None,
                token: None,
                last_error: Some(failure),
            };
            Step::with(next, commands)
        }

        Event::ResetLinkSent { email } => Step::with(
            session.clone(),
            vec![Command::Emit(vec![Notice::success(format!(
                "Email sent to {} with reset link",
                email
            ))])],
        ),

        Event::PasswordChanged => Step::with(
            session.clone(),
            vec![Command::Emit(vec![Notice::success(
                "Password changed successfully, login again",
            )])],
        ),

        Event::SideRequestFailed(failure) => {
            let commands = notices_for(&failure);
            let next = Session {
                last_error: Some(failure),
                ..session.clone()
            };
            Step::with(next, commands)
        }
    }
}

/// Validation failures surface one danger notice per server entry, in
/// server order. Anything else is a plain reset: the server gave no field
/// detail and none is invented.
fn notices_for(failure: &AuthFailure) -> Vec<Command> {
    match failure {
        AuthFailure::Validation(fields) => vec![Command::Emit(
            fields
                .iter()
                .map(|field| Notice::danger(field.msg.clone()))
                .collect(),
        )],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldError;

    fn profile() -> Profile {
        Profile {
            id: "64a1f2".to_string(),
            name: "Jess Chen".to_string(),
            email: "jess@example.com".to_string(),
            phone: None,
        }
    }

    fn authenticating_with(token: &str) -> Session {
        Session {
            status: SessionStatus::Authenticating,
            user: None,
            token: Some(token.to_string()),
            last_error: None,
        }
    }

    #[test]
    fn test_bootstrap_without_token_stays_offline() {
        let step = on_intent(&Session::new(), Intent::Bootstrap);
        assert_eq!(step.commands, vec![Command::ReadToken]);

        let step = on_event(&step.session, Event::StoredToken(None));
        assert_eq!(step.session, Session::new());
        // No commands at all: the remote auth service is never called
        assert!(step.commands.is_empty());
    }

    #[test]
    fn test_bootstrap_with_stored_token_fetches_profile() {
        let step = on_event(&Session::new(), Event::StoredToken(Some("abc".to_string())));
        assert_eq!(step.session.status, SessionStatus::Authenticating);
        assert_eq!(step.session.token.as_deref(), Some("abc"));
        assert_eq!(step.commands, vec![Command::CallApi(ApiCall::FetchProfile)]);
    }

    #[test]
    fn test_bootstrap_with_rejected_token_resets_and_discards() {
        // Unauthenticated -> Authenticating -> Unauthenticated, token removed
        let step = on_event(&Session::new(), Event::StoredToken(Some("abc".to_string())));
        assert_eq!(step.session.status, SessionStatus::Authenticating);

        let step = on_event(&step.session, Event::ProfileRejected);
        assert_eq!(step.session, Session::new());
        assert_eq!(step.commands, vec![Command::DiscardToken]);
    }

    #[test]
    fn test_login_issues_api_call() {
        let step = on_intent(
            &Session::new(),
            Intent::Login {
                email: "jess@example.com".to_string(),
                password: "hunter2".to_string(),
            },
        );
        assert_eq!(step.session.status, SessionStatus::Authenticating);
        assert_eq!(
            step.commands,
            vec![Command::CallApi(ApiCall::Login {
                email: "jess@example.com".to_string(),
                password: "hunter2".to_string(),
            })]
        );
    }

    #[test]
    fn test_token_issued_persists_before_profile_fetch() {
        let authenticating = on_intent(
            &Session::new(),
            Intent::Login {
                email: "jess@example.com".to_string(),
                password: "hunter2".to_string(),
            },
        )
        .session;

        let step = on_event(
            &authenticating,
            Event::TokenIssued {
                token: "abc".to_string(),
            },
        );
        assert_eq!(step.session.status, SessionStatus::Authenticating);
        assert_eq!(step.session.token.as_deref(), Some("abc"));
        assert_eq!(
            step.commands,
            vec![
                Command::PersistToken {
                    token: "abc".to_string()
                },
                Command::CallApi(ApiCall::FetchProfile),
            ]
        );
    }

    #[test]
    fn test_profile_loaded_completes_authentication() {
        let step = on_event(&authenticating_with("abc"), Event::ProfileLoaded(profile()));
        assert_eq!(step.session.status, SessionStatus::Authenticated);
        assert_eq!(step.session.token.as_deref(), Some("abc"));
        assert_eq!(
            step.session.user.as_ref().map(|u| u.email.as_str()),
            Some("jess@example.com")
        );
        assert!(step.commands.is_empty());
        assert!(step.session.invariant_holds());
    }

    #[test]
    fn test_profile_without_token_cannot_authenticate() {
        let session = Session {
            status: SessionStatus::Authenticating,
            user: None,
            token: None,
            last_error: None,
        };
        let step = on_event(&session, Event::ProfileLoaded(profile()));
        assert_ne!(step.session.status, SessionStatus::Authenticated);
    }

    #[test]
    fn test_validation_failure_emits_ordered_notices() {
        let failure = AuthFailure::Validation(vec![
            FieldError {
                msg: "Invalid credentials".to_string(),
            },
            FieldError {
                msg: "Email is required".to_string(),
            },
        ]);
        let step = on_event(&authenticating_with("ignored"), Event::AttemptFailed(failure));

        assert_eq!(step.session.status, SessionStatus::Unauthenticated);
        assert!(step.session.token.is_none());
        match &step.commands[..] {
            [Command::Emit(notices)] => {
                assert_eq!(notices.len(), 2);
                assert_eq!(notices[0].message, "Invalid credentials");
                assert_eq!(notices[1].message, "Email is required");
            }
            other => panic!("Expected a single Emit command, got {:?}", other),
        }
    }

    #[test]
    fn test_rejected_login_emits_exactly_one_notice() {
        let authenticating = on_intent(
            &Session::new(),
            Intent::Login {
                email: "jess@example.com".to_string(),
                password: "wrong".to_string(),
            },
        )
        .session;

        let failure = AuthFailure::Validation(vec![FieldError {
            msg: "Invalid credentials".to_string(),
        }]);
        let step = on_event(&authenticating, Event::AttemptFailed(failure));

        assert_eq!(step.session.status, SessionStatus::Unauthenticated);
        match &step.commands[..] {
            [Command::Emit(notices)] => {
                assert_eq!(notices.len(), 1);
                assert_eq!(notices[0].message, "Invalid credentials");
                assert_eq!(notices[0].severity, crate::notify::Severity::Danger);
            }
            other => panic!("Expected a single Emit command, got {:?}", other),
        }
        // No PersistToken command anywhere in the step
        assert!(!step
            .commands
            .iter()
            .any(|c| matches!(c, Command::PersistToken { .. })));
    }

    #[test]
    fn test_network_failure_is_a_plain_reset() {
        let step = on_event(
            &authenticating_with("ignored"),
            Event::AttemptFailed(AuthFailure::Network("connection refused".to_string())),
        );
        assert_eq!(step.session.status, SessionStatus::Unauthenticated);
        // No invented field errors, no notices
        assert!(step.commands.is_empty());
        assert!(matches!(
            step.session.last_error,
            Some(AuthFailure::Network(_))
        ));
    }

    #[test]
    fn test_code_dispatched_returns_to_logged_out() {
        let authenticating = on_intent(
            &Session::new(),
            Intent::RegisterPhone {
                phone: "+15551234".to_string(),
            },
        )
        .session;
        assert_eq!(authenticating.status, SessionStatus::Authenticating);

        let step = on_event(&authenticating, Event::CodeDispatched);
        assert_eq!(step.session, Session::new());
        assert!(step.commands.is_empty());
    }

    #[test]
    fn test_verify_otp_success_chain() {
        // verify -> token issued -> persist + profile fetch -> authenticated
        let step = on_intent(
            &Session::new(),
            Intent::VerifyOtp {
                phone: "+15551234".to_string(),
                code: "000000".to_string(),
            },
        );
        assert_eq!(
            step.commands,
            vec![Command::CallApi(ApiCall::VerifyOtp {
                phone: "+15551234".to_string(),
                code: "000000".to_string(),
            })]
        );

        let step = on_event(
            &step.session,
            Event::TokenIssued {
                token: "abc".to_string(),
            },
        );
        assert_eq!(
            step.commands,
            vec![
                Command::PersistToken {
                    token: "abc".to_string()
                },
                Command::CallApi(ApiCall::FetchProfile),
            ]
        );

        let step = on_event(&step.session, Event::ProfileLoaded(profile()));
        assert!(step.session.is_authenticated());
        assert_eq!(step.session.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_logout_resets_from_any_state() {
        let authenticated = Session {
            status: SessionStatus::Authenticated,
            user: Some(profile()),
            token: Some("abc".to_string()),
            last_error: None,
        };

        for session in [
            Session::new(),
            authenticating_with("abc"),
            authenticated,
            Session {
                status: SessionStatus::Error,
                user: None,
                token: None,
                last_error: Some(AuthFailure::Storage("disk full".to_string())),
            },
        ] {
            let step = on_intent(&session, Intent::Logout);
            assert_eq!(step.session, Session::new());
            // Profile and error are cleared; the store delete is still issued
            assert_eq!(step.commands, vec![Command::DiscardToken]);
        }
    }

    #[test]
    fn test_persist_failure_parks_in_error() {
        let step = on_event(
            &authenticating_with("abc"),
            Event::TokenPersistFailed {
                reason: "keychain locked".to_string(),
            },
        );
        assert_eq!(step.session.status, SessionStatus::Error);
        assert!(step.session.token.is_none());
        assert!(matches!(
            step.session.last_error,
            Some(AuthFailure::Storage(_))
        ));

        // A fresh login from the error state proceeds normally
        let step = on_intent(
            &step.session,
            Intent::Login {
                email: "jess@example.com".to_string(),
                password: "hunter2".to_string(),
            },
        );
        assert_eq!(step.session.status, SessionStatus::Authenticating);
        assert!(step.session.last_error.is_none());
    }

    #[test]
    fn test_intent_ignored_while_authenticating() {
        let authenticating = authenticating_with("abc");
        let step = on_intent(
            &authenticating,
            Intent::Login {
                email: "jess@example.com".to_string(),
                password: "hunter2".to_string(),
            },
        );
        assert_eq!(step.session, authenticating);
        assert!(step.commands.is_empty());
    }

    #[test]
    fn test_forgot_password_leaves_status_alone() {
        let step = on_intent(
            &Session::new(),
            Intent::ForgotPassword {
                email: "jess@example.com".to_string(),
            },
        );
        assert_eq!(step.session.status, SessionStatus::Unauthenticated);

        let step = on_event(
            &step.session,
            Event::ResetLinkSent {
                email: "jess@example.com".to_string(),
            },
        );
        assert_eq!(step.session.status, SessionStatus::Unauthenticated);
        match &step.commands[..] {
            [Command::Emit(notices)] => {
                assert_eq!(
                    notices[0].message,
                    "Email sent to jess@example.com with reset link"
                );
            }
            other => panic!("Expected a single Emit command, got {:?}", other),
        }
    }

    #[test]
    fn test_register_then_profile_yields_matching_email() {
        let step = on_intent(
            &Session::new(),
            Intent::Register {
                name: "Jess Chen".to_string(),
                email: "jess@example.com".to_string(),
                password: "hunter2".to_string(),
            },
        );
        let step = on_event(
            &step.session,
            Event::TokenIssued {
                token: "tok".to_string(),
            },
        );
        let step = on_event(&step.session, Event::ProfileLoaded(profile()));

        assert!(step.session.is_authenticated());
        assert_eq!(
            step.session.user.as_ref().map(|u| u.email.as_str()),
            Some("jess@example.com")
        );
    }
}

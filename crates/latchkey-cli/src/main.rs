//! latchkey - command-line driver for the authentication session manager.
//!
//! This binary is the stand-in for a UI layer: it turns argv into intents,
//! dispatches them through the session manager, and renders the observed
//! session state and notices. It holds no session logic of its own.

use std::io::{self, Write};

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use latchkey_core::session::Intent;
use latchkey_core::store::mask_token;
use latchkey_core::{
    AuthClient, Config, FileStore, KeyringStore, Session, SessionManager, Severity, TokenStore,
};

const USAGE: &str = "latchkey - client auth session manager

Usage:
  latchkey login [email]          Log in with email and password
  latchkey register <name> <email>  Create an account
  latchkey phone <number>         Request a one-time code, then verify it
  latchkey verify <number> <code> Exchange a one-time code for a session
  latchkey forgot <email>         Request a password-reset link
  latchkey reset <reset-id>       Set a new password from a reset link
  latchkey logout                 Log out and clear the stored token
  latchkey whoami                 Show the current profile
  latchkey status                 Show session status and store backend

Environment:
  LATCHKEY_SERVER_URL             Auth server base URL
  LATCHKEY_TOKEN_STORE            Token store backend: keyring (default) or file
  RUST_LOG                        Log filter (e.g. RUST_LOG=debug)";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

type Manager = SessionManager<Box<dyn TokenStore>>;

fn build_manager(config: &Config) -> Result<Manager> {
    let api = AuthClient::new(config.server_url())?;
    let store: Box<dyn TokenStore> = match config.token_store().as_str() {
        "file" => Box::new(FileStore::new(Config::store_dir()?)),
        _ => Box::new(KeyringStore::new()),
    };
    Ok(SessionManager::new(api, store))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    let mut manager = build_manager(&config)?;

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    match command {
        "login" => cmd_login(&mut manager, &mut config, args.get(2).cloned()).await?,
        "register" => match (args.get(2), args.get(3)) {
            (Some(name), Some(email)) => {
                cmd_register(&mut manager, &mut config, name, email).await?;
            }
            _ => eprintln!("Usage: latchkey register <name> <email>"),
        },
        "phone" => match args.get(2) {
            Some(number) => cmd_phone(&mut manager, number).await?,
            None => eprintln!("Usage: latchkey phone <number>"),
        },
        "verify" => match (args.get(2), args.get(3)) {
            (Some(number), Some(code)) => cmd_verify(&mut manager, number, code).await?,
            _ => eprintln!("Usage: latchkey verify <number> <code>"),
        },
        "forgot" => match args.get(2) {
            Some(email) => {
                manager
                    .dispatch(Intent::ForgotPassword {
                        email: email.clone(),
                    })
                    .await;
                print_notices(&mut manager);
            }
            None => eprintln!("Usage: latchkey forgot <email>"),
        },
        "reset" => match args.get(2) {
            Some(reset_id) => {
                let password = prompt_password("New password: ")?;
                manager
                    .dispatch(Intent::ResetPassword {
                        reset_id: reset_id.clone(),
                        password,
                    })
                    .await;
                print_notices(&mut manager);
            }
            None => eprintln!("Usage: latchkey reset <reset-id>"),
        },
        "logout" => {
            manager.dispatch(Intent::Logout).await;
            println!("Logged out.");
        }
        "whoami" => cmd_whoami(&mut manager).await,
        "status" => cmd_status(&mut manager, &config).await,
        _ => println!("{}", USAGE),
    }

    Ok(())
}

async fn cmd_login(manager: &mut Manager, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt_with_default("Email", config.last_email.as_deref())?,
    };
    let password = prompt_password("Password: ")?;

    manager
        .dispatch(Intent::Login {
            email: email.clone(),
            password,
        })
        .await;

    finish_auth_attempt(manager, config, &email)
}

async fn cmd_register(
    manager: &mut Manager,
    config: &mut Config,
    name: &str,
    email: &str,
) -> Result<()> {
    let password = prompt_password("Password: ")?;

    manager
        .dispatch(Intent::Register {
            name: name.to_string(),
            email: email.to_string(),
            password,
        })
        .await;

    finish_auth_attempt(manager, config, email)
}

async fn cmd_phone(manager: &mut Manager, number: &str) -> Result<()> {
    manager
        .dispatch(Intent::RegisterPhone {
            phone: number.to_string(),
        })
        .await;
    print_notices(manager);

    if manager.session().last_error.is_some() {
        std::process::exit(1);
    }

    println!("A verification code was sent to {}.", number);
    let code = prompt_line("Code: ")?;
    cmd_verify(manager, number, code.trim()).await
}

async fn cmd_verify(manager: &mut Manager, number: &str, code: &str) -> Result<()> {
    manager
        .dispatch(Intent::VerifyOtp {
            phone: number.to_string(),
            code: code.to_string(),
        })
        .await;
    print_notices(manager);

    match manager.session().user.as_ref() {
        Some(user) => {
            info!("Phone login successful");
            println!("Logged in as {} <{}>", user.name, user.email);
            Ok(())
        }
        None => {
            println!("Verification failed.");
            std::process::exit(1);
        }
    }
}

async fn cmd_whoami(manager: &mut Manager) {
    let session = manager.dispatch(Intent::Bootstrap).await;
    match session.user.as_ref() {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            if let Some(ref phone) = user.phone {
                println!("phone: {}", phone);
            }
        }
        None => println!("Not logged in."),
    }
}

async fn cmd_status(manager: &mut Manager, config: &Config) {
    let session = manager.dispatch(Intent::Bootstrap).await;
    println!("server:  {}", config.server_url());
    println!("store:   {}", config.token_store());
    println!("session: {}", session.status);
    if let Some(token) = session.token() {
        println!("token:   {}", mask_token(token));
    }
}

/// Shared tail of login/register: report the outcome, remember the email.
fn finish_auth_attempt(manager: &mut Manager, config: &mut Config, email: &str) -> Result<()> {
    print_notices(manager);

    match manager.session() {
        Session {
            user: Some(user), ..
        } => {
            info!("Login successful");
            println!("Logged in as {} <{}>", user.name, user.email);
            config.last_email = Some(email.to_string());
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            Ok(())
        }
        _ => {
            println!("Login failed.");
            std::process::exit(1);
        }
    }
}

fn print_notices(manager: &mut Manager) {
    for notice in manager.take_notices() {
        match notice.severity {
            Severity::Danger => eprintln!("error: {}", notice.message),
            Severity::Success => println!("{}", notice.message),
        }
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_with_default(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(default) => {
            let input = prompt_line(&format!("{} [{}]: ", label, default))?;
            if input.is_empty() {
                Ok(default.to_string())
            } else {
                Ok(input)
            }
        }
        None => prompt_line(&format!("{}: ", label)),
    }
}

fn prompt_password(prompt: &str) -> Result<String> {
    let password = rpassword::prompt_password(prompt)?;
    Ok(password)
}

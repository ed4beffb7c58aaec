//! roomkey - sign in to the hotel booking API from the terminal.
//!
//! Drives the same auth flow as the mobile app: the session token is kept in
//! the configured token store and every API call picks it up from there.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use roomkey_core::{
    ApiClient, AuthContext, AuthError, AuthPhase, Config, FetchOutcome, RegisterRequest,
    SignInRequest, UserProfile,
};

const USAGE: &str = "\
Usage: roomkey <command>

Commands:
  login [email]   Sign in and store the session token
  register        Create a new account
  logout          Forget the stored session token
  profile         Show the signed-in user's profile
  status          Show whether a session is stored and still accepted
";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        eprint!("{}", USAGE);
        std::process::exit(2);
    };
    if matches!(command, "-h" | "--help" | "help") {
        print!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    let store = config.token_store()?;
    let api = ApiClient::from_config(&config, store.clone())?;
    info!(base_url = %api.base_url(), "roomkey starting");
    let auth = AuthContext::new(Arc::new(api), store);

    let result = match command {
        "login" => login(&auth, &mut config, args.get(2).cloned()).await,
        "register" => register(&auth).await,
        "logout" => logout(&auth),
        "profile" => profile(&auth).await,
        "status" => status(&auth).await,
        other => {
            eprintln!("Unknown command: {}\n", other);
            eprint!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        warn!(error = %e, "Command failed");
        report(&e);
        std::process::exit(1);
    }
    Ok(())
}

/// Print a failure for the user.
fn report(err: &anyhow::Error) {
    for line in failure_lines(err) {
        eprintln!("{}", line);
    }
}

/// Auth errors get their UI text plus any further field messages; anything
/// else (terminal input, config) shows its context chain.
fn failure_lines(err: &anyhow::Error) -> Vec<String> {
    let Some(auth) = err.downcast_ref::<AuthError>() else {
        return vec![format!("Error: {:#}", err)];
    };
    let mut lines = vec![format!("Error: {}", auth.user_message())];
    if let Some(errors) = auth.validation_errors() {
        for (field, messages) in errors.iter().skip(1) {
            for message in messages {
                lines.push(format!("  {}: {}", field, message));
            }
        }
    }
    lines
}

async fn login(
    auth: &AuthContext,
    config: &mut Config,
    email: Option<String>,
) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt_line("Email", config.last_email.as_deref())?,
    };
    let password = read_password("Password: ")?;

    let outcome = auth.sign_in(&SignInRequest::new(email.clone(), password)).await?;

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    if let FetchOutcome::Authenticated(user) = outcome {
        println!("Signed in as {}.", user.display_name());
    }
    Ok(())
}

async fn register(auth: &AuthContext) -> Result<()> {
    let form = RegisterRequest {
        full_name: prompt_line("Full name", None)?,
        email: prompt_line("Email", None)?,
        phone: prompt_line("Phone", None)?,
        password: read_password("Password: ")?,
        password_confirmation: read_password("Confirm password: ")?,
    };

    auth.sign_up(&form).await?;
    println!("Account created. Run `roomkey login {}` to sign in.", form.email);
    Ok(())
}

fn logout(auth: &AuthContext) -> Result<()> {
    auth.sign_out()?;
    println!("Signed out.");
    Ok(())
}

async fn profile(auth: &AuthContext) -> Result<()> {
    match auth.initialize().await? {
        FetchOutcome::Authenticated(user) => print_profile(&user),
        _ => println!("Not signed in. Run `roomkey login` first."),
    }
    Ok(())
}

async fn status(auth: &AuthContext) -> Result<()> {
    // A rejected or unreachable session is reported, not treated as a failure
    if let Err(e) = auth.initialize().await {
        println!("Session not verified: {}", e.user_message());
    }
    match auth.snapshot().phase() {
        AuthPhase::Authenticated => {
            let name = auth.user().map(|u| u.display_name().to_string()).unwrap_or_default();
            println!("Signed in as {}.", name);
        }
        AuthPhase::Unauthenticated | AuthPhase::Loading => println!("Not signed in."),
    }
    Ok(())
}

fn print_profile(user: &UserProfile) {
    println!("{} ({})", user.full_name, user.initials());
    println!("  Email: {}", user.email);
    if let Some(phone) = &user.phone {
        println!("  Phone: {}", phone);
    }
    if let Some(url) = &user.profile_image_url {
        println!("  Photo: {}", url);
    }
}

fn prompt_line(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(default) => print!("{} [{}]: ", label, default),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .with_context(|| format!("Failed to read {}", label.to_lowercase()))?;
    let line = line.trim();
    Ok(match (line.is_empty(), default) {
        (true, Some(default)) => default.to_string(),
        _ => line.to_string(),
    })
}

fn read_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password")
}

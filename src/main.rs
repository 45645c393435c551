//! MoneyMate CLI - terminal client for the MoneyMate personal-finance API.
//!
//! Drives the auth flow end to end: signup, OTP verification, login,
//! session inspection, and logout. A successful login or verification
//! persists the session, so later invocations start authenticated.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use moneymate::api::{ApiClient, ApiError};
use moneymate::auth::{FileStorage, Session};
use moneymate::config::Config;
use moneymate::models::SignupRequest;

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_usage() {
    println!("MoneyMate - personal finance client\n");
    println!("Usage: moneymate <command>\n");
    println!("Commands:");
    println!("  login    Log in with email and password");
    println!("  signup   Create an account (sends an OTP to your email)");
    println!("  verify   Verify the signup OTP");
    println!("  resend   Resend the signup OTP");
    println!("  status   Show the current session");
    println!("  logout   Clear the current session");
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let mut config = Config::load()?;

    let data_dir = Config::data_dir()?;
    let mut session = Session::new(Box::new(FileStorage::new(data_dir)));
    if let Err(e) = session.load() {
        // A corrupt session file should not brick the CLI
        warn!(error = %e, "Could not restore session; starting anonymous");
    }
    let session = Arc::new(Mutex::new(session));

    let client = ApiClient::new(
        &config.api_base_url(),
        &config.resend_otp_path(),
        Arc::clone(&session),
    )?;

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("login") => login(&client, &mut config).await,
        Some("signup") => signup(&client, &mut config).await,
        Some("verify") => verify(&client, &config).await,
        Some("resend") => resend(&client, &config).await,
        Some("status") => {
            status(&session);
            Ok(())
        }
        Some("logout") => {
            client.logout();
            println!("Logged out.");
            Ok(())
        }
        Some(other) => {
            print_usage();
            bail!("Unknown command: {other}");
        }
        None => {
            print_usage();
            println!();
            status(&session);
            Ok(())
        }
    }
}

fn status(session: &Arc<Mutex<Session>>) {
    let session = session.lock().unwrap_or_else(|e| e.into_inner());
    match session.user() {
        Some(user) => println!("Logged in as {} <{}>", user.display_name(), user.email),
        None => println!("Not logged in."),
    }
}

async fn login(client: &ApiClient, config: &mut Config) -> Result<()> {
    let email = prompt_with_default("Email", config.last_email.as_deref())?;
    let password = rpassword::prompt_password("Password: ")?;

    match client.login(&email, &password).await {
        Ok(data) => {
            config.last_email = Some(email);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Login Successful. Welcome, {}!", data.user.display_name());
            Ok(())
        }
        Err(ApiError::Unauthorized) => bail!("Invalid email or password."),
        Err(e) if e.is_unreachable() => {
            bail!("Unable to reach the server. Check your connection and try again.")
        }
        Err(e) => {
            error!(error = %e, "Login failed");
            bail!("An unexpected error occurred.");
        }
    }
}

async fn signup(client: &ApiClient, config: &mut Config) -> Result<()> {
    let username = prompt("Username")?;
    let email = prompt("Email")?;
    let phone_number = prompt("Phone number")?;
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        bail!("Passwords do not match.");
    }

    let request = SignupRequest {
        username,
        email: email.clone(),
        phone_number,
        password,
    };

    match client.signup(&request).await {
        Ok(()) => {
            config.last_email = Some(email.clone());
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Account created. Please verify your OTP.");

            print!("Verify now? [Y/n]: ");
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if input.trim().eq_ignore_ascii_case("n") {
                println!("Run `moneymate verify` once you have the code.");
                return Ok(());
            }
            verify_email(client, &email).await
        }
        Err(ApiError::Conflict(_)) => bail!("Account already exists."),
        Err(e) if e.is_unreachable() => {
            bail!("Unable to reach the server. Check your connection and try again.")
        }
        Err(e) => {
            error!(error = %e, "Signup failed");
            bail!("An unexpected error occurred.");
        }
    }
}

async fn verify(client: &ApiClient, config: &Config) -> Result<()> {
    let email = prompt_with_default("Email", config.last_email.as_deref())?;
    verify_email(client, &email).await
}

async fn verify_email(client: &ApiClient, email: &str) -> Result<()> {
    let otp = prompt("Enter 6-digit OTP")?;
    if otp.len() != 6 || !otp.chars().all(|c| c.is_ascii_digit()) {
        bail!("OTP must be 6 digits.");
    }

    match client.verify_otp(email, &otp).await {
        Ok(data) => {
            println!(
                "Verification Successful. Welcome, {}!",
                data.user.display_name()
            );
            Ok(())
        }
        Err(e) if e.is_unreachable() => {
            bail!("Unable to reach the server. Check your connection and try again.")
        }
        Err(e) => {
            error!(error = %e, "OTP verification failed");
            bail!("Invalid or expired OTP.");
        }
    }
}

async fn resend(client: &ApiClient, config: &Config) -> Result<()> {
    let email = prompt_with_default("Email", config.last_email.as_deref())?;

    match client.resend_otp(&email).await {
        Ok(()) => {
            println!("A new OTP has been sent to your email.");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Resend OTP failed");
            bail!("Could not resend OTP.");
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_with_default(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(default) => {
            print!("{label} [{default}]: ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            let input = input.trim();

            if input.is_empty() {
                Ok(default.to_string())
            } else {
                Ok(input.to_string())
            }
        }
        None => prompt(label),
    }
}

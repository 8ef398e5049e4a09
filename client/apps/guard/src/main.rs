//! Guard Entry Point
//!
//! Builds the security manager and session store from the environment and
//! runs one developer command against them. Uses `anyhow` for startup errors;
//! everything user-facing goes through `kernel::error::AppError`.

mod commands;
mod config;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kernel::error::app_error::AppError;
use kernel::time::{Clock, SystemClock};
use platform::storage::FileStorage;
use security::{SecurityManager, manager::DEFAULT_RANDOM_LENGTH};
use session::SessionStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Report;
use crate::config::GuardConfig;

#[derive(Parser)]
#[command(name = "guard")]
#[command(about = "Inspect the client security policy and persisted session", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the active security policy as JSON
    Policy,

    /// Check input against a named pattern (safe, email, uuid, phone, postalCode)
    Validate { pattern: String, input: String },

    /// HTML-escape the input
    Sanitize { input: String },

    /// SHA-256 of the input, lowercase hex
    Hash { data: String },

    /// Secure random hex string
    Random {
        /// Number of random bytes
        #[arg(default_value_t = DEFAULT_RANDOM_LENGTH)]
        length: usize,
    },

    /// Check an upload against the file rules (images, documents, videos, audio)
    File {
        category: String,
        mime: String,
        size_bytes: u64,
    },

    /// Exercise a rate-limit category for one key
    Limit {
        category: String,
        key: String,
        /// Number of consecutive requests to simulate
        #[arg(short, long, default_value = "1")]
        attempts: u32,
    },

    /// Show the persisted session and its expiry status
    Session {
        /// Remove the persisted session instead
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing (stderr, so command output stays clean)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guard=info,session=info,security=info,platform=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = GuardConfig::from_env()?;
    tracing::debug!(
        environment = %config.environment,
        session_store = %config.session_store_path.display(),
        "Configuration loaded"
    );

    let policy = config.security_policy();
    let detailed_errors = policy.flags().detailed_errors;
    let session_config = config.session_config(&policy);
    let manager = SecurityManager::new(policy);

    let report = match cli.command {
        Command::Policy => Report::from_json(&commands::policy(&manager))?,
        Command::Validate { pattern, input } => commands::validate(&manager, &pattern, &input),
        Command::Sanitize { input } => Report::from_text(manager.sanitize_html(&input)),
        Command::Hash { data } => Report::from_text(manager.hash_sensitive_data(&data).await),
        Command::Random { length } => Report::from_text(manager.generate_secure_random(length)),
        Command::File {
            category,
            mime,
            size_bytes,
        } => match manager.validate_file(&category, &mime, size_bytes) {
            Ok(()) => Report::from_text(format!("{mime} accepted for {category}")),
            Err(err) => Report::from_error(AppError::from(err), detailed_errors),
        },
        Command::Limit {
            category,
            key,
            attempts,
        } => commands::limit(
            &manager,
            &category,
            &key,
            attempts,
            detailed_errors,
            SystemClock.now_ms(),
        ),
        Command::Session { clear } => {
            let storage = Arc::new(FileStorage::new(&config.session_store_path));
            if clear {
                SessionStore::with_key(storage, session_config.storage_key.clone()).clear_session();
                Report::from_text("session cleared")
            } else {
                commands::session(storage.as_ref(), &session_config, &SystemClock, detailed_errors)
            }
        }
    };

    if report.success {
        println!("{}", report.output);
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}", report.output);
        Ok(ExitCode::FAILURE)
    }
}

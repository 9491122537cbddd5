//! Pixelport CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! px-cli migrate
//!
//! # Create a verified admin account
//! px-cli admin create -e admin@example.com -n "Admin Name" -p <password>
//!
//! # Promote an existing account to admin
//! px-cli admin promote -e dev@example.com
//!
//! # Mark an account verified (bypasses the email round-trip)
//! px-cli user verify -e user@example.com
//!
//! # Delete unverified accounts older than N days
//! px-cli prune-unverified --days 30
//! ```
//!
//! # Environment Variables
//!
//! - `PIXELPORT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "px-cli")]
#[command(author, version, about = "Pixelport CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Delete unverified accounts older than a threshold
    PruneUnverified {
        /// Minimum account age in days
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new, verified admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin password
        #[arg(short, long)]
        password: String,
    },
    /// Promote an existing account to admin
    Promote {
        /// Email of the account to promote
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Mark an account's email as verified
    Verify {
        /// Email of the account to verify
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => commands::admin::create(&email, &name, &password).await,
            AdminAction::Promote { email } => commands::admin::promote(&email).await,
        },
        Commands::User { action } => match action {
            UserAction::Verify { email } => commands::users::verify(&email).await,
        },
        Commands::PruneUnverified { days } => commands::users::prune_unverified(days).await,
    }
}

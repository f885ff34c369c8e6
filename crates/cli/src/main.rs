//! Craftly CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! craftly-cli migrate
//!
//! # Grant or revoke a role
//! craftly-cli user grant -e ops@craftly.app -r admin
//! craftly-cli user revoke -e mira@craftly.app -r seller
//!
//! # Seed sellers and products
//! craftly-cli seed -f crates/cli/fixtures/sample_seed.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user grant|revoke` - Manage account roles
//! - `seed` - Seed sellers and listings from YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "craftly-cli")]
#[command(author, version, about = "Craftly CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage account roles
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed sellers and products from a YAML file
    Seed {
        /// Path to the seed file
        #[arg(short, long)]
        file: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Grant a role
    Grant {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Role (`buyer`, `seller`, `admin`)
        #[arg(short, long)]
        role: String,
    },
    /// Revoke a role
    Revoke {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Role (`seller`, `admin`)
        #[arg(short, long)]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Grant { email, role } => commands::user::grant(&email, &role).await?,
            UserAction::Revoke { email, role } => commands::user::revoke(&email, &role).await?,
        },
        Commands::Seed { file } => commands::seed::run(&file).await?,
    }
    Ok(())
}

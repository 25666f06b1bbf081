//! DSCommerce CLI - Database migrations, seed data and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! dsc-cli migrate
//!
//! # Load fixture data (categories, products, users, orders, payments)
//! dsc-cli seed crates/cli/fixtures/seed.yaml
//!
//! # Create a user
//! dsc-cli user create -e ana@gmail.com -n "Ana" -p 123456 -r admin
//! ```
//!
//! All commands read `API_DATABASE_URL` (falling back to `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dsc-cli")]
#[command(author, version, about = "DSCommerce CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load fixture data from a YAML file
    Seed {
        /// Path to the fixture file
        file: String,

        /// Truncate all shop tables before loading
        #[arg(long)]
        reset: bool,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Plain-text password (hashed before storage)
        #[arg(short, long)]
        password: String,

        /// Roles (`client`, `admin`); repeat for several
        #[arg(short, long, default_value = "client")]
        role: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, reset } => commands::seed::run(&file, reset).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                password,
                role,
            } => {
                commands::user::create(&email, &name, &password, &role).await?;
            }
        },
    }
    Ok(())
}

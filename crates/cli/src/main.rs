//! Envanter CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! envanter migrate
//!
//! # Create the first admin user
//! envanter user create -u admin -n "Sistem Yöneticisi" -r Admin
//!
//! # Load demo locations, suppliers and materials
//! envanter seed crates/cli/seed/demo.yaml
//!
//! # Export materials as CSV (through the API)
//! envanter export materials -o malzemeler.csv
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create users
//! - `seed` - Seed database from a YAML file
//! - `export` - Export a table as CSV
//! - `critical` - List materials at or below their minimum level
//! - `bulk-delete` - Archive several materials

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use envanter_core::export::ExportKind;

mod commands;

#[derive(Parser)]
#[command(name = "envanter")]
#[command(author, version, about = "Envanter CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed locations, suppliers and materials from a YAML file
    Seed {
        /// Path to the seed file
        file: String,
    },
    /// Export a table as CSV (materials, movements, requests, orders)
    Export {
        kind: ExportKind,

        /// Output file, `-` for stdout (default: the server's file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List materials at or below their minimum level
    Critical,
    /// Archive materials by code
    BulkDelete {
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Full name
        #[arg(short = 'n', long)]
        full_name: String,

        /// Role (Admin, Yönetici, Kullanıcı, Görüntüleyici)
        #[arg(short, long, default_value = "Kullanıcı")]
        role: String,

        #[arg(long, default_value = "")]
        department: String,

        #[arg(long, default_value = "")]
        email: String,

        /// Initial password
        #[arg(long, env = "ENVANTER_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
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
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                full_name,
                role,
                department,
                email,
                password,
            } => {
                commands::user::create(commands::user::CreateUser {
                    username,
                    full_name,
                    role,
                    department,
                    email,
                    password: SecretString::from(password),
                })
                .await?;
            }
        },
        Commands::Seed { file } => {
            commands::seed::run(&file).await?;
        }
        Commands::Export { kind, output } => commands::export::run(kind, output).await?,
        Commands::Critical => commands::materials::critical().await?,
        Commands::BulkDelete { codes } => commands::materials::bulk_delete(&codes).await?,
    }
    Ok(())
}

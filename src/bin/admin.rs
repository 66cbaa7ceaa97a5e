//! Tafeito Admin CLI
//!
//! Administration tool working directly on the server's SQLite database.
//!
//! # Usage
//!
//! ```bash
//! tafeito-admin user list
//! tafeito-admin user remove carla@example.com
//! tafeito-admin checklist list carla@example.com
//! tafeito-admin config show --format json
//! ```
//!
//! # Environment Variables
//!
//! Same as the server: `TAFEITO_DATABASE_PATH`, `TAFEITO_CONFIG`, ...

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use tafeito::auth::normalize_email;
use tafeito::config::Config;
use tafeito::store::{DocumentStore, SqliteStore};

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "tafeito-admin")]
#[command(version)]
#[command(about = "Tafeito server administration tool")]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User(UserCommand),
    /// Inspect checklists
    Checklist(ChecklistCommand),
    /// Inspect configuration
    Config(ConfigCommand),
}

#[derive(Args)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand)]
enum UserSubcommand {
    /// List all users
    List,
    /// Remove a user together with their checklists and items
    Remove {
        /// User's email address
        email: String,
    },
}

#[derive(Args)]
struct ChecklistCommand {
    #[command(subcommand)]
    command: ChecklistSubcommand,
}

#[derive(Subcommand)]
enum ChecklistSubcommand {
    /// List a user's checklists
    List {
        /// Owner's email address
        email: String,
    },
}

#[derive(Clone, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

// ============================================================================
// Commands
// ============================================================================

async fn list_users(store: &SqliteStore) -> Result<(), Box<dyn std::error::Error>> {
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!(
        "{:<38} {:<36} {:<24} {:>10}",
        "ID", "EMAIL", "NAME", "CHECKLISTS"
    );
    println!("{}", "-".repeat(111));

    for user in &users {
        let checklists = store.list_checklists_by_owner(&user.id).await?;
        println!(
            "{:<38} {:<36} {:<24} {:>10}",
            user.id,
            user.email,
            user.name,
            checklists.len()
        );
    }

    println!();
    println!("Total: {} user(s)", users.len());

    Ok(())
}

async fn remove_user(store: &SqliteStore, email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = normalize_email(email);
    let Some(user) = store.find_user_by_email(&email).await? else {
        eprintln!("Error: User '{}' not found", email);
        std::process::exit(1);
    };

    let checklists = store.list_checklists_by_owner(&user.id).await?;
    let mut items = 0;
    for checklist in &checklists {
        for item_id in store.item_ids_by_checklist(&checklist.id).await? {
            store.delete_item(&item_id).await?;
            items += 1;
        }
        store.delete_checklist(&checklist.id).await?;
    }
    store.delete_user(&user.id).await?;

    println!("Removed user: {}", email);
    println!(
        "  {} checklist(s), {} item(s) deleted",
        checklists.len(),
        items
    );

    Ok(())
}

async fn list_checklists(
    store: &SqliteStore,
    email: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let email = normalize_email(email);
    let Some(user) = store.find_user_by_email(&email).await? else {
        eprintln!("Error: User '{}' not found", email);
        std::process::exit(1);
    };

    let checklists = store.list_checklists_by_owner(&user.id).await?;
    if checklists.is_empty() {
        println!("No checklists for {}.", email);
        return Ok(());
    }

    println!("{:<38} {:<30} {:<16} {:>6}", "ID", "NAME", "CATEGORY", "ITEMS");
    println!("{}", "-".repeat(93));

    for checklist in &checklists {
        let items = store.list_items_by_checklist(&checklist.id).await?;
        let done = items.iter().filter(|i| i.completed).count();
        println!(
            "{:<38} {:<30} {:<16} {:>6}",
            checklist.id,
            checklist.name,
            checklist.category.as_deref().unwrap_or("-"),
            format!("{}/{}", done, items.len())
        );
    }

    println!();
    println!("Total: {} checklist(s)", checklists.len());

    Ok(())
}

fn show_config(config: &Config, format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Text => {
            println!("Configuration");
            println!("=============\n");

            if let Some(path) = &config.config_file {
                println!("Config file: {}", path.display());
            } else {
                println!(
                    "Config file: {} (not found)",
                    Config::default_config_path().display()
                );
            }
            println!();

            println!("port: {}", config.port);
            println!("store: {}", config.store);
            println!("database_path: {}", config.database_path.display());
            println!("allowed_origins: {}", config.allowed_origins.join(", "));
            println!("token_expiry_minutes: {}", config.token_expiry_minutes);
            println!(
                "serialize_item_reconciliation: {}",
                config.serialize_item_reconciliation
            );
        }
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    if let Commands::Config(cmd) = &cli.command {
        let ConfigSubcommand::Show { format } = &cmd.command;
        return show_config(&config, format);
    }

    let store = SqliteStore::open(&config.database_path).await?;

    match cli.command {
        Commands::User(user_cmd) => match user_cmd.command {
            UserSubcommand::List => list_users(&store).await,
            UserSubcommand::Remove { email } => remove_user(&store, &email).await,
        },
        Commands::Checklist(cmd) => match cmd.command {
            ChecklistSubcommand::List { email } => list_checklists(&store, &email).await,
        },
        Commands::Config(_) => Ok(()),
    }
}

//! Tafeito API server
//!
//! Serves accounts, bearer sessions and checklists over HTTP.
//!
//! # Configuration
//!
//! Environment variables (override the config file):
//! - `TAFEITO_PORT`: Port to listen on (default: 8001)
//! - `TAFEITO_STORE`: `sqlite` or `memory` (default: sqlite)
//! - `TAFEITO_DATABASE_PATH`: SQLite file (default: ~/.local/share/tafeito/tafeito.db)
//! - `TAFEITO_ALLOWED_ORIGINS`: Comma separated CORS origins
//! - `TAFEITO_TOKEN_EXPIRY_MINUTES`: Bearer token lifetime (default: 30)
//! - `TAFEITO_SERIALIZE_RECONCILIATION`: Serialize item updates per checklist
//! - `TAFEITO_CONFIG`: Path to config file (default: ~/.config/tafeito/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! port: 8001
//! store: sqlite
//! database_path: /var/lib/tafeito/tafeito.db
//! allowed_origins:
//!   - "http://localhost:4200"
//! token_expiry_minutes: 30
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tafeito::auth::{AuthService, PasswordHasher, TokenStore};
use tafeito::config::{Config, StoreBackend};
use tafeito::server::{self, AppState};
use tafeito::store::{MemoryStore, SharedStore, SqliteStore};

#[derive(Parser)]
#[command(name = "tafeito-server")]
#[command(version)]
#[command(about = "Tafeito checklist API server", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tafeito=info,tafeito_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;
    match &config.config_file {
        Some(path) => tracing::info!("Config file: {}", path.display()),
        None => tracing::info!("No config file, using defaults"),
    }

    let store: SharedStore = match config.store {
        StoreBackend::Sqlite => {
            tracing::info!("Database: {}", config.database_path.display());
            Arc::new(SqliteStore::open(&config.database_path).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let tokens = Arc::new(TokenStore::new(config.token_expiry_minutes));
    spawn_token_cleanup(tokens.clone());

    let auth = AuthService::new(store.clone(), PasswordHasher::new(), tokens);
    if config.serialize_item_reconciliation {
        tracing::info!("Item reconciliation is serialized per checklist");
    }
    let state = AppState::new(store, auth, config.serialize_item_reconciliation);

    let app = server::router(state, &config.allowed_origins);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Drops expired sessions once a minute.
fn spawn_token_cleanup(tokens: Arc<TokenStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let removed = tokens.cleanup_expired();
            if removed > 0 {
                tracing::debug!("Removed {} expired session(s)", removed);
            }
        }
    });
}

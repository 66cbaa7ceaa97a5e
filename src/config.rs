use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::auth::MAX_EXPIRY_MINUTES;

/// Which document store backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

impl StoreBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Some(StoreBackend::Sqlite),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// Document store backend
    pub store: StoreBackend,
    /// Path to the SQLite database (sqlite backend only)
    pub database_path: PathBuf,
    /// Origins allowed by CORS. A single "*" allows any origin.
    pub allowed_origins: Vec<String>,
    /// Lifetime of issued bearer tokens
    pub token_expiry_minutes: u64,
    /// Run item reconciliations for the same checklist one at a time
    pub serialize_item_reconciliation: bool,
    /// File the configuration was read from, if any
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8001,
            store: StoreBackend::default(),
            database_path: Self::default_data_dir().join("tafeito.db"),
            allowed_origins: vec![
                "http://localhost:4200".to_string(),
                "http://localhost:3000".to_string(),
                "https://localhost:4200".to_string(),
            ],
            token_expiry_minutes: 30,
            serialize_item_reconciliation: false,
            config_file: None,
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var("TAFEITO_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
            config.config_file = Some(path);
        }

        config.apply_env()?;
        config.validate()?;

        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `TAFEITO_*` overrides looked up through `var`.
    fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = var("TAFEITO_PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid("TAFEITO_PORT", port.clone()))?;
        }
        if let Some(store) = var("TAFEITO_STORE") {
            self.store = StoreBackend::parse(&store)
                .ok_or_else(|| ConfigError::Invalid("TAFEITO_STORE", store.clone()))?;
        }
        if let Some(db_path) = var("TAFEITO_DATABASE_PATH") {
            self.database_path = PathBuf::from(db_path);
        }
        if let Some(origins) = var("TAFEITO_ALLOWED_ORIGINS") {
            self.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(minutes) = var("TAFEITO_TOKEN_EXPIRY_MINUTES") {
            self.token_expiry_minutes = minutes
                .parse()
                .map_err(|_| ConfigError::Invalid("TAFEITO_TOKEN_EXPIRY_MINUTES", minutes.clone()))?;
        }
        if let Some(flag) = var("TAFEITO_SERIALIZE_RECONCILIATION") {
            self.serialize_item_reconciliation = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid(
                        "TAFEITO_SERIALIZE_RECONCILIATION",
                        flag.clone(),
                    ))
                }
            };
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.token_expiry_minutes == 0 || self.token_expiry_minutes > MAX_EXPIRY_MINUTES {
            return Err(ConfigError::Invalid(
                "token_expiry_minutes",
                self.token_expiry_minutes.to_string(),
            ));
        }
        Ok(())
    }

    /// Default config file path: ~/.config/tafeito/config.yaml
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tafeito")
            .join("config.yaml")
    }

    /// Default data directory: ~/.local/share/tafeito
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tafeito")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    Invalid(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    e
                )
            }
            ConfigError::Invalid(key, value) => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
            ConfigError::Invalid(..) => None,
        }
    }
}

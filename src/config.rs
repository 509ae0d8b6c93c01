use anyhow::{Context, Result};
use argon2::password_hash::PasswordHash;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_ENV: &str = "HABITRACK_CONFIG";

/// Environment variable overriding `security.jwt_secret`.
pub const JWT_SECRET_ENV: &str = "HABITRACK_JWT_SECRET";

/// Password of the `admin` user seeded when no config file exists.
pub const DEFAULT_SEED_PASSWORD: &str = "change-me-please";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,

    /// Users created in memory at startup.
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:8000".to_string(),
                "http://127.0.0.1:8000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    /// HS256 signing secret for access tokens.
    /// When empty a random secret is generated at startup, so tokens do not
    /// survive a restart.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub jwt_secret: String,

    pub token_expiry_minutes: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            jwt_secret: String::new(),
            token_expiry_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

/// A user created at startup, from either a plaintext password or an argon2
/// PHC string as printed by `habitrack hash-password`. Exactly one must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedUser {
    pub username: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

impl SeedUser {
    #[must_use]
    pub fn with_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            password_hash: None,
        }
    }

    #[must_use]
    pub fn with_hash(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: String::new(),
            password_hash: Some(password_hash.into()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
            users: vec![SeedUser::with_password("admin", DEFAULT_SEED_PASSWORD)],
        }
    }
}

impl Config {
    /// Loads the first config file found, falling back to defaults, and
    /// returns the path it came from. Environment overrides are applied
    /// afterwards.
    ///
    /// Does not log; callers report the returned path.
    pub fn load() -> Result<(Self, Option<PathBuf>)> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let source = Self::locate(explicit, &Self::config_paths());

        let mut config = match &source {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok((config, source))
    }

    /// An explicit path is returned even when it does not exist.
    fn locate(explicit: Option<PathBuf>, candidates: &[PathBuf]) -> Option<PathBuf> {
        explicit.or_else(|| candidates.iter().find(|path| path.exists()).cloned())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var(JWT_SECRET_ENV)
            && !secret.is_empty()
        {
            self.security.jwt_secret = secret;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("habitrack").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".habitrack").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        if self.security.token_expiry_minutes == 0 {
            anyhow::bail!("Token expiry must be > 0 minutes");
        }

        if !matches!(self.general.log_format.as_str(), "pretty" | "json") {
            anyhow::bail!(
                "Unknown log format '{}', expected \"pretty\" or \"json\"",
                self.general.log_format
            );
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            if user.username.trim().is_empty() {
                anyhow::bail!("Seed user with empty username");
            }
            match &user.password_hash {
                Some(_) if !user.password.is_empty() => {
                    anyhow::bail!(
                        "Seed user '{}' sets both password and password_hash",
                        user.username
                    );
                }
                Some(hash) => {
                    PasswordHash::new(hash).map_err(|e| {
                        anyhow::anyhow!(
                            "Invalid password_hash for seed user '{}': {e}",
                            user.username
                        )
                    })?;
                }
                None if user.password.len() < 8 => {
                    anyhow::bail!(
                        "Password for seed user '{}' must be at least 8 characters",
                        user.username
                    );
                }
                None => {}
            }
            if !seen.insert(user.username.as_str()) {
                anyhow::bail!("Duplicate seed user '{}'", user.username);
            }
        }

        Ok(())
    }

    /// True when a seed user still has the built-in default password.
    #[must_use]
    pub fn uses_default_password(&self) -> bool {
        self.users
            .iter()
            .any(|user| user.password_hash.is_none() && user.password == DEFAULT_SEED_PASSWORD)
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

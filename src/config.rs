//! Run configuration.
//!
//! Values are layered: command-line flags (and the environment variables clap
//! binds to them) win over the optional TOML file, which wins over built-in
//! defaults. The file is looked up in this order:
//!
//! 1. `--config <path>`
//! 2. `SHOP_DB_BOOTSTRAP_CONFIG`
//! 3. `./shop-db-bootstrap.toml`
//! 4. `<platform config dir>/shop-db-bootstrap/config.toml`
//!
//! ```toml
//! db_name = "shop"
//! db_user = "postgres"
//! db_password = "secret"
//! db_host = "localhost"
//! db_port = 5432
//! insert_data = true
//! seed_dir = "sql_input_files"
//! ```

use directories::ProjectDirs;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::cli::Cli;

pub const DEFAULT_USER: &str = "postgres";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_SEED_DIR: &str = "sql_input_files";
pub const DEFAULT_MAINTENANCE_DB: &str = "postgres";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Rows shown by the cart summary
pub const DEFAULT_SUMMARY_LIMIT: i64 = 20;

const CONFIG_PATH_ENV: &str = "SHOP_DB_BOOTSTRAP_CONFIG";
const LOCAL_CONFIG_FILE: &str = "shop-db-bootstrap.toml";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing required setting: {0} (pass --{0} or set it in the config file)")]
    MissingRequired(&'static str),

    #[error("Invalid value for '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings as they appear in the TOML file; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
    pub insert_data: Option<bool>,
    pub seed_dir: Option<PathBuf>,
    pub maintenance_db: Option<String>,
    pub create_database: Option<bool>,
    pub connect_timeout: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved settings for one run
#[derive(Clone)]
pub struct BootstrapConfig {
    pub db_name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub insert_data: bool,
    pub seed_dir: PathBuf,
    pub maintenance_db: String,
    pub create_database: bool,
    pub connect_timeout: Duration,
    pub summary_limit: i64,
}

impl BootstrapConfig {
    /// Config with defaults for everything but the required settings
    pub fn new(db_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            user: DEFAULT_USER.to_string(),
            password: password.into(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            insert_data: false,
            seed_dir: PathBuf::from(DEFAULT_SEED_DIR),
            maintenance_db: DEFAULT_MAINTENANCE_DB.to_string(),
            create_database: true,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            summary_limit: DEFAULT_SUMMARY_LIMIT,
        }
    }

    /// Resolve from parsed flags, loading the config file if one is found
    pub fn resolve(cli: &Cli) -> ConfigResult<Self> {
        let file = match resolve_config_path(cli.config.as_deref()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration file");
                FileConfig::load(&path)?
            }
            None => FileConfig::default(),
        };

        Self::merge(cli, file)
    }

    /// Layer flags over file values over defaults
    pub fn merge(cli: &Cli, file: FileConfig) -> ConfigResult<Self> {
        let db_name = cli
            .db_name
            .clone()
            .or(file.db_name)
            .ok_or(ConfigError::MissingRequired("db_name"))?;
        let password = cli
            .db_password
            .clone()
            .or(file.db_password)
            .ok_or(ConfigError::MissingRequired("db_password"))?;

        if db_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "db_name",
                message: "must not be empty".to_string(),
            });
        }

        let timeout_secs = cli
            .connect_timeout
            .or(file.connect_timeout)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "connect_timeout",
                message: "must be at least 1 second".to_string(),
            });
        }

        let mut config = Self::new(db_name, password);
        if let Some(user) = cli.db_user.clone().or(file.db_user) {
            config.user = user;
        }
        if let Some(host) = cli.db_host.clone().or(file.db_host) {
            config.host = host;
        }
        if let Some(port) = cli.db_port.or(file.db_port) {
            config.port = port;
        }
        if let Some(insert) = cli.insert_data.or(file.insert_data) {
            config.insert_data = insert;
        }
        if let Some(dir) = cli.seed_dir.clone().or(file.seed_dir) {
            config.seed_dir = dir;
        }
        if let Some(db) = cli.maintenance_db.clone().or(file.maintenance_db) {
            config.maintenance_db = db;
        }
        if cli.no_create_database {
            config.create_database = false;
        } else if let Some(create) = file.create_database {
            config.create_database = create;
        }
        config.connect_timeout = Duration::from_secs(timeout_secs);

        Ok(config)
    }

    /// `user@host:port/db_name`, for logs and error messages
    pub fn endpoint(&self) -> String {
        self.endpoint_for(&self.db_name)
    }

    pub fn endpoint_for(&self, db_name: &str) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, db_name)
    }

    /// Client configuration for the given database on this server
    pub fn pg_config(&self, db_name: &str) -> postgres::Config {
        let mut pg = postgres::Config::new();
        pg.host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password)
            .dbname(db_name)
            .application_name("shop-db-bootstrap")
            .connect_timeout(self.connect_timeout);
        pg
    }
}

impl fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("db_name", &self.db_name)
            .field("user", &self.user)
            .field("password", &"********")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("insert_data", &self.insert_data)
            .field("seed_dir", &self.seed_dir)
            .field("maintenance_db", &self.maintenance_db)
            .field("create_database", &self.create_database)
            .field("connect_timeout", &self.connect_timeout)
            .field("summary_limit", &self.summary_limit)
            .finish()
    }
}

/// Find the configuration file, if any
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    ProjectDirs::from("", "", "shop-db-bootstrap")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Built directly so PG* variables in the test environment cannot leak in
    fn cli(db_name: Option<&str>, password: Option<&str>) -> Cli {
        Cli {
            db_name: db_name.map(String::from),
            db_password: password.map(String::from),
            ..Cli::default()
        }
    }

    #[test]
    fn test_defaults_fill_unset_values() {
        let config = BootstrapConfig::merge(
            &cli(Some("shop"), Some("pw")),
            FileConfig::default(),
        )
        .unwrap();

        assert_eq!(config.db_name, "shop");
        assert_eq!(config.user, "postgres");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert!(!config.insert_data);
        assert!(config.create_database);
        assert_eq!(config.seed_dir, PathBuf::from("sql_input_files"));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig {
            db_name: Some("from_file".into()),
            db_password: Some("file_pw".into()),
            db_host: Some("db.internal".into()),
            db_port: Some(6543),
            insert_data: Some(true),
            ..Default::default()
        };
        let flags = Cli {
            db_port: Some(5433),
            ..cli(Some("shop"), None)
        };
        let config = BootstrapConfig::merge(&flags, file).unwrap();

        assert_eq!(config.db_name, "shop");
        assert_eq!(config.password, "file_pw");
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 5433);
        assert!(config.insert_data);
    }

    #[test]
    fn test_missing_password_is_reported() {
        let err =
            BootstrapConfig::merge(&cli(Some("shop"), None), FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired("db_password")));
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let flags = Cli {
            connect_timeout: Some(0),
            ..cli(Some("shop"), Some("pw"))
        };
        let err = BootstrapConfig::merge(&flags, FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "connect_timeout", .. }));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "db_name = \"shop\"\ndb_password = \"pw\"\ndb_port = 15432\ninsert_data = true"
        )
        .unwrap();

        let loaded = FileConfig::load(file.path()).unwrap();
        assert_eq!(loaded.db_name.as_deref(), Some("shop"));
        assert_eq!(loaded.db_port, Some(15432));
        assert_eq!(loaded.insert_data, Some(true));
    }

    #[test]
    fn test_unknown_file_key_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "db_nmae = \"typo\"").unwrap();

        assert!(matches!(
            FileConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = BootstrapConfig::new("shop", "hunter2");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("shop"));
    }
}

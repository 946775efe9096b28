//! Error taxonomy for a bootstrap run.
//!
//! Server errors are sorted by SQLSTATE and by the phase they occur in, so the
//! operator sees whether the connection, the DDL, or the seed data was at fault.

use postgres::error::SqlState;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Coarse failure category, also used to pick the process exit code.
/// Code 2 stays with clap for usage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Schema,
    DataIntegrity,
    SourceData,
    Config,
    Database,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Database => 1,
            ErrorKind::Connection => 7,
            ErrorKind::Schema => 3,
            ErrorKind::DataIntegrity => 4,
            ErrorKind::SourceData => 5,
            ErrorKind::Config => 6,
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Could not connect to {endpoint}")]
    Connection {
        endpoint: String,
        #[source]
        source: postgres::Error,
    },

    #[error("Schema error on {object}: {message}")]
    Schema { object: String, message: String },

    #[error("Tables already exist: {}", .0.join(", "))]
    TablesExist(Vec<String>),

    #[error("Data integrity violation in {table}: {message}")]
    DataIntegrity { table: String, message: String },

    #[error(transparent)]
    SourceData(#[from] SourceDataError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Streaming COPY data to the server failed
    #[error("Failed to stream rows into {table}")]
    Transfer {
        table: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error while {context}")]
    Database {
        context: String,
        #[source]
        source: postgres::Error,
    },
}

/// Problems with the seed files themselves
#[derive(Debug, Error)]
pub enum SourceDataError {
    #[error("Seed file not found: {path:?}")]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read seed file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?} line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{path:?} line {line}: column {column} is required but the value is NULL")]
    NullInRequired {
        path: PathBuf,
        line: usize,
        column: &'static str,
    },

    #[error("{path:?} line {line}: invalid value {value:?} for column {column}: {reason}")]
    InvalidValue {
        path: PathBuf,
        line: usize,
        column: &'static str,
        value: String,
        reason: String,
    },

    /// The server refused a value the local checks let through
    #[error("Server rejected seed data for {table}: {message}")]
    Rejected { table: String, message: String },
}

impl BootstrapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BootstrapError::Connection { .. } | BootstrapError::Transfer { .. } => {
                ErrorKind::Connection
            }
            BootstrapError::Schema { .. } | BootstrapError::TablesExist(_) => ErrorKind::Schema,
            BootstrapError::DataIntegrity { .. } => ErrorKind::DataIntegrity,
            BootstrapError::SourceData(_) => ErrorKind::SourceData,
            BootstrapError::Config(_) => ErrorKind::Config,
            BootstrapError::Database { .. } => ErrorKind::Database,
        }
    }

    pub fn connection(endpoint: impl Into<String>, source: postgres::Error) -> Self {
        BootstrapError::Connection {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn schema(object: impl Into<String>, message: impl Into<String>) -> Self {
        BootstrapError::Schema {
            object: object.into(),
            message: message.into(),
        }
    }

    pub fn database(context: impl Into<String>, source: postgres::Error) -> Self {
        BootstrapError::Database {
            context: context.into(),
            source,
        }
    }

    /// Classify an error raised while running DDL for `object`.
    /// Lost connections stay connection errors; anything the server says is a
    /// schema problem.
    pub fn from_ddl(object: &str, err: postgres::Error) -> Self {
        if err.is_closed() {
            return BootstrapError::database(format!("creating {}", object), err);
        }
        BootstrapError::schema(object, server_message(&err))
    }

    /// Classify an error raised while loading seed rows into `table`
    pub fn from_seed(table: &str, err: postgres::Error) -> Self {
        match err.code() {
            Some(code) if is_integrity_violation(code) => BootstrapError::DataIntegrity {
                table: table.to_string(),
                message: server_message(&err),
            },
            Some(code) if is_data_exception(code) => SourceDataError::Rejected {
                table: table.to_string(),
                message: server_message(&err),
            }
            .into(),
            _ => BootstrapError::database(format!("loading {}", table), err),
        }
    }
}

fn is_integrity_violation(code: &SqlState) -> bool {
    *code == SqlState::FOREIGN_KEY_VIOLATION
        || *code == SqlState::UNIQUE_VIOLATION
        || *code == SqlState::NOT_NULL_VIOLATION
        || *code == SqlState::CHECK_VIOLATION
}

/// SQLSTATE class 22: data exception
fn is_data_exception(code: &SqlState) -> bool {
    code.code().starts_with("22")
}

/// Server message plus detail when present, else the client-side description
fn server_message(err: &postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => match db.detail() {
            Some(detail) => format!("{} ({})", db.message(), detail),
            None => db.message().to_string(),
        },
        None => err.to_string(),
    }
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_and_nonzero() {
        let kinds = [
            ErrorKind::Connection,
            ErrorKind::Schema,
            ErrorKind::DataIntegrity,
            ErrorKind::SourceData,
            ErrorKind::Config,
            ErrorKind::Database,
        ];
        let mut codes: Vec<u8> = kinds.iter().map(|k| k.exit_code()).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_connection_exit_code_differs_from_usage_error() {
        assert_eq!(ErrorKind::Connection.exit_code(), 7);
        assert_ne!(ErrorKind::Connection.exit_code(), 2);
    }

    #[test]
    fn test_wrapped_cause_is_not_repeated_in_message() {
        let err = BootstrapError::Transfer {
            table: "orders".into(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"),
        };
        assert_eq!(err.to_string(), "Failed to stream rows into orders");
        let chain = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(chain.matches("pipe closed").count(), 1);
    }

    #[test]
    fn test_read_error_message_omits_cause() {
        let err = SourceDataError::Read {
            path: PathBuf::from("users.csv"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
        };
        assert!(!err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_tables_exist_is_schema_kind() {
        let err = BootstrapError::TablesExist(vec!["users".into(), "carts".into()]);
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.to_string(), "Tables already exist: users, carts");
    }

    #[test]
    fn test_source_data_kind() {
        let err: BootstrapError = SourceDataError::FieldCount {
            path: PathBuf::from("sql_input_files/users.csv"),
            line: 3,
            expected: 10,
            found: 9,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::SourceData);
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_data_exception_class() {
        assert!(is_data_exception(&SqlState::INVALID_TEXT_REPRESENTATION));
        assert!(is_data_exception(&SqlState::BAD_COPY_FILE_FORMAT));
        assert!(!is_data_exception(&SqlState::FOREIGN_KEY_VIOLATION));
        assert!(is_integrity_violation(&SqlState::UNIQUE_VIOLATION));
        assert!(!is_integrity_violation(&SqlState::DUPLICATE_TABLE));
    }
}

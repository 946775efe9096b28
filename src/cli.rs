use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "shop-db-bootstrap")]
#[command(version, about = "Create the shop schema on a PostgreSQL server and optionally seed it")]
pub struct Cli {
    /// Database name (created if it does not exist)
    #[arg(long = "db_name", env = "PGDATABASE")]
    pub db_name: Option<String>,

    /// Username to connect to the database [default: postgres]
    #[arg(long = "db_user", env = "PGUSER")]
    pub db_user: Option<String>,

    /// Password to connect to the database
    #[arg(long = "db_password", env = "PGPASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Server name or IP address [default: localhost]
    #[arg(long = "db_host", env = "PGHOST")]
    pub db_host: Option<String>,

    /// Server port [default: 5432]
    #[arg(long = "db_port", env = "PGPORT")]
    pub db_port: Option<u16>,

    /// Populate tables from the seed files (true/false, yes/no, 1/0)
    #[arg(
        long = "insert_data",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_bool_flag
    )]
    pub insert_data: Option<bool>,

    /// Directory holding one <table>.csv per table [default: sql_input_files]
    #[arg(long = "seed_dir")]
    pub seed_dir: Option<PathBuf>,

    /// Database used to create the target database [default: postgres]
    #[arg(long = "maintenance_db")]
    pub maintenance_db: Option<String>,

    /// Fail instead of creating a missing database
    #[arg(long = "no_create_database")]
    pub no_create_database: bool,

    /// Connection timeout in seconds [default: 10]
    #[arg(long = "connect_timeout")]
    pub connect_timeout: Option<u64>,

    /// Configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the DDL in creation order and exit
    #[arg(long = "print_ddl")]
    pub print_ddl: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Accept the usual spellings of a boolean
pub fn parse_bool_flag(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
        other => Err(format!(
            "invalid boolean '{}', expected true or false",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_flag() {
        assert_eq!(parse_bool_flag("True"), Ok(true));
        assert_eq!(parse_bool_flag("1"), Ok(true));
        assert_eq!(parse_bool_flag("yes"), Ok(true));
        assert_eq!(parse_bool_flag("FALSE"), Ok(false));
        assert_eq!(parse_bool_flag("off"), Ok(false));
        assert!(parse_bool_flag("maybe").is_err());
    }

    #[test]
    fn test_insert_data_forms() {
        let cli = Cli::try_parse_from(["shop-db-bootstrap", "--insert_data", "False"]).unwrap();
        assert_eq!(cli.insert_data, Some(false));

        let cli = Cli::try_parse_from(["shop-db-bootstrap", "--insert_data"]).unwrap();
        assert_eq!(cli.insert_data, Some(true));

        let cli = Cli::try_parse_from(["shop-db-bootstrap"]).unwrap();
        assert_eq!(cli.insert_data, None);

        assert!(Cli::try_parse_from(["shop-db-bootstrap", "--insert_data", "sometimes"]).is_err());
    }

    #[test]
    fn test_underscore_flag_names() {
        let cli = Cli::try_parse_from([
            "shop-db-bootstrap",
            "--db_name",
            "shop",
            "--db_user",
            "admin",
            "--db_host",
            "10.0.0.5",
            "--db_port",
            "6432",
            "--print_ddl",
        ])
        .unwrap();

        assert_eq!(cli.db_name.as_deref(), Some("shop"));
        assert_eq!(cli.db_user.as_deref(), Some("admin"));
        assert_eq!(cli.db_host.as_deref(), Some("10.0.0.5"));
        assert_eq!(cli.db_port, Some(6432));
        assert!(cli.print_ddl);
    }

    #[test]
    fn test_port_must_be_numeric() {
        assert!(Cli::try_parse_from(["shop-db-bootstrap", "--db_port", "abc"]).is_err());
    }
}

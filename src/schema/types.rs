use std::collections::HashSet;
use std::fmt;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    SmallInt,
    /// Arbitrary precision numeric
    Decimal,
    Real,
    /// Bounded character data, length in characters
    Varchar(u16),
    Text,
    /// TIMESTAMP WITHOUT TIME ZONE
    Timestamp,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::SmallInt => write!(f, "SMALLINT"),
            ColumnType::Decimal => write!(f, "DECIMAL"),
            ColumnType::Real => write!(f, "REAL"),
            ColumnType::Varchar(len) => write!(f, "VARCHAR({})", len),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Timestamp => write!(f, "TIMESTAMP WITHOUT TIME ZONE"),
        }
    }
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    /// Value generated by the server (`GENERATED ALWAYS AS IDENTITY`)
    pub identity: bool,
}

impl Column {
    /// Create an optional (nullable) column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
            identity: false,
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: false,
            identity: false,
        }
    }

    /// Create a required integer column filled from an identity sequence
    pub const fn identity(name: &'static str) -> Self {
        Self {
            name,
            col_type: ColumnType::Integer,
            nullable: false,
            identity: true,
        }
    }
}

/// Foreign key reference
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
}

impl ForeignKey {
    pub const fn new(
        column: &'static str,
        references_table: &'static str,
        references_column: &'static str,
    ) -> Self {
        Self {
            column,
            references_table,
            references_column,
        }
    }
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    /// Seed file name inside the seed directory
    pub seed_file: &'static str,
    pub columns: &'static [Column],
    /// Primary key column, `None` for junction tables
    pub primary_key: Option<&'static str>,
    pub foreign_keys: &'static [ForeignKey],
}

impl TableSchema {
    /// Get all tables this table depends on (FK parents)
    pub fn dependencies(&self) -> HashSet<&'static str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.references_table)
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Identity column, if the table has one
    pub fn identity_column(&self) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.identity)
    }
}

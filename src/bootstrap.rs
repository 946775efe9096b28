//! One bootstrap run: provision the database, create the schema, optionally
//! seed it, and report what ended up in the tables.

use crate::config::BootstrapConfig;
use crate::error::{BootstrapError, BootstrapResult};
use crate::parser::{read_seed_file, SeedTable};
use crate::report::{self, CartSummary, TableCount};
use crate::schema::{DependencyResolver, TableSchema};
use crate::ui::{Phase, Ui};
use crate::writer::{ensure_database, generate_create_table, PostgresWriter};

/// What a successful run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub database: String,
    pub created_database: bool,
    pub tables_created: Vec<&'static str>,
    pub rows_loaded: u64,
    pub table_counts: Vec<TableCount>,
    pub cart_summary: Vec<CartSummary>,
}

/// Tables of the model in creation order, after checking every reference
pub fn creation_order() -> BootstrapResult<Vec<&'static TableSchema>> {
    let resolver = DependencyResolver::new();
    resolver
        .validate_references()
        .and_then(|_| resolver.creation_order())
        .map_err(|message| BootstrapError::schema("schema definition", message))
}

/// The full DDL script in creation order
pub fn render_ddl() -> BootstrapResult<String> {
    Ok(creation_order()?
        .iter()
        .map(|schema| format!("{};\n", generate_create_table(schema)))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Create the schema on the configured server and, when asked, seed it.
///
/// Every failure aborts the run. The connection is owned by this call and is
/// released on return whether it succeeded or not.
pub fn run(config: &BootstrapConfig, ui: &mut impl Ui) -> BootstrapResult<RunSummary> {
    let tables = creation_order()?;
    let names: Vec<&'static str> = tables.iter().map(|t| t.name).collect();

    ui.set_phase(Phase::Connecting);
    let created_database = if config.create_database {
        ensure_database(config, ui)?
    } else {
        false
    };
    let mut writer = PostgresWriter::connect(config)?;
    ui.log(format!("Connected to {}", config.endpoint()));

    ui.set_phase(Phase::CheckingTables);
    let existing = writer.existing_tables(&names)?;
    if !existing.is_empty() {
        return Err(BootstrapError::TablesExist(existing));
    }

    ui.set_phase(Phase::CreatingTables);
    writer.create_tables(&tables, ui)?;

    let mut rows_loaded = 0;
    if config.insert_data {
        ui.set_phase(Phase::ReadingSeedData);
        let seeds = tables
            .iter()
            .map(|&schema| read_seed_file(schema, &config.seed_dir))
            .collect::<Result<Vec<SeedTable>, _>>()?;

        ui.set_phase(Phase::Seeding);
        rows_loaded = writer.seed_tables(&seeds, ui)?;
    }

    ui.set_phase(Phase::Reporting);
    let table_counts = report::table_counts(writer.client_mut(), &tables)?;
    let cart_summary = report::cart_summary(writer.client_mut(), config.summary_limit)?;

    writer.finalize()?;
    ui.set_phase(Phase::Complete);

    Ok(RunSummary {
        database: config.db_name.clone(),
        created_database,
        tables_created: names,
        rows_loaded,
        table_counts,
        cart_summary,
    })
}

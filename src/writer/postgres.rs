use postgres::{Client, NoTls, Transaction};
use std::io::Write;

use super::schema_gen::{
    generate_copy_statement, generate_create_table, generate_identity_resync, quote_ident,
};
use crate::config::BootstrapConfig;
use crate::error::{BootstrapError, BootstrapResult};
use crate::parser::SeedTable;
use crate::schema::TableSchema;
use crate::ui::Ui;

/// Make sure the target database exists, creating it through the
/// maintenance database when it does not. Returns whether it was created.
pub fn ensure_database(config: &BootstrapConfig, ui: &mut impl Ui) -> BootstrapResult<bool> {
    let endpoint = config.endpoint_for(&config.maintenance_db);
    tracing::debug!(%endpoint, "connecting to maintenance database");

    let mut client = config
        .pg_config(&config.maintenance_db)
        .connect(NoTls)
        .map_err(|e| BootstrapError::connection(endpoint, e))?;

    let exists = client
        .query_opt(
            "SELECT 1 FROM pg_database WHERE datname = $1",
            &[&config.db_name],
        )
        .map_err(|e| BootstrapError::database("checking for the database", e))?
        .is_some();

    if exists {
        ui.log(format!("Database {} already exists", config.db_name));
    } else {
        ui.log(format!("Creating database {}", config.db_name));
        // CREATE DATABASE cannot run inside a transaction block
        client
            .batch_execute(&format!("CREATE DATABASE {}", quote_ident(&config.db_name)))
            .map_err(|e| BootstrapError::from_ddl(&format!("database {}", config.db_name), e))?;
        tracing::info!(database = %config.db_name, "database created");
    }

    client
        .close()
        .map_err(|e| BootstrapError::database("closing the maintenance connection", e))?;

    Ok(!exists)
}

/// The single working connection to the target database
pub struct PostgresWriter {
    client: Client,
}

impl PostgresWriter {
    pub fn connect(config: &BootstrapConfig) -> BootstrapResult<Self> {
        let endpoint = config.endpoint();
        tracing::debug!(%endpoint, "connecting");

        let client = config
            .pg_config(&config.db_name)
            .connect(NoTls)
            .map_err(|e| BootstrapError::connection(endpoint, e))?;

        Ok(Self { client })
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Which of the given tables already exist in the schema new tables land in
    pub fn existing_tables(&mut self, names: &[&str]) -> BootstrapResult<Vec<String>> {
        let rows = self
            .client
            .query(
                "SELECT table_name::text FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name::text = ANY($1::text[]) \
                 ORDER BY table_name",
                &[&names],
            )
            .map_err(|e| BootstrapError::database("checking for existing tables", e))?;

        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }

    /// Create all tables in one transaction; a failure leaves none behind
    pub fn create_tables(
        &mut self,
        schemas: &[&TableSchema],
        ui: &mut impl Ui,
    ) -> BootstrapResult<()> {
        ui.log(format!("Creating {} tables...", schemas.len()));
        let total = schemas.len() as u64;

        let mut tx = self
            .client
            .transaction()
            .map_err(|e| BootstrapError::database("starting the schema transaction", e))?;

        for (idx, schema) in schemas.iter().enumerate() {
            ui.set_progress(idx as u64, total, schema.name);

            let sql = generate_create_table(schema);
            tracing::debug!(table = schema.name, %sql, "executing DDL");
            tx.batch_execute(&sql)
                .map_err(|e| BootstrapError::from_ddl(schema.name, e))?;

            ui.log(format!("Created table {}", schema.name));
        }

        tx.commit()
            .map_err(|e| BootstrapError::from_ddl("schema", e))?;
        ui.set_progress(total, total, "schema committed");

        Ok(())
    }

    /// Load every seed table in order, all in one transaction
    pub fn seed_tables(&mut self, seeds: &[SeedTable], ui: &mut impl Ui) -> BootstrapResult<u64> {
        let total = seeds.len() as u64;
        let mut count: u64 = 0;

        let mut tx = self
            .client
            .transaction()
            .map_err(|e| BootstrapError::database("starting the seed transaction", e))?;

        for (idx, seed) in seeds.iter().enumerate() {
            ui.set_progress(idx as u64, total, seed.table.name);

            let loaded = copy_table(&mut tx, seed)?;
            count += loaded;

            ui.log(format!("{}: {} records", seed.table.name, loaded));
        }

        for seed in seeds {
            if let Some(sql) = generate_identity_resync(seed.table) {
                tx.batch_execute(&sql)
                    .map_err(|e| BootstrapError::from_seed(seed.table.name, e))?;
            }
        }

        tx.commit()
            .map_err(|e| BootstrapError::from_seed("seed data", e))?;
        ui.set_progress(total, total, "seed data committed");

        Ok(count)
    }

    /// Close the connection, reporting any error from the server
    pub fn finalize(self) -> BootstrapResult<()> {
        self.client
            .close()
            .map_err(|e| BootstrapError::database("closing the connection", e))
    }
}

/// Stream one table's rows with COPY
fn copy_table(tx: &mut Transaction<'_>, seed: &SeedTable) -> BootstrapResult<u64> {
    let name = seed.table.name;
    let sql = generate_copy_statement(seed.table);
    tracing::debug!(table = name, rows = seed.rows.len(), path = %seed.path.display(), "copying");

    let mut writer = tx
        .copy_in(sql.as_str())
        .map_err(|e| BootstrapError::from_seed(name, e))?;

    writer
        .write_all(&seed.copy_payload())
        .map_err(|source| BootstrapError::Transfer {
            table: name.to_string(),
            source,
        })?;

    writer
        .finish()
        .map_err(|e| BootstrapError::from_seed(name, e))
}

use anyhow::{Context, Result};
use shop_db_bootstrap::{
    bootstrap::{render_ddl, run},
    cli::Cli,
    config::BootstrapConfig,
    error::BootstrapError,
    report::{render_cart_summary, render_table_counts},
    ui::LogUi,
};
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Respect RUST_LOG if set, otherwise pick the level from --verbose
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "shop_db_bootstrap=debug".to_string()
        } else {
            "shop_db_bootstrap=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match try_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            let code = err
                .downcast_ref::<BootstrapError>()
                .map(|e| e.kind().exit_code())
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn try_main(cli: Cli) -> Result<()> {
    if cli.print_ddl {
        print!("{}", render_ddl()?);
        return Ok(());
    }

    let config = BootstrapConfig::resolve(&cli)
        .map_err(BootstrapError::from)
        .context("Invalid configuration")?;
    tracing::debug!(?config, "resolved configuration");

    let start = Instant::now();
    let mut ui = LogUi::new();
    let summary = run(&config, &mut ui)
        .with_context(|| format!("Bootstrap of {} failed", config.endpoint()))?;

    println!("\nTables in {}:", summary.database);
    println!("{}", render_table_counts(&summary.table_counts));

    if !summary.cart_summary.is_empty() {
        println!();
        println!("{}", render_cart_summary(&summary.cart_summary));
    }

    let elapsed = start.elapsed();
    println!(
        "\nCreated {} tables{} ({} records) in {:.1}s",
        summary.tables_created.len(),
        if summary.created_database {
            format!(" in new database {}", summary.database)
        } else {
            String::new()
        },
        summary.rows_loaded,
        elapsed.as_secs_f64()
    );

    Ok(())
}

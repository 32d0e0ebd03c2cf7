use anyhow::Result;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use sqlite_salvage::{backup, check, cli, recover};

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = match cli::Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    run(args)
}

fn run(args: cli::Args) -> Result<()> {
    match args.command {
        cli::Command::Backup { db, schema_out } => {
            backup::export_schema(&db, &schema_out)?;
            println!("Schema backup written to {}", schema_out.display());
        }
        cli::Command::Recover(config) => {
            let report = recover::run(&config)?;
            println!(
                "Recovered {} rows from {} pages into {}",
                report.rows_recovered,
                report.pages_scanned,
                config.output_db.display()
            );
        }
        cli::Command::Check { db } => {
            check::check_integrity(&db)?;
            println!("Integrity check passed.");
        }
    }
    Ok(())
}

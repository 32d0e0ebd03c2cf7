use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};

use crate::recover::{RecoverConfig, DEFAULT_PAGE_SIZE};

/// Available subcommands.
#[derive(Debug)]
pub enum Command {
    /// Snapshot the schema of a healthy database to a JSON file
    Backup { db: PathBuf, schema_out: PathBuf },
    /// Scan a corrupted database and rebuild what is salvageable
    Recover(RecoverConfig),
    /// Run the embedded library's integrity check
    Check { db: PathBuf },
}

/// Parsed command line.
#[derive(Debug)]
pub struct Args {
    pub command: Command,
}

impl Args {
    pub fn parse() -> Result<Self> {
        Self::from_args(env::args().skip(1).collect())
    }

    fn from_args(args: Vec<String>) -> Result<Self> {
        let Some(subcommand) = args.first() else {
            bail!("missing subcommand\n{}", usage());
        };

        let command = match subcommand.as_str() {
            "backup" => match &args[1..] {
                [db, schema_out] => Command::Backup {
                    db: PathBuf::from(db),
                    schema_out: PathBuf::from(schema_out),
                },
                _ => bail!("usage: sqlite-salvage backup <db> <schema.json>"),
            },
            "recover" => match &args[1..] {
                [corrupt_db, schema, output_db, rest @ ..] if rest.len() <= 1 => {
                    let page_size = match rest.first() {
                        Some(s) => s
                            .parse()
                            .map_err(|_| anyhow!("invalid page size: {}", s))?,
                        None => DEFAULT_PAGE_SIZE,
                    };
                    Command::Recover(RecoverConfig {
                        corrupt_db: PathBuf::from(corrupt_db),
                        schema_backup: PathBuf::from(schema),
                        output_db: PathBuf::from(output_db),
                        page_size,
                    })
                }
                _ => bail!(
                    "usage: sqlite-salvage recover <corrupt_db> <schema.json> <output_db> [page_size]"
                ),
            },
            "check" => match &args[1..] {
                [db] => Command::Check {
                    db: PathBuf::from(db),
                },
                _ => bail!("usage: sqlite-salvage check <db>"),
            },
            other => bail!("unknown subcommand: {}\n{}", other, usage()),
        };

        Ok(Args { command })
    }
}

fn usage() -> &'static str {
    "Usage:\n  \
     sqlite-salvage backup <db> <schema.json>\n  \
     sqlite-salvage recover <corrupt_db> <schema.json> <output_db> [page_size]\n  \
     sqlite-salvage check <db>"
}

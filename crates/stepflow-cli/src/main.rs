//! `stepflow`: corre, invalida y exporta tools de un workflow declarado en
//! JSON. El estado se guarda en un directorio de documentos JSON o en
//! Postgres (`--database-url`).
//!
//! Códigos de salida: 0 ok, 2 uso, 4 rechazado / no encontrado, 5 backend.

mod commands;
mod error;

use std::io::Write;
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use log::debug;
use stepflow::{default_registry, WorkflowFile, CONFIG};
use stepflow_core::{DocumentStore, JsonFileDocumentStore};
use stepflow_persistence::{DbConfig, PgDocumentStore};

use commands::{open_session, Command};
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "stepflow", version, about = "Incremental tool chains over cached extractions")]
struct Cli {
    /// Archivo JSON con extractores, chains y tools.
    #[arg(long, env = "STEPFLOW_WORKFLOW")]
    workflow: PathBuf,
    /// Directorio del store de documentos JSON.
    #[arg(long, conflicts_with = "database_url")]
    store_dir: Option<PathBuf>,
    /// Usa Postgres en lugar del store de archivos.
    #[arg(long)]
    database_url: Option<String>,
    /// Chain sobre la que opera el comando (opcional si hay una sola).
    #[arg(long, global = true)]
    chain: Option<String>,
    #[command(subcommand)]
    command: Command,
}

fn open_store(cli: &Cli) -> Result<Box<dyn DocumentStore>, CliError> {
    if let Some(url) = &cli.database_url {
        let mut cfg = DbConfig::new(url.clone());
        if let Some(db) = &CONFIG.database {
            cfg.min_connections = db.min_connections;
            cfg.max_connections = db.max_connections;
        }
        let store = PgDocumentStore::connect(&cfg).map_err(|e| CliError::Backend(e.to_string()))?;
        debug!("using postgres store");
        return Ok(Box::new(store));
    }
    let dir = cli.store_dir.clone().unwrap_or_else(|| CONFIG.store_dir.clone());
    debug!("using file store at {}", dir.display());
    let store = JsonFileDocumentStore::new(dir).map_err(|e| CliError::Backend(e.to_string()))?;
    Ok(Box::new(store))
}

fn run(cli: &Cli) -> Result<Vec<u8>, CliError> {
    let workflow = WorkflowFile::load(&cli.workflow)?.with_http_timeout(CONFIG.http_timeout_secs);
    let registry = default_registry().map_err(|e| CliError::Backend(e.to_string()))?;
    let store = open_store(cli)?;
    let mut session = open_session(store, &registry, &workflow, cli.chain.as_deref())?;
    let outcome = session.execute(&cli.command);
    for w in &session.warnings {
        eprintln!("[stepflow] warning: {w}");
    }
    outcome
}

fn main() {
    let _ = dotenvy::dotenv();
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(out) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(&out).and_then(|_| stdout.flush()) {
                eprintln!("[stepflow] io error: {e}");
                exit(5);
            }
        }
        Err(e) => {
            eprintln!("[stepflow] {e}");
            exit(e.exit_code());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_flags() {
        let cli = Cli::try_parse_from(["stepflow", "--workflow", "wf.json", "run", "--tool", "t", "--force"]).unwrap();
        assert_eq!(cli.command,
                   Command::Run { tool: "t".into(),
                                  force: true,
                                  recursive: false });
        assert_eq!(cli.workflow, PathBuf::from("wf.json"));
    }

    #[test]
    fn store_dir_and_database_url_conflict() {
        let err = Cli::try_parse_from(["stepflow",
                                       "--workflow",
                                       "wf.json",
                                       "--store-dir",
                                       "s",
                                       "--database-url",
                                       "postgres://x",
                                       "stats"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn export_defaults_to_the_data_artifact() {
        let cli = Cli::try_parse_from(["stepflow", "--workflow", "wf.json", "export", "--tool", "t", "--chain", "c"]).unwrap();
        assert_eq!(cli.chain.as_deref(), Some("c"));
        assert!(matches!(cli.command, Command::Export { ref artifact, format: None, .. } if artifact == "data"));
    }
}

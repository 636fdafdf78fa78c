//! Subcomandos y su ejecución contra un engine ya abierto.

use std::fmt::Write as _;

use clap::Subcommand;
use log::info;
use stepflow::WorkflowFile;
use stepflow_core::{ArtifactMap, ChainId, ClearOptions, DocumentStore, ExtractOptions, Registry, RenderOptions,
                    Renderable, RunOptions, ToolId, Warning, WorkflowEngine};

use crate::error::CliError;

pub const DEFAULT_ARTIFACT: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Corre un tool (y lo que necesite aguas arriba).
    Run {
        #[arg(long)]
        tool: String,
        /// Descarta el resultado cacheado antes de correr.
        #[arg(long)]
        force: bool,
        /// Recomputa también todo lo que depende del tool.
        #[arg(long)]
        recursive: bool,
    },
    /// Obtiene los datos del extractor de la chain.
    Extract {
        /// Re-extrae aunque haya cache.
        #[arg(long)]
        force: bool,
        /// Con `--force`, recomputa todos los tools en vez de invalidarlos.
        #[arg(long)]
        recursive: bool,
    },
    /// Invalida el resultado de un tool.
    Clear {
        #[arg(long)]
        tool: String,
        #[arg(long)]
        downstream: bool,
    },
    /// Profundidad y ancho de la chain.
    Stats,
    /// Árbol de tools en JSON.
    Hierarchy,
    /// Formatos disponibles de un artifact.
    Formats {
        #[arg(long)]
        tool: String,
        #[arg(long, default_value = DEFAULT_ARTIFACT)]
        artifact: String,
    },
    /// Renderiza un artifact (por defecto CSV si el artifact lo admite).
    Export {
        #[arg(long)]
        tool: String,
        #[arg(long, default_value = DEFAULT_ARTIFACT)]
        artifact: String,
        #[arg(long)]
        format: Option<String>,
    },
}

pub struct Session<S>
    where S: DocumentStore
{
    pub engine: WorkflowEngine<S>,
    pub chain: ChainId,
    pub warnings: Vec<Warning>,
}

/// Abre el store, restaura lo persistido y agrega lo que el archivo declare
/// y falte.
pub fn open_session<S>(store: S,
                       registry: &Registry,
                       workflow: &WorkflowFile,
                       chain: Option<&str>)
                       -> Result<Session<S>, CliError>
    where S: DocumentStore
{
    let mut engine = WorkflowEngine::open(store, registry)?;
    let mut warnings = Vec::new();
    workflow.apply(&mut engine, registry, &mut warnings)?;
    let chain_name = match chain.or_else(|| workflow.sole_chain()) {
        Some(name) => name,
        None => return Err(CliError::Usage("the workflow defines several chains; pass --chain <name>".into())),
    };
    let chain = engine.catalog()
                      .find_chain(chain_name)
                      .ok_or_else(|| CliError::NotFound(format!("toolchain `{chain_name}`")))?;
    Ok(Session { engine,
                 chain,
                 warnings })
}

fn describe_result(result: &ArtifactMap) -> String {
    let mut out = String::new();
    for (name, artifact) in result {
        let _ = writeln!(out, "{name}\t{:?}\t{}", artifact.kind, artifact.default_format());
    }
    out
}

impl<S> Session<S> where S: DocumentStore
{
    fn tool(&self, name: &str) -> Result<ToolId, CliError> {
        self.engine
            .catalog()
            .find_tool(self.chain, name)
            .ok_or_else(|| CliError::NotFound(format!("tool `{name}`")))
    }

    fn artifacts(&mut self, tool: &str) -> Result<ArtifactMap, CliError> {
        let id = self.tool(tool)?;
        let report = self.engine.run(id, RunOptions::default().save_results(true))?;
        self.warnings.extend(report.warnings);
        Ok(report.value)
    }

    /// Ejecuta el comando y devuelve lo que va a stdout. Todo lo que corre se
    /// persiste.
    pub fn execute(&mut self, command: &Command) -> Result<Vec<u8>, CliError> {
        match command {
            Command::Run { tool, force, recursive } => {
                let id = self.tool(tool)?;
                let opts = RunOptions { ignore_results: *force,
                                        save_results: true,
                                        run_subsequent: *recursive };
                let report = self.engine.run(id, opts)?;
                self.warnings.extend(report.warnings);
                let mut out = describe_result(&report.value);
                if let Some(fp) = self.engine.catalog().tool(id)?.fingerprint() {
                    let _ = writeln!(out, "fingerprint\t{fp}");
                }
                Ok(out.into_bytes())
            }
            Command::Extract { force, recursive } => {
                let extractor = self.engine.catalog().chain(self.chain)?.extractor;
                let opts = ExtractOptions { ignore_cache: *force,
                                            save_results: true,
                                            run_subsequent: *recursive };
                let report = self.engine.get_data(extractor, opts)?;
                self.warnings.extend(report.warnings);
                let table = report.value;
                Ok(format!("rows\t{}\ncolumns\t{}\n", table.rows.len(), table.columns.join(",")).into_bytes())
            }
            Command::Clear { tool, downstream } => {
                let id = self.tool(tool)?;
                let report = self.engine.clear_results(id,
                                                       ClearOptions { clear_next_steps: *downstream,
                                                                      save: true })?;
                self.warnings.extend(report.warnings);
                info!("cleared `{tool}` (downstream: {downstream})");
                Ok(format!("cleared\t{tool}\n").into_bytes())
            }
            Command::Stats => {
                let stats = self.engine.get_stats(self.chain)?;
                let tools = self.engine.get_all_tools(self.chain).len();
                let body = serde_json::json!({ "depth": stats.depth, "width": stats.width, "tools": tools });
                Ok(format!("{body}\n").into_bytes())
            }
            Command::Hierarchy => {
                let tree = self.engine.get_tool_hierarchy(self.chain)?;
                let mut body = serde_json::to_vec_pretty(&tree).map_err(|e| CliError::Backend(e.to_string()))?;
                body.push(b'\n');
                Ok(body)
            }
            Command::Formats { tool, artifact } => {
                let result = self.artifacts(tool)?;
                let found = result.get(artifact)
                                  .ok_or_else(|| CliError::NotFound(format!("artifact `{artifact}` of `{tool}`")))?;
                let mut out = String::new();
                for f in found.available_formats() {
                    let marker = if f.key == found.default_format() { "*" } else { "" };
                    let _ = writeln!(out, "{}{marker}\t.{}\t{}", f.key, f.extension, f.description);
                }
                Ok(out.into_bytes())
            }
            Command::Export { tool, artifact, format } => {
                let result = self.artifacts(tool)?;
                let found = result.get(artifact)
                                  .ok_or_else(|| CliError::NotFound(format!("artifact `{artifact}` of `{tool}`")))?;
                let format = match format {
                    Some(f) => f.as_str(),
                    None if found.supports("csv") => "csv",
                    None => found.default_format(),
                };
                Ok(found.render(format, &RenderOptions::default())?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stepflow::default_registry;
    use stepflow_core::{InMemoryDocumentStore, ToolStatus};

    fn workflow() -> WorkflowFile {
        serde_json::from_value(json!({
            "extractors": [{ "name": "e", "kind": "inline",
                             "config": { "columns": ["a"], "rows": [[1], [5]] } }],
            "chains": [{
                "name": "c", "extractor": "e",
                "tools": [
                    { "name": "small", "kind": "filter", "config": { "query": "a < 3" } },
                    { "name": "plus", "kind": "simple_eval", "previous_step": "small",
                      "config": { "eval": "b = a + 1" } }
                ]
            }]
        })).unwrap()
    }

    fn session() -> Session<InMemoryDocumentStore> {
        open_session(InMemoryDocumentStore::new(), &default_registry().unwrap(), &workflow(), None).unwrap()
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn export_defaults_to_csv() {
        let mut s = session();
        let out = text(s.execute(&Command::Export { tool: "plus".into(),
                                                    artifact: DEFAULT_ARTIFACT.into(),
                                                    format: None })
                        .unwrap());
        assert_eq!(out, "a,b\n1,2\n");
    }

    #[test]
    fn clear_downstream_invalidates_the_subtree() {
        let mut s = session();
        s.execute(&Command::Run { tool: "plus".into(),
                                  force: false,
                                  recursive: false })
         .unwrap();
        s.execute(&Command::Clear { tool: "small".into(),
                                    downstream: true })
         .unwrap();
        let plus = s.tool("plus").unwrap();
        assert_eq!(s.engine.catalog().tool(plus).unwrap().status(), ToolStatus::Invalidated);
    }

    #[test]
    fn unknown_tool_and_artifact_are_not_found() {
        let mut s = session();
        let err = s.execute(&Command::Clear { tool: "ghost".into(),
                                              downstream: false })
                   .unwrap_err();
        assert_eq!(err.exit_code(), 4);
        let err = s.execute(&Command::Formats { tool: "plus".into(),
                                                artifact: "plot".into() })
                   .unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
    }

    #[test]
    fn stats_and_extract_report_the_chain() {
        let mut s = session();
        assert_eq!(text(s.execute(&Command::Stats).unwrap()), "{\"depth\":3,\"tools\":2,\"width\":1}\n");
        assert_eq!(text(s.execute(&Command::Extract { force: false,
                                                      recursive: false })
                         .unwrap()),
                   "rows\t2\ncolumns\ta\n");
    }

    #[test]
    fn several_chains_need_an_explicit_name() {
        let mut wf = workflow();
        let mut other = wf.chains[0].clone();
        other.name = "d".into();
        wf.chains.push(other);
        let registry = default_registry().unwrap();
        let err = open_session(InMemoryDocumentStore::new(), &registry, &wf, None).err().unwrap();
        assert_eq!(err.exit_code(), 2);
        assert!(open_session(InMemoryDocumentStore::new(), &registry, &wf, Some("d")).is_ok());
    }
}

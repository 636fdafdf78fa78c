//! Definición declarativa de un workflow (archivo JSON).
//!
//! ```json
//! {
//!   "extractors": [{ "name": "materials", "kind": "csv_file", "config": { "path": "m.csv" } }],
//!   "chains": [{
//!     "name": "screen", "extractor": "materials",
//!     "tools": [
//!       { "name": "semis", "kind": "filter", "config": { "query": "gap < 2" } },
//!       { "name": "doubled", "kind": "simple_eval", "previous_step": "semis",
//!         "config": { "eval": "g2 = gap * 2" } }
//!     ]
//!   }]
//! }
//! ```
//!
//! `apply` es idempotente: las entidades que ya existen en el engine (por
//! nombre) se conservan con su cache; sólo se agregan las que faltan.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stepflow_adapters::extractors::HttpJsonExtractor;
use stepflow_core::{DocumentStore, EngineError, Registry, RegistryError, Warning, WorkflowEngine};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("cannot read workflow file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid workflow file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{what} `{name}` is not defined")]
    UnknownReference { what: &'static str, name: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: String,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    #[serde(flatten)]
    pub component: ComponentDef,
    #[serde(default)]
    pub previous_step: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub extractor: String,
    #[serde(default)]
    pub tools: Vec<ToolDef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowFile {
    #[serde(default)]
    pub extractors: Vec<ComponentDef>,
    #[serde(default)]
    pub chains: Vec<ChainDef>,
}

/// Resultado de `apply`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplySummary {
    pub added: Vec<String>,
    pub kept: Vec<String>,
    /// Entidades existentes cuya configuración difiere del archivo; se
    /// conserva la almacenada.
    pub drifted: Vec<String>,
}

impl WorkflowFile {
    pub fn parse(text: &str) -> Result<Self, WorkflowError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| WorkflowError::Io { path: path.to_path_buf(),
                                                                                 source })?;
        Self::parse(&text)
    }

    /// Completa `timeout_secs` en los extractores HTTP que no lo declaran.
    pub fn with_http_timeout(mut self, secs: u64) -> Self {
        for ext in self.extractors.iter_mut().filter(|e| e.kind == HttpJsonExtractor::KIND) {
            if let Value::Object(map) = &mut ext.config {
                map.entry("timeout_secs").or_insert_with(|| Value::from(secs));
            }
        }
        self
    }

    /// Nombre de la única chain, si el archivo define exactamente una.
    pub fn sole_chain(&self) -> Option<&str> {
        match self.chains.as_slice() {
            [only] => Some(&only.name),
            _ => None,
        }
    }

    /// Agrega al engine lo que falte. Las advertencias de persistencia de
    /// cada alta se acumulan en `warnings`.
    pub fn apply<S>(&self,
                    engine: &mut WorkflowEngine<S>,
                    registry: &Registry,
                    warnings: &mut Vec<Warning>)
                    -> Result<ApplySummary, WorkflowError>
        where S: DocumentStore
    {
        let mut summary = ApplySummary::default();
        for def in &self.extractors {
            let source = registry.build_extractor(&def.kind, &def.config)?;
            match engine.catalog().find_extractor(&def.name) {
                Some(id) => {
                    let stored = engine.catalog().extractor(id)?.source();
                    let same = stored.kind() == source.kind() && stored.config() == source.config();
                    summary.note_existing(&def.name, same);
                }
                None => {
                    let report = engine.add_extractor(&def.name, &def.description, source)?;
                    warnings.extend(report.warnings);
                    summary.added.push(def.name.clone());
                }
            }
        }

        for chain_def in &self.chains {
            let extractor = engine.catalog()
                                  .find_extractor(&chain_def.extractor)
                                  .ok_or_else(|| WorkflowError::UnknownReference { what: "extractor",
                                                                                   name: chain_def.extractor.clone() })?;
            let chain = match engine.catalog().find_chain(&chain_def.name) {
                Some(id) => {
                    let same = engine.catalog().chain(id)?.extractor == extractor;
                    summary.note_existing(&chain_def.name, same);
                    id
                }
                None => {
                    let report = engine.add_chain(&chain_def.name, &chain_def.description, extractor)?;
                    warnings.extend(report.warnings);
                    summary.added.push(chain_def.name.clone());
                    report.value
                }
            };

            for def in &chain_def.tools {
                let label = format!("{}/{}", chain_def.name, def.component.name);
                let previous = match &def.previous_step {
                    Some(name) => Some(engine.catalog()
                                             .find_tool(chain, name)
                                             .ok_or_else(|| WorkflowError::UnknownReference { what: "tool",
                                                                                              name: name.clone() })?),
                    None => None,
                };
                let transform = registry.build_transform(&def.component.kind, &def.component.config)?;
                match engine.catalog().find_tool(chain, &def.component.name) {
                    Some(id) => {
                        let node = engine.catalog().tool(id)?;
                        let same = node.previous_step == previous
                                   && node.transform().kind() == transform.kind()
                                   && node.transform().config() == transform.config();
                        summary.note_existing(&label, same);
                    }
                    None => {
                        let report = engine.add_tool(chain,
                                                     &def.component.name,
                                                     &def.component.description,
                                                     previous,
                                                     transform)?;
                        warnings.extend(report.warnings);
                        summary.added.push(label);
                    }
                }
            }
        }
        info!("workflow applied: {} added, {} kept, {} drifted",
              summary.added.len(),
              summary.kept.len(),
              summary.drifted.len());
        Ok(summary)
    }
}

impl ApplySummary {
    fn note_existing(&mut self, name: &str, same: bool) {
        if same {
            self.kept.push(name.to_string());
        } else {
            warn!("`{name}` differs from the workflow file; keeping the stored definition");
            self.drifted.push(name.to_string());
        }
    }
}

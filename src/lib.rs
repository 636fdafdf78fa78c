//! StepFlow
//!
//! Librería de aplicación sobre el motor `stepflow-core`:
//! - `config`: variables de entorno (.env) en un `CONFIG` inmutable.
//! - `workflow`: definición de extractores, chains y tools desde JSON.
//! - `default_registry`: fábricas built-in de `stepflow-adapters`.
//!
//! Puede usarse desde `main.rs`, desde `stepflow-cli` o por otros clientes.

pub mod config;
pub mod workflow;

pub use config::{AppConfig, DatabaseConfig, CONFIG};
pub use workflow::{ApplySummary, ChainDef, ComponentDef, ToolDef, WorkflowError, WorkflowFile};

use stepflow_core::{Registry, RegistryError};

/// Registro con todos los kinds built-in.
pub fn default_registry() -> Result<Registry, RegistryError> {
    stepflow_adapters::builtin_registry()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_knows_the_builtins() {
        let r = default_registry().unwrap();
        assert!(r.extractor_kinds().any(|k| k == "csv_file"));
        assert!(r.transform_kinds().any(|k| k == "decision"));
    }
}

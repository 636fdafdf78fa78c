//! Errores específicos del core.
//!
//! Taxonomía:
//! - Validación local (`MissingDataInput`, `CycleRejected`, `InvalidLink`,
//!   nombres inválidos/duplicados): se rechazan antes de mutar estado.
//! - Cómputo (`ExtractionFailed`, `TransformFailed`): se propagan sin
//!   modificar al llamador de `run` / `get_data`.
//! - Persistencia: nunca aparece aquí como resultado de un cómputo; se reporta
//!   como `Warning::PersistenceFailed` (ver `engine::report`).

use thiserror::Error;

use crate::model::{ArtifactError, ChainId, ExtractorId, TableError, ToolId};
use crate::registry::RegistryError;
use crate::render::RenderError;
use crate::store::StoreError;

/// Error propio de una rutina de extracción (específico de la fuente).
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("resource unreachable: {0}")]
    Unreachable(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("schema mismatch: {0}")]
    Schema(String),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Error propio de una rutina de transformación.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("missing column `{0}`")]
    MissingColumn(String),
    #[error("column `{0}` already in dataset")]
    DuplicateColumn(String),
    #[error("missing artifact `{0}`")]
    MissingArtifact(String),
    #[error("artifact `{name}` returned under key `{key}`")]
    MisnamedArtifact { key: String, name: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("inputs of tool `{tool}` do not include a `data` entry")]
    MissingDataInput { tool: String },
    #[error("previous step rejected for tool `{tool}`: {reason}")]
    CycleRejected { tool: String, reason: String },
    #[error("invalid link on tool `{tool}`: {reason}")]
    InvalidLink { tool: String, reason: String },
    #[error("extraction failed for `{extractor}`: {source}")]
    ExtractionFailed {
        extractor: String,
        #[source]
        source: ExtractError,
    },
    #[error("transform failed for `{tool}`: {source}")]
    TransformFailed {
        tool: String,
        #[source]
        source: TransformError,
    },
    #[error("unknown tool {0}")]
    UnknownTool(ToolId),
    #[error("unknown extractor {0}")]
    UnknownExtractor(ExtractorId),
    #[error("unknown toolchain {0}")]
    UnknownChain(ChainId),
    #[error("no entity named `{0}`")]
    UnknownName(String),
    #[error("invalid name `{0}`: names must be non-empty and contain no whitespace")]
    InvalidName(String),
    #[error("duplicate name `{name}` in {scope}")]
    DuplicateName { scope: String, name: String },
    #[error("extractor `{0}` is still used by a toolchain")]
    ExtractorInUse(String),
    #[error("note {index} does not exist on tool `{tool}`")]
    UnknownNote { tool: String, index: usize },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("decode error: {0}")]
    Decode(String),
}

impl EngineError {
    /// Indica si el error proviene de una rutina de cómputo (extracción o
    /// transformación) y no de una validación local.
    pub fn is_compute_failure(&self) -> bool {
        matches!(self, EngineError::ExtractionFailed { .. } | EngineError::TransformFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_data_message_names_the_tool() {
        let err = EngineError::MissingDataInput { tool: "filter".into() };
        assert_eq!(err.to_string(), "inputs of tool `filter` do not include a `data` entry");
        assert!(!err.is_compute_failure());
    }

    #[test]
    fn transform_failure_is_compute_failure() {
        let err = EngineError::TransformFailed { tool: "t".into(),
                                                 source: TransformError::MissingColumn("a".into()) };
        assert!(err.is_compute_failure());
        assert!(err.to_string().contains("missing column `a`"));
    }
}

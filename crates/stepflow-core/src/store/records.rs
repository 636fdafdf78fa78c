//! Forma persistida de cada entidad.
//!
//! Un registro es el documento completo que se guarda en un `save`; incluye
//! `schema_version` (ver `constants::RECORD_SCHEMA_VERSION`) y la pareja
//! `kind` + `config` con la que el `Registry` reconstruye el componente.
//! `seq` es el orden de creación: `WorkflowEngine::open` lo usa para
//! restaurar el catálogo en el mismo orden en que se armó.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::RECORD_SCHEMA_VERSION;
use crate::model::{ChainId, ExtractorId, Note, ToolId};
use crate::tool::ToolState;

fn schema_version() -> u32 {
    RECORD_SCHEMA_VERSION
}

/// Tabla cacheada tal como se guardó. Se mantiene serializada hasta el primer
/// acceso (ver `ExtractorNode::cached_table`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorCacheRecord {
    pub table: Value,
    pub extracted_at: DateTime<Utc>,
    #[serde(default)]
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorRecord {
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    pub id: ExtractorId,
    #[serde(default)]
    pub seq: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub cache: Option<ExtractorCacheRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRecord {
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    pub id: ChainId,
    #[serde(default)]
    pub seq: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub extractor: ExtractorId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    pub id: ToolId,
    #[serde(default)]
    pub seq: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub toolchain: ChainId,
    #[serde(default)]
    pub previous_step: Option<ToolId>,
    pub kind: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub state: ToolState,
}

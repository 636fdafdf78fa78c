//! WorkflowTool: paso de transformación con exactamente un predecesor.
//!
//! El nodo guarda su configuración (`Transformable`) y un único estado de
//! cache (`ToolState`). `Valid` implica `last_run_at` y `result` presentes;
//! no existen dos campos opcionales independientes que combinados codifiquen
//! el estado.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::{ENGINE_VERSION, RECORD_SCHEMA_VERSION};
use crate::errors::TransformError;
use crate::hashing::hash_value;
use crate::model::{ArtifactMap, ChainId, Note, Table, ToolId};
use crate::store::ToolRecord;

/// Artifacts que un tool toma de un tool de otra chain. El engine ejecuta el
/// tool enlazado e inyecta cada artifact en `other_inputs` con el nombre
/// `{artifact}_{tool}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub chain: String,
    pub tool: String,
    pub artifacts: Vec<String>,
}

impl LinkSpec {
    pub fn injected_name(&self, artifact: &str) -> String {
        format!("{artifact}_{}", self.tool)
    }
}

/// Rutina de transformación. Debe ser función pura de sus entradas y de la
/// configuración propia.
pub trait Transformable: Send + fmt::Debug {
    fn kind(&self) -> &'static str;
    fn config(&self) -> Value;
    /// Recibe la tabla `data` del predecesor y el resto de sus artifacts;
    /// devuelve la nueva `data` y los artifacts extra.
    fn transform(&self, data: Table, other_inputs: &ArtifactMap) -> Result<(Table, ArtifactMap), TransformError>;

    fn linked_artifacts(&self) -> Option<LinkSpec> {
        None
    }

    fn box_clone(&self) -> Box<dyn Transformable>;
}

impl Clone for Box<dyn Transformable> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    NeverRun,
    Valid,
    Invalidated,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolState {
    #[default]
    NeverRun,
    Valid {
        last_run_at: DateTime<Utc>,
        result: ArtifactMap,
    },
    Invalidated,
}

#[derive(Debug)]
pub struct ToolNode {
    pub id: ToolId,
    /// Orden de creación dentro del catálogo.
    pub seq: u64,
    pub name: String,
    pub description: String,
    pub toolchain: ChainId,
    pub previous_step: Option<ToolId>,
    pub notes: Vec<Note>,
    transform: Box<dyn Transformable>,
    state: ToolState,
}

impl ToolNode {
    pub fn new(name: impl Into<String>,
               description: impl Into<String>,
               toolchain: ChainId,
               previous_step: Option<ToolId>,
               transform: Box<dyn Transformable>)
               -> Self {
        Self { id: ToolId::new(),
               seq: 0,
               name: name.into(),
               description: description.into(),
               toolchain,
               previous_step,
               notes: Vec::new(),
               transform,
               state: ToolState::NeverRun }
    }

    pub fn from_record(record: ToolRecord, transform: Box<dyn Transformable>) -> Self {
        Self { id: record.id,
               seq: record.seq,
               name: record.name,
               description: record.description,
               toolchain: record.toolchain,
               previous_step: record.previous_step,
               notes: record.notes,
               transform,
               state: record.state }
    }

    pub fn to_record(&self) -> ToolRecord {
        ToolRecord { schema_version: RECORD_SCHEMA_VERSION,
                     id: self.id,
                     seq: self.seq,
                     name: self.name.clone(),
                     description: self.description.clone(),
                     toolchain: self.toolchain,
                     previous_step: self.previous_step,
                     kind: self.transform.kind().to_string(),
                     config: self.transform.config(),
                     notes: self.notes.clone(),
                     state: self.state.clone() }
    }

    /// Copia fresca: misma configuración, identidad nueva, sin predecesor,
    /// sin resultado ni notas.
    pub fn fresh_clone(&self, name: String, description: String) -> Self {
        Self::new(name, description, self.toolchain, None, self.transform.clone())
    }

    pub fn transform(&self) -> &dyn Transformable {
        self.transform.as_ref()
    }

    pub fn status(&self) -> ToolStatus {
        match self.state {
            ToolState::NeverRun => ToolStatus::NeverRun,
            ToolState::Valid { .. } => ToolStatus::Valid,
            ToolState::Invalidated => ToolStatus::Invalidated,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.state, ToolState::Valid { .. })
    }

    pub fn last_run_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            ToolState::Valid { last_run_at, .. } => Some(*last_run_at),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ArtifactMap> {
        match &self.state {
            ToolState::Valid { result, .. } => Some(result),
            _ => None,
        }
    }

    pub(crate) fn set_result(&mut self, result: ArtifactMap) {
        self.state = ToolState::Valid { last_run_at: Utc::now(),
                                        result };
    }

    /// Descarta `last_run_at` y `result`. Un tool que nunca corrió sigue en
    /// `NeverRun`.
    pub(crate) fn invalidate(&mut self) {
        if self.state != ToolState::NeverRun {
            self.state = ToolState::Invalidated;
        }
    }

    /// Fingerprint del mapa de resultados (hash de los hashes de contenido).
    pub fn fingerprint(&self) -> Option<String> {
        self.result().map(result_fingerprint)
    }
}

pub fn result_fingerprint(result: &ArtifactMap) -> String {
    let hashes: serde_json::Map<String, Value> = result.iter()
                                                       .map(|(k, a)| (k.clone(), Value::String(a.content_hash())))
                                                       .collect();
    hash_value(&json!({ "engine_version": ENGINE_VERSION, "artifacts": hashes }))
}

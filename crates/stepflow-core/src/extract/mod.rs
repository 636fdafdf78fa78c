//! Extractor: fuente raíz de datos de una chain y su cache.
//!
//! Estados:
//! - `Empty`: nunca extraído (o cache descartado).
//! - `Persisted`: hay una tabla guardada en el store que aún no se decodificó;
//!   se decodifica en el primer acceso y pasa a `Cached`.
//! - `Cached`: tabla válida en memoria.
//! - `Stale`: el llamador marcó la tabla como vieja; el próximo `get_data`
//!   re-extrae. No hay detección automática de staleness.
//!
//! La rutina de extracción (`Extractable`) no toca el estado; las transiciones
//! las decide `WorkflowEngine`.

use std::fmt;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ExtractError;
use crate::model::{ExtractorId, Table};
use crate::store::{ExtractorCacheRecord, ExtractorRecord};
use crate::constants::RECORD_SCHEMA_VERSION;

/// Rutina de extracción de una fuente concreta.
pub trait Extractable: Send + fmt::Debug {
    /// Clave con la que el `Registry` reconstruye esta fuente.
    fn kind(&self) -> &'static str;
    /// Configuración serializable (entra al registro persistido).
    fn config(&self) -> Value;
    fn run_extraction(&self) -> Result<Table, ExtractError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorStatus {
    Empty,
    Cached,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
enum ExtractorState {
    Empty,
    Persisted {
        serialized: Value,
        extracted_at: DateTime<Utc>,
    },
    Cached {
        table: Table,
        extracted_at: DateTime<Utc>,
    },
    Stale {
        table: Table,
        extracted_at: DateTime<Utc>,
    },
}

#[derive(Debug)]
pub struct ExtractorNode {
    pub id: ExtractorId,
    pub seq: u64,
    pub name: String,
    pub description: String,
    source: Box<dyn Extractable>,
    state: ExtractorState,
}

impl ExtractorNode {
    pub fn new(name: impl Into<String>, description: impl Into<String>, source: Box<dyn Extractable>) -> Self {
        Self { id: ExtractorId::new(),
               seq: 0,
               name: name.into(),
               description: description.into(),
               source,
               state: ExtractorState::Empty }
    }

    /// Reconstruye desde el registro persistido. La tabla cacheada queda
    /// serializada hasta el primer acceso, salvo si estaba marcada stale.
    pub fn from_record(record: ExtractorRecord, source: Box<dyn Extractable>) -> Self {
        let state = match record.cache {
            None => ExtractorState::Empty,
            Some(ExtractorCacheRecord { table, extracted_at, stale: false }) => ExtractorState::Persisted { serialized: table,
                                                                                                           extracted_at },
            Some(ExtractorCacheRecord { table, extracted_at, stale: true }) => match serde_json::from_value::<Table>(table) {
                Ok(table) => ExtractorState::Stale { table, extracted_at },
                Err(e) => {
                    warn!("discarding unreadable cache of extractor {}: {e}", record.name);
                    ExtractorState::Empty
                }
            },
        };
        Self { id: record.id,
               seq: record.seq,
               name: record.name,
               description: record.description,
               source,
               state }
    }

    pub fn to_record(&self) -> ExtractorRecord {
        let cache = match &self.state {
            ExtractorState::Empty => None,
            ExtractorState::Persisted { serialized, extracted_at } => Some(ExtractorCacheRecord { table: serialized.clone(),
                                                                                                 extracted_at: *extracted_at,
                                                                                                 stale: false }),
            ExtractorState::Cached { table, extracted_at } | ExtractorState::Stale { table, extracted_at } => {
                match serde_json::to_value(table) {
                    Ok(v) => Some(ExtractorCacheRecord { table: v,
                                                         extracted_at: *extracted_at,
                                                         stale: matches!(self.state, ExtractorState::Stale { .. }) }),
                    Err(e) => {
                        warn!("extractor {} cache not serializable: {e}", self.name);
                        None
                    }
                }
            }
        };
        ExtractorRecord { schema_version: RECORD_SCHEMA_VERSION,
                          id: self.id,
                          seq: self.seq,
                          name: self.name.clone(),
                          description: self.description.clone(),
                          kind: self.source.kind().to_string(),
                          config: self.source.config(),
                          cache }
    }

    pub fn source(&self) -> &dyn Extractable {
        self.source.as_ref()
    }

    pub fn status(&self) -> ExtractorStatus {
        match self.state {
            ExtractorState::Empty => ExtractorStatus::Empty,
            ExtractorState::Persisted { .. } | ExtractorState::Cached { .. } => ExtractorStatus::Cached,
            ExtractorState::Stale { .. } => ExtractorStatus::Stale,
        }
    }

    pub fn last_extracted_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            ExtractorState::Empty => None,
            ExtractorState::Persisted { extracted_at, .. }
            | ExtractorState::Cached { extracted_at, .. }
            | ExtractorState::Stale { extracted_at, .. } => Some(*extracted_at),
        }
    }

    /// Tabla válida (no stale), decodificando y memoizando la forma persistida
    /// si hace falta. Un cache ilegible se descarta y cuenta como vacío.
    pub fn cached_table(&mut self) -> Option<&Table> {
        let decoded = match &self.state {
            ExtractorState::Persisted { serialized, extracted_at } => {
                Some((serde_json::from_value::<Table>(serialized.clone()), *extracted_at))
            }
            _ => None,
        };
        if let Some((decoded, extracted_at)) = decoded {
            self.state = match decoded {
                Ok(table) => ExtractorState::Cached { table, extracted_at },
                Err(e) => {
                    warn!("discarding unreadable cache of extractor {}: {e}", self.name);
                    ExtractorState::Empty
                }
            };
        }
        match &self.state {
            ExtractorState::Cached { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Ejecuta la rutina de la fuente sin tocar el estado.
    pub fn extract(&self) -> Result<Table, ExtractError> {
        self.source.run_extraction()
    }

    /// Reemplaza el cache por una extracción exitosa.
    pub fn store_extraction(&mut self, table: Table) {
        self.state = ExtractorState::Cached { table,
                                              extracted_at: Utc::now() };
    }

    /// `Cached -> Stale`. Devuelve `false` si no había tabla que marcar.
    pub fn mark_stale(&mut self) -> bool {
        self.cached_table();
        match std::mem::replace(&mut self.state, ExtractorState::Empty) {
            ExtractorState::Cached { table, extracted_at } | ExtractorState::Stale { table, extracted_at } => {
                self.state = ExtractorState::Stale { table, extracted_at };
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }
}

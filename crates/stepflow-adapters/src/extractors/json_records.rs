use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stepflow_core::{ExtractError, Extractable, Table};

use crate::records::{flatten, records_at, ColumnSpec, Segment};

/// Archivo JSON local con una lista de registros en `records` (camino de
/// segmentos, vacío = raíz). Cada columna se saca con su propio camino.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRecordsExtractor {
    pub path: PathBuf,
    #[serde(default)]
    pub records: Vec<Segment>,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

impl JsonRecordsExtractor {
    pub const KIND: &'static str = "json_records";
}

impl Extractable for JsonRecordsExtractor {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn run_extraction(&self) -> Result<Table, ExtractError> {
        let bytes = fs::read(&self.path)?;
        let doc: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ExtractError::Parse(format!("{}: {e}", self.path.display())))?;
        flatten(records_at(&doc, &self.records)?, &self.columns)
    }
}

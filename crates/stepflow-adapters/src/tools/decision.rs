//! Decisiones manuales registradas sobre celdas puntuales.
//!
//! Cada decisión apunta a una entrada (índice de fila, o el valor de la
//! columna `entry_key` si está configurada) y a una columna. Al correr se
//! aplican sobre una copia de `data`; una entrada que no se encuentra o que
//! es ambigua se salta con un warning.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stepflow_core::{ArtifactMap, Table, TransformError, Transformable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub entry: Value,
    pub column: String,
    #[serde(default)]
    pub old_value: Value,
    pub new_value: Value,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionTool {
    #[serde(default)]
    pub entry_key: Option<String>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
}

impl DecisionTool {
    pub const KIND: &'static str = "decision";

    /// Registra (o reemplaza) la decisión para `(entry, column)`.
    pub fn record(&mut self, decision: Decision) {
        self.decisions
            .retain(|d| !(d.entry == decision.entry && d.column == decision.column));
        self.decisions.push(decision);
    }

    /// Decisiones de una entrada, en orden de registro.
    pub fn decisions_for(&self, entry: &Value) -> Vec<&Decision> {
        self.decisions.iter().filter(|d| &d.entry == entry).collect()
    }

    fn locate(&self, data: &Table, entry: &Value) -> Result<Option<usize>, TransformError> {
        let Some(key) = &self.entry_key else {
            return Ok(entry.as_u64().map(|i| i as usize).filter(|i| *i < data.len()));
        };
        let idx = data.column_index(key)
                      .ok_or_else(|| TransformError::MissingColumn(key.clone()))?;
        let wanted = key_text(entry);
        let hits: Vec<usize> = data.rows
                                   .iter()
                                   .enumerate()
                                   .filter(|(_, r)| key_text(&r[idx]) == wanted)
                                   .map(|(i, _)| i)
                                   .collect();
        match hits.as_slice() {
            [one] => Ok(Some(*one)),
            [] => Ok(None),
            _ => {
                warn!("more than one hit for entry {wanted}");
                Ok(None)
            }
        }
    }
}

fn key_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Texto `true`/`false` (sin importar mayúsculas) pasa a booleano.
fn coerce(v: &Value) -> Value {
    match v.as_str().map(str::to_ascii_lowercase).as_deref() {
        Some("true") => Value::Bool(true),
        Some("false") => Value::Bool(false),
        _ => v.clone(),
    }
}

impl Transformable for DecisionTool {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn transform(&self, mut data: Table, other: &ArtifactMap) -> Result<(Table, ArtifactMap), TransformError> {
        for d in &self.decisions {
            let Some(row) = self.locate(&data, &d.entry)? else {
                warn!("entry {} not found, decision on `{}` skipped", key_text(&d.entry), d.column);
                continue;
            };
            if data.column_index(&d.column).is_none() {
                data.add_column(d.column.clone(), Value::Null)?;
            }
            data.set_cell(row, &d.column, coerce(&d.new_value))?;
        }
        Ok((data, other.clone()))
    }

    fn box_clone(&self) -> Box<dyn Transformable> {
        Box::new(self.clone())
    }
}

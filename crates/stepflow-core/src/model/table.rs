//! Valor tabular que fluye entre extractor y tools.
//!
//! Columnas nombradas y filas de `serde_json::Value`. Todas las filas tienen
//! exactamente `columns.len()` celdas; las operaciones que construyen o
//! modifican la tabla mantienen ese invariante.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },
    #[error("column has {found} values, table has {expected} rows")]
    ColumnLength { expected: usize, found: usize },
    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    #[error("row index {0} out of range")]
    RowOutOfRange(usize),
}

/// Al deserializar se valida la forma igual que en `from_rows`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawTable> for Table {
    type Error = TableError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Table::from_rows(raw.columns, raw.rows)
    }
}

impl Table {
    pub fn new(columns: Vec<String>) -> Result<Self, TableError> {
        Self::from_rows(columns, Vec::new())
    }

    /// Construye validando columnas únicas y filas del ancho correcto.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        let table = Self { columns, rows };
        table.validate()?;
        Ok(table)
    }

    /// Comprueba el invariante de forma. Los campos son públicos, así que el
    /// motor lo vuelve a verificar sobre la salida de extractores y tools.
    pub fn validate(&self) -> Result<(), TableError> {
        for (i, c) in self.columns.iter().enumerate() {
            if self.columns[..i].contains(c) {
                return Err(TableError::DuplicateColumn(c.clone()));
            }
        }
        for (i, r) in self.rows.iter().enumerate() {
            if r.len() != self.columns.len() {
                return Err(TableError::RaggedRow { row: i,
                                                   expected: self.columns.len(),
                                                   found: r.len() });
            }
        }
        Ok(())
    }

    /// Construye desde registros JSON. El orden de columnas sigue la primera
    /// aparición de cada clave; las claves ausentes quedan en `null`.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for rec in records {
            for k in rec.keys() {
                if !columns.contains(k) {
                    columns.push(k.clone());
                }
            }
        }
        let rows = records.iter()
                          .map(|rec| columns.iter().map(|c| rec.get(c).cloned().unwrap_or(Value::Null)).collect())
                          .collect();
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name).ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<Vec<&Value>, TableError> {
        let idx = self.require_column(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                r.get(idx).ok_or(TableError::RaggedRow { row: i,
                                                         expected: self.columns.len(),
                                                         found: r.len() })
            })
            .collect()
    }

    /// Agrega una columna rellenando cada fila con `fill`.
    pub fn add_column(&mut self, name: impl Into<String>, fill: Value) -> Result<(), TableError> {
        let name = name.into();
        if self.column_index(&name).is_some() {
            return Err(TableError::DuplicateColumn(name));
        }
        self.columns.push(name);
        for r in &mut self.rows {
            r.push(fill.clone());
        }
        Ok(())
    }

    /// Escribe (o crea) una columna con un valor por fila.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<(), TableError> {
        if values.len() != self.rows.len() {
            return Err(TableError::ColumnLength { expected: self.rows.len(),
                                                  found: values.len() });
        }
        let idx = match self.column_index(name) {
            Some(i) => i,
            None => {
                self.add_column(name, Value::Null)?;
                self.columns.len() - 1
            }
        };
        self.validate()?;
        for (r, v) in self.rows.iter_mut().zip(values) {
            r[idx] = v;
        }
        Ok(())
    }

    pub fn set_cell(&mut self, row: usize, column: &str, value: Value) -> Result<(), TableError> {
        let idx = self.require_column(column)?;
        let width = self.columns.len();
        let r = self.rows.get_mut(row).ok_or(TableError::RowOutOfRange(row))?;
        let found = r.len();
        let cell = r.get_mut(idx).ok_or(TableError::RaggedRow { row,
                                                                expected: width,
                                                                found })?;
        *cell = value;
        Ok(())
    }

    pub fn cell(&self, row: usize, column: &str) -> Result<&Value, TableError> {
        let idx = self.require_column(column)?;
        let r = self.rows.get(row).ok_or(TableError::RowOutOfRange(row))?;
        r.get(idx).ok_or(TableError::RaggedRow { row,
                                                 expected: self.columns.len(),
                                                 found: r.len() })
    }

    /// Conserva las filas para las que `keep` devuelve `true`.
    pub fn retain_rows<F>(&mut self, mut keep: F)
        where F: FnMut(&[String], &[Value]) -> bool
    {
        let columns = &self.columns;
        self.rows.retain(|r| keep(columns, r));
    }

    /// Filas como registros JSON (orden de columnas preservado).
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|r| self.columns.iter().cloned().zip(r.iter().cloned()).collect())
            .collect()
    }
}

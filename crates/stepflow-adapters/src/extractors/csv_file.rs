//! Lectura de un CSV local. Sin encabezado, las columnas se llaman por su
//! posición (`"0"`, `"1"`, ...).

use std::fs::File;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stepflow_core::{ExtractError, Extractable, Table};

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvFileExtractor {
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_true")]
    pub has_headers: bool,
}

impl CsvFileExtractor {
    pub const KIND: &'static str = "csv_file";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(),
               delimiter: default_delimiter(),
               has_headers: true }
    }
}

/// Vacío -> `null`; luego entero, real y booleano; el resto queda como texto.
fn parse_cell(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    match s {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

impl Extractable for CsvFileExtractor {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn run_extraction(&self) -> Result<Table, ExtractError> {
        if !self.delimiter.is_ascii() {
            return Err(ExtractError::Parse(format!("delimiter `{}` is not ASCII", self.delimiter)));
        }
        let file = File::open(&self.path)?;
        let mut reader = csv::ReaderBuilder::new().delimiter(self.delimiter as u8)
                                                  .has_headers(self.has_headers)
                                                  .from_reader(file);
        let mut columns: Vec<String> = if self.has_headers {
            reader.headers()
                  .map_err(|e| ExtractError::Parse(e.to_string()))?
                  .iter()
                  .map(str::to_string)
                  .collect()
        } else {
            Vec::new()
        };
        let mut rows = Vec::new();
        for (i, rec) in reader.records().enumerate() {
            let rec = rec.map_err(|e| ExtractError::Parse(format!("{}: row {i}: {e}", self.path.display())))?;
            if columns.is_empty() && !self.has_headers {
                columns = (0..rec.len()).map(|c| c.to_string()).collect();
            }
            rows.push(rec.iter().map(parse_cell).collect());
        }
        Ok(Table::from_rows(columns, rows)?)
    }
}

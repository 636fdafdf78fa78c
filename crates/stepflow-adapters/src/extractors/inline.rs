use serde::{Deserialize, Serialize};
use serde_json::Value;
use stepflow_core::{ExtractError, Extractable, Table};

/// Tabla embebida en la configuración. Útil para datos de referencia chicos
/// y para demos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineExtractor {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl InlineExtractor {
    pub const KIND: &'static str = "inline";

    pub fn new(table: Table) -> Self {
        Self { columns: table.columns,
               rows: table.rows }
    }
}

impl Extractable for InlineExtractor {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn run_extraction(&self) -> Result<Table, ExtractError> {
        Ok(Table::from_rows(self.columns.clone(), self.rows.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ragged_rows_are_a_table_error() {
        let e = InlineExtractor { columns: vec!["a".into(), "b".into()],
                                  rows: vec![vec![json!(1)]] };
        assert!(matches!(e.run_extraction(), Err(ExtractError::Table(_))));
    }

    #[test]
    fn config_roundtrips_through_serde() {
        let e = InlineExtractor { columns: vec!["a".into()],
                                  rows: vec![vec![json!(1)], vec![json!(2)]] };
        let back: InlineExtractor = serde_json::from_value(e.config()).unwrap();
        assert_eq!(back.run_extraction().unwrap().len(), 2);
    }
}

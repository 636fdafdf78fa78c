use serde::{Deserialize, Serialize};
use serde_json::Value;
use stepflow_core::{ArtifactMap, Table, TransformError, Transformable};

/// Descarta las filas cuyo `column` es `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredFieldTool {
    pub column: String,
}

impl RequiredFieldTool {
    pub const KIND: &'static str = "required_field";
}

impl Transformable for RequiredFieldTool {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn transform(&self, mut data: Table, _other: &ArtifactMap) -> Result<(Table, ArtifactMap), TransformError> {
        let idx = data.column_index(&self.column)
                      .ok_or_else(|| TransformError::MissingColumn(self.column.clone()))?;
        data.retain_rows(|_, row| !row[idx].is_null());
        Ok((data, ArtifactMap::new()))
    }

    fn box_clone(&self) -> Box<dyn Transformable> {
        Box::new(self.clone())
    }
}

/// Agrega columnas vacías (`null`), p.ej. para que un paso manual las llene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAddTool {
    pub columns: Vec<String>,
}

impl ColumnAddTool {
    pub const KIND: &'static str = "column_add";
}

impl Transformable for ColumnAddTool {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn transform(&self, mut data: Table, _other: &ArtifactMap) -> Result<(Table, ArtifactMap), TransformError> {
        for c in &self.columns {
            if data.column_index(c).is_some() {
                return Err(TransformError::DuplicateColumn(c.clone()));
            }
            data.add_column(c.clone(), Value::Null)?;
        }
        Ok((data, ArtifactMap::new()))
    }

    fn box_clone(&self) -> Box<dyn Transformable> {
        Box::new(self.clone())
    }
}

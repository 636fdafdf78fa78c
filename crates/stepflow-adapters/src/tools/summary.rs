//! Resumen estadístico por columna numérica más un gráfico de las mismas
//! columnas. `data` pasa intacta.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use stepflow_core::{Artifact, ArtifactMap, PlotSeries, PlotSpec, Table, TransformError, Transformable};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTool {
    /// Columnas a resumir; vacío = todas las que tengan algún número.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Eje x del gráfico; sin él se usa el índice de fila.
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub title: String,
}

impl SummaryTool {
    pub const KIND: &'static str = "summary";

    fn selected(&self, data: &Table) -> Result<Vec<String>, TransformError> {
        if self.columns.is_empty() {
            return Ok(data.columns
                          .iter()
                          .enumerate()
                          .filter(|(i, c)| Some(c.as_str()) != self.x.as_deref() && data.rows.iter().any(|r| r[*i].is_number()))
                          .map(|(_, c)| c.clone())
                          .collect());
        }
        for c in &self.columns {
            data.require_column(c)?;
        }
        Ok(self.columns.clone())
    }
}

fn stats(values: &[f64]) -> Value {
    if values.is_empty() {
        return json!({ "count": 0, "mean": null, "min": null, "max": null });
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    json!({ "count": values.len(), "mean": mean, "min": min, "max": max })
}

impl Transformable for SummaryTool {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn transform(&self, data: Table, _other: &ArtifactMap) -> Result<(Table, ArtifactMap), TransformError> {
        let columns = self.selected(&data)?;
        let xs: Vec<Option<f64>> = match &self.x {
            Some(x) => data.column(x)?.into_iter().map(Value::as_f64).collect(),
            None => (0..data.len()).map(|i| Some(i as f64)).collect(),
        };

        let mut summary = Map::new();
        let mut series = Vec::new();
        for c in &columns {
            let cells = data.column(c)?;
            let values: Vec<f64> = cells.iter().filter_map(|v| v.as_f64()).collect();
            summary.insert(c.clone(), stats(&values));
            let (x, y) = xs.iter()
                           .zip(cells.iter())
                           .filter_map(|(x, y)| Some(((*x)?, y.as_f64()?)))
                           .unzip();
            series.push(PlotSeries { label: c.clone(),
                                     x,
                                     y });
        }

        let plot = PlotSpec { title: self.title.clone(),
                              x_label: self.x.clone().unwrap_or_else(|| "row".into()),
                              y_label: "value".into(),
                              series };
        let mut extra = ArtifactMap::new();
        extra.insert("stats".into(),
                     Artifact::object("stats", &Value::Object(summary))?.with_description("per-column statistics"));
        extra.insert("plot".into(), Artifact::plot("plot", &plot)?);
        Ok((data, extra))
    }

    fn box_clone(&self) -> Box<dyn Transformable> {
        Box::new(self.clone())
    }
}

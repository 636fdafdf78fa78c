//! Render de artifacts a formatos de salida.
//!
//! Los formatos son fijos por `ArtifactKind` (no se descubren en runtime) y
//! los kinds ricos reemplazan el formato base `raw` en lugar de extenderlo.
//! Pedir un formato no declarado falla con `RenderError::UnsupportedFormat`.

mod formats;
mod plot;
mod table;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Artifact, ArtifactError, ArtifactKind};

pub use formats::{formats_for, default_format_for};

/// Descriptor de un formato: clave, extensión de archivo y descripción.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    pub key: &'static str,
    pub extension: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonOrient {
    #[default]
    Records,
    Columns,
}

/// Opciones de render; cada formato ignora las que no le aplican.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub csv_delimiter: u8,
    pub include_header: bool,
    pub json_orient: JsonOrient,
    pub sheet_name: String,
    pub html_table_id: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { csv_delimiter: b',',
               include_header: true,
               json_orient: JsonOrient::Records,
               sheet_name: "Sheet1".to_string(),
               html_table_id: None }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("format `{format}` is not supported by {kind:?} artifacts")]
    UnsupportedFormat { format: String, kind: ArtifactKind },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("encoding failed: {0}")]
    Encode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Superficie de exportación consumida por la capa de presentación.
pub trait Renderable {
    fn available_formats(&self) -> &'static [FormatDescriptor];
    fn default_format(&self) -> &'static str;
    fn render(&self, format: &str, options: &RenderOptions) -> Result<Vec<u8>, RenderError>;

    fn supports(&self, format: &str) -> bool {
        self.available_formats().iter().any(|f| f.key == format)
    }
}

impl Renderable for Artifact {
    fn available_formats(&self) -> &'static [FormatDescriptor] {
        formats_for(self.kind)
    }

    fn default_format(&self) -> &'static str {
        default_format_for(self.kind)
    }

    fn render(&self, format: &str, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
        if !self.supports(format) {
            return Err(RenderError::UnsupportedFormat { format: format.to_string(),
                                                        kind: self.kind });
        }
        match (self.kind, format) {
            (ArtifactKind::Generic, _) => Ok(self.payload.clone()),
            (ArtifactKind::Object, _) => {
                let v = self.decode_object()?;
                serde_json::to_vec_pretty(&v).map_err(|e| RenderError::Encode(e.to_string()))
            }
            (ArtifactKind::Table, f) => table::render(&self.decode_table()?, f, options),
            (ArtifactKind::Plot, f) => plot::render(&self.name, &self.decode_plot()?, f),
        }
    }
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PlotSpec, Table};
    use serde_json::json;

    fn table_artifact() -> Artifact {
        let t = Table::from_rows(vec!["name".into(), "score".into()],
                                 vec![vec![json!("a<b"), json!(1.5)], vec![json!("c"), json!(null)]]).unwrap();
        Artifact::table("data", &t).unwrap()
    }

    #[test]
    fn table_formats_replace_raw() {
        let a = table_artifact();
        let keys: Vec<_> = a.available_formats().iter().map(|f| f.key).collect();
        assert_eq!(keys, vec!["csv", "excel", "json", "html"]);
        assert_eq!(a.default_format(), "excel");
        let err = a.render("raw", &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat { ref format, kind: ArtifactKind::Table } if format == "raw"));
    }

    #[test]
    fn generic_only_supports_raw() {
        let a = Artifact::generic("blob", b"bytes".to_vec()).unwrap();
        assert_eq!(a.default_format(), "raw");
        assert_eq!(a.render("raw", &RenderOptions::default()).unwrap(), b"bytes".to_vec());
        assert!(a.render("csv", &RenderOptions::default()).is_err());
    }

    #[test]
    fn csv_honours_delimiter_and_header() {
        let a = table_artifact();
        let opts = RenderOptions { csv_delimiter: b';',
                                   include_header: false,
                                   ..RenderOptions::default() };
        let out = String::from_utf8(a.render("csv", &opts).unwrap()).unwrap();
        assert_eq!(out, "a<b;1.5\nc;\n");
    }

    #[test]
    fn json_orientations() {
        let a = table_artifact();
        let rec: serde_json::Value = serde_json::from_slice(&a.render("json", &RenderOptions::default()).unwrap()).unwrap();
        assert_eq!(rec, json!([{"name": "a<b", "score": 1.5}, {"name": "c", "score": null}]));
        let opts = RenderOptions { json_orient: JsonOrient::Columns,
                                   ..RenderOptions::default() };
        let cols: serde_json::Value = serde_json::from_slice(&a.render("json", &opts).unwrap()).unwrap();
        assert_eq!(cols, json!({"name": ["a<b", "c"], "score": [1.5, null]}));
    }

    #[test]
    fn html_escapes_cells() {
        let a = table_artifact();
        let out = String::from_utf8(a.render("html", &RenderOptions::default()).unwrap()).unwrap();
        assert!(out.contains("<td>a&lt;b</td>"));
        assert!(out.starts_with("<table"));
    }

    #[test]
    fn excel_goes_through_a_file_and_yields_a_zip() {
        let a = table_artifact();
        let bytes = a.render("excel", &RenderOptions::default()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn plot_formats() {
        let a = Artifact::plot("plot", &PlotSpec { title: "t".into(), ..PlotSpec::default() }).unwrap();
        assert_eq!(a.default_format(), "html");
        let comp: serde_json::Value = serde_json::from_slice(&a.render("components", &RenderOptions::default()).unwrap()).unwrap();
        assert!(comp.get("script").is_some() && comp.get("div").is_some());
    }
}

//! Render de `PlotSpec`: una página HTML autocontenida o el par
//! `{script, div}` para incrustar en otra página.

use serde_json::json;

use super::{escape_html, RenderError};
use crate::model::PlotSpec;

pub(super) fn render(name: &str, spec: &PlotSpec, format: &str) -> Result<Vec<u8>, RenderError> {
    let (script, div) = components(name, spec)?;
    match format {
        "html" => {
            let page = format!("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n{}\n</body>\n</html>\n",
                               escape_html(&spec.title),
                               div,
                               script);
            Ok(page.into_bytes())
        }
        "components" => serde_json::to_vec(&json!({ "script": script, "div": div })).map_err(|e| RenderError::Encode(e.to_string())),
        other => Err(RenderError::Encode(format!("no plot encoder for `{other}`"))),
    }
}

fn components(name: &str, spec: &PlotSpec) -> Result<(String, String), RenderError> {
    let element_id = format!("plot-{}", escape_html(name));
    let data = serde_json::to_string(spec).map_err(|e| RenderError::Encode(e.to_string()))?;
    // `</` dentro de un <script> cerraría el tag antes de tiempo.
    let data = data.replace("</", "<\\/");
    let script = format!("<script type=\"application/json\" data-plot-target=\"{element_id}\">{data}</script>");
    let div = format!("<div id=\"{element_id}\" class=\"stepflow-plot\"></div>");
    Ok((script, div))
}

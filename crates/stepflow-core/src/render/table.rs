//! Codificadores para artifacts tabulares.
//!
//! `excel` pasa por un archivo temporal: el writer de xlsx escribe a disco y
//! el resultado se lee de vuelta como bytes.

use std::io::Read;

use rust_xlsxwriter::Workbook;
use serde_json::{Map, Value};

use super::{escape_html, JsonOrient, RenderError, RenderOptions};
use crate::model::Table;

pub(super) fn render(table: &Table, format: &str, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    match format {
        "csv" => to_csv(table, options),
        "excel" => to_excel(table, options),
        "json" => to_json(table, options),
        "html" => Ok(to_html(table, options).into_bytes()),
        other => Err(RenderError::Encode(format!("no table encoder for `{other}`"))),
    }
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_csv(table: &Table, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    let mut wtr = csv::WriterBuilder::new().delimiter(options.csv_delimiter)
                                           .from_writer(Vec::new());
    let enc = |e: csv::Error| RenderError::Encode(e.to_string());
    if options.include_header {
        wtr.write_record(&table.columns).map_err(enc)?;
    }
    for row in &table.rows {
        wtr.write_record(row.iter().map(cell_text)).map_err(enc)?;
    }
    wtr.into_inner().map_err(|e| RenderError::Encode(e.to_string()))
}

fn to_json(table: &Table, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    let value = match options.json_orient {
        JsonOrient::Records => Value::Array(table.records().into_iter().map(Value::Object).collect()),
        JsonOrient::Columns => {
            let mut m = Map::new();
            for (i, c) in table.columns.iter().enumerate() {
                m.insert(c.clone(), Value::Array(table.rows.iter().map(|r| r.get(i).cloned().unwrap_or(Value::Null)).collect()));
            }
            Value::Object(m)
        }
    };
    serde_json::to_vec(&value).map_err(|e| RenderError::Encode(e.to_string()))
}

fn to_html(table: &Table, options: &RenderOptions) -> String {
    let mut out = String::new();
    match &options.html_table_id {
        Some(id) => out.push_str(&format!("<table id=\"{}\" class=\"dataframe\">\n", escape_html(id))),
        None => out.push_str("<table class=\"dataframe\">\n"),
    }
    if options.include_header {
        out.push_str("<thead><tr>");
        for c in &table.columns {
            out.push_str(&format!("<th>{}</th>", escape_html(c)));
        }
        out.push_str("</tr></thead>\n");
    }
    out.push_str("<tbody>\n");
    for row in &table.rows {
        out.push_str("<tr>");
        for v in row {
            out.push_str(&format!("<td>{}</td>", escape_html(&cell_text(v))));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

fn to_excel(table: &Table, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    let xl = |e: rust_xlsxwriter::XlsxError| RenderError::Encode(e.to_string());
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(&options.sheet_name).map_err(xl)?;

    let mut row_idx: u32 = 0;
    if options.include_header {
        for (c, name) in table.columns.iter().enumerate() {
            sheet.write_string(row_idx, col_num(c)?, name).map_err(xl)?;
        }
        row_idx += 1;
    }
    for row in &table.rows {
        for (c, v) in row.iter().enumerate() {
            let col = col_num(c)?;
            match v {
                Value::Null => {}
                Value::Bool(b) => {
                    sheet.write_boolean(row_idx, col, *b).map_err(xl)?;
                }
                Value::Number(n) => match n.as_f64() {
                    Some(f) => {
                        sheet.write_number(row_idx, col, f).map_err(xl)?;
                    }
                    None => {
                        sheet.write_string(row_idx, col, n.to_string()).map_err(xl)?;
                    }
                },
                other => {
                    sheet.write_string(row_idx, col, cell_text(other)).map_err(xl)?;
                }
            }
        }
        row_idx += 1;
    }

    let tmp = tempfile::Builder::new().prefix("stepflow-").suffix(".xlsx").tempfile()?;
    workbook.save(tmp.path()).map_err(xl)?;
    let mut bytes = Vec::new();
    std::fs::File::open(tmp.path())?.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn col_num(c: usize) -> Result<u16, RenderError> {
    u16::try_from(c).map_err(|_| RenderError::Encode(format!("column index {c} exceeds spreadsheet limits")))
}

//! Aplanado de documentos JSON anidados a una `Table`.
//!
//! Una columna se define por un camino de segmentos:
//! - `"clave"`: entra al campo del objeto.
//! - `3`: toma el elemento de una lista (un objeto suelto cuenta como lista
//!   de un elemento).
//! - `{"key": "b", "field": "lang", "equals": "en"}`: entre los elementos de
//!   `b`, el primero cuyo `lang` vale `"en"`.
//!
//! Un camino que no resuelve deja `null` en la celda.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stepflow_core::{ExtractError, Table};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Index(usize),
    Key(String),
    Match { key: String, field: String, equals: Value },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub path: Vec<Segment>,
}

fn nth(value: &Value, index: usize) -> Option<&Value> {
    match value {
        Value::Array(items) => items.get(index),
        other if index == 0 => Some(other),
        _ => None,
    }
}

pub fn resolve<'a>(record: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    let mut current = record;
    for seg in path {
        current = match seg {
            Segment::Key(k) => current.get(k)?,
            Segment::Index(i) => nth(current, *i)?,
            Segment::Match { key, field, equals } => {
                let candidates = current.get(key)?;
                match candidates {
                    Value::Array(items) => items.iter().find(|x| x.get(field) == Some(equals))?,
                    single if single.get(field) == Some(equals) => single,
                    _ => return None,
                }
            }
        };
    }
    Some(current)
}

/// Lista de registros bajo `root` dentro de `doc`. Un camino vacío exige que
/// el documento mismo sea una lista.
pub fn records_at<'a>(doc: &'a Value, root: &[Segment]) -> Result<&'a [Value], ExtractError> {
    let found = resolve(doc, root).ok_or_else(|| ExtractError::Schema(format!("records path {root:?} not found")))?;
    found.as_array()
         .map(Vec::as_slice)
         .ok_or_else(|| ExtractError::Schema(format!("records path {root:?} is not a list")))
}

/// Construye la tabla. Sin columnas declaradas, cada registro debe ser un
/// objeto plano y se usan sus claves.
pub fn flatten(records: &[Value], columns: &[ColumnSpec]) -> Result<Table, ExtractError> {
    if columns.is_empty() {
        let objects = records.iter()
                             .enumerate()
                             .map(|(i, r)| {
                                 r.as_object()
                                  .cloned()
                                  .ok_or_else(|| ExtractError::Schema(format!("record {i} is not an object")))
                             })
                             .collect::<Result<Vec<Map<String, Value>>, _>>()?;
        return Ok(Table::from_records(&objects));
    }
    let names = columns.iter().map(|c| c.name.clone()).collect();
    let rows = records.iter()
                      .map(|r| {
                          columns.iter()
                                 .map(|c| resolve(r, &c.path).cloned().unwrap_or(Value::Null))
                                 .collect()
                      })
                      .collect();
    Ok(Table::from_rows(names, rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "a": {
                "b": [
                    { "english": "Hello", "spanish": "Hola" },
                    { "english": "Goodbye", "spanish": "Adios" }
                ],
                "c": { "english": "One" }
            }
        })
    }

    fn path(v: Value) -> Vec<Segment> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn resolves_keys_indices_and_matches() {
        let d = doc();
        assert_eq!(resolve(&d, &path(json!(["a", "b", 1, "spanish"]))), Some(&json!("Adios")));
        let by_match = path(json!(["a", {"key": "b", "field": "english", "equals": "Hello"}, "spanish"]));
        assert_eq!(resolve(&d, &by_match), Some(&json!("Hola")));
        assert_eq!(resolve(&d, &path(json!(["a", "c", 0, "english"]))), Some(&json!("One")));
        assert_eq!(resolve(&d, &path(json!(["a", "zzz"]))), None);
        assert_eq!(resolve(&d, &path(json!(["a", "c", 1]))), None);
    }

    #[test]
    fn flatten_with_specs_fills_missing_with_null() {
        let records = vec![json!({"id": 1, "m": {"t": 10}}), json!({"id": 2})];
        let cols = vec![ColumnSpec { name: "id".into(),
                                     path: path(json!(["id"])) },
                        ColumnSpec { name: "t".into(),
                                     path: path(json!(["m", "t"])) }];
        let t = flatten(&records, &cols).unwrap();
        assert_eq!(t.columns, vec!["id", "t"]);
        assert_eq!(t.rows[1], vec![json!(2), Value::Null]);
    }

    #[test]
    fn flatten_without_specs_requires_objects() {
        assert!(matches!(flatten(&[json!(1)], &[]), Err(ExtractError::Schema(_))));
        let t = flatten(&[json!({"x": 1}), json!({"y": 2})], &[]).unwrap();
        assert_eq!(t.columns, vec!["x", "y"]);
    }

    #[test]
    fn records_root_must_be_a_list() {
        let d = json!({"items": [1, 2], "one": 3});
        assert_eq!(records_at(&d, &path(json!(["items"]))).unwrap().len(), 2);
        assert!(records_at(&d, &path(json!(["one"]))).is_err());
        assert!(records_at(&d, &path(json!(["nope"]))).is_err());
    }
}

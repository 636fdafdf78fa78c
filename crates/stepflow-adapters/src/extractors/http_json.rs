//! Registros JSON obtenidos por HTTP GET (cliente bloqueante con timeout).

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stepflow_core::{ExtractError, Extractable, Table};

use crate::records::{flatten, records_at, ColumnSpec, Segment};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpJsonExtractor {
    pub url: String,
    #[serde(default)]
    pub records: Vec<Segment>,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl HttpJsonExtractor {
    pub const KIND: &'static str = "http_json";

    fn fetch(&self) -> Result<Value, ExtractError> {
        let unreachable = |e: reqwest::Error| ExtractError::Unreachable(format!("{}: {e}", self.url));
        let client = reqwest::blocking::Client::builder().timeout(Duration::from_secs(self.timeout_secs))
                                                         .build()
                                                         .map_err(unreachable)?;
        debug!("GET {}", self.url);
        let response = client.get(&self.url)
                             .send()
                             .and_then(|r| r.error_for_status())
                             .map_err(unreachable)?;
        response.json::<Value>()
                .map_err(|e| ExtractError::Parse(format!("{}: {e}", self.url)))
    }
}

impl Extractable for HttpJsonExtractor {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn run_extraction(&self) -> Result<Table, ExtractError> {
        let doc = self.fetch()?;
        flatten(records_at(&doc, &self.records)?, &self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timeout_defaults_when_absent() {
        let e: HttpJsonExtractor = serde_json::from_value(json!({"url": "http://example.invalid"})).unwrap();
        assert_eq!(e.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn closed_port_is_unreachable() {
        let e = HttpJsonExtractor { url: "http://127.0.0.1:9/records".into(),
                                    records: vec![],
                                    columns: vec![],
                                    timeout_secs: 2 };
        assert!(matches!(e.run_extraction(), Err(ExtractError::Unreachable(_))));
    }
}

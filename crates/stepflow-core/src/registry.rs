//! Registro explícito `kind -> fábrica`.
//!
//! Reemplaza la resolución de tipos por nombre en runtime: cada fuente y cada
//! transformación concreta se registra al arrancar el proceso y el engine la
//! reconstruye desde `(kind, config)` al abrir un store.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::extract::Extractable;
use crate::tool::Transformable;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown {role} kind `{kind}`")]
    UnknownKind { role: &'static str, kind: String },
    #[error("{role} kind `{kind}` registered twice")]
    Duplicate { role: &'static str, kind: String },
    #[error("invalid config for `{kind}`: {reason}")]
    InvalidConfig { kind: String, reason: String },
}

pub type ExtractorFactory = fn(&Value) -> Result<Box<dyn Extractable>, RegistryError>;
pub type TransformFactory = fn(&Value) -> Result<Box<dyn Transformable>, RegistryError>;

#[derive(Default, Clone)]
pub struct Registry {
    extractors: BTreeMap<String, ExtractorFactory>,
    transforms: BTreeMap<String, TransformFactory>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
         .field("extractors", &self.extractors.keys().collect::<Vec<_>>())
         .field("transforms", &self.transforms.keys().collect::<Vec<_>>())
         .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_extractor(&mut self, kind: &str, factory: ExtractorFactory) -> Result<(), RegistryError> {
        if self.extractors.contains_key(kind) {
            return Err(RegistryError::Duplicate { role: "extractor",
                                                  kind: kind.to_string() });
        }
        self.extractors.insert(kind.to_string(), factory);
        Ok(())
    }

    pub fn register_transform(&mut self, kind: &str, factory: TransformFactory) -> Result<(), RegistryError> {
        if self.transforms.contains_key(kind) {
            return Err(RegistryError::Duplicate { role: "tool",
                                                  kind: kind.to_string() });
        }
        self.transforms.insert(kind.to_string(), factory);
        Ok(())
    }

    pub fn build_extractor(&self, kind: &str, config: &Value) -> Result<Box<dyn Extractable>, RegistryError> {
        let factory = self.extractors.get(kind).ok_or_else(|| RegistryError::UnknownKind { role: "extractor",
                                                                                           kind: kind.to_string() })?;
        factory(config)
    }

    pub fn build_transform(&self, kind: &str, config: &Value) -> Result<Box<dyn Transformable>, RegistryError> {
        let factory = self.transforms.get(kind).ok_or_else(|| RegistryError::UnknownKind { role: "tool",
                                                                                           kind: kind.to_string() })?;
        factory(config)
    }

    pub fn extractor_kinds(&self) -> impl Iterator<Item = &str> {
        self.extractors.keys().map(String::as_str)
    }

    pub fn transform_kinds(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }
}

/// Deserializa la configuración de un componente, etiquetando el error con
/// su kind.
pub fn from_config<T: DeserializeOwned>(kind: &str, config: &Value) -> Result<T, RegistryError> {
    serde_json::from_value(config.clone()).map_err(|e| RegistryError::InvalidConfig { kind: kind.to_string(),
                                                                                     reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExtractError;
    use crate::model::Table;
    use serde_json::json;

    #[derive(Debug)]
    struct Empty;

    impl Extractable for Empty {
        fn kind(&self) -> &'static str {
            "empty"
        }
        fn config(&self) -> Value {
            json!({})
        }
        fn run_extraction(&self) -> Result<Table, ExtractError> {
            Ok(Table::default())
        }
    }

    fn empty_factory(_: &Value) -> Result<Box<dyn Extractable>, RegistryError> {
        Ok(Box::new(Empty))
    }

    #[test]
    fn builds_registered_kinds_and_rejects_others() {
        let mut r = Registry::new();
        r.register_extractor("empty", empty_factory).unwrap();
        assert!(matches!(r.register_extractor("empty", empty_factory), Err(RegistryError::Duplicate { .. })));
        assert_eq!(r.build_extractor("empty", &json!({})).unwrap().kind(), "empty");
        assert!(matches!(r.build_extractor("nope", &json!({})), Err(RegistryError::UnknownKind { .. })));
        assert!(matches!(r.build_transform("empty", &json!({})), Err(RegistryError::UnknownKind { role: "tool", .. })));
    }

    #[test]
    fn from_config_reports_kind() {
        #[derive(serde::Deserialize, Debug)]
        struct Cfg {
            #[allow(dead_code)]
            column: String,
        }
        let err = from_config::<Cfg>("filter", &json!({"col": 1})).unwrap_err();
        assert!(err.to_string().starts_with("invalid config for `filter`"));
    }
}

//! Artifact: unidad nombrada y tipada de salida de un step.
//!
//! - `payload` son bytes opacos; su interpretación depende de `kind`
//!   (tablas y objetos se codifican como JSON, plots como `PlotSpec` JSON).
//! - El `kind` fija qué formatos de render son legales (ver `render`).
//! - Un artifact no se muta tras construirse: cada run del tool produce un
//!   mapa de resultados nuevo.
//! - `content_hash` (blake3 sobre nombre, kind y payload) sirve a los tests y
//!   a la jerarquía para comparar resultados bit a bit.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::hashing::hash_bytes;
use crate::model::names::validate_name;
use crate::model::plot::PlotSpec;
use crate::model::table::Table;

/// Mapa de resultados de un tool. La clave es el nombre del artifact, lo que
/// garantiza la unicidad de nombres dentro de un mismo resultado.
pub type ArtifactMap = BTreeMap<String, Artifact>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Bytes sin semántica; sólo `raw`.
    Generic,
    /// Objeto JSON arbitrario.
    Object,
    /// Tabla (`Table`).
    Table,
    /// Gráfico (`PlotSpec`).
    Plot,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("invalid artifact name `{0}`")]
    InvalidName(String),
    #[error("artifact `{name}` is {found:?}, expected {expected:?}")]
    WrongKind {
        name: String,
        expected: ArtifactKind,
        found: ArtifactKind,
    },
    #[error("artifact `{name}` payload could not be decoded: {reason}")]
    Decode { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: ArtifactKind,
    #[serde(serialize_with = "ser_b64", deserialize_with = "de_b64")]
    pub payload: Vec<u8>,
}

impl Artifact {
    fn build(name: impl Into<String>, kind: ArtifactKind, payload: Vec<u8>) -> Result<Self, ArtifactError> {
        let name = name.into();
        if !validate_name(&name) {
            return Err(ArtifactError::InvalidName(name));
        }
        Ok(Self { name,
                  description: String::new(),
                  kind,
                  payload })
    }

    pub fn generic(name: impl Into<String>, payload: Vec<u8>) -> Result<Self, ArtifactError> {
        Self::build(name, ArtifactKind::Generic, payload)
    }

    pub fn object(name: impl Into<String>, value: &Value) -> Result<Self, ArtifactError> {
        let name = name.into();
        let payload = serde_json::to_vec(value).map_err(|e| ArtifactError::Decode { name: name.clone(),
                                                                                   reason: e.to_string() })?;
        Self::build(name, ArtifactKind::Object, payload)
    }

    pub fn table(name: impl Into<String>, table: &Table) -> Result<Self, ArtifactError> {
        let name = name.into();
        let payload = serde_json::to_vec(table).map_err(|e| ArtifactError::Decode { name: name.clone(),
                                                                                   reason: e.to_string() })?;
        Self::build(name, ArtifactKind::Table, payload)
    }

    pub fn plot(name: impl Into<String>, spec: &PlotSpec) -> Result<Self, ArtifactError> {
        let name = name.into();
        let payload = serde_json::to_vec(spec).map_err(|e| ArtifactError::Decode { name: name.clone(),
                                                                                  reason: e.to_string() })?;
        Self::build(name, ArtifactKind::Plot, payload)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Copia con otro nombre (usado al inyectar artifacts enlazados).
    pub fn renamed(&self, name: impl Into<String>) -> Result<Self, ArtifactError> {
        let mut a = Self::build(name, self.kind, self.payload.clone())?;
        a.description = self.description.clone();
        Ok(a)
    }

    fn expect_kind(&self, expected: ArtifactKind) -> Result<(), ArtifactError> {
        if self.kind != expected {
            return Err(ArtifactError::WrongKind { name: self.name.clone(),
                                                  expected,
                                                  found: self.kind });
        }
        Ok(())
    }

    fn decode_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ArtifactError> {
        serde_json::from_slice(&self.payload).map_err(|e| ArtifactError::Decode { name: self.name.clone(),
                                                                                 reason: e.to_string() })
    }

    pub fn decode_table(&self) -> Result<Table, ArtifactError> {
        self.expect_kind(ArtifactKind::Table)?;
        self.decode_json()
    }

    pub fn decode_object(&self) -> Result<Value, ArtifactError> {
        self.expect_kind(ArtifactKind::Object)?;
        self.decode_json()
    }

    pub fn decode_plot(&self) -> Result<PlotSpec, ArtifactError> {
        self.expect_kind(ArtifactKind::Plot)?;
        self.decode_json()
    }

    pub fn content_hash(&self) -> String {
        let mut buf = Vec::with_capacity(self.name.len() + self.payload.len() + 16);
        buf.extend_from_slice(self.name.as_bytes());
        buf.push(0);
        buf.extend_from_slice(format!("{:?}", self.kind).as_bytes());
        buf.push(0);
        buf.extend_from_slice(&self.payload);
        hash_bytes(&buf)
    }
}

fn ser_b64<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&B64.encode(bytes))
}

fn de_b64<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(d)?;
    B64.decode(s.as_bytes()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_names_with_whitespace() {
        assert!(matches!(Artifact::generic("bad name", vec![]), Err(ArtifactError::InvalidName(_))));
    }

    #[test]
    fn table_payload_decodes_back() {
        let t = Table::from_rows(vec!["x".into()], vec![vec![json!(1)]]).unwrap();
        let a = Artifact::table("data", &t).unwrap();
        assert_eq!(a.decode_table().unwrap(), t);
        assert!(matches!(a.decode_object(), Err(ArtifactError::WrongKind { .. })));
    }

    #[test]
    fn payload_is_base64_in_json_form() {
        let a = Artifact::generic("blob", vec![0, 1, 2, 255]).unwrap();
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["payload"], json!("AAEC/w=="));
        let back: Artifact = serde_json::from_value(v).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn content_hash_depends_on_payload() {
        let a = Artifact::generic("blob", vec![1]).unwrap();
        let b = Artifact::generic("blob", vec![2]).unwrap();
        assert_ne!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash(), a.clone().content_hash());
    }
}

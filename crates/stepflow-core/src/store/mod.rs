//! Contrato de persistencia y stores locales.
//!
//! El motor ve cada entidad como un documento JSON opaco indexado por
//! `(collection, id)`. Cada `save` escribe el documento completo: un corte a
//! mitad de escritura no puede dejar `result` y `last_run_at` inconsistentes.

mod file;
mod memory;
pub mod records;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use file::JsonFileDocumentStore;
pub use memory::InMemoryDocumentStore;
pub use records::{ChainRecord, ExtractorCacheRecord, ExtractorRecord, ToolRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Extractors,
    Chains,
    Tools,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Extractors, Collection::Chains, Collection::Tools];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Extractors => "extractors",
            Collection::Chains => "chains",
            Collection::Tools => "tools",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {collection}/{id} not found")]
    NotFound { collection: Collection, id: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Almacén clave-valor de documentos compartido por todas las chains.
pub trait DocumentStore {
    fn load(&self, collection: Collection, id: &str) -> Result<Value, StoreError>;
    /// Upsert del documento completo.
    fn save(&mut self, collection: Collection, id: &str, doc: &Value) -> Result<(), StoreError>;
    /// Borrar un documento inexistente no es error.
    fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError>;
    /// Todos los documentos de una colección, ordenados por id.
    fn list(&self, collection: Collection) -> Result<Vec<(String, Value)>, StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn load(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        (**self).load(collection, id)
    }
    fn save(&mut self, collection: Collection, id: &str, doc: &Value) -> Result<(), StoreError> {
        (**self).save(collection, id, doc)
    }
    fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError> {
        (**self).delete(collection, id)
    }
    fn list(&self, collection: Collection) -> Result<Vec<(String, Value)>, StoreError> {
        (**self).list(collection)
    }
}

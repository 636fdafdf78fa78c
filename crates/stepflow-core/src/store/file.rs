//! Store de documentos sobre el sistema de archivos: `<root>/<collection>/<id>.json`.
//!
//! Cada save escribe a un archivo temporal en el mismo directorio y luego lo
//! renombra sobre el destino, de modo que un lector ve el documento anterior o
//! el nuevo, nunca uno a medias.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde_json::Value;
use tempfile::NamedTempFile;

use super::{Collection, DocumentStore, StoreError};

#[derive(Debug, Clone)]
pub struct JsonFileDocumentStore {
    root: PathBuf,
}

impl JsonFileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        for c in Collection::ALL {
            fs::create_dir_all(root.join(c.as_str()))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.as_str())
    }

    fn path(&self, collection: Collection, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(StoreError::Backend(format!("invalid document id `{id}`")));
        }
        Ok(self.dir(collection).join(format!("{id}.json")))
    }
}

impl DocumentStore for JsonFileDocumentStore {
    fn load(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        let path = self.path(collection, id)?;
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { collection,
                                                  id: id.to_string() })
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&mut self, collection: Collection, id: &str, doc: &Value) -> Result<(), StoreError> {
        let path = self.path(collection, id)?;
        let dir = self.dir(collection);
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer(&mut tmp, doc)?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        debug!("saved {collection}/{id} -> {}", path.display());
        Ok(())
    }

    fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let path = self.path(collection, id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, collection: Collection) -> Result<Vec<(String, Value)>, StoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.dir(collection))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        ids.into_iter()
           .map(|id| self.load(collection, &id).map(|v| (id, v)))
           .collect()
    }
}

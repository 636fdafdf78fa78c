use std::collections::BTreeMap;

use serde_json::Value;

use super::{Collection, DocumentStore, StoreError};

/// Store en memoria; útil para tests y para la demo sin base de datos.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    pub inner: BTreeMap<(Collection, String), Value>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn load(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        self.inner
            .get(&(collection, id.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound { collection,
                                                  id: id.to_string() })
    }

    fn save(&mut self, collection: Collection, id: &str, doc: &Value) -> Result<(), StoreError> {
        self.inner.insert((collection, id.to_string()), doc.clone());
        Ok(())
    }

    fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.inner.remove(&(collection, id.to_string()));
        Ok(())
    }

    fn list(&self, collection: Collection) -> Result<Vec<(String, Value)>, StoreError> {
        Ok(self.inner
               .iter()
               .filter(|((c, _), _)| *c == collection)
               .map(|((_, id), v)| (id.clone(), v.clone()))
               .collect())
    }
}

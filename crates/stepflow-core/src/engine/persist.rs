//! Lectura y escritura de registros en el `DocumentStore`.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{EntityRef, Report, Warning, WorkflowEngine};
use crate::chain::{Catalog, ToolChain};
use crate::errors::EngineError;
use crate::extract::ExtractorNode;
use crate::model::{ChainId, ExtractorId, ToolId};
use crate::registry::Registry;
use crate::store::{ChainRecord, Collection, DocumentStore, ExtractorRecord, StoreError, ToolRecord};
use crate::tool::ToolNode;

fn decode<T: DeserializeOwned>(collection: Collection, id: &str, doc: Value) -> Result<T, EngineError> {
    serde_json::from_value(doc).map_err(|e| EngineError::Decode(format!("{collection}/{id}: {e}")))
}

/// Decodifica una colección entera y la ordena por creación. El orden del
/// store no es significativo; a igual `seq` se conserva el del listado.
fn load_sorted<S, T, F>(store: &S, collection: Collection, seq: F) -> Result<Vec<(String, T)>, EngineError>
    where S: DocumentStore,
          T: DeserializeOwned,
          F: Fn(&T) -> u64
{
    let mut records = Vec::new();
    for (id, doc) in store.list(collection)? {
        let rec: T = decode(collection, &id, doc)?;
        records.push((id, rec));
    }
    records.sort_by_key(|(_, rec)| seq(rec));
    Ok(records)
}

impl<S> WorkflowEngine<S> where S: DocumentStore
{
    /// Restaura todas las entidades guardadas en `store`, reconstruyendo
    /// fuentes y transformaciones con `registry`. Los caches de extractores
    /// quedan serializados hasta su primer uso.
    pub fn open(store: S, registry: &Registry) -> Result<Self, EngineError> {
        let mut catalog = Catalog::default();

        for (_, rec) in load_sorted(&store, Collection::Extractors, |r: &ExtractorRecord| r.seq)? {
            catalog.resume_seq_after(rec.seq);
            let source = registry.build_extractor(&rec.kind, &rec.config)?;
            let node = ExtractorNode::from_record(rec, source);
            catalog.extractors.insert(node.id, node);
        }
        for (id, rec) in load_sorted(&store, Collection::Chains, |r: &ChainRecord| r.seq)? {
            catalog.resume_seq_after(rec.seq);
            if !catalog.extractors.contains_key(&rec.extractor) {
                return Err(EngineError::Decode(format!("chains/{id}: references missing extractor {}", rec.extractor)));
            }
            let chain = ToolChain::from_record(rec);
            catalog.chains.insert(chain.id, chain);
        }
        for (id, rec) in load_sorted(&store, Collection::Tools, |r: &ToolRecord| r.seq)? {
            catalog.resume_seq_after(rec.seq);
            if !catalog.chains.contains_key(&rec.toolchain) {
                return Err(EngineError::Decode(format!("tools/{id}: references missing toolchain {}", rec.toolchain)));
            }
            let transform = registry.build_transform(&rec.kind, &rec.config)?;
            let node = ToolNode::from_record(rec, transform);
            catalog.tools.insert(node.id, node);
        }
        debug!("restored {} extractors, {} toolchains, {} tools",
               catalog.extractors.len(),
               catalog.chains.len(),
               catalog.tools.len());
        Ok(Self { catalog, store })
    }

    /// Reescribe todos los registros.
    pub fn save_all(&mut self) -> Report<()> {
        let mut warnings = Vec::new();
        let extractors: Vec<ExtractorId> = self.catalog.extractors.keys().copied().collect();
        let chains: Vec<ChainId> = self.catalog.chains.keys().copied().collect();
        let tools: Vec<ToolId> = self.catalog.tools.keys().copied().collect();
        for id in extractors {
            self.persist_extractor(id, &mut warnings);
        }
        for id in chains {
            self.persist_chain(id, &mut warnings);
        }
        for id in tools {
            self.persist_tool(id, &mut warnings);
        }
        Report::new((), warnings)
    }

    pub(crate) fn persist_extractor(&mut self, id: ExtractorId, warnings: &mut Vec<Warning>) {
        let Ok(node) = self.catalog.extractor(id) else {
            return;
        };
        let doc = serde_json::to_value(node.to_record());
        self.write(EntityRef::Extractor(id), doc, warnings);
    }

    pub(crate) fn persist_chain(&mut self, id: ChainId, warnings: &mut Vec<Warning>) {
        let Ok(chain) = self.catalog.chain(id) else {
            return;
        };
        let doc = serde_json::to_value(chain.to_record());
        self.write(EntityRef::Chain(id), doc, warnings);
    }

    pub(crate) fn persist_tool(&mut self, id: ToolId, warnings: &mut Vec<Warning>) {
        let Ok(node) = self.catalog.tool(id) else {
            return;
        };
        let doc = serde_json::to_value(node.to_record());
        self.write(EntityRef::Tool(id), doc, warnings);
    }

    fn write(&mut self, entity: EntityRef, doc: Result<Value, serde_json::Error>, warnings: &mut Vec<Warning>) {
        let outcome = doc.map_err(StoreError::from)
                         .and_then(|d| self.store.save(entity.collection(), &entity.id_string(), &d));
        match outcome {
            Ok(()) => debug!("saved {entity}"),
            Err(error) => {
                warn!("could not persist {entity}: {error}");
                warnings.push(Warning::PersistenceFailed { entity, error });
            }
        }
    }

    pub(crate) fn erase(&mut self, entity: EntityRef, warnings: &mut Vec<Warning>) {
        match self.store.delete(entity.collection(), &entity.id_string()) {
            Ok(()) => debug!("deleted {entity}"),
            Err(error) => {
                warn!("could not delete {entity}: {error}");
                warnings.push(Warning::PersistenceFailed { entity, error });
            }
        }
    }
}

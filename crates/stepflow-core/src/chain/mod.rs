//! ToolChain y consultas de grafo sobre el catálogo.
//!
//! El catálogo es la vista en memoria de todas las entidades. Las consultas
//! de traversal usan conjuntos de visitados, así un diamante se recorre una
//! sola vez y un ciclo corrupto en datos persistidos no recursa sin fin.

mod catalog;
mod queries;

use serde::{Deserialize, Serialize};

use crate::constants::RECORD_SCHEMA_VERSION;
use crate::model::{ChainId, ExtractorId};
use crate::store::ChainRecord;

pub use catalog::Catalog;
pub use queries::{ChainStats, HierarchyNode, NetworkNode, NodeRole};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolChain {
    pub id: ChainId,
    pub seq: u64,
    pub name: String,
    pub description: String,
    pub extractor: ExtractorId,
}

impl ToolChain {
    pub fn new(name: impl Into<String>, description: impl Into<String>, extractor: ExtractorId) -> Self {
        Self { id: ChainId::new(),
               seq: 0,
               name: name.into(),
               description: description.into(),
               extractor }
    }

    pub fn from_record(record: ChainRecord) -> Self {
        Self { id: record.id,
               seq: record.seq,
               name: record.name,
               description: record.description,
               extractor: record.extractor }
    }

    pub fn to_record(&self) -> ChainRecord {
        ChainRecord { schema_version: RECORD_SCHEMA_VERSION,
                      id: self.id,
                      seq: self.seq,
                      name: self.name.clone(),
                      description: self.description.clone(),
                      extractor: self.extractor }
    }
}

//! Motor de recomputación incremental.
//!
//! `WorkflowEngine` es dueño del catálogo en memoria y del handle al store.
//! Todas las operaciones que mutan estado toman `&mut self`: el préstamo
//! exclusivo serializa `run` / `clear_results` sobre el mismo engine, y
//! compartirlo entre hilos exige envolverlo en un `Mutex`.
//!
//! Submódulos:
//! - `core`: `get_data`, `run`, `clear_results` y la propagación.
//! - `edit`: altas, bajas, clonado, recableado y notas.
//! - `persist`: apertura desde un store y escritura de registros.

mod core;
mod edit;
mod options;
mod persist;
mod report;

pub use options::{ClearOptions, ExtractOptions, RunOptions};
pub use report::{EntityRef, Report, Warning};

use petgraph::graph::DiGraph;

use crate::chain::{Catalog, ChainStats, HierarchyNode, NetworkNode};
use crate::errors::EngineError;
use crate::model::{ChainId, ToolId};
use crate::store::DocumentStore;

#[derive(Debug)]
pub struct WorkflowEngine<S>
    where S: DocumentStore
{
    catalog: Catalog,
    store: S,
}

impl<S> WorkflowEngine<S> where S: DocumentStore
{
    /// Engine vacío sobre el store dado. Para restaurar entidades ya
    /// guardadas usar `WorkflowEngine::open`.
    pub fn new(store: S) -> Self {
        Self { catalog: Catalog::default(),
               store }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn get_all_tools(&self, chain: ChainId) -> Vec<ToolId> {
        self.catalog.get_all_tools(chain)
    }

    pub fn get_next_steps(&self, tool: ToolId) -> Vec<ToolId> {
        self.catalog.get_next_steps(tool)
    }

    pub fn get_all_next_steps(&self, tool: ToolId) -> Vec<ToolId> {
        self.catalog.get_all_next_steps(tool)
    }

    pub fn get_all_previous_steps(&self, tool: ToolId) -> Vec<ToolId> {
        self.catalog.get_all_previous_steps(tool)
    }

    pub fn get_acceptable_previous_steps(&self, tool: ToolId) -> Result<Vec<ToolId>, EngineError> {
        self.catalog.get_acceptable_previous_steps(tool)
    }

    pub fn get_tool_network(&self, chain: ChainId) -> Result<DiGraph<NetworkNode, ()>, EngineError> {
        self.catalog.get_tool_network(chain)
    }

    pub fn get_tool_hierarchy(&self, chain: ChainId) -> Result<HierarchyNode, EngineError> {
        self.catalog.get_tool_hierarchy(chain)
    }

    pub fn get_stats(&self, chain: ChainId) -> Result<ChainStats, EngineError> {
        self.catalog.get_stats(chain)
    }
}

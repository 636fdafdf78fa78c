use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};

use super::ToolChain;
use crate::errors::EngineError;
use crate::extract::ExtractorNode;
use crate::model::{ChainId, ExtractorId, ToolId};
use crate::tool::ToolNode;

/// Entidades vivas indexadas por id, en orden de creación.
#[derive(Debug, Default)]
pub struct Catalog {
    pub(crate) extractors: IndexMap<ExtractorId, ExtractorNode>,
    pub(crate) chains: IndexMap<ChainId, ToolChain>,
    pub(crate) tools: IndexMap<ToolId, ToolNode>,
    next_seq: u64,
}

impl Catalog {
    /// Número de creación para la próxima entidad.
    pub(crate) fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Tras restaurar, los números nuevos siguen después del mayor guardado.
    pub(crate) fn resume_seq_after(&mut self, seq: u64) {
        self.next_seq = self.next_seq.max(seq + 1);
    }

    pub fn extractor(&self, id: ExtractorId) -> Result<&ExtractorNode, EngineError> {
        self.extractors.get(&id).ok_or(EngineError::UnknownExtractor(id))
    }

    pub(crate) fn extractor_mut(&mut self, id: ExtractorId) -> Result<&mut ExtractorNode, EngineError> {
        self.extractors.get_mut(&id).ok_or(EngineError::UnknownExtractor(id))
    }

    pub fn chain(&self, id: ChainId) -> Result<&ToolChain, EngineError> {
        self.chains.get(&id).ok_or(EngineError::UnknownChain(id))
    }

    pub fn tool(&self, id: ToolId) -> Result<&ToolNode, EngineError> {
        self.tools.get(&id).ok_or(EngineError::UnknownTool(id))
    }

    pub(crate) fn tool_mut(&mut self, id: ToolId) -> Result<&mut ToolNode, EngineError> {
        self.tools.get_mut(&id).ok_or(EngineError::UnknownTool(id))
    }

    pub fn extractors(&self) -> impl Iterator<Item = &ExtractorNode> {
        self.extractors.values()
    }

    pub fn chains(&self) -> impl Iterator<Item = &ToolChain> {
        self.chains.values()
    }

    pub fn tools(&self) -> impl Iterator<Item = &ToolNode> {
        self.tools.values()
    }

    pub fn find_extractor(&self, name: &str) -> Option<ExtractorId> {
        self.extractors.values().find(|e| e.name == name).map(|e| e.id)
    }

    pub fn find_chain(&self, name: &str) -> Option<ChainId> {
        self.chains.values().find(|c| c.name == name).map(|c| c.id)
    }

    pub fn find_tool(&self, chain: ChainId, name: &str) -> Option<ToolId> {
        self.tools.values().find(|t| t.toolchain == chain && t.name == name).map(|t| t.id)
    }

    /// Extractor del que lee (directa o indirectamente) un tool.
    pub fn extractor_of(&self, tool: ToolId) -> Result<ExtractorId, EngineError> {
        let chain = self.tool(tool)?.toolchain;
        Ok(self.chain(chain)?.extractor)
    }

    /// Todos los tools de una chain, en orden de inserción.
    pub fn get_all_tools(&self, chain: ChainId) -> Vec<ToolId> {
        self.tools.values().filter(|t| t.toolchain == chain).map(|t| t.id).collect()
    }

    /// Tools (de cualquier chain) cuyo `previous_step` es `tool`.
    pub fn get_next_steps(&self, tool: ToolId) -> Vec<ToolId> {
        self.tools.values().filter(|t| t.previous_step == Some(tool)).map(|t| t.id).collect()
    }

    /// Clausura transitiva de `get_next_steps` en orden BFS.
    pub fn get_all_next_steps(&self, tool: ToolId) -> Vec<ToolId> {
        let mut seen: IndexSet<ToolId> = IndexSet::new();
        let mut frontier: VecDeque<ToolId> = self.get_next_steps(tool).into();
        while let Some(next) = frontier.pop_front() {
            if next == tool || !seen.insert(next) {
                continue;
            }
            frontier.extend(self.get_next_steps(next));
        }
        seen.into_iter().collect()
    }

    /// Ancestros del tool: primero el predecesor directo, la raíz al final.
    pub fn get_all_previous_steps(&self, tool: ToolId) -> Vec<ToolId> {
        let mut seen: IndexSet<ToolId> = IndexSet::new();
        let mut current = self.tools.get(&tool).and_then(|t| t.previous_step);
        while let Some(prev) = current {
            if prev == tool || !seen.insert(prev) {
                break;
            }
            current = self.tools.get(&prev).and_then(|t| t.previous_step);
        }
        seen.into_iter().collect()
    }

    /// Candidatos legales para `previous_step`: misma chain, sin el propio
    /// tool ni nada aguas abajo de él.
    pub fn get_acceptable_previous_steps(&self, tool: ToolId) -> Result<Vec<ToolId>, EngineError> {
        let chain = self.tool(tool)?.toolchain;
        let downstream: IndexSet<ToolId> = self.get_all_next_steps(tool).into_iter().collect();
        Ok(self.get_all_tools(chain)
               .into_iter()
               .filter(|t| *t != tool && !downstream.contains(t))
               .collect())
    }

    /// Tools alimentados directamente por el extractor, en todas las chains
    /// que lo usan.
    pub fn extractor_next_steps(&self, extractor: ExtractorId) -> Vec<ToolId> {
        self.tools
            .values()
            .filter(|t| {
                t.previous_step.is_none() && self.chains.get(&t.toolchain).is_some_and(|c| c.extractor == extractor)
            })
            .map(|t| t.id)
            .collect()
    }

    /// Raíces de una chain (tools sin predecesor).
    pub fn chain_roots(&self, chain: ChainId) -> Vec<ToolId> {
        self.tools
            .values()
            .filter(|t| t.toolchain == chain && t.previous_step.is_none())
            .map(|t| t.id)
            .collect()
    }

    /// Hijos de `tool` restringidos a su chain.
    pub(crate) fn chain_children(&self, chain: ChainId, tool: ToolId) -> Vec<ToolId> {
        self.tools
            .values()
            .filter(|t| t.toolchain == chain && t.previous_step == Some(tool))
            .map(|t| t.id)
            .collect()
    }

    pub fn name_taken_in_chain(&self, chain: ChainId, name: &str) -> bool {
        self.find_tool(chain, name).is_some()
    }
}

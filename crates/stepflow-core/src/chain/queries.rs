//! Vistas estructurales de una chain: red dirigida, jerarquía y estadísticas.

use std::collections::HashMap;

use indexmap::IndexSet;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::Catalog;
use crate::errors::EngineError;
use crate::model::{ChainId, ToolId};
use crate::tool::ToolStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Extractor,
    Tool,
}

/// Peso de un nodo en `get_tool_network`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkNode {
    pub id: String,
    pub name: String,
    pub role: NodeRole,
}

/// Árbol serializable enraizado en el extractor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub id: String,
    pub name: String,
    pub role: NodeRole,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ToolStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    pub children: Vec<HierarchyNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainStats {
    /// Nodos en el camino raíz-hoja más largo, contando el extractor.
    pub depth: usize,
    /// Cantidad de tools hoja.
    pub width: usize,
}

impl Catalog {
    /// Grafo dirigido `extractor -> tool` para tools sin predecesor y
    /// `previous_step -> tool` para el resto.
    pub fn get_tool_network(&self, chain: ChainId) -> Result<DiGraph<NetworkNode, ()>, EngineError> {
        let c = self.chain(chain)?;
        let ext = self.extractor(c.extractor)?;
        let mut graph = DiGraph::new();
        let root = graph.add_node(NetworkNode { id: ext.id.to_string(),
                                                name: ext.name.clone(),
                                                role: NodeRole::Extractor });
        let mut index: HashMap<ToolId, NodeIndex> = HashMap::new();
        let tools = self.get_all_tools(chain);
        for id in &tools {
            let t = self.tool(*id)?;
            let ix = graph.add_node(NetworkNode { id: t.id.to_string(),
                                                  name: t.name.clone(),
                                                  role: NodeRole::Tool });
            index.insert(*id, ix);
        }
        for id in &tools {
            let t = self.tool(*id)?;
            let from = match t.previous_step {
                None => Some(root),
                Some(prev) => index.get(&prev).copied(),
            };
            if let (Some(from), Some(to)) = (from, index.get(id).copied()) {
                graph.add_edge(from, to, ());
            }
        }
        Ok(graph)
    }

    pub fn get_tool_hierarchy(&self, chain: ChainId) -> Result<HierarchyNode, EngineError> {
        let c = self.chain(chain)?;
        let ext = self.extractor(c.extractor)?;
        let mut visited = IndexSet::new();
        let mut children = Vec::new();
        for root in self.chain_roots(chain) {
            children.push(self.hierarchy_of(chain, root, &mut visited)?);
        }
        Ok(HierarchyNode { id: ext.id.to_string(),
                           name: ext.name.clone(),
                           role: NodeRole::Extractor,
                           kind: ext.source().kind().to_string(),
                           status: None,
                           fingerprint: None,
                           children })
    }

    fn hierarchy_of(&self,
                    chain: ChainId,
                    tool: ToolId,
                    visited: &mut IndexSet<ToolId>)
                    -> Result<HierarchyNode, EngineError> {
        visited.insert(tool);
        let t = self.tool(tool)?;
        let mut children = Vec::new();
        for child in self.chain_children(chain, tool) {
            if !visited.contains(&child) {
                children.push(self.hierarchy_of(chain, child, visited)?);
            }
        }
        Ok(HierarchyNode { id: t.id.to_string(),
                           name: t.name.clone(),
                           role: NodeRole::Tool,
                           kind: t.transform().kind().to_string(),
                           status: Some(t.status()),
                           fingerprint: t.fingerprint(),
                           children })
    }

    /// `depth` y `width` por descenso recursivo sin memo; una chain sin tools
    /// devuelve 1/1.
    pub fn get_stats(&self, chain: ChainId) -> Result<ChainStats, EngineError> {
        self.chain(chain)?;
        let roots = self.chain_roots(chain);
        if roots.is_empty() {
            return Ok(ChainStats { depth: 1, width: 1 });
        }
        let mut depth = 0;
        let mut width = 0;
        for root in roots {
            let mut visited = IndexSet::new();
            depth = depth.max(self.depth_of(chain, root, &mut visited));
            let mut visited = IndexSet::new();
            width += self.width_of(chain, root, &mut visited);
        }
        Ok(ChainStats { depth: depth + 1,
                        width })
    }

    fn depth_of(&self, chain: ChainId, tool: ToolId, visited: &mut IndexSet<ToolId>) -> usize {
        if !visited.insert(tool) {
            return 0;
        }
        let deepest = self.chain_children(chain, tool)
                          .into_iter()
                          .map(|c| self.depth_of(chain, c, visited))
                          .max()
                          .unwrap_or(0);
        visited.shift_remove(&tool);
        deepest + 1
    }

    fn width_of(&self, chain: ChainId, tool: ToolId, visited: &mut IndexSet<ToolId>) -> usize {
        if !visited.insert(tool) {
            return 0;
        }
        let children = self.chain_children(chain, tool);
        if children.is_empty() {
            return 1;
        }
        children.into_iter().map(|c| self.width_of(chain, c, visited)).sum()
    }
}

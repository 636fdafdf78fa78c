//! Altas, bajas y recableado de entidades.
//!
//! Todas las validaciones (nombres, ciclos, enlaces) ocurren antes de mutar
//! el catálogo. Cada cambio se persiste al final; un fallo del store queda
//! como warning.

use std::collections::HashSet;

use log::info;

use super::{ClearOptions, EntityRef, Report, Warning, WorkflowEngine};
use crate::chain::ToolChain;
use crate::errors::EngineError;
use crate::extract::{Extractable, ExtractorNode};
use crate::model::{validate_name, ChainId, ExtractorId, Note, ToolId};
use crate::store::DocumentStore;
use crate::tool::{ToolNode, Transformable};

fn check_name(name: &str) -> Result<(), EngineError> {
    if validate_name(name) {
        Ok(())
    } else {
        Err(EngineError::InvalidName(name.to_string()))
    }
}

impl<S> WorkflowEngine<S> where S: DocumentStore
{
    pub fn add_extractor(&mut self,
                         name: &str,
                         description: &str,
                         source: Box<dyn Extractable>)
                         -> Result<Report<ExtractorId>, EngineError> {
        check_name(name)?;
        if self.catalog.find_extractor(name).is_some() {
            return Err(EngineError::DuplicateName { scope: "extractors".into(),
                                                    name: name.to_string() });
        }
        let mut node = ExtractorNode::new(name, description, source);
        node.seq = self.catalog.next_seq();
        let id = node.id;
        self.catalog.extractors.insert(id, node);
        let mut warnings = Vec::new();
        self.persist_extractor(id, &mut warnings);
        Ok(Report::new(id, warnings))
    }

    pub fn add_chain(&mut self,
                     name: &str,
                     description: &str,
                     extractor: ExtractorId)
                     -> Result<Report<ChainId>, EngineError> {
        check_name(name)?;
        self.catalog.extractor(extractor)?;
        if self.catalog.find_chain(name).is_some() {
            return Err(EngineError::DuplicateName { scope: "toolchains".into(),
                                                    name: name.to_string() });
        }
        let mut chain = ToolChain::new(name, description, extractor);
        chain.seq = self.catalog.next_seq();
        let id = chain.id;
        self.catalog.chains.insert(id, chain);
        let mut warnings = Vec::new();
        self.persist_chain(id, &mut warnings);
        Ok(Report::new(id, warnings))
    }

    /// Agrega un tool a la chain. `previous_step = None` lo alimenta desde el
    /// extractor de la chain.
    pub fn add_tool(&mut self,
                    chain: ChainId,
                    name: &str,
                    description: &str,
                    previous_step: Option<ToolId>,
                    transform: Box<dyn Transformable>)
                    -> Result<Report<ToolId>, EngineError> {
        check_name(name)?;
        let chain_name = self.catalog.chain(chain)?.name.clone();
        if self.catalog.name_taken_in_chain(chain, name) {
            return Err(EngineError::DuplicateName { scope: format!("toolchain `{chain_name}`"),
                                                    name: name.to_string() });
        }
        if let Some(prev) = previous_step {
            if self.catalog.tool(prev)?.toolchain != chain {
                return Err(EngineError::CycleRejected { tool: name.to_string(),
                                                        reason: "previous step belongs to another toolchain".into() });
            }
        }
        if let Some(link) = transform.linked_artifacts() {
            if link.chain == chain_name {
                return Err(EngineError::InvalidLink { tool: name.to_string(),
                                                      reason: "linked tool may not be from the same toolchain".into() });
            }
        }
        let mut node = ToolNode::new(name, description, chain, previous_step, transform);
        node.seq = self.catalog.next_seq();
        let id = node.id;
        self.catalog.tools.insert(id, node);
        let mut warnings = Vec::new();
        self.persist_tool(id, &mut warnings);
        Ok(Report::new(id, warnings))
    }

    /// Recablea el predecesor de un tool. Rechaza (sin mutar) cualquier
    /// asignación que cierre un ciclo o cruce chains; si acepta, el tool y
    /// todo lo que depende de él quedan invalidados.
    pub fn set_previous_step(&mut self,
                             tool: ToolId,
                             previous_step: Option<ToolId>,
                             save: bool)
                             -> Result<Report<()>, EngineError> {
        let node = self.catalog.tool(tool)?;
        let name = node.name.clone();
        let chain = node.toolchain;
        if let Some(prev) = previous_step {
            let target = self.catalog.tool(prev)?;
            let reason = if prev == tool {
                Some("a tool cannot be its own previous step")
            } else if target.toolchain != chain {
                Some("previous step belongs to another toolchain")
            } else if !self.catalog.get_acceptable_previous_steps(tool)?.contains(&prev) {
                Some("previous step is downstream of this tool")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(EngineError::CycleRejected { tool: name,
                                                        reason: reason.into() });
            }
        }
        self.catalog.tool_mut(tool)?.previous_step = previous_step;
        let mut warnings = Vec::new();
        self.clear_inner(tool, ClearOptions::downstream(save), &mut HashSet::new(), &mut warnings);
        Ok(Report::new((), warnings))
    }

    /// Borra un tool. Con `update_dependencies` los hijos directos pasan a
    /// colgar del predecesor del tool borrado (y se invalidan, porque cambió
    /// su entrada); sin él se borra todo el subárbol.
    pub fn delete_tool(&mut self, tool: ToolId, update_dependencies: bool) -> Result<Report<()>, EngineError> {
        let node = self.catalog.tool(tool)?;
        info!("Deleting {}", node.name);
        let previous_step = node.previous_step;
        let mut warnings = Vec::new();
        if update_dependencies {
            for child in self.catalog.get_next_steps(tool) {
                self.catalog.tool_mut(child)?.previous_step = previous_step;
                self.clear_inner(child, ClearOptions::downstream(true), &mut HashSet::new(), &mut warnings);
            }
            self.remove_tool(tool, &mut warnings);
        } else {
            for doomed in self.catalog.get_all_next_steps(tool) {
                self.remove_tool(doomed, &mut warnings);
            }
            self.remove_tool(tool, &mut warnings);
        }
        Ok(Report::new((), warnings))
    }

    /// Borra la chain y todos sus tools. El extractor se conserva: puede
    /// alimentar otras chains.
    pub fn delete_chain(&mut self, chain: ChainId) -> Result<Report<()>, EngineError> {
        info!("Deleting toolchain {}", self.catalog.chain(chain)?.name);
        let mut warnings = Vec::new();
        for tool in self.catalog.get_all_tools(chain) {
            self.remove_tool(tool, &mut warnings);
        }
        self.catalog.chains.shift_remove(&chain);
        self.erase(EntityRef::Chain(chain), &mut warnings);
        Ok(Report::new((), warnings))
    }

    pub fn delete_extractor(&mut self, extractor: ExtractorId) -> Result<Report<()>, EngineError> {
        let name = self.catalog.extractor(extractor)?.name.clone();
        if self.catalog.chains().any(|c| c.extractor == extractor) {
            return Err(EngineError::ExtractorInUse(name));
        }
        info!("Deleting extractor {name}");
        self.catalog.extractors.shift_remove(&extractor);
        let mut warnings = Vec::new();
        self.erase(EntityRef::Extractor(extractor), &mut warnings);
        Ok(Report::new((), warnings))
    }

    /// Copia un tool en su misma chain: misma configuración, sin
    /// predecesor, sin resultado y sin notas. El nombre por defecto es
    /// `{nombre}_copy`.
    pub fn clone_tool(&mut self,
                      tool: ToolId,
                      name: Option<&str>,
                      description: Option<&str>)
                      -> Result<Report<ToolId>, EngineError> {
        let node = self.catalog.tool(tool)?;
        let name = name.map(str::to_string).unwrap_or_else(|| format!("{}_copy", node.name));
        let description = description.map(str::to_string).unwrap_or_else(|| node.description.clone());
        check_name(&name)?;
        if self.catalog.name_taken_in_chain(node.toolchain, &name) {
            let chain_name = &self.catalog.chain(node.toolchain)?.name;
            return Err(EngineError::DuplicateName { scope: format!("toolchain `{chain_name}`"),
                                                    name });
        }
        let mut copy = node.fresh_clone(name, description);
        copy.seq = self.catalog.next_seq();
        let id = copy.id;
        self.catalog.tools.insert(id, copy);
        let mut warnings = Vec::new();
        self.persist_tool(id, &mut warnings);
        Ok(Report::new(id, warnings))
    }

    /// Devuelve el índice de la nota agregada.
    pub fn add_note(&mut self, tool: ToolId, text: &str, author: &str) -> Result<Report<usize>, EngineError> {
        let node = self.catalog.tool_mut(tool)?;
        node.notes.push(Note::new(text, author));
        let index = node.notes.len() - 1;
        let mut warnings = Vec::new();
        self.persist_tool(tool, &mut warnings);
        Ok(Report::new(index, warnings))
    }

    pub fn edit_note(&mut self, tool: ToolId, index: usize, text: &str) -> Result<Report<()>, EngineError> {
        let node = self.catalog.tool_mut(tool)?;
        let tool_name = node.name.clone();
        let note = node.notes
                       .get_mut(index)
                       .ok_or(EngineError::UnknownNote { tool: tool_name, index })?;
        note.set_text(text);
        let mut warnings = Vec::new();
        self.persist_tool(tool, &mut warnings);
        Ok(Report::new((), warnings))
    }

    fn remove_tool(&mut self, tool: ToolId, warnings: &mut Vec<Warning>) {
        if self.catalog.tools.shift_remove(&tool).is_some() {
            self.erase(EntityRef::Tool(tool), warnings);
        }
    }
}

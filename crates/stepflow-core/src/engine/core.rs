//! Máquina de estados de cache y propagación.
//!
//! Reglas:
//! - Un tool `Valid` devuelve su resultado sin recomputar; la transformación
//!   corre a lo sumo una vez entre invalidaciones.
//! - Toda recomputación (de extractor o de tool) se propaga a los hijos
//!   directos: re-ejecución forzada si `run_subsequent`, si no invalidación
//!   recursiva.
//! - El nodo actual se persiste antes de propagar. La cascada hereda el
//!   `save_results` de la llamada que la origina.
//! - En cascada, un hijo que falla queda como warning, su subárbol se
//!   invalida y los hermanos siguen corriendo.

use std::collections::HashSet;

use log::{debug, info, warn};

use super::{ClearOptions, ExtractOptions, Report, RunOptions, Warning, WorkflowEngine};
use crate::constants::DATA_KEY;
use crate::errors::{EngineError, TransformError};
use crate::model::{Artifact, ArtifactMap, ExtractorId, Table, ToolId};
use crate::store::DocumentStore;
use crate::tool::LinkSpec;

impl<S> WorkflowEngine<S> where S: DocumentStore
{
    /// Tabla del extractor. Extrae si no hay cache válido o si
    /// `ignore_cache`; una extracción fallida deja el cache anterior intacto.
    pub fn get_data(&mut self, extractor: ExtractorId, opts: ExtractOptions) -> Result<Report<Table>, EngineError> {
        let mut warnings = Vec::new();
        let table = self.get_data_inner(extractor, opts, &mut warnings)?;
        Ok(Report::new(table, warnings))
    }

    /// `Cached -> Stale`: el próximo `get_data` re-extrae. No propaga.
    pub fn mark_stale(&mut self, extractor: ExtractorId, save: bool) -> Result<Report<bool>, EngineError> {
        let marked = self.catalog.extractor_mut(extractor)?.mark_stale();
        let mut warnings = Vec::new();
        if marked && save {
            self.persist_extractor(extractor, &mut warnings);
        }
        Ok(Report::new(marked, warnings))
    }

    /// Mapa de entradas del tool; siempre contiene `data`.
    pub fn get_input(&mut self, tool: ToolId, save_results: bool) -> Result<Report<ArtifactMap>, EngineError> {
        let mut warnings = Vec::new();
        let inputs = self.get_input_inner(tool, save_results, &mut Vec::new(), &mut warnings)?;
        Ok(Report::new(inputs, warnings))
    }

    pub fn run(&mut self, tool: ToolId, opts: RunOptions) -> Result<Report<ArtifactMap>, EngineError> {
        let mut warnings = Vec::new();
        let result = self.run_inner(tool, opts, &mut Vec::new(), &mut warnings)?;
        Ok(Report::new(result, warnings))
    }

    /// La tabla `data` que produce `run`.
    pub fn get_tool_data(&mut self, tool: ToolId, opts: RunOptions) -> Result<Report<Table>, EngineError> {
        let report = self.run(tool, opts)?;
        let name = self.catalog.tool(tool)?.name.clone();
        let table = report.value
                          .get(DATA_KEY)
                          .ok_or(EngineError::MissingDataInput { tool: name })?
                          .decode_table()?;
        Ok(Report::new(table, report.warnings))
    }

    pub fn clear_results(&mut self, tool: ToolId, opts: ClearOptions) -> Result<Report<()>, EngineError> {
        self.catalog.tool(tool)?;
        let mut warnings = Vec::new();
        self.clear_inner(tool, opts, &mut HashSet::new(), &mut warnings);
        Ok(Report::new((), warnings))
    }

    pub(crate) fn get_data_inner(&mut self,
                                 extractor: ExtractorId,
                                 opts: ExtractOptions,
                                 warnings: &mut Vec<Warning>)
                                 -> Result<Table, EngineError> {
        let node = self.catalog.extractor_mut(extractor)?;
        if !opts.ignore_cache {
            if let Some(table) = node.cached_table() {
                return Ok(table.clone());
            }
        }
        info!("Extracting {}", node.name);
        let table = node.extract()
                        .and_then(|table| {
                            table.validate()?;
                            Ok(table)
                        })
                        .map_err(|source| EngineError::ExtractionFailed { extractor: node.name.clone(),
                                                                          source })?;
        node.store_extraction(table.clone());
        if opts.save_results {
            self.persist_extractor(extractor, warnings);
        }
        let children = self.catalog.extractor_next_steps(extractor);
        self.propagate(children, opts.run_subsequent, opts.save_results, &mut Vec::new(), warnings);
        Ok(table)
    }

    fn get_input_inner(&mut self,
                       tool: ToolId,
                       save_results: bool,
                       stack: &mut Vec<ToolId>,
                       warnings: &mut Vec<Warning>)
                       -> Result<ArtifactMap, EngineError> {
        let node = self.catalog.tool(tool)?;
        let name = node.name.clone();
        let previous_step = node.previous_step;
        let inputs = match previous_step {
            None => {
                let extractor = self.catalog.extractor_of(tool)?;
                let opts = ExtractOptions::default().save_results(save_results);
                let table = self.get_data_inner(extractor, opts, warnings)?;
                let mut inputs = ArtifactMap::new();
                inputs.insert(DATA_KEY.to_string(), Artifact::table(DATA_KEY, &table)?);
                inputs
            }
            Some(prev) => {
                let opts = RunOptions::default().save_results(save_results);
                self.run_inner(prev, opts, stack, warnings)?
            }
        };
        if !inputs.contains_key(DATA_KEY) {
            return Err(EngineError::MissingDataInput { tool: name });
        }
        Ok(inputs)
    }

    pub(crate) fn run_inner(&mut self,
                            tool: ToolId,
                            opts: RunOptions,
                            stack: &mut Vec<ToolId>,
                            warnings: &mut Vec<Warning>)
                            -> Result<ArtifactMap, EngineError> {
        if opts.ignore_results {
            self.catalog.tool_mut(tool)?.invalidate();
        }
        let node = self.catalog.tool(tool)?;
        if let Some(result) = node.result() {
            return Ok(result.clone());
        }
        if stack.contains(&tool) {
            return Err(EngineError::CycleRejected { tool: node.name.clone(),
                                                    reason: "tool is reached again while computing its own input".into() });
        }

        stack.push(tool);
        let outcome = self.compute(tool, opts.save_results, stack, warnings);
        stack.pop();

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                if opts.ignore_results && opts.save_results {
                    self.persist_tool(tool, warnings);
                }
                return Err(e);
            }
        };
        let children = self.catalog.get_next_steps(tool);
        self.propagate(children, opts.run_subsequent, opts.save_results, stack, warnings);
        Ok(result)
    }

    fn compute(&mut self,
               tool: ToolId,
               save_results: bool,
               stack: &mut Vec<ToolId>,
               warnings: &mut Vec<Warning>)
               -> Result<ArtifactMap, EngineError> {
        let name = self.catalog.tool(tool)?.name.clone();
        info!("Running {name}");
        let mut inputs = self.get_input_inner(tool, save_results, stack, warnings)?;
        let data = inputs.remove(DATA_KEY)
                         .ok_or_else(|| EngineError::MissingDataInput { tool: name.clone() })?;
        if let Some(link) = self.catalog.tool(tool)?.transform().linked_artifacts() {
            self.inject_linked(tool, &link, &mut inputs, save_results, stack, warnings)?;
        }
        let table = data.decode_table()?;

        let (new_data, mut result) =
            self.catalog
                .tool(tool)?
                .transform()
                .transform(table, &inputs)
                .and_then(|(new_data, result)| {
                    new_data.validate()?;
                    if let Some((key, artifact)) = result.iter().find(|(key, a)| **key != a.name) {
                        return Err(TransformError::MisnamedArtifact { key: key.clone(),
                                                                      name: artifact.name.clone() });
                    }
                    Ok((new_data, result))
                })
                .map_err(|source| EngineError::TransformFailed { tool: name.clone(),
                                                                 source })?;
        result.insert(DATA_KEY.to_string(), Artifact::table(DATA_KEY, &new_data)?);

        self.catalog.tool_mut(tool)?.set_result(result.clone());
        if save_results {
            self.persist_tool(tool, warnings);
        }
        Ok(result)
    }

    /// Corre el tool enlazado (de otra chain) y agrega sus artifacts a las
    /// entradas con el nombre `{artifact}_{tool}`.
    fn inject_linked(&mut self,
                     tool: ToolId,
                     link: &LinkSpec,
                     inputs: &mut ArtifactMap,
                     save_results: bool,
                     stack: &mut Vec<ToolId>,
                     warnings: &mut Vec<Warning>)
                     -> Result<(), EngineError> {
        let node = self.catalog.tool(tool)?;
        let name = node.name.clone();
        let own_chain = node.toolchain;
        let invalid = |reason: String| EngineError::InvalidLink { tool: name.clone(), reason };

        let chain = self.catalog
                        .find_chain(&link.chain)
                        .ok_or_else(|| invalid(format!("unknown toolchain `{}`", link.chain)))?;
        if chain == own_chain {
            return Err(invalid("linked tool may not be from the same toolchain".into()));
        }
        let linked = self.catalog
                         .find_tool(chain, &link.tool)
                         .ok_or_else(|| invalid(format!("no tool `{}` in toolchain `{}`", link.tool, link.chain)))?;
        debug!("{name}: pulling {:?} from {}", link.artifacts, link.tool);
        let linked_result = self.run_inner(linked, RunOptions::default().save_results(save_results), stack, warnings)?;
        for art in &link.artifacts {
            let found = linked_result.get(art)
                                     .ok_or_else(|| invalid(format!("`{}` produced no artifact `{art}`", link.tool)))?;
            let renamed = link.injected_name(art);
            inputs.insert(renamed.clone(), found.renamed(renamed)?);
        }
        Ok(())
    }

    /// Aplica la política de propagación a los hijos directos. `save_results`
    /// vale tanto para las re-ejecuciones como para las invalidaciones.
    fn propagate(&mut self,
                 children: Vec<ToolId>,
                 eager: bool,
                 save_results: bool,
                 stack: &mut Vec<ToolId>,
                 warnings: &mut Vec<Warning>) {
        for child in children {
            if eager {
                debug!("cascade run of {child}");
                let opts = RunOptions::forced().save_results(save_results);
                if let Err(error) = self.run_inner(child, opts, stack, warnings) {
                    let name = self.catalog.tool(child).map(|t| t.name.clone()).unwrap_or_default();
                    warn!("cascade run of {name} failed: {error}");
                    warnings.push(Warning::CascadeFailed { tool: child,
                                                           name,
                                                           error: Box::new(error) });
                    self.clear_inner(child, ClearOptions::downstream(save_results), &mut HashSet::new(), warnings);
                }
            } else {
                debug!("cascade invalidation of {child}");
                self.clear_inner(child, ClearOptions::downstream(save_results), &mut HashSet::new(), warnings);
            }
        }
    }

    pub(crate) fn clear_inner(&mut self,
                              tool: ToolId,
                              opts: ClearOptions,
                              visited: &mut HashSet<ToolId>,
                              warnings: &mut Vec<Warning>) {
        if !visited.insert(tool) {
            return;
        }
        let Ok(node) = self.catalog.tool_mut(tool) else {
            return;
        };
        info!("Clearing {}", node.name);
        node.invalidate();
        if opts.save {
            self.persist_tool(tool, warnings);
        }
        if opts.clear_next_steps {
            for child in self.catalog.get_next_steps(tool) {
                self.clear_inner(child, opts, visited, warnings);
            }
        }
    }
}

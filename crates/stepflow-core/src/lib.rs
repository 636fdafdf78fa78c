//! stepflow-core: motor de recomputación incremental para cadenas de tools.
//!
//! Una `ToolChain` tiene exactamente un `Extractor` (fuente de datos) y un
//! árbol de tools; cada tool consume el resultado de su paso previo, lo
//! transforma y cachea su propio mapa de artifacts. El motor decide cuándo un
//! resultado cacheado es válido y cómo se propaga la invalidación aguas abajo
//! (recomputación eager o invalidación lazy).
//!
//! Módulos:
//! - `model`: artifacts, tablas, notas e identificadores.
//! - `render`: formatos de salida por tipo de artifact.
//! - `extract` / `tool`: nodos con su máquina de estados de cache.
//! - `chain`: catálogo y consultas de grafo (network, hierarchy, stats).
//! - `engine`: `WorkflowEngine` (run, clear, get_data, propagación).
//! - `registry`: fábricas `kind -> componente` pobladas al arrancar.
//! - `store`: contrato `DocumentStore` e implementaciones locales.

pub mod chain;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod hashing;
pub mod model;
pub mod registry;
pub mod render;
pub mod store;
pub mod tool;

pub use chain::{Catalog, ChainStats, HierarchyNode, NetworkNode, NodeRole, ToolChain};
pub use engine::{ClearOptions, EntityRef, ExtractOptions, Report, RunOptions, Warning, WorkflowEngine};
pub use errors::{EngineError, ExtractError, TransformError};
pub use extract::{Extractable, ExtractorNode, ExtractorStatus};
pub use model::{Artifact, ArtifactError, ArtifactKind, ArtifactMap, ChainId, ExtractorId, Note, PlotSeries, PlotSpec, Table,
                TableError, ToolId};
pub use registry::{from_config, Registry, RegistryError};
pub use render::{FormatDescriptor, JsonOrient, RenderError, RenderOptions, Renderable};
pub use store::{Collection, DocumentStore, InMemoryDocumentStore, JsonFileDocumentStore, StoreError};
pub use tool::{result_fingerprint, LinkSpec, ToolNode, ToolState, ToolStatus, Transformable};

//! Transformaciones concretas.
//!
//! Salvo `link`, todas son funciones puras de `data` y su configuración. Las
//! que no producen artifacts propios devuelven un mapa vacío; `decision` y
//! `link` reexponen las entradas extra que recibieron.

mod decision;
mod filter;
mod link;
mod simple;
mod simple_eval;
mod summary;

pub use decision::{Decision, DecisionTool};
pub use filter::{Clause, Comparison, FilterTool, Literal, Query, QueryError};
pub use link::LinkTool;
pub use simple::{ColumnAddTool, RequiredFieldTool};
pub use simple_eval::{EvalExpr, SimpleEvalTool};
pub use summary::SummaryTool;

use serde_json::Value;
use stepflow_core::{from_config, Registry, RegistryError, Transformable};

fn build<T>(kind: &str, config: &Value) -> Result<Box<dyn Transformable>, RegistryError>
    where T: Transformable + serde::de::DeserializeOwned + 'static
{
    Ok(Box::new(from_config::<T>(kind, config)?))
}

pub(crate) fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_transform(FilterTool::KIND, |c| build::<FilterTool>(FilterTool::KIND, c))?;
    registry.register_transform(RequiredFieldTool::KIND, |c| build::<RequiredFieldTool>(RequiredFieldTool::KIND, c))?;
    registry.register_transform(ColumnAddTool::KIND, |c| build::<ColumnAddTool>(ColumnAddTool::KIND, c))?;
    registry.register_transform(SimpleEvalTool::KIND, |c| build::<SimpleEvalTool>(SimpleEvalTool::KIND, c))?;
    registry.register_transform(DecisionTool::KIND, |c| build::<DecisionTool>(DecisionTool::KIND, c))?;
    registry.register_transform(SummaryTool::KIND, |c| build::<SummaryTool>(SummaryTool::KIND, c))?;
    registry.register_transform(LinkTool::KIND, |c| build::<LinkTool>(LinkTool::KIND, c))?;
    Ok(())
}


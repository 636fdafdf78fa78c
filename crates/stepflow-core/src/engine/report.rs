//! Resultado de una operación del engine junto con sus advertencias.
//!
//! Un fallo de persistencia o de un nodo en cascada no anula el cómputo que
//! lo originó: se devuelve el valor y la lista de `Warning`.

use std::fmt;

use crate::errors::EngineError;
use crate::model::{ChainId, ExtractorId, ToolId};
use crate::store::{Collection, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Extractor(ExtractorId),
    Chain(ChainId),
    Tool(ToolId),
}

impl EntityRef {
    pub fn collection(&self) -> Collection {
        match self {
            EntityRef::Extractor(_) => Collection::Extractors,
            EntityRef::Chain(_) => Collection::Chains,
            EntityRef::Tool(_) => Collection::Tools,
        }
    }

    pub fn id_string(&self) -> String {
        match self {
            EntityRef::Extractor(id) => id.to_string(),
            EntityRef::Chain(id) => id.to_string(),
            EntityRef::Tool(id) => id.to_string(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection(), self.id_string())
    }
}

#[derive(Debug)]
pub enum Warning {
    /// El store rechazó un save/delete; el estado en memoria se mantiene.
    PersistenceFailed { entity: EntityRef, error: StoreError },
    /// Un tool falló durante una recomputación en cascada; su subárbol quedó
    /// invalidado.
    CascadeFailed {
        tool: ToolId,
        name: String,
        error: Box<EngineError>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::PersistenceFailed { entity, error } => write!(f, "could not persist {entity}: {error}"),
            Warning::CascadeFailed { name, error, .. } => write!(f, "cascade stopped at `{name}`: {error}"),
        }
    }
}

#[derive(Debug)]
pub struct Report<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Report<T> {
    pub fn new(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }

    pub fn clean(value: T) -> Self {
        Self { value,
               warnings: Vec::new() }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Report<U> {
        Report { value: f(self.value),
                 warnings: self.warnings }
    }

    pub fn persistence_failures(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(|w| matches!(w, Warning::PersistenceFailed { .. }))
    }

    pub fn cascade_failures(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(|w| matches!(w, Warning::CascadeFailed { .. }))
    }
}

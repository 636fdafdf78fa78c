//! stepflow-adapters: fuentes y transformaciones concretas.
//!
//! El core sólo conoce los traits `Extractable` y `Transformable`; aquí viven
//! las implementaciones que un workflow real necesita (CSV, JSON local o por
//! HTTP, filtros, columnas derivadas, decisiones manuales, resúmenes y
//! enlaces entre chains) y la función que las registra por `kind`.

pub mod extractors;
pub mod records;
pub mod tools;

use stepflow_core::{Registry, RegistryError};

/// Registra todos los kinds de este crate.
pub fn register_builtins(registry: &mut Registry) -> Result<(), RegistryError> {
    extractors::register(registry)?;
    tools::register(registry)?;
    Ok(())
}

/// Registro con los built-ins ya cargados.
pub fn builtin_registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    register_builtins(&mut registry)?;
    Ok(registry)
}

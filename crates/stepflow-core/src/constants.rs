//! Constantes del motor core.
//!
//! Agrupa valores estáticos que participan en los registros persistidos y en
//! el fingerprint de resultados. Cambiar `RECORD_SCHEMA_VERSION` obliga a
//! migrar los documentos ya guardados.

/// Versión lógica del motor. Se incluye en el fingerprint de un mapa de
/// resultados para que un cambio de versión produzca fingerprints distintos.
pub const ENGINE_VERSION: &str = "SF1.0";

/// Versión del esquema de los documentos persistidos (extractor, chain, tool).
pub const RECORD_SCHEMA_VERSION: u32 = 1;

/// Clave obligatoria del artifact principal que fluye entre pasos.
pub const DATA_KEY: &str = "data";

//! stepflow-persistence
//!
//! `DocumentStore` sobre Postgres (Diesel + r2d2). Cada entidad del engine
//! es una fila de `documents(collection, id, body, updated_at)`.
//!
//! Módulos:
//! - `pg`: pool, store y reintentos ante errores transitorios.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: configuración de conexión desde `.env` / entorno.
//! - `schema`: tabla Diesel.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_env, PgDocumentStore, PgPool};

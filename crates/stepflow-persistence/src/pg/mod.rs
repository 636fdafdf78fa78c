//! `DocumentStore` sobre Postgres.
//!
//! - Un documento por fila; la clave es `(collection, id)`.
//! - `save` es un único `INSERT .. ON CONFLICT DO UPDATE` dentro de una
//!   transacción read-write: el documento se reemplaza entero o no cambia.
//! - Errores transitorios (pool, serialización, desconexiones) se reintentan
//!   con backoff corto antes de subir como `StoreError::Backend`.

use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, PooledConnection};
use diesel::upsert::excluded;
use log::{debug, warn};
use serde_json::Value;
use stepflow_core::{Collection, DocumentStore, StoreError};

use crate::config::DbConfig;
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::documents;

/// Pool r2d2 de conexiones Postgres. Al construirlo se corren las migraciones
/// pendientes.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

type PgConn = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Insertable, Debug)]
#[diesel(table_name = documents)]
struct NewDocument<'a> {
    collection: &'a str,
    id: &'a str,
    body: &'a Value,
}

/// Hasta 3 reintentos con backoff lineal (15ms, 30ms, 45ms).
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if e.is_retryable() && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {e} -> sleeping {delay_ms}ms", attempts + 1);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Construye el pool y corre las migraciones. `min_size > max_size` se
/// ajusta a `min = max`.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let max = max_size.max(1);
    let min = min_size.max(1).min(max);
    if min_size > max {
        warn!("min_size > max_size ({min_size} > {max}), using min=max");
    }
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(min))
                                    .max_size(max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Lee `.env` / entorno y construye un pool ya migrado.
pub fn build_pool_from_env() -> Result<PgPool, PersistenceError> {
    let cfg = DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl std::fmt::Debug for PgDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDocumentStore")
         .field("connections", &self.pool.state().connections)
         .finish()
    }
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn connect(cfg: &DbConfig) -> Result<Self, PersistenceError> {
        Ok(Self::new(build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)?))
    }

    fn conn(&self) -> Result<PgConn, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

impl DocumentStore for PgDocumentStore {
    fn load(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        let found: Option<Value> = with_retry(|| {
            let mut conn = self.conn()?;
            Ok(documents::table.filter(documents::collection.eq(collection.as_str()))
                               .filter(documents::id.eq(id))
                               .select(documents::body)
                               .first::<Value>(&mut conn)
                               .optional()?)
        })?;
        found.ok_or_else(|| StoreError::NotFound { collection,
                                                   id: id.to_string() })
    }

    fn save(&mut self, collection: Collection, id: &str, doc: &Value) -> Result<(), StoreError> {
        debug!("upsert {collection}/{id}");
        with_retry(|| {
            let mut conn = self.conn()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| -> Result<(), PersistenceError> {
                    diesel::insert_into(documents::table).values(NewDocument { collection: collection.as_str(),
                                                                               id,
                                                                               body: doc })
                                                         .on_conflict((documents::collection, documents::id))
                                                         .do_update()
                                                         .set((documents::body.eq(excluded(documents::body)),
                                                               documents::updated_at.eq(diesel::dsl::now)))
                                                         .execute(tx)?;
                    Ok(())
                })
        })?;
        Ok(())
    }

    fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError> {
        debug!("delete {collection}/{id}");
        with_retry(|| {
            let mut conn = self.conn()?;
            diesel::delete(documents::table.filter(documents::collection.eq(collection.as_str()))
                                           .filter(documents::id.eq(id))).execute(&mut conn)?;
            Ok(())
        })?;
        Ok(())
    }

    fn list(&self, collection: Collection) -> Result<Vec<(String, Value)>, StoreError> {
        let rows = with_retry(|| {
            let mut conn = self.conn()?;
            Ok(documents::table.filter(documents::collection.eq(collection.as_str()))
                               .order(documents::id.asc())
                               .select((documents::id, documents::body))
                               .load::<(String, Value)>(&mut conn)?)
        })?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retry_stops_after_three_transient_failures() {
        let calls = Cell::new(0);
        let out: Result<(), PersistenceError> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::TransientIo("down".into()))
        });
        assert!(out.is_err());
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn non_retryable_errors_fail_fast() {
        let calls = Cell::new(0);
        let out: Result<(), PersistenceError> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::NotFound)
        });
        assert!(out.is_err());
        assert_eq!(calls.get(), 1);
    }
}

//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
//! La base de datos es opcional: sin `DATABASE_URL` se trabaja con stores
//! locales.
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

use stepflow_adapters::extractors::DEFAULT_TIMEOUT_SECS;

/// Configuración global de la aplicación.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Configuración de base de datos, si hay `DATABASE_URL`.
    pub database: Option<DatabaseConfig>,
    /// Timeout por defecto de los extractores HTTP.
    pub http_timeout_secs: u64,
    /// Directorio del store de archivos JSON.
    pub store_dir: PathBuf,
}

/// Parámetros de conexión a la base de datos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// URL completa de conexión (postgres://...).
    pub url: String,
    /// Número mínimo de conexiones en el pool.
    pub min_connections: u32,
    pub max_connections: u32,
}

pub const DEFAULT_STORE_DIR: &str = ".stepflow";

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl AppConfig {
    /// Lee la configuración del entorno actual (sin cargar `.env`).
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok()
                                               .filter(|u| !u.trim().is_empty())
                                               .map(|url| DatabaseConfig { url,
                                                                           min_connections: parsed("DATABASE_MIN_CONNECTIONS", 1),
                                                                           max_connections: parsed("DATABASE_MAX_CONNECTIONS", 8) });
        let store_dir = env::var("STEPFLOW_STORE_DIR").map(PathBuf::from)
                                                      .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_DIR));
        AppConfig { database,
                    http_timeout_secs: parsed("STEPFLOW_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
                    store_dir }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    dotenvy::dotenv().ok();
    AppConfig::from_env()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_falls_back_on_garbage() {
        env::set_var("STEPFLOW_TEST_PARSED", "abc");
        assert_eq!(parsed("STEPFLOW_TEST_PARSED", 7u64), 7);
        env::set_var("STEPFLOW_TEST_PARSED", " 12 ");
        assert_eq!(parsed("STEPFLOW_TEST_PARSED", 7u64), 12);
        assert_eq!(parsed("STEPFLOW_TEST_PARSED_MISSING", 3u32), 3);
    }
}

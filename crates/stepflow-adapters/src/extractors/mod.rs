//! Fuentes concretas.

mod csv_file;
mod http_json;
mod inline;
mod json_records;

pub use csv_file::CsvFileExtractor;
pub use http_json::{HttpJsonExtractor, DEFAULT_TIMEOUT_SECS};
pub use inline::InlineExtractor;
pub use json_records::JsonRecordsExtractor;

use serde_json::Value;
use stepflow_core::{from_config, Extractable, Registry, RegistryError};

fn build<T>(kind: &str, config: &Value) -> Result<Box<dyn Extractable>, RegistryError>
    where T: Extractable + serde::de::DeserializeOwned + 'static
{
    Ok(Box::new(from_config::<T>(kind, config)?))
}

pub(crate) fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_extractor(InlineExtractor::KIND, |c| build::<InlineExtractor>(InlineExtractor::KIND, c))?;
    registry.register_extractor(CsvFileExtractor::KIND, |c| build::<CsvFileExtractor>(CsvFileExtractor::KIND, c))?;
    registry.register_extractor(JsonRecordsExtractor::KIND, |c| {
                build::<JsonRecordsExtractor>(JsonRecordsExtractor::KIND, c)
            })?;
    registry.register_extractor(HttpJsonExtractor::KIND, |c| build::<HttpJsonExtractor>(HttpJsonExtractor::KIND, c))?;
    Ok(())
}

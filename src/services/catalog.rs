//! City catalog loader.
//!
//! Reads the static list of cities to query from a JSON file checked into
//! the repository. The catalog is loaded once at startup; a missing or
//! malformed file aborts the whole run before any city is processed.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading the city catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error reading catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One city entry from the catalog file.
///
/// `city_id` is assumed unique within the catalog but not enforced;
/// duplicate entries pass through and produce duplicate documents.
#[derive(Debug, Clone, Deserialize)]
pub struct CityRecord {
    pub city_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Load the city catalog from a JSON file on disk.
pub fn load_catalog_file(path: &Path) -> Result<Vec<CityRecord>, CatalogError> {
    let contents = std::fs::read_to_string(path)?;
    parse_catalog(&contents)
}

/// Parse catalog JSON content into an ordered list of city records.
///
/// Keys beyond `city_id`/`latitude`/`longitude` are ignored.
pub fn parse_catalog(json: &str) -> Result<Vec<CityRecord>, CatalogError> {
    let cities: Vec<CityRecord> = serde_json::from_str(json)?;
    Ok(cities)
}

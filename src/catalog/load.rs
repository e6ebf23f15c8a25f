//! Catalog loading functionality

use super::Catalog;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Load the endpoint catalog, from `path` when given, otherwise the
/// embedded default. Any schema problem is returned as an error and is
/// expected to abort startup.
pub fn load_catalog<P: AsRef<Path>>(path: Option<P>) -> Result<Catalog> {
    let catalog = match path {
        Some(path) => {
            let path = path.as_ref();
            info!("Loading endpoint catalog from {}", path.display());
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
            Catalog::from_json(&raw)
                .with_context(|| format!("Invalid catalog file {}", path.display()))?
        }
        None => Catalog::builtin().context("Embedded endpoint catalog is invalid")?,
    };

    info!(
        "Catalog has {} endpoints in categories: {}",
        catalog.len(),
        catalog.categories().join(", ")
    );
    Ok(catalog)
}

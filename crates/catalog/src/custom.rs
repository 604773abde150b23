//! Persistence for user-registered datasets and indices.
//!
//! Custom entries live as JSON maps under the config directory:
//! `custom_datasets.json` (name -> dataset spec) and `custom_indices.json`
//! (name -> index spec). Built-ins are never written.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::dataset::DatasetSpec;
use crate::error::{CatalogError, Result};
use crate::index::IndexSpec;
use crate::resolver::Catalog;

const DATASETS_FILE: &str = "custom_datasets.json";
const INDICES_FILE: &str = "custom_indices.json";

/// Reads and writes custom catalog entries in a config directory.
#[derive(Debug, Clone)]
pub struct CustomStore {
    dir: PathBuf,
}

impl CustomStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn datasets_path(&self) -> PathBuf {
        self.dir.join(DATASETS_FILE)
    }

    fn indices_path(&self) -> PathBuf {
        self.dir.join(INDICES_FILE)
    }

    /// Register every stored entry into the catalog.
    ///
    /// A missing file means no custom entries. A malformed file or an invalid
    /// entry is an error; entries registered before the failure stay registered.
    pub fn load_into(&self, catalog: &mut Catalog) -> Result<usize> {
        let mut loaded = 0;

        if let Some(datasets) = read_map::<DatasetSpec>(&self.datasets_path())? {
            for (name, spec) in datasets {
                let descriptor = crate::dataset::DatasetDescriptor::new(spec)?;
                catalog.datasets_mut().register(&name, descriptor)?;
                loaded += 1;
            }
        }

        if let Some(indices) = read_map::<IndexSpec>(&self.indices_path())? {
            for (name, spec) in indices {
                let descriptor = crate::index::IndexDescriptor::new(spec)?;
                let category = descriptor.category();
                catalog.indices_mut().register(category, &name, descriptor)?;
                loaded += 1;
            }
        }

        if loaded > 0 {
            info!(count = loaded, dir = %self.dir.display(), "Loaded custom catalog entries");
        }
        Ok(loaded)
    }

    /// Write all non-built-in entries of the catalog.
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let datasets: IndexMap<&str, DatasetSpec> = catalog
            .datasets()
            .custom()
            .map(|(name, d)| (name, DatasetSpec::from(d.clone())))
            .collect();
        write_map(&self.datasets_path(), &datasets)?;

        let indices: IndexMap<&str, IndexSpec> = catalog
            .indices()
            .custom()
            .map(|(name, d)| (name, IndexSpec::from(d.clone())))
            .collect();
        write_map(&self.indices_path(), &indices)?;

        info!(
            datasets = datasets.len(),
            indices = indices.len(),
            dir = %self.dir.display(),
            "Saved custom catalog entries"
        );
        Ok(())
    }
}

fn read_map<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<IndexMap<String, T>>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let map = serde_json::from_str(&contents).map_err(|e| {
        warn!(error = %e, path = %path.display(), "Failed to parse custom entries");
        CatalogError::InvalidDescriptor(format!("{}: {}", path.display(), e))
    })?;
    Ok(Some(map))
}

fn write_map<T: serde::Serialize>(path: &Path, map: &IndexMap<&str, T>) -> Result<()> {
    let json = serde_json::to_string_pretty(map)
        .map_err(|e| CatalogError::Persistence(e.to_string()))?;
    fs::write(path, json)?;
    Ok(())
}

//! Standardized datasets on disk: one JSON grid per imported export.

use monnaie_core::EnrichedTable;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Appended to the source file stem to name a saved dataset.
pub const STANDARDIZED_SUFFIX: &str = "_standardized.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid dataset name: '{0}'")]
    InvalidName(String),
    #[error("Dataset not found: '{0}'")]
    NotFound(String),
}

/// Directory of saved datasets.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Dataset name derived from the uploaded file, e.g. `export.xlsx` →
    /// `export_standardized.json`.
    pub fn dataset_name(source: &Path) -> Result<String, StoreError> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::InvalidName(source.display().to_string()))?;
        Ok(format!("{stem}{STANDARDIZED_SUFFIX}"))
    }

    /// Writes the table as a 4-space indented JSON grid and returns the
    /// dataset name. An existing dataset of the same name is replaced.
    pub fn save(&self, source: &Path, table: &EnrichedTable) -> Result<String, StoreError> {
        let name = Self::dataset_name(source)?;
        let path = self.path_for(&name)?;
        std::fs::create_dir_all(&self.root)?;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        table.serialize(&mut serializer)?;
        std::fs::write(&path, buf)?;

        info!(dataset = %name, rows = table.len(), "dataset saved");
        Ok(name)
    }

    pub fn load(&self, name: &str) -> Result<EnrichedTable, StoreError> {
        let path = self.path_for(name)?;
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let table: EnrichedTable = serde_json::from_slice(&data)?;
        debug!(dataset = name, rows = table.len(), "dataset loaded");
        Ok(table)
    }

    /// Names of the JSON files in the store, sorted. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
            || Path::new(name).components().count() != 1;
        if invalid {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

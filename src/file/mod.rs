// src/file/mod.rs
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::export::ExportArtifact;

pub mod dataset;
pub mod preset;

// Re-export commonly used types
pub use dataset::DatasetFileHandler;
pub use preset::{Preset, PresetFileHandler};

// Core trait for file operations
pub trait FileHandler<T> {
    fn load(&self, path: &Path) -> Result<T>;
    fn save(&self, data: &T, path: &Path) -> Result<()>;
}

/// Writes an export to the path the user picked.
pub fn write_artifact(artifact: &ExportArtifact, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), size = artifact.bytes.len(), "export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_lands_in_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("RDD_2024-01-02.csv");
        let artifact = ExportArtifact {
            file_name: "RDD_2024-01-02.csv".to_string(),
            mime: "text/csv",
            bytes: b"a,b\n1,2\n".to_vec(),
        };
        write_artifact(&artifact, &path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), artifact.bytes);
    }
}

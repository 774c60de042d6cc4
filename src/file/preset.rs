// src/file/preset.rs
use anyhow::{anyhow, Context, Result};
use chrono::prelude::*;
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

use super::FileHandler;
use crate::analysis::{AnalysisFields, AnalysisKind};

/// Saved settings of one analysis page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub version: String,
    pub saved_at: DateTime<Utc>,
    pub fields: AnalysisFields,
}

impl Preset {
    pub fn new(fields: AnalysisFields) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            saved_at: Utc::now(),
            fields,
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        self.fields.kind()
    }
}

#[derive(Debug, Default)]
pub struct PresetFileHandler;

impl PresetFileHandler {
    pub fn new() -> Self {
        Self
    }

    /// Loads a preset and refuses one saved from another page.
    pub fn load_for(&self, kind: AnalysisKind, path: &Path) -> Result<AnalysisFields> {
        let preset = self.load(path)?;
        if preset.kind() != kind {
            return Err(anyhow!(
                "This preset is for {}, not {}",
                preset.kind().title(),
                kind.title()
            ));
        }
        Ok(preset.fields)
    }
}

impl FileHandler<Preset> for PresetFileHandler {
    fn load(&self, path: &Path) -> Result<Preset> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        ron::from_str(&content).context("Failed to parse preset file")
    }

    fn save(&self, data: &Preset, path: &Path) -> Result<()> {
        let content = ron::ser::to_string_pretty(
            data,
            ron::ser::PrettyConfig::new()
                .new_line("\n".to_string())
                .depth_limit(4)
        )?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{BoostingFields, BoostingTask, SpatialFields};
    use pretty_assertions::assert_eq;

    #[test]
    fn preset_restores_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boosting.ron");
        let fields = AnalysisFields::GradientBoosting(BoostingFields {
            target_col: Some("price".into()),
            feature_cols: vec!["rooms".into(), "area".into()],
            task: BoostingTask::Regression,
            learning_rate: 0.05,
            ..BoostingFields::default()
        });
        let handler = PresetFileHandler::new();
        handler.save(&Preset::new(fields.clone()), &path).unwrap();

        let restored = handler.load_for(AnalysisKind::GradientBoosting, &path).unwrap();
        assert_eq!(restored, fields);
    }

    #[test]
    fn preset_for_other_page_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spatial.ron");
        let handler = PresetFileHandler::new();
        handler
            .save(&Preset::new(AnalysisFields::SpatialAutoregressive(SpatialFields::default())), &path)
            .unwrap();

        let err = handler.load_for(AnalysisKind::KMeans, &path).unwrap_err();
        assert_eq!(err.to_string(), "This preset is for Spatial Autoregressive Model, not K-Means Clustering");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ron");
        fs::write(&path, "not ron at all (").unwrap();
        assert!(PresetFileHandler::new().load(&path).is_err());
    }
}

// src/file/dataset.rs
use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use super::FileHandler;
use crate::dataset::{Cell, Dataset};

#[derive(Debug, Default)]
pub struct DatasetFileHandler;

impl DatasetFileHandler {
    pub fn new() -> Self {
        Self
    }

    /// Parses CSV text with a header row. Rows must match the header width.
    pub fn parse<R: Read>(&self, name: &str, reader: R) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()
            .context("Failed to read the header row")?
            .iter()
            .map(str::to_string)
            .collect();
        if columns.is_empty() || columns.iter().all(String::is_empty) {
            return Err(anyhow!("The file has no header row"));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(anyhow!("Duplicate column name: {}", duplicate));
        }

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Invalid row {}", line + 2))?;
            rows.push(record.iter().map(Cell::parse).collect());
        }

        Ok(Dataset::new(name, columns, rows))
    }
}

impl FileHandler<Dataset> for DatasetFileHandler {
    fn load(&self, path: &Path) -> Result<Dataset> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let name = path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        let dataset = self.parse(&name, file)
            .with_context(|| format!("Failed to load dataset from {}", path.display()))?;
        info!(path = %path.display(), rows = dataset.row_count(), columns = dataset.columns.len(), "dataset loaded");
        Ok(dataset)
    }

    fn save(&self, data: &Dataset, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new().from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(&data.columns)?;
        for row in &data.rows {
            writer.write_record(row.iter().map(Cell::display))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_numbers_text_and_missing() {
        let text = "x, group ,y\n1,a,2.5\n2,b,\n3,a,NA\n";
        let data = DatasetFileHandler::new().parse("t", text.as_bytes()).unwrap();
        assert_eq!(data.columns, vec!["x", "group", "y"]);
        assert_eq!(data.row_count(), 3);
        assert_eq!(data.rows[0][2], Cell::Number(2.5));
        assert_eq!(data.rows[1][2], Cell::Missing);
        assert_eq!(data.rows[2][1], Cell::Text("a".into()));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let text = "a,b\n1,2\n3\n";
        let err = DatasetFileHandler::new().parse("t", text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Invalid row 3"));
    }

    #[test]
    fn duplicate_header_is_rejected() {
        let err = DatasetFileHandler::new().parse("t", "a,a\n1,2\n".as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate column name: a");
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("houses.csv");
        let handler = DatasetFileHandler::new();
        let original = sample::generate(12, 5);
        handler.save(&original, &path).unwrap();

        let loaded = handler.load(&path).unwrap();
        assert_eq!(loaded.name, "houses");
        assert_eq!(loaded.columns, original.columns);
        assert_eq!(loaded.row_count(), 12);
        assert_ne!(loaded.id, original.id);
        assert_eq!(loaded.rows[3][1], original.rows[3][1]);
    }
}

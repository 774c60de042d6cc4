// src/export/csv.rs
use csv::Writer;

use crate::dataset::Dataset;
use super::ExportError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            headers: dataset.columns.clone(),
            rows: dataset.rows.iter()
                .map(|row| row.iter().map(|c| c.display()).collect())
                .collect(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        writer.into_inner().map_err(|e| ExportError::Csv(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{test_dataset, Cell};

    #[test]
    fn writes_header_and_quotes() {
        let mut table = CsvTable::new(&["term", "value"]);
        table.push(["effect, robust", "1.5"]);
        table.push(vec!["p".to_string(), "0.02".to_string()]);
        let text = String::from_utf8(table.to_bytes().unwrap()).unwrap();
        assert_eq!(text, "term,value\n\"effect, robust\",1.5\np,0.02\n");
    }

    #[test]
    fn dataset_missing_cells_are_blank() {
        let data = test_dataset(&["a", "b"], vec![vec![Cell::Number(1.0), Cell::Missing]]);
        let text = String::from_utf8(CsvTable::from_dataset(&data).to_bytes().unwrap()).unwrap();
        assert_eq!(text, "a,b\n1,\n");
    }
}

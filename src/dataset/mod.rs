// src/dataset/mod.rs
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::BTreeSet;
use uuid::Uuid;

pub mod sample;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") || trimmed.eq_ignore_ascii_case("nan") {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number(value),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Key used when counting distinct values.
    pub fn distinct_key(&self) -> Option<String> {
        match self {
            Cell::Number(value) => Some(value.to_string()),
            Cell::Text(text) => Some(text.clone()),
            Cell::Missing => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Number(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(text) => Value::String(text.clone()),
            Cell::Missing => Value::Null,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Number(value) => value.to_string(),
            Cell::Text(text) => text.clone(),
            Cell::Missing => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub numeric_count: usize,
    pub missing: usize,
    pub distinct: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
}

impl ColumnStats {
    /// A column is numeric when every non-missing cell parsed as a number.
    pub fn is_numeric(&self) -> bool {
        self.numeric_count > 0 && self.numeric_count + self.missing == self.count
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }

    pub fn numeric_values(&self, name: &str) -> Vec<f64> {
        self.column(name)
            .map(|cells| cells.into_iter().filter_map(Cell::as_f64).collect())
            .unwrap_or_default()
    }

    /// Rows where every named column holds a number.
    pub fn complete_numeric_rows(&self, names: &[&str]) -> Vec<Vec<f64>> {
        let indices: Option<Vec<usize>> = names.iter().map(|n| self.column_index(n)).collect();
        let Some(indices) = indices else {
            return Vec::new();
        };

        self.rows.iter()
            .filter_map(|row| {
                indices.iter()
                    .map(|&idx| row.get(idx).and_then(Cell::as_f64))
                    .collect::<Option<Vec<f64>>>()
            })
            .collect()
    }

    pub fn distinct_count(&self, name: &str) -> usize {
        self.column(name)
            .map(|cells| {
                cells.into_iter()
                    .filter_map(Cell::distinct_key)
                    .collect::<BTreeSet<_>>()
                    .len()
            })
            .unwrap_or(0)
    }

    pub fn column_stats(&self, name: &str) -> Option<ColumnStats> {
        let cells = self.column(name)?;
        let count = cells.len();
        let missing = cells.iter().filter(|c| c.is_missing()).count();
        let values: Vec<f64> = cells.iter().filter_map(|c| c.as_f64()).collect();
        let distinct = cells.iter()
            .filter_map(|c| c.distinct_key())
            .collect::<BTreeSet<_>>()
            .len();

        let (min, max, mean, median, std_dev) = if values.is_empty() {
            (None, None, None, None, None)
        } else {
            let std_dev = if values.len() > 1 {
                Some(Statistics::std_dev(values.iter()))
            } else {
                None
            };
            (
                Some(Statistics::min(values.iter())),
                Some(Statistics::max(values.iter())),
                Some(Statistics::mean(values.iter())),
                Some(Data::new(values.clone()).median()),
                std_dev,
            )
        };

        Some(ColumnStats {
            count,
            numeric_count: values.len(),
            missing,
            distinct,
            min,
            max,
            mean,
            median,
            std_dev,
        })
    }

    pub fn is_numeric_column(&self, name: &str) -> bool {
        self.column_stats(name).map_or(false, |s| s.is_numeric())
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns.iter()
            .filter(|c| self.is_numeric_column(c))
            .cloned()
            .collect()
    }

    /// Columns that are not numeric, or numeric with only a handful of levels.
    pub fn categorical_columns(&self, max_levels: usize) -> Vec<String> {
        self.columns.iter()
            .filter(|c| {
                let distinct = self.distinct_count(c);
                distinct >= 2 && (!self.is_numeric_column(c) || distinct <= max_levels)
            })
            .cloned()
            .collect()
    }

    /// Identifies the column set; wizards reset when it changes.
    pub fn column_signature(&self) -> String {
        self.columns.join("\u{1f}")
    }

    /// Rows as JSON records, the shape the analysis service expects.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows.iter()
            .map(|row| {
                let mut record = Map::new();
                for (column, cell) in self.columns.iter().zip(row.iter()) {
                    record.insert(column.clone(), cell.to_json());
                }
                Value::Object(record)
            })
            .collect()
    }

    /// Copy keeping only the rows where every named column holds a number.
    pub fn complete_rows(&self, names: &[&str]) -> Self {
        let indices: Vec<usize> = names.iter().filter_map(|n| self.column_index(n)).collect();
        let rows = self.rows.iter()
            .filter(|row| indices.iter().all(|&idx| row.get(idx).and_then(Cell::as_f64).is_some()))
            .cloned()
            .collect();

        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Copy of the dataset with an extra column appended.
    pub fn with_column(&self, name: &str, values: Vec<Cell>) -> Self {
        let mut columns = self.columns.clone();
        columns.push(name.to_string());
        let rows = self.rows.iter()
            .zip(values)
            .map(|(row, cell)| {
                let mut row = row.clone();
                row.push(cell);
                row
            })
            .collect();

        Self {
            id: self.id.clone(),
            name: format!("{} ({})", self.name, name),
            columns,
            rows,
        }
    }
}

/// Picks the first column whose lowercase name contains one of the hints,
/// falling back to the first candidate not already taken.
pub fn pick_column(candidates: &[String], hints: &[&str], taken: &[&str]) -> Option<String> {
    let free = |c: &&String| !taken.contains(&c.as_str());

    candidates.iter()
        .filter(free)
        .find(|c| {
            let lower = c.to_lowercase();
            hints.iter().any(|h| lower.contains(h))
        })
        .or_else(|| candidates.iter().find(free))
        .cloned()
}

#[cfg(test)]
pub(crate) fn test_dataset(columns: &[&str], rows: Vec<Vec<Cell>>) -> Dataset {
    Dataset::new("test", columns.iter().map(|c| c.to_string()).collect(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn small() -> Dataset {
        test_dataset(
            &["x", "group", "y"],
            vec![
                vec![Cell::Number(1.0), Cell::Text("a".into()), Cell::Number(10.0)],
                vec![Cell::Number(2.0), Cell::Text("b".into()), Cell::Missing],
                vec![Cell::Number(3.0), Cell::Text("a".into()), Cell::Number(30.0)],
            ],
        )
    }

    #[test]
    fn parses_cells() {
        assert_eq!(Cell::parse(" 2.5 "), Cell::Number(2.5));
        assert_eq!(Cell::parse(""), Cell::Missing);
        assert_eq!(Cell::parse("NA"), Cell::Missing);
        assert_eq!(Cell::parse("north"), Cell::Text("north".into()));
    }

    #[test]
    fn column_stats_skip_missing() {
        let data = small();
        let stats = data.column_stats("y").unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.min, Some(10.0));
        assert_eq!(stats.max, Some(30.0));
        assert_eq!(stats.median, Some(20.0));
        assert!(stats.is_numeric());
        assert!(!data.is_numeric_column("group"));
        assert!(data.column_stats("nope").is_none());
    }

    #[test]
    fn complete_rows_drop_missing() {
        let data = small();
        assert_eq!(data.complete_numeric_rows(&["x", "y"]), vec![vec![1.0, 10.0], vec![3.0, 30.0]]);
        assert!(data.complete_numeric_rows(&["x", "missing"]).is_empty());

        let subset = data.complete_rows(&["x", "y"]);
        assert_eq!(subset.row_count(), 2);
        assert_eq!(subset.rows[1][1], Cell::Text("a".into()));
        assert_eq!(subset.id, data.id);
    }

    #[test]
    fn records_use_column_names() {
        let data = small();
        let records = data.to_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["group"], Value::String("a".into()));
        assert_eq!(records[1]["y"], Value::Null);
    }

    #[test]
    fn categorical_and_distinct() {
        let data = small();
        assert_eq!(data.distinct_count("group"), 2);
        assert_eq!(data.categorical_columns(5), vec!["x".to_string(), "group".to_string(), "y".to_string()]);
        assert_eq!(data.categorical_columns(1), vec!["group".to_string()]);
    }

    #[test]
    fn pick_column_prefers_hints() {
        let cols = vec!["a".to_string(), "Outcome_score".to_string(), "b".to_string()];
        assert_eq!(pick_column(&cols, &["outcome"], &[]), Some("Outcome_score".into()));
        assert_eq!(pick_column(&cols, &["zzz"], &["a"]), Some("Outcome_score".into()));
        assert_eq!(pick_column(&cols, &["outcome"], &["Outcome_score"]), Some("a".into()));
    }

    #[test]
    fn with_column_appends() {
        let data = small();
        let annotated = data.with_column("cluster", vec![Cell::Number(0.0), Cell::Number(1.0), Cell::Number(-1.0)]);
        assert_eq!(annotated.columns.last().map(String::as_str), Some("cluster"));
        assert_eq!(annotated.rows[2][3], Cell::Number(-1.0));
        assert_eq!(annotated.id, data.id);
    }
}

// src/analysis/spatial.rs

use serde::{Serialize, Deserialize};
use serde_json::{json, Value};

use crate::dataset::{pick_column, Dataset};
use crate::export::CsvTable;
use crate::utils::{fmt_num, fmt_opt, fmt_p, significance_phrase};
use crate::wizard::validation::{column_selected, min_rows, selection_count, ValidationReport};

pub const MIN_ROWS: usize = 20;
pub const RECOMMENDED_ROWS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialModel {
    Lag,
    Error,
}

impl SpatialModel {
    pub const ALL: [SpatialModel; 2] = [SpatialModel::Lag, SpatialModel::Error];

    pub fn as_str(self) -> &'static str {
        match self {
            SpatialModel::Lag => "lag",
            SpatialModel::Error => "error",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpatialModel::Lag => "Spatial lag",
            SpatialModel::Error => "Spatial error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialFields {
    pub dependent_col: Option<String>,
    pub independent_cols: Vec<String>,
    pub lat_col: Option<String>,
    pub lon_col: Option<String>,
    pub k_neighbors: usize,
    pub model: SpatialModel,
}

impl Default for SpatialFields {
    fn default() -> Self {
        Self {
            dependent_col: None,
            independent_cols: Vec::new(),
            lat_col: None,
            lon_col: None,
            k_neighbors: 5,
            model: SpatialModel::Lag,
        }
    }
}

fn coordinate_column(numeric: &[String], hints: &[&str]) -> Option<String> {
    numeric.iter()
        .find(|c| {
            let lower = c.to_lowercase();
            hints.iter().any(|h| lower == *h || lower.starts_with(h))
        })
        .cloned()
}

impl SpatialFields {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let numeric: Vec<String> = dataset.numeric_columns()
            .into_iter()
            .filter(|c| !c.eq_ignore_ascii_case("id"))
            .collect();
        let lat_col = coordinate_column(&numeric, &["latitude", "lat", "y_coord"]);
        let lon_col = coordinate_column(&numeric, &["longitude", "lon", "lng", "x_coord"]);

        let mut taken: Vec<&str> = lat_col.iter().chain(lon_col.iter()).map(String::as_str).collect();
        let dependent_col = pick_column(&numeric, &["price", "value", "outcome", "rate"], &taken);
        taken.extend(dependent_col.as_deref());
        let independent_cols = numeric.iter()
            .filter(|c| !taken.contains(&c.as_str()))
            .take(3)
            .cloned()
            .collect();

        Self {
            dependent_col,
            independent_cols,
            lat_col,
            lon_col,
            ..Self::default()
        }
    }

    fn coordinate_check(dataset: &Dataset, column: &Option<String>, bound: f64) -> (bool, String) {
        let Some(column) = column else {
            return (false, "Select a coordinate column".to_string());
        };
        match dataset.column_stats(column) {
            Some(stats) if stats.is_numeric() => {
                let (min, max) = (stats.min.unwrap_or(0.0), stats.max.unwrap_or(0.0));
                (
                    min >= -bound && max <= bound,
                    format!("{} ranges from {} to {} (allowed ±{})", column, fmt_num(min, 4), fmt_num(max, 4), bound),
                )
            }
            _ => (false, format!("{} is not numeric", column)),
        }
    }

    fn usable_rows(&self, dataset: &Dataset) -> usize {
        let mut names: Vec<&str> = self.independent_cols.iter().map(String::as_str).collect();
        names.extend(self.dependent_col.as_deref());
        names.extend(self.lat_col.as_deref());
        names.extend(self.lon_col.as_deref());
        if names.len() < self.independent_cols.len() + 3 || self.independent_cols.is_empty() {
            return 0;
        }
        dataset.complete_numeric_rows(&names).len()
    }

    pub fn validate(&self, dataset: &Dataset) -> ValidationReport {
        let mut report = ValidationReport::new();

        let (ok, detail) = column_selected(&self.dependent_col, "Select a dependent variable");
        report.check("Dependent variable selected", ok, detail);
        let (ok, detail) = selection_count(&self.independent_cols, 1);
        report.check("Independent variables selected", ok, detail);
        let (ok, detail) = column_selected(&self.lat_col, "Select a latitude column");
        report.check("Latitude selected", ok, detail);
        let (ok, detail) = column_selected(&self.lon_col, "Select a longitude column");
        report.check("Longitude selected", ok, detail);

        let (ok, detail) = Self::coordinate_check(dataset, &self.lat_col, 90.0);
        report.check("Latitude range", ok, detail);
        let (ok, detail) = Self::coordinate_check(dataset, &self.lon_col, 180.0);
        report.check("Longitude range", ok, detail);

        let usable = self.usable_rows(dataset);
        report.check(
            "Neighbors",
            self.k_neighbors >= 1 && self.k_neighbors < usable.max(1),
            format!("k = {} with {} usable rows", self.k_neighbors, usable),
        );

        let (ok, detail) = min_rows(dataset, usable, MIN_ROWS);
        report.check("Sample size", ok, detail);

        report.advise(
            "Recommended sample size",
            usable >= RECOMMENDED_ROWS,
            format!("{} rows (recommended {})", usable, RECOMMENDED_ROWS),
        );

        report
    }

    pub fn parameters(&self) -> Value {
        json!({
            "dependent_col": self.dependent_col,
            "independent_cols": self.independent_cols,
            "lat_col": self.lat_col,
            "lon_col": self.lon_col,
            "k_neighbors": self.k_neighbors,
            "model_type": self.model.as_str(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub variable: String,
    pub estimate: f64,
    #[serde(default)]
    pub std_error: Option<f64>,
    #[serde(default)]
    pub z_value: Option<f64>,
    #[serde(default)]
    pub p_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoransI {
    pub statistic: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialResult {
    #[serde(default)]
    pub rho: Option<f64>,
    #[serde(default)]
    pub lambda: Option<f64>,
    #[serde(default)]
    pub coefficients: Vec<Coefficient>,
    #[serde(default)]
    pub log_likelihood: Option<f64>,
    #[serde(default)]
    pub aic: Option<f64>,
    #[serde(default)]
    pub morans_i: Option<MoransI>,
}

impl SpatialResult {
    /// The spatial parameter of whichever model was fitted.
    pub fn spatial_parameter(&self) -> Option<(&'static str, f64)> {
        self.rho.map(|r| ("rho", r)).or_else(|| self.lambda.map(|l| ("lambda", l)))
    }

    pub fn summary(&self, fields: &SpatialFields) -> Vec<String> {
        let dependent = fields.dependent_col.as_deref().unwrap_or("the dependent variable");
        let mut lines = vec![format!(
            "A {} model of {} was fitted using the {} nearest neighbors of each location.",
            fields.model.label().to_lowercase(),
            dependent,
            fields.k_neighbors
        )];

        if let Some((name, value)) = self.spatial_parameter() {
            let strength = match value.abs() {
                v if v >= 0.5 => "strong",
                v if v >= 0.2 => "moderate",
                _ => "weak",
            };
            lines.push(format!("The spatial parameter {} = {} indicates {} spatial dependence.", name, fmt_num(value, 3), strength));
        }

        let significant: Vec<&str> = self.coefficients.iter()
            .filter(|c| c.p_value.map_or(false, |p| p < 0.05))
            .filter(|c| !c.variable.eq_ignore_ascii_case("const") && !c.variable.eq_ignore_ascii_case("intercept"))
            .map(|c| c.variable.as_str())
            .collect();
        if significant.is_empty() {
            lines.push("None of the independent variables is statistically significant at the 5% level.".to_string());
        } else {
            lines.push(format!("Statistically significant predictors: {}.", significant.join(", ")));
        }
        lines
    }

    pub fn reasoning(&self, fields: &SpatialFields) -> Vec<String> {
        let mut lines = vec![match fields.model {
            SpatialModel::Lag => "The spatial lag model lets each location's value depend on the values of its neighbors (rho).".to_string(),
            SpatialModel::Error => "The spatial error model allows the unexplained part of neighboring locations to be correlated (lambda).".to_string(),
        }];
        lines.push(format!(
            "Neighbors are the {} closest locations by {} and {}.",
            fields.k_neighbors,
            fields.lat_col.as_deref().unwrap_or("latitude"),
            fields.lon_col.as_deref().unwrap_or("longitude")
        ));
        if let Some(moran) = &self.morans_i {
            lines.push(format!(
                "Moran's I of the residuals is {} (p = {}), so remaining spatial autocorrelation is {}.",
                fmt_num(moran.statistic, 3),
                fmt_p(moran.p_value),
                significance_phrase(moran.p_value, 0.05)
            ));
        }
        lines
    }

    pub fn statistics(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("Rho".to_string(), fmt_opt(self.rho, 4)),
            ("Lambda".to_string(), fmt_opt(self.lambda, 4)),
            ("Log-likelihood".to_string(), fmt_opt(self.log_likelihood, 3)),
            ("AIC".to_string(), fmt_opt(self.aic, 3)),
        ];
        if let Some(moran) = &self.morans_i {
            rows.push(("Moran's I".to_string(), format!("{} (p = {})", fmt_num(moran.statistic, 4), fmt_p(moran.p_value))));
        }
        for c in &self.coefficients {
            rows.push((
                c.variable.clone(),
                format!(
                    "{} (SE {}, z {}, p {})",
                    fmt_num(c.estimate, 4),
                    fmt_opt(c.std_error, 4),
                    fmt_opt(c.z_value, 3),
                    c.p_value.map_or_else(|| "n/a".to_string(), fmt_p)
                ),
            ));
        }
        rows
    }

    pub fn csv_table(&self) -> CsvTable {
        let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        let mut table = CsvTable::new(&["variable", "estimate", "std_error", "z_value", "p_value"]);
        for c in &self.coefficients {
            table.push([c.variable.clone(), c.estimate.to_string(), opt(c.std_error), opt(c.z_value), opt(c.p_value)]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{sample, test_dataset, Cell};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_find_coordinates() {
        let data = sample::generate(60, 8);
        let fields = SpatialFields::from_dataset(&data);
        assert_eq!(fields.lat_col.as_deref(), Some("latitude"));
        assert_eq!(fields.lon_col.as_deref(), Some("longitude"));
        assert_eq!(fields.dependent_col.as_deref(), Some("house_price"));
        assert_eq!(fields.independent_cols, vec!["margin", "test_score", "income"]);
        assert!(fields.validate(&data).all_passed());
    }

    #[test]
    fn out_of_range_latitude_fails() {
        let rows = (0..25)
            .map(|i| vec![
                Cell::Number(i as f64),
                Cell::Number(100.0 + i as f64),
                Cell::Number(10.0),
                Cell::Number(2.0 * i as f64),
            ])
            .collect();
        let data = test_dataset(&["y", "lat", "lon", "x"], rows);
        let fields = SpatialFields {
            dependent_col: Some("y".into()),
            independent_cols: vec!["x".into()],
            lat_col: Some("lat".into()),
            lon_col: Some("lon".into()),
            ..SpatialFields::default()
        };
        let report = fields.validate(&data);
        assert!(!report.get("Latitude range").unwrap().passed);
        assert!(report.get("Longitude range").unwrap().passed);
        assert!(!report.all_passed());
    }

    #[test]
    fn neighbors_must_be_fewer_than_rows() {
        let data = sample::generate(30, 8);
        let fields = SpatialFields { k_neighbors: 30, ..SpatialFields::from_dataset(&data) };
        assert!(!fields.validate(&data).get("Neighbors").unwrap().passed);
        let fields = SpatialFields { k_neighbors: 0, ..fields };
        assert!(!fields.validate(&data).get("Neighbors").unwrap().passed);
    }

    #[test]
    fn summary_names_significant_predictors() {
        let result = SpatialResult {
            rho: Some(0.42),
            lambda: None,
            coefficients: vec![
                Coefficient { variable: "const".into(), estimate: 3.0, std_error: None, z_value: None, p_value: Some(0.0) },
                Coefficient { variable: "income".into(), estimate: 1.4, std_error: Some(0.2), z_value: Some(7.0), p_value: Some(0.0001) },
                Coefficient { variable: "margin".into(), estimate: 0.1, std_error: Some(0.3), z_value: Some(0.3), p_value: Some(0.7) },
            ],
            log_likelihood: Some(-120.5),
            aic: Some(251.0),
            morans_i: Some(MoransI { statistic: 0.02, p_value: 0.4 }),
        };
        let lines = result.summary(&SpatialFields::default());
        assert_eq!(lines[1], "The spatial parameter rho = 0.420 indicates moderate spatial dependence.");
        assert_eq!(lines[2], "Statistically significant predictors: income.");
        assert_eq!(result.csv_table().rows.len(), 3);
        assert_eq!(result.csv_table().rows[0][2], "");
    }
}

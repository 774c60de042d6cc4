// src/utils.rs
use chrono::NaiveDate;

pub fn fmt_num(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", decimals, value)
    } else {
        "n/a".to_string()
    }
}

pub fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| fmt_num(v, decimals))
}

pub fn fmt_p(p: f64) -> String {
    if !p.is_finite() {
        "n/a".to_string()
    } else if p < 0.001 {
        "< 0.001".to_string()
    } else {
        format!("{:.3}", p)
    }
}

pub fn significance_phrase(p: f64, alpha: f64) -> &'static str {
    if p < alpha {
        "statistically significant"
    } else {
        "not statistically significant"
    }
}

pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_p_values() {
        assert_eq!(fmt_p(0.0004), "< 0.001");
        assert_eq!(fmt_p(0.0421), "0.042");
        assert_eq!(fmt_p(f64::NAN), "n/a");
    }

    #[test]
    fn formats_numbers() {
        assert_eq!(fmt_num(1.23456, 2), "1.23");
        assert_eq!(fmt_opt(None, 2), "n/a");
        assert_eq!(iso_date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()), "2024-03-09");
    }
}

//! Export file helpers.

use chrono::NaiveDate;

use crate::error::{PersistenceError, Result};
use crate::model::Dataset;

/// Stem of exported file names.
pub const EXPORT_PREFIX: &str = "cuaderno_datos";

/// The dataset as a pretty-printed (two-space indented) JSON document.
pub fn export_json(dataset: &Dataset) -> Result<String> {
    serde_json::to_string_pretty(dataset).map_err(|e| PersistenceError::from(e).into())
}

/// `cuaderno_datos_<YYYY-MM-DD>.json`, dated by the caller (the binary
/// passes the current UTC date).
pub fn export_file_name(date: NaiveDate) -> String {
    format!("{}_{}.json", EXPORT_PREFIX, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn file_name_includes_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(export_file_name(date), "cuaderno_datos_2024-05-01.json");
    }

    #[test]
    fn export_is_indented_with_two_spaces() {
        let dataset = Dataset::seeded(&ManualClock::default());
        let json = export_json(&dataset).unwrap();
        assert!(json.starts_with("{\n  \"version\": 1,"));
    }
}

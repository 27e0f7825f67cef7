//! # Calculation Settings
//!
//! Defaults applied when a calculation does not specify its own. Stored in
//! every workbook and loadable from a standalone JSON file:
//!
//! ```json
//! {
//!   "compare_mode": "linear.9",
//!   "combination_model": "worst-case",
//!   "table_decimals": 2,
//!   "csv_delimiter": ";"
//! }
//! ```
//!
//! Missing fields take their default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::tolerance::{CombinationModel, CompareMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcSettings {
    /// Used by stacks that name no compare mode
    pub compare_mode: CompareMode,
    pub combination_model: CombinationModel,
    /// Decimal places of deflections and wire sizes in spring tables
    pub table_decimals: usize,
    pub csv_delimiter: char,
}

impl Default for CalcSettings {
    fn default() -> Self {
        CalcSettings {
            compare_mode: CompareMode::Exact,
            combination_model: CombinationModel::WorstCase,
            table_decimals: 1,
            csv_delimiter: ',',
        }
    }
}

impl CalcSettings {
    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> CalcResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read settings", path.display().to_string(), e.to_string()))?;
        let settings: CalcSettings = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
            reason: format!("Invalid settings in {}: {}", path.display(), e),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> CalcResult<()> {
        if !self.csv_delimiter.is_ascii() || self.csv_delimiter.is_ascii_alphanumeric() {
            return Err(CalcError::invalid_input(
                "csv_delimiter",
                self.csv_delimiter.to_string(),
                "Delimiter must be an ASCII punctuation or whitespace character",
            ));
        }
        if self.table_decimals > 12 {
            return Err(CalcError::invalid_input(
                "table_decimals",
                self.table_decimals.to_string(),
                "At most 12 decimal places",
            ));
        }
        Ok(())
    }

    /// Delimiter as the byte the `csv` writer expects.
    pub fn delimiter_byte(&self) -> u8 {
        let mut buf = [0u8; 4];
        self.csv_delimiter.encode_utf8(&mut buf);
        buf[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let settings: CalcSettings = serde_json::from_str(r#"{"table_decimals": 3}"#).unwrap();
        assert_eq!(settings.table_decimals, 3);
        assert_eq!(settings.compare_mode, CompareMode::Exact);
        assert_eq!(settings.csv_delimiter, ',');
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"compare_mode": "linear.9", "csv_delimiter": ";"}}"#).unwrap();
        let settings = CalcSettings::load(file.path()).unwrap();
        assert_eq!(settings.compare_mode, CompareMode::Linear(0.9));
        assert_eq!(settings.delimiter_byte(), b';');
    }

    #[test]
    fn test_rejects_bad_delimiter() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"csv_delimiter": "x"}}"#).unwrap();
        assert!(matches!(CalcSettings::load(file.path()), Err(CalcError::InvalidInput { .. })));
        assert!(matches!(
            CalcSettings::load(Path::new("/nonexistent/settings.json")),
            Err(CalcError::FileError { .. })
        ));
    }
}

//! # CSV Export
//!
//! Spring deflection tables as CSV, one column pair per wire width and one
//! row per wire height:
//!
//! ```text
//! ,3.0,,4.0,
//! ,f,t,f,t
//! 10.0,53.4,987,50.1,778
//! ```
//!
//! `f` is the deflection and `t` the shear stress. Cells outside the formula
//! range are left empty.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::errors::{CalcError, CalcResult};
use crate::settings::CalcSettings;
use crate::spring::SpringTable;

/// Write a spring table to any writer.
pub fn write_spring_table<W: Write>(table: &SpringTable, settings: &CalcSettings, writer: W) -> CalcResult<()> {
    let decimals = settings.table_decimals;
    let mut csv = csv::WriterBuilder::new()
        .delimiter(settings.delimiter_byte())
        .from_writer(writer);

    let mut header = vec![String::new()];
    let mut labels = vec![String::new()];
    for width in &table.wire_widths {
        header.push(format!("{:.*}", decimals, width));
        header.push(String::new());
        labels.push("f".to_string());
        labels.push("t".to_string());
    }
    csv.write_record(&header)?;
    csv.write_record(&labels)?;

    for (height, row) in table.wire_heights.iter().zip(&table.cells) {
        let mut record = vec![format!("{:.*}", decimals, height)];
        for cell in row {
            match cell {
                Some(case) => {
                    record.push(format!("{:.*}", decimals, case.deflection));
                    record.push(format!("{:.0}", case.shear_stress));
                }
                None => {
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }
        csv.write_record(&record)?;
    }
    csv.flush()
        .map_err(|e| CalcError::file_error("flush", "csv", e.to_string()))?;
    Ok(())
}

/// Write a spring table to `path`, replacing any existing file.
pub fn save_spring_table(table: &SpringTable, settings: &CalcSettings, path: &Path) -> CalcResult<()> {
    let file = File::create(path)
        .map_err(|e| CalcError::file_error("create", path.display().to_string(), e.to_string()))?;
    write_spring_table(table, settings, file)?;
    debug!(path = %path.display(), rows = table.wire_heights.len(), "spring table written");
    Ok(())
}

/// Render a spring table as a CSV string.
pub fn spring_table_to_string(table: &SpringTable, settings: &CalcSettings) -> CalcResult<String> {
    let mut buffer = Vec::new();
    write_spring_table(table, settings, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| CalcError::SerializationError { reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spring::LoadCase;

    fn table() -> SpringTable {
        let case = |deflection: f64, shear_stress: f64| LoadCase {
            load: 100.0,
            deflection,
            shear_stress,
            rate: 100.0 / deflection,
        };
        SpringTable {
            wire_widths: vec![3.0, 4.0],
            wire_heights: vec![10.0, 12.5],
            cells: vec![
                vec![Some(case(53.44, 987.2)), Some(case(50.1, 778.0))],
                vec![None, Some(case(45.83, 669.4))],
            ],
        }
    }

    #[test]
    fn test_layout() {
        let csv = spring_table_to_string(&table(), &CalcSettings::default()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, [",3.0,,4.0,", ",f,t,f,t", "10.0,53.4,987,50.1,778", "12.5,,,45.8,669"]);
    }

    #[test]
    fn test_delimiter_and_decimals() {
        let settings = CalcSettings {
            csv_delimiter: ';',
            table_decimals: 2,
            ..Default::default()
        };
        let csv = spring_table_to_string(&table(), &settings).unwrap();
        assert_eq!(csv.lines().nth(2), Some("10.00;53.44;987;50.10;778"));
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        save_spring_table(&table(), &CalcSettings::default(), &path).unwrap();

        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(&path).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 4);
        assert_eq!(&records[3][3], "45.8");
    }
}

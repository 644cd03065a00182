//! Purpose: Turn locale-formatted volume strings into numbers.
//! Exports: `normalize_volume`, `normalize_rows`.
//! Role: Second startup stage; converts melted rows into the immutable `ExportTable`.
//! Invariants: `.` is a thousands separator and `,` the decimal mark; both are fixed.
//! Invariants: Any cell outside that shape aborts the whole load.

use crate::core::error::{Error, ErrorKind};
use crate::core::load::LongRow;
use crate::core::record::{ExportRecord, ExportTable};

/// Parse a volume such as `"12.345,67"` into `12345.67`.
///
/// Every `.` is dropped and the single optional `,` becomes the decimal point.
/// Empty cells, letters, and special floats like `inf` are rejected.
pub fn normalize_volume(raw: &str) -> Result<f64, Error> {
    let value = raw.trim();
    if !is_locale_decimal(value) {
        return Err(Error::new(ErrorKind::Format)
            .with_message(format!("invalid volume {raw:?}"))
            .with_hint("Volumes must look like 12.345,67 (dot thousands, comma decimals)."));
    }
    let canonical: String = value
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let volume = canonical.parse::<f64>().map_err(|err| {
        Error::new(ErrorKind::Format)
            .with_message(format!("invalid volume {raw:?}"))
            .with_source(err)
    })?;
    if !volume.is_finite() {
        return Err(Error::new(ErrorKind::Format)
            .with_message(format!("volume {raw:?} is out of range")));
    }
    Ok(volume)
}

fn is_locale_decimal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let (integer, fraction) = match digits.split_once(',') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits, None),
    };
    if !integer.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    if !integer.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return false;
    }
    match fraction {
        Some(fraction) => !fraction.is_empty() && fraction.chars().all(|c| c.is_ascii_digit()),
        None => true,
    }
}

/// Normalize every melted row, keeping their order.
pub fn normalize_rows(rows: Vec<LongRow>) -> Result<ExportTable, Error> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let volume = normalize_volume(&row.raw_volume).map_err(|err| {
            let message = format!(
                "{} (region {}, sector {}, year {})",
                err.message().unwrap_or("invalid volume"),
                row.region,
                row.sector,
                row.year
            );
            let mut err = err.with_message(message).with_path(&row.path);
            if let Some(line) = row.line {
                err = err.with_line(line);
            }
            err
        })?;
        records.push(ExportRecord {
            sector: row.sector,
            year: row.year,
            volume,
            region: row.region,
        });
    }
    Ok(ExportTable::from_records(records))
}

#[cfg(test)]
mod tests {
    use super::{normalize_rows, normalize_volume};
    use crate::core::error::ErrorKind;
    use crate::core::load::LongRow;
    use std::path::PathBuf;

    #[test]
    fn parses_thousands_and_decimal_comma() {
        assert_eq!(normalize_volume("12.345,67").expect("volume"), 12345.67);
        assert_eq!(normalize_volume("1.234.567,5").expect("volume"), 1234567.5);
        assert_eq!(normalize_volume("0,25").expect("volume"), 0.25);
        assert_eq!(normalize_volume("1.000").expect("volume"), 1000.0);
        assert_eq!(normalize_volume("987").expect("volume"), 987.0);
    }

    #[test]
    fn trims_and_accepts_negative_values() {
        assert_eq!(normalize_volume("  42,5 ").expect("volume"), 42.5);
        assert_eq!(normalize_volume("-1.500,75").expect("volume"), -1500.75);
    }

    #[test]
    fn rejects_values_outside_locale_shape() {
        for raw in ["", "   ", "abc", "1,2,3", "12,", ",5", "inf", "NaN", "1e5", "12 345"] {
            let err = normalize_volume(raw).expect_err(raw);
            assert_eq!(err.kind(), ErrorKind::Format, "{raw:?}");
        }
    }

    #[test]
    fn rejects_volumes_that_overflow() {
        let huge = format!("1{}", "0".repeat(400));
        let err = normalize_volume(&huge).expect_err("overflow");
        assert_eq!(err.kind(), ErrorKind::Format);
        let negative = format!("-{huge},5");
        let err = normalize_volume(&negative).expect_err("overflow");
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(normalize_volume(&"9".repeat(300)).expect("volume").is_finite());
    }

    #[test]
    fn normalize_rows_reports_row_context() {
        let rows = vec![LongRow {
            sector: "Agricultura".to_string(),
            year: "2020".to_string(),
            raw_volume: "n/d".to_string(),
            region: "Sevilla".to_string(),
            path: PathBuf::from("sevilla.csv"),
            line: Some(3),
        }];
        let err = normalize_rows(rows).expect_err("bad volume");
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.path().and_then(|p| p.to_str()), Some("sevilla.csv"));
        let message = err.message().expect("message");
        assert!(message.contains("Sevilla"));
        assert!(message.contains("Agricultura"));
    }
}

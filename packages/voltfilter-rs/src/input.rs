//! CSV input
//!
//! Extracts a single numeric column from an uploaded CSV document. Missing
//! values are filled with zero, matching how the recordings are exported.

use crate::error::InputError;

/// Header of the column holding the voltage samples
pub const VOLTAGE_COLUMN: &str = "Voltaje (mV)";

/// Cell contents treated as a missing value
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(field: &str) -> bool {
    NA_TOKENS.contains(&field)
}

/// Read `column` from CSV `bytes` as a series of `f64`.
///
/// Missing cells, including those cut off by a short row, become `0.0`.
/// Rows with more fields than the header are rejected. Row numbers in errors
/// count data rows from 1.
pub fn read_voltage_column(bytes: &[u8], column: &str) -> Result<Vec<f64>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers().map_err(|e| {
        log::debug!("Unreadable CSV header: {}", e);
        InputError::EmptyOrInvalid
    })?;
    if headers.is_empty() {
        return Err(InputError::EmptyOrInvalid);
    }
    let width = headers.len();

    let index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| InputError::MissingColumn(column.to_string()))?;

    let mut series = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            log::debug!("Malformed CSV record {}: {}", i + 1, e);
            InputError::EmptyOrInvalid
        })?;
        if record.len() > width {
            log::debug!(
                "CSV record {} has {} fields, header has {}",
                i + 1,
                record.len(),
                width
            );
            return Err(InputError::EmptyOrInvalid);
        }
        let field = record.get(index).unwrap_or("");

        if is_missing(field) {
            series.push(0.0);
            continue;
        }

        let value = field.parse::<f64>().map_err(|_| InputError::InvalidValue {
            row: i + 1,
            value: field.to_string(),
        })?;
        series.push(value);
    }

    if series.is_empty() {
        return Err(InputError::EmptyOrInvalid);
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_column() {
        let csv = "Tiempo (s),Voltaje (mV)\n0.000,1.5\n0.002,-2.25\n0.004,3\n";
        let series = read_voltage_column(csv.as_bytes(), VOLTAGE_COLUMN).unwrap();
        assert_eq!(series, vec![1.5, -2.25, 3.0]);
    }

    #[test]
    fn test_trims_whitespace() {
        let csv = "Tiempo (s), Voltaje (mV) \n0, 1.0 \n1,2.0\n";
        let series = read_voltage_column(csv.as_bytes(), VOLTAGE_COLUMN).unwrap();
        assert_eq!(series, vec![1.0, 2.0]);
    }

    #[test]
    fn test_missing_values_become_zero() {
        let csv = "Voltaje (mV)\n1.0\nNaN\n\"\"\nNA\nnull\n2.0\n";
        let series = read_voltage_column(csv.as_bytes(), VOLTAGE_COLUMN).unwrap();
        assert_eq!(series, vec![1.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_missing_column() {
        let err = read_voltage_column(b"voltage\n1.0\n", VOLTAGE_COLUMN).unwrap_err();
        assert_eq!(err, InputError::MissingColumn(VOLTAGE_COLUMN.to_string()));
    }

    #[test]
    fn test_empty_bytes() {
        assert_eq!(
            read_voltage_column(b"", VOLTAGE_COLUMN).unwrap_err(),
            InputError::EmptyOrInvalid
        );
    }

    #[test]
    fn test_header_only() {
        assert_eq!(
            read_voltage_column(b"Voltaje (mV)\n", VOLTAGE_COLUMN).unwrap_err(),
            InputError::EmptyOrInvalid
        );
    }

    #[test]
    fn test_short_row_is_missing_value() {
        let csv = "Tiempo (s),Voltaje (mV)\n0,1.0\n0.002\n0.004,3.0\n";
        let series = read_voltage_column(csv.as_bytes(), VOLTAGE_COLUMN).unwrap();
        assert_eq!(series, vec![1.0, 0.0, 3.0]);
    }

    #[test]
    fn test_long_row_is_invalid() {
        let csv = "a,Voltaje (mV)\n1,2\n3,4,5\n";
        assert_eq!(
            read_voltage_column(csv.as_bytes(), VOLTAGE_COLUMN).unwrap_err(),
            InputError::EmptyOrInvalid
        );
    }

    #[test]
    fn test_invalid_value() {
        let csv = "Voltaje (mV)\n1.0\nabc\n";
        assert_eq!(
            read_voltage_column(csv.as_bytes(), VOLTAGE_COLUMN).unwrap_err(),
            InputError::InvalidValue {
                row: 2,
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_infinity_parses() {
        let series = read_voltage_column(b"Voltaje (mV)\ninf\n", VOLTAGE_COLUMN).unwrap();
        assert!(series[0].is_infinite());
    }
}

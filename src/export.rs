/// CSV export of a reservoir's reading history.
///
/// Format: UTF-8 with BOM (so spreadsheet tools detect the encoding), header
/// `时间,水位 (m),库容 (亿m³)`, one row per reading in ascending time order.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Reading;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const CSV_HEADER: [&str; 3] = ["时间", "水位 (m)", "库容 (亿m³)"];

/// Timestamp column format. Sub-second precision is kept when present.
pub const EXPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to flush CSV output: {0}")]
    Flush(String),
}

/// One exported row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "时间", with = "export_time")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "水位 (m)")]
    pub water_level: f64,
    #[serde(rename = "库容 (亿m³)")]
    pub storage: f64,
}

impl From<&Reading> for ExportRow {
    fn from(reading: &Reading) -> Self {
        ExportRow {
            timestamp: reading.timestamp,
            water_level: reading.water_level,
            storage: reading.storage,
        }
    }
}

mod export_time {
    use super::EXPORT_TIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(EXPORT_TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, EXPORT_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// File name offered for a reservoir's export.
pub fn export_file_name(reservoir_name: &str) -> String {
    format!("{}_history.csv", reservoir_name)
}

/// Serializes an ascending history to BOM-prefixed CSV bytes.
pub fn history_to_csv(history: &[Reading]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(UTF8_BOM.to_vec());

    writer.write_record(CSV_HEADER)?;
    for reading in history {
        writer.serialize(ExportRow::from(reading))?;
    }

    writer.into_inner().map_err(|e| ExportError::Flush(e.to_string()))
}

/// Parses bytes produced by `history_to_csv`. A leading BOM is optional.
pub fn parse_history_csv(bytes: &[u8]) -> Result<Vec<ExportRow>, ExportError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(body);

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn history() -> Vec<Reading> {
        let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        vec![
            Reading {
                id: 1,
                reservoir_id: 1,
                timestamp: day.and_hms_opt(8, 0, 0).unwrap(),
                water_level: 140.0,
                storage: 280.5,
            },
            Reading {
                id: 2,
                reservoir_id: 1,
                timestamp: day.and_hms_micro_opt(9, 30, 15, 123_456).unwrap(),
                water_level: 150.25,
                storage: 301.0,
            },
        ]
    }

    #[test]
    fn test_output_starts_with_bom_and_header() {
        let bytes = history_to_csv(&history()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("时间,水位 (m),库容 (亿m³)"));
        assert_eq!(lines.next(), Some("2024-07-01 08:00:00,140.0,280.5"));
        assert_eq!(lines.next(), Some("2024-07-01 09:30:15.123456,150.25,301.0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_round_trip_preserves_rows_and_order() {
        let original = history();
        let parsed = parse_history_csv(&history_to_csv(&original).unwrap()).unwrap();

        assert_eq!(parsed.len(), original.len());
        for (row, reading) in parsed.iter().zip(&original) {
            assert_eq!(row, &ExportRow::from(reading));
        }
    }

    #[test]
    fn test_empty_history_is_header_only() {
        let bytes = history_to_csv(&[]).unwrap();
        assert_eq!(parse_history_csv(&bytes).unwrap(), Vec::new());
        assert!(bytes.ends_with("库容 (亿m³)\n".as_bytes()));
    }

    #[test]
    fn test_parse_without_bom() {
        let rows = parse_history_csv("时间,水位 (m),库容 (亿m³)\n2024-07-01 08:00:00,140.0,280.5\n".as_bytes())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].water_level, 140.0);
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("三峡水库"), "三峡水库_history.csv");
    }
}

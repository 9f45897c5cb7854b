//! CSV ingestion boundary (§4.9).
//!
//! This module owns all dynamic-typing risk: everything downstream of
//! [`ingest`] sees only typed [`Record`]s. Header renaming uses `csv`'s
//! `ReaderBuilder` directly; a missing required column is a hard failure
//! listing every absence, not just the first one found.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use csv::ReaderBuilder;

use crate::errors::{Error, Result};
use crate::ids;
use crate::model::Record;

const REQUIRED_HEADERS: &[(&str, &str)] = &[
    ("Account ID", "account_id_src"),
    ("Account Name", "account_name"),
    ("Created Date", "created_date"),
    ("Relationship", "relationship"),
];

/// Spreadsheet serial-date epoch (1899-12-30, the common Excel/Sheets
/// convention that treats 1900 as a leap year).
const SPREADSHEET_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Read RFC 4180 CSV from `source` and produce typed, canonicalized
/// [`Record`]s.
///
/// # Errors
///
/// Returns [`Error::MissingColumn`] if any of the four required headers are
/// absent, or [`Error::InvalidIdentifier`]/[`Error::DuplicateIdentifier`] if
/// an `account_id_src` value fails canonicalization or uniqueness. A
/// malformed `created_date` does not fail the row (§7): the field becomes
/// `None` and is recoverable.
pub fn ingest(source: &str) -> Result<Vec<Record>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(source.as_bytes());

    let headers = reader.headers().map_err(|_| {
        Error::MissingColumn(REQUIRED_HEADERS.iter().map(|(h, _)| h.to_string()).collect())
    })?;
    let header_list: Vec<String> = headers.iter().map(|h| h.to_string()).collect();

    let mut missing = Vec::new();
    let mut column_index = Vec::with_capacity(REQUIRED_HEADERS.len());
    for (source_name, _) in REQUIRED_HEADERS {
        match header_list.iter().position(|h| h == source_name) {
            Some(idx) => column_index.push(idx),
            None => missing.push(source_name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(Error::MissingColumn(missing));
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|_| Error::MissingColumn(vec!["<unparseable row>".to_string()]))?;

        let account_id_src = row.get(column_index[0]).unwrap_or("").trim().to_string();
        let account_name = row.get(column_index[1]).unwrap_or("").trim().to_string();
        let created_raw = row.get(column_index[2]).unwrap_or("").trim().to_string();
        let relationship = row.get(column_index[3]).unwrap_or("").trim().to_string();

        let account_id = ids::canonicalize(&account_id_src)?;
        let created_date = parse_created_date(&created_raw);
        if created_date.is_none() && !created_raw.is_empty() {
            let diagnostic = Error::MalformedDate {
                account_id: account_id.clone(),
                raw: created_raw.clone(),
            };
            tracing::warn!("{diagnostic}");
        }

        records.push(Record {
            account_id,
            account_id_src,
            account_name,
            created_date,
            relationship,
        });
    }

    ids::check_uniqueness(records.iter().map(|r| r.account_id.as_str()))?;
    Ok(records)
}

/// Parse `raw` as ISO-8601 or a spreadsheet serial integer. Returns `None`
/// (⊥) rather than an error on failure (§7, §4.9).
fn parse_created_date(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = raw.parse::<i64>() {
        let (y, m, d) = SPREADSHEET_EPOCH;
        let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
        let date = epoch.checked_add_signed(chrono::Duration::days(naive))?;
        let datetime = date.and_hms_opt(0, 0, 0)?;
        return Utc.from_local_datetime(&datetime).single();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Account ID,Account Name,Created Date,Relationship\n\
001A000000BcDeF,Acme Inc,2020-01-01T00:00:00Z,Customer\n\
001A000000BcDeG,Widget LLC,44197,Partner\n";

    #[test]
    fn test_ingest_parses_rows() {
        let records = ingest(CSV).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].account_name, "Acme Inc");
        assert_eq!(records[0].account_id.len(), 18);
    }

    #[test]
    fn test_ingest_parses_iso8601_date() {
        let records = ingest(CSV).unwrap();
        assert!(records[0].created_date.is_some());
    }

    #[test]
    fn test_ingest_parses_spreadsheet_serial_date() {
        let records = ingest(CSV).unwrap();
        assert!(records[1].created_date.is_some());
    }

    #[test]
    fn test_ingest_missing_column_lists_all_missing() {
        let csv = "Account ID,Account Name\n001A000000BcDeF,Acme Inc\n";
        let err = ingest(csv).unwrap_err();
        match err {
            Error::MissingColumn(cols) => {
                assert!(cols.contains(&"Created Date".to_string()));
                assert!(cols.contains(&"Relationship".to_string()));
            }
            _ => panic!("expected MissingColumn"),
        }
    }

    #[test]
    fn test_ingest_malformed_date_becomes_none_not_error() {
        let csv = "Account ID,Account Name,Created Date,Relationship\n\
001A000000BcDeF,Acme Inc,not-a-date,Customer\n";
        let records = ingest(csv).unwrap();
        assert_eq!(records[0].created_date, None);
    }

    #[test]
    fn test_ingest_duplicate_ids_rejected() {
        let csv = "Account ID,Account Name,Created Date,Relationship\n\
001A000000BcDeF,Acme Inc,,Customer\n\
001A000000BcDeF,Acme Inc 2,,Customer\n";
        let err = ingest(csv).unwrap_err();
        assert!(matches!(err, Error::DuplicateIdentifier { .. }));
    }

    #[test]
    fn test_ingest_invalid_identifier_rejected() {
        let csv = "Account ID,Account Name,Created Date,Relationship\n\
TOO-SHORT,Acme Inc,,Customer\n";
        let err = ingest(csv).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(_)));
    }

    #[test]
    fn test_ingest_empty_created_date_is_none() {
        let csv = "Account ID,Account Name,Created Date,Relationship\n\
001A000000BcDeF,Acme Inc,,Customer\n";
        let records = ingest(csv).unwrap();
        assert_eq!(records[0].created_date, None);
    }

    #[test]
    fn test_ingest_reads_a_real_file_on_disk() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{CSV}").unwrap();
        let contents = std::fs::read_to_string(file.path()).unwrap();
        let records = ingest(&contents).unwrap();
        assert_eq!(records.len(), 2);
    }
}

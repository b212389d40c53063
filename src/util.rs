use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;

pub fn now_utc_string() -> String {
    utc_string(Utc::now())
}

pub fn utc_string(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn utc_date_compact(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%d").to_string()
}

/// Parses an audit timestamp. Offset-less forms are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    write_bytes(path, &data, true)
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    write_bytes(path, contents.as_bytes(), false)
}

fn write_bytes(path: &Path, data: &[u8], trailing_newline: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let mut file =
        File::create(path).with_context(|| format!("failed to create file: {}", path.display()))?;
    file.write_all(data)
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    if trailing_newline {
        file.write_all(b"\n")
            .with_context(|| format!("failed to finalize file: {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parse_timestamp_accepts_rfc3339_and_offsets() {
        let parsed = parse_timestamp("2025-12-30T10:00:00Z").expect("rfc3339 timestamp");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 12, 30, 10, 0, 0).unwrap());

        let shifted = parse_timestamp("2025-12-30T12:00:00+02:00").expect("offset timestamp");
        assert_eq!(shifted, parsed);
    }

    #[test]
    fn parse_timestamp_reads_offsetless_forms_as_utc() {
        assert_eq!(
            parse_timestamp("2025-12-30T10:00:00.250"),
            Some(Utc.with_ymd_and_hms(2025, 12, 30, 10, 0, 0).unwrap() + chrono::Duration::milliseconds(250))
        );
        assert_eq!(
            parse_timestamp("2025-12-30"),
            Some(Utc.with_ymd_and_hms(2025, 12, 30, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("2025-13-40T00:00:00Z").is_none());
    }

    #[test]
    fn utc_helpers_format_expected_shapes() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 5, 8, 9, 10).unwrap();
        assert_eq!(utc_string(ts), "2026-01-05T08:09:10.000Z");
        assert_eq!(utc_date_compact(ts), "20260105");
    }
}

use std::fmt::Display;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::ClientError;

const PICKER_FORMAT: &str = "%Y-%m-%dT%H:%M";
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a server timestamp. Offset-less values are read as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Milliseconds since the epoch; absent or unparseable values sort as epoch 0.
pub fn sort_key_millis(raw: Option<&str>) -> i64 {
    raw.and_then(parse_instant)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Converts a picker value to the instant string sent to the API.
///
/// An empty picker maps to `None`.
pub fn picker_to_instant<Tz: TimeZone>(
    value: &str,
    tz: &Tz,
) -> Result<Option<String>, ClientError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let naive = NaiveDateTime::parse_from_str(value, PICKER_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| {
            ClientError::validation("timestamp", format!("'{value}' is not YYYY-MM-DDTHH:MM"))
        })?;
    let local = tz.from_local_datetime(&naive).earliest().ok_or_else(|| {
        ClientError::validation("timestamp", format!("'{value}' does not exist in this time zone"))
    })?;
    Ok(Some(
        local
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    ))
}

/// Renders a stored timestamp back into a picker value, or `""`.
pub fn instant_to_picker<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    raw.and_then(parse_instant)
        .map(|dt| dt.with_timezone(tz).format(PICKER_FORMAT).to_string())
        .unwrap_or_default()
}

/// Table rendering: `HH:MM - DD/MM/YYYY`, or `-` when absent or unparseable.
pub fn format_display<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    raw.and_then(parse_instant)
        .map(|dt| dt.with_timezone(tz).format("%H:%M - %d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

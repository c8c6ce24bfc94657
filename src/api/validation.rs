use chrono::{DateTime, NaiveDateTime, Utc};

use super::ApiError;

/// Trimmed value, or `None` when absent or blank.
#[must_use]
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Requires every field to be present, failing with `message` otherwise.
pub fn require_all(fields: &[Option<&str>], message: &str) -> Result<(), ApiError> {
    if fields.iter().all(|f| present(*f).is_some()) {
        Ok(())
    } else {
        Err(ApiError::validation(message))
    }
}

/// Accepts RFC 3339, or the naive `YYYY-MM-DDTHH:MM[:SS]` produced by
/// `datetime-local` inputs, which is taken as UTC.
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(ApiError::validation("Invalid date format."))
}

use crate::error::AppError;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn format_rfc3339(value: OffsetDateTime) -> Result<String, AppError> {
    value
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn now_rfc3339() -> Result<String, AppError> {
    format_rfc3339(OffsetDateTime::now_utc())
}

pub fn parse_rfc3339(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

/// Parses a due date as accepted from users: RFC3339, a local
/// `YYYY-MM-DDTHH:MM[:SS]`, or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_due_date(value: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(parsed) = parse_rfc3339(trimmed) {
        return Some(parsed);
    }

    let minutes = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    let seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(naive) = PrimitiveDateTime::parse(trimmed, &seconds)
        .or_else(|_| PrimitiveDateTime::parse(trimmed, &minutes))
    {
        return Some(naive.assume_offset(offset));
    }

    let date_only = format_description!("[year]-[month]-[day]");
    Date::parse(trimmed, &date_only)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Validates and normalizes an optional due date input; blank means none.
pub fn normalize_due_date(value: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    if parse_due_date(raw, local_offset()).is_none() {
        return Err(AppError::invalid_input(
            "due date must be YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC3339",
        ));
    }
    Ok(Some(raw.to_string()))
}

pub fn unix_millis(value: OffsetDateTime) -> u64 {
    let millis = value.unix_timestamp_nanos() / 1_000_000;
    u64::try_from(millis).unwrap_or(0)
}

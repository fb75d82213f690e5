//! Date and time handling for the TickTick API.
//!
//! TickTick transports timestamps as strings shaped like
//! `2024-07-27T10:00:00.000+0000`. Tool input arrives as ISO 8601 with or
//! without a time component or offset. Parsing of API-side strings is
//! deliberately lenient: a timestamp we cannot read is logged and treated as
//! "no date" rather than failing the whole operation.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{Result, TickTickError};

/// A parsed ISO 8601 input, remembering whether the source carried an
/// explicit offset and whether it was a bare date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoDateTime {
    pub naive: NaiveDateTime,
    pub offset: Option<FixedOffset>,
    pub date_only: bool,
}

impl IsoDateTime {
    /// Resolve to a UTC instant, interpreting a naive value in `tz`.
    pub fn to_utc(&self, tz: &Tz) -> Result<DateTime<Utc>> {
        match self.offset {
            Some(offset) => {
                let local = offset
                    .from_local_datetime(&self.naive)
                    .single()
                    .ok_or_else(|| {
                        TickTickError::Validation(format!(
                            "Ambiguous datetime {} for offset {offset}",
                            self.naive
                        ))
                    })?;
                Ok(local.with_timezone(&Utc))
            }
            None => {
                // For ambiguous local times (DST transitions) prefer the
                // earlier mapping, matching the service's own behavior.
                let local = tz
                    .from_local_datetime(&self.naive)
                    .earliest()
                    .ok_or_else(|| {
                        TickTickError::Validation(format!(
                            "Datetime {} does not exist in timezone {tz}",
                            self.naive
                        ))
                    })?;
                Ok(local.with_timezone(&Utc))
            }
        }
    }
}

/// Parse strict tool input: an ISO 8601 date or datetime, with an optional
/// UTC offset. Rejects anything else.
pub fn parse_iso(input: &str) -> Result<IsoDateTime> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(IsoDateTime {
            naive: dt.naive_local(),
            offset: Some(*dt.offset()),
            date_only: false,
        });
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(IsoDateTime {
            naive,
            offset: None,
            date_only: false,
        });
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(IsoDateTime {
            naive: date.and_hms_opt(0, 0, 0).expect("midnight is valid"),
            offset: None,
            date_only: true,
        });
    }
    Err(TickTickError::invalid_date(input))
}

/// Parse a timestamp as returned by the TickTick API. Lenient: accepts the
/// native `.000+0000` shape, RFC 3339 (including `Z`), naive datetimes and
/// bare dates. Returns `None` (with a warning) for anything unreadable.
pub fn parse_task_date(raw: &str) -> Option<IsoDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(IsoDateTime {
            naive: dt.naive_local(),
            offset: Some(*dt.offset()),
            date_only: false,
        });
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(IsoDateTime {
            naive: dt.naive_local(),
            offset: Some(*dt.offset()),
            date_only: false,
        });
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(IsoDateTime {
            naive,
            offset: None,
            date_only: false,
        });
    }
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(IsoDateTime {
            naive: date.and_hms_opt(0, 0, 0).expect("midnight is valid"),
            offset: None,
            date_only: true,
        });
    }
    warn!(raw, "could not parse task date string");
    None
}

/// The calendar day a task timestamp falls on, seen from `tz` (or the local
/// zone when no filter zone is given).
pub fn task_date_in_zone(raw: &str, tz: Option<Tz>) -> Option<NaiveDate> {
    let parsed = parse_task_date(raw)?;
    match parsed.offset {
        Some(offset) => {
            let instant = offset.from_local_datetime(&parsed.naive).single()?;
            let zone = tz.unwrap_or_else(local_zone);
            Some(instant.with_timezone(&zone).date_naive())
        }
        None => Some(parsed.naive.date()),
    }
}

/// Look up an IANA timezone by name.
pub fn parse_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| TickTickError::invalid_timezone(name))
}

/// The system's IANA timezone, falling back to UTC when it cannot be
/// determined.
pub fn local_zone() -> Tz {
    match iana_time_zone::get_timezone() {
        Ok(name) => name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(zone = %name, "system timezone not in TZ database, using UTC");
            Tz::UTC
        }),
        Err(err) => {
            warn!(error = %err, "could not determine system timezone, using UTC");
            Tz::UTC
        }
    }
}

/// Render a UTC instant in the TickTick wire format.
pub fn format_utc(instant: DateTime<Utc>) -> String {
    format!("{}.000+0000", instant.format("%Y-%m-%dT%H:%M:%S"))
}

/// Convert a parsed ISO input to the TickTick wire format, interpreting
/// naive values in `tz`. This is the `ticktick_convert_datetime_to_
/// ticktick_format` primitive and the builder's date normalization.
pub fn to_ticktick_format(parsed: &IsoDateTime, tz: &Tz) -> Result<String> {
    Ok(format_utc(parsed.to_utc(tz)?))
}

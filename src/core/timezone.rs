use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

/// ToyyibPay reports wall-clock times in Malaysia time (UTC+8), without an offset.
const MALAYSIA_OFFSET_SECS: i32 = 8 * 3600;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// All timestamps are stored as UTC; gateway timestamps are normalized through here.
pub struct TimezoneConverter;

impl TimezoneConverter {
    pub fn malaysia_offset() -> FixedOffset {
        FixedOffset::east_opt(MALAYSIA_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
    }

    /// Convert a UTC timestamp to Malaysia time for gateway-facing text
    pub fn utc_to_malaysia(utc_time: DateTime<Utc>) -> DateTime<FixedOffset> {
        utc_time.with_timezone(&Self::malaysia_offset())
    }

    /// Parse a gateway timestamp into UTC.
    ///
    /// RFC 3339 input keeps its own offset; naive input is read as Malaysia time.
    /// Returns `None` for empty or unrecognized input.
    pub fn parse_gateway_time(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }

        NAIVE_FORMATS.iter().find_map(|format| {
            NaiveDateTime::parse_from_str(raw, format)
                .ok()
                .and_then(|naive| {
                    Self::malaysia_offset()
                        .from_local_datetime(&naive)
                        .single()
                })
                .map(|local| local.with_timezone(&Utc))
        })
    }
}

/// Format timestamp as ISO 8601 UTC for API responses
pub fn format_iso8601(utc_time: DateTime<Utc>) -> String {
    utc_time.to_rfc3339()
}

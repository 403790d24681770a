//! Timestamp handling
//!
//! The backend writes ISO 8601 timestamps, sometimes without an offset.
//! Values without an offset are UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Formats accepted for timestamps that carry no offset
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a backend timestamp into UTC
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// `#[serde(with = "flexible")]` for required timestamps
pub mod flexible {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}

/// `#[serde(with = "flexible_option")]` for optional timestamps
pub mod flexible_option {
    use super::*;

    pub fn serialize<S: Serializer>(
        dt: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_naive_is_utc() {
        let dt = parse_timestamp("2025-03-01T10:15:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_with_fraction() {
        let dt = parse_timestamp("2025-03-01T10:15:00.123456").unwrap();
        assert_eq!(dt.timestamp(), Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap().timestamp());
    }

    #[test]
    fn test_parse_with_offset() {
        let dt = parse_timestamp("2025-03-01T12:15:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("yesterday-ish").is_none());
    }
}

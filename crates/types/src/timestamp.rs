//! Fixed RFC 3339 timestamp representation.
//!
//! Timestamps are stored with millisecond granularity, so they are rendered
//! with exactly three fractional digits and a `Z` suffix, e.g.
//! `2024-05-01T12:30:00.250Z`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format an instant the way every chatwire payload does.
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for `#[serde(with = "chatwire_types::timestamp")]`.
pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(ts))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_uses_millis_and_zulu() {
        let ts = Utc.timestamp_millis_opt(1_714_566_600_250).unwrap();
        assert_eq!(format(&ts), "2024-05-01T12:30:00.250Z");
    }

    #[test]
    fn test_format_pads_whole_seconds() {
        let ts = Utc.timestamp_millis_opt(1_714_566_600_000).unwrap();
        assert_eq!(format(&ts), "2024-05-01T12:30:00.000Z");
    }

    #[test]
    fn test_deserialize_accepts_offsets() {
        let ts: DateTime<Utc> =
            deserialize(serde_json::Value::String("2024-05-01T14:30:00.250+02:00".into()))
                .unwrap();
        assert_eq!(ts.timestamp_millis(), 1_714_566_600_250);
    }
}

//! Date fields entered by hand
//!
//! Stored as `YYYY-MM-DD` text; an empty string means "not set".

use chrono::NaiveDate;

pub(crate) mod optional_date {
    use super::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where D: Deserializer<'de> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse(s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

/// Parse a `YYYY-MM-DD` date, ignoring any time part after `T`
pub fn parse(s: &str) -> Result<NaiveDate, String> {
    let date_part = s.split('T').next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", s, e))
}

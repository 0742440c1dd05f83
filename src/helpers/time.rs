use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio::time::Instant;

pub const CHANGES_SINCE_FORMAT: &str = "%Y-%m-%d";

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn get_instant() -> Instant {
    Instant::now()
}

/// Watermark as sent in the `changesSince` query parameter, no time component.
pub fn format_changes_since(date: NaiveDate) -> String {
    date.format(CHANGES_SINCE_FORMAT).to_string()
}

pub fn parse_changes_since(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, CHANGES_SINCE_FORMAT)
}

/// Accepts `2016-05-15`, `2016-05-15T00:00:00`, fractional seconds and RFC 3339 offsets.
fn parse_api_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, CHANGES_SINCE_FORMAT) {
        return Some(date);
    }
    if let Ok(date_time) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(date_time.date());
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}

/// serde adapter for the API's date fields
pub mod api_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_changes_since(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_api_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw)))
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => serializer.serialize_str(&super::super::format_changes_since(*date)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::super::parse_api_date(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw))),
            }
        }
    }
}

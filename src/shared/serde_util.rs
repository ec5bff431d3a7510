//! Custom serde helpers for backend wire formats.

/// Deserializes an identifier that the backend may send either as a JSON
/// number (`Long` ids) or as a string.
pub mod string_or_number {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Uint(u64),
        Float(f64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Str(s) => s,
            Raw::Int(i) => i.to_string(),
            Raw::Uint(u) => u.to_string(),
            Raw::Float(f) => f.to_string(),
        })
    }
}

/// Treats an explicit `null` the same as a missing field.
pub mod null_as_default {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}

/// Deserializes a server timestamp into `Option<NaiveDateTime>`.
///
/// The backend serializes `LocalDateTime` as an ISO string or, depending on
/// its Jackson configuration, as an `[y, m, d, h, min, s, nanos]` array.
/// Epoch milliseconds are accepted too. Anything else yields `None`.
pub mod lenient_datetime {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(parse))
    }

    fn parse(value: &Value) -> Option<NaiveDateTime> {
        match value {
            Value::String(s) => parse_str(s),
            Value::Array(parts) => parse_parts(parts),
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| dt.naive_utc()),
            _ => None,
        }
    }

    fn parse_str(s: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_utc());
        }
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }

    fn parse_parts(parts: &[Value]) -> Option<NaiveDateTime> {
        let nums: Vec<u32> = parts
            .iter()
            .map(|p| p.as_u64().and_then(|n| u32::try_from(n).ok()))
            .collect::<Option<_>>()?;
        let at = |i: usize| nums.get(i).copied().unwrap_or(0);
        let year = i32::try_from(*nums.first()?).ok()?;
        NaiveDate::from_ymd_opt(year, at(1), at(2))?.and_hms_nano_opt(at(3), at(4), at(5), at(6))
    }
}

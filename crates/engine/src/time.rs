use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

/// Coerces a playback timestamp into a usable number of seconds.
///
/// Non-finite values collapse to `0.0`; everything else passes through
/// unchanged, including negative values.
///
/// # Example
/// ```
/// use engine::time::seconds_or_zero;
///
/// assert_eq!(seconds_or_zero(f64::NAN), 0.0);
/// assert_eq!(seconds_or_zero(1.25), 1.25);
/// ```
pub fn seconds_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Parses a user-typed seconds value, falling back to `0.0`.
///
/// # Example
/// ```
/// use engine::time::parse_seconds_or_zero;
///
/// assert_eq!(parse_seconds_or_zero(" 2.50 "), 2.5);
/// assert_eq!(parse_seconds_or_zero("abc"), 0.0);
/// ```
pub fn parse_seconds_or_zero(input: &str) -> f64 {
    input
        .trim()
        .parse::<f64>()
        .map(seconds_or_zero)
        .unwrap_or(0.0)
}

/// Formats seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Negative and non-finite inputs are clamped to zero. Milliseconds are
/// rounded to the nearest whole millisecond.
///
/// # Example
/// ```
/// use engine::time::format_srt_timestamp;
///
/// assert_eq!(format_srt_timestamp(3_723.5), "01:02:03,500");
/// ```
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_millis = (seconds_or_zero(seconds).max(0.0) * 1_000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1_000;
    let millis = total_millis % 1_000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Deserializes seconds from a number, a numeric string, or anything else as `0.0`.
pub fn deserialize_seconds<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LenientNumber::deserialize(deserializer)? {
        LenientNumber::Number(value) => seconds_or_zero(value),
        LenientNumber::Text(text) => parse_seconds_or_zero(&text),
        LenientNumber::Other(_) => 0.0,
    })
}

/// Deserializes an optional number; unusable input becomes `None`.
pub fn deserialize_optional_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LenientNumber::deserialize(deserializer)? {
        LenientNumber::Number(value) if value.is_finite() => Some(value),
        LenientNumber::Text(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite()),
        _ => None,
    })
}

/// Deserializes a non-negative count (`"3"`, `3`, `3.7`), defaulting to `0`.
pub fn deserialize_count<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match LenientNumber::deserialize(deserializer)? {
        LenientNumber::Number(value) => value,
        LenientNumber::Text(text) => parse_seconds_or_zero(&text),
        LenientNumber::Other(_) => 0.0,
    };
    if !value.is_finite() || value <= 0.0 {
        return Ok(0);
    }
    Ok(value.floor().min(f64::from(u32::MAX)) as u32)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::{format_srt_timestamp, parse_seconds_or_zero, seconds_or_zero};

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "super::deserialize_seconds")]
        at: f64,
        #[serde(default, deserialize_with = "super::deserialize_count")]
        count: u32,
        #[serde(default, deserialize_with = "super::deserialize_optional_number")]
        size: Option<f64>,
    }

    #[test]
    fn infinite_seconds_collapse_to_zero() {
        assert_eq!(seconds_or_zero(f64::INFINITY), 0.0);
        assert_eq!(seconds_or_zero(-3.0), -3.0);
    }

    #[test]
    fn empty_input_parses_as_zero() {
        assert_eq!(parse_seconds_or_zero(""), 0.0);
        assert_eq!(parse_seconds_or_zero("NaN"), 0.0);
    }

    #[test]
    fn srt_timestamp_rounds_to_whole_milliseconds() {
        assert_eq!(format_srt_timestamp(2.3), "00:00:02,300");
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(-4.0), "00:00:00,000");
    }

    #[test]
    fn lenient_fields_accept_strings_nulls_and_garbage() {
        let fields: Fields =
            serde_json::from_str(r#"{"at":"1.5","count":"4","size":null}"#).expect("decode");
        assert_eq!(fields.at, 1.5);
        assert_eq!(fields.count, 4);
        assert_eq!(fields.size, None);

        let fields: Fields =
            serde_json::from_str(r#"{"at":{"nested":true},"count":-2,"size":"31"}"#)
                .expect("decode");
        assert_eq!(fields.at, 0.0);
        assert_eq!(fields.count, 0);
        assert_eq!(fields.size, Some(31.0));

        let fields: Fields = serde_json::from_str("{}").expect("decode");
        assert_eq!(fields.at, 0.0);
    }
}

// src/parser.rs
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Lenient float parse: reads the longest numeric prefix after leading
/// whitespace, so `"12.5 SOL"` gives `12.5` and `"abc"` gives `None`.
/// Non-finite results are rejected.
pub fn parse_float(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // optional exponent, only taken when it has digits
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Lenient integer parse: the float prefix truncated toward zero.
pub fn parse_int(raw: &str) -> Option<f64> {
    parse_float(raw).map(f64::trunc)
}

/// Parse a creation timestamp. Accepts RFC3339, a naive
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` (read as UTC), or a bare
/// epoch in milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    s.parse::<i64>().ok().and_then(timestamp_from_millis)
}

pub fn timestamp_from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_prefixes() {
        assert_eq!(parse_float("240"), Some(240.0));
        assert_eq!(parse_float("  12.5 SOL"), Some(12.5));
        assert_eq!(parse_float("-3e2"), Some(-300.0));
        assert_eq!(parse_float("1e"), Some(1.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("7."), Some(7.0));
    }

    #[test]
    fn float_rejects_garbage() {
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("-"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("1e999"), None);
    }

    #[test]
    fn int_truncates() {
        assert_eq!(parse_int("12.9"), Some(12.0));
        assert_eq!(parse_int("-4.2"), Some(-4.0));
        assert_eq!(parse_int("x1"), None);
    }

    #[test]
    fn timestamps() {
        let expected = Utc.with_ymd_and_hms(2025, 5, 1, 13, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-05-01T13:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-05-01T15:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-05-01 13:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-05-01T13:30:00.000"), Some(expected));
        assert_eq!(
            parse_timestamp(&expected.timestamp_millis().to_string()),
            Some(expected)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}

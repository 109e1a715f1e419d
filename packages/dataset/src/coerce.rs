//! Text-to-value coercion shared by the table readers.

use chrono::NaiveDate;

/// Text values treated as "no value", compared case-insensitively.
const MISSING_SENTINELS: &[&str] = &["", "unknown", "nan", "na", "null"];

/// Whether `raw` holds a missing-value sentinel.
#[must_use]
pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    MISSING_SENTINELS
        .iter()
        .any(|sentinel| trimmed.eq_ignore_ascii_case(sentinel))
}

/// Failure to coerce a present value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoerceError {
    Invalid,
    Negative,
}

/// Parses a floating-point measurement.
pub fn real(raw: &str) -> Result<Option<f64>, CoerceError> {
    if is_missing(raw) {
        return Ok(None);
    }
    let value: f64 = raw.trim().parse().map_err(|_| CoerceError::Invalid)?;
    if value.is_finite() {
        Ok(Some(value))
    } else {
        Err(CoerceError::Invalid)
    }
}

/// Parses a whole number that may have been written as `4` or `4.0`.
#[allow(clippy::cast_possible_truncation)]
pub fn whole(raw: &str) -> Result<Option<i64>, CoerceError> {
    if is_missing(raw) {
        return Ok(None);
    }
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(Some(value));
    }
    let value: f64 = trimmed.parse().map_err(|_| CoerceError::Invalid)?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Ok(Some(value as i64))
    } else {
        Err(CoerceError::Invalid)
    }
}

/// Parses a non-negative count.
pub fn count(raw: &str) -> Result<Option<u32>, CoerceError> {
    match whole(raw)? {
        None => Ok(None),
        Some(value) if value < 0 => Err(CoerceError::Negative),
        Some(value) => u32::try_from(value)
            .map(Some)
            .map_err(|_| CoerceError::Invalid),
    }
}

/// Parses an amount in whole DKK. Fractional øre are rounded.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn amount(raw: &str) -> Result<Option<u64>, CoerceError> {
    if is_missing(raw) {
        return Ok(None);
    }
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return u64::try_from(value)
            .map(Some)
            .map_err(|_| CoerceError::Negative);
    }
    let value: f64 = trimmed.parse().map_err(|_| CoerceError::Invalid)?;
    if !value.is_finite() || value >= 1.8e19 {
        Err(CoerceError::Invalid)
    } else if value < 0.0 {
        Err(CoerceError::Negative)
    } else {
        Ok(Some(value.round() as u64))
    }
}

/// Parses `YYYY-MM-DD`, ignoring any trailing time part.
pub fn date(raw: &str) -> Result<Option<NaiveDate>, CoerceError> {
    if is_missing(raw) {
        return Ok(None);
    }
    let day = raw
        .trim()
        .split(['T', ' '])
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| CoerceError::Invalid)
}

/// Returns the trimmed text, or `None` for a sentinel.
pub fn text(raw: &str) -> Option<String> {
    if is_missing(raw) {
        None
    } else {
        Some(raw.trim().to_string())
    }
}

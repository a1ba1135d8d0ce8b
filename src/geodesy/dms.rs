//! Sexagesimal (degree/minute/second) coordinates.
//!
//! Input strings come from a form and are typed by people, so parsing accepts:
//! - `°` or `º` as the degree sign
//! - typographic/prime quote variants (`’ ‘ ′` for minutes, `” “ ″` or `''` for seconds)
//! - comma decimal separators (`10,5"`)
//! - arbitrary whitespace and an optional direction letter (N/S/E/W)
//!
//! No rounding is applied: the decimal value feeds the contour geometry directly.

use crate::error::EngineError;

const FIELD: &str = "coordinate";

/// Convert a sexagesimal string such as `23°32'51.3" S` to signed decimal degrees.
///
/// The result is negated for `S`/`W` directions (or a leading minus sign).
pub fn to_decimal_degrees(dms: &str) -> Result<f64, EngineError> {
    let normalized: String = dms
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            'º' => '°',
            '’' | '‘' | '′' | '´' | '`' => '\'',
            '”' | '“' | '″' => '"',
            ',' => '.',
            other => other,
        })
        .collect::<String>()
        .replace("''", "\"");

    let mut negative = false;
    let mut body = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        match c {
            'S' | 'W' => negative = true,
            'N' | 'E' => {}
            c if c.is_ascii_alphabetic() => {
                return Err(EngineError::format(FIELD, dms, format!("unexpected direction letter '{c}'")));
            }
            c => body.push(c),
        }
    }

    let body = match body.strip_prefix('-') {
        Some(rest) => {
            negative = true;
            rest.to_string()
        }
        None => body,
    };

    let (degree, rest) = body
        .split_once('°')
        .ok_or_else(|| EngineError::format(FIELD, dms, "missing degree sign (°)"))?;
    let (minute, rest) = rest
        .split_once('\'')
        .ok_or_else(|| EngineError::format(FIELD, dms, "missing minute mark (')"))?;
    let (second, trailing) = rest
        .split_once('"')
        .ok_or_else(|| EngineError::format(FIELD, dms, "missing second mark (\")"))?;
    if !trailing.is_empty() {
        return Err(EngineError::format(FIELD, dms, format!("unexpected trailing text '{trailing}'")));
    }

    let degree = parse_segment(degree, "degrees", dms)?;
    let minute = parse_segment(minute, "minutes", dms)?;
    let second = parse_segment(second, "seconds", dms)?;

    let decimal = degree + minute / 60.0 + second / 3600.0;
    Ok(if negative { -decimal } else { decimal })
}

/// Format decimal degrees as `D°M'S.sss"X` with `precision` decimals on the seconds.
///
/// `is_latitude` selects the N/S versus E/W direction letters.
pub fn format_dms(decimal: f64, is_latitude: bool, precision: usize) -> String {
    let direction = match (is_latitude, decimal < 0.0) {
        (true, false) => 'N',
        (true, true) => 'S',
        (false, false) => 'E',
        (false, true) => 'W',
    };

    let scale = 10f64.powi(precision as i32);
    // Work in rounded seconds so a value like 59.99999 does not print as 60.
    let total_seconds = (decimal.abs() * 3600.0 * scale).round() / scale;
    let degrees = (total_seconds / 3600.0).floor();
    let minutes = ((total_seconds - degrees * 3600.0) / 60.0).floor();
    let seconds = total_seconds - degrees * 3600.0 - minutes * 60.0;

    format!(
        "{}°{}'{:.*}\"{}",
        degrees as u32, minutes as u32, precision, seconds.max(0.0), direction
    )
}

fn parse_segment(raw: &str, what: &str, original: &str) -> Result<f64, EngineError> {
    let value = raw
        .parse::<f64>()
        .map_err(|_| EngineError::format(FIELD, original, format!("{what} segment '{raw}' is not a number")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::format(FIELD, original, format!("{what} segment '{raw}' is out of range")));
    }
    Ok(value)
}

//! # Frequency String Parsing
//!
//! Accepts plain decimal Hz values (`"147435000"`), SI-suffixed values
//! (`"147.435M"`, `"14.074k"`, `"3.5G"`), and the ham-radio convention
//! where a unit letter embedded in the digits stands in for the decimal
//! point (`"147m435"` == `147.435` MHz). This is defined only by example
//! in the source material (see Open Questions); the behavior here is the
//! literal reading — the letter's position marks where the decimal point
//! goes, and its identity (`k`/`m`/`g`, case-insensitive) picks the SI
//! scale applied to the whole number.

use crate::error::RadioError;

/// Parses a frequency string into Hz.
pub fn parse_frequency(s: &str) -> Result<f64, RadioError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(RadioError::BadFrequency(s.to_string()));
    }

    if let Some(hz) = parse_funky(s) {
        return Ok(hz);
    }

    parse_plain_or_suffixed(s)
}

/// The `147m435` form: exactly one unit letter with decimal digits on
/// both sides (an optional leading sign belongs to the integer part).
fn parse_funky(s: &str) -> Option<f64> {
    let letter_positions: Vec<usize> = s
        .char_indices()
        .filter(|(_, c)| matches!(c, 'k' | 'K' | 'm' | 'M' | 'g' | 'G'))
        .map(|(i, _)| i)
        .collect();
    let &pos = letter_positions.first()?;
    if letter_positions.len() != 1 {
        return None;
    }

    let unit = s[pos..].chars().next()?;
    let int_part = &s[..pos];
    let frac_part = &s[pos + unit.len_utf8()..];
    if frac_part.is_empty() || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, int_part),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let combined = format!("{digits}.{frac_part}");
    let value: f64 = combined.parse().ok()?;
    let scale = si_scale(unit)?;
    Some(sign * value * scale)
}

/// A plain decimal, optionally followed by a single SI suffix letter
/// (`k`/`K`, `m`/`M`, `g`/`G`).
fn parse_plain_or_suffixed(s: &str) -> Result<f64, RadioError> {
    let bad = || RadioError::BadFrequency(s.to_string());

    let last = s.chars().last().ok_or_else(bad)?;
    let (number_str, scale) = match si_scale(last) {
        Some(scale) if !last.is_ascii_digit() => (&s[..s.len() - last.len_utf8()], scale),
        _ => (s, 1.0),
    };

    let value: f64 = number_str.trim().parse().map_err(|_| bad())?;
    if !value.is_finite() {
        return Err(bad());
    }
    Ok(value * scale)
}

fn si_scale(unit: char) -> Option<f64> {
    match unit {
        'k' | 'K' => Some(1e3),
        'm' | 'M' => Some(1e6),
        'g' | 'G' => Some(1e9),
        _ => None,
    }
}

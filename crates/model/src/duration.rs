//! ISO-8601 duration parsing.
//!
//! The catalog reports video lengths as ISO-8601 durations such as
//! `PT3M30S` or `P1DT2H`. This module converts them into total seconds.
//!
//! Supported designators:
//! - date section: `W` (weeks), `D` (days)
//! - time section (after `T`): `H`, `M`, `S`
//!
//! Values may carry a decimal fraction (`PT1.5S`, `,` is accepted as the
//! separator too). Years and months are rejected because they have no fixed
//! length in seconds.

use crate::error::DurationParseError;

const DATE_UNITS: &[(char, f64)] = &[('W', 604_800.0), ('D', 86_400.0)];
const TIME_UNITS: &[(char, f64)] = &[('H', 3_600.0), ('M', 60.0), ('S', 1.0)];

/// Parse an ISO-8601 duration into total seconds.
///
/// ```
/// use model::parse_duration;
///
/// assert_eq!(parse_duration("PT3M30S").unwrap(), 210.0);
/// assert_eq!(parse_duration("PT1H").unwrap(), 3600.0);
/// assert!(parse_duration("XYZ").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<f64, DurationParseError> {
    let trimmed = input.trim();
    let rest = trimmed
        .strip_prefix('P')
        .ok_or_else(|| DurationParseError::new(input, "missing leading 'P'"))?;

    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    if date_part.is_empty() && time_part.is_none_or(str::is_empty) {
        return Err(DurationParseError::new(input, "no components"));
    }
    if time_part == Some("") {
        return Err(DurationParseError::new(input, "empty time section after 'T'"));
    }
    if date_part.contains(['Y', 'M']) {
        return Err(DurationParseError::new(
            input,
            "year and month components have no fixed length",
        ));
    }

    let mut total = sum_section(input, date_part, DATE_UNITS)?;
    if let Some(time) = time_part {
        total += sum_section(input, time, TIME_UNITS)?;
    }
    Ok(total)
}

/// Sum one section (date or time) of a duration.
///
/// Each designator may appear at most once and in the order given by `units`.
fn sum_section(
    input: &str,
    section: &str,
    units: &[(char, f64)],
) -> Result<f64, DurationParseError> {
    let mut total = 0.0;
    let mut number = String::new();
    let mut next_unit = 0;

    for ch in section.chars() {
        match ch {
            '0'..='9' | '.' => number.push(ch),
            ',' => number.push('.'),
            _ => {
                let position = units
                    .iter()
                    .position(|(designator, _)| *designator == ch)
                    .ok_or_else(|| {
                        DurationParseError::new(input, format!("unexpected designator '{}'", ch))
                    })?;
                if position < next_unit {
                    return Err(DurationParseError::new(
                        input,
                        format!("designator '{}' repeated or out of order", ch),
                    ));
                }
                if number.is_empty() {
                    return Err(DurationParseError::new(
                        input,
                        format!("designator '{}' has no value", ch),
                    ));
                }
                let value: f64 = number.parse().map_err(|_| {
                    DurationParseError::new(input, format!("invalid number '{}'", number))
                })?;
                total += value * units[position].1;
                number.clear();
                next_unit = position + 1;
            }
        }
    }

    if !number.is_empty() {
        return Err(DurationParseError::new(
            input,
            format!("trailing value '{}' without designator", number),
        ));
    }
    Ok(total)
}

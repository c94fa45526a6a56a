//! Turns caller-supplied positions into a [`SkyPosition`] in degrees.
//!
//! Text positions are an RA token followed by a Dec token:
//!
//! ```text
//! Decimal degrees:      10.6846 41.2692      10.6846, 41.2692     10.6846d +41.2692d
//! Letter sexagesimal:   00h42m44.3s +41d16m09s
//! Colon sexagesimal:    00:42:44.3 +41:16:09
//! Space sexagesimal:    00 42 44.3 +41 16 09
//! ```
//!
//! Sexagesimal RA is read as hours unless written with a `d` marker; Dec is
//! always degrees. Object names are not parsed here: text starting with a
//! letter is left to a [`NameResolver`](crate::domain::ports::NameResolver).

use crate::domain::model::{PositionInput, SkyPosition};
use crate::utils::error::{ConeError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static SEXAGESIMAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        ^([+-])?                      # sign
        (\d{1,3})                     # hours or degrees
        ([hHdD:°])                    # unit marker
        (\d{1,2})                     # minutes
        [mM':]
        (\d{1,2}(?:\.\d*)?)           # seconds
        [sS"]?$
        "#,
    )
    .expect("sexagesimal pattern is valid")
});

static DEGREE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?\d+(?:\.\d*)?|[+-]?\.\d+)[dD°]$").expect("degree pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Ra,
    Dec,
}

/// Resolves any accepted input shape to a position.
pub fn normalize_position(input: &PositionInput) -> Result<SkyPosition> {
    match input {
        PositionInput::Resolved(position) => Ok(*position),
        PositionInput::Pair(ra, dec) => SkyPosition::new(*ra, *dec),
        PositionInput::Text(text) => parse_coordinates(text),
    }
}

/// Text that starts with a letter is an object name, not coordinates.
pub fn looks_like_name(text: &str) -> bool {
    text.trim_start().chars().next().is_some_and(char::is_alphabetic)
}

/// Parses free text holding an RA and a Dec.
pub fn parse_coordinates(text: &str) -> Result<SkyPosition> {
    let cleaned = text.trim().replace(',', " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    let (ra, dec) = match tokens.len() {
        2 => (
            parse_angle(tokens[0], Axis::Ra, text)?,
            parse_angle(tokens[1], Axis::Dec, text)?,
        ),
        6 => (
            parse_angle(&tokens[0..3].join(":"), Axis::Ra, text)?,
            parse_angle(&tokens[3..6].join(":"), Axis::Dec, text)?,
        ),
        _ => {
            return Err(ConeError::CoordinateParse {
                input: text.to_string(),
                reason: "expected an RA and a Dec separated by whitespace or a comma".to_string(),
            })
        }
    };

    SkyPosition::new(ra, dec).map_err(|e| match e {
        ConeError::CoordinateParse { reason, .. } => ConeError::CoordinateParse {
            input: text.to_string(),
            reason,
        },
        other => other,
    })
}

fn parse_angle(token: &str, axis: Axis, original: &str) -> Result<f64> {
    if let Ok(degrees) = token.parse::<f64>() {
        return Ok(degrees);
    }

    if let Some(caps) = DEGREE_REGEX.captures(token) {
        if let Ok(degrees) = caps[1].parse::<f64>() {
            return Ok(degrees);
        }
    }

    if let Some(caps) = SEXAGESIMAL_REGEX.captures(token) {
        let marker = &caps[3];
        if axis == Axis::Dec && matches!(marker, "h" | "H") {
            return Err(ConeError::CoordinateParse {
                input: original.to_string(),
                reason: format!("declination '{}' cannot be given in hours", token),
            });
        }

        let sign = caps
            .get(1)
            .map_or(1.0, |m| if m.as_str() == "-" { -1.0 } else { 1.0 });
        let whole: f64 = parse_field(&caps[2], original)?;
        let minutes: f64 = parse_field(&caps[4], original)?;
        let seconds: f64 = parse_field(&caps[5], original)?;

        if minutes >= 60.0 || seconds >= 60.0 {
            return Err(ConeError::CoordinateParse {
                input: original.to_string(),
                reason: format!("minutes and seconds must be below 60 in '{}'", token),
            });
        }

        let value = sign * (whole + minutes / 60.0 + seconds / 3600.0);
        let in_hours = axis == Axis::Ra && !matches!(marker, "d" | "D" | "°");
        return Ok(if in_hours { value * 15.0 } else { value });
    }

    let which = match axis {
        Axis::Ra => "right ascension",
        Axis::Dec => "declination",
    };
    Err(ConeError::CoordinateParse {
        input: original.to_string(),
        reason: format!("cannot read '{}' as a {}", token, which),
    })
}

fn parse_field(field: &str, original: &str) -> Result<f64> {
    field.parse::<f64>().map_err(|_| ConeError::CoordinateParse {
        input: original.to_string(),
        reason: format!("'{}' is not a number", field),
    })
}

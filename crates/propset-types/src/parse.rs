//! Textual parsing of property values.
//!
//! Used by command-line and configuration front ends, which receive every
//! value as text. [`Value::parse_as`] converts to an explicit kind;
//! [`Value::infer_from_str`] guesses the kind the way `set_as_actual_kind`
//! would for the parsed payload.

use chrono::{DateTime, Utc};

use crate::error::ValueError;
use crate::kind::Kind;
use crate::object::PropertyObject;
use crate::value::Value;

fn unparseable(kind: Kind, input: &str, reason: impl ToString) -> ValueError {
    ValueError::Unparseable {
        kind,
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

/// Numeric text that does not survive a parse and print unchanged: a
/// leading `+`, or a zero followed by more digits (`007`, `-01.5`).
fn has_unstable_number_form(s: &str) -> bool {
    if s.starts_with('+') {
        return true;
    }
    let digits = s.strip_prefix('-').unwrap_or(s).as_bytes();
    digits.len() > 1 && digits[0] == b'0' && digits[1].is_ascii_digit()
}

fn parse_date(input: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(input).map(|d| d.with_timezone(&Utc))
}

impl Value {
    /// Parse `input` as a value of `kind`.
    ///
    /// Dates use RFC 3339; objects are JSON documents. STRING input longer
    /// than 255 code units is rejected.
    pub fn parse_as(kind: Kind, input: &str) -> Result<Self, ValueError> {
        let value = match kind {
            Kind::Boolean => input
                .trim()
                .parse::<bool>()
                .map(Value::Boolean)
                .map_err(|e| unparseable(kind, input, e))?,
            Kind::Int => input
                .trim()
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|e| unparseable(kind, input, e))?,
            Kind::Long => input
                .trim()
                .parse::<i64>()
                .map(Value::Long)
                .map_err(|e| unparseable(kind, input, e))?,
            Kind::Double => input
                .trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|e| unparseable(kind, input, e))?,
            Kind::String => Value::String(input.to_string()),
            Kind::Text => Value::Text(input.to_string()),
            Kind::Date => parse_date(input.trim())
                .map(Value::Date)
                .map_err(|e| unparseable(kind, input, e))?,
            Kind::Object => serde_json::from_str::<serde_json::Value>(input)
                .map(|v| Value::Object(PropertyObject::Json(v)))
                .map_err(|e| unparseable(kind, input, e))?,
        };
        value.check_constraints()?;
        Ok(value)
    }

    /// Guess the kind of `input`: boolean, 32-bit integer, 64-bit integer,
    /// finite float, RFC 3339 date, then STRING or TEXT by length.
    ///
    /// Text a number would not reproduce (`007`, `+5`, `-0`, `inf`, `NaN`,
    /// integers past the 64-bit range) stays textual.
    pub fn infer_from_str(input: &str) -> Self {
        let trimmed = input.trim();
        if let Ok(b) = trimmed.parse::<bool>() {
            return Value::Boolean(b);
        }
        if !has_unstable_number_form(trimmed) {
            if let Ok(i) = trimmed.parse::<i32>() {
                if i.to_string() == trimmed {
                    return Value::Int(i);
                }
            }
            if let Ok(l) = trimmed.parse::<i64>() {
                if l.to_string() == trimmed {
                    return Value::Long(l);
                }
            }
            let fractional = trimmed.contains(['.', 'e', 'E']);
            if let Ok(d) = trimmed.parse::<f64>() {
                if fractional && d.is_finite() {
                    return Value::Double(d);
                }
            }
        }
        if let Ok(date) = parse_date(trimmed) {
            return Value::Date(date);
        }
        Value::from(input)
    }
}

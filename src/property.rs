//! Inbound property updates and the property table.
//!
//! DESIGN
//! ======
//! The transport delivers `(id, name, value)` triples with loosely typed JSON
//! values. [`PROPERTY_TABLE`] maps every known wire name to a parser that
//! produces a typed [`Change`]; the reducer then matches on `Change`
//! exhaustively. Names missing from the table become [`Change::Other`].
//!
//! Numeric properties accept anything that reads as a finite number the way a
//! browser client would coerce it: JSON numbers, numeric strings (trimmed,
//! empty counts as zero, `0x`/`0o`/`0b` prefixes allowed), booleans, null, and
//! arrays of at most one such element. Everything else is malformed and the
//! update is dropped.

#[cfg(test)]
#[path = "property_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::participant::ParticipantId;

/// One property change for one remote participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyUpdate {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl PropertyUpdate {
    #[must_use]
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { id: id.into(), name: name.into(), value: value.into() }
    }

    /// Parse the value through the property table. `None` means malformed.
    #[must_use]
    pub fn change(&self) -> Option<Change> {
        match PROPERTY_TABLE.iter().find(|(name, _)| *name == self.name) {
            Some((_, parse)) => parse(&self.value),
            None => Some(Change::Other { name: self.name.clone(), value: self.value.clone() }),
        }
    }
}

/// A typed property change.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    X(f64),
    Y(f64),
    View(f64),
    Loop(f64),
    Cel(f64),
    Room(String),
    Say(String),
    Disconnect,
    Other { name: String, value: Value },
}

impl Change {
    /// Wire name of the property this change carries.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::X(_) => "x",
            Self::Y(_) => "y",
            Self::View(_) => "view",
            Self::Loop(_) => "loop",
            Self::Cel(_) => "cel",
            Self::Room(_) => "room",
            Self::Say(_) => "say",
            Self::Disconnect => "disconnect",
            Self::Other { name, .. } => name,
        }
    }
}

type Parser = fn(&Value) -> Option<Change>;

/// Wire name to typed parser, one entry per known property.
pub static PROPERTY_TABLE: &[(&str, Parser)] = &[
    ("x", parse_x),
    ("y", parse_y),
    ("view", parse_view),
    ("loop", parse_loop),
    ("cel", parse_cel),
    ("room", parse_room),
    ("say", parse_say),
    ("disconnect", parse_disconnect),
];

fn parse_x(value: &Value) -> Option<Change> {
    coerce_number(value).map(Change::X)
}

fn parse_y(value: &Value) -> Option<Change> {
    coerce_number(value).map(Change::Y)
}

fn parse_view(value: &Value) -> Option<Change> {
    coerce_number(value).map(Change::View)
}

fn parse_loop(value: &Value) -> Option<Change> {
    coerce_number(value).map(Change::Loop)
}

fn parse_cel(value: &Value) -> Option<Change> {
    coerce_number(value).map(Change::Cel)
}

fn parse_room(value: &Value) -> Option<Change> {
    Some(Change::Room(coerce_text(value)))
}

fn parse_say(value: &Value) -> Option<Change> {
    Some(Change::Say(coerce_text(value)))
}

fn parse_disconnect(_: &Value) -> Option<Change> {
    Some(Change::Disconnect)
}

/// Read a JSON value as a finite number, or `None` if it is not one.
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_numeric(s)?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            // a lone boolean or object stringifies to something non-numeric
            [Value::Bool(_) | Value::Object(_)] => return None,
            [only] => coerce_number(only)?,
            _ => return None,
        },
        Value::Object(_) => return None,
    };
    n.is_finite().then_some(n)
}

fn parse_numeric(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    let radix = match s.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return s.parse::<f64>().ok(),
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return None;
    }
    digits
        .chars()
        .try_fold(0.0, |acc: f64, c| c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d)))
}

/// Read a JSON value as display text.
#[must_use]
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

//! Dynamically typed variable values and the central coercion policy.

use std::fmt;

use crate::round;
use crate::state::Coord;

/// A value stored in a global, tile or unit variable bag.
///
/// Storage is untyped; well-known keys get their canonical kind from the
/// typed accessors below, which define the zero/default policy once:
///
/// | accessor   | Int      | Float        | Bool   | Str                 | Coord  |
/// |------------|----------|--------------|--------|---------------------|--------|
/// | `as_int`   | itself   | rounded      | 0 / 1  | parsed, else 0      | 0      |
/// | `as_float` | widened  | itself       | 0 / 1  | parsed, else 0.0    | 0.0    |
/// | `as_bool`  | `!= 0`   | `!= 0.0`     | itself | non-empty, not "false" | true |
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Coord(Coord),
}

impl Value {
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(v) => *v,
            Value::Float(v) => round::to_int(*v),
            Value::Bool(v) => i64::from(*v),
            Value::Str(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().map(round::to_int))
                    .unwrap_or(0)
            }
            Value::Coord(_) => 0,
        }
    }

    pub fn as_float(&self) -> f64 {
        match self {
            Value::Int(v) => *v as f64,
            Value::Float(v) if v.is_finite() => *v,
            Value::Float(_) => 0.0,
            Value::Bool(v) => f64::from(u8::from(*v)),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0),
            Value::Coord(_) => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Bool(v) => *v,
            Value::Str(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
            Value::Coord(_) => true,
        }
    }

    /// Coordinate view; non-coordinate values read as `None`.
    pub fn as_coord(&self) -> Option<Coord> {
        match self {
            Value::Coord(c) => Some(*c),
            _ => None,
        }
    }

    /// String view used for tag-like comparisons (`Team`, `Role`).
    pub fn as_text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// True for `Int` and `Float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Adds `delta` keeping the integer kind when both sides are integral.
    pub fn add(&self, delta: &Value) -> Value {
        match (self, delta) {
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                Value::Float(self.as_float() + delta.as_float())
            }
            _ => Value::Int(self.as_int().saturating_add(delta.as_int())),
        }
    }

    /// Short kind label used in diagnostics and digests.
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Coord(_) => "coord",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Coord(c) => write!(f, "{c}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Coord> for Value {
    fn from(value: Coord) -> Self {
        Value::Coord(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_coercion_follows_policy() {
        assert_eq!(Value::Float(2.5).as_int(), 3);
        assert_eq!(Value::Bool(true).as_int(), 1);
        assert_eq!(Value::from("42").as_int(), 42);
        assert_eq!(Value::from("4.6").as_int(), 5);
        assert_eq!(Value::from("abc").as_int(), 0);
        assert_eq!(Value::Coord(Coord::new(3, 4)).as_int(), 0);
    }

    #[test]
    fn bool_coercion_treats_false_string_as_false() {
        assert!(!Value::from("false").as_bool());
        assert!(!Value::from("").as_bool());
        assert!(Value::from("yes").as_bool());
        assert!(!Value::Int(0).as_bool());
    }

    #[test]
    fn add_preserves_integer_kind() {
        assert_eq!(Value::Int(2).add(&Value::Int(3)), Value::Int(5));
        assert_eq!(Value::Int(2).add(&Value::Float(0.5)), Value::Float(2.5));
        assert_eq!(Value::from("x").add(&Value::Int(1)), Value::Int(1));
    }
}

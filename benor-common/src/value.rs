//! value.rs
//!
//! The binary consensus value. On the wire this is `0`, `1` or the
//! undecided marker `"?"` — anything else (including `null`) is a hard
//! deserialization error so malformed votes are rejected at the boundary.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A node's working value: one of the two binary proposals, or not yet
/// settled on either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Zero,
    One,
    Undecided,
}

impl Value {
    /// True for `Zero`/`One`, false for the `"?"` marker.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Value::Undecided)
    }

    /// The opposite binary value. `Undecided` stays `Undecided`.
    pub fn flipped(&self) -> Value {
        match self {
            Value::Zero => Value::One,
            Value::One => Value::Zero,
            Value::Undecided => Value::Undecided,
        }
    }
}

impl std::str::FromStr for Value {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Value::Zero),
            "1" => Ok(Value::One),
            "?" => Ok(Value::Undecided),
            other => Err(format!("invalid value {other:?}, expected 0, 1 or ?")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Zero => write!(f, "0"),
            Value::One => write!(f, "1"),
            Value::Undecided => write!(f, "?"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Zero => serializer.serialize_u64(0),
            Value::One => serializer.serialize_u64(1),
            Value::Undecided => serializer.serialize_str("?"),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0, 1 or \"?\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        match v {
            0 => Ok(Value::Zero),
            1 => Ok(Value::One),
            other => Err(E::custom(format!("invalid vote value: {other}"))),
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        if v < 0 {
            return Err(E::custom(format!("invalid vote value: {v}")));
        }
        self.visit_u64(v as u64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        match v {
            "?" => Ok(Value::Undecided),
            other => Err(E::custom(format!("invalid vote value: {other:?}"))),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

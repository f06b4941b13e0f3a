//! Tagged key/value model.
//!
//! Callers hand the adapter heterogeneous arguments as `&dyn ToValue`. Each
//! one is copied into an owned [`Value`] before anything is logged, so the
//! record never borrows from the call site.
//!
//! ```rust
//! use kvlog::{Level, Serde, ToValue, Value};
//!
//! assert_eq!("id".to_value().unwrap(), Value::Str("id".into()));
//! assert_eq!(42u16.to_value().unwrap(), Value::Uint(42));
//! assert_eq!(Level::Warn.to_value().unwrap(), Value::Level(Level::Warn));
//! assert!(Serde(vec![1, 2]).to_value().is_ok());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::Error;
use crate::level::Level;

/// Rendering of [`Value::Missing`], the value appended to odd-length lists.
pub const MISSING: &str = "(MISSING)";

/// Contextual fields, keyed by name. One value per key; last write wins.
pub type Fields = BTreeMap<String, Value>;

/// One key or value of a log record.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    /// The rendered message of an error.
    Error(String),
    Level(Level),
    /// Arbitrary serde-serializable data, see [`Serde`].
    Json(serde_json::Value),
    /// Stands in for the value of a trailing key that had none.
    Missing,
}

impl Value {
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self::Error(err.to_string())
    }

    /// The string payload, if this is a [`Value::Str`]. Only these can be field names.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_level(&self) -> Option<Level> {
        match self {
            Self::Level(l) => Some(*l),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) | Self::Error(s) => serializer.serialize_str(s),
            Self::Int(i)                  => serializer.serialize_i64(*i),
            Self::Uint(u)                 => serializer.serialize_u64(*u),
            Self::Float(f)                => serializer.serialize_f64(*f),
            Self::Bool(b)                 => serializer.serialize_bool(*b),
            Self::Level(l)                => l.serialize(serializer),
            Self::Json(v)                 => v.serialize(serializer),
            Self::Missing                 => serializer.serialize_str(MISSING),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) | Self::Error(s) => f.write_str(s),
            Self::Int(i)                  => write!(f, "{i}"),
            Self::Uint(u)                 => write!(f, "{u}"),
            Self::Float(x)                => write!(f, "{x}"),
            Self::Bool(b)                 => write!(f, "{b}"),
            Self::Level(l)                => f.write_str(l.as_str()),
            Self::Json(v)                 => write!(f, "{v}"),
            Self::Missing                 => f.write_str(MISSING),
        }
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

macro_rules! from_via {
    ($variant:ident($target:ty): $($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self { Self::$variant(v as $target) }
            }
        )+
    };
}

from_via!(Int(i64): i8, i16, i32, i64, isize);
from_via!(Uint(u64): u8, u16, u32, u64, usize);
from_via!(Float(f64): f32, f64);

impl From<bool> for Value {
    fn from(v: bool) -> Self { Self::Bool(v) }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self { Self::Str(v.to_owned()) }
}

impl From<String> for Value {
    fn from(v: String) -> Self { Self::Str(v) }
}

impl From<Level> for Value {
    fn from(v: Level) -> Self { Self::Level(v) }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self { Self::Json(v) }
}

// ── ToValue ───────────────────────────────────────────────────────────────────

/// Copies a caller-supplied argument into an owned [`Value`].
///
/// Implemented for strings, numbers, `bool`, [`Level`], [`Value`], `Option`
/// and anything wrapped in [`Serde`]. Only the serde path can fail; its
/// failure surfaces as [`Error::Copy`].
pub trait ToValue {
    fn to_value(&self) -> Result<Value, Error>;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Result<Value, Error> {
        (**self).to_value()
    }
}

impl ToValue for str {
    fn to_value(&self) -> Result<Value, Error> {
        Ok(Value::Str(self.to_owned()))
    }
}

macro_rules! to_value_by_clone {
    ($($t:ty),+) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Result<Value, Error> { Ok(Value::from(self.clone())) }
            }
        )+
    };
}

to_value_by_clone!(
    String, bool, Level, serde_json::Value,
    i8, i16, i32, i64, isize,
    u8, u16, u32, u64, usize,
    f32, f64
);

impl ToValue for Value {
    fn to_value(&self) -> Result<Value, Error> {
        Ok(self.clone())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Result<Value, Error> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Json(serde_json::Value::Null)),
        }
    }
}

/// Logs any `Serialize` type as structured JSON data.
///
/// Serialization happens when the argument is copied, so a type that fails
/// to serialize (a map with non-string keys, a custom impl returning an
/// error) makes the logging call return [`Error::Copy`].
#[derive(Clone, Debug)]
pub struct Serde<T>(pub T);

impl<T: Serialize> ToValue for Serde<T> {
    fn to_value(&self) -> Result<Value, Error> {
        serde_json::to_value(&self.0)
            .map(Value::Json)
            .map_err(Error::copy)
    }
}

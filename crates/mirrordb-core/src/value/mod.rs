mod tag;

pub use tag::ValueTag;

use crate::types::{Float64, Timestamp};
use mirrordb_schema::types::Arg;
use serde::Serialize;

///
/// Value
///
/// One scalar attribute value.
///
/// None → the field's value is unset (optional field without a value).
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float64(Float64),
    Text(String),
    Timestamp(Timestamp),
}

impl Value {
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_uint(&self) -> Option<u64> {
        match self {
            Self::Uint(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert a schema default literal into its runtime value.
    #[must_use]
    pub fn from_arg(arg: &Arg) -> Option<Self> {
        match arg {
            Arg::Bool(b) => Some(Self::Bool(*b)),
            Arg::Int(n) => Some(Self::Int(*n)),
            Arg::Uint(n) => Some(Self::Uint(*n)),
            Arg::Text(s) => Some(Self::Text(s.clone())),
            Arg::Float(f) => Float64::try_new(*f).map(Self::Float64),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Uint(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Float64> for Value {
    fn from(f: Float64) -> Self {
        Self::Float64(f)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Self::Timestamp(ts)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::None, Into::into)
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar environment value as written in the config file.
///
/// Numbers and booleans keep their type so the supervisor descriptor can
/// carry `PORT: 3000` rather than `PORT: "3000"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EnvValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// Environment variable map, ordered by key so rendered output is stable.
pub type EnvMap = BTreeMap<String, EnvValue>;

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for EnvValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for EnvValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<u16> for EnvValue {
    fn from(n: u16) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<bool> for EnvValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

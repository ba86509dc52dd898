//! Request parameter model and its wire serialization policy.
//!
//! The API accepts scalars or sequences for most parameters, plus one
//! quirk: resources that take a `settings` parameter return it as a list of
//! `{"key": ..., "value": ...}` objects, but expect it back flattened into
//! top-level `settings[KEY]=VALUE` entries. [`ParamValue`] makes all of
//! that explicit instead of guessing from runtime types:
//!
//! | variant         | wire form                                   |
//! |-----------------|---------------------------------------------|
//! | `Null`          | omitted entirely                            |
//! | `Bool`          | `1` / `0`, never `true` / `false`           |
//! | `Int`           | decimal                                     |
//! | `Str`           | verbatim (urlencoded on the wire)           |
//! | `Seq` (empty)   | omitted entirely                            |
//! | `Seq`           | one comma-joined entry                      |
//! | `Settings`      | one `settings[KEY]=VALUE` entry per setting |

use std::collections::BTreeMap;

/// Ordered mapping of parameter name to value, used for both query
/// parameters and form bodies.
pub type Params = BTreeMap<String, ParamValue>;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// No value; the parameter is not sent at all.
    Null,
    /// Sent as `1` or `0`, the literals the API expects.
    Bool(bool),
    Int(i64),
    Str(String),
    /// An ordered sequence, sent as a single comma-joined entry.
    Seq(Vec<String>),
    /// Settings entries, flattened to `settings[KEY]=VALUE` pairs.
    Settings(Vec<Setting>),
}

/// One settings entry as the API returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Setting {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::Seq(value)
    }
}

impl From<&[&str]> for ParamValue {
    fn from(value: &[&str]) -> Self {
        ParamValue::Seq(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Serializes params into wire pairs per the policy table above. The input
/// is never modified; retries re-use the same encoded pairs.
pub(crate) fn encode(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (name, value) in params {
        match value {
            ParamValue::Null => {}
            ParamValue::Bool(b) => {
                pairs.push((name.clone(), if *b { "1" } else { "0" }.to_string()));
            }
            ParamValue::Int(i) => pairs.push((name.clone(), i.to_string())),
            ParamValue::Str(s) => pairs.push((name.clone(), s.clone())),
            ParamValue::Seq(items) if items.is_empty() => {}
            ParamValue::Seq(items) => pairs.push((name.clone(), items.join(","))),
            ParamValue::Settings(settings) => {
                for setting in settings {
                    pairs.push((format!("settings[{}]", setting.key), setting.value.clone()));
                }
            }
        }
    }
    pairs
}

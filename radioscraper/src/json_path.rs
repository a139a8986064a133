//! Typed path evaluation over decoded JSON documents
//!
//! A path is an ordered list of segments: string segments index into
//! objects, integer segments index into arrays. In the station file a path is
//! written as a JSON array mixing both, e.g. `["now", "tracks", 0, "artist"]`.

use crate::error::ExtractionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One step of a [`evaluate`] path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "[{}]", i),
            PathSegment::Key(k) => write!(f, ".{}", k),
        }
    }
}

/// Name of a JSON node kind, for error messages
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Follows `path` from `root` and returns the node it designates.
pub fn evaluate<'a>(root: &'a Value, path: &[PathSegment]) -> Result<&'a Value, ExtractionError> {
    path.iter().try_fold(root, |node, segment| match segment {
        PathSegment::Key(key) => match node {
            Value::Object(map) => map
                .get(key)
                .ok_or_else(|| ExtractionError::MissingKey(key.clone())),
            other => Err(ExtractionError::ExpectedObject {
                key: key.clone(),
                found: kind_name(other),
            }),
        },
        PathSegment::Index(index) => match node {
            Value::Array(items) => items.get(*index).ok_or(ExtractionError::IndexOutOfRange {
                index: *index,
                len: items.len(),
            }),
            other => Err(ExtractionError::ExpectedArray {
                index: *index,
                found: kind_name(other),
            }),
        },
    })
}

/// Like [`evaluate`], but requires the leaf to be a string.
pub fn string_at<'a>(root: &'a Value, path: &[PathSegment]) -> Result<&'a str, ExtractionError> {
    match evaluate(root, path)? {
        Value::String(s) => Ok(s),
        other => Err(ExtractionError::NotAString(kind_name(other))),
    }
}

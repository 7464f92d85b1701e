use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A single result document as produced by a remote cursor.
pub type Document = Map<String, JsonValue>;

/// Identifier of a cursor open on a remote host.
///
/// Id `0` is reserved: it marks a cursor the remote has already closed, so
/// there is nothing left to fetch from it and nothing to kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorId(u64);

impl CursorId {
    pub const EXHAUSTED: CursorId = CursorId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_exhausted(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CursorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque tag naming the host a remote cursor lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostAndPort(String);

impl HostAndPort {
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for HostAndPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HostAndPort {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of the operation an execution context belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpId(pub u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Describes one remote partition's open result cursor.
///
/// Created when a `$mergeCursors` stage is configured or parsed. The
/// descriptor is moved, never shared: it lives in the stage until the first
/// pull and in the merger afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemoteCursor {
    pub host: HostAndPort,
    #[serde(rename = "id")]
    pub cursor_id: CursorId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub first_batch: Vec<Document>,
}

/// Converts a JSON object literal into a [`Document`]; non-object values
/// are wrapped under a `value` field.
pub fn document(value: JsonValue) -> Document {
    match value {
        JsonValue::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

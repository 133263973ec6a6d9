//! Push channel message payloads

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field whose presence asks the dashboard to refresh
pub const INCIDENT_ID_FIELD: &str = "incident_id";

/// Payload could not be decoded into a JSON object
#[derive(Debug, Error)]
#[error("malformed update payload: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// A decoded push message
///
/// The channel does not own the schema: the JSON object is passed through
/// untouched to every subscriber.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateMessage(Map<String, Value>);

impl UpdateMessage {
    /// Decode a wire frame. Anything other than a JSON object is rejected.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Incident identifier carried by the message, if any
    ///
    /// Accepts integers and numeric strings.
    pub fn incident_id(&self) -> Option<i64> {
        match self.0.get(INCIDENT_ID_FIELD)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for UpdateMessage {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

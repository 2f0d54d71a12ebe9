//! Actions
//!
//! An action is an immutable tagged record. The tag is the only routing key;
//! the payload is whatever the producer and the handlers for that tag agree on.
//! Serialized, an action looks like `{"type": "GAME_SCORE_ADD", "score": 10}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tag of the synthetic action fed to every leaf once, when the store is built
pub const INIT_TAG: &str = "@@saga-store/INIT";

/// A dispatched event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    tag: String,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Action {
    /// Create an action with an empty payload
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            payload: Map::new(),
        }
    }

    /// Add a payload field
    ///
    /// Setting `"type"` is ignored since it would shadow the tag when serialized.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "type" {
            self.payload.insert(key, value.into());
        }
        self
    }

    /// The synthetic initialization action
    pub fn init() -> Self {
        Self::new(INIT_TAG)
    }

    /// Build an action from its JSON form (`{"type": ..., ...payload}`)
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.payload.get(key).and_then(Value::as_i64)
    }

    /// Deserialize the payload into a typed struct
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.payload.clone()))
    }

    pub fn is_init(&self) -> bool {
        self.tag == INIT_TAG
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let action = Action::new("GAME_SCORE_ADD").with("score", 10);
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({"type": "GAME_SCORE_ADD", "score": 10})
        );
    }

    #[test]
    fn test_from_value() {
        let action = Action::from_value(json!({
            "type": "USER_RECEIVE_PROFILE",
            "error": "Not Found"
        }))
        .unwrap();
        assert_eq!(action.tag(), "USER_RECEIVE_PROFILE");
        assert_eq!(action.get_str("error"), Some("Not Found"));
        assert_eq!(action.get("name"), None);
    }

    #[test]
    fn test_from_value_requires_type() {
        assert!(Action::from_value(json!({"score": 1})).is_err());
    }

    #[test]
    fn test_with_ignores_type_key() {
        let action = Action::new("A").with("type", "B");
        assert_eq!(action.tag(), "A");
        assert!(action.payload().is_empty());
    }

    #[test]
    fn test_payload_as() {
        #[derive(Deserialize)]
        struct Nested {
            id: String,
            name: String,
        }
        #[derive(Deserialize)]
        struct Received {
            nested: Nested,
        }

        let action =
            Action::new("NESTED_REC_ONE").with("nested", json!({"id": "1", "name": "Ada"}));
        let received: Received = action.payload_as().unwrap();
        assert_eq!(received.nested.id, "1");
        assert_eq!(received.nested.name, "Ada");
    }

    #[test]
    fn test_init() {
        assert!(Action::init().is_init());
        assert!(!Action::new("GAME_ENABLE").is_init());
    }
}

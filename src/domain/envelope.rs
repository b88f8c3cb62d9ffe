use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::errors::{AppError, AppResult};

/// Uniform response shape of every dashboard endpoint:
/// `{ success, error?, <payload fields> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    pub fn ok<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            success: true,
            error: None,
            payload: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()), payload: Map::new() }
    }

    /// Server-reported failure text, `Unknown error` when the field is absent.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Unknown error")
    }

    /// Typed payload field; a missing field is an error.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> AppResult<T> {
        let value = self
            .payload
            .get(name)
            .ok_or_else(|| AppError::Payload(format!("missing field `{name}`")))?;
        Ok(T::deserialize(value)?)
    }

    /// Typed payload field where missing or `null` means "empty".
    pub fn field_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> AppResult<T> {
        match self.payload.get(name) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => Ok(T::deserialize(value)?),
        }
    }

    /// The server error of a failed envelope.
    pub fn check(&self) -> AppResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(AppError::Server(self.error_message().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_payload_fields() {
        let env: Envelope =
            serde_json::from_value(json!({"success": true, "positions": [], "extra": 1})).unwrap();
        assert!(env.success);
        assert_eq!(env.payload.len(), 2);
        assert!(env.payload.contains_key("positions"));
    }

    #[test]
    fn missing_success_is_failure() {
        let env: Envelope = serde_json::from_value(json!({"orders": []})).unwrap();
        assert!(!env.success);
        assert_eq!(env.error_message(), "Unknown error");
        assert_eq!(env.check(), Err(AppError::Server("Unknown error".into())));
    }

    #[test]
    fn null_field_defaults() {
        let env: Envelope = serde_json::from_value(json!({"success": true, "orders": null})).unwrap();
        let orders: Vec<Value> = env.field_or_default("orders").unwrap();
        assert!(orders.is_empty());
        assert!(env.field::<f64>("balance").is_err());
    }
}

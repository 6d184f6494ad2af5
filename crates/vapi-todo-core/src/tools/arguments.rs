use serde_json::{Map, Value};

use super::envelope::RawArguments;
use crate::error::ValidationError;

/// Decoded arguments of one tool call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn decode(raw: &RawArguments) -> Result<Self, ValidationError> {
        match raw {
            RawArguments::Object(map) => Ok(Self(map.clone())),
            RawArguments::Encoded(text) if text.trim().is_empty() => Ok(Self::default()),
            RawArguments::Encoded(text) => match serde_json::from_str(text) {
                Ok(Value::Object(map)) => Ok(Self(map)),
                Ok(_) => Err(ValidationError::MalformedEnvelope(
                    "arguments must be a JSON object".into(),
                )),
                Err(e) => Err(ValidationError::MalformedEnvelope(format!(
                    "arguments are not valid JSON: {e}"
                ))),
            },
        }
    }

    fn present(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// String argument, `""` when absent. Scalars are stringified.
    pub fn text(&self, key: &str) -> String {
        match self.present(key) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// String argument, `None` when absent or empty.
    pub fn optional_text(&self, key: &str) -> Option<String> {
        Some(self.text(key)).filter(|s| !s.is_empty())
    }

    /// The `id` argument. Absent, empty and zero all count as missing.
    pub fn record_id(&self) -> Result<i64, ValidationError> {
        let invalid = |message: &str| ValidationError::InvalidValue {
            field: "id".to_string(),
            message: message.to_string(),
        };

        let id = match self.present("id") {
            None => return Err(ValidationError::MissingArgument("id")),
            Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
                (Some(id), _) => id,
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
                _ => return Err(invalid("expected an integer")),
            },
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(ValidationError::MissingArgument("id"))
            }
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid("expected an integer"))?,
            Some(_) => return Err(invalid("expected an integer")),
        };

        match id {
            0 => Err(ValidationError::MissingArgument("id")),
            id if id < 0 => Err(invalid("must be positive")),
            id => Ok(id),
        }
    }
}

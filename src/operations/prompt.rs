//! Prompt enhancement.

use crate::error::{Result, StudioError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Response field carrying the enhanced text.
pub const VARIATIONS_FIELD: &str = "prompt variations";

/// A request to rewrite a prompt into a richer variant.
#[derive(Debug, Clone)]
pub struct PromptEnhanceRequest {
    /// The prompt to enhance.
    pub prompt: String,
    /// Extra fields passed through to the service untouched.
    pub extra: Map<String, Value>,
}

impl PromptEnhanceRequest {
    /// Creates a request with no extra fields.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            extra: Map::new(),
        }
    }

    /// Adds a passthrough field. `prompt` cannot be overridden.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if key != "prompt" {
            self.extra.insert(key, value);
        }
        self
    }

    pub(crate) fn to_body(&self) -> Result<Value> {
        if self.prompt.trim().is_empty() {
            return Err(StudioError::InvalidRequest("prompt must not be empty".into()));
        }
        let body = PromptBody {
            prompt: &self.prompt,
            extra: &self.extra,
        };
        Ok(serde_json::to_value(body)?)
    }
}

#[derive(Debug, Serialize)]
struct PromptBody<'a> {
    prompt: &'a str,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

/// Pulls the enhanced prompt out of a response, if present.
///
/// The field is a string on most deployments and a list of variants on some.
pub fn extract_enhanced(raw: &Value) -> Option<String> {
    let field = raw.get(VARIATIONS_FIELD)?;
    let text = match field {
        Value::String(s) => s.as_str(),
        Value::Array(items) => items.iter().find_map(Value::as_str)?,
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

//! Versioned, parameterized measure definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// A named calculation. `(identifier, version)` is unique; the latest
/// version is the maximum.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    #[validate(length(min = 1, max = 100))]
    pub identifier: String,
    #[serde(default)]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub version: i32,
    #[serde(default)]
    pub parameters: Vec<MeasureParameter>,
    #[validate(length(min = 1))]
    pub expression: String,
    pub return_type: ReturnType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureParameter {
    pub name: String,
    #[serde(default)]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    Number,
    String,
    Bool,
    Date,
    Reference,
}

impl ReturnType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ReturnType::Number => value.is_number(),
            ReturnType::Bool => value.is_boolean(),
            ReturnType::String | ReturnType::Date | ReturnType::Reference => value.is_string(),
        }
    }
}

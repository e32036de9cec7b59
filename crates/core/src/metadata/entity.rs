//! Entity and property definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::types::DefinitionId;

/// An admin-authored entity: ordered, uniquely-named properties plus an
/// optional workflow.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EntityDefinition {
    #[validate(length(min = 1, max = 100))]
    pub entity_id: DefinitionId,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    #[validate(nested)]
    pub properties: Vec<PropertyDefinition>,
    #[serde(default)]
    pub workflow_id: Option<DefinitionId>,
}

impl EntityDefinition {
    /// The workflow id, treating an empty string as unset.
    pub fn workflow(&self) -> Option<&str> {
        self.workflow_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.property_name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    #[validate(length(min = 1, max = 100))]
    pub property_name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub property_type: PropertyType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    /// Copy the value into the search index.
    #[serde(default)]
    pub denormalize: bool,
    /// Expression for `calculated` properties.
    #[serde(default)]
    pub calculation: Option<String>,
}

impl PropertyDefinition {
    /// Human-facing name used in default error messages.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.property_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Date,
    SingleSelect,
    MultiSelect,
    Reference,
    Calculated,
    #[serde(other)]
    Unknown,
}

impl PropertyType {
    /// Whether a non-null runtime value has the shape this type expects.
    ///
    /// Dates and references are carried as strings. Calculated and unknown
    /// types accept anything.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            PropertyType::String | PropertyType::Date | PropertyType::Reference => {
                value.is_string()
            }
            PropertyType::Number => value.is_number(),
            PropertyType::Boolean => value.is_boolean(),
            PropertyType::SingleSelect | PropertyType::MultiSelect => {
                value.is_string() || value.is_array()
            }
            PropertyType::Calculated | PropertyType::Unknown => true,
        }
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Typed metadata property settings. Used both to validate record metadata
/// at write time and to drive search aggregations/filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetadataPropertySettings {
    Terms {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        values: Option<Vec<String>>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Float {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
}

impl MetadataPropertySettings {
    pub fn kind(&self) -> &'static str {
        match self {
            MetadataPropertySettings::Terms { .. } => "terms",
            MetadataPropertySettings::Integer { .. } => "integer",
            MetadataPropertySettings::Float { .. } => "float",
        }
    }

    /// Check the settings themselves when the property is registered.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MetadataPropertySettings::Terms { values } => {
                if let Some(values) = values {
                    if values.is_empty() {
                        return Err("terms properties with a value list must list at least one value"
                            .to_string());
                    }
                    let mut seen = HashSet::new();
                    for value in values {
                        if !seen.insert(value.as_str()) {
                            return Err(format!("term value '{}' is duplicated", value));
                        }
                    }
                }
                Ok(())
            }
            MetadataPropertySettings::Integer { min, max } => match (min, max) {
                (Some(min), Some(max)) if min > max => {
                    Err(format!("min ({}) must not exceed max ({})", min, max))
                }
                _ => Ok(()),
            },
            MetadataPropertySettings::Float { min, max } => match (min, max) {
                (Some(min), Some(max)) if min > max => {
                    Err(format!("min ({}) must not exceed max ({})", min, max))
                }
                _ => Ok(()),
            },
        }
    }

    /// Check a candidate metadata value against this property.
    pub fn validate_value(&self, value: &Value) -> Result<(), String> {
        match self {
            MetadataPropertySettings::Terms { values } => {
                let check_term = |term: &str| -> Result<(), String> {
                    match values {
                        Some(allowed) if !allowed.iter().any(|v| v == term) => {
                            Err(format!("'{}' is not a valid term", term))
                        }
                        _ => Ok(()),
                    }
                };
                match value {
                    Value::String(term) => check_term(term),
                    Value::Array(terms) => {
                        for term in terms {
                            let term = term
                                .as_str()
                                .ok_or_else(|| "terms must be strings".to_string())?;
                            check_term(term)?;
                        }
                        Ok(())
                    }
                    _ => Err("value must be a string or an array of strings".to_string()),
                }
            }
            MetadataPropertySettings::Integer { min, max } => {
                let given = value
                    .as_i64()
                    .ok_or_else(|| "value must be an integer".to_string())?;
                if let Some(min) = min {
                    if given < *min {
                        return Err(format!("{} is lower than the configured min {}", given, min));
                    }
                }
                if let Some(max) = max {
                    if given > *max {
                        return Err(format!("{} is greater than the configured max {}", given, max));
                    }
                }
                Ok(())
            }
            MetadataPropertySettings::Float { min, max } => {
                let given = value
                    .as_f64()
                    .ok_or_else(|| "value must be a number".to_string())?;
                if let Some(min) = min {
                    if given < *min {
                        return Err(format!("{} is lower than the configured min {}", given, min));
                    }
                }
                if let Some(max) = max {
                    if given > *max {
                        return Err(format!("{} is greater than the configured max {}", given, max));
                    }
                }
                Ok(())
            }
        }
    }
}

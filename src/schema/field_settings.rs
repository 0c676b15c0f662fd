use serde::{Deserialize, Serialize};

/// Typed field settings, stored as tagged JSON on the `fields` table.
/// Text is currently the only variant; the type of a field is immutable
/// after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSettings {
    Text {
        #[serde(default)]
        use_markdown: bool,
    },
}

impl FieldSettings {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldSettings::Text { .. } => "text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_settings() {
        let settings: FieldSettings =
            serde_json::from_value(serde_json::json!({"type": "text"})).unwrap();
        assert_eq!(settings, FieldSettings::Text { use_markdown: false });

        let settings: FieldSettings =
            serde_json::from_value(serde_json::json!({"type": "text", "use_markdown": true}))
                .unwrap();
        assert_eq!(settings, FieldSettings::Text { use_markdown: true });
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<FieldSettings, _> =
            serde_json::from_value(serde_json::json!({"type": "image"}));
        assert!(result.is_err());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::config::{
    AppConfig, RANKING_OPTIONS_MAX, RANKING_OPTIONS_MIN, RATING_OPTIONS_MAX, RATING_OPTIONS_MIN,
    RATING_VALUE_MAX, RATING_VALUE_MIN, SELECTION_OPTIONS_MIN, VISIBLE_OPTIONS_MIN,
};

/// Ordering of options shown to annotators for multi-label questions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionsOrder {
    #[default]
    Natural,
    Suggestion,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingOption {
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One span in a span-question value or suggestion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRange {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

/// Typed question settings: the closed set of variants, stored as tagged
/// JSON on the `questions` table and dispatched exactly once through this
/// enum instead of string checks scattered across the codebase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionSettings {
    Text {
        #[serde(default)]
        use_markdown: bool,
    },
    Rating {
        options: Vec<RatingOption>,
    },
    LabelSelection {
        options: Vec<LabelOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visible_options: Option<usize>,
    },
    MultiLabelSelection {
        options: Vec<LabelOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visible_options: Option<usize>,
        #[serde(default)]
        options_order: OptionsOrder,
    },
    Ranking {
        options: Vec<LabelOption>,
    },
    Span {
        field: String,
        options: Vec<LabelOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visible_options: Option<usize>,
        #[serde(default)]
        allow_overlapping: bool,
    },
}

impl QuestionSettings {
    pub fn kind(&self) -> &'static str {
        match self {
            QuestionSettings::Text { .. } => "text",
            QuestionSettings::Rating { .. } => "rating",
            QuestionSettings::LabelSelection { .. } => "label_selection",
            QuestionSettings::MultiLabelSelection { .. } => "multi_label_selection",
            QuestionSettings::Ranking { .. } => "ranking",
            QuestionSettings::Span { .. } => "span",
        }
    }

    /// Check the settings themselves against the configured ceilings.
    /// Called when a question is added to a draft dataset.
    pub fn validate(&self, config: &AppConfig) -> Result<(), String> {
        match self {
            QuestionSettings::Text { .. } => Ok(()),
            QuestionSettings::Rating { options } => {
                if options.len() < RATING_OPTIONS_MIN || options.len() > RATING_OPTIONS_MAX {
                    return Err(format!(
                        "rating questions must define between {} and {} options, got {}",
                        RATING_OPTIONS_MIN,
                        RATING_OPTIONS_MAX,
                        options.len()
                    ));
                }
                for option in options {
                    if option.value < RATING_VALUE_MIN || option.value > RATING_VALUE_MAX {
                        return Err(format!(
                            "rating option value {} is outside [{}, {}]",
                            option.value, RATING_VALUE_MIN, RATING_VALUE_MAX
                        ));
                    }
                }
                ensure_unique_values(options.iter().map(|o| o.value.to_string()))
            }
            QuestionSettings::LabelSelection {
                options,
                visible_options,
            } => validate_selection_options(options, *visible_options, config.max_selection_options),
            QuestionSettings::MultiLabelSelection {
                options,
                visible_options,
                ..
            } => validate_selection_options(options, *visible_options, config.max_selection_options),
            QuestionSettings::Ranking { options } => {
                if options.len() < RANKING_OPTIONS_MIN || options.len() > RANKING_OPTIONS_MAX {
                    return Err(format!(
                        "ranking questions must define between {} and {} options, got {}",
                        RANKING_OPTIONS_MIN,
                        RANKING_OPTIONS_MAX,
                        options.len()
                    ));
                }
                ensure_unique_values(options.iter().map(|o| o.value.clone()))
            }
            QuestionSettings::Span {
                options,
                visible_options,
                ..
            } => {
                if options.is_empty() {
                    return Err("span questions must define at least one option".to_string());
                }
                if options.len() > config.max_span_options {
                    return Err(format!(
                        "span questions may define at most {} options, got {}",
                        config.max_span_options,
                        options.len()
                    ));
                }
                ensure_unique_values(options.iter().map(|o| o.value.clone()))?;
                check_visible_options(*visible_options, options.len())
            }
        }
    }

    /// Check a candidate response/suggestion value against this question's
    /// variant. `record_fields` supplies the record's field payload, needed
    /// by span questions to bound offsets against the referenced field text.
    pub fn validate_value(
        &self,
        value: &Value,
        record_fields: Option<&serde_json::Map<String, Value>>,
    ) -> Result<(), String> {
        match self {
            QuestionSettings::Text { .. } => match value.as_str() {
                Some(_) => Ok(()),
                None => Err("value must be a string".to_string()),
            },
            QuestionSettings::Rating { options } => {
                let given = value
                    .as_i64()
                    .ok_or_else(|| "value must be an integer".to_string())?;
                if options.iter().any(|o| o.value == given) {
                    Ok(())
                } else {
                    Err(format!("{} is not a valid rating option", given))
                }
            }
            QuestionSettings::LabelSelection { options, .. } => {
                let given = value
                    .as_str()
                    .ok_or_else(|| "value must be a string".to_string())?;
                if options.iter().any(|o| o.value == given) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not a valid label option", given))
                }
            }
            QuestionSettings::MultiLabelSelection { options, .. } => {
                let given = value
                    .as_array()
                    .ok_or_else(|| "value must be an array of labels".to_string())?;
                if given.is_empty() {
                    return Err("value must contain at least one label".to_string());
                }
                let mut seen = HashSet::new();
                for label in given {
                    let label = label
                        .as_str()
                        .ok_or_else(|| "labels must be strings".to_string())?;
                    if !seen.insert(label) {
                        return Err(format!("label '{}' is selected more than once", label));
                    }
                    if !options.iter().any(|o| o.value == label) {
                        return Err(format!("'{}' is not a valid label option", label));
                    }
                }
                Ok(())
            }
            QuestionSettings::Ranking { options } => validate_ranking_value(value, options),
            QuestionSettings::Span {
                field,
                options,
                allow_overlapping,
                ..
            } => validate_span_value(value, field, options, *allow_overlapping, record_fields),
        }
    }
}

fn ensure_unique_values(values: impl Iterator<Item = String>) -> Result<(), String> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value.clone()) {
            return Err(format!("option value '{}' is duplicated", value));
        }
    }
    Ok(())
}

fn check_visible_options(visible_options: Option<usize>, option_count: usize) -> Result<(), String> {
    if let Some(visible) = visible_options {
        if visible < VISIBLE_OPTIONS_MIN {
            return Err(format!(
                "visible_options must be at least {}, got {}",
                VISIBLE_OPTIONS_MIN, visible
            ));
        }
        if visible > option_count {
            return Err(format!(
                "visible_options ({}) must not exceed the number of options ({})",
                visible, option_count
            ));
        }
    }
    Ok(())
}

fn validate_selection_options(
    options: &[LabelOption],
    visible_options: Option<usize>,
    max_options: usize,
) -> Result<(), String> {
    if options.len() < SELECTION_OPTIONS_MIN {
        return Err(format!(
            "selection questions must define at least {} options, got {}",
            SELECTION_OPTIONS_MIN,
            options.len()
        ));
    }
    if options.len() > max_options {
        return Err(format!(
            "selection questions may define at most {} options, got {}",
            max_options,
            options.len()
        ));
    }
    ensure_unique_values(options.iter().map(|o| o.value.clone()))?;
    check_visible_options(visible_options, options.len())
}

/// A ranking value must rank exactly the configured option set, with no
/// omissions or duplicate values; ranks must fall in 1..=n (ties allowed).
fn validate_ranking_value(value: &Value, options: &[LabelOption]) -> Result<(), String> {
    #[derive(Deserialize)]
    struct RankedItem {
        value: String,
        rank: usize,
    }

    let items: Vec<RankedItem> = serde_json::from_value(value.clone())
        .map_err(|_| "value must be an array of {value, rank} objects".to_string())?;

    let expected: HashSet<&str> = options.iter().map(|o| o.value.as_str()).collect();
    let mut ranked = HashSet::new();
    for item in &items {
        if !expected.contains(item.value.as_str()) {
            return Err(format!("'{}' is not a valid ranking option", item.value));
        }
        if !ranked.insert(item.value.as_str()) {
            return Err(format!("option '{}' is ranked more than once", item.value));
        }
        if item.rank < 1 || item.rank > options.len() {
            return Err(format!(
                "rank {} for option '{}' is outside 1..={}",
                item.rank,
                item.value,
                options.len()
            ));
        }
    }
    if ranked.len() != expected.len() {
        let missing: Vec<&str> = expected
            .iter()
            .filter(|v| !ranked.contains(**v))
            .copied()
            .collect();
        return Err(format!("ranking is missing options: {}", missing.join(", ")));
    }
    Ok(())
}

fn validate_span_value(
    value: &Value,
    field: &str,
    options: &[LabelOption],
    allow_overlapping: bool,
    record_fields: Option<&serde_json::Map<String, Value>>,
) -> Result<(), String> {
    let spans: Vec<SpanRange> = serde_json::from_value(value.clone())
        .map_err(|_| "value must be an array of {start, end, label} objects".to_string())?;

    let field_text = record_fields
        .and_then(|fields| fields.get(field))
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("record has no text for span field '{}'", field))?;
    let field_len = field_text.chars().count();

    for span in &spans {
        if !options.iter().any(|o| o.value == span.label) {
            return Err(format!("'{}' is not a valid span label", span.label));
        }
        if span.start >= span.end {
            return Err(format!(
                "span start {} must be lower than end {}",
                span.start, span.end
            ));
        }
        if span.end > field_len {
            return Err(format!(
                "span end {} is beyond the length of field '{}' ({})",
                span.end, field, field_len
            ));
        }
    }

    if !allow_overlapping {
        let mut sorted: Vec<&SpanRange> = spans.iter().collect();
        sorted.sort_by_key(|s| s.start);
        for pair in sorted.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(format!(
                    "spans [{}, {}) and [{}, {}) overlap and the question does not allow it",
                    pair[0].start, pair[0].end, pair[1].start, pair[1].end
                ));
            }
        }
    }

    Ok(())
}

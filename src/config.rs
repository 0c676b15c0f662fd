use serde::{Deserialize, Serialize};

/// Operational ceilings consumed by the validators and bulk services.
///
/// Every limit has a default matching production behaviour and can be
/// overridden through the `LABELSTACK_*` environment variables at startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Maximum number of record items accepted by one bulk create/upsert call.
    pub max_bulk_records: usize,
    /// Maximum number of record ids accepted by one delete call.
    pub max_delete_records: usize,
    /// Maximum byte length of a single metadata value after serialization.
    pub max_metadata_value_length: usize,
    /// Maximum number of options a label/multi-label selection question may define.
    pub max_selection_options: usize,
    /// Maximum number of options a span question may define.
    pub max_span_options: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_bulk_records: 500,
            max_delete_records: 100,
            max_metadata_value_length: 5000,
            max_selection_options: 500,
            max_span_options: 500,
        }
    }
}

impl AppConfig {
    /// Build the configuration from the environment, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_bulk_records: env_usize("LABELSTACK_MAX_BULK_RECORDS", defaults.max_bulk_records),
            max_delete_records: env_usize(
                "LABELSTACK_MAX_DELETE_RECORDS",
                defaults.max_delete_records,
            ),
            max_metadata_value_length: env_usize(
                "LABELSTACK_MAX_METADATA_VALUE_LENGTH",
                defaults.max_metadata_value_length,
            ),
            max_selection_options: env_usize(
                "LABELSTACK_MAX_SELECTION_OPTIONS",
                defaults.max_selection_options,
            ),
            max_span_options: env_usize("LABELSTACK_MAX_SPAN_OPTIONS", defaults.max_span_options),
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={}", name, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Bounds for rating question options. These mirror the values the platform
/// has always shipped with and are not runtime-configurable.
pub const RATING_OPTIONS_MIN: usize = 2;
pub const RATING_OPTIONS_MAX: usize = 11;
pub const RATING_VALUE_MIN: i64 = 0;
pub const RATING_VALUE_MAX: i64 = 10;

/// Bounds for ranking question options.
pub const RANKING_OPTIONS_MIN: usize = 2;
pub const RANKING_OPTIONS_MAX: usize = 50;

/// Minimum number of options a selection question must define, and the
/// smallest value `visible_options` may take when set.
pub const SELECTION_OPTIONS_MIN: usize = 2;
pub const VISIBLE_OPTIONS_MIN: usize = 3;

/// Suggestion scores are normalized probabilities.
pub const SUGGESTION_SCORE_MIN: f64 = 0.0;
pub const SUGGESTION_SCORE_MAX: f64 = 1.0;

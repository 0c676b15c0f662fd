//! Typed views over the string discriminator columns.
//!
//! The store keeps statuses as plain strings; these enums are the only
//! place the legal values are spelled out.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dataset lifecycle. Structural children may only change while `Draft`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetStatus {
    Draft,
    Ready,
}

impl fmt::Display for DatasetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetStatus::Draft => write!(f, "draft"),
            DatasetStatus::Ready => write!(f, "ready"),
        }
    }
}

impl FromStr for DatasetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DatasetStatus::Draft),
            "ready" => Ok(DatasetStatus::Ready),
            other => Err(format!("unknown dataset status: {}", other)),
        }
    }
}

/// Record completion, derived from the record's responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Completed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Pending => write!(f, "pending"),
            RecordStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RecordStatus::Pending),
            "completed" => Ok(RecordStatus::Completed),
            other => Err(format!("unknown record status: {}", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Draft,
    Submitted,
    Discarded,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Draft => write!(f, "draft"),
            ResponseStatus::Submitted => write!(f, "submitted"),
            ResponseStatus::Discarded => write!(f, "discarded"),
        }
    }
}

impl FromStr for ResponseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ResponseStatus::Draft),
            "submitted" => Ok(ResponseStatus::Submitted),
            "discarded" => Ok(ResponseStatus::Discarded),
            other => Err(format!("unknown response status: {}", other)),
        }
    }
}

/// Where a suggestion came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Model,
    Human,
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionKind::Model => write!(f, "model"),
            SuggestionKind::Human => write!(f, "human"),
        }
    }
}

impl FromStr for SuggestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model" => Ok(SuggestionKind::Model),
            "human" => Ok(SuggestionKind::Human),
            other => Err(format!("unknown suggestion kind: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_status_roundtrip() {
        assert_eq!(
            DatasetStatus::Draft.to_string().parse::<DatasetStatus>(),
            Ok(DatasetStatus::Draft)
        );
        assert!("published".parse::<DatasetStatus>().is_err());
    }

    #[test]
    fn test_response_status_roundtrip() {
        for status in [
            ResponseStatus::Draft,
            ResponseStatus::Submitted,
            ResponseStatus::Discarded,
        ] {
            assert_eq!(status.to_string().parse::<ResponseStatus>(), Ok(status));
        }
    }
}

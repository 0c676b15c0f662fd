use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured search request: all three parts are independently optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<TextQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortClause>,
}

/// Free-text search, optionally restricted to one field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextQuery {
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// A boolean tree of filters. Leaves are terms matches or numeric ranges
/// over a scope.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    And { and: Vec<Filter> },
    Terms { scope: Scope, values: Vec<Value> },
    Range {
        scope: Scope,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ge: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        le: Option<f64>,
    },
}

/// What a filter or sort clause addresses.
///
/// Response/suggestion scopes that omit the question name apply across all
/// questions; metadata scopes must name a registered metadata property;
/// record scopes address fixed record properties and need no schema lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Scope {
    Record {
        property: RecordProperty,
    },
    Response {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        question: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        property: Option<ResponseProperty>,
    },
    Suggestion {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        question: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        property: Option<SuggestionProperty>,
    },
    Metadata {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata_property: Option<String>,
    },
}

/// Fixed record properties addressable without a schema lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordProperty {
    Status,
    ExternalId,
    InsertedAt,
    UpdatedAt,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseProperty {
    #[default]
    Value,
    Status,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionProperty {
    #[default]
    Value,
    Score,
    Agent,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SortClause {
    pub scope: Scope,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_query() {
        let query: SearchQuery = serde_json::from_value(json!({
            "query": {"q": "hello"},
            "filters": {"type": "and", "and": [
                {"type": "terms", "scope": {"entity": "record", "property": "status"},
                 "values": ["pending"]},
                {"type": "range", "scope": {"entity": "metadata", "metadata_property": "loss"},
                 "ge": 0.1, "le": 0.9}
            ]},
            "sort": [
                {"scope": {"entity": "record", "property": "inserted_at"}, "order": "desc"}
            ]
        }))
        .unwrap();

        assert!(query.query.is_some());
        assert!(matches!(query.filters, Some(Filter::And { .. })));
        assert_eq!(query.sort.len(), 1);
        assert_eq!(query.sort[0].order, SortOrder::Desc);
    }

    #[test]
    fn test_parse_scope_wide_response_filter() {
        let filter: Filter = serde_json::from_value(json!({
            "type": "terms",
            "scope": {"entity": "response"},
            "values": ["submitted"]
        }))
        .unwrap();

        match filter {
            Filter::Terms {
                scope: Scope::Response { question, .. },
                ..
            } => assert!(question.is_none()),
            other => panic!("unexpected filter: {:?}", other),
        }
    }

    #[test]
    fn test_empty_query_is_valid() {
        let query: SearchQuery = serde_json::from_value(json!({})).unwrap();
        assert!(query.query.is_none());
        assert!(query.filters.is_none());
        assert!(query.sort.is_empty());
    }
}

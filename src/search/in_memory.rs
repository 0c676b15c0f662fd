//! A process-local search engine for tests and single-node local runs.
//!
//! Documents live in a per-dataset map guarded by an `RwLock`; scoring is
//! naive substring counting. The production deployment swaps this for an
//! Elasticsearch/OpenSearch client behind the same [`SearchEngine`] trait.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::database::entities::{datasets, records, responses};

use super::engine::{HydratedRecord, SearchEngine, SearchHit, SearchResponses};
use super::query::{
    Filter, RecordProperty, ResponseProperty, Scope, SearchQuery, SortOrder, SuggestionProperty,
};

#[derive(Clone, Debug)]
struct ResponseDoc {
    user_id: i32,
    status: String,
    /// question name -> submitted value
    values: Map<String, Value>,
}

#[derive(Clone, Debug)]
struct SuggestionDoc {
    question: String,
    value: Value,
    score: Option<f64>,
    agent: Option<String>,
}

#[derive(Clone, Debug)]
struct SearchDocument {
    record_id: i32,
    external_id: Option<String>,
    status: String,
    fields: Map<String, Value>,
    metadata: Map<String, Value>,
    inserted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    responses: Vec<ResponseDoc>,
    suggestions: Vec<SuggestionDoc>,
}

#[derive(Default)]
pub struct InMemorySearchEngine {
    indices: RwLock<HashMap<i32, BTreeMap<i32, SearchDocument>>>,
}

impl InMemorySearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently indexed for a dataset.
    pub fn indexed_count(&self, dataset_id: i32) -> usize {
        self.indices
            .read()
            .expect("search index lock poisoned")
            .get(&dataset_id)
            .map(|index| index.len())
            .unwrap_or(0)
    }

    fn build_document(record: &HydratedRecord) -> SearchDocument {
        let responses = record
            .responses
            .iter()
            .map(|response| ResponseDoc {
                user_id: response.user_id,
                status: response.status.clone(),
                values: flatten_response_values(&response.values),
            })
            .collect();

        let suggestions = record
            .suggestions
            .iter()
            .map(|suggestion| SuggestionDoc {
                question: suggestion.question_name.clone(),
                value: suggestion.model.value.clone(),
                score: suggestion.model.score,
                agent: suggestion.model.agent.clone(),
            })
            .collect();

        SearchDocument {
            record_id: record.record.id,
            external_id: record.record.external_id.clone(),
            status: record.record.status.clone(),
            fields: record.record.fields.as_object().cloned().unwrap_or_default(),
            metadata: record
                .record
                .metadata
                .as_ref()
                .and_then(|m| m.as_object().cloned())
                .unwrap_or_default(),
            inserted_at: record.record.inserted_at,
            updated_at: record.record.updated_at,
            responses,
            suggestions,
        }
    }
}

/// Stored response values look like `{"quality": {"value": 3}}`; the index
/// keeps the inner value directly.
fn flatten_response_values(values: &Value) -> Map<String, Value> {
    let mut flattened = Map::new();
    if let Some(object) = values.as_object() {
        for (name, entry) in object {
            let value = entry.get("value").cloned().unwrap_or_else(|| entry.clone());
            flattened.insert(name.clone(), value);
        }
    }
    flattened
}

#[async_trait]
impl SearchEngine for InMemorySearchEngine {
    async fn ping(&self) -> bool {
        true
    }

    async fn index_records(
        &self,
        dataset: &datasets::Model,
        records: &[HydratedRecord],
    ) -> Result<()> {
        let mut indices = self.indices.write().expect("search index lock poisoned");
        let index = indices.entry(dataset.id).or_default();
        for record in records {
            index.insert(record.record.id, Self::build_document(record));
        }
        Ok(())
    }

    async fn update_record_response(
        &self,
        record: &records::Model,
        response: &responses::Model,
    ) -> Result<()> {
        let mut indices = self.indices.write().expect("search index lock poisoned");
        let index = indices.entry(record.dataset_id).or_default();
        if let Some(document) = index.get_mut(&record.id) {
            document.status = record.status.clone();
            document.updated_at = record.updated_at;
            let doc_response = ResponseDoc {
                user_id: response.user_id,
                status: response.status.clone(),
                values: flatten_response_values(&response.values),
            };
            match document
                .responses
                .iter_mut()
                .find(|existing| existing.user_id == response.user_id)
            {
                Some(existing) => *existing = doc_response,
                None => document.responses.push(doc_response),
            }
        }
        Ok(())
    }

    async fn delete_records(&self, dataset: &datasets::Model, record_ids: &[i32]) -> Result<()> {
        let mut indices = self.indices.write().expect("search index lock poisoned");
        if let Some(index) = indices.get_mut(&dataset.id) {
            for record_id in record_ids {
                index.remove(record_id);
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        dataset: &datasets::Model,
        query: &SearchQuery,
        offset: u64,
        limit: u64,
    ) -> Result<SearchResponses> {
        let indices = self.indices.read().expect("search index lock poisoned");
        let empty = BTreeMap::new();
        let index = indices.get(&dataset.id).unwrap_or(&empty);

        let mut matches: Vec<(&SearchDocument, f64)> = Vec::new();
        for document in index.values() {
            if let Some(filter) = &query.filters {
                if !matches_filter(document, filter) {
                    continue;
                }
            }
            match text_score(document, query) {
                Some(score) => matches.push((document, score)),
                None => continue,
            }
        }

        if query.sort.is_empty() {
            matches.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.0.record_id.cmp(&b.0.record_id))
            });
        } else {
            matches.sort_by(|a, b| compare_documents(a.0, b.0, &query.sort));
        }

        let total = matches.len() as u64;
        let hits = matches
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(document, score)| SearchHit {
                record_id: document.record_id,
                score,
            })
            .collect();

        Ok(SearchResponses { hits, total })
    }
}

/// Naive relevance: occurrences of the lowercased needle across the
/// document's field text. `None` means the document does not match at all.
fn text_score(document: &SearchDocument, query: &SearchQuery) -> Option<f64> {
    let text_query = match &query.query {
        Some(text_query) if !text_query.q.trim().is_empty() => text_query,
        _ => return Some(1.0),
    };

    let needle = text_query.q.to_lowercase();
    let mut occurrences = 0usize;
    for (name, value) in &document.fields {
        if let Some(field) = &text_query.field {
            if field != name {
                continue;
            }
        }
        if let Some(text) = value.as_str() {
            occurrences += text.to_lowercase().matches(&needle).count();
        }
    }

    if occurrences > 0 {
        Some(occurrences as f64)
    } else {
        None
    }
}

fn matches_filter(document: &SearchDocument, filter: &Filter) -> bool {
    match filter {
        Filter::And { and } => and.iter().all(|child| matches_filter(document, child)),
        Filter::Terms { scope, values } => {
            let scoped = scoped_values(document, scope);
            scoped
                .iter()
                .any(|candidate| values.iter().any(|wanted| loose_eq(candidate, wanted)))
        }
        Filter::Range { scope, ge, le } => {
            let scoped = scoped_values(document, scope);
            scoped.iter().filter_map(Value::as_f64).any(|number| {
                ge.map(|bound| number >= bound).unwrap_or(true)
                    && le.map(|bound| number <= bound).unwrap_or(true)
            })
        }
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => value_to_string(a) == value_to_string(b),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn scoped_values(document: &SearchDocument, scope: &Scope) -> Vec<Value> {
    match scope {
        Scope::Record { property } => match property {
            RecordProperty::Status => vec![Value::from(document.status.clone())],
            RecordProperty::ExternalId => document
                .external_id
                .iter()
                .map(|id| Value::from(id.clone()))
                .collect(),
            RecordProperty::InsertedAt => {
                vec![Value::from(document.inserted_at.timestamp() as f64)]
            }
            RecordProperty::UpdatedAt => {
                vec![Value::from(document.updated_at.timestamp() as f64)]
            }
        },
        Scope::Response { question, property } => {
            let property = (*property).unwrap_or_default();
            document
                .responses
                .iter()
                .flat_map(|response| match property {
                    ResponseProperty::Status => vec![Value::from(response.status.clone())],
                    ResponseProperty::Value => match question {
                        Some(name) => {
                            response.values.get(name).cloned().into_iter().collect()
                        }
                        None => response.values.values().cloned().collect::<Vec<_>>(),
                    },
                })
                .collect()
        }
        Scope::Suggestion { question, property } => {
            let property = (*property).unwrap_or_default();
            document
                .suggestions
                .iter()
                .filter(|suggestion| match question {
                    Some(name) => &suggestion.question == name,
                    None => true,
                })
                .flat_map(|suggestion| match property {
                    SuggestionProperty::Value => vec![suggestion.value.clone()],
                    SuggestionProperty::Score => suggestion
                        .score
                        .map(Value::from)
                        .into_iter()
                        .collect::<Vec<_>>(),
                    SuggestionProperty::Agent => suggestion
                        .agent
                        .clone()
                        .map(Value::from)
                        .into_iter()
                        .collect::<Vec<_>>(),
                })
                .collect()
        }
        Scope::Metadata { metadata_property } => match metadata_property {
            Some(name) => match document.metadata.get(name) {
                Some(Value::Array(values)) => values.clone(),
                Some(value) => vec![value.clone()],
                None => vec![],
            },
            None => vec![],
        },
    }
}

fn compare_documents(
    a: &SearchDocument,
    b: &SearchDocument,
    sort: &[super::query::SortClause],
) -> Ordering {
    for clause in sort {
        let left = sort_key(a, &clause.scope);
        let right = sort_key(b, &clause.scope);
        let ordering = match (left, right) {
            (Some(left), Some(right)) => compare_values(&left, &right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = match clause.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.record_id.cmp(&b.record_id)
}

fn sort_key(document: &SearchDocument, scope: &Scope) -> Option<Value> {
    scoped_values(document, scope).into_iter().next()
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => value_to_string(a).cmp(&value_to_string(b)),
    }
}

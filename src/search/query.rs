// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Compiles [`SearchCriteria`] into the backend's filtered-search DSL.
//!
//! Compilation is pure and deterministic; the only fallible step is opening
//! a sealed page token.

use serde_json::{json, Value};

use crate::{error::QueryError, model::SearchCriteria, token};

/// The fields the backend must return for every hit.
///
/// Restricting `_source` to this set bounds the per-hit payload and keeps
/// the access check data sourced from the index rather than the caller.
pub const SOURCE_FIELDS: [&str; 7] = [
    "object_ref",
    "object_type",
    "object_id",
    "public",
    "access_check_object",
    "access_check_relation",
    "data",
];

/// A compiled backend query, ready to execute.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
    /// The request body for the backend's search endpoint.
    pub body: Value,
    /// The requested page size; zero or below means count mode.
    pub page_size: i64,
}

/// Defines how a predicate is appended to the list of `must` clauses.
pub(super) trait AppendToQuery {
    fn append_to(self, queries: &mut Vec<Value>);
}

pub(super) trait AppendQuery<Q> {
    fn append_query(&mut self, query: Q);
}

impl<Q: AppendToQuery> AppendQuery<Q> for Vec<Value> {
    fn append_query(&mut self, query: Q) {
        query.append_to(self)
    }
}

/// The fixed leading predicate: the index row points to the latest revision
/// of the resource.
struct LatestRevisionQuery;

impl AppendToQuery for LatestRevisionQuery {
    fn append_to(self, queries: &mut Vec<Value>) {
        queries.push(json!({ "term": { "latest": true } }));
    }
}

/// Restricts hits by visibility.
struct VisibilityQuery {
    public_only: bool,
    private_only: bool,
}

impl AppendToQuery for VisibilityQuery {
    fn append_to(self, queries: &mut Vec<Value>) {
        if self.public_only {
            queries.push(json!({ "term": { "public": true } }));
        } else if self.private_only {
            queries.push(json!({ "term": { "public": false } }));
        }
    }
}

/// Queries for an exact resource type.
struct ObjectTypeQuery(Option<String>);

impl AppendToQuery for ObjectTypeQuery {
    fn append_to(self, queries: &mut Vec<Value>) {
        if let Some(object_type) = self.0 {
            queries.push(json!({ "term": { "object_type": object_type } }));
        }
    }
}

/// Queries for resources under a parent reference.
struct ParentQuery(Option<String>);

impl AppendToQuery for ParentQuery {
    fn append_to(self, queries: &mut Vec<Value>) {
        if let Some(parent) = self.0 {
            queries.push(json!({ "term": { "parent_refs": parent } }));
        }
    }
}

/// The typeahead predicate: a prefix-aware match over the name field and its
/// n-gram analyzer variants.
struct NameTypeaheadQuery(Option<String>);

impl AppendToQuery for NameTypeaheadQuery {
    fn append_to(self, queries: &mut Vec<Value>) {
        if let Some(name) = self.0 {
            queries.push(json!({
                "multi_match": {
                    "query": name,
                    "type": "bool_prefix",
                    "fields": [
                        "name_and_aliases",
                        "name_and_aliases._2gram",
                        "name_and_aliases._3gram",
                    ],
                }
            }));
        }
    }
}

/// Queries for hits carrying every one of the given tags.
struct AllTagsQuery(Vec<String>);

impl AppendToQuery for AllTagsQuery {
    fn append_to(self, queries: &mut Vec<Value>) {
        for tag in self.0 {
            queries.push(json!({ "term": { "tags": tag } }));
        }
    }
}

/// Compiles the criteria into a backend query body.
///
/// In count mode (`page_size <= 0`) the body carries only the filter; no
/// hits are projected, sorted or paginated.
pub fn compile(criteria: &SearchCriteria) -> Result<CompiledQuery, QueryError> {
    let mut queries = Vec::new();
    queries.append_query(LatestRevisionQuery);
    queries.append_query(VisibilityQuery {
        public_only: criteria.public_only,
        private_only: criteria.private_only,
    });
    queries.append_query(ObjectTypeQuery(criteria.resource_type.clone()));
    queries.append_query(ParentQuery(criteria.parent.clone()));
    queries.append_query(NameTypeaheadQuery(criteria.name.clone()));
    queries.append_query(AllTagsQuery(criteria.tags_all.clone()));

    let mut bool_query = json!({ "must": queries });
    if !criteria.tags.is_empty() {
        bool_query["should"] = Value::Array(
            criteria
                .tags
                .iter()
                .map(|tag| json!({ "term": { "tags": tag } }))
                .collect(),
        );
        bool_query["minimum_should_match"] = json!(1);
    }

    let mut body = json!({ "query": { "bool": bool_query } });
    if criteria.page_size > 0 {
        body["_source"] = json!(SOURCE_FIELDS);
        body["size"] = json!(criteria.page_size);
        // The secondary `_id` key breaks ties deterministically, so
        // pagination stays stable when many rows share a sort key.
        body["sort"] = json!([
            { criteria.sort.field(): { "order": criteria.sort.order() } },
            { "_id": { "order": "asc" } },
        ]);
        if let Some(page_token) = &criteria.page_token {
            let cursor = token::open(page_token)?;
            body["search_after"] = serde_json::from_slice(&cursor).map_err(|_| QueryError::InvalidPageToken)?;
        }
    }

    Ok(CompiledQuery {
        body,
        page_size: criteria.page_size,
    })
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Sort;

    #[test]
    fn compile_everything() {
        let criteria = SearchCriteria {
            name: Some("board".to_string()),
            parent: Some("project:cncf".to_string()),
            resource_type: Some("committee".to_string()),
            tags: vec!["governance".to_string(), "security".to_string()],
            tags_all: vec!["active".to_string()],
            sort: Sort::UpdatedDesc,
            page_size: 25,
            page_token: None,
            public_only: true,
            private_only: false,
        };
        let expected = json!({
            "query": {
                "bool": {
                    "must": [
                        { "term": { "latest": true } },
                        { "term": { "public": true } },
                        { "term": { "object_type": "committee" } },
                        { "term": { "parent_refs": "project:cncf" } },
                        { "multi_match": {
                            "query": "board",
                            "type": "bool_prefix",
                            "fields": [
                                "name_and_aliases",
                                "name_and_aliases._2gram",
                                "name_and_aliases._3gram",
                            ],
                        } },
                        { "term": { "tags": "active" } },
                    ],
                    "should": [
                        { "term": { "tags": "governance" } },
                        { "term": { "tags": "security" } },
                    ],
                    "minimum_should_match": 1,
                }
            },
            "_source": SOURCE_FIELDS,
            "size": 25,
            "sort": [
                { "updated_at": { "order": "desc" } },
                { "_id": { "order": "asc" } },
            ],
        });
        assert_eq!(compile(&criteria).unwrap().body, expected);
    }

    #[test]
    fn compile_name_only() {
        let criteria = SearchCriteria {
            name: Some("sig".to_string()),
            ..Default::default()
        };
        let expected = json!({
            "query": {
                "bool": {
                    "must": [
                        { "term": { "latest": true } },
                        { "multi_match": {
                            "query": "sig",
                            "type": "bool_prefix",
                            "fields": [
                                "name_and_aliases",
                                "name_and_aliases._2gram",
                                "name_and_aliases._3gram",
                            ],
                        } },
                    ],
                }
            },
            "_source": SOURCE_FIELDS,
            "size": 50,
            "sort": [
                { "sort_name": { "order": "asc" } },
                { "_id": { "order": "asc" } },
            ],
        });
        assert_eq!(compile(&criteria).unwrap().body, expected);
    }

    #[test]
    fn compile_count_mode_has_no_hits_clauses() {
        let criteria = SearchCriteria {
            resource_type: Some("project".to_string()),
            page_size: 0,
            private_only: true,
            ..Default::default()
        };
        let expected = json!({
            "query": {
                "bool": {
                    "must": [
                        { "term": { "latest": true } },
                        { "term": { "public": false } },
                        { "term": { "object_type": "project" } },
                    ],
                }
            },
        });
        assert_eq!(compile(&criteria).unwrap().body, expected);
    }

    #[test]
    fn compile_attaches_opened_cursor() {
        token::init("compile-test-secret").unwrap();
        let cursor = serde_json::to_vec(&json!(["meeting minutes", "committee:7"])).unwrap();
        let criteria = SearchCriteria {
            name: Some("minutes".to_string()),
            page_token: Some(token::seal(&cursor).unwrap()),
            ..Default::default()
        };
        let body = compile(&criteria).unwrap().body;
        assert_eq!(body["search_after"], json!(["meeting minutes", "committee:7"]));
    }

    #[test]
    fn compile_rejects_tampered_cursor() {
        token::init("compile-test-secret").unwrap();
        let criteria = SearchCriteria {
            name: Some("minutes".to_string()),
            page_token: Some("ZZZZ".to_string()),
            ..Default::default()
        };
        assert!(matches!(compile(&criteria), Err(QueryError::InvalidPageToken)));
    }
}

// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The OpenSearch-backed search gateway.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{CompiledQuery, HitPage, OpenSearchConfig, SearchBackend};
use crate::{error::QueryError, model::ResourceDocument, token};

/// A stateless adapter to an OpenSearch cluster.
///
/// The client holds an idle connection pool shared by all requests; no
/// other state crosses request boundaries. Transport failures are not
/// retried here, this is a read path and the caller may safely repeat.
#[derive(Clone, Debug)]
pub struct OpenSearchBackend {
    client: reqwest::Client,
    url: Url,
    index: String,
}

impl OpenSearchBackend {
    /// Creates a new [`OpenSearchBackend`] from its config.
    pub fn new(config: &OpenSearchConfig) -> Result<Self, QueryError> {
        let url = Url::parse(&config.url).map_err(QueryError::backend)?;
        Ok(Self {
            client: reqwest::Client::new(),
            url,
            index: config.index.clone(),
        })
    }

    fn endpoint(&self, operation: &str) -> Result<Url, QueryError> {
        self.url
            .join(&format!("{}/{}", self.index, operation))
            .map_err(QueryError::backend)
    }
}

#[async_trait]
impl SearchBackend for OpenSearchBackend {
    async fn search(&self, query: &CompiledQuery) -> Result<HitPage, QueryError> {
        let response = self
            .client
            .post(self.endpoint("_search")?)
            .json(&query.body)
            .send()
            .await
            .map_err(QueryError::backend)?;
        if !response.status().is_success() {
            return Err(QueryError::backend(format!(
                "search returned status {}",
                response.status()
            )));
        }
        let raw = response
            .json::<RawSearchResponse>()
            .await
            .map_err(QueryError::unexpected)?;

        page_from_response(raw, query.page_size)
    }

    async fn count(&self, query: &CompiledQuery) -> Result<u64, QueryError> {
        let response = self
            .client
            .post(self.endpoint("_count")?)
            .json(&query.body)
            .send()
            .await
            .map_err(QueryError::backend)?;
        if !response.status().is_success() {
            return Err(QueryError::backend(format!(
                "count returned status {}",
                response.status()
            )));
        }
        let raw = response
            .json::<RawCountResponse>()
            .await
            .map_err(QueryError::unexpected)?;
        Ok(raw.count)
    }

    async fn is_ready(&self) -> bool {
        match self.client.get(self.url.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSearchResponse {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    hits: RawHits,
}

#[derive(Debug, Default, Deserialize)]
struct RawHits {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: Option<Value>,
    #[serde(default)]
    sort: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawCountResponse {
    count: u64,
}

/// Decodes a raw backend response into a [`HitPage`].
///
/// Hits whose `_source` fails to decode are skipped so that one malformed
/// document cannot poison a page. A full page carries forward the last
/// hit's sort vector as the sealed next-page cursor.
fn page_from_response(raw: RawSearchResponse, page_size: i64) -> Result<HitPage, QueryError> {
    if let Some(error) = raw.error {
        return Err(QueryError::backend(format!("search reported an error: {error}")));
    }

    let full_page = page_size > 0 && raw.hits.hits.len() as i64 == page_size;
    let next_cursor = if full_page {
        raw.hits.hits.last().and_then(|hit| hit.sort.clone())
    } else {
        None
    };

    let mut documents = Vec::with_capacity(raw.hits.hits.len());
    for hit in raw.hits.hits {
        let Some(source) = hit.source else {
            warn!(hit = %hit.id, "skipping hit without a source payload");
            continue;
        };
        match serde_json::from_value::<ResourceDocument>(source) {
            Ok(document) => documents.push(document),
            Err(e) => warn!(hit = %hit.id, "skipping hit with undecodable source: {e}"),
        }
    }

    let next_page_token = next_cursor
        .map(|cursor| {
            let raw = serde_json::to_vec(&cursor).map_err(QueryError::unexpected)?;
            token::seal(&raw).map_err(QueryError::from)
        })
        .transpose()?;

    Ok(HitPage {
        documents,
        next_page_token,
    })
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn raw_response(value: Value) -> RawSearchResponse {
        serde_json::from_value(value).unwrap()
    }

    fn init_test_key() {
        token::init("gateway-test-secret").unwrap();
    }

    #[test]
    fn partial_page_has_no_next_token() {
        init_test_key();
        let raw = raw_response(json!({
            "hits": {
                "total": { "value": 1 },
                "hits": [{
                    "_id": "committee:1",
                    "_source": {
                        "object_ref": "committee:1",
                        "object_type": "committee",
                        "object_id": "1",
                        "public": true,
                        "data": { "name": "Board" },
                    },
                    "sort": ["board", "committee:1"],
                }],
            },
        }));
        let page = page_from_response(raw, 50).unwrap();
        assert_eq!(page.documents.len(), 1);
        assert_eq!(page.documents[0].object_ref, "committee:1");
        assert_eq!(page.next_page_token, None);
    }

    #[test]
    fn full_page_seals_the_last_sort_vector() {
        init_test_key();
        let raw = raw_response(json!({
            "hits": {
                "total": { "value": 10 },
                "hits": [
                    {
                        "_id": "committee:1",
                        "_source": {
                            "object_ref": "committee:1",
                            "object_type": "committee",
                            "object_id": "1",
                            "public": true,
                        },
                        "sort": ["alpha", "committee:1"],
                    },
                    {
                        "_id": "committee:2",
                        "_source": {
                            "object_ref": "committee:2",
                            "object_type": "committee",
                            "object_id": "2",
                            "public": true,
                        },
                        "sort": ["beta", "committee:2"],
                    },
                ],
            },
        }));
        let page = page_from_response(raw, 2).unwrap();
        let sealed = page.next_page_token.expect("full page must carry a cursor");
        let cursor = token::open(&sealed).unwrap();
        let sort_vector: Value = serde_json::from_slice(&cursor).unwrap();
        assert_eq!(sort_vector, json!(["beta", "committee:2"]));
    }

    #[test]
    fn undecodable_sources_are_skipped() {
        init_test_key();
        let raw = raw_response(json!({
            "hits": {
                "total": { "value": 2 },
                "hits": [
                    { "_id": "bogus", "_source": { "object_ref": 42 } },
                    {
                        "_id": "committee:2",
                        "_source": {
                            "object_ref": "committee:2",
                            "object_type": "committee",
                            "object_id": "2",
                            "public": true,
                        },
                    },
                ],
            },
        }));
        let page = page_from_response(raw, 50).unwrap();
        assert_eq!(page.documents.len(), 1);
        assert_eq!(page.documents[0].object_ref, "committee:2");
    }

    #[test]
    fn reported_errors_surface_as_backend_failures() {
        init_test_key();
        let raw = raw_response(json!({
            "error": { "type": "index_not_found_exception" },
        }));
        assert!(matches!(page_from_response(raw, 50), Err(QueryError::Backend(_))));
    }
}

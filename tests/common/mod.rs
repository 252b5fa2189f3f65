// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use lfx_query::{access::MockAccessChecker, search::MockSearchBackend, token, QueryPipeline};

/// Initializes the process-wide page token key. Repeated calls are no-ops,
/// so every test shares the first key.
#[allow(unused)]
pub fn init_page_token_key() {
    token::init("pipeline-test-secret").unwrap();
}

/// Builds a pipeline over fresh mock collaborators.
#[allow(unused)]
pub fn mock_pipeline() -> (QueryPipeline, Arc<MockSearchBackend>, Arc<MockAccessChecker>) {
    init_page_token_key();
    let search = Arc::new(MockSearchBackend::default());
    let access = Arc::new(MockAccessChecker::default());
    let pipeline = QueryPipeline::new(search.clone(), access.clone());
    (pipeline, search, access)
}

/// A resource document as the index would return it.
#[allow(unused)]
pub fn document(
    object_ref: &str,
    public: bool,
    access_check_object: &str,
    access_check_relation: &str,
) -> lfx_query::model::ResourceDocument {
    let (object_type, object_id) = object_ref.split_once(':').unwrap();
    lfx_query::model::ResourceDocument {
        object_ref: object_ref.to_string(),
        object_type: object_type.to_string(),
        object_id: object_id.to_string(),
        public,
        access_check_object: access_check_object.to_string(),
        access_check_relation: access_check_relation.to_string(),
        data: serde_json::json!({ "id": object_id }),
    }
}

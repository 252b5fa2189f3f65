// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use axum::{extract::State, routing::get, Router};
use hyper::StatusCode;
use lfx_query::{model::SearchCriteria, QueryPipeline};

use super::{
    auth::AuthPrincipal,
    extractors::ResourcesQuery,
    responses::{CountResponse, ResourcesResponse},
    ApiError, ApiResult, ApiState,
};

pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/livez", get(livez))
        .route("/readyz", get(readyz))
        .route("/query/resources", get(resources))
        .route("/query/resources/count", get(resources_count))
        .fallback(not_found)
        .with_state(state)
}

/// Returns the resources matching the filters that the caller may see.
async fn resources(
    State(pipeline): State<QueryPipeline>,
    AuthPrincipal(principal): AuthPrincipal,
    ResourcesQuery { criteria }: ResourcesQuery,
) -> ApiResult<ResourcesResponse> {
    Ok(pipeline.query(&principal, criteria).await?.into())
}

/// Returns how many resources match the filters, split by visibility.
async fn resources_count(
    State(pipeline): State<QueryPipeline>,
    AuthPrincipal(principal): AuthPrincipal,
    ResourcesQuery { criteria }: ResourcesQuery,
) -> ApiResult<CountResponse> {
    let criteria = SearchCriteria {
        page_size: 0,
        page_token: None,
        ..criteria
    };
    Ok(pipeline.count(&principal, criteria).await?.into())
}

async fn livez() -> &'static str {
    "OK"
}

async fn readyz(State(pipeline): State<QueryPipeline>) -> (StatusCode, &'static str) {
    if pipeline.is_ready().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    }
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

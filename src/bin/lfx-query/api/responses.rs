// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use axum::http::{header, HeaderValue};
use lfx_query::model::{Resource, ResourceCounts, SearchPage};
use serde::{Deserialize, Serialize};

macro_rules! impl_success_response {
    ($($type:ty),*) => {
        $(
            impl axum::response::IntoResponse for $type {
                fn into_response(self) -> axum::response::Response {
                    axum::Json(self).into_response()
                }
            }
        )*
    };
}

pub(crate) use impl_success_response;

/// One page of authorized resources.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourcesResponse {
    pub resources: Vec<Resource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
}

impl From<SearchPage> for ResourcesResponse {
    fn from(page: SearchPage) -> Self {
        Self {
            resources: page.resources,
            page_token: page.page_token,
            cache_control: page.cache_control,
        }
    }
}

impl axum::response::IntoResponse for ResourcesResponse {
    fn into_response(self) -> axum::response::Response {
        // The header mirrors the body's cache_control field.
        let cache_control = self
            .cache_control
            .as_deref()
            .and_then(|value| HeaderValue::from_str(value).ok());
        let mut response = axum::Json(self).into_response();
        if let Some(value) = cache_control {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
        response
    }
}

/// Aggregate counts of the matching resources.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub public: u64,
    pub private: u64,
    pub total: u64,
}

impl From<ResourceCounts> for CountResponse {
    fn from(counts: ResourceCounts) -> Self {
        Self {
            public: counts.public,
            private: counts.private,
            total: counts.total,
        }
    }
}

impl_success_response!(CountResponse);

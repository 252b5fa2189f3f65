// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use lfx_query::model::SearchCriteria;

use super::{config::ApiConfig, error::RequestError, ApiError};

/// The supported query version tag.
const QUERY_VERSION: &str = "1";

/// The caller-supplied resource filters.
///
/// Parsed by hand off the raw query string because `tags` and `tags_all`
/// repeat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourcesQuery {
    pub criteria: SearchCriteria,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ResourcesQuery
where
    ApiConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = ApiConfig::from_ref(state);

        let mut criteria = SearchCriteria::default();
        for (key, value) in url::form_urlencoded::parse(parts.uri.query().unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "v" => {
                    if value != QUERY_VERSION {
                        return Err(RequestError::UnsupportedVersion(value.into_owned()).into());
                    }
                }
                "name" => criteria.name = Some(value.into_owned()),
                "parent" => criteria.parent = Some(value.into_owned()),
                "type" => criteria.resource_type = Some(value.into_owned()),
                "tags" => criteria.tags.push(value.into_owned()),
                "tags_all" => criteria.tags_all.push(value.into_owned()),
                "sort" => criteria.sort = value.parse().map_err(RequestError::SortOrder)?,
                "page_size" => {
                    criteria.page_size = value.parse().map_err(RequestError::from)?;
                    if criteria.page_size < 1 {
                        return Err(RequestError::NonPositivePageSize.into());
                    }
                }
                "page_token" => criteria.page_token = Some(value.into_owned()),
                unknown => return Err(RequestError::UnknownParameter(unknown.to_string()).into()),
            }
        }
        criteria.page_size = criteria.page_size.min(config.max_page_size);

        Ok(ResourcesQuery { criteria })
    }
}

#[cfg(test)]
mod test {
    use axum::http::Request;
    use lfx_query::model::Sort;
    use pretty_assertions::assert_eq;

    use super::*;

    async fn parse(uri: &str) -> Result<ResourcesQuery, ApiError> {
        let mut parts = Request::builder().uri(uri).body(()).unwrap().into_parts().0;
        ResourcesQuery::from_request_parts(&mut parts, &ApiConfig::default()).await
    }

    #[tokio::test]
    async fn repeated_tags_collect() {
        let query = parse("/query/resources?v=1&name=board&tags=governance&tags=security&tags_all=active")
            .await
            .unwrap();
        assert_eq!(
            query.criteria,
            SearchCriteria {
                name: Some("board".to_string()),
                tags: vec!["governance".to_string(), "security".to_string()],
                tags_all: vec!["active".to_string()],
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn sort_and_paging_parse() {
        let query = parse("/query/resources?type=committee&sort=updated_desc&page_size=10&page_token=abc")
            .await
            .unwrap();
        assert_eq!(query.criteria.resource_type.as_deref(), Some("committee"));
        assert_eq!(query.criteria.sort, Sort::UpdatedDesc);
        assert_eq!(query.criteria.page_size, 10);
        assert_eq!(query.criteria.page_token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn page_size_is_clamped() {
        let query = parse("/query/resources?name=x&page_size=999999").await.unwrap();
        assert_eq!(query.criteria.page_size, ApiConfig::default().max_page_size);
    }

    #[tokio::test]
    async fn non_positive_page_size_is_rejected() {
        let err = parse("/query/resources?name=x&page_size=0").await.unwrap_err();
        assert_eq!(err.status(), hyper::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_parameters_are_rejected() {
        let err = parse("/query/resources?name=x&nope=1").await.unwrap_err();
        assert_eq!(err.status(), hyper::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unsupported_version_is_rejected() {
        let err = parse("/query/resources?v=2&name=x").await.unwrap_err();
        assert_eq!(err.status(), hyper::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bad_sort_is_rejected() {
        let err = parse("/query/resources?name=x&sort=newest").await.unwrap_err();
        assert_eq!(err.status(), hyper::StatusCode::BAD_REQUEST);
    }
}

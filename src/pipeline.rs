// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The authorization-aware query pipeline.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tracing::{debug, warn};

use crate::{
    access::{AccessChecker, VERDICT_ALLOW},
    error::QueryError,
    model::{Principal, Resource, ResourceCounts, SearchCriteria, SearchPage},
    search::{compile, SearchBackend},
};

/// The cache hint attached to anonymous responses, which contain only
/// public resources and are safe for shared intermediaries.
pub const PUBLIC_CACHE_CONTROL: &str = "public, max-age=300";

/// Orchestrates one query: validate, search, partition, check, assemble.
///
/// The pipeline holds no per-request state; the collaborators behind the
/// two capabilities are shared by all concurrent requests.
#[derive(Clone)]
pub struct QueryPipeline {
    search: Arc<dyn SearchBackend>,
    access: Arc<dyn AccessChecker>,
}

impl QueryPipeline {
    /// Creates a new [`QueryPipeline`] over the given collaborators.
    pub fn new(search: Arc<dyn SearchBackend>, access: Arc<dyn AccessChecker>) -> Self {
        Self { search, access }
    }

    /// Returns the resources matching the criteria that the principal is
    /// permitted to see, in backend order.
    ///
    /// Anonymous callers never reach the access control service: the
    /// public-only restriction is pushed into the backend query, so every
    /// hit is authorized by construction and the response is cacheable.
    pub async fn query(&self, principal: &Principal, mut criteria: SearchCriteria) -> Result<SearchPage, QueryError> {
        criteria.validate()?;

        let mut cache_control = None;
        if principal.is_anonymous() {
            criteria.public_only = true;
            cache_control = Some(PUBLIC_CACHE_CONTROL.to_string());
        }

        let compiled = compile(&criteria)?;
        let page = self.search.search(&compiled).await?;

        // Walk hits in order, dropping repeated object refs.
        let mut seen = HashSet::new();
        let mut hits = Vec::with_capacity(page.documents.len());
        for document in page.documents {
            if !seen.insert(document.object_ref.clone()) {
                debug!(object_ref = %document.object_ref, "dropping duplicate hit");
                continue;
            }
            hits.push(document);
        }

        // One batch over every hit that needs a check and can be checked.
        let mut batched = HashSet::new();
        let mut batch = Vec::new();
        for document in hits.iter().filter(|doc| doc.needs_check()) {
            match document.check_key(principal) {
                Some(key) => {
                    if batched.insert(key.to_string()) {
                        batch.push(key);
                    }
                }
                None => {
                    warn!(
                        object_ref = %document.object_ref,
                        "non-public hit is missing its access check fields"
                    );
                }
            }
        }
        let verdicts = if batch.is_empty() {
            HashMap::new()
        } else {
            self.access.check(&batch).await?
        };

        let resources = hits
            .into_iter()
            .filter(|document| {
                if !document.needs_check() {
                    return true;
                }
                document
                    .check_key(principal)
                    .is_some_and(|key| verdicts.get(&key.to_string()).map(String::as_str) == Some(VERDICT_ALLOW))
            })
            .map(Resource::from)
            .collect();

        Ok(SearchPage {
            resources,
            page_token: page.next_page_token,
            cache_control,
        })
    }

    /// Counts the resources matching the criteria, split by visibility.
    ///
    /// Anonymous callers get the public count only; the private side of the
    /// index is not consulted for resources they could never see.
    pub async fn count(&self, principal: &Principal, criteria: SearchCriteria) -> Result<ResourceCounts, QueryError> {
        criteria.validate()?;
        let criteria = SearchCriteria {
            page_size: 0,
            page_token: None,
            ..criteria
        };

        let public = self
            .search
            .count(&compile(&SearchCriteria {
                public_only: true,
                private_only: false,
                ..criteria.clone()
            })?)
            .await?;

        let private = if principal.is_anonymous() {
            0
        } else {
            self.search
                .count(&compile(&SearchCriteria {
                    public_only: false,
                    private_only: true,
                    ..criteria
                })?)
                .await?
        };

        Ok(ResourceCounts {
            public,
            private,
            total: public + private,
        })
    }

    /// Whether both collaborators are reachable.
    pub async fn is_ready(&self) -> bool {
        self.search.is_ready().await && self.access.is_ready().await
    }

    /// Releases the access control connection, letting in-flight checks
    /// finish.
    pub async fn close(&self) -> Result<(), QueryError> {
        self.access.close().await
    }
}

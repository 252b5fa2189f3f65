// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The search capability: compiling criteria into backend queries and
//! executing them.

pub mod config;
mod mock;
mod opensearch;
mod query;

use async_trait::async_trait;

pub use self::{
    config::OpenSearchConfig,
    mock::MockSearchBackend,
    opensearch::OpenSearchBackend,
    query::{compile, CompiledQuery, SOURCE_FIELDS},
};
use crate::{error::QueryError, model::ResourceDocument};

/// One page of hits in backend order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitPage {
    /// Decoded hits, in the order the backend returned them.
    pub documents: Vec<ResourceDocument>,
    /// Sealed cursor for the next page, present only when the backend
    /// returned a full page.
    pub next_page_token: Option<String>,
}

/// A full-text search service that resolves compiled queries into resource
/// hits.
///
/// Two implementations exist: [`OpenSearchBackend`] and the in-memory
/// [`MockSearchBackend`] used by tests and local development.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Executes a compiled query and returns one page of hits.
    async fn search(&self, query: &CompiledQuery) -> Result<HitPage, QueryError>;

    /// Executes a compiled count-mode query.
    async fn count(&self, query: &CompiledQuery) -> Result<u64, QueryError>;

    /// Whether the backend is reachable.
    async fn is_ready(&self) -> bool;
}

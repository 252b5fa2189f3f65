// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! An in-memory search double.

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicBool, Ordering},
    sync::Mutex,
};

use async_trait::async_trait;
use serde_json::Value;

use super::{CompiledQuery, HitPage, SearchBackend};
use crate::{error::QueryError, model::ResourceDocument};

/// A canned-response search backend.
///
/// Pages and counts are handed out in the order they were queued; every
/// executed query body is recorded for assertions. With nothing queued,
/// searches return an empty page, which also makes this the `mock` source
/// for local development.
#[derive(Debug, Default)]
pub struct MockSearchBackend {
    pages: Mutex<VecDeque<HitPage>>,
    counts: Mutex<VecDeque<u64>>,
    requests: Mutex<Vec<Value>>,
    unavailable: AtomicBool,
}

impl MockSearchBackend {
    /// Queues a page of hits.
    pub fn push_page(&self, documents: Vec<ResourceDocument>, next_page_token: Option<String>) {
        self.pages.lock().unwrap().push_back(HitPage {
            documents,
            next_page_token,
        });
    }

    /// Queues a count result.
    pub fn push_count(&self, count: u64) {
        self.counts.lock().unwrap().push_back(count);
    }

    /// The query bodies executed so far.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Makes subsequent calls fail with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn record(&self, query: &CompiledQuery) -> Result<(), QueryError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(QueryError::backend("mock backend is unavailable"));
        }
        self.requests.lock().unwrap().push(query.body.clone());
        Ok(())
    }
}

#[async_trait]
impl SearchBackend for MockSearchBackend {
    async fn search(&self, query: &CompiledQuery) -> Result<HitPage, QueryError> {
        self.record(query)?;
        Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn count(&self, query: &CompiledQuery) -> Result<u64, QueryError> {
        self.record(query)?;
        Ok(self.counts.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn is_ready(&self) -> bool {
        !self.unavailable.load(Ordering::Relaxed)
    }
}

// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! An in-memory access check double.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
    sync::Mutex,
};

use async_trait::async_trait;

use super::AccessChecker;
use crate::{error::QueryError, model::CheckKey};

/// A canned-verdict access checker.
///
/// Replies with the configured verdict for every requested key that has
/// one, mimicking a reply that simply omits undecided keys. Every batch is
/// recorded for assertions. With no verdicts configured it denies
/// everything, which also makes this the `mock` source for local
/// development.
#[derive(Debug, Default)]
pub struct MockAccessChecker {
    verdicts: Mutex<HashMap<String, String>>,
    batches: Mutex<Vec<Vec<CheckKey>>>,
    unavailable: AtomicBool,
}

impl MockAccessChecker {
    /// Sets the verdict returned for a key.
    pub fn set_verdict(&self, key: impl Into<String>, verdict: impl Into<String>) {
        self.verdicts.lock().unwrap().insert(key.into(), verdict.into());
    }

    /// The batches checked so far.
    pub fn batches(&self) -> Vec<Vec<CheckKey>> {
        self.batches.lock().unwrap().clone()
    }

    /// Makes subsequent checks fail as if the bus were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }
}

#[async_trait]
impl AccessChecker for MockAccessChecker {
    async fn check(&self, keys: &[CheckKey]) -> Result<HashMap<String, String>, QueryError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(QueryError::ServiceUnavailable(
                "mock access checker is unavailable".to_string(),
            ));
        }
        self.batches.lock().unwrap().push(keys.to_vec());
        let verdicts = self.verdicts.lock().unwrap();
        Ok(keys
            .iter()
            .filter_map(|key| {
                let key = key.to_string();
                verdicts.get(&key).map(|verdict| (key, verdict.clone()))
            })
            .collect())
    }

    async fn is_ready(&self) -> bool {
        !self.unavailable.load(Ordering::Relaxed)
    }
}

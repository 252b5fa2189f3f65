// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Holds the OpenSearch connection config.

/// The default OpenSearch endpoint.
pub const DEFAULT_URL: &str = "http://localhost:9200";
/// The default index queried for resources.
pub const DEFAULT_INDEX: &str = "resources";

/// The [`OpenSearchBackend`](super::OpenSearchBackend) config.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenSearchConfig {
    /// The endpoint of the OpenSearch cluster.
    pub url: String,
    /// The index holding the resource documents.
    pub index: String,
}

impl OpenSearchConfig {
    /// Creates a new [`OpenSearchConfig`].
    pub fn new(url: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            index: index.into(),
        }
    }
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            index: DEFAULT_INDEX.to_string(),
        }
    }
}

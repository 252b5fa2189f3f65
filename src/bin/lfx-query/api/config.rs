// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

/// The default port of the HTTP listener.
pub const DEFAULT_PORT: u16 = 8080;
/// The default upper bound on requested page sizes.
pub const DEFAULT_MAX_PAGE_SIZE: i64 = 1000;

/// API configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub port: u16,
    pub max_page_size: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Holds the access control bus config.

use std::time::Duration;

/// The default NATS endpoint.
pub const DEFAULT_URL: &str = "nats://localhost:4222";
/// The default request/reply subject of the access check service.
pub const DEFAULT_SUBJECT: &str = "lfx.access_check.request";
/// The default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
/// The default bound on reconnection attempts.
pub const DEFAULT_MAX_RECONNECTS: usize = 60;
/// The default delay between reconnection attempts.
pub const DEFAULT_RECONNECT_WAIT: Duration = Duration::from_secs(2);

/// The [`NatsAccessChecker`](super::NatsAccessChecker) config.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NatsConfig {
    /// The NATS server address.
    pub url: String,
    /// The request/reply subject the access check service listens on.
    pub subject: String,
    /// The deadline of one batched check.
    pub request_timeout: Duration,
    /// How often to retry the connection before giving up.
    pub max_reconnects: usize,
    /// How long to wait between reconnection attempts.
    pub reconnect_wait: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            max_reconnects: DEFAULT_MAX_RECONNECTS,
            reconnect_wait: DEFAULT_RECONNECT_WAIT,
        }
    }
}

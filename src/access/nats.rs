// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The NATS-backed access checker.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use async_nats::{connection::State, Event};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{encode_batch, parse_reply, AccessChecker, NatsConfig};
use crate::{error::QueryError, model::CheckKey};

/// An access checker speaking request/reply over a single long-lived NATS
/// connection.
///
/// The client multiplexes concurrent requests internally by inbox subject,
/// so no locking is needed on this side.
#[derive(Debug)]
pub struct NatsAccessChecker {
    client: async_nats::Client,
    subject: String,
    draining: AtomicBool,
}

impl NatsAccessChecker {
    /// Connects to the access control bus.
    pub async fn connect(config: &NatsConfig) -> Result<Self, QueryError> {
        let reconnect_wait = config.reconnect_wait;
        let client = async_nats::ConnectOptions::new()
            .name(env!("CARGO_PKG_NAME"))
            .max_reconnects(config.max_reconnects)
            .reconnect_delay_callback(move |attempts| {
                debug!("reconnecting to the access control bus (attempt {attempts})");
                reconnect_wait
            })
            .event_callback(|event| async move {
                match event {
                    Event::Connected => info!("access control bus connected"),
                    Event::Disconnected => warn!("access control bus disconnected"),
                    event => debug!("access control bus event: {event}"),
                }
            })
            .request_timeout(Some(config.request_timeout))
            .connect(config.url.as_str())
            .await
            .map_err(|e| QueryError::ServiceUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            subject: config.subject.clone(),
            draining: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl AccessChecker for NatsAccessChecker {
    async fn check(&self, keys: &[CheckKey]) -> Result<HashMap<String, String>, QueryError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let batch = encode_batch(keys);
        let reply = self
            .client
            .request(self.subject.clone(), batch.into())
            .await
            .map_err(|e| QueryError::ServiceUnavailable(e.to_string()))?;
        let body = std::str::from_utf8(&reply.payload).map_err(QueryError::unexpected)?;
        parse_reply(body)
    }

    async fn is_ready(&self) -> bool {
        self.client.connection_state() == State::Connected && !self.draining.load(Ordering::Relaxed)
    }

    async fn close(&self) -> Result<(), QueryError> {
        self.draining.store(true, Ordering::Relaxed);
        self.client
            .drain()
            .await
            .map_err(|e| QueryError::ServiceUnavailable(e.to_string()))
    }
}

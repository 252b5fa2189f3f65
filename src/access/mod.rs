// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The access control capability: batched permission checks over the
//! platform bus.
//!
//! The wire format is line-oriented and must be reproduced bit for bit.
//! A request is one line per unique check key, `object#relation@user:principal`,
//! joined by newlines with no trailing newline. A reply holds one
//! `key\tverdict` line per decided key; the literal verdict `"true"` allows,
//! anything else (including an absent key) denies.

pub mod config;
mod mock;
mod nats;

use std::collections::HashMap;

use async_trait::async_trait;

pub use self::{config::NatsConfig, mock::MockAccessChecker, nats::NatsAccessChecker};
use crate::{error::QueryError, model::CheckKey};

/// The verdict that allows a resource; every other verdict denies.
pub const VERDICT_ALLOW: &str = "true";

/// A relationship-based permission service answering batched checks.
///
/// Two implementations exist: [`NatsAccessChecker`] and the in-memory
/// [`MockAccessChecker`] used by tests and local development.
#[async_trait]
pub trait AccessChecker: Send + Sync {
    /// Resolves one batch of check keys into per-key verdicts.
    ///
    /// Keys absent from the returned mapping are denied.
    async fn check(&self, keys: &[CheckKey]) -> Result<HashMap<String, String>, QueryError>;

    /// Whether the checker can currently reach the permission service.
    async fn is_ready(&self) -> bool;

    /// Releases the underlying connection, letting in-flight requests
    /// finish.
    async fn close(&self) -> Result<(), QueryError> {
        Ok(())
    }
}

/// Encodes a batch of check keys into the request body.
pub fn encode_batch(keys: &[CheckKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses a reply body into its verdict mapping.
///
/// The mapping's iteration order carries no meaning; lookups are by exact
/// key.
pub fn parse_reply(body: &str) -> Result<HashMap<String, String>, QueryError> {
    let mut verdicts = HashMap::new();
    for line in body.lines() {
        if line.is_empty() {
            continue;
        }
        let Some((key, verdict)) = line.split_once('\t') else {
            return Err(QueryError::backend(format!(
                "malformed access check reply line: `{line}`"
            )));
        };
        verdicts.insert(key.to_string(), verdict.to_string());
    }
    Ok(verdicts)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Principal;

    fn key(object: &str, relation: &str) -> CheckKey {
        CheckKey {
            object: object.to_string(),
            relation: relation.to_string(),
            principal: Principal::from("alice"),
        }
    }

    #[test]
    fn batch_has_no_trailing_newline() {
        let batch = encode_batch(&[key("committee:1", "member"), key("project:2", "viewer")]);
        assert_eq!(batch, "committee:1#member@user:alice\nproject:2#viewer@user:alice");

        let single = encode_batch(&[key("committee:1", "member")]);
        assert_eq!(single, "committee:1#member@user:alice");

        assert_eq!(encode_batch(&[]), "");
    }

    #[test]
    fn reply_parses_verdicts() {
        let verdicts =
            parse_reply("committee:1#member@user:alice\ttrue\nproject:2#viewer@user:alice\tfalse\n").unwrap();
        assert_eq!(verdicts.len(), 2);
        assert_eq!(verdicts["committee:1#member@user:alice"], "true");
        assert_eq!(verdicts["project:2#viewer@user:alice"], "false");
    }

    #[test]
    fn reply_without_tab_is_a_backend_error() {
        assert!(matches!(
            parse_reply("committee:1#member@user:alice true"),
            Err(QueryError::Backend(_))
        ));
    }

    #[test]
    fn empty_reply_denies_everything() {
        assert!(parse_reply("").unwrap().is_empty());
    }

    #[test]
    fn batch_encoding_re_parses_to_the_same_mapping() {
        let keys = [
            key("committee:1", "member"),
            key("project:2", "viewer"),
            key("committee:3", "auditor"),
        ];
        let reply = keys
            .iter()
            .map(|k| format!("{k}\ttrue"))
            .collect::<Vec<_>>()
            .join("\n");
        let verdicts = parse_reply(&reply).unwrap();
        assert_eq!(verdicts.len(), keys.len());
        for k in &keys {
            assert_eq!(verdicts[&k.to_string()], VERDICT_ALLOW);
        }
    }
}

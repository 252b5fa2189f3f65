// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The query-serving layer of the LFX platform.
//!
//! A single authenticated HTTP endpoint returns the indexed resources that
//! match caller-supplied filters, restricted to those the calling principal
//! is permitted to see. The heart of the crate is the authorization-aware
//! [`pipeline`]: filters are compiled into an OpenSearch query, hits are
//! partitioned into public and check-requiring, and a single batched
//! round-trip over the access control bus decides the rest.

pub mod access;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod search;
pub mod token;

pub use self::{error::QueryError, pipeline::QueryPipeline};

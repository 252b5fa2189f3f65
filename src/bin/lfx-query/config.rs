// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use lfx_query::{access::NatsConfig, search::OpenSearchConfig};

use crate::{
    api::{auth::AuthConfig, ApiConfig},
    cli::{AccessControlSource, ClArgs, SearchSource},
};

/// Configuration of the query service.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub search_source: SearchSource,
    pub opensearch: OpenSearchConfig,
    pub access_control_source: AccessControlSource,
    pub nats: NatsConfig,
    pub api: ApiConfig,
    pub auth: AuthConfig,
}

impl From<&ClArgs> for ServiceConfig {
    fn from(args: &ClArgs) -> Self {
        Self {
            search_source: args.search.search_source,
            opensearch: OpenSearchConfig::from(&args.search),
            access_control_source: args.access.access_control_source,
            nats: NatsConfig::from(&args.access),
            api: ApiConfig::from(&args.api),
            auth: AuthConfig::from(&args.auth),
        }
    }
}

// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use clap::{Args, Parser, ValueEnum};
use lfx_query::{access::config as nats, search::config as opensearch};

use crate::api::{auth::AuthConfig, config as api};

/// The LFX resource query service
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct ClArgs {
    /// Search backend arguments.
    #[command(flatten, next_help_heading = "Search")]
    pub search: SearchArgs,
    /// Access control arguments.
    #[command(flatten, next_help_heading = "Access control")]
    pub access: AccessArgs,
    /// Rest API arguments.
    #[command(flatten, next_help_heading = "API")]
    pub api: ApiArgs,
    /// Authentication arguments.
    #[command(flatten, next_help_heading = "Authentication")]
    pub auth: AuthArgs,
    /// The shared secret the page token sealing key is derived from.
    #[arg(long, value_name = "SECRET", env = "PAGE_TOKEN_SECRET", hide_env_values = true)]
    pub page_token_secret: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SearchSource {
    /// Query a live OpenSearch cluster.
    Opensearch,
    /// Serve empty pages from the in-memory double.
    Mock,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// The search backend to query.
    #[arg(long, value_name = "SOURCE", value_enum, env = "SEARCH_SOURCE", default_value = "opensearch")]
    pub search_source: SearchSource,
    /// The OpenSearch endpoint.
    #[arg(long, value_name = "URL", env = "OPENSEARCH_URL", default_value = opensearch::DEFAULT_URL)]
    pub opensearch_url: String,
    /// The index holding the resource documents.
    #[arg(long, value_name = "NAME", env = "OPENSEARCH_INDEX", default_value = opensearch::DEFAULT_INDEX)]
    pub opensearch_index: String,
}

impl From<&SearchArgs> for lfx_query::search::OpenSearchConfig {
    fn from(value: &SearchArgs) -> Self {
        Self {
            url: value.opensearch_url.clone(),
            index: value.opensearch_index.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AccessControlSource {
    /// Check permissions over the NATS bus.
    Nats,
    /// Deny every check with the in-memory double.
    Mock,
}

#[derive(Args, Debug)]
pub struct AccessArgs {
    /// The access control service to consult.
    #[arg(long, value_name = "SOURCE", value_enum, env = "ACCESS_CONTROL_SOURCE", default_value = "nats")]
    pub access_control_source: AccessControlSource,
    /// The NATS server address.
    #[arg(long, value_name = "URL", env = "NATS_URL", default_value = nats::DEFAULT_URL)]
    pub nats_url: String,
    /// The request/reply subject of the access check service.
    #[arg(long, value_name = "SUBJECT", env = "NATS_SUBJECT", default_value = nats::DEFAULT_SUBJECT)]
    pub nats_subject: String,
    /// The deadline of one batched access check.
    #[arg(long, value_name = "DURATION", env = "NATS_TIMEOUT", default_value = "15s", value_parser = humantime::parse_duration)]
    pub nats_timeout: Duration,
    /// How often to retry the bus connection before giving up.
    #[arg(long, value_name = "COUNT", env = "NATS_MAX_RECONNECT", default_value_t = nats::DEFAULT_MAX_RECONNECTS)]
    pub nats_max_reconnect: usize,
    /// How long to wait between reconnection attempts.
    #[arg(long, value_name = "DURATION", env = "NATS_RECONNECT_WAIT", default_value = "2s", value_parser = humantime::parse_duration)]
    pub nats_reconnect_wait: Duration,
}

impl From<&AccessArgs> for lfx_query::access::NatsConfig {
    fn from(value: &AccessArgs) -> Self {
        Self {
            url: value.nats_url.clone(),
            subject: value.nats_subject.clone(),
            request_timeout: value.nats_timeout,
            max_reconnects: value.nats_max_reconnect,
            reconnect_wait: value.nats_reconnect_wait,
        }
    }
}

#[derive(Args, Debug)]
pub struct ApiArgs {
    /// The port the HTTP listener binds.
    #[arg(long, value_name = "PORT", env = "PORT", default_value_t = api::DEFAULT_PORT)]
    pub port: u16,
    /// The largest page size a caller may request.
    #[arg(long, value_name = "SIZE", default_value_t = api::DEFAULT_MAX_PAGE_SIZE)]
    pub max_page_size: i64,
}

impl From<&ApiArgs> for crate::api::ApiConfig {
    fn from(value: &ApiArgs) -> Self {
        Self {
            port: value.port,
            max_page_size: value.max_page_size,
        }
    }
}

#[derive(Args, Debug)]
pub struct AuthArgs {
    /// Where to fetch the JWT verification keys from.
    #[arg(long, value_name = "URL", env = "JWKS_URL")]
    pub jwks_url: Option<String>,
    /// The audience bearer tokens must be issued for.
    #[arg(long, value_name = "AUDIENCE", env = "AUDIENCE")]
    pub audience: Option<String>,
    /// Skip token validation and act as this principal. Local development
    /// only.
    #[arg(long, value_name = "PRINCIPAL", env = "JWT_AUTH_DISABLED_MOCK_LOCAL_PRINCIPAL")]
    pub mock_local_principal: Option<String>,
}

impl From<&AuthArgs> for AuthConfig {
    fn from(value: &AuthArgs) -> Self {
        Self {
            jwks_url: value.jwks_url.clone(),
            audience: value.audience.clone(),
            mock_local_principal: value.mock_local_principal.clone(),
        }
    }
}

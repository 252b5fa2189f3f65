// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Contains the HTTP surface over the query pipeline as well as the health
//! of its collaborators.

pub mod auth;
pub mod config;
mod error;
mod extractors;
#[macro_use]
mod responses;
mod routes;

use axum::{extract::FromRef, Server};
use futures::Future;
use hyper::Method;
use lfx_query::QueryPipeline;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub use self::{
    auth::AuthData,
    config::ApiConfig,
    error::{ApiError, ApiResult, AuthError, ConfigError, RequestError},
};

/// Everything a request handler can reach for.
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: QueryPipeline,
    pub auth: AuthData,
    pub config: ApiConfig,
}

impl FromRef<ApiState> for QueryPipeline {
    fn from_ref(state: &ApiState) -> Self {
        state.pipeline.clone()
    }
}

impl FromRef<ApiState> for AuthData {
    fn from_ref(state: &ApiState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<ApiState> for ApiConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.config.clone()
    }
}

/// The API worker.
pub struct ApiWorker {
    state: ApiState,
}

impl ApiWorker {
    /// Creates a new API worker over the pipeline.
    pub fn new(pipeline: QueryPipeline, auth: AuthData, config: &ApiConfig) -> Self {
        Self {
            state: ApiState {
                pipeline,
                auth,
                config: config.clone(),
            },
        }
    }

    pub async fn run(&self, shutdown_handle: impl Future<Output = ()>) -> hyper::Result<()> {
        let port = self.state.config.port;
        info!("Starting API server on port `{port}`");

        let routes = routes::routes(self.state.clone())
            .layer(CatchPanicLayer::new())
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(vec![Method::GET, Method::OPTIONS])
                    .allow_headers(Any)
                    .allow_credentials(false),
            );

        Server::bind(&([0, 0, 0, 0], port).into())
            .serve(routes.into_make_service())
            .with_graceful_shutdown(shutdown_handle)
            .await?;

        Ok(())
    }
}

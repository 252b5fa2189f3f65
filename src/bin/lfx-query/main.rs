// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module that holds the entry point of the query service.

mod api;
mod cli;
mod config;
mod error;
mod process;

use std::{sync::Arc, time::Duration};

use clap::Parser;
use futures::FutureExt;
use lfx_query::{
    access::{AccessChecker, MockAccessChecker, NatsAccessChecker},
    search::{MockSearchBackend, OpenSearchBackend, SearchBackend},
    token, QueryPipeline,
};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::{
    api::AuthData,
    cli::{AccessControlSource, ClArgs, SearchSource},
    config::ServiceConfig,
    error::Error,
};

/// How long in-flight requests get to finish after the shutdown signal.
/// Strictly longer than the access check deadline, so a pending batch can
/// still come back before the bus closes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(20);

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    set_up_logging();

    std::panic::set_hook(Box::new(|p| {
        error!("{}", p);
    }));

    let cl_args = ClArgs::parse();
    let config = ServiceConfig::from(&cl_args);

    token::init(&cl_args.page_token_secret)?;

    let search: Arc<dyn SearchBackend> = match config.search_source {
        SearchSource::Opensearch => {
            info!("Using the OpenSearch backend at `{}`", config.opensearch.url);
            Arc::new(OpenSearchBackend::new(&config.opensearch)?)
        }
        SearchSource::Mock => {
            warn!("Using the in-memory search backend");
            Arc::new(MockSearchBackend::default())
        }
    };

    let access: Arc<dyn AccessChecker> = match config.access_control_source {
        AccessControlSource::Nats => {
            info!("Connecting to the access control bus at `{}`", config.nats.url);
            Arc::new(NatsAccessChecker::connect(&config.nats).await?)
        }
        AccessControlSource::Mock => {
            warn!("Using the in-memory access checker");
            Arc::new(MockAccessChecker::default())
        }
    };

    let pipeline = QueryPipeline::new(search, access);
    let auth = AuthData::init(&config.auth).await.map_err(Error::Config)?;

    let mut tasks: JoinSet<Result<(), Error>> = JoinSet::new();

    let (shutdown_signal, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let mut handle = shutdown_signal.subscribe();
        let worker = api::ApiWorker::new(pipeline.clone(), auth, &config.api);
        tasks.spawn(async move {
            worker.run(handle.recv().then(|_| async {})).await?;
            Ok(())
        });
    }

    // We wait for either the interrupt signal to arrive or for a component of our system to signal a shutdown.
    tokio::select! {
        _ = process::interrupt_or_terminate() => {
            info!("received ctrl-c or terminate");
        },
        res = tasks.join_next() => {
            if let Some(Ok(Err(err))) = res {
                error!("A worker failed with error: {err}");
            }
        },
    }

    shutdown_signal.send(())?;

    // Allow the user to abort if the tasks aren't shutting down quickly.
    tokio::select! {
        _ = process::interrupt_or_terminate() => {
            info!("received second ctrl-c or terminate - aborting");
            tasks.shutdown().await;
            info!("Abort successful");
        },
        _ = tokio::time::sleep(SHUTDOWN_GRACE) => {
            warn!("shutdown grace period elapsed - aborting");
            tasks.shutdown().await;
        },
        _ = async { while tasks.join_next().await.is_some() {} } => {
            info!("Shutdown successful");
        },
    }

    if let Err(err) = pipeline.close().await {
        warn!("Draining the access control connection failed: {err}");
    }

    Ok(())
}

fn set_up_logging() {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use lfx_query::{token::TokenError, QueryError};
use thiserror::Error;

use crate::api::ConfigError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] QueryError),
    #[error(transparent)]
    PageTokenKey(#[from] TokenError),
    #[error(transparent)]
    Server(#[from] hyper::Error),
    #[error(transparent)]
    Shutdown(#[from] tokio::sync::broadcast::error::SendError<()>),
}

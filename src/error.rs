// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The error kinds surfaced by the query pipeline and its collaborators.

use thiserror::Error;

/// Boxed error source carried by the opaque variants.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// All the ways a query can fail.
///
/// The HTTP layer maps these onto status codes: [`Validation`] and
/// [`InvalidPageToken`] are the caller's fault (400), [`NotFound`] is 404,
/// [`Backend`] and [`ServiceUnavailable`] mean a collaborator is down (503),
/// and [`Unexpected`] is an internal error (500).
///
/// [`Validation`]: QueryError::Validation
/// [`InvalidPageToken`]: QueryError::InvalidPageToken
/// [`NotFound`]: QueryError::NotFound
/// [`Backend`]: QueryError::Backend
/// [`ServiceUnavailable`]: QueryError::ServiceUnavailable
/// [`Unexpected`]: QueryError::Unexpected
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("invalid query: {0}")]
    Validation(String),
    #[error("invalid page token")]
    InvalidPageToken,
    #[error("no matching resource")]
    NotFound,
    #[error("search backend error: {0}")]
    Backend(BoxedError),
    #[error("access control unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("unexpected payload: {0}")]
    Unexpected(BoxedError),
}

impl QueryError {
    /// Creates a validation error from anything printable.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wraps a search backend failure.
    pub fn backend(err: impl Into<BoxedError>) -> Self {
        Self::Backend(err.into())
    }

    /// Wraps a parse failure of an otherwise-trusted payload.
    pub fn unexpected(err: impl Into<BoxedError>) -> Self {
        Self::Unexpected(err.into())
    }
}

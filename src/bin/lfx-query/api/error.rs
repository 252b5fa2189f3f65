// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::num::ParseIntError;

use axum::{extract::rejection::TypedHeaderRejection, response::IntoResponse};
use hyper::StatusCode;
use lfx_query::{model::ParseSortError, QueryError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// The result of a request to the api.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum ApiError {
    #[error(transparent)]
    BadRequest(#[from] RequestError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("no endpoint found")]
    NotFound,
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl ApiError {
    /// Gets the HTTP status code associated with this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Query(err) => match err {
                QueryError::Validation(_) | QueryError::InvalidPageToken => StatusCode::BAD_REQUEST,
                QueryError::NotFound => StatusCode::NOT_FOUND,
                QueryError::Backend(_) | QueryError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                QueryError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Gets the u16 status code representation associated with this error.
    pub fn code(&self) -> u16 {
        self.status().as_u16()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        ErrorBody::from(self).into_response()
    }
}

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum RequestError {
    #[error("invalid integer value provided: {0}")]
    Int(#[from] ParseIntError),
    #[error("invalid authorization header provided: {0}")]
    InvalidAuthHeader(TypedHeaderRejection),
    #[error("page size must be positive")]
    NonPositivePageSize,
    #[error(transparent)]
    SortOrder(#[from] ParseSortError),
    #[error("unknown query parameter `{0}`")]
    UnknownParameter(String),
    #[error("unsupported query version `{0}`")]
    UnsupportedVersion(String),
}

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum AuthError {
    #[error("invalid JWT provided: {0}")]
    InvalidJwt(#[from] jsonwebtoken::errors::Error),
    #[error("no verification key matches the token key id")]
    UnknownKeyId,
    #[error("no JWT verification keys are configured")]
    NoVerificationKeys,
}

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error("failed to fetch the JWKS document: {0}")]
    Jwks(#[from] reqwest::Error),
}

#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing)]
    status: StatusCode,
    code: u16,
    message: String,
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> axum::response::Response {
        match serde_json::to_string(&self) {
            // Unwrap: Cannot fail as the only failure point is the header (which is valid).
            Ok(json) => axum::response::Response::builder()
                .status(self.status)
                .header(hyper::header::CONTENT_TYPE, "application/json")
                .body(axum::body::boxed(axum::body::Full::from(json)))
                .unwrap(),
            Err(e) => {
                error!("Unable to serialize error body: {}", e);
                Result::<(), _>::Err(format!("Unable to serialize error body: {}", e)).into_response()
            }
        }
    }
}

impl From<ApiError> for ErrorBody {
    fn from(err: ApiError) -> Self {
        if err.status().is_server_error() {
            error!("Internal API error: {err}");
        }

        Self {
            status: err.status(),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use axum::{
    extract::{rejection::TypedHeaderRejectionReason, FromRef, FromRequestParts},
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{jwk::JwkSet, DecodingKey, Validation};
use lfx_query::model::Principal;
use serde::Deserialize;
use tracing::info;

use super::{error::RequestError, ApiError, AuthError, ConfigError};

/// Authentication configuration.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    pub jwks_url: Option<String>,
    pub audience: Option<String>,
    pub mock_local_principal: Option<String>,
}

/// The verification material bearer tokens are checked against.
#[derive(Clone, Debug, Default)]
pub struct AuthData {
    audience: Option<String>,
    jwks: Option<JwkSet>,
    mock_local_principal: Option<String>,
}

impl AuthData {
    /// Resolves the config, fetching the JWKS document when one is
    /// configured.
    pub async fn init(config: &AuthConfig) -> Result<Self, ConfigError> {
        let jwks = match &config.jwks_url {
            Some(url) => {
                let jwks = reqwest::get(url)
                    .await?
                    .error_for_status()?
                    .json::<JwkSet>()
                    .await?;
                info!("Fetched {} JWT verification keys from `{url}`", jwks.keys.len());
                Some(jwks)
            }
            None => None,
        };
        Ok(Self {
            audience: config.audience.clone(),
            jwks,
            mock_local_principal: config.mock_local_principal.clone(),
        })
    }

    fn principal_from_token(&self, token: &str) -> Result<Principal, AuthError> {
        let jwks = self.jwks.as_ref().ok_or(AuthError::NoVerificationKeys)?;
        let header = jsonwebtoken::decode_header(token)?;
        let jwk = header
            .kid
            .as_deref()
            .and_then(|kid| jwks.find(kid))
            .ok_or(AuthError::UnknownKeyId)?;
        let key = DecodingKey::from_jwk(jwk)?;

        let mut validation = Validation::new(header.alg);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let token = jsonwebtoken::decode::<Claims>(token, &key, &validation)?;
        Ok(Principal::from(token.claims.sub))
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    /// Subject. The principal the token was issued to.
    sub: String,
}

/// The principal behind the request.
///
/// Produced by the security layer before the pipeline runs: a valid bearer
/// token resolves to its subject, a missing Authorization header to the
/// anonymous sentinel.
#[derive(Debug)]
pub struct AuthPrincipal(pub Principal);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthPrincipal
where
    AuthData: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthData::from_ref(state);

        if let Some(principal) = &auth.mock_local_principal {
            return Ok(AuthPrincipal(Principal::from(principal.as_str())));
        }

        match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
            Ok(TypedHeader(Authorization(bearer))) => {
                let principal = auth.principal_from_token(bearer.token()).map_err(ApiError::from)?;
                Ok(AuthPrincipal(principal))
            }
            Err(rejection) if matches!(rejection.reason(), TypedHeaderRejectionReason::Missing) => {
                Ok(AuthPrincipal(Principal::anonymous()))
            }
            Err(rejection) => Err(RequestError::InvalidAuthHeader(rejection).into()),
        }
    }
}

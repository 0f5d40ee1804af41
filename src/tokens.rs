// Lugnut
// Copyright 2025 The Lugnut Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Stateless bearer tokens for customer authentication.
//!
//! Tokens are HS256-signed JWTs carrying the issue time, the expiry time, and
//! the customer id as the subject.  The subject is rendered as a string: a
//! numeric subject is a malformed token and fails validation.
//!
//! There is no server-side session state and no revocation list.  A token
//! remains valid for its full lifetime even if the customer is deleted, until
//! it expires naturally.  Expiry is checked against the injected clock rather
//! than by the JWT library so that it participates in the same notion of time
//! as the rest of the service.

use crate::clocks::Clock;
use crate::env::{get_optional_var, get_required_var};
use crate::model::CustomerId;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default validity period of a token.
const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Errors that may arise when minting or validating tokens.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TokenError {
    /// The token was valid once but its lifetime is over.
    #[error("Token expired")]
    Expired,

    /// The token is unparsable, carries a bad signature, or has malformed claims.
    #[error("Invalid token")]
    Invalid,

    /// Catch-all error type for unexpected signing failures.
    #[error("{0}")]
    Internal(String),
}

/// Configuration options for the token manager.
#[derive(Clone)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct TokenOptions {
    /// Shared symmetric secret used to sign and verify every token.
    pub secret: String,

    /// Validity period of newly-minted tokens.
    pub ttl: Duration,
}

impl TokenOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_SECRET` and `<prefix>_TTL`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            secret: get_required_var::<String>(prefix, "SECRET")?,
            ttl: get_optional_var::<Duration>(prefix, "TTL")?.unwrap_or(DEFAULT_TTL),
        })
    }
}

/// The claims carried by every token.
#[derive(Deserialize, Serialize)]
struct Claims {
    /// Expiry time as seconds since the epoch.
    exp: i64,

    /// Issue time as seconds since the epoch.
    iat: i64,

    /// Customer id rendered as a string.
    sub: String,
}

/// Mints and validates the bearer tokens that identify customers.
pub struct TokenManager {
    /// Key used to sign newly-minted tokens.
    encoding_key: EncodingKey,

    /// Key used to verify the signature of presented tokens.
    decoding_key: DecodingKey,

    /// Signature and claim checks applied when decoding presented tokens.
    validation: Validation,

    /// Validity period of newly-minted tokens.
    ttl: Duration,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl TokenManager {
    /// Creates a new token manager from its configuration `opts` and a `clock`.
    pub fn new(opts: TokenOptions, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        // Expiry is checked by `validate` against our own clock.
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(opts.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(opts.secret.as_bytes()),
            validation,
            ttl: opts.ttl,
            clock,
        }
    }

    /// Mints a new token identifying `customer_id`, valid from now until the configured
    /// lifetime elapses.
    pub(crate) fn mint(&self, customer_id: CustomerId) -> Result<String, TokenError> {
        let now = self.clock.now_utc().unix_timestamp();
        let claims = Claims {
            exp: now + self.ttl.as_secs() as i64,
            iat: now,
            sub: customer_id.to_string(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Internal(format!("Cannot mint token: {}", e)))
    }

    /// Validates a presented `token` and returns the customer it identifies.
    pub(crate) fn validate(&self, token: &str) -> Result<CustomerId, TokenError> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
                .map_err(|_| TokenError::Invalid)?;

        let id = data.claims.sub.parse::<i64>().map_err(|_| TokenError::Invalid)?;

        if self.clock.now_utc().unix_timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(CustomerId::new(id))
    }
}

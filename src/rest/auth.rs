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

//! Bearer-token authentication middleware.
//!
//! Routes that require a customer identity are wrapped with `handle`, which
//! validates the `Authorization` header and injects the authenticated
//! `CustomerId` into the request extensions for the handler to consume.

use crate::model::CustomerId;
use crate::rest::{get_unique_header, RestError, RestResult};
use crate::tokens::{TokenError, TokenManager};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// Validates the bearer token in `headers` and returns the customer it identifies.
fn authenticate(tokens: &TokenManager, headers: &HeaderMap) -> RestResult<CustomerId> {
    let value = match get_unique_header(headers, "Authorization")? {
        Some(value) => value,
        None => return Err(RestError::Unauthorized("Must be logged in".to_owned())),
    };

    let value = value
        .to_str()
        .map_err(|e| RestError::Unauthorized(format!("Bad Authorization header: {}", e)))?;

    let mut fields = value.splitn(2, ' ');
    let scheme = fields.next().unwrap_or("");
    let token = fields.next().unwrap_or("").trim();
    if scheme != "Bearer" || token.is_empty() {
        return Err(RestError::Unauthorized("Token missing".to_owned()));
    }

    match tokens.validate(token) {
        Ok(customer_id) => Ok(customer_id),
        Err(TokenError::Expired) => Err(RestError::Unauthorized("Token expired".to_owned())),
        Err(TokenError::Invalid) => Err(RestError::Unauthorized("Invalid token".to_owned())),
        Err(TokenError::Internal(e)) => Err(RestError::InternalError(e)),
    }
}

/// Middleware entry point.
pub(crate) async fn handle(
    State(tokens): State<Arc<TokenManager>>,
    mut request: Request,
    next: Next,
) -> Response {
    let customer_id = match authenticate(&tokens, request.headers()) {
        Ok(customer_id) => customer_id,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(customer_id);
    next.run(request).await
}

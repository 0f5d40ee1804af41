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

//! REST layer of the repair shop service.
//!
//! Every API is in its own `.rs` file, using a name like `<entity>_<method>.rs`.  This may
//! seem overkill, but putting every API in its own file makes it easy to ensure all the
//! integration tests for the given API truly belong to that API.
//!
//! Cross-cutting concerns are not decorators nor globals: `app` composes the authentication,
//! throttling, and caching middleware onto the routes that need them, using handles that are
//! created once at startup and passed in explicitly.

use crate::driver::{Driver, DriverError};
use crate::model::{ModelError, Pagination};
use crate::rest::caching::ResponseCache;
use crate::rest::throttle::RateLimiter;
use crate::tokens::TokenManager;
use async_trait::async_trait;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Request};
use axum::http::header::AsHeaderName;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod auth;
pub mod caching;
pub(crate) mod throttle;

mod customer_delete;
mod customer_get;
mod customer_login_post;
mod customer_put;
mod customer_tickets_get;
mod customers_get;
mod customers_post;
mod mechanic_delete;
mod mechanic_get;
mod mechanic_put;
mod mechanics_get;
mod mechanics_post;
mod part_delete;
mod part_get;
mod part_put;
mod parts_get;
mod parts_post;
#[cfg(test)]
pub(crate) mod testutils;
mod ticket_add_part_put;
mod ticket_edit_put;
mod ticket_get;
mod ticket_put;
mod tickets_get;
mod tickets_post;

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum RestError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("{0}")]
    Conflict(String),

    /// Indicates that the authenticated identity may not touch the requested entity.
    #[error("{0}")]
    Forbidden(String),

    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that a request that should have empty content did not.
    #[error("Content should be empty")]
    PayloadNotEmpty,

    /// Indicates that the caller exhausted its daily quota for this route.
    #[error("{0}")]
    Throttled(String),

    /// Indicates an authentication problem.
    #[error("{0}")]
    Unauthorized(String),
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) => RestError::Conflict(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::InvalidInput(_) => RestError::InvalidRequest(e.to_string()),
            DriverError::NotFound(_) => RestError::NotFound(e.to_string()),
            DriverError::Unauthorized(_) => RestError::Unauthorized(e.to_string()),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> axum::response::Response {
        let status;
        let mut headers = HeaderMap::new();
        match self {
            RestError::Conflict(_) => {
                status = http::StatusCode::CONFLICT;
            }
            RestError::Forbidden(_) => {
                status = http::StatusCode::FORBIDDEN;
            }
            RestError::InternalError(_) => {
                status = http::StatusCode::INTERNAL_SERVER_ERROR;
            }
            RestError::InvalidRequest(_) => {
                status = http::StatusCode::BAD_REQUEST;
            }
            RestError::NotFound(_) => {
                status = http::StatusCode::NOT_FOUND;
            }
            RestError::PayloadNotEmpty => {
                status = http::StatusCode::PAYLOAD_TOO_LARGE;
            }
            RestError::Throttled(_) => {
                status = http::StatusCode::TOO_MANY_REQUESTS;
            }
            RestError::Unauthorized(_) => {
                status = http::StatusCode::UNAUTHORIZED;
                headers.insert(
                    "WWW-Authenticate",
                    "Bearer realm=\"lugnut\"".parse().expect("Hardcoded header must be valid"),
                );
            }
        };

        let response = ErrorResponse { message: self.to_string() };

        (status, headers, Json(response)).into_response()
    }
}

/// Result type for this module.
pub(crate) type RestResult<T> = Result<T, RestError>;

/// Representation of the details of an error response.
#[derive(Serialize)]
#[cfg_attr(test, derive(Debug, Deserialize))]
pub(crate) struct ErrorResponse {
    /// Textual representation of the error message.
    pub(crate) message: String,
}

/// Acknowledgment returned by the delete operations.
#[derive(Serialize)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq))]
pub(crate) struct DeleteResponse {
    /// Human-readable description of what was deleted.
    pub(crate) message: String,

    /// Id of the deleted entity.
    pub(crate) id: i64,
}

/// Query parameters accepted by the list operations.
///
/// The parameters are captured as raw strings on purpose: a missing, unparseable, or
/// non-positive value does not fail the request but falls back to returning the full
/// unpaged set.
#[derive(Deserialize)]
pub(crate) struct ListQuery {
    /// 1-based index of the page to return.
    page: Option<String>,

    /// Number of entries in every page.
    per_page: Option<String>,
}

impl ListQuery {
    /// Returns the pagination window to use, if the query carries a usable one.
    pub(crate) fn pagination(&self) -> Option<Pagination> {
        let page = self.page.as_ref()?.parse::<u32>().ok()?;
        let per_page = self.per_page.as_ref()?.parse::<u32>().ok()?;
        Pagination::new(page, per_page).ok()
    }
}

/// A request body extractor that forbids any content.
///
/// Any API that doesn't expect a body should use this to ensure we don't get garbage data
/// that we don't care about.  This future-proofs the service.
pub(crate) struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if req.into_body().is_end_stream() {
            Ok(EmptyBody {})
        } else {
            Err(RestError::PayloadNotEmpty)
        }
    }
}

/// Extracts the header `name` from `headers` and ensures it has at most one value.
pub(crate) fn get_unique_header<K: AsHeaderName + Copy>(
    headers: &HeaderMap,
    name: K,
) -> RestResult<Option<&HeaderValue>> {
    let mut iter = headers.get_all(name).iter();
    let value = iter.next();
    if iter.next().is_some() {
        return Err(RestError::InvalidRequest(format!(
            "Header {} cannot have more than one value",
            name.as_str()
        )));
    }
    Ok(value)
}

/// Creates the router for the application.
///
/// The `tokens`, `limiter`, and `cache` handles back the per-route middleware chains: auth
/// on the customer-identity routes, daily quotas on the mutating routes, and a short-lived
/// response cache on the hot read routes.
pub(crate) fn app(
    driver: Driver,
    tokens: Arc<TokenManager>,
    limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
) -> Router {
    use axum::middleware::from_fn_with_state;
    use axum::routing::{delete, get, post, put};

    Router::new()
        .route(
            "/customers",
            post(customers_post::handler).layer(from_fn_with_state(
                (limiter.clone(), throttle::CUSTOMER_CREATE),
                throttle::handle,
            )),
        )
        .route("/customers", get(customers_get::handler))
        .route("/customers/login", post(customer_login_post::handler))
        .route(
            "/customers/my-tickets",
            get(customer_tickets_get::handler)
                .layer(from_fn_with_state(tokens.clone(), auth::handle)),
        )
        .route(
            "/customers/:id",
            get(customer_get::handler)
                .layer(from_fn_with_state(cache.clone(), caching::handle)),
        )
        .route(
            "/customers/:id",
            put(customer_put::handler)
                .layer(from_fn_with_state(tokens.clone(), auth::handle))
                .layer(from_fn_with_state(
                    (limiter.clone(), throttle::CUSTOMER_UPDATE),
                    throttle::handle,
                )),
        )
        .route(
            "/customers/:id",
            delete(customer_delete::handler)
                .layer(from_fn_with_state(tokens.clone(), auth::handle))
                .layer(from_fn_with_state(
                    (limiter.clone(), throttle::CUSTOMER_DELETE),
                    throttle::handle,
                )),
        )
        .route(
            "/mechanics",
            post(mechanics_post::handler).layer(from_fn_with_state(
                (limiter.clone(), throttle::MECHANIC_CREATE),
                throttle::handle,
            )),
        )
        .route(
            "/mechanics",
            get(mechanics_get::handler)
                .layer(from_fn_with_state(cache.clone(), caching::handle)),
        )
        .route(
            "/mechanics/:id",
            get(mechanic_get::handler)
                .layer(from_fn_with_state(cache.clone(), caching::handle)),
        )
        .route(
            "/mechanics/:id",
            put(mechanic_put::handler).layer(from_fn_with_state(
                (limiter.clone(), throttle::MECHANIC_UPDATE),
                throttle::handle,
            )),
        )
        .route(
            "/mechanics/:id",
            delete(mechanic_delete::handler).layer(from_fn_with_state(
                (limiter.clone(), throttle::MECHANIC_DELETE),
                throttle::handle,
            )),
        )
        .route("/inventory", post(parts_post::handler))
        .route("/inventory", get(parts_get::handler))
        .route(
            "/inventory/:id",
            get(part_get::handler).put(part_put::handler).delete(part_delete::handler),
        )
        .route(
            "/tickets",
            post(tickets_post::handler).layer(from_fn_with_state(
                (limiter.clone(), throttle::TICKET_CREATE),
                throttle::handle,
            )),
        )
        .route(
            "/tickets",
            get(tickets_get::handler).layer(from_fn_with_state(cache.clone(), caching::handle)),
        )
        .route(
            "/tickets/:id",
            get(ticket_get::handler).layer(from_fn_with_state(cache, caching::handle)),
        )
        .route(
            "/tickets/:id",
            put(ticket_put::handler).layer(from_fn_with_state(
                (limiter, throttle::TICKET_UPDATE),
                throttle::handle,
            )),
        )
        .route("/tickets/:id/edit", put(ticket_edit_put::handler))
        .route("/tickets/:id/add_part", put(ticket_add_part_put::handler))
        .with_state(driver)
}

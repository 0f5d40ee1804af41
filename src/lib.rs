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

//! REST service to run the front desk of a vehicle repair shop.
//!
//! The service tracks customers, mechanics, inventory parts, and the service
//! tickets that tie them together, and it is structured as a strictly layered
//! application:
//!
//! 1.  `model`: The base layer, providing high-level data types that represent
//!     concepts in the repair shop domain.  There is no logic in here, and the
//!     newtype pattern is used extensively to make invalid values
//!     unrepresentable.
//!
//! 1.  `db`: The persistence layer.  Free functions expose domain-typed
//!     operations on top of a generic `Executor` that can talk to PostgreSQL
//!     (production) or SQLite (development and tests).
//!
//! 1.  `driver`: The business logic layer.  The `Driver` type owns the handles
//!     to the database, the clock, and the token manager, and coordinates each
//!     logical operation within a single transaction.
//!
//! 1.  `rest`: The HTTP layer, offering the REST APIs via an `axum::Router`.
//!     Cross-cutting concerns (authentication, request throttling, response
//!     caching) are middleware composed per route at startup, not ambient
//!     global state.
//!
//! 1.  `main`: The app launcher, which gathers configuration from environment
//!     variables and calls `serve`.
//!
//! There are result and error types in every layer, such as `DbResult` and
//! `DbError`, and errors float to the top of the app with the `?` operator
//! until they are converted to HTTP status codes by the REST layer.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use crate::clocks::SystemClock;
use crate::db::Db;
use crate::driver::Driver;
use crate::rest::caching::{CacheOptions, ResponseCache};
use crate::rest::throttle::RateLimiter;
use crate::tokens::{TokenManager, TokenOptions};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub mod clocks;
pub mod db;
pub(crate) mod driver;
pub mod env;
pub(crate) mod model;
pub mod rest;
pub mod tokens;

/// Configuration for the pieces of the service that are not the database.
pub struct ServeOptions {
    /// Configuration for the bearer token manager.
    pub tokens: TokenOptions,

    /// Configuration for the response cache.
    pub cache: CacheOptions,
}

/// Instantiates all resources and serves the application on `addr` until the
/// process is terminated.
///
/// The database must already exist and have an up-to-date schema; see
/// `db::init_schema`.
pub async fn serve(
    addr: SocketAddr,
    db: Box<dyn Db + Send + Sync>,
    opts: ServeOptions,
) -> Result<(), Box<dyn Error>> {
    let clock = Arc::from(SystemClock::default());
    let tokens = Arc::from(TokenManager::new(opts.tokens, clock.clone()));
    let driver = Driver::new(Arc::from(db), tokens.clone());
    let limiter = Arc::from(RateLimiter::new(clock));
    let cache = Arc::from(ResponseCache::new(opts.cache));
    let app = rest::app(driver, tokens, limiter, cache);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

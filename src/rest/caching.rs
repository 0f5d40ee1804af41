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

//! Short-lived cache of read responses.
//!
//! Responses are keyed by method and full request URI (path plus query
//! string).  Entries are never invalidated by writes: the marked read routes
//! change rarely, and staleness bounded by the TTL is an accepted tradeoff.

use crate::env::get_optional_var;
use crate::rest::RestError;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::lock::Mutex;
use log::warn;
use lru_time_cache::LruCache;
use std::sync::Arc;
use std::time::Duration;

/// Default maximum amount of time to keep cached entries in memory.
const DEFAULT_TTL_SECONDS: u64 = 60;

/// Default maximum number of responses to keep cached in memory.
const DEFAULT_CAPACITY: usize = 1024;

/// Options to configure a `ResponseCache`.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct CacheOptions {
    /// The TTL for the entries in the cache.
    pub ttl: Duration,

    /// The cache capacity in number of entries.
    pub capacity: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { ttl: Duration::from_secs(DEFAULT_TTL_SECONDS), capacity: DEFAULT_CAPACITY }
    }
}

impl CacheOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_TTL` and `<prefix>_CAPACITY`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            ttl: get_optional_var::<Duration>(prefix, "TTL")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_TTL_SECONDS)),
            capacity: get_optional_var::<usize>(prefix, "CAPACITY")?.unwrap_or(DEFAULT_CAPACITY),
        })
    }
}

/// A cached response body.
///
/// Only successful responses make it into the cache, and every cacheable route produces
/// JSON, so the status line and the body are all there is to remember.
#[derive(Clone)]
struct CachedResponse {
    /// Status code of the original response.
    status: StatusCode,

    /// Body of the original response.
    body: Bytes,
}

impl CachedResponse {
    /// Materializes the stored data as a fresh response.
    fn to_response(&self) -> Response {
        Response::builder()
            .status(self.status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(self.body.clone()))
            .expect("Building a response from cached parts cannot fail")
    }
}

/// Cache of successful read responses keyed by method and URI.
pub struct ResponseCache {
    /// Cached entries.
    entries: Mutex<LruCache<String, CachedResponse>>,
}

impl ResponseCache {
    /// Creates a new response cache using `opts` for configuration.
    pub fn new(opts: CacheOptions) -> Self {
        let entries = LruCache::with_expiry_duration_and_capacity(opts.ttl, opts.capacity);
        Self { entries: Mutex::from(entries) }
    }

    /// Returns a replay of the cached response for `key`, if still fresh.
    async fn get(&self, key: &str) -> Option<Response> {
        let mut entries = self.entries.lock().await;
        entries.get(key).map(CachedResponse::to_response)
    }

    /// Stores the response data for `key`.
    async fn put(&self, key: String, status: StatusCode, body: Bytes) {
        let mut entries = self.entries.lock().await;
        if let Some(old) = entries.insert(key, CachedResponse { status, body: body.clone() }) {
            if old.body != body {
                warn!("Cache insertion race detected with inconsistent values");
            }
        }
    }
}

/// Middleware entry point.
pub(crate) async fn handle(
    State(cache): State<Arc<ResponseCache>>,
    request: Request,
    next: Next,
) -> Response {
    let key = format!("{} {}", request.method(), request.uri());

    if let Some(response) = cache.get(&key).await {
        return response;
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            return RestError::InternalError(format!("Cannot buffer response: {}", e))
                .into_response();
        }
    };
    cache.put(key, parts.status, body.clone()).await;
    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::util::ServiceExt;

    #[test]
    fn test_options_from_env_all_present() {
        let overrides = [("CACHE_TTL", Some("3m")), ("CACHE_CAPACITY", Some("16"))];
        temp_env::with_vars(overrides, || {
            let opts = CacheOptions::from_env("CACHE").unwrap();
            assert_eq!(CacheOptions { ttl: Duration::from_secs(3 * 60), capacity: 16 }, opts);
        });
    }

    #[test]
    fn test_options_from_env_use_defaults() {
        temp_env::with_vars_unset(["CACHE_TTL", "CACHE_CAPACITY"], || {
            let opts = CacheOptions::from_env("CACHE").unwrap();
            assert_eq!(
                CacheOptions {
                    ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
                    capacity: DEFAULT_CAPACITY,
                },
                opts
            );
        });
    }

    /// Builds an app with a counting handler wrapped by a cache configured with `opts`, and
    /// returns the app and the hit counter.
    fn setup(opts: CacheOptions) -> (Router, Arc<AtomicUsize>) {
        let hits = Arc::from(AtomicUsize::new(0));
        let cache = Arc::from(ResponseCache::new(opts));

        let count_hits = hits.clone();
        let missing_hits = hits.clone();
        let app = Router::new()
            .route(
                "/count",
                get(move || {
                    let value = count_hits.fetch_add(1, Ordering::SeqCst) + 1;
                    async move { Json(value) }
                })
                .layer(axum::middleware::from_fn_with_state(cache.clone(), handle)),
            )
            .route(
                "/missing",
                get(move || {
                    missing_hits.fetch_add(1, Ordering::SeqCst);
                    async { RestError::NotFound("No such thing".to_owned()) }
                })
                .layer(axum::middleware::from_fn_with_state(cache, handle)),
            );
        (app, hits)
    }

    /// Sends a GET for `uri` to `app` and returns the response body as text.
    async fn get_text(app: &Router, uri: &str) -> String {
        let request = axum::http::Request::builder()
            .method(axum::http::Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(StatusCode::OK, response.status());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let (app, hits) = setup(CacheOptions::default());

        assert_eq!("1", get_text(&app, "/count").await);
        assert_eq!("1", get_text(&app, "/count").await);
        assert_eq!(1, hits.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_query_parameters_are_part_of_the_key() {
        let (app, hits) = setup(CacheOptions::default());

        assert_eq!("1", get_text(&app, "/count").await);
        assert_eq!("2", get_text(&app, "/count?page=2").await);
        assert_eq!("2", get_text(&app, "/count?page=2").await);
        assert_eq!("1", get_text(&app, "/count").await);
        assert_eq!(2, hits.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (app, hits) = setup(CacheOptions::default());

        for _ in 0..3 {
            let request = axum::http::Request::builder()
                .method(axum::http::Method::GET)
                .uri("/missing")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(StatusCode::NOT_FOUND, response.status());
        }
        assert_eq!(3, hits.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_caching() {
        let (app, hits) = setup(CacheOptions { ttl: Duration::ZERO, capacity: DEFAULT_CAPACITY });

        assert_eq!("1", get_text(&app, "/count").await);
        assert_eq!("2", get_text(&app, "/count").await);
        assert_eq!(2, hits.load(Ordering::SeqCst));
    }
}

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

//! API to list all inventory parts.

use crate::driver::Driver;
use crate::rest::{EmptyBody, ListQuery, RestError};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Query(query): Query<ListQuery>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let parts = driver.list_parts(query.pagination()).await?;
    Ok(Json(parts))
}

#[cfg(test)]
mod tests {
    use crate::rest::testutils::*;
    use serde_json::Value;

    fn route() -> (http::Method, &'static str) {
        (http::Method::GET, "/inventory")
    }

    #[tokio::test]
    async fn test_all() {
        let context = TestContext::setup().await;

        let _id = context.state.insert_part("Brake pad", 39.99).await;
        let _id = context.state.insert_part("Oil filter", 12.50).await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Vec<Value>>()
            .await;
        assert_eq!(2, response.len());
        assert_eq!("Brake pad", response[0]["name"]);
    }

    #[tokio::test]
    async fn test_paged() {
        let context = TestContext::setup().await;

        for i in 0..3 {
            let _id = context.state.insert_part(&format!("Part {}", i), 10.0).await;
        }

        let response = OneShotBuilder::new(context.app(), route())
            .with_query([("page", "3"), ("per_page", "1")])
            .send_empty()
            .await
            .expect_json::<Vec<Value>>()
            .await;
        assert_eq!(1, response.len());
        assert_eq!("Part 2", response[0]["name"]);
    }
}

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

//! API to list all customers.

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
    let customers = driver.list_customers(query.pagination()).await?;
    Ok(Json(customers))
}

#[cfg(test)]
mod tests {
    use crate::rest::testutils::*;
    use serde_json::Value;

    fn route() -> (http::Method, &'static str) {
        (http::Method::GET, "/customers")
    }

    #[tokio::test]
    async fn test_empty() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Vec<Value>>()
            .await;
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_all() {
        let context = TestContext::setup().await;

        for i in 0..3 {
            let _id =
                context.state.insert_customer(&format!("c{}@example.com", i), "letmein").await;
        }

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Vec<Value>>()
            .await;
        assert_eq!(3, response.len());
        assert_eq!("c0@example.com", response[0]["email"]);
    }

    #[tokio::test]
    async fn test_paged() {
        let context = TestContext::setup().await;

        for i in 0..3 {
            let _id =
                context.state.insert_customer(&format!("c{}@example.com", i), "letmein").await;
        }

        let response = OneShotBuilder::new(context.app(), route())
            .with_query([("page", "2"), ("per_page", "2")])
            .send_empty()
            .await
            .expect_json::<Vec<Value>>()
            .await;
        assert_eq!(1, response.len());
        assert_eq!("c2@example.com", response[0]["email"]);
    }

    #[tokio::test]
    async fn test_invalid_pagination_falls_back_to_everything() {
        let context = TestContext::setup().await;

        for i in 0..3 {
            let _id =
                context.state.insert_customer(&format!("c{}@example.com", i), "letmein").await;
        }

        for query in [[("page", "x"), ("per_page", "2")], [("page", "0"), ("per_page", "2")]] {
            let response = OneShotBuilder::new(context.app(), route())
                .with_query(query)
                .send_empty()
                .await
                .expect_json::<Vec<Value>>()
                .await;
            assert_eq!(3, response.len());
        }
    }
}

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

//! API to list the tickets of the authenticated customer.

use crate::driver::Driver;
use crate::model::CustomerId;
use crate::rest::{EmptyBody, RestError};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Extension(whoami): Extension<CustomerId>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let tickets = driver.customer_tickets(whoami).await?;
    Ok(Json(tickets))
}

#[cfg(test)]
mod tests {
    use crate::rest::testutils::*;
    use serde_json::Value;

    fn route() -> (http::Method, &'static str) {
        (http::Method::GET, "/customers/my-tickets")
    }

    #[tokio::test]
    async fn test_only_own_tickets() {
        let context = TestContext::setup().await;

        let owner = context.state.insert_customer("owner@example.com", "letmein").await;
        let other = context.state.insert_customer("other@example.com", "letmein").await;
        let ticket = context.state.insert_ticket(owner, &[]).await;
        let _other_ticket = context.state.insert_ticket(other, &[]).await;

        let response = OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(context.mint_token(owner))
            .send_empty()
            .await
            .expect_json::<Vec<Value>>()
            .await;
        assert_eq!(1, response.len());
        assert_eq!(ticket.as_i64(), response[0]["id"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn test_requires_login() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Must be logged in")
            .await;
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .with_bearer_auth("garbage")
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Invalid token")
            .await;
    }
}

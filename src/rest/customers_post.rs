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

//! API to create a customer.

use crate::driver::Driver;
use crate::model::{EmailAddress, Password};
use crate::rest::RestError;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

/// Contents of a creation request.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct CreateCustomerRequest {
    /// Free-form name of the customer.
    name: String,

    /// Email address of the customer.
    email: EmailAddress,

    /// Contact phone number.
    phone: String,

    /// Login password, which is only ever persisted as a hash.
    password: Password,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let customer = driver
        .create_customer(request.name, request.email, request.phone, request.password)
        .await?;
    Ok((http::StatusCode::CREATED, Json(customer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;

    fn route() -> (http::Method, &'static str) {
        (http::Method::POST, "/customers")
    }

    /// Builds a creation request with hardcoded values and the given `email`.
    fn request(email: &str) -> CreateCustomerRequest {
        CreateCustomerRequest {
            name: "Jane Doe".to_owned(),
            email: EmailAddress::from(email),
            phone: "555-0100".to_owned(),
            password: Password::from("letmein"),
        }
    }

    #[tokio::test]
    async fn test_create_ok() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_json(request("jane@example.com"))
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!("Jane Doe", response["name"]);
        assert_eq!("jane@example.com", response["email"]);
        assert_eq!("555-0100", response["phone"]);
        assert!(response["id"].as_i64().unwrap() > 0);
        assert!(response.get("password").is_none());

        assert_eq!(1, context.state.count_customers().await);
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let context = TestContext::setup().await;

        let _id = context.state.insert_customer("jane@example.com", "letmein").await;

        OneShotBuilder::new(context.app(), route())
            .send_json(request("jane@example.com"))
            .await
            .expect_status(http::StatusCode::CONFLICT)
            .expect_error("already exists")
            .await;

        assert_eq!(1, context.state.count_customers().await);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_json(serde_json::json!({"name": "Jane Doe"}))
            .await
            .expect_status(http::StatusCode::UNPROCESSABLE_ENTITY)
            .expect_text("missing field")
            .await;
    }

    #[tokio::test]
    async fn test_payload_must_be_json() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_text("this is not json")
            .await
            .expect_status(http::StatusCode::UNSUPPORTED_MEDIA_TYPE)
            .expect_text("Content-Type")
            .await;
    }

    #[tokio::test]
    async fn test_sixth_request_is_throttled() {
        let context = TestContext::setup().await;

        for i in 0..5 {
            let _response = OneShotBuilder::new(context.app(), route())
                .send_json(request(&format!("c{}@example.com", i)))
                .await
                .expect_status(http::StatusCode::CREATED)
                .expect_json::<serde_json::Value>()
                .await;
        }

        OneShotBuilder::new(context.app(), route())
            .send_json(request("c5@example.com"))
            .await
            .expect_status(http::StatusCode::TOO_MANY_REQUESTS)
            .expect_error("Rate limit exceeded")
            .await;

        assert_eq!(5, context.state.count_customers().await);
    }
}

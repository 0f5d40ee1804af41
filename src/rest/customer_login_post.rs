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

//! API to log a customer in and mint a bearer token.

use crate::driver::Driver;
use crate::model::{EmailAddress, Password};
use crate::rest::RestError;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Contents of a login request.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct LoginRequest {
    /// Email address the customer signed up with.
    email: EmailAddress,

    /// Login password.
    password: Password,
}

/// Message returned by the server after a successful login attempt.
#[derive(Serialize)]
#[cfg_attr(test, derive(Debug, Deserialize))]
pub(crate) struct LoginResponse {
    /// Outcome marker, always `success`.
    status: String,

    /// Human-readable description of the outcome.
    message: String,

    /// Bearer token for the started session.
    auth_token: String,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, RestError> {
    let auth_token = driver.login(request.email, request.password).await?;
    Ok(Json(LoginResponse {
        status: "success".to_owned(),
        message: "Successfully logged in".to_owned(),
        auth_token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use serde_json::{json, Value};

    fn route() -> (http::Method, &'static str) {
        (http::Method::POST, "/customers/login")
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let id = context.state.insert_customer("jane@example.com", "letmein").await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_json(LoginRequest {
                email: EmailAddress::from("jane@example.com"),
                password: Password::from("letmein"),
            })
            .await
            .expect_json::<LoginResponse>()
            .await;
        assert_eq!("success", response.status);
        assert!(!response.auth_token.is_empty());
        assert_eq!(id, context.state.tokens.validate(&response.auth_token).unwrap());
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let context = TestContext::setup().await;

        let _id = context.state.insert_customer("jane@example.com", "letmein").await;

        OneShotBuilder::new(context.app(), route())
            .send_json(LoginRequest {
                email: EmailAddress::from("jane@example.com"),
                password: Password::from("nope"),
            })
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Invalid email or password")
            .await;
    }

    #[tokio::test]
    async fn test_unknown_email() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_json(LoginRequest {
                email: EmailAddress::from("nobody@example.com"),
                password: Password::from("letmein"),
            })
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Invalid email or password")
            .await;
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_json(json!({"email": "jane@example.com"}))
            .await
            .expect_status(http::StatusCode::UNPROCESSABLE_ENTITY)
            .expect_text("missing field")
            .await;
    }

    #[tokio::test]
    async fn test_end_to_end_signup_and_login() {
        let context = TestContext::setup().await;

        // Sign up through the public API.
        let created = OneShotBuilder::new(context.app(), (http::Method::POST, "/customers"))
            .send_json(json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "phone": "555-0100",
                "password": "letmein",
            }))
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<Value>()
            .await;
        let id = created["id"].as_i64().unwrap();

        // Read the new customer back.
        let fetched =
            OneShotBuilder::new(context.app(), (http::Method::GET, format!("/customers/{}", id)))
                .send_empty()
                .await
                .expect_json::<Value>()
                .await;
        assert_eq!(created, fetched);

        // Exchange the credentials for a token.
        let response = OneShotBuilder::new(context.app(), route())
            .send_json(json!({"email": "jane@example.com", "password": "letmein"}))
            .await
            .expect_json::<LoginResponse>()
            .await;
        assert!(!response.auth_token.is_empty());

        // And use the token against an authenticated API.
        let tickets = OneShotBuilder::new(
            context.app(),
            (http::Method::GET, "/customers/my-tickets"),
        )
        .with_bearer_auth(response.auth_token)
        .send_empty()
        .await
        .expect_json::<Vec<Value>>()
        .await;
        assert!(tickets.is_empty());
    }
}

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

//! API to create a mechanic.

use crate::driver::Driver;
use crate::model::EmailAddress;
use crate::rest::RestError;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

/// Contents of a creation request.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct CreateMechanicRequest {
    /// Free-form name of the mechanic.
    name: String,

    /// Email address of the mechanic.
    email: EmailAddress,

    /// Contact phone number.
    phone: String,

    /// Yearly salary.
    salary: f64,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(request): Json<CreateMechanicRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let mechanic = driver
        .create_mechanic(request.name, request.email, request.phone, request.salary)
        .await?;
    Ok((http::StatusCode::CREATED, Json(mechanic)))
}

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

//! API to update a customer.
//!
//! Requires authentication: the token subject must be the customer being
//! updated.

use crate::driver::Driver;
use crate::model::{CustomerId, CustomerPatch};
use crate::rest::RestError;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<CustomerId>,
    Extension(whoami): Extension<CustomerId>,
    Json(patch): Json<CustomerPatch>,
) -> Result<impl IntoResponse, RestError> {
    if whoami != id {
        return Err(RestError::Forbidden("Cannot modify another customer".to_owned()));
    }

    let customer = driver.update_customer(id, patch).await?;
    Ok(Json(customer))
}

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

//! API to list all mechanics.

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
    let mechanics = driver.list_mechanics(query.pagination()).await?;
    Ok(Json(mechanics))
}

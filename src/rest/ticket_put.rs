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

//! API to update a service ticket.
//!
//! The body may carry any subset of the mutable fields; present fields are
//! validated with the creation rules and absent fields stay untouched.  A body
//! carrying every field is therefore a full replace.

use crate::driver::Driver;
use crate::model::{TicketId, TicketPatch};
use crate::rest::RestError;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<TicketId>,
    Json(patch): Json<TicketPatch>,
) -> Result<impl IntoResponse, RestError> {
    let ticket = driver.update_ticket(id, patch).await?;
    Ok(Json(ticket))
}

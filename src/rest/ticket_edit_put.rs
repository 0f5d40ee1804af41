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

//! API to edit the mechanic membership of a service ticket.
//!
//! This is a convenience endpoint: unresolvable or redundant ids in either
//! list are skipped silently instead of failing the request.

use crate::driver::Driver;
use crate::model::{MechanicId, TicketId};
use crate::rest::RestError;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

/// Contents of a membership edit request.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct EditMechanicsRequest {
    /// Mechanics to attach.
    #[serde(default)]
    add_ids: Vec<MechanicId>,

    /// Mechanics to detach.
    #[serde(default)]
    remove_ids: Vec<MechanicId>,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<TicketId>,
    Json(request): Json<EditMechanicsRequest>,
) -> Result<impl IntoResponse, RestError> {
    let ticket = driver.edit_ticket_mechanics(id, request.add_ids, request.remove_ids).await?;
    Ok(Json(ticket))
}

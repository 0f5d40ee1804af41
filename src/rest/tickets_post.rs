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

//! API to open a service ticket.

use crate::driver::Driver;
use crate::model::{CustomerId, MechanicId, ServiceDate, Vin};
use crate::rest::RestError;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

/// Contents of a creation request.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct CreateTicketRequest {
    /// Identification number of the vehicle to service.
    #[serde(rename = "VIN")]
    vin: Vin,

    /// Date on which the service takes place.
    service_date: ServiceDate,

    /// Description of the work to perform.
    service_desc: String,

    /// Owning customer.
    customer_id: CustomerId,

    /// Mechanics to assign.  Must resolve in full and must not be empty.
    mechanic_ids: Vec<MechanicId>,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(request): Json<CreateTicketRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let ticket = driver
        .create_ticket(
            request.vin,
            request.service_date,
            request.service_desc,
            request.customer_id,
            request.mechanic_ids,
        )
        .await?;
    Ok((http::StatusCode::CREATED, Json(ticket)))
}

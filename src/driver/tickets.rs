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

//! Operations on service tickets.
//!
//! Ticket mutations are all-or-nothing: the owning customer and every
//! requested mechanic id are resolved inside the same transaction that writes
//! the ticket and its associations, and any failure rolls the whole unit back.

use crate::db::{customers, mechanics, parts, tickets, DbError, Executor};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{
    CustomerId, MechanicId, PartId, ServiceDate, ServiceTicket, TicketId, TicketPatch, Vin,
};
use std::collections::BTreeSet;

/// Checks that the owning customer of a ticket exists.
async fn validate_customer(ex: &mut Executor, id: CustomerId) -> DriverResult<()> {
    match customers::get_customer(ex, id).await {
        Ok(_) => Ok(()),
        Err(DbError::NotFound) => Err(DriverError::InvalidInput("Invalid customer ID".to_owned())),
        Err(e) => Err(e.into()),
    }
}

/// Checks that every id in `mechanic_ids` resolves to an existing mechanic and returns the
/// deduplicated set.
///
/// A partial match is a full rejection: the count of resolved mechanics must equal the count
/// of distinct requested ids.
async fn validate_mechanics(
    ex: &mut Executor,
    mechanic_ids: &[MechanicId],
) -> DriverResult<BTreeSet<MechanicId>> {
    if mechanic_ids.is_empty() {
        return Err(DriverError::InvalidInput(
            "At least one mechanic is required".to_owned(),
        ));
    }

    let distinct: BTreeSet<MechanicId> = mechanic_ids.iter().copied().collect();
    let requested: Vec<MechanicId> = distinct.iter().copied().collect();
    let resolved = mechanics::count_mechanics(ex, &requested).await?;
    if resolved != requested.len() {
        return Err(DriverError::InvalidInput("Invalid mechanic IDs".to_owned()));
    }
    Ok(distinct)
}

impl Driver {
    /// Creates a new ticket and its mechanic associations as one unit.
    pub(crate) async fn create_ticket(
        self,
        vin: Vin,
        service_date: ServiceDate,
        service_desc: String,
        customer_id: CustomerId,
        mechanic_ids: Vec<MechanicId>,
    ) -> DriverResult<ServiceTicket> {
        let mut tx = self.db.begin().await?;

        validate_customer(tx.ex(), customer_id).await?;
        let mechanic_ids = validate_mechanics(tx.ex(), &mechanic_ids).await?;

        let id =
            tickets::create_ticket(tx.ex(), &vin, service_date, &service_desc, customer_id)
                .await?;
        for mechanic_id in &mechanic_ids {
            tickets::add_ticket_mechanic(tx.ex(), id, *mechanic_id).await?;
        }

        tx.commit().await?;
        Ok(ServiceTicket::new(
            id,
            vin,
            service_date,
            service_desc,
            customer_id,
            mechanic_ids,
            BTreeSet::default(),
        ))
    }

    /// Gets an existing ticket by id.
    pub(crate) async fn get_ticket(self, id: TicketId) -> DriverResult<ServiceTicket> {
        let ticket = tickets::get_ticket(&mut self.db.ex().await?, id).await?;
        Ok(ticket)
    }

    /// Lists all tickets.
    pub(crate) async fn list_tickets(self) -> DriverResult<Vec<ServiceTicket>> {
        let tickets = tickets::list_tickets(&mut self.db.ex().await?).await?;
        Ok(tickets)
    }

    /// Applies `patch` to an existing ticket.
    ///
    /// Every present field is validated with the same rules used at creation time, and absent
    /// fields are left untouched.  A patch carrying every field is therefore a full replace.
    pub(crate) async fn update_ticket(
        self,
        id: TicketId,
        patch: TicketPatch,
    ) -> DriverResult<ServiceTicket> {
        let mut tx = self.db.begin().await?;

        let ticket = tickets::get_ticket(tx.ex(), id).await?;

        if let Some(customer_id) = patch.customer_id {
            validate_customer(tx.ex(), customer_id).await?;
        }
        let mechanic_ids = match &patch.mechanic_ids {
            Some(mechanic_ids) => Some(validate_mechanics(tx.ex(), mechanic_ids).await?),
            None => None,
        };

        let vin = patch.vin.unwrap_or_else(|| ticket.vin().clone());
        let service_date = patch.service_date.unwrap_or(*ticket.service_date());
        let service_desc =
            patch.service_desc.unwrap_or_else(|| ticket.service_desc().clone());
        let customer_id = patch.customer_id.unwrap_or(*ticket.customer_id());

        tickets::update_ticket(tx.ex(), id, &vin, service_date, &service_desc, customer_id)
            .await?;
        let mechanic_ids = match mechanic_ids {
            Some(mechanic_ids) => {
                tickets::set_ticket_mechanics(tx.ex(), id, &mechanic_ids).await?;
                mechanic_ids
            }
            None => ticket.mechanic_ids().clone(),
        };

        tx.commit().await?;
        Ok(ServiceTicket::new(
            id,
            vin,
            service_date,
            service_desc,
            customer_id,
            mechanic_ids,
            ticket.part_ids().clone(),
        ))
    }

    /// Edits the mechanic membership of a ticket.
    ///
    /// Ids in `add_ids` that do not resolve to a mechanic, or that are already attached, are
    /// silently skipped; ids in `remove_ids` that are not attached are skipped the same way.
    /// This is a convenience operation and deliberately does not validate completeness of
    /// either list.
    pub(crate) async fn edit_ticket_mechanics(
        self,
        id: TicketId,
        add_ids: Vec<MechanicId>,
        remove_ids: Vec<MechanicId>,
    ) -> DriverResult<ServiceTicket> {
        let mut tx = self.db.begin().await?;

        // Fail early if the ticket itself is missing.
        let _exists = tickets::get_ticket(tx.ex(), id).await?;

        for mechanic_id in add_ids {
            match mechanics::get_mechanic(tx.ex(), mechanic_id).await {
                Ok(_) => tickets::add_ticket_mechanic(tx.ex(), id, mechanic_id).await?,
                Err(DbError::NotFound) => (),
                Err(e) => return Err(e.into()),
            }
        }
        for mechanic_id in remove_ids {
            tickets::remove_ticket_mechanic(tx.ex(), id, mechanic_id).await?;
        }

        let ticket = tickets::get_ticket(tx.ex(), id).await?;
        tx.commit().await?;
        Ok(ticket)
    }

    /// Attaches a part to a ticket.  Attaching an already-attached part succeeds without
    /// duplicating the association.
    pub(crate) async fn add_part(
        self,
        id: TicketId,
        part_id: PartId,
    ) -> DriverResult<ServiceTicket> {
        let mut tx = self.db.begin().await?;

        let _exists = tickets::get_ticket(tx.ex(), id).await?;
        let _part = parts::get_part(tx.ex(), part_id).await?;

        tickets::add_ticket_part(tx.ex(), id, part_id).await?;

        let ticket = tickets::get_ticket(tx.ex(), id).await?;
        tx.commit().await?;
        Ok(ticket)
    }
}

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

//! Database operations for service tickets and their associations.
//!
//! The mechanic and part associations are plain relational sets: composite
//! primary keys in the `ticket_mechanics` and `ticket_parts` tables make
//! duplicate pairs unrepresentable, and the insertions below use the
//! conflict-ignoring form so that re-attaching is a no-op rather than an
//! error.

#[cfg(feature = "postgres")]
use crate::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use crate::db::sqlite;
use crate::db::{DbError, DbResult, Executor};
use crate::model::{CustomerId, MechanicId, PartId, ServiceDate, ServiceTicket, TicketId, Vin};
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::{BTreeMap, BTreeSet};

/// A ticket row before its association sets have been loaded.
struct CoreTicket {
    /// Surrogate key of the ticket.
    id: TicketId,

    /// Identification number of the vehicle being serviced.
    vin: Vin,

    /// Date on which the service takes place.
    service_date: ServiceDate,

    /// Description of the work to perform.
    service_desc: String,

    /// Owning customer.
    customer_id: CustomerId,
}

impl CoreTicket {
    /// Combines the core row with its association sets into the full entity.
    fn into_ticket(
        self,
        mechanic_ids: BTreeSet<MechanicId>,
        part_ids: BTreeSet<PartId>,
    ) -> ServiceTicket {
        ServiceTicket::new(
            self.id,
            self.vin,
            self.service_date,
            self.service_desc,
            self.customer_id,
            mechanic_ids,
            part_ids,
        )
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for CoreTicket {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let vin: String = row.try_get("vin").map_err(postgres::map_sqlx_error)?;
        let service_date: time::Date =
            row.try_get("service_date").map_err(postgres::map_sqlx_error)?;
        let service_desc: String = row.try_get("service_desc").map_err(postgres::map_sqlx_error)?;
        let customer_id: i64 = row.try_get("customer_id").map_err(postgres::map_sqlx_error)?;

        Ok(CoreTicket {
            id: TicketId::new(id),
            vin: Vin::new(vin)?,
            service_date: ServiceDate::from_date(service_date),
            service_desc,
            customer_id: CustomerId::new(customer_id),
        })
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for CoreTicket {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let vin: String = row.try_get("vin").map_err(sqlite::map_sqlx_error)?;
        let service_date: String = row.try_get("service_date").map_err(sqlite::map_sqlx_error)?;
        let service_desc: String = row.try_get("service_desc").map_err(sqlite::map_sqlx_error)?;
        let customer_id: i64 = row.try_get("customer_id").map_err(sqlite::map_sqlx_error)?;

        Ok(CoreTicket {
            id: TicketId::new(id),
            vin: Vin::new(vin)?,
            service_date: ServiceDate::new(&service_date)?,
            service_desc,
            customer_id: CustomerId::new(customer_id),
        })
    }
}

/// Creates a new ticket row and returns its assigned id.
///
/// This persists the core fields only; the caller is responsible for attaching the mechanic
/// set within the same transaction so that the creation is observable as a single unit.
pub(crate) async fn create_ticket(
    ex: &mut Executor,
    vin: &Vin,
    service_date: ServiceDate,
    service_desc: &str,
    customer_id: CustomerId,
) -> DbResult<TicketId> {
    let id = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO service_tickets (vin, service_date, service_desc, customer_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(vin.as_str())
                .bind(service_date.as_date())
                .bind(service_desc)
                .bind(customer_id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get::<i64, _>("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO service_tickets (vin, service_date, service_desc, customer_id)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(vin.as_str())
                .bind(service_date.to_string())
                .bind(service_desc)
                .bind(customer_id.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.last_insert_rowid()
        }
    };

    Ok(TicketId::new(id))
}

/// Updates the core fields of an existing ticket.
pub(crate) async fn update_ticket(
    ex: &mut Executor,
    id: TicketId,
    vin: &Vin,
    service_date: ServiceDate,
    service_desc: &str,
    customer_id: CustomerId,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE service_tickets
                SET vin = $1, service_date = $2, service_desc = $3, customer_id = $4
                WHERE id = $5";
            let done = sqlx::query(query_str)
                .bind(vin.as_str())
                .bind(service_date.as_date())
                .bind(service_desc)
                .bind(customer_id.as_i64())
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE service_tickets
                SET vin = ?, service_date = ?, service_desc = ?, customer_id = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(vin.as_str())
                .bind(service_date.to_string())
                .bind(service_desc)
                .bind(customer_id.as_i64())
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Gets the set of mechanics attached to a ticket.
async fn get_ticket_mechanics(ex: &mut Executor, id: TicketId) -> DbResult<BTreeSet<MechanicId>> {
    let mut ids = BTreeSet::default();
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT mechanic_id FROM ticket_mechanics WHERE ticket_id = $1";
            let rows = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            for row in rows {
                let mechanic_id: i64 =
                    row.try_get("mechanic_id").map_err(postgres::map_sqlx_error)?;
                ids.insert(MechanicId::new(mechanic_id));
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT mechanic_id FROM ticket_mechanics WHERE ticket_id = ?";
            let rows = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            for row in rows {
                let mechanic_id: i64 =
                    row.try_get("mechanic_id").map_err(sqlite::map_sqlx_error)?;
                ids.insert(MechanicId::new(mechanic_id));
            }
        }
    }
    Ok(ids)
}

/// Gets the set of parts attached to a ticket.
async fn get_ticket_parts(ex: &mut Executor, id: TicketId) -> DbResult<BTreeSet<PartId>> {
    let mut ids = BTreeSet::default();
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT part_id FROM ticket_parts WHERE ticket_id = $1";
            let rows = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            for row in rows {
                let part_id: i64 = row.try_get("part_id").map_err(postgres::map_sqlx_error)?;
                ids.insert(PartId::new(part_id));
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT part_id FROM ticket_parts WHERE ticket_id = ?";
            let rows = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            for row in rows {
                let part_id: i64 = row.try_get("part_id").map_err(sqlite::map_sqlx_error)?;
                ids.insert(PartId::new(part_id));
            }
        }
    }
    Ok(ids)
}

/// Gets an existing ticket by id, including its association sets.
pub(crate) async fn get_ticket(ex: &mut Executor, id: TicketId) -> DbResult<ServiceTicket> {
    let core = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM service_tickets WHERE id = $1";
            let raw_ticket = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            CoreTicket::try_from(raw_ticket)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM service_tickets WHERE id = ?";
            let raw_ticket = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            CoreTicket::try_from(raw_ticket)?
        }
    };

    let mechanic_ids = get_ticket_mechanics(ex, id).await?;
    let part_ids = get_ticket_parts(ex, id).await?;
    Ok(core.into_ticket(mechanic_ids, part_ids))
}

/// Loads the association sets for every ticket in `cores` and assembles the full entities.
async fn load_tickets(ex: &mut Executor, cores: Vec<CoreTicket>) -> DbResult<Vec<ServiceTicket>> {
    let mut mechanics = BTreeMap::<TicketId, BTreeSet<MechanicId>>::default();
    let mut parts = BTreeMap::<TicketId, BTreeSet<PartId>>::default();
    for core in &cores {
        mechanics.insert(core.id, get_ticket_mechanics(ex, core.id).await?);
        parts.insert(core.id, get_ticket_parts(ex, core.id).await?);
    }

    let mut tickets = Vec::with_capacity(cores.len());
    for core in cores {
        let mechanic_ids = mechanics.remove(&core.id).unwrap_or_default();
        let part_ids = parts.remove(&core.id).unwrap_or_default();
        tickets.push(core.into_ticket(mechanic_ids, part_ids));
    }
    Ok(tickets)
}

/// Lists all tickets, including their association sets.
pub(crate) async fn list_tickets(ex: &mut Executor) -> DbResult<Vec<ServiceTicket>> {
    let cores = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM service_tickets ORDER BY id";
            let rows =
                sqlx::query(query_str).fetch_all(ex).await.map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(CoreTicket::try_from).collect::<DbResult<Vec<CoreTicket>>>()?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM service_tickets ORDER BY id";
            let rows =
                sqlx::query(query_str).fetch_all(ex).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(CoreTicket::try_from).collect::<DbResult<Vec<CoreTicket>>>()?
        }
    };

    load_tickets(ex, cores).await
}

/// Lists the tickets owned by `customer_id`, including their association sets.
pub(crate) async fn list_tickets_by_customer(
    ex: &mut Executor,
    customer_id: CustomerId,
) -> DbResult<Vec<ServiceTicket>> {
    let cores = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM service_tickets WHERE customer_id = $1 ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(customer_id.as_i64())
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(CoreTicket::try_from).collect::<DbResult<Vec<CoreTicket>>>()?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM service_tickets WHERE customer_id = ? ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(customer_id.as_i64())
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(CoreTicket::try_from).collect::<DbResult<Vec<CoreTicket>>>()?
        }
    };

    load_tickets(ex, cores).await
}

/// Counts the tickets owned by `customer_id`.
pub(crate) async fn count_tickets_by_customer(
    ex: &mut Executor,
    customer_id: CustomerId,
) -> DbResult<i64> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT COUNT(*) AS count FROM service_tickets WHERE customer_id = $1";
            let row = sqlx::query(query_str)
                .bind(customer_id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("count").map_err(postgres::map_sqlx_error)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT COUNT(*) AS count FROM service_tickets WHERE customer_id = ?";
            let row = sqlx::query(query_str)
                .bind(customer_id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)
        }
    }
}

/// Attaches a mechanic to a ticket.  Attaching an already-attached mechanic is a no-op.
pub(crate) async fn add_ticket_mechanic(
    ex: &mut Executor,
    ticket_id: TicketId,
    mechanic_id: MechanicId,
) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO ticket_mechanics (ticket_id, mechanic_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING";
            sqlx::query(query_str)
                .bind(ticket_id.as_i64())
                .bind(mechanic_id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT OR IGNORE INTO ticket_mechanics (ticket_id, mechanic_id)
                VALUES (?, ?)";
            sqlx::query(query_str)
                .bind(ticket_id.as_i64())
                .bind(mechanic_id.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
        }
    }
    Ok(())
}

/// Detaches a mechanic from a ticket.  Detaching an absent mechanic is a no-op.
pub(crate) async fn remove_ticket_mechanic(
    ex: &mut Executor,
    ticket_id: TicketId,
    mechanic_id: MechanicId,
) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                DELETE FROM ticket_mechanics WHERE ticket_id = $1 AND mechanic_id = $2";
            sqlx::query(query_str)
                .bind(ticket_id.as_i64())
                .bind(mechanic_id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM ticket_mechanics WHERE ticket_id = ? AND mechanic_id = ?";
            sqlx::query(query_str)
                .bind(ticket_id.as_i64())
                .bind(mechanic_id.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
        }
    }
    Ok(())
}

/// Replaces the mechanic set of a ticket with `mechanic_ids`.
pub(crate) async fn set_ticket_mechanics(
    ex: &mut Executor,
    ticket_id: TicketId,
    mechanic_ids: &BTreeSet<MechanicId>,
) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM ticket_mechanics WHERE ticket_id = $1";
            sqlx::query(query_str)
                .bind(ticket_id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM ticket_mechanics WHERE ticket_id = ?";
            sqlx::query(query_str)
                .bind(ticket_id.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
        }
    }

    for mechanic_id in mechanic_ids {
        add_ticket_mechanic(ex, ticket_id, *mechanic_id).await?;
    }
    Ok(())
}

/// Attaches a part to a ticket.  Attaching an already-attached part is a no-op.
pub(crate) async fn add_ticket_part(
    ex: &mut Executor,
    ticket_id: TicketId,
    part_id: PartId,
) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO ticket_parts (ticket_id, part_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING";
            sqlx::query(query_str)
                .bind(ticket_id.as_i64())
                .bind(part_id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "INSERT OR IGNORE INTO ticket_parts (ticket_id, part_id) VALUES (?, ?)";
            sqlx::query(query_str)
                .bind(ticket_id.as_i64())
                .bind(part_id.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
        }
    }
    Ok(())
}

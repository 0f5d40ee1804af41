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

//! Database operations for mechanics.

#[cfg(feature = "postgres")]
use crate::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use crate::db::sqlite;
use crate::db::{DbError, DbResult, Executor};
use crate::model::{EmailAddress, Mechanic, MechanicId, Pagination};
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Mechanic {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(postgres::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(postgres::map_sqlx_error)?;
        let salary: f64 = row.try_get("salary").map_err(postgres::map_sqlx_error)?;

        Ok(Mechanic::new(MechanicId::new(id), name, EmailAddress::new(email)?, phone, salary))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Mechanic {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(sqlite::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(sqlite::map_sqlx_error)?;
        let salary: f64 = row.try_get("salary").map_err(sqlite::map_sqlx_error)?;

        Ok(Mechanic::new(MechanicId::new(id), name, EmailAddress::new(email)?, phone, salary))
    }
}

/// Creates a new mechanic with the given details and returns it with its assigned id.
pub(crate) async fn create_mechanic(
    ex: &mut Executor,
    name: String,
    email: EmailAddress,
    phone: String,
    salary: f64,
) -> DbResult<Mechanic> {
    let id = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO mechanics (name, email, phone, salary)
                VALUES ($1, $2, $3, $4)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(&name)
                .bind(email.as_str())
                .bind(&phone)
                .bind(salary)
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get::<i64, _>("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO mechanics (name, email, phone, salary)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(&name)
                .bind(email.as_str())
                .bind(&phone)
                .bind(salary)
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.last_insert_rowid()
        }
    };

    Ok(Mechanic::new(MechanicId::new(id), name, email, phone, salary))
}

/// Gets information about an existing mechanic by id.
pub(crate) async fn get_mechanic(ex: &mut Executor, id: MechanicId) -> DbResult<Mechanic> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM mechanics WHERE id = $1";
            let raw_mechanic = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Mechanic::try_from(raw_mechanic)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM mechanics WHERE id = ?";
            let raw_mechanic = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Mechanic::try_from(raw_mechanic)
        }
    }
}

/// Gets the mechanic that owns `email`, or `None` if the address is unused.
pub(crate) async fn get_mechanic_by_email(
    ex: &mut Executor,
    email: &EmailAddress,
) -> DbResult<Option<Mechanic>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM mechanics WHERE email = $1";
            let raw_mechanic = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_optional(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            raw_mechanic.map(Mechanic::try_from).transpose()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM mechanics WHERE email = ?";
            let raw_mechanic = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_optional(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            raw_mechanic.map(Mechanic::try_from).transpose()
        }
    }
}

/// Counts how many of the mechanics in `ids` exist.
///
/// The all-or-nothing validation of ticket mutations only needs the quantity, not the rows:
/// if the count is lower than the number of distinct requested ids, at least one id is
/// unresolvable and the whole mutation must fail.
pub(crate) async fn count_mechanics(ex: &mut Executor, ids: &[MechanicId]) -> DbResult<usize> {
    let mut found = 0;
    for id in ids {
        match get_mechanic(ex, *id).await {
            Ok(_) => found += 1,
            Err(DbError::NotFound) => (),
            Err(e) => return Err(e),
        }
    }
    Ok(found)
}

/// Lists all mechanics, or the window selected by `pagination` when present.
pub(crate) async fn list_mechanics(
    ex: &mut Executor,
    pagination: Option<Pagination>,
) -> DbResult<Vec<Mechanic>> {
    let raw_mechanics = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM mechanics ORDER BY id LIMIT $1 OFFSET $2";
            let rows = sqlx::query(query_str)
                .bind(pagination.map(|p| p.limit()))
                .bind(pagination.map(|p| p.offset()).unwrap_or(0))
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Mechanic::try_from).collect::<DbResult<Vec<Mechanic>>>()?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM mechanics ORDER BY id LIMIT ? OFFSET ?";
            let rows = sqlx::query(query_str)
                .bind(pagination.map(|p| p.limit()).unwrap_or(-1))
                .bind(pagination.map(|p| p.offset()).unwrap_or(0))
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Mechanic::try_from).collect::<DbResult<Vec<Mechanic>>>()?
        }
    };
    Ok(raw_mechanics)
}

/// Updates an existing mechanic with the contents of the full `mechanic` entity.
pub(crate) async fn update_mechanic(ex: &mut Executor, mechanic: &Mechanic) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE mechanics SET name = $1, email = $2, phone = $3, salary = $4
                WHERE id = $5";
            let done = sqlx::query(query_str)
                .bind(mechanic.name())
                .bind(mechanic.email().as_str())
                .bind(mechanic.phone())
                .bind(mechanic.salary())
                .bind(mechanic.id().as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE mechanics SET name = ?, email = ?, phone = ?, salary = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(mechanic.name())
                .bind(mechanic.email().as_str())
                .bind(mechanic.phone())
                .bind(mechanic.salary())
                .bind(mechanic.id().as_i64())
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

/// Deletes an existing mechanic by id, detaching it from any tickets first.
pub(crate) async fn delete_mechanic(ex: &mut Executor, id: MechanicId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM ticket_mechanics WHERE mechanic_id = $1";
            sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(&mut *ex)
                .await
                .map_err(postgres::map_sqlx_error)?;

            let query_str = "DELETE FROM mechanics WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM ticket_mechanics WHERE mechanic_id = ?";
            sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(&mut *ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;

            let query_str = "DELETE FROM mechanics WHERE id = ?";
            let done = sqlx::query(query_str)
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
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}

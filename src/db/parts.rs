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

//! Database operations for inventory parts.

#[cfg(feature = "postgres")]
use crate::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use crate::db::sqlite;
use crate::db::{DbError, DbResult, Executor};
use crate::model::{Pagination, Part, PartId};
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Part {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let price: f64 = row.try_get("price").map_err(postgres::map_sqlx_error)?;

        Ok(Part::new(PartId::new(id), name, price))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Part {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let price: f64 = row.try_get("price").map_err(sqlite::map_sqlx_error)?;

        Ok(Part::new(PartId::new(id), name, price))
    }
}

/// Creates a new part with the given details and returns it with its assigned id.
pub(crate) async fn create_part(ex: &mut Executor, name: String, price: f64) -> DbResult<Part> {
    let id = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO parts (name, price) VALUES ($1, $2) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(&name)
                .bind(price)
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get::<i64, _>("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO parts (name, price) VALUES (?, ?)";
            let done = sqlx::query(query_str)
                .bind(&name)
                .bind(price)
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.last_insert_rowid()
        }
    };

    Ok(Part::new(PartId::new(id), name, price))
}

/// Gets information about an existing part by id.
pub(crate) async fn get_part(ex: &mut Executor, id: PartId) -> DbResult<Part> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM parts WHERE id = $1";
            let raw_part = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Part::try_from(raw_part)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM parts WHERE id = ?";
            let raw_part = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Part::try_from(raw_part)
        }
    }
}

/// Lists all parts, or the window selected by `pagination` when present.
pub(crate) async fn list_parts(
    ex: &mut Executor,
    pagination: Option<Pagination>,
) -> DbResult<Vec<Part>> {
    let raw_parts = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM parts ORDER BY id LIMIT $1 OFFSET $2";
            let rows = sqlx::query(query_str)
                .bind(pagination.map(|p| p.limit()))
                .bind(pagination.map(|p| p.offset()).unwrap_or(0))
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Part::try_from).collect::<DbResult<Vec<Part>>>()?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM parts ORDER BY id LIMIT ? OFFSET ?";
            let rows = sqlx::query(query_str)
                .bind(pagination.map(|p| p.limit()).unwrap_or(-1))
                .bind(pagination.map(|p| p.offset()).unwrap_or(0))
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Part::try_from).collect::<DbResult<Vec<Part>>>()?
        }
    };
    Ok(raw_parts)
}

/// Updates an existing part with the contents of the full `part` entity.
pub(crate) async fn update_part(ex: &mut Executor, part: &Part) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "UPDATE parts SET name = $1, price = $2 WHERE id = $3";
            let done = sqlx::query(query_str)
                .bind(part.name())
                .bind(part.price())
                .bind(part.id().as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE parts SET name = ?, price = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(part.name())
                .bind(part.price())
                .bind(part.id().as_i64())
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

/// Deletes an existing part by id, detaching it from any tickets first.
pub(crate) async fn delete_part(ex: &mut Executor, id: PartId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM ticket_parts WHERE part_id = $1";
            sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(&mut *ex)
                .await
                .map_err(postgres::map_sqlx_error)?;

            let query_str = "DELETE FROM parts WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM ticket_parts WHERE part_id = ?";
            sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(&mut *ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;

            let query_str = "DELETE FROM parts WHERE id = ?";
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

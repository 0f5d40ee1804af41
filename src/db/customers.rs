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

//! Database operations for customers.

#[cfg(feature = "postgres")]
use crate::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use crate::db::sqlite;
use crate::db::{DbError, DbResult, Executor};
use crate::model::{Customer, CustomerId, EmailAddress, HashedPassword, Pagination};
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Customer {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(postgres::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(postgres::map_sqlx_error)?;
        let password: String = row.try_get("password").map_err(postgres::map_sqlx_error)?;

        Ok(Customer::new(
            CustomerId::new(id),
            name,
            EmailAddress::new(email)?,
            phone,
            HashedPassword::new(password),
        ))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Customer {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(sqlite::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(sqlite::map_sqlx_error)?;
        let password: String = row.try_get("password").map_err(sqlite::map_sqlx_error)?;

        Ok(Customer::new(
            CustomerId::new(id),
            name,
            EmailAddress::new(email)?,
            phone,
            HashedPassword::new(password),
        ))
    }
}

/// Creates a new customer with the given details and returns it with its assigned id.
pub(crate) async fn create_customer(
    ex: &mut Executor,
    name: String,
    email: EmailAddress,
    phone: String,
    password: HashedPassword,
) -> DbResult<Customer> {
    let id = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO customers (name, email, phone, password)
                VALUES ($1, $2, $3, $4)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(&name)
                .bind(email.as_str())
                .bind(&phone)
                .bind(password.as_str())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get::<i64, _>("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO customers (name, email, phone, password)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(&name)
                .bind(email.as_str())
                .bind(&phone)
                .bind(password.as_str())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.last_insert_rowid()
        }
    };

    Ok(Customer::new(CustomerId::new(id), name, email, phone, password))
}

/// Gets information about an existing customer by id.
pub(crate) async fn get_customer(ex: &mut Executor, id: CustomerId) -> DbResult<Customer> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM customers WHERE id = $1";
            let raw_customer = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Customer::try_from(raw_customer)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM customers WHERE id = ?";
            let raw_customer = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Customer::try_from(raw_customer)
        }
    }
}

/// Gets the customer that owns `email`, or `None` if the address is unused.
pub(crate) async fn get_customer_by_email(
    ex: &mut Executor,
    email: &EmailAddress,
) -> DbResult<Option<Customer>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM customers WHERE email = $1";
            let raw_customer = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_optional(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            raw_customer.map(Customer::try_from).transpose()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM customers WHERE email = ?";
            let raw_customer = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_optional(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            raw_customer.map(Customer::try_from).transpose()
        }
    }
}

/// Lists all customers, or the window selected by `pagination` when present.
pub(crate) async fn list_customers(
    ex: &mut Executor,
    pagination: Option<Pagination>,
) -> DbResult<Vec<Customer>> {
    let raw_customers = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            // A null limit means "no limit" to PostgreSQL, which keeps the unpaged and the
            // paged cases on a single query.
            let query_str = "SELECT * FROM customers ORDER BY id LIMIT $1 OFFSET $2";
            let rows = sqlx::query(query_str)
                .bind(pagination.map(|p| p.limit()))
                .bind(pagination.map(|p| p.offset()).unwrap_or(0))
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Customer::try_from).collect::<DbResult<Vec<Customer>>>()?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            // A negative limit means "no limit" to SQLite, which keeps the unpaged and the
            // paged cases on a single query.
            let query_str = "SELECT * FROM customers ORDER BY id LIMIT ? OFFSET ?";
            let rows = sqlx::query(query_str)
                .bind(pagination.map(|p| p.limit()).unwrap_or(-1))
                .bind(pagination.map(|p| p.offset()).unwrap_or(0))
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Customer::try_from).collect::<DbResult<Vec<Customer>>>()?
        }
    };
    Ok(raw_customers)
}

/// Updates an existing customer with the contents of the full `customer` entity.
pub(crate) async fn update_customer(ex: &mut Executor, customer: &Customer) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE customers SET name = $1, email = $2, phone = $3
                WHERE id = $4";
            let done = sqlx::query(query_str)
                .bind(customer.name())
                .bind(customer.email().as_str())
                .bind(customer.phone())
                .bind(customer.id().as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE customers SET name = ?, email = ?, phone = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(customer.name())
                .bind(customer.email().as_str())
                .bind(customer.phone())
                .bind(customer.id().as_i64())
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

/// Deletes an existing customer by id.
pub(crate) async fn delete_customer(ex: &mut Executor, id: CustomerId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM customers WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM customers WHERE id = ?";
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

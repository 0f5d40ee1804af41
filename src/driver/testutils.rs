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

//! Test utilities for the business layer.

use crate::clocks::testutils::SettableClock;
use crate::db::{customers, mechanics, parts, tickets, Db, DbResult};
use crate::driver::Driver;
use crate::model::{
    Customer, CustomerId, EmailAddress, Mechanic, MechanicId, Part, PartId, Password, ServiceDate,
    ServiceTicket, TicketId, Vin,
};
use crate::tokens::{TokenManager, TokenOptions};
use std::sync::Arc;
use std::time::Duration;
use time::macros::datetime;

/// Signing secret used by all driver and REST tests.
pub(crate) const TEST_TOKEN_SECRET: &str = "insecure test secret";

/// State of a fully-assembled driver against an in-memory database.
///
/// The helpers below talk to the database directly, acquiring a fresh executor
/// for every call: the pool holds a single connection, so keeping one alive
/// across a driver operation would deadlock.
pub(crate) struct TestContext {
    /// The database the driver is backed by.
    pub(crate) db: Arc<dyn Db + Send + Sync>,

    /// The clock the token manager is backed by.
    pub(crate) clock: Arc<SettableClock>,

    /// The token manager wired into the driver.
    pub(crate) tokens: Arc<TokenManager>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes an in-memory database and all driver dependencies.
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::from(crate::db::sqlite::testutils::setup().await);
        let clock = Arc::from(SettableClock::new(datetime!(2025-06-05 12:00:00 UTC)));
        let opts = TokenOptions {
            secret: TEST_TOKEN_SECRET.to_owned(),
            ttl: Duration::from_secs(60 * 60),
        };
        let tokens = Arc::from(TokenManager::new(opts, clock.clone()));
        let driver = Driver::new(db.clone(), tokens.clone());
        Self { db, clock, tokens, driver }
    }

    /// Returns a driver instance ready for a one-shot operation.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Creates a customer directly in the database with a hash of `password`.
    pub(crate) async fn insert_customer(&self, email: &str, password: &str) -> CustomerId {
        let hash = Password::new(password).unwrap().hash().unwrap();
        let mut ex = self.db.ex().await.unwrap();
        *customers::create_customer(
            &mut ex,
            "Some Customer".to_owned(),
            EmailAddress::from(email),
            "555-0100".to_owned(),
            hash,
        )
        .await
        .unwrap()
        .id()
    }

    /// Creates a mechanic directly in the database.
    pub(crate) async fn insert_mechanic(&self, email: &str) -> MechanicId {
        let mut ex = self.db.ex().await.unwrap();
        *mechanics::create_mechanic(
            &mut ex,
            "Some Mechanic".to_owned(),
            EmailAddress::from(email),
            "555-0200".to_owned(),
            50000.0,
        )
        .await
        .unwrap()
        .id()
    }

    /// Creates a part directly in the database.
    pub(crate) async fn insert_part(&self, name: &str, price: f64) -> PartId {
        let mut ex = self.db.ex().await.unwrap();
        *parts::create_part(&mut ex, name.to_owned(), price).await.unwrap().id()
    }

    /// Creates a ticket directly in the database with the given mechanic set.
    pub(crate) async fn insert_ticket(
        &self,
        customer_id: CustomerId,
        mechanic_ids: &[MechanicId],
    ) -> TicketId {
        let mut ex = self.db.ex().await.unwrap();
        let ticket_id = tickets::create_ticket(
            &mut ex,
            &Vin::from("1HGCM82633A004352"),
            ServiceDate::from("2025-07-14"),
            "Scheduled maintenance",
            customer_id,
        )
        .await
        .unwrap();
        for mechanic_id in mechanic_ids {
            tickets::add_ticket_mechanic(&mut ex, ticket_id, *mechanic_id).await.unwrap();
        }
        ticket_id
    }

    /// Fetches a customer directly from the database.
    pub(crate) async fn get_customer(&self, id: CustomerId) -> DbResult<Customer> {
        let mut ex = self.db.ex().await.unwrap();
        customers::get_customer(&mut ex, id).await
    }

    /// Fetches a mechanic directly from the database.
    pub(crate) async fn get_mechanic(&self, id: MechanicId) -> DbResult<Mechanic> {
        let mut ex = self.db.ex().await.unwrap();
        mechanics::get_mechanic(&mut ex, id).await
    }

    /// Fetches a part directly from the database.
    pub(crate) async fn get_part(&self, id: PartId) -> DbResult<Part> {
        let mut ex = self.db.ex().await.unwrap();
        parts::get_part(&mut ex, id).await
    }

    /// Fetches a ticket directly from the database.
    pub(crate) async fn get_ticket(&self, id: TicketId) -> DbResult<ServiceTicket> {
        let mut ex = self.db.ex().await.unwrap();
        tickets::get_ticket(&mut ex, id).await
    }

    /// Counts the customers currently in the database.
    pub(crate) async fn count_customers(&self) -> usize {
        let mut ex = self.db.ex().await.unwrap();
        customers::list_customers(&mut ex, None).await.unwrap().len()
    }

    /// Counts the tickets currently in the database.
    pub(crate) async fn count_tickets(&self) -> usize {
        let mut ex = self.db.ex().await.unwrap();
        tickets::list_tickets(&mut ex).await.unwrap().len()
    }
}

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

//! Operations on customers.

use crate::db::{customers, tickets};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{
    Customer, CustomerId, CustomerPatch, EmailAddress, Pagination, Password, ServiceTicket,
};

impl Driver {
    /// Creates a new customer, rejecting duplicate email addresses before touching the row.
    ///
    /// The uniqueness constraint in the store backs this check up: a concurrent insert that
    /// slips between the lookup and the write still surfaces as a conflict, not as a partial
    /// write.
    pub(crate) async fn create_customer(
        self,
        name: String,
        email: EmailAddress,
        phone: String,
        password: Password,
    ) -> DriverResult<Customer> {
        let mut tx = self.db.begin().await?;

        if customers::get_customer_by_email(tx.ex(), &email).await?.is_some() {
            return Err(DriverError::AlreadyExists("Email already exists".to_owned()));
        }

        let password = password.hash()?;
        let customer = customers::create_customer(tx.ex(), name, email, phone, password).await?;

        tx.commit().await?;
        Ok(customer)
    }

    /// Gets an existing customer by id.
    pub(crate) async fn get_customer(self, id: CustomerId) -> DriverResult<Customer> {
        let customer = customers::get_customer(&mut self.db.ex().await?, id).await?;
        Ok(customer)
    }

    /// Lists all customers, or the window selected by `pagination` when present.
    pub(crate) async fn list_customers(
        self,
        pagination: Option<Pagination>,
    ) -> DriverResult<Vec<Customer>> {
        let customers = customers::list_customers(&mut self.db.ex().await?, pagination).await?;
        Ok(customers)
    }

    /// Applies `patch` to an existing customer, re-checking email uniqueness when the patch
    /// changes the address.
    pub(crate) async fn update_customer(
        self,
        id: CustomerId,
        patch: CustomerPatch,
    ) -> DriverResult<Customer> {
        let mut tx = self.db.begin().await?;

        let customer = customers::get_customer(tx.ex(), id).await?;

        if let Some(email) = patch.email.as_ref() {
            if email != customer.email()
                && customers::get_customer_by_email(tx.ex(), email).await?.is_some()
            {
                return Err(DriverError::AlreadyExists("Email already exists".to_owned()));
            }
        }

        let customer = patch.apply(customer);
        customers::update_customer(tx.ex(), &customer).await?;

        tx.commit().await?;
        Ok(customer)
    }

    /// Deletes an existing customer by id.
    ///
    /// Tickets are historical records with a mandatory owner, so a customer that still has
    /// tickets cannot be removed.
    pub(crate) async fn delete_customer(self, id: CustomerId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;

        let customer = customers::get_customer(tx.ex(), id).await?;
        let tickets = tickets::count_tickets_by_customer(tx.ex(), *customer.id()).await?;
        if tickets > 0 {
            return Err(DriverError::InvalidInput(format!(
                "Customer {} still has service tickets",
                id
            )));
        }
        customers::delete_customer(tx.ex(), id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Checks the given credentials and mints a bearer token for the customer they identify.
    ///
    /// The same error is returned whether the address is unknown or the password does not
    /// match, to avoid turning the login endpoint into an email oracle.
    pub(crate) async fn login(self, email: EmailAddress, password: Password) -> DriverResult<String> {
        let customer = match customers::get_customer_by_email(&mut self.db.ex().await?, &email)
            .await?
        {
            Some(customer) => customer,
            None => {
                return Err(DriverError::Unauthorized("Invalid email or password".to_owned()))
            }
        };

        if !password.verify(customer.password())? {
            return Err(DriverError::Unauthorized("Invalid email or password".to_owned()));
        }

        self.tokens
            .mint(*customer.id())
            .map_err(|e| DriverError::BackendError(e.to_string()))
    }

    /// Lists the tickets owned by `customer_id`.
    pub(crate) async fn customer_tickets(
        self,
        customer_id: CustomerId,
    ) -> DriverResult<Vec<ServiceTicket>> {
        let tickets =
            tickets::list_tickets_by_customer(&mut self.db.ex().await?, customer_id).await?;
        Ok(tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;

    #[tokio::test]
    async fn test_create_customer_ok() {
        let context = TestContext::setup().await;

        let customer = context
            .driver()
            .create_customer(
                "Jane Doe".to_owned(),
                EmailAddress::from("jane@example.com"),
                "555-0100".to_owned(),
                Password::from("letmein"),
            )
            .await
            .unwrap();

        let stored = context.get_customer(*customer.id()).await.unwrap();
        assert_eq!("Jane Doe", stored.name());
        assert_eq!("jane@example.com", stored.email().as_str());
        assert!(Password::from("letmein").verify(stored.password()).unwrap());
    }

    #[tokio::test]
    async fn test_create_customer_duplicate_email_writes_nothing() {
        let context = TestContext::setup().await;

        let _id = context.insert_customer("jane@example.com", "letmein").await;

        match context
            .driver()
            .create_customer(
                "Impostor".to_owned(),
                EmailAddress::from("jane@example.com"),
                "555-0199".to_owned(),
                Password::from("other"),
            )
            .await
        {
            Err(DriverError::AlreadyExists(msg)) => assert!(msg.contains("already exists")),
            e => panic!("{:?}", e),
        }

        assert_eq!(1, context.count_customers().await);
    }

    #[tokio::test]
    async fn test_update_customer_partial() {
        let context = TestContext::setup().await;

        let id = context.insert_customer("jane@example.com", "letmein").await;

        let patch = CustomerPatch { phone: Some("555-0123".to_owned()), ..Default::default() };
        context.driver().update_customer(id, patch).await.unwrap();

        let stored = context.get_customer(id).await.unwrap();
        assert_eq!("Some Customer", stored.name());
        assert_eq!("jane@example.com", stored.email().as_str());
        assert_eq!("555-0123", stored.phone());
    }

    #[tokio::test]
    async fn test_update_customer_email_conflict() {
        let context = TestContext::setup().await;

        let id = context.insert_customer("jane@example.com", "letmein").await;
        let _other = context.insert_customer("taken@example.com", "letmein").await;

        let patch = CustomerPatch {
            email: Some(EmailAddress::from("taken@example.com")),
            ..Default::default()
        };
        match context.driver().update_customer(id, patch).await {
            Err(DriverError::AlreadyExists(_)) => (),
            e => panic!("{:?}", e),
        }

        assert_eq!("jane@example.com", context.get_customer(id).await.unwrap().email().as_str());
    }

    #[tokio::test]
    async fn test_update_customer_same_email_is_not_a_conflict() {
        let context = TestContext::setup().await;

        let id = context.insert_customer("jane@example.com", "letmein").await;

        let patch = CustomerPatch {
            email: Some(EmailAddress::from("jane@example.com")),
            name: Some("Renamed".to_owned()),
            ..Default::default()
        };
        context.driver().update_customer(id, patch).await.unwrap();
        assert_eq!("Renamed", context.get_customer(id).await.unwrap().name());
    }

    #[tokio::test]
    async fn test_update_customer_missing() {
        let context = TestContext::setup().await;

        match context.driver().update_customer(CustomerId::new(123), Default::default()).await {
            Err(DriverError::NotFound(_)) => (),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_delete_customer_ok() {
        let context = TestContext::setup().await;

        let id = context.insert_customer("jane@example.com", "letmein").await;
        context.driver().delete_customer(id).await.unwrap();

        assert_eq!(0, context.count_customers().await);
    }

    #[tokio::test]
    async fn test_delete_customer_with_tickets() {
        let context = TestContext::setup().await;

        let id = context.insert_customer("jane@example.com", "letmein").await;
        let _ticket = context.insert_ticket(id, &[]).await;

        match context.driver().delete_customer(id).await {
            Err(DriverError::InvalidInput(msg)) => assert!(msg.contains("still has")),
            e => panic!("{:?}", e),
        }
        assert_eq!(1, context.count_customers().await);
    }

    #[tokio::test]
    async fn test_delete_customer_missing() {
        let context = TestContext::setup().await;

        match context.driver().delete_customer(CustomerId::new(123)).await {
            Err(DriverError::NotFound(_)) => (),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_login_ok_and_token_round_trip() {
        let context = TestContext::setup().await;

        let id = context.insert_customer("jane@example.com", "letmein").await;

        let token = context
            .driver()
            .login(EmailAddress::from("jane@example.com"), Password::from("letmein"))
            .await
            .unwrap();
        assert_eq!(id, context.tokens.validate(&token).unwrap());
    }

    #[tokio::test]
    async fn test_login_bad_credentials() {
        let context = TestContext::setup().await;

        let _id = context.insert_customer("jane@example.com", "letmein").await;

        for (email, password) in
            [("unknown@example.com", "letmein"), ("jane@example.com", "wrong")]
        {
            match context
                .driver()
                .login(EmailAddress::from(email), Password::from(password))
                .await
            {
                Err(DriverError::Unauthorized(msg)) => {
                    assert_eq!("Invalid email or password", msg)
                }
                e => panic!("{:?}", e),
            }
        }
    }

    #[tokio::test]
    async fn test_customer_tickets_only_own() {
        let context = TestContext::setup().await;

        let owner = context.insert_customer("owner@example.com", "letmein").await;
        let other = context.insert_customer("other@example.com", "letmein").await;
        let ticket1 = context.insert_ticket(owner, &[]).await;
        let _ticket2 = context.insert_ticket(other, &[]).await;

        let tickets = context.driver().customer_tickets(owner).await.unwrap();
        assert_eq!(1, tickets.len());
        assert_eq!(ticket1, *tickets[0].id());
    }
}

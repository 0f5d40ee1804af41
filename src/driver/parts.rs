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

//! Operations on inventory parts.

use crate::db::parts;
use crate::driver::{Driver, DriverResult};
use crate::model::{Pagination, Part, PartId, PartPatch};

impl Driver {
    /// Creates a new part.
    pub(crate) async fn create_part(self, name: String, price: f64) -> DriverResult<Part> {
        let part = parts::create_part(&mut self.db.ex().await?, name, price).await?;
        Ok(part)
    }

    /// Gets an existing part by id.
    pub(crate) async fn get_part(self, id: PartId) -> DriverResult<Part> {
        let part = parts::get_part(&mut self.db.ex().await?, id).await?;
        Ok(part)
    }

    /// Lists all parts, or the window selected by `pagination` when present.
    pub(crate) async fn list_parts(
        self,
        pagination: Option<Pagination>,
    ) -> DriverResult<Vec<Part>> {
        let parts = parts::list_parts(&mut self.db.ex().await?, pagination).await?;
        Ok(parts)
    }

    /// Applies `patch` to an existing part.
    pub(crate) async fn update_part(self, id: PartId, patch: PartPatch) -> DriverResult<Part> {
        let mut tx = self.db.begin().await?;

        let part = parts::get_part(tx.ex(), id).await?;
        let part = patch.apply(part);
        parts::update_part(tx.ex(), &part).await?;

        tx.commit().await?;
        Ok(part)
    }

    /// Deletes an existing part by id, detaching it from any tickets it was attached to.
    pub(crate) async fn delete_part(self, id: PartId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        parts::delete_part(tx.ex(), id).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use crate::driver::DriverError;

    #[tokio::test]
    async fn test_create_and_get_part() {
        let context = TestContext::setup().await;

        let part = context.driver().create_part("Brake pad".to_owned(), 39.99).await.unwrap();

        let stored = context.get_part(*part.id()).await.unwrap();
        assert_eq!("Brake pad", stored.name());
        assert_eq!(39.99, *stored.price());
    }

    #[tokio::test]
    async fn test_update_part_partial() {
        let context = TestContext::setup().await;

        let id = context.insert_part("Brake pad", 39.99).await;

        let patch = PartPatch { price: Some(44.99), ..Default::default() };
        context.driver().update_part(id, patch).await.unwrap();

        let stored = context.get_part(id).await.unwrap();
        assert_eq!("Brake pad", stored.name());
        assert_eq!(44.99, *stored.price());
    }

    #[tokio::test]
    async fn test_delete_part_detaches_from_tickets() {
        let context = TestContext::setup().await;

        let customer_id = context.insert_customer("jane@example.com", "letmein").await;
        let ticket_id = context.insert_ticket(customer_id, &[]).await;
        let part_id = context.insert_part("Brake pad", 39.99).await;
        context.driver().add_part(ticket_id, part_id).await.unwrap();

        context.driver().delete_part(part_id).await.unwrap();

        assert!(context.get_part(part_id).await.is_err());
        assert!(context.get_ticket(ticket_id).await.unwrap().part_ids().is_empty());
    }

    #[tokio::test]
    async fn test_get_part_missing() {
        let context = TestContext::setup().await;

        match context.driver().get_part(PartId::new(123)).await {
            Err(DriverError::NotFound(_)) => (),
            e => panic!("{:?}", e),
        }
    }
}

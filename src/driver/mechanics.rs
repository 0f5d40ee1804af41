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

//! Operations on mechanics.

use crate::db::mechanics;
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{EmailAddress, Mechanic, MechanicId, MechanicPatch, Pagination};

impl Driver {
    /// Creates a new mechanic, rejecting duplicate email addresses before touching the row.
    pub(crate) async fn create_mechanic(
        self,
        name: String,
        email: EmailAddress,
        phone: String,
        salary: f64,
    ) -> DriverResult<Mechanic> {
        let mut tx = self.db.begin().await?;

        if mechanics::get_mechanic_by_email(tx.ex(), &email).await?.is_some() {
            return Err(DriverError::AlreadyExists("Email already exists".to_owned()));
        }

        let mechanic = mechanics::create_mechanic(tx.ex(), name, email, phone, salary).await?;

        tx.commit().await?;
        Ok(mechanic)
    }

    /// Gets an existing mechanic by id.
    pub(crate) async fn get_mechanic(self, id: MechanicId) -> DriverResult<Mechanic> {
        let mechanic = mechanics::get_mechanic(&mut self.db.ex().await?, id).await?;
        Ok(mechanic)
    }

    /// Lists all mechanics, or the window selected by `pagination` when present.
    pub(crate) async fn list_mechanics(
        self,
        pagination: Option<Pagination>,
    ) -> DriverResult<Vec<Mechanic>> {
        let mechanics = mechanics::list_mechanics(&mut self.db.ex().await?, pagination).await?;
        Ok(mechanics)
    }

    /// Applies `patch` to an existing mechanic, re-checking email uniqueness when the patch
    /// changes the address.
    pub(crate) async fn update_mechanic(
        self,
        id: MechanicId,
        patch: MechanicPatch,
    ) -> DriverResult<Mechanic> {
        let mut tx = self.db.begin().await?;

        let mechanic = mechanics::get_mechanic(tx.ex(), id).await?;

        if let Some(email) = patch.email.as_ref() {
            if email != mechanic.email()
                && mechanics::get_mechanic_by_email(tx.ex(), email).await?.is_some()
            {
                return Err(DriverError::AlreadyExists("Email already exists".to_owned()));
            }
        }

        let mechanic = patch.apply(mechanic);
        mechanics::update_mechanic(tx.ex(), &mechanic).await?;

        tx.commit().await?;
        Ok(mechanic)
    }

    /// Deletes an existing mechanic by id, detaching it from any tickets it was assigned to.
    pub(crate) async fn delete_mechanic(self, id: MechanicId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        mechanics::delete_mechanic(tx.ex(), id).await?;
        tx.commit().await?;
        Ok(())
    }
}

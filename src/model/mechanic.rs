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

//! The `Mechanic` entity.

use crate::model::{EmailAddress, MechanicId};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A mechanic on staff, assignable to any number of service tickets.
#[derive(Getters, Serialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct Mechanic {
    /// Surrogate key of the mechanic.
    id: MechanicId,

    /// Free-form name of the mechanic.
    name: String,

    /// Email address of the mechanic, unique across the whole shop.
    email: EmailAddress,

    /// Contact phone number.
    phone: String,

    /// Yearly salary.
    salary: f64,
}

impl Mechanic {
    /// Creates a new mechanic from its parts.
    pub(crate) fn new(
        id: MechanicId,
        name: String,
        email: EmailAddress,
        phone: String,
        salary: f64,
    ) -> Self {
        Self { id, name, email, phone, salary }
    }
}

/// Set of externally-mutable mechanic fields for a partial update.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug, Default))]
pub(crate) struct MechanicPatch {
    /// New name, if it has to change.
    pub(crate) name: Option<String>,

    /// New email address, if it has to change.
    pub(crate) email: Option<EmailAddress>,

    /// New phone number, if it has to change.
    pub(crate) phone: Option<String>,

    /// New salary, if it has to change.
    pub(crate) salary: Option<f64>,
}

impl MechanicPatch {
    /// Produces the updated entity that results from applying the patch to `mechanic`.
    pub(crate) fn apply(self, mechanic: Mechanic) -> Mechanic {
        Mechanic {
            id: mechanic.id,
            name: self.name.unwrap_or(mechanic.name),
            email: self.email.unwrap_or(mechanic.email),
            phone: self.phone.unwrap_or(mechanic.phone),
            salary: self.salary.unwrap_or(mechanic.salary),
        }
    }
}

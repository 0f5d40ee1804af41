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

//! High-level data types for the repair shop domain.
//!
//! There is no logic in this layer.  The newtype pattern is used for every
//! value that crosses the process boundary so that validation happens exactly
//! once, at construction time.

use serde::{Deserialize, Serialize};
use std::fmt;

mod customer;
mod email;
mod mechanic;
mod part;
mod passwords;
mod ticket;

pub(crate) use customer::{Customer, CustomerPatch};
pub(crate) use email::EmailAddress;
pub(crate) use mechanic::{Mechanic, MechanicPatch};
pub(crate) use part::{Part, PartPatch};
pub(crate) use passwords::{HashedPassword, Password};
pub(crate) use ticket::{ServiceDate, ServiceTicket, TicketPatch, Vin};

/// Errors that can occur when instantiating model types from untrusted data.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub(crate) struct ModelError(pub(crate) String);

/// Result type for this module.
pub(crate) type ModelResult<T> = Result<T, ModelError>;

/// Generates the newtype for a surrogate key backed by an `i64`.
macro_rules! numeric_id [
    ( $(#[$docs:meta])+ $name:ident ) => {
        $(#[$docs])+
        #[derive(
            Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
        )]
        #[serde(transparent)]
        pub(crate) struct $name(i64);

        impl $name {
            /// Creates a new identifier from the raw value used by the database.
            pub(crate) fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw value of the identifier for the database to consume.
            pub(crate) fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    }
];

numeric_id![
    /// Surrogate key of a customer.
    CustomerId
];

numeric_id![
    /// Surrogate key of a mechanic.
    MechanicId
];

numeric_id![
    /// Surrogate key of an inventory part.
    PartId
];

numeric_id![
    /// Surrogate key of a service ticket.
    TicketId
];

/// A window over a listing, expressed in the 1-based `page`/`per_page` terms
/// that the query string uses.
#[derive(Clone, Copy)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct Pagination {
    /// 1-based index of the page to return.
    page: u32,

    /// Number of entries in every page.
    per_page: u32,
}

impl Pagination {
    /// Creates a new pagination window, validating that both quantities are positive.
    pub(crate) fn new(page: u32, per_page: u32) -> ModelResult<Self> {
        if page == 0 || per_page == 0 {
            return Err(ModelError("Pagination parameters must be positive".to_owned()));
        }
        Ok(Self { page, per_page })
    }

    /// Returns the maximum number of rows in the window.
    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// Returns the number of rows that precede the window.
    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

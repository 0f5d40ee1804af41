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

//! The `ServiceTicket` entity and its value types.

use crate::model::{CustomerId, MechanicId, ModelError, ModelResult, PartId, TicketId};
use derive_getters::Getters;
use serde::de::Visitor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use time::macros::format_description;
use time::Date;

/// Maximum length of a vehicle identification number.
const MAX_VIN_LENGTH: usize = 17;

/// A vehicle identification number as provided by the customer.
///
/// Real VINs are exactly 17 characters but the shop also deals with older and
/// imported vehicles, so only the upper bound is enforced.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub(crate) struct Vin(String);

impl Vin {
    /// Creates a new VIN from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(ModelError("VIN cannot be empty".to_owned()));
        }
        if s.len() > MAX_VIN_LENGTH {
            return Err(ModelError("VIN cannot be longer than 17 characters".to_owned()));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the VIN.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
impl From<&str> for Vin {
    fn from(raw_vin: &str) -> Self {
        Self::new(raw_vin).expect("Hardcoded VINs for testing must be valid")
    }
}

/// Visitor to deserialize a `Vin` from a string.
struct VinVisitor;

impl Visitor<'_> for VinVisitor {
    type Value = Vin;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a vehicle identification number")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match Vin::new(v) {
            Ok(vin) => Ok(vin),
            Err(e) => Err(E::custom(format!("{}", e))),
        }
    }
}

impl<'de> Deserialize<'de> for Vin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_string(VinVisitor)
    }
}

/// The calendar date on which a ticket's service takes place.
///
/// The wire and SQLite representation is an ISO `YYYY-MM-DD` string; the
/// PostgreSQL representation is a native `DATE`.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub(crate) struct ServiceDate(Date);

impl ServiceDate {
    /// Creates a new service date by parsing the ISO calendar date in `s`.
    pub(crate) fn new(s: &str) -> ModelResult<Self> {
        match Date::parse(s, format_description!("[year]-[month]-[day]")) {
            Ok(date) => Ok(Self(date)),
            Err(e) => Err(ModelError(format!("Invalid service date '{}': {}", s, e))),
        }
    }

    /// Creates a new service date from an already-parsed `date`.
    pub(crate) fn from_date(date: Date) -> Self {
        Self(date)
    }

    /// Returns the date for the database to consume.
    #[cfg(feature = "postgres")]
    pub(crate) fn as_date(&self) -> Date {
        self.0
    }
}

impl fmt::Display for ServiceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .0
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|_| fmt::Error)?;
        f.write_str(&formatted)
    }
}

impl Serialize for ServiceDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Visitor to deserialize a `ServiceDate` from a string.
struct ServiceDateVisitor;

impl Visitor<'_> for ServiceDateVisitor {
    type Value = ServiceDate;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a date in YYYY-MM-DD format")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match ServiceDate::new(v) {
            Ok(date) => Ok(date),
            Err(e) => Err(E::custom(format!("{}", e))),
        }
    }
}

impl<'de> Deserialize<'de> for ServiceDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_string(ServiceDateVisitor)
    }
}

#[cfg(test)]
impl From<&str> for ServiceDate {
    fn from(raw_date: &str) -> Self {
        Self::new(raw_date).expect("Hardcoded dates for testing must be valid")
    }
}

/// A repair job: one customer, one or more mechanics, zero or more parts.
///
/// Tickets are append-mostly historical records and thus have no delete
/// operation anywhere in the system.
#[derive(Getters, Serialize)]
#[cfg_attr(test, derive(Clone, Debug, PartialEq))]
pub(crate) struct ServiceTicket {
    /// Surrogate key of the ticket.
    id: TicketId,

    /// Identification number of the vehicle being serviced.
    #[serde(rename = "VIN")]
    vin: Vin,

    /// Date on which the service takes place.
    service_date: ServiceDate,

    /// Description of the work to perform.
    service_desc: String,

    /// Owning customer.
    customer_id: CustomerId,

    /// Mechanics assigned to the ticket.  Never empty after creation.
    mechanic_ids: BTreeSet<MechanicId>,

    /// Inventory parts attached to the ticket.
    part_ids: BTreeSet<PartId>,
}

impl ServiceTicket {
    /// Creates a new ticket from its parts.
    pub(crate) fn new(
        id: TicketId,
        vin: Vin,
        service_date: ServiceDate,
        service_desc: String,
        customer_id: CustomerId,
        mechanic_ids: BTreeSet<MechanicId>,
        part_ids: BTreeSet<PartId>,
    ) -> Self {
        Self { id, vin, service_date, service_desc, customer_id, mechanic_ids, part_ids }
    }
}

/// Set of externally-mutable ticket fields for a partial update.
///
/// Every present field is validated independently with the same rules used at
/// creation time, and absent fields are left untouched.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug, Default))]
pub(crate) struct TicketPatch {
    /// New vehicle identification number, if it has to change.
    #[serde(rename = "VIN")]
    pub(crate) vin: Option<Vin>,

    /// New service date, if it has to change.
    pub(crate) service_date: Option<ServiceDate>,

    /// New service description, if it has to change.
    pub(crate) service_desc: Option<String>,

    /// New owning customer, if it has to change.
    pub(crate) customer_id: Option<CustomerId>,

    /// Replacement set of assigned mechanics, if it has to change.
    pub(crate) mechanic_ids: Option<Vec<MechanicId>>,
}

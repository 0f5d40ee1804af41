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

//! The `Customer` entity.

use crate::model::{CustomerId, EmailAddress, HashedPassword};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A customer of the shop, owner of zero or more service tickets.
///
/// The password hash never leaves the process: it is skipped during
/// serialization so that no handler can accidentally echo it back.
#[derive(Getters, Serialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct Customer {
    /// Surrogate key of the customer.
    id: CustomerId,

    /// Free-form name of the customer.
    name: String,

    /// Email address of the customer, unique across the whole shop.
    email: EmailAddress,

    /// Contact phone number.
    phone: String,

    /// Hash of the customer's login password.
    #[serde(skip)]
    password: HashedPassword,
}

impl Customer {
    /// Creates a new customer from its parts.
    pub(crate) fn new(
        id: CustomerId,
        name: String,
        email: EmailAddress,
        phone: String,
        password: HashedPassword,
    ) -> Self {
        Self { id, name, email, phone, password }
    }
}

/// Set of externally-mutable customer fields for a partial update.
///
/// The password is deliberately absent: there is no password-change operation
/// in the API surface.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug, Default))]
pub(crate) struct CustomerPatch {
    /// New name, if it has to change.
    pub(crate) name: Option<String>,

    /// New email address, if it has to change.
    pub(crate) email: Option<EmailAddress>,

    /// New phone number, if it has to change.
    pub(crate) phone: Option<String>,
}

impl CustomerPatch {
    /// Produces the updated entity that results from applying the patch to `customer`.
    pub(crate) fn apply(self, customer: Customer) -> Customer {
        Customer {
            id: customer.id,
            name: self.name.unwrap_or(customer.name),
            email: self.email.unwrap_or(customer.email),
            phone: self.phone.unwrap_or(customer.phone),
            password: customer.password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates a customer with hardcoded values for testing purposes.
    fn sample_customer() -> Customer {
        Customer::new(
            CustomerId::new(8),
            "Jane Doe".to_owned(),
            EmailAddress::from("jane@example.com"),
            "555-0100".to_owned(),
            HashedPassword::new("fake hash"),
        )
    }

    #[test]
    fn test_customer_serialize_omits_password() {
        let json = serde_json::to_value(sample_customer()).unwrap();
        assert_eq!(
            serde_json::json!({
                "id": 8,
                "name": "Jane Doe",
                "email": "jane@example.com",
                "phone": "555-0100",
            }),
            json
        );
    }

    #[test]
    fn test_customer_patch_apply_partial() {
        let patch = CustomerPatch { phone: Some("555-0199".to_owned()), ..Default::default() };
        let customer = patch.apply(sample_customer());
        assert_eq!("Jane Doe", customer.name());
        assert_eq!("jane@example.com", customer.email().as_str());
        assert_eq!("555-0199", customer.phone());
    }

    #[test]
    fn test_customer_patch_ignores_unknown_fields() {
        let patch: CustomerPatch =
            serde_json::from_str(r#"{"name": "John", "shoe_size": 42}"#).unwrap();
        let customer = patch.apply(sample_customer());
        assert_eq!("John", customer.name());
    }
}

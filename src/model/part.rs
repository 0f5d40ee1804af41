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

//! The inventory `Part` entity.

use crate::model::PartId;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A part in the shop's inventory, attachable to any number of service tickets.
#[derive(Getters, Serialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct Part {
    /// Surrogate key of the part.
    id: PartId,

    /// Free-form name of the part.
    name: String,

    /// Unit price.
    price: f64,
}

impl Part {
    /// Creates a new part from its parts.
    pub(crate) fn new(id: PartId, name: String, price: f64) -> Self {
        Self { id, name, price }
    }
}

/// Set of externally-mutable part fields for a partial update.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug, Default))]
pub(crate) struct PartPatch {
    /// New name, if it has to change.
    pub(crate) name: Option<String>,

    /// New price, if it has to change.
    pub(crate) price: Option<f64>,
}

impl PartPatch {
    /// Produces the updated entity that results from applying the patch to `part`.
    pub(crate) fn apply(self, part: Part) -> Part {
        Part {
            id: part.id,
            name: self.name.unwrap_or(part.name),
            price: self.price.unwrap_or(part.price),
        }
    }
}

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

//! API to delete an inventory part.

use crate::driver::Driver;
use crate::model::PartId;
use crate::rest::{DeleteResponse, EmptyBody, RestError};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<PartId>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    driver.delete_part(id).await?;
    Ok(Json(DeleteResponse {
        message: format!("Part {} deleted", id),
        id: id.as_i64(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::rest::testutils::*;
    use crate::rest::DeleteResponse;

    fn route(id: i64) -> (http::Method, String) {
        (http::Method::DELETE, format!("/inventory/{}", id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let id = context.state.insert_part("Brake pad", 39.99).await;

        let response = OneShotBuilder::new(context.app(), route(id.as_i64()))
            .send_empty()
            .await
            .expect_json::<DeleteResponse>()
            .await;
        assert_eq!(
            DeleteResponse { message: format!("Part {} deleted", id), id: id.as_i64() },
            response
        );

        assert!(context.state.get_part(id).await.is_err());
    }

    #[tokio::test]
    async fn test_missing() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route(123))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("not found")
            .await;
    }
}

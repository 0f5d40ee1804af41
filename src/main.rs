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

//! Entry point to the repair shop service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use lugnut::db::Db;
use lugnut::env::get_optional_var;
use lugnut::rest::caching::CacheOptions;
use lugnut::tokens::TokenOptions;
use lugnut::{serve, ServeOptions};
use std::net::{Ipv4Addr, SocketAddr};

/// Default port to listen on when `LUGNUT_PORT` is not set.
const DEFAULT_PORT: u16 = 3000;

/// Connects to the database selected by the `LUGNUT_ENV` environment variable.
///
/// `development` and `testing` use local SQLite files so that the service can
/// be run without any additional infrastructure, and `production` connects to
/// the PostgreSQL instance described by the `PGSQL_PROD_*` variables.
async fn connect_db(environment: &str) -> Result<Box<dyn Db + Send + Sync>, String> {
    match environment {
        #[cfg(feature = "sqlite")]
        "development" => {
            let db = lugnut::db::sqlite::connect("lugnut-dev.db").await.map_err(|e| e.to_string())?;
            Ok(Box::from(db))
        }

        #[cfg(feature = "sqlite")]
        "testing" => {
            let db = lugnut::db::sqlite::connect("lugnut-test.db").await.map_err(|e| e.to_string())?;
            Ok(Box::from(db))
        }

        #[cfg(feature = "postgres")]
        "production" => {
            let opts = lugnut::db::postgres::PostgresOptions::from_env("PGSQL_PROD")?;
            let db = lugnut::db::postgres::connect(opts).await.map_err(|e| e.to_string())?;
            Ok(Box::from(db))
        }

        name => Err(format!("Unsupported environment {}", name)),
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let port = get_optional_var::<u16>("LUGNUT", "PORT").unwrap().unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));

    let environment = get_optional_var::<String>("LUGNUT", "ENV")
        .unwrap()
        .unwrap_or_else(|| "development".to_owned());
    let db = connect_db(&environment).await.unwrap();
    lugnut::db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();

    let opts = ServeOptions {
        tokens: TokenOptions::from_env("LUGNUT_TOKEN").unwrap(),
        cache: CacheOptions::from_env("LUGNUT_CACHE").unwrap(),
    };

    serve(addr, db, opts).await.unwrap()
}

// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Read-only exploration sessions against Iceberg REST catalogs.
//!
//! # Examples
//!
//! ## Explore A Catalog
//!
//! ```rust, no_run
//! use iceberg_scout::{CatalogSession, Result, SessionConfig, TableIdent};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Connect to a REST catalog.
//!     let session = CatalogSession::connect(
//!         SessionConfig::builder()
//!             .name("quickstart_catalog")
//!             .uri("http://localhost:8181/api/catalog")
//!             .warehouse("quickstart_catalog")
//!             .credential("root:s3cr3t")
//!             .scope("PRINCIPAL_ROLE:ALL")
//!             .build(),
//!     )
//!     .await?;
//!
//!     // Explore.
//!     for namespace in session.list_namespaces().await? {
//!         let tables = session.list_tables(&namespace).await?;
//!         println!("{namespace}: {} tables", tables.len());
//!     }
//!
//!     // Resolve a table through an ordered candidate fallback.
//!     let table = session
//!         .resolve_table(&[
//!             TableIdent::from_strs(["quickstart", "taxi_dataset"])?,
//!             TableIdent::from_strs(["default", "taxi_dataset"])?,
//!         ])
//!         .await?;
//!
//!     // Inspect schema and snapshot, then materialize a scan. Scanning
//!     // through a REST catalog needs a compute engine bound via
//!     // `SessionConfig::scanner`.
//!     let inspection = session.inspect_table(&table);
//!     println!("schema: {:?}", inspection.schema);
//!     let result = session.scan_to_table(&table).await?;
//!     println!("{} rows", result.row_count());
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]

mod error;
pub use error::{Error, ErrorKind, Result};

pub mod catalog;
pub use catalog::memory::MemoryCatalog;
pub use catalog::rest::{RestCatalog, RestCatalogConfig};
pub use catalog::{Catalog, NamespaceIdent, TableIdent};

pub mod scan;
pub use scan::{ScanResult, TableScanner};

pub mod session;
pub use session::{
    CatalogSession, EventListener, ResolveAttempt, SessionConfig, SessionEvent, TableInspection,
    TableResolutionError,
};

pub mod spec;

pub mod table;
pub use table::TableHandle;

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

//! Catalog exploration sessions.
//!
//! A [`CatalogSession`] connects to a catalog, explores its namespaces and
//! tables, resolves a table through an ordered candidate fallback, and
//! materializes a one-shot scan. Listing failures are recoverable by
//! convention: explore, report, move on. Connection failure and candidate
//! exhaustion are fatal.

use std::collections::HashMap;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use typed_builder::TypedBuilder;

use crate::catalog::rest::{RestCatalog, RestCatalogConfig};
use crate::catalog::{Catalog, NamespaceIdent, TableIdent};
use crate::scan::{ScanResult, TableScanner};
use crate::spec::{SnapshotRef, TableSchemaRef};
use crate::table::TableHandle;
use crate::{Error, ErrorKind, Result};

/// Configuration for [`CatalogSession::connect`].
///
/// Mirrors the property surface of an engine-side REST catalog
/// registration: name, type, uri, warehouse, credential, scope, plus
/// free-form pass-through props (e.g. `oauth2-server-uri`,
/// `default-namespace`, `token-refresh-enabled`).
///
/// `warehouse` and `credential` are optional here because unauthenticated
/// single-warehouse catalogs exist; Polaris-style deployments require both.
#[derive(TypedBuilder)]
pub struct SessionConfig {
    /// Catalog name, used for diagnostics only.
    #[builder(setter(into))]
    pub name: String,
    /// Catalog type. Only `"rest"` is recognized.
    #[builder(default = "rest".to_string(), setter(into))]
    pub catalog_type: String,
    /// Base URI of the catalog service.
    #[builder(setter(into))]
    pub uri: String,
    /// Warehouse identifier.
    #[builder(default, setter(strip_option(fallback = warehouse_opt), into))]
    pub warehouse: Option<String>,
    /// OAuth2 client credential (`"client_id:client_secret"` or bare
    /// secret), already resolved by the caller's secret provider.
    #[builder(default, setter(strip_option(fallback = credential_opt), into))]
    pub credential: Option<String>,
    /// OAuth2 scope.
    #[builder(default, setter(strip_option(fallback = scope_opt), into))]
    pub scope: Option<String>,
    /// Pass-through properties.
    #[builder(default)]
    pub props: HashMap<String, String>,
    /// Compute engine executing [`CatalogSession::scan_to_table`] for a
    /// REST catalog. Without one, scans fail with
    /// [`ErrorKind::FeatureUnsupported`].
    #[builder(default, setter(strip_option(fallback = scanner_opt)))]
    pub scanner: Option<Arc<dyn TableScanner>>,
}

impl Debug for SessionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("name", &self.name)
            .field("catalog_type", &self.catalog_type)
            .field("uri", &self.uri)
            .field("warehouse", &self.warehouse)
            .field("has_credential", &self.credential.is_some())
            .field("scope", &self.scope)
            .field("has_scanner", &self.scanner.is_some())
            .finish_non_exhaustive()
    }
}

/// A structured diagnostic event emitted by a session.
///
/// Replaces interleaved print diagnostics: the session reports what it did,
/// a listener (or the `log` facade) decides how to present it.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionEvent {
    /// The session connected to a catalog.
    Connected {
        /// Catalog name.
        catalog: String,
    },
    /// Namespaces were listed.
    NamespacesListed {
        /// How many namespaces the catalog reported.
        count: usize,
    },
    /// Tables under one namespace were listed.
    TablesListed {
        /// The namespace explored.
        namespace: NamespaceIdent,
        /// How many tables it holds.
        count: usize,
    },
    /// One resolution candidate was attempted.
    CandidateTried {
        /// The candidate identifier.
        table: TableIdent,
        /// Whether the catalog accepted it.
        succeeded: bool,
    },
    /// A table was resolved.
    TableResolved {
        /// The winning identifier.
        table: TableIdent,
    },
    /// A scan completed.
    ScanCompleted {
        /// The scanned table.
        table: TableIdent,
        /// Materialized row count.
        row_count: u64,
        /// Approximate memory footprint in bytes.
        approx_size_bytes: u64,
    },
}

impl Display for SessionEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Connected { catalog } => write!(f, "connected to catalog {catalog}"),
            SessionEvent::NamespacesListed { count } => write!(f, "listed {count} namespaces"),
            SessionEvent::TablesListed { namespace, count } => {
                write!(f, "listed {count} tables in {namespace}")
            }
            SessionEvent::CandidateTried { table, succeeded } => {
                if *succeeded {
                    write!(f, "candidate {table} resolved")
                } else {
                    write!(f, "candidate {table} failed")
                }
            }
            SessionEvent::TableResolved { table } => write!(f, "resolved table {table}"),
            SessionEvent::ScanCompleted {
                table,
                row_count,
                approx_size_bytes,
            } => write!(
                f,
                "scanned {table}: {row_count} rows, ~{approx_size_bytes} bytes"
            ),
        }
    }
}

/// Receives session events as they happen.
pub trait EventListener: Send + Sync {
    /// Called once per event, in operation order.
    fn on_event(&self, event: &SessionEvent);
}

/// One failed resolution attempt: which identifier, and why it failed.
#[derive(Debug)]
pub struct ResolveAttempt {
    table: TableIdent,
    cause: Error,
}

impl ResolveAttempt {
    /// The candidate identifier that was tried.
    pub fn table(&self) -> &TableIdent {
        &self.table
    }

    /// Why the catalog rejected it.
    pub fn cause(&self) -> &Error {
        &self.cause
    }
}

/// Every candidate identifier failed to resolve.
///
/// Carries the per-candidate causes in the order the candidates were tried,
/// so a caller can see exactly which identifiers were attempted and why
/// each failed. The dominant real-world cause is environment
/// misconfiguration: wrong namespace depth, wrong credential, wrong region.
#[derive(Debug)]
pub struct TableResolutionError {
    attempts: Vec<ResolveAttempt>,
}

impl TableResolutionError {
    /// The failed attempts, in candidate order.
    pub fn attempts(&self) -> &[ResolveAttempt] {
        &self.attempts
    }
}

impl Display for TableResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "table resolution exhausted {} candidate(s): ",
            self.attempts.len()
        )?;
        write!(
            f,
            "{}",
            self.attempts
                .iter()
                .map(|a| a.table.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for TableResolutionError {}

impl From<TableResolutionError> for Error {
    fn from(value: TableResolutionError) -> Self {
        let candidates = value
            .attempts
            .iter()
            .map(|a| a.table.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Error::new(
            ErrorKind::TableResolution,
            "All candidate table identifiers failed to resolve",
        )
        .with_context("candidates", candidates)
        .with_source(value)
    }
}

/// The result of inspecting a resolved table: its schema and, when the
/// table has ever been written, its current snapshot.
#[derive(Debug, Clone)]
pub struct TableInspection {
    /// The table's current schema.
    pub schema: TableSchemaRef,
    /// The current snapshot, `None` for a never-written table.
    pub current_snapshot: Option<SnapshotRef>,
}

/// A catalog exploration session.
///
/// Stateful only in holding the connection: `Unconnected → Connected →
/// (Exploring)* → (Resolved)? → (Scanned)?`. There is no close operation;
/// dropping the session ends it. All operations are read-only and issued
/// one at a time.
pub struct CatalogSession {
    name: String,
    catalog: Arc<dyn Catalog>,
    listener: Option<Arc<dyn EventListener>>,
}

impl Debug for CatalogSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogSession")
            .field("name", &self.name)
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl CatalogSession {
    /// Connect to a catalog described by `config`.
    ///
    /// A single attempt: any failure (network, auth, malformed config,
    /// unrecognized catalog type) is [`ErrorKind::Connection`] and fatal to
    /// session startup. No operation is possible before this succeeds.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let catalog: Arc<dyn Catalog> = match config.catalog_type.as_str() {
            "rest" => {
                let rest_config = RestCatalogConfig::builder()
                    .name(config.name.clone())
                    .uri(config.uri)
                    .warehouse_opt(config.warehouse)
                    .credential_opt(config.credential)
                    .scope_opt(config.scope)
                    .props(config.props)
                    .build();
                let mut catalog = RestCatalog::new(rest_config).await?;
                if let Some(scanner) = config.scanner {
                    catalog = catalog.with_scanner(scanner);
                }
                Arc::new(catalog)
            }
            other => {
                return Err(Error::new(
                    ErrorKind::Connection,
                    format!("Unsupported catalog type: {other}"),
                )
                .with_context("catalog", config.name))
            }
        };

        let session = Self::new(config.name, catalog);
        session.emit(SessionEvent::Connected {
            catalog: session.name.clone(),
        });
        Ok(session)
    }

    /// Wrap an already-constructed catalog in a session.
    pub fn new(name: impl Into<String>, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            name: name.into(),
            catalog,
            listener: None,
        }
    }

    /// Attach a listener receiving [`SessionEvent`]s. Events are always
    /// also emitted through the `log` facade.
    pub fn with_listener(mut self, listener: Arc<dyn EventListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// The session's catalog name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, event: SessionEvent) {
        log::info!("session {}: {event}", self.name);
        if let Some(listener) = &self.listener {
            listener.on_event(&event);
        }
    }

    /// List the catalog's namespaces, in catalog-defined order.
    ///
    /// An empty catalog yields an empty list. A failure here is
    /// [`ErrorKind::CatalogQuery`] and, by session convention, non-fatal:
    /// report it and keep exploring.
    pub async fn list_namespaces(&self) -> Result<Vec<NamespaceIdent>> {
        let namespaces = self.catalog.list_namespaces().await?;
        self.emit(SessionEvent::NamespacesListed {
            count: namespaces.len(),
        });
        Ok(namespaces)
    }

    /// List the tables under one namespace, in catalog-defined order.
    ///
    /// A missing namespace fails with [`ErrorKind::CatalogQuery`]; callers
    /// looping over candidate namespaces log the failure and continue with
    /// the next one. An existing-but-empty namespace yields an empty list.
    pub async fn list_tables(&self, namespace: &NamespaceIdent) -> Result<Vec<TableIdent>> {
        let tables = self.catalog.list_tables(namespace).await?;
        self.emit(SessionEvent::TablesListed {
            namespace: namespace.clone(),
            count: tables.len(),
        });
        Ok(tables)
    }

    /// Resolve a table by trying `candidates` in order.
    ///
    /// Catalog layouts vary across environments (namespace depth, naming
    /// conventions); an ordered candidate list expresses "try these
    /// identifiers, in this priority order" without per-environment
    /// branching. Each candidate gets exactly one `load_table` attempt; the
    /// first success wins and the remaining candidates are never tried.
    ///
    /// When every candidate fails — including the degenerate empty list —
    /// the returned [`TableResolutionError`] carries the per-candidate
    /// causes in input order.
    pub async fn resolve_table(
        &self,
        candidates: &[TableIdent],
    ) -> std::result::Result<TableHandle, TableResolutionError> {
        let mut attempts = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            match self.catalog.load_table(candidate).await {
                Ok(handle) => {
                    self.emit(SessionEvent::CandidateTried {
                        table: candidate.clone(),
                        succeeded: true,
                    });
                    self.emit(SessionEvent::TableResolved {
                        table: candidate.clone(),
                    });
                    return Ok(handle);
                }
                Err(cause) => {
                    self.emit(SessionEvent::CandidateTried {
                        table: candidate.clone(),
                        succeeded: false,
                    });
                    attempts.push(ResolveAttempt {
                        table: candidate.clone(),
                        cause,
                    });
                }
            }
        }

        Err(TableResolutionError { attempts })
    }

    /// Inspect a resolved table: schema and current snapshot.
    ///
    /// A pure read of handle-local state; never talks to the catalog and
    /// never fails.
    pub fn inspect_table(&self, handle: &TableHandle) -> TableInspection {
        TableInspection {
            schema: handle.schema().clone(),
            current_snapshot: handle.current_snapshot().cloned(),
        }
    }

    /// Materialize the table's current snapshot fully into memory.
    ///
    /// Blocking (in the await sense), single-shot, unfiltered: memory usage
    /// is bounded only by table size. Fails with [`ErrorKind::Scan`] (or
    /// [`ErrorKind::FeatureUnsupported`] when the catalog has no scan
    /// engine bound); never retried automatically.
    pub async fn scan_to_table(&self, handle: &TableHandle) -> Result<ScanResult> {
        let result = self.catalog.scan_table(handle).await?;
        self.emit(SessionEvent::ScanCompleted {
            table: handle.identifier().clone(),
            row_count: result.row_count(),
            approx_size_bytes: result.approx_size_bytes(),
        });
        Ok(result)
    }
}

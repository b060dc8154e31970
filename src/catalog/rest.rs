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

//! Read-only REST catalog implementation (Iceberg REST protocol, e.g.
//! Apache Polaris).

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Request, StatusCode};
use serde::de::DeserializeOwned;
use typed_builder::TypedBuilder;
use urlencoding::encode;

use self::_serde::{
    CatalogConfig, ErrorResponse, ListNamespaceResponse, ListTablesResponse, LoadTableResult,
    OAuthErrorResponse, TokenResponse,
};
use crate::catalog::{Catalog, NamespaceIdent, TableIdent};
use crate::scan::{ScanResult, TableScanner};
use crate::table::TableHandle;
use crate::{Error, ErrorKind, Result};

const ICEBERG_REST_SPEC_VERSION: &str = "0.14.1";
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
const PATH_V1: &str = "v1";

const OK: u16 = 200u16;

/// Property key for the OAuth2 token endpoint, overriding the default
/// `{uri}/v1/oauth/tokens`.
pub const PROP_OAUTH2_SERVER_URI: &str = "oauth2-server-uri";
/// Property key for the default namespace a compute engine starts in.
/// Pass-through: carried in the props map, not interpreted here.
pub const PROP_DEFAULT_NAMESPACE: &str = "default-namespace";
/// Property key engines use to enable background token refresh.
/// Pass-through: this client performs a single exchange at connect time.
pub const PROP_TOKEN_REFRESH_ENABLED: &str = "token-refresh-enabled";

/// Rest catalog configuration.
#[derive(TypedBuilder)]
pub struct RestCatalogConfig {
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into))]
    uri: String,
    #[builder(default, setter(strip_option(fallback = warehouse_opt), into))]
    warehouse: Option<String>,
    /// OAuth2 client credential, either `"client_id:client_secret"` or a
    /// bare secret. When absent, requests are sent unauthenticated.
    #[builder(default, setter(strip_option(fallback = credential_opt), into))]
    credential: Option<String>,
    /// OAuth2 scope for the token exchange, e.g. `PRINCIPAL_ROLE:ALL`.
    #[builder(default, setter(strip_option(fallback = scope_opt), into))]
    scope: Option<String>,
    /// Pass-through properties, merged with the server-reported config on
    /// connect (defaults < props < overrides).
    #[builder(default)]
    props: HashMap<String, String>,
}

impl RestCatalogConfig {
    /// Catalog name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URI of the catalog service.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Warehouse identifier sent with the config handshake.
    pub fn warehouse(&self) -> Option<&str> {
        self.warehouse.as_deref()
    }

    /// Merged properties. Before connect these are the caller's props only.
    pub fn props(&self) -> &HashMap<String, String> {
        &self.props
    }

    fn config_endpoint(&self) -> String {
        [&self.uri, PATH_V1, "config"].join("/")
    }

    fn namespaces_endpoint(&self) -> String {
        [&self.uri, PATH_V1, "namespaces"].join("/")
    }

    fn tables_endpoint(&self, ns: &NamespaceIdent) -> String {
        [
            &self.uri,
            PATH_V1,
            "namespaces",
            &ns.encode_in_url(),
            "tables",
        ]
        .join("/")
    }

    fn table_endpoint(&self, table: &TableIdent) -> String {
        [
            &self.uri,
            PATH_V1,
            "namespaces",
            &table.namespace.encode_in_url(),
            "tables",
            encode(&table.name).as_ref(),
        ]
        .join("/")
    }

    fn token_endpoint(&self) -> String {
        self.props
            .get(PROP_OAUTH2_SERVER_URI)
            .cloned()
            .unwrap_or_else(|| [&self.uri, PATH_V1, "oauth", "tokens"].join("/"))
    }

    /// Split the credential into `(client_id, client_secret)`.
    fn parsed_credential(&self) -> Option<(Option<&str>, &str)> {
        self.credential.as_deref().map(|cred| match cred.split_once(':') {
            Some((id, secret)) => (Some(id), secret),
            None => (None, cred),
        })
    }

    fn try_create_rest_client(&self, token: Option<&str>) -> Result<HttpClient> {
        let mut headers = HeaderMap::from_iter([
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ),
            (
                HeaderName::from_static("x-client-version"),
                HeaderValue::from_static(ICEBERG_REST_SPEC_VERSION),
            ),
            (
                header::USER_AGENT,
                HeaderValue::from_str(&format!("iceberg-scout/{CARGO_PKG_VERSION}")).map_err(
                    |e| {
                        Error::new(ErrorKind::Unexpected, "Invalid user agent header")
                            .with_source(e)
                    },
                )?,
            ),
        ]);

        if let Some(token) = token {
            let mut value: HeaderValue = format!("Bearer {token}").parse().map_err(
                |e: header::InvalidHeaderValue| {
                    Error::new(
                        ErrorKind::Connection,
                        "Invalid token received from catalog server!",
                    )
                    .with_source(e)
                },
            )?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        Ok(HttpClient(
            Client::builder().default_headers(headers).build()?,
        ))
    }
}

impl Debug for RestCatalogConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestCatalogConfig")
            .field("name", &self.name)
            .field("uri", &self.uri)
            .field("warehouse", &self.warehouse)
            .field("has_credential", &self.credential.is_some())
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

struct HttpClient(Client);

impl HttpClient {
    /// Execute a request expecting a JSON body, classifying failures under
    /// `kind`.
    async fn query<R: DeserializeOwned, const SUCCESS_CODE: u16>(
        &self,
        request: Request,
        kind: ErrorKind,
    ) -> Result<R> {
        log::debug!("Executing request: {request:?}");

        let resp = self
            .0
            .execute(request)
            .await
            .map_err(|e| Error::from(e).with_kind(kind))?;

        if resp.status().as_u16() == SUCCESS_CODE {
            let text = resp.bytes().await.map_err(|e| Error::from(e).with_kind(kind))?;
            Ok(serde_json::from_slice::<R>(&text).map_err(|e| {
                Error::new(
                    ErrorKind::Unexpected,
                    "Failed to parse response from rest catalog server!",
                )
                .with_context("json", String::from_utf8_lossy(&text))
                .with_source(e)
            })?)
        } else {
            let code = resp.status();
            let text = resp.bytes().await.map_err(|e| Error::from(e).with_kind(kind))?;
            let e = serde_json::from_slice::<ErrorResponse>(&text).map_err(|e| {
                Error::new(
                    ErrorKind::Unexpected,
                    "Failed to parse error response from rest catalog server!",
                )
                .with_context("code", code.to_string())
                .with_context("json", String::from_utf8_lossy(&text))
                .with_source(e)
            })?;
            Err(e.into_error(kind))
        }
    }
}

/// Rest catalog implementation.
///
/// Construction performs the connection handshake: a single OAuth2
/// client-credentials exchange when a credential is configured (no refresh;
/// a long session outliving the token must reconnect) followed by a
/// `GET /v1/config` fetch whose defaults and overrides are merged into the
/// client properties. Any failure there is fatal and not retried.
pub struct RestCatalog {
    config: RestCatalogConfig,
    client: HttpClient,
    scanner: Option<Arc<dyn TableScanner>>,
}

impl Debug for RestCatalog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestCatalog")
            .field("config", &self.config)
            .field("has_scanner", &self.scanner.is_some())
            .finish_non_exhaustive()
    }
}

impl RestCatalog {
    /// Creates a rest catalog from config, performing the connection
    /// handshake.
    ///
    /// Fails with [`ErrorKind::Connection`] if the service is unreachable,
    /// the credential is rejected, or the config handshake fails.
    pub async fn new(config: RestCatalogConfig) -> Result<Self> {
        let mut catalog = Self {
            client: config.try_create_rest_client(None)?,
            config,
            scanner: None,
        };

        let token = catalog.fetch_access_token().await?;
        if let Some(token) = &token {
            catalog.client = catalog.config.try_create_rest_client(Some(token))?;
        }

        catalog.update_config().await?;

        Ok(catalog)
    }

    /// Bind the compute engine that executes data scans for this catalog.
    pub fn with_scanner(mut self, scanner: Arc<dyn TableScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// The configuration this catalog was built with, props merged with the
    /// server-reported config.
    pub fn config(&self) -> &RestCatalogConfig {
        &self.config
    }

    /// Exchange the configured credential for a bearer token.
    ///
    /// Single attempt, single token. Returns `None` when no credential is
    /// configured.
    async fn fetch_access_token(&self) -> Result<Option<String>> {
        let Some((client_id, client_secret)) = self.config.parsed_credential() else {
            return Ok(None);
        };

        let mut params = HashMap::with_capacity(4);
        params.insert("grant_type", "client_credentials");
        if let Some(client_id) = client_id {
            params.insert("client_id", client_id);
        }
        params.insert("client_secret", client_secret);
        params.insert("scope", self.config.scope.as_deref().unwrap_or("catalog"));

        let token_endpoint = self.config.token_endpoint();
        let request = self
            .client
            .0
            .post(&token_endpoint)
            .form(&params)
            .build()
            .map_err(|e| Error::from(e).with_kind(ErrorKind::Connection))?;

        log::debug!("Requesting access token from {token_endpoint}");

        let resp = self
            .client
            .0
            .execute(request)
            .await
            .map_err(|e| Error::from(e).with_kind(ErrorKind::Connection))?;

        if resp.status() == StatusCode::OK {
            let text = resp
                .bytes()
                .await
                .map_err(|e| Error::from(e).with_kind(ErrorKind::Connection))?;
            let token_response: TokenResponse = serde_json::from_slice(&text).map_err(|e| {
                Error::new(
                    ErrorKind::Connection,
                    "Failed to parse token response from catalog server!",
                )
                .with_context("operation", "auth")
                .with_context("url", &token_endpoint)
                .with_context("json", String::from_utf8_lossy(&text))
                .with_source(e)
            })?;
            Ok(Some(token_response.access_token))
        } else {
            let code = resp.status();
            let text = resp
                .bytes()
                .await
                .map_err(|e| Error::from(e).with_kind(ErrorKind::Connection))?;
            let error_response =
                serde_json::from_slice::<OAuthErrorResponse>(&text).map_err(|e| {
                    Error::new(ErrorKind::Connection, "Received unexpected auth response")
                        .with_context("code", code.to_string())
                        .with_context("operation", "auth")
                        .with_context("url", &token_endpoint)
                        .with_context("json", String::from_utf8_lossy(&text))
                        .with_source(e)
                })?;
            Err(error_response.into_error())
        }
    }

    /// Fetch `/v1/config` and merge it into the client props.
    ///
    /// Merge order follows the protocol: server defaults, then client
    /// props, then server overrides.
    async fn update_config(&mut self) -> Result<()> {
        let mut request = self.client.0.get(self.config.config_endpoint());

        if let Some(warehouse_location) = &self.config.warehouse {
            request = request.query(&[("warehouse", warehouse_location)]);
        }

        let mut config = self
            .client
            .query::<CatalogConfig, OK>(
                request
                    .build()
                    .map_err(|e| Error::from(e).with_kind(ErrorKind::Connection))?,
                ErrorKind::Connection,
            )
            .await?;

        config.defaults.extend(self.config.props.clone());
        config.defaults.extend(config.overrides);

        self.config.props = config.defaults;

        Ok(())
    }
}

#[async_trait]
impl Catalog for RestCatalog {
    /// List namespaces from the catalog, in server order.
    async fn list_namespaces(&self) -> Result<Vec<NamespaceIdent>> {
        let request = self
            .client
            .0
            .get(self.config.namespaces_endpoint())
            .build()
            .map_err(|e| Error::from(e).with_kind(ErrorKind::CatalogQuery))?;

        let resp = self
            .client
            .query::<ListNamespaceResponse, OK>(request, ErrorKind::CatalogQuery)
            .await?;

        resp.namespaces
            .into_iter()
            .map(NamespaceIdent::from_vec)
            .collect::<Result<Vec<NamespaceIdent>>>()
    }

    /// List tables from a namespace, in server order.
    async fn list_tables(&self, namespace: &NamespaceIdent) -> Result<Vec<TableIdent>> {
        let request = self
            .client
            .0
            .get(self.config.tables_endpoint(namespace))
            .build()
            .map_err(|e| Error::from(e).with_kind(ErrorKind::CatalogQuery))?;

        let resp = self
            .client
            .query::<ListTablesResponse, OK>(request, ErrorKind::CatalogQuery)
            .await
            .map_err(|e| e.with_context("namespace", namespace.to_string()))?;

        Ok(resp.identifiers)
    }

    /// Load a table's metadata from the catalog.
    async fn load_table(&self, table: &TableIdent) -> Result<TableHandle> {
        let request = self
            .client
            .0
            .get(self.config.table_endpoint(table))
            .build()
            .map_err(|e| Error::from(e).with_kind(ErrorKind::CatalogQuery))?;

        let resp = self
            .client
            .query::<LoadTableResult, OK>(request, ErrorKind::CatalogQuery)
            .await
            .map_err(|e| e.with_context("table", table.to_string()))?;

        resp.into_handle(table.clone())
    }

    /// Delegate the scan to the bound engine.
    async fn scan_table(&self, table: &TableHandle) -> Result<ScanResult> {
        match &self.scanner {
            Some(scanner) => scanner.scan(table).await,
            None => Err(Error::new(
                ErrorKind::FeatureUnsupported,
                "No scan engine bound to this catalog; use RestCatalog::with_scanner",
            )
            .with_context("table", table.identifier().to_string())),
        }
    }
}

/// Requests and responses for rest api.
mod _serde {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};

    use crate::spec::{Snapshot, TableSchema};
    use crate::table::TableHandle;
    use crate::{Error, ErrorKind, Result, TableIdent};

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub(super) struct CatalogConfig {
        pub(super) overrides: HashMap<String, String>,
        pub(super) defaults: HashMap<String, String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub(super) struct ErrorResponse {
        error: ErrorModel,
    }

    impl ErrorResponse {
        pub(super) fn into_error(self, kind: ErrorKind) -> Error {
            self.error.into_error(kind)
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub(super) struct ErrorModel {
        pub(super) message: String,
        pub(super) r#type: String,
        pub(super) code: u16,
        pub(super) stack: Option<Vec<String>>,
    }

    impl ErrorModel {
        fn into_error(self, kind: ErrorKind) -> Error {
            let mut error = Error::new(kind, self.message)
                .with_context("type", self.r#type)
                .with_context("code", format!("{}", self.code));

            if let Some(stack) = self.stack {
                error = error.with_context("stack", stack.join("\n"));
            }

            error
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub(super) struct OAuthErrorResponse {
        pub(super) error: String,
        pub(super) error_description: Option<String>,
        pub(super) error_uri: Option<String>,
    }

    impl OAuthErrorResponse {
        pub(super) fn into_error(self) -> Error {
            let mut error = Error::new(
                ErrorKind::Connection,
                format!("OAuthError: {}", self.error),
            );

            if let Some(desc) = self.error_description {
                error = error.with_context("description", desc);
            }

            if let Some(uri) = self.error_uri {
                error = error.with_context("uri", uri);
            }

            error
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub(super) struct TokenResponse {
        pub(super) access_token: String,
        pub(super) token_type: String,
        pub(super) expires_in: Option<u64>,
        pub(super) issued_token_type: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub(super) struct ListNamespaceResponse {
        pub(super) namespaces: Vec<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub(super) struct ListTablesResponse {
        pub(super) identifiers: Vec<TableIdent>,
    }

    /// Result returned when a table is successfully loaded.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub(super) struct LoadTableResult {
        /// May be null if the table is staged as part of a transaction.
        pub(super) metadata_location: Option<String>,
        pub(super) metadata: TableMetadataSerde,
        #[serde(default)]
        pub(super) config: HashMap<String, String>,
    }

    /// The subset of Iceberg table metadata an exploration session reads.
    ///
    /// Both V1 (`schema`) and V2 (`schemas` + `current-schema-id`) shapes
    /// are accepted; unknown keys are ignored.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub(super) struct TableMetadataSerde {
        #[serde(default)]
        pub(super) location: Option<String>,
        #[serde(default)]
        pub(super) schema: Option<TableSchema>,
        #[serde(default)]
        pub(super) schemas: Vec<TableSchema>,
        #[serde(default)]
        pub(super) current_schema_id: Option<i32>,
        #[serde(default)]
        pub(super) current_snapshot_id: Option<i64>,
        #[serde(default)]
        pub(super) snapshots: Vec<Snapshot>,
        #[serde(default)]
        pub(super) properties: HashMap<String, String>,
    }

    impl LoadTableResult {
        pub(super) fn into_handle(self, identifier: TableIdent) -> Result<TableHandle> {
            let metadata = self.metadata;

            let schema = match metadata.current_schema_id {
                Some(id) => metadata
                    .schemas
                    .iter()
                    .find(|s| s.schema_id() == id)
                    .cloned()
                    .ok_or_else(|| {
                        Error::new(
                            ErrorKind::DataInvalid,
                            "Table metadata has no schema matching current-schema-id",
                        )
                        .with_context("current-schema-id", id.to_string())
                    })?,
                None => metadata
                    .schema
                    .or_else(|| metadata.schemas.into_iter().next())
                    .ok_or_else(|| {
                        Error::new(
                            ErrorKind::DataInvalid,
                            "Table metadata carries no schema",
                        )
                    })?,
            };

            // -1 is how V1 metadata spells "no current snapshot".
            let current_snapshot = metadata
                .current_snapshot_id
                .filter(|id| *id != -1)
                .and_then(|id| {
                    metadata
                        .snapshots
                        .iter()
                        .find(|s| s.snapshot_id() == id)
                        .cloned()
                });

            Ok(TableHandle::builder()
                .identifier(identifier)
                .schema(Arc::new(schema))
                .current_snapshot_opt(current_snapshot.map(Arc::new))
                .location_opt(metadata.location)
                .properties(metadata.properties)
                .build())
        }
    }
}

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

//! Read-only catalog API for exploration sessions.

pub mod memory;
pub mod rest;

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::scan::ScanResult;
use crate::table::TableHandle;
use crate::{Error, ErrorKind, Result};

/// The read-only catalog surface an exploration session drives.
///
/// This is deliberately narrow: listing, loading and scanning. Everything a
/// catalog can otherwise do (creating namespaces, committing snapshots,
/// renames) is out of scope for exploration and has no counterpart here, so
/// an implementation can never mutate remote state through this trait.
#[async_trait]
pub trait Catalog: Debug + Send + Sync {
    /// List top-level namespaces inside the catalog, in catalog-defined
    /// order. An empty list is a valid result, not an error.
    async fn list_namespaces(&self) -> Result<Vec<NamespaceIdent>>;

    /// List tables under a namespace, in catalog-defined order.
    ///
    /// Fails with [`ErrorKind::CatalogQuery`] if the namespace does not
    /// exist; returns an empty list if it exists but holds no tables.
    async fn list_tables(&self, namespace: &NamespaceIdent) -> Result<Vec<TableIdent>>;

    /// Load a table's metadata and return a resolved handle.
    async fn load_table(&self, table: &TableIdent) -> Result<TableHandle>;

    /// Materialize the table's current snapshot fully into memory.
    ///
    /// Full scan, no filtering or pagination; memory usage is bounded only
    /// by table size.
    async fn scan_table(&self, table: &TableHandle) -> Result<ScanResult>;
}

/// NamespaceIdent represents the identifier of a namespace in the catalog.
///
/// The namespace identifier is a list of strings, where each string is a
/// component of the namespace. It's catalog implementer's responsibility to
/// handle the namespace identifier correctly.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceIdent(Vec<String>);

impl NamespaceIdent {
    /// Create a new namespace identifier with only one level.
    pub fn new(name: String) -> Self {
        Self(vec![name])
    }

    /// Create a multi-level namespace identifier from vector.
    pub fn from_vec(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                "Namespace identifier can't be empty!",
            ));
        }
        Ok(Self(names))
    }

    /// Try to create namespace identifier from an iterator of string.
    pub fn from_strs(iter: impl IntoIterator<Item = impl ToString>) -> Result<Self> {
        Self::from_vec(iter.into_iter().map(|s| s.to_string()).collect())
    }

    /// Returns url encoded format.
    ///
    /// The REST protocol separates namespace levels with the unit separator
    /// before percent-encoding.
    pub fn encode_in_url(&self) -> String {
        urlencoding::encode(&self.0.join("\u{1f}")).to_string()
    }

}

impl Display for NamespaceIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// TableIdent represents the identifier of a table in the catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdent {
    /// Namespace of the table.
    pub namespace: NamespaceIdent,
    /// Table name.
    pub name: String,
}

impl TableIdent {
    /// Create a new table identifier.
    pub fn new(namespace: NamespaceIdent, name: String) -> Self {
        Self { namespace, name }
    }

    /// Get the namespace of the table.
    pub fn namespace(&self) -> &NamespaceIdent {
        &self.namespace
    }

    /// Get the name of the table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Try to create table identifier from an iterator of string.
    pub fn from_strs(iter: impl IntoIterator<Item = impl ToString>) -> Result<Self> {
        let mut vec: Vec<String> = iter.into_iter().map(|s| s.to_string()).collect();
        let table_name = vec.pop().ok_or_else(|| {
            Error::new(ErrorKind::DataInvalid, "Table identifier can't be empty!")
        })?;
        let namespace_ident = NamespaceIdent::from_vec(vec)?;

        Ok(Self {
            namespace: namespace_ident,
            name: table_name,
        })
    }
}

impl Display for TableIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_namespace_ident_display_and_url() {
        let ns = NamespaceIdent::from_strs(["a", "b"]).unwrap();
        assert_eq!(ns.to_string(), "a.b");
        assert_eq!(ns.encode_in_url(), "a%1Fb");
    }

    #[test]
    fn test_namespace_ident_rejects_empty() {
        assert_eq!(
            NamespaceIdent::from_vec(vec![]).unwrap_err().kind(),
            ErrorKind::DataInvalid
        );
    }

    #[test]
    fn test_table_ident_from_strs() {
        let table = TableIdent::from_strs(["ns1", "schema", "t1"]).unwrap();
        assert_eq!(
            table,
            TableIdent::new(NamespaceIdent::from_strs(["ns1", "schema"]).unwrap(), "t1".to_string())
        );
        assert_eq!(table.to_string(), "ns1.schema.t1");
    }

    #[test]
    fn test_table_ident_needs_namespace() {
        // A bare table name has no namespace to resolve against.
        assert!(TableIdent::from_strs(["t1"]).is_err());
    }

    #[test]
    fn test_table_ident_serde_shape() {
        let table = TableIdent::from_strs(["ns1", "t1"]).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"namespace": ["ns1"], "name": "t1"})
        );
    }
}

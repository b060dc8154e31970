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

//! In-memory catalog, holding pre-registered tables and their data.
//!
//! Useful as a stand-in catalog in tests and demos: registration happens
//! through `&mut self` before the catalog is shared, so the read path needs
//! no locking.

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef as ArrowSchemaRef;
use async_trait::async_trait;

use crate::catalog::{Catalog, NamespaceIdent, TableIdent};
use crate::scan::ScanResult;
use crate::table::TableHandle;
use crate::{Error, ErrorKind, Result};

#[derive(Debug)]
struct MemoryTable {
    handle: TableHandle,
    arrow_schema: ArrowSchemaRef,
    batches: Vec<RecordBatch>,
}

/// An in-memory, read-only catalog.
///
/// Namespaces and tables are listed in registration order; a table's
/// namespace must be registered before the table.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    namespaces: Vec<NamespaceIdent>,
    tables: Vec<MemoryTable>,
}

fn no_such_namespace_err<T>(namespace: &NamespaceIdent) -> Result<T> {
    Err(Error::new(
        ErrorKind::CatalogQuery,
        format!("No such namespace: {namespace}"),
    ))
}

fn no_such_table_err<T>(table: &TableIdent) -> Result<T> {
    Err(Error::new(
        ErrorKind::CatalogQuery,
        format!("No such table: {table}"),
    ))
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a namespace.
    pub fn add_namespace(&mut self, namespace: NamespaceIdent) -> &mut Self {
        if !self.namespaces.contains(&namespace) {
            self.namespaces.push(namespace);
        }
        self
    }

    /// Register a table with its data.
    ///
    /// The Arrow schema is kept separately so an empty table still scans to
    /// a well-formed, zero-row result. Fails if the table's namespace is not
    /// registered.
    pub fn add_table(
        &mut self,
        handle: TableHandle,
        arrow_schema: ArrowSchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<&mut Self> {
        if !self.namespaces.contains(handle.identifier().namespace()) {
            return no_such_namespace_err(handle.identifier().namespace());
        }

        self.tables.push(MemoryTable {
            handle,
            arrow_schema,
            batches,
        });
        Ok(self)
    }

    fn find_table(&self, table: &TableIdent) -> Option<&MemoryTable> {
        self.tables.iter().find(|t| t.handle.identifier() == table)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn list_namespaces(&self) -> Result<Vec<NamespaceIdent>> {
        Ok(self.namespaces.clone())
    }

    async fn list_tables(&self, namespace: &NamespaceIdent) -> Result<Vec<TableIdent>> {
        if !self.namespaces.contains(namespace) {
            return no_such_namespace_err(namespace);
        }

        Ok(self
            .tables
            .iter()
            .map(|t| t.handle.identifier())
            .filter(|ident| ident.namespace() == namespace)
            .cloned()
            .collect())
    }

    async fn load_table(&self, table: &TableIdent) -> Result<TableHandle> {
        match self.find_table(table) {
            Some(entry) => Ok(entry.handle.clone()),
            None => no_such_table_err(table),
        }
    }

    async fn scan_table(&self, table: &TableHandle) -> Result<ScanResult> {
        match self.find_table(table.identifier()) {
            Some(entry) => ScanResult::try_new(entry.arrow_schema.clone(), entry.batches.clone()),
            None => Err(Error::new(
                ErrorKind::Scan,
                format!("No data registered for table: {}", table.identifier()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_array::Int64Array;
    use arrow_schema::{DataType, Field, Schema as ArrowSchema};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::{FieldType, NestedField, TableSchema};

    fn id_schema() -> Arc<TableSchema> {
        Arc::new(TableSchema::new(
            0,
            vec![NestedField::required(1, "id", FieldType::primitive("long"))],
        ))
    }

    fn arrow_id_schema() -> ArrowSchemaRef {
        Arc::new(ArrowSchema::new(vec![Field::new(
            "id",
            DataType::Int64,
            false,
        )]))
    }

    fn id_batch(schema: &ArrowSchemaRef, ids: Vec<i64>) -> RecordBatch {
        RecordBatch::try_new(schema.clone(), vec![Arc::new(Int64Array::from(ids))]).unwrap()
    }

    fn handle_for(ident: &TableIdent) -> TableHandle {
        TableHandle::builder()
            .identifier(ident.clone())
            .schema(id_schema())
            .build()
    }

    #[tokio::test]
    async fn test_empty_catalog_lists_no_namespaces() {
        let catalog = MemoryCatalog::new();
        assert_eq!(catalog.list_namespaces().await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn test_listing_keeps_registration_order() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_namespace(NamespaceIdent::from_strs(["b"]).unwrap())
            .add_namespace(NamespaceIdent::from_strs(["a"]).unwrap());

        let namespaces = catalog.list_namespaces().await.unwrap();
        assert_eq!(
            namespaces,
            vec![
                NamespaceIdent::from_strs(["b"]).unwrap(),
                NamespaceIdent::from_strs(["a"]).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_tables_of_missing_namespace_fails() {
        let catalog = MemoryCatalog::new();
        let err = catalog
            .list_tables(&NamespaceIdent::new("nope".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CatalogQuery);
    }

    #[tokio::test]
    async fn test_list_tables_empty_namespace_is_ok() {
        let mut catalog = MemoryCatalog::new();
        catalog.add_namespace(NamespaceIdent::new("ns".to_string()));
        assert_eq!(
            catalog
                .list_tables(&NamespaceIdent::new("ns".to_string()))
                .await
                .unwrap(),
            vec![]
        );
    }

    #[tokio::test]
    async fn test_add_table_requires_namespace() {
        let mut catalog = MemoryCatalog::new();
        let ident = TableIdent::from_strs(["ns", "t"]).unwrap();
        let err = catalog
            .add_table(handle_for(&ident), arrow_id_schema(), vec![])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CatalogQuery);
    }

    #[tokio::test]
    async fn test_load_and_scan_registered_table() {
        let mut catalog = MemoryCatalog::new();
        let ns = NamespaceIdent::new("ns".to_string());
        let ident = TableIdent::from_strs(["ns", "t"]).unwrap();
        let arrow_schema = arrow_id_schema();

        catalog.add_namespace(ns);
        catalog
            .add_table(
                handle_for(&ident),
                arrow_schema.clone(),
                vec![id_batch(&arrow_schema, vec![1, 2, 3])],
            )
            .unwrap();

        let handle = catalog.load_table(&ident).await.unwrap();
        assert_eq!(handle.identifier(), &ident);

        let result = catalog.scan_table(&handle).await.unwrap();
        assert_eq!(result.row_count(), 3);
        assert_eq!(result.columns(), vec![("id", &DataType::Int64)]);
    }

    #[tokio::test]
    async fn test_load_missing_table_fails() {
        let mut catalog = MemoryCatalog::new();
        catalog.add_namespace(NamespaceIdent::new("ns".to_string()));
        let err = catalog
            .load_table(&TableIdent::from_strs(["ns", "missing"]).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CatalogQuery);
    }
}

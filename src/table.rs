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

//! Resolved table handles.

use std::collections::HashMap;

use typed_builder::TypedBuilder;

use crate::spec::{SnapshotRef, TableSchemaRef};
use crate::TableIdent;

/// A reference to a table whose metadata has already been loaded from the
/// catalog.
///
/// The handle is a local value: inspecting it never talks to the catalog
/// again and never fails. A table that has never been written has no current
/// snapshot.
#[derive(Debug, Clone, TypedBuilder)]
pub struct TableHandle {
    identifier: TableIdent,
    schema: TableSchemaRef,
    #[builder(default, setter(strip_option(fallback = current_snapshot_opt)))]
    current_snapshot: Option<SnapshotRef>,
    #[builder(default, setter(strip_option(fallback = location_opt), into))]
    location: Option<String>,
    #[builder(default)]
    properties: HashMap<String, String>,
}

impl TableHandle {
    /// The identifier this handle was resolved from.
    pub fn identifier(&self) -> &TableIdent {
        &self.identifier
    }

    /// The table's current schema.
    pub fn schema(&self) -> &TableSchemaRef {
        &self.schema
    }

    /// The table's current snapshot, or `None` if the table has never been
    /// written.
    pub fn current_snapshot(&self) -> Option<&SnapshotRef> {
        self.current_snapshot.as_ref()
    }

    /// The table's base location, if the catalog reported one.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Table properties as reported by the catalog.
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::spec::{FieldType, NestedField, TableSchema};

    #[test]
    fn test_handle_without_snapshot() {
        let schema = Arc::new(TableSchema::new(
            0,
            vec![NestedField::required(1, "id", FieldType::primitive("long"))],
        ));
        let handle = TableHandle::builder()
            .identifier(TableIdent::from_strs(["ns", "t"]).unwrap())
            .schema(schema.clone())
            .build();

        assert!(handle.current_snapshot().is_none());
        assert_eq!(handle.schema().fields().len(), 1);
        assert_eq!(handle.location(), None);
        assert!(handle.properties().is_empty());
    }
}

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

//! Table schemas as reported by a catalog.

use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Reference to [`TableSchema`].
pub type TableSchemaRef = Arc<TableSchema>;

/// An ordered sequence of named, typed fields, as reported by the catalog
/// for one schema version of a table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct TableSchema {
    /// Always `"struct"` in metadata JSON.
    #[serde(rename = "type", default = "struct_kind")]
    kind: String,
    /// Identifier of this schema version.
    #[serde(default)]
    schema_id: i32,
    /// The fields of the schema, in declaration order.
    fields: Vec<NestedField>,
}

fn struct_kind() -> String {
    "struct".to_string()
}

impl TableSchema {
    /// Create a schema from fields.
    pub fn new(schema_id: i32, fields: Vec<NestedField>) -> Self {
        Self {
            kind: struct_kind(),
            schema_id,
            fields,
        }
    }

    /// Identifier of this schema version.
    #[inline]
    pub fn schema_id(&self) -> i32 {
        self.schema_id
    }

    /// The fields of the schema, in declaration order.
    #[inline]
    pub fn fields(&self) -> &[NestedField] {
        &self.fields
    }

    /// Look a field up by name.
    pub fn field_by_name(&self, name: &str) -> Option<&NestedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single named, typed field of a table schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NestedField {
    /// Field id, unique within the table.
    pub id: i32,
    /// Field name.
    pub name: String,
    /// Whether the field may not be null.
    pub required: bool,
    /// The field's type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Optional field documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl NestedField {
    /// Create a required field.
    pub fn required(id: i32, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id,
            name: name.into(),
            required: true,
            field_type,
            doc: None,
        }
    }

    /// Create an optional field.
    pub fn optional(id: i32, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id,
            name: name.into(),
            required: false,
            field_type,
            doc: None,
        }
    }
}

impl Display for NestedField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.field_type)?;
        if self.required {
            write!(f, " (required)")?;
        }
        Ok(())
    }
}

/// The type of a schema field.
///
/// Primitive types arrive in metadata JSON as plain strings (`"long"`,
/// `"string"`, `"decimal(10, 2)"`). Nested struct/list/map types arrive as
/// JSON objects; the session only displays them, so they are kept as raw
/// JSON rather than modeled recursively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldType {
    /// A primitive type, e.g. `"long"` or `"timestamptz"`.
    Primitive(String),
    /// A nested struct, list or map type, kept as raw metadata JSON.
    Complex(Box<serde_json::Value>),
}

impl FieldType {
    /// Shorthand for a primitive type.
    pub fn primitive(name: impl Into<String>) -> Self {
        FieldType::Primitive(name.into())
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(name) => write!(f, "{name}"),
            FieldType::Complex(value) => match value.get("type").and_then(|t| t.as_str()) {
                Some(kind) => write!(f, "{kind}<...>"),
                None => write!(f, "{value}"),
            },
        }
    }
}

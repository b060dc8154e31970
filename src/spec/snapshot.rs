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

//! Snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Reference to [`Snapshot`].
pub type SnapshotRef = Arc<Snapshot>;

/// A snapshot represents the state of a table at some time. Only the current
/// snapshot is consumed by an exploration session; history stays remote.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "kebab-case")]
#[builder(field_defaults(setter(prefix = "with_")))]
pub struct Snapshot {
    /// A unique long ID.
    snapshot_id: i64,
    /// The snapshot ID of the snapshot's parent.
    /// Omitted for any snapshot with no parent.
    #[builder(default = None)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_snapshot_id: Option<i64>,
    /// A monotonically increasing long that tracks the order of changes to a
    /// table. Is 0 for Iceberg V1 tables.
    #[builder(default)]
    #[serde(default)]
    sequence_number: i64,
    /// A timestamp when the snapshot was created, used for garbage
    /// collection and table inspection.
    timestamp_ms: i64,
    /// A string map that summarizes the snapshot changes, including the
    /// operation (`append`, `overwrite`, ...).
    #[builder(default)]
    #[serde(default)]
    summary: HashMap<String, String>,
    /// ID of the table's current schema when the snapshot was created.
    #[builder(setter(strip_option), default = None)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_id: Option<i32>,
}

impl Snapshot {
    /// Get the id of the snapshot.
    #[inline]
    pub fn snapshot_id(&self) -> i64 {
        self.snapshot_id
    }

    /// Get parent snapshot id.
    #[inline]
    pub fn parent_snapshot_id(&self) -> Option<i64> {
        self.parent_snapshot_id
    }

    /// Get sequence_number of the snapshot.
    #[inline]
    pub fn sequence_number(&self) -> i64 {
        self.sequence_number
    }

    /// Get summary of the snapshot.
    #[inline]
    pub fn summary(&self) -> &HashMap<String, String> {
        &self.summary
    }

    /// Get the raw millisecond timestamp of when the snapshot was created.
    #[inline]
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    /// Get the timestamp of when the snapshot was created.
    ///
    /// Returns `None` if the stored millisecond value is out of the
    /// representable range.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms).single()
    }

    /// Get the schema id of this snapshot.
    #[inline]
    pub fn schema_id(&self) -> Option<i32> {
        self.schema_id
    }
}

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

//! In-memory scan results and the scan engine seam.

use arrow_array::RecordBatch;
use arrow_schema::{DataType, SchemaRef as ArrowSchemaRef};
use async_trait::async_trait;

use crate::table::TableHandle;
use crate::{Error, ErrorKind, Result};

/// The seam to the compute engine that actually reads table data.
///
/// Planning and executing a scan (manifests, data files, storage
/// credentials) belongs to an engine, not to the exploration session. A
/// [`RestCatalog`](crate::RestCatalog) delegates `scan_table` to whichever
/// scanner the caller binds.
#[async_trait]
pub trait TableScanner: Send + Sync {
    /// Read the table's current snapshot fully into memory.
    async fn scan(&self, table: &TableHandle) -> Result<ScanResult>;
}

/// Tabular result of materializing a table's current snapshot into memory.
///
/// Carries the record batches plus the figures an exploration session
/// reports: row count, ordered column name→type mapping, and an approximate
/// memory footprint. One-shot and session-scoped; nothing is persisted.
#[derive(Debug, Clone)]
pub struct ScanResult {
    schema: ArrowSchemaRef,
    batches: Vec<RecordBatch>,
    row_count: u64,
    approx_size_bytes: u64,
}

impl ScanResult {
    /// Build a scan result from collected record batches.
    ///
    /// The Arrow schema is passed explicitly so that a table with zero rows
    /// (an empty batch list) still reports its columns. Fails with
    /// [`ErrorKind::Scan`] when a batch disagrees with the schema.
    pub fn try_new(schema: ArrowSchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for batch in &batches {
            if batch.schema() != schema {
                return Err(Error::new(
                    ErrorKind::Scan,
                    "Record batch schema differs from scan schema",
                )
                .with_context("batch schema", format!("{:?}", batch.schema()))
                .with_context("scan schema", format!("{:?}", schema)));
            }
        }

        let row_count = batches.iter().map(|b| b.num_rows() as u64).sum();
        let approx_size_bytes = batches
            .iter()
            .map(|b| b.get_array_memory_size() as u64)
            .sum();

        Ok(Self {
            schema,
            batches,
            row_count,
            approx_size_bytes,
        })
    }

    /// Total number of rows across all batches.
    #[inline]
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Approximate memory footprint of the materialized data, in bytes.
    #[inline]
    pub fn approx_size_bytes(&self) -> u64 {
        self.approx_size_bytes
    }

    /// The Arrow schema of the result.
    pub fn schema(&self) -> &ArrowSchemaRef {
        &self.schema
    }

    /// Ordered column name→type mapping.
    pub fn columns(&self) -> Vec<(&str, &DataType)> {
        self.schema
            .fields()
            .iter()
            .map(|f| (f.name().as_str(), f.data_type()))
            .collect()
    }

    /// The materialized record batches, for hand-off to a formatter or
    /// downstream analytics.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Consume the result, returning the batches.
    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_array::{Int64Array, StringArray};
    use arrow_schema::{Field, Schema as ArrowSchema};
    use pretty_assertions::assert_eq;

    use super::*;

    fn test_schema() -> ArrowSchemaRef {
        Arc::new(ArrowSchema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]))
    }

    fn test_batch(schema: &ArrowSchemaRef, ids: Vec<i64>) -> RecordBatch {
        let names: Vec<String> = ids.iter().map(|i| format!("row-{i}")).collect();
        RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(StringArray::from(names)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_scan_result_counts_rows_across_batches() {
        let schema = test_schema();
        let result = ScanResult::try_new(
            schema.clone(),
            vec![
                test_batch(&schema, vec![1, 2]),
                test_batch(&schema, vec![3]),
            ],
        )
        .unwrap();

        assert_eq!(result.row_count(), 3);
        assert!(result.approx_size_bytes() > 0);
        assert_eq!(
            result.columns(),
            vec![("id", &DataType::Int64), ("name", &DataType::Utf8)]
        );
        assert_eq!(result.batches().len(), 2);
    }

    #[test]
    fn test_scan_result_empty_table_keeps_columns() {
        let schema = test_schema();
        let result = ScanResult::try_new(schema, vec![]).unwrap();

        assert_eq!(result.row_count(), 0);
        assert_eq!(result.approx_size_bytes(), 0);
        assert_eq!(result.columns().len(), 2);
    }

    #[test]
    fn test_scan_result_rejects_mismatched_batch() {
        let schema = test_schema();
        let other = Arc::new(ArrowSchema::new(vec![Field::new(
            "x",
            DataType::Int64,
            false,
        )]));
        let batch = RecordBatch::try_new(
            other,
            vec![Arc::new(Int64Array::from(vec![1]))],
        )
        .unwrap();

        let err = ScanResult::try_new(schema, vec![batch]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Scan);
    }
}

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

//! Integration tests for catalog exploration sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arrow_array::{Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema as ArrowSchema};
use iceberg_scout::spec::{FieldType, NestedField, Snapshot, TableSchema};
use iceberg_scout::{
    CatalogSession, ErrorKind, EventListener, MemoryCatalog, NamespaceIdent, SessionEvent,
    TableHandle, TableIdent,
};
use pretty_assertions::assert_eq;

/// Records every event in order, for asserting the session's diagnostics.
#[derive(Debug, Default)]
struct RecordingListener {
    events: Mutex<Vec<SessionEvent>>,
}

impl EventListener for RecordingListener {
    fn on_event(&self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl RecordingListener {
    fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }
}

fn taxi_schema() -> Arc<TableSchema> {
    Arc::new(TableSchema::new(0, vec![
        NestedField::required(1, "trip_id", FieldType::primitive("long")),
        NestedField::optional(2, "vendor", FieldType::primitive("string")),
    ]))
}

fn taxi_arrow_schema() -> Arc<ArrowSchema> {
    Arc::new(ArrowSchema::new(vec![
        Field::new("trip_id", DataType::Int64, false),
        Field::new("vendor", DataType::Utf8, true),
    ]))
}

fn taxi_batch() -> RecordBatch {
    RecordBatch::try_new(taxi_arrow_schema(), vec![
        Arc::new(Int64Array::from(vec![1, 2, 3])),
        Arc::new(StringArray::from(vec![Some("CMT"), None, Some("VTS")])),
    ])
    .unwrap()
}

/// A catalog with namespaces `a` and `a.b`, and one written table `a.b.t`.
fn seeded_catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog.add_namespace(NamespaceIdent::new("a".to_string()));
    catalog.add_namespace(NamespaceIdent::from_strs(["a", "b"]).unwrap());

    let handle = TableHandle::builder()
        .identifier(TableIdent::from_strs(["a", "b", "t"]).unwrap())
        .schema(taxi_schema())
        .current_snapshot(Arc::new(
            Snapshot::builder()
                .with_snapshot_id(1)
                .with_timestamp_ms(1662532818843)
                .with_summary(HashMap::from([(
                    "operation".to_string(),
                    "append".to_string(),
                )]))
                .build(),
        ))
        .build();
    catalog
        .add_table(handle, taxi_arrow_schema(), vec![taxi_batch()])
        .unwrap();
    catalog
}

#[tokio::test]
async fn test_empty_catalog_lists_no_namespaces() {
    let session = CatalogSession::new("empty", Arc::new(MemoryCatalog::new()));

    let namespaces = session.list_namespaces().await.unwrap();
    assert!(namespaces.is_empty());
}

#[tokio::test]
async fn test_listing_survives_missing_namespace() {
    let session = CatalogSession::new("seeded", Arc::new(seeded_catalog()));

    // One candidate namespace is bogus; the loop reports it and moves on.
    let candidates = [
        NamespaceIdent::new("a".to_string()),
        NamespaceIdent::new("nope".to_string()),
        NamespaceIdent::from_strs(["a", "b"]).unwrap(),
    ];

    let mut listed = Vec::new();
    for namespace in &candidates {
        match session.list_tables(namespace).await {
            Ok(tables) => listed.push((namespace.clone(), tables.len())),
            Err(e) => assert_eq!(e.kind(), ErrorKind::CatalogQuery),
        }
    }

    assert_eq!(listed, vec![
        (NamespaceIdent::new("a".to_string()), 0),
        (NamespaceIdent::from_strs(["a", "b"]).unwrap(), 1),
    ]);
}

#[tokio::test]
async fn test_resolve_short_circuits_on_first_success() {
    let listener = Arc::new(RecordingListener::default());
    let session = CatalogSession::new("seeded", Arc::new(seeded_catalog()))
        .with_listener(listener.clone());

    let first = TableIdent::from_strs(["a", "b", "t"]).unwrap();
    let never_tried = TableIdent::from_strs(["z", "t"]).unwrap();

    let handle = session
        .resolve_table(&[first.clone(), never_tried])
        .await
        .unwrap();
    assert_eq!(handle.identifier(), &first);

    // Exactly one attempt, then resolution; the second candidate is never
    // reported.
    assert_eq!(listener.events(), vec![
        SessionEvent::CandidateTried {
            table: first.clone(),
            succeeded: true,
        },
        SessionEvent::TableResolved { table: first },
    ]);
}

#[tokio::test]
async fn test_resolve_falls_through_to_later_candidate() {
    let session = CatalogSession::new("seeded", Arc::new(seeded_catalog()));

    let handle = session
        .resolve_table(&[
            TableIdent::from_strs(["a", "t"]).unwrap(),
            TableIdent::from_strs(["a", "b", "t"]).unwrap(),
        ])
        .await
        .unwrap();

    assert_eq!(
        handle.identifier(),
        &TableIdent::from_strs(["a", "b", "t"]).unwrap()
    );
}

#[tokio::test]
async fn test_resolve_exhaustion_reports_causes_in_order() {
    let session = CatalogSession::new("seeded", Arc::new(seeded_catalog()));

    let candidates = [
        TableIdent::from_strs(["a", "missing"]).unwrap(),
        TableIdent::from_strs(["nope", "missing"]).unwrap(),
        TableIdent::from_strs(["a", "b", "missing"]).unwrap(),
    ];

    let err = session.resolve_table(&candidates).await.unwrap_err();
    assert_eq!(err.attempts().len(), candidates.len());
    for (attempt, candidate) in err.attempts().iter().zip(&candidates) {
        assert_eq!(attempt.table(), candidate);
        assert_eq!(attempt.cause().kind(), ErrorKind::CatalogQuery);
    }

    let err: iceberg_scout::Error = err.into();
    assert_eq!(err.kind(), ErrorKind::TableResolution);
}

#[tokio::test]
async fn test_resolve_empty_candidate_list_is_exhaustion() {
    let session = CatalogSession::new("seeded", Arc::new(seeded_catalog()));

    let err = session.resolve_table(&[]).await.unwrap_err();
    assert_eq!(err.attempts().len(), 0);
}

#[tokio::test]
async fn test_inspect_never_written_table() {
    let mut catalog = MemoryCatalog::new();
    catalog.add_namespace(NamespaceIdent::new("a".to_string()));
    catalog
        .add_table(
            TableHandle::builder()
                .identifier(TableIdent::from_strs(["a", "fresh"]).unwrap())
                .schema(taxi_schema())
                .build(),
            taxi_arrow_schema(),
            vec![],
        )
        .unwrap();
    let session = CatalogSession::new("fresh", Arc::new(catalog));

    let handle = session
        .resolve_table(&[TableIdent::from_strs(["a", "fresh"]).unwrap()])
        .await
        .unwrap();
    let inspection = session.inspect_table(&handle);

    assert_eq!(inspection.schema.fields().len(), 2);
    assert!(inspection.current_snapshot.is_none());
}

#[tokio::test]
async fn test_explore_resolve_inspect_scan_end_to_end() {
    let listener = Arc::new(RecordingListener::default());
    let session = CatalogSession::new("quickstart_catalog", Arc::new(seeded_catalog()))
        .with_listener(listener.clone());

    let namespaces = session.list_namespaces().await.unwrap();
    assert_eq!(namespaces, vec![
        NamespaceIdent::new("a".to_string()),
        NamespaceIdent::from_strs(["a", "b"]).unwrap(),
    ]);

    let mut all_tables = Vec::new();
    for namespace in &namespaces {
        all_tables.extend(session.list_tables(namespace).await.unwrap());
    }
    assert_eq!(all_tables, vec![TableIdent::from_strs(["a", "b", "t"]).unwrap()]);

    // First candidate misses, second resolves.
    let handle = session
        .resolve_table(&[
            TableIdent::from_strs(["a", "t"]).unwrap(),
            TableIdent::from_strs(["a", "b", "t"]).unwrap(),
        ])
        .await
        .unwrap();

    let inspection = session.inspect_table(&handle);
    assert_eq!(
        inspection.current_snapshot.as_ref().map(|s| s.snapshot_id()),
        Some(1)
    );
    assert_eq!(
        inspection
            .current_snapshot
            .as_ref()
            .and_then(|s| s.summary().get("operation").cloned()),
        Some("append".to_string())
    );

    let result = session.scan_to_table(&handle).await.unwrap();
    assert_eq!(result.row_count(), 3);
    assert!(result.approx_size_bytes() > 0);
    assert_eq!(
        result
            .columns()
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>(),
        vec!["trip_id", "vendor"]
    );

    let events = listener.events();
    assert_eq!(events[0], SessionEvent::NamespacesListed { count: 2 });
    assert!(matches!(
        events.last(),
        Some(SessionEvent::ScanCompleted { row_count: 3, .. })
    ));
}

use keepsake_core::db::{open_db, open_db_in_memory};
use keepsake_core::value::scalar::TextCodec;
use keepsake_core::{
    AdapterGraph, Association, FieldValue, InMemorySession, Memento, MementoError,
    MementoRepository, ObjectSpec, Oid, RepoError, ScalarValue, SnapshotError, SnapshotService,
    SqliteMementoRepository,
};
use rusqlite::Connection;
use std::sync::Arc;
use uuid::Uuid;

fn session() -> InMemorySession {
    InMemorySession::with_specs([
        ObjectSpec::entity("shop.Order")
            .with(Association::value("title", Arc::new(TextCodec)))
            .with(Association::one_to_one("gift", "shop.Wrap")),
        ObjectSpec::entity("shop.Wrap"),
    ])
}

fn title(session: &InMemorySession, handle: keepsake_core::AdapterHandle) -> Option<ScalarValue> {
    match session.adapter(handle).unwrap().field("title") {
        Some(FieldValue::Scalar(value)) => value.clone(),
        other => panic!("unexpected title field: {other:?}"),
    }
}

#[test]
fn repository_requires_a_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    match SqliteMementoRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            actual_version, ..
        }) => assert_eq!(actual_version, 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}

#[test]
fn saved_memento_reads_back_identically() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMementoRepository::try_new(&conn).unwrap();
    let mut graph = session();
    let order = graph.create_persistent("shop.Order", "o-1").unwrap();
    graph
        .set_scalar(order, "title", Some(ScalarValue::Text("boxed".to_string())))
        .unwrap();
    let memento = Memento::capture(&graph, order).unwrap();

    let id = repo.save_memento(&memento, Some("before edit")).unwrap();
    let stored = repo.get_memento(id).unwrap().expect("memento stored");

    assert_eq!(stored.id, id);
    assert_eq!(stored.root_oid, Oid::persistent("shop.Order", "o-1"));
    assert_eq!(stored.type_name, "shop.Order");
    assert_eq!(stored.label.as_deref(), Some("before edit"));
    assert_eq!(stored.memento, memento);
    assert!(repo.get_memento(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn session_bound_mementos_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMementoRepository::try_new(&conn).unwrap();
    let mut graph = session();
    let order = graph.create_persistent("shop.Order", "o-1").unwrap();
    let wrap = graph.create_standalone("shop.Wrap").unwrap();
    graph.set_reference(order, "gift", Some(wrap)).unwrap();

    let memento = Memento::capture(&graph, order).unwrap();
    assert!(matches!(
        repo.save_memento(&memento, None),
        Err(RepoError::NotPortable(_))
    ));
}

#[test]
fn corrupt_payload_is_reported() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO mementos (memento_uuid, root_oid, type_name, payload, created_at)
         VALUES (?1, 'P:shop.Order:o-1', 'shop.Order', 'not json', 0);",
        [Uuid::new_v4().to_string()],
    )
    .unwrap();
    let repo = SqliteMementoRepository::try_new(&conn).unwrap();

    let err = repo
        .list_for_oid(&Oid::persistent("shop.Order", "o-1"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Memento(MementoError::Serialization(_))
    ));
}

#[test]
fn service_snapshots_history_and_revert() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("keepsake.db")).unwrap();
    let service = SnapshotService::new(SqliteMementoRepository::try_new(&conn).unwrap());

    let mut graph = session();
    let order = graph.create_persistent("shop.Order", "o-7").unwrap();
    graph
        .set_scalar(order, "title", Some(ScalarValue::Text("v1".to_string())))
        .unwrap();
    let first = service.snapshot(&graph, order, Some("v1")).unwrap();
    graph
        .set_scalar(order, "title", Some(ScalarValue::Text("v2".to_string())))
        .unwrap();
    let second = service.snapshot(&graph, order, Some("v2")).unwrap();

    let history = service
        .history(&Oid::persistent("shop.Order", "o-7"))
        .unwrap();
    let ids: Vec<_> = history.iter().map(|stored| stored.id).collect();
    assert_eq!(ids, vec![second, first]);

    service.revert(first, &mut graph, order).unwrap();
    assert_eq!(
        title(&graph, order),
        Some(ScalarValue::Text("v1".to_string()))
    );

    let other = graph.create_persistent("shop.Order", "o-8").unwrap();
    assert!(matches!(
        service.revert(first, &mut graph, other),
        Err(SnapshotError::Memento(MementoError::IdentityMismatch { .. }))
    ));

    let mut fresh = session();
    let restored = service.restore(second, &mut fresh).unwrap();
    assert_eq!(
        title(&fresh, restored),
        Some(ScalarValue::Text("v2".to_string()))
    );

    service.discard(first).unwrap();
    assert!(matches!(
        service.restore(first, &mut fresh),
        Err(SnapshotError::NotFound(id)) if id == first
    ));
}

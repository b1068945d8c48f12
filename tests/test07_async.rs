use std::sync::Arc;

use sql_conduit::prelude::*;
use sql_conduit::test_utils::MemoryFactory;
use tokio_util::sync::CancellationToken;

fn executor(mem: &MemoryFactory) -> SqlExecutor {
    SqlExecutor::new(ObjectFactory::new(Arc::new(mem.clone())), "mem://async")
}

#[derive(Debug, Default, PartialEq)]
struct User {
    id: i64,
    name: String,
}

impl FromRow for User {
    fn row_mapping() -> RowMapping<Self> {
        RowMapping::new()
            .bind("id", |u: &mut User, v: i64| u.id = v)
            .bind("name", |u: &mut User, v: String| u.name = v)
    }
}

fn script_users(mem: &MemoryFactory) {
    mem.script_rows(
        "SELECT id, name FROM users",
        vec!["id", "name"],
        vec![
            vec![SqlValue::Int(1), SqlValue::Text("alice".into())],
            vec![SqlValue::Int(2), SqlValue::Text("bob".into())],
        ],
    );
}

#[tokio::test]
async fn async_select_matches_sync_behavior() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    script_users(&mem);

    let mut ex = executor(&mem);
    let cancel = CancellationToken::new();
    let set = ex
        .query("SELECT id, name FROM users")
        .select_async(&cancel)
        .await?;
    assert_eq!(set.len(), 2);

    let users: Vec<User> = ex
        .query("SELECT id, name FROM users")
        .fetch_all_async(&cancel)
        .await?;
    assert_eq!(users[0], User { id: 1, name: "alice".into() });

    let first: User = ex
        .query("SELECT id, name FROM users")
        .fetch_one_async(&cancel)
        .await?;
    assert_eq!(first.id, 1);
    Ok(())
}

#[tokio::test]
async fn async_execute_and_scalar() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    mem.script_rows_affected("DELETE FROM users", 2);
    mem.script_rows(
        "SELECT count(*)",
        vec!["count"],
        vec![vec![SqlValue::Int(9)]],
    );

    let mut ex = executor(&mem);
    let cancel = CancellationToken::new();
    assert_eq!(
        ex.query("DELETE FROM users").execute_async(&cancel).await?,
        2
    );
    assert_eq!(
        ex.query("SELECT count(*)").scalar_async(&cancel).await?,
        SqlValue::Int(9)
    );
    Ok(())
}

#[tokio::test]
async fn cancellation_fails_fast_before_any_io() {
    let mem = MemoryFactory::new();
    let mut ex = executor(&mem);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = ex
        .query("SELECT id, name FROM users")
        .select_async(&cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::Cancelled));

    let err = ex
        .query("DELETE FROM users")
        .execute_async(&cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::Cancelled));

    // Fail-fast means the connection was never opened.
    assert_eq!(mem.open_count(), 0);
}

#[tokio::test]
async fn cancelled_transacted_execution_leaves_no_open_transaction() {
    let mem = MemoryFactory::new();
    let mut ex = executor(&mem);
    ex.query("SELECT 1").execute().expect("warm-up");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = ex
        .execute_transacted_async("INSERT INTO t VALUES (1)", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::Cancelled));

    // The entry check fired before any transaction was begun, so nothing
    // is left open and nothing was applied.
    assert!(!mem.in_transaction());
    assert_eq!(mem.committed(), vec!["SELECT 1".to_string()]);
}

#[tokio::test]
async fn async_transacted_commit_and_rollback() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    mem.fail_when_contains("violates");

    let mut ex = executor(&mem);
    let cancel = CancellationToken::new();

    ex.execute_transacted_async("INSERT INTO t VALUES (1)", &cancel)
        .await?;
    assert_eq!(mem.committed(), vec!["INSERT INTO t VALUES (1)".to_string()]);

    let err = ex
        .execute_transacted_async("INSERT violates constraint", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::Execution(_)));
    assert_eq!(mem.committed().len(), 1);
    assert!(!mem.in_transaction());
    Ok(())
}

#[tokio::test]
async fn async_batches_mirror_sync_semantics() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    mem.fail_when_contains("UPDATE");

    let batch = vec![
        QueryAndParams::new_without_params("INSERT INTO t VALUES (1)"),
        QueryAndParams::new_without_params("UPDATE t SET v = 2"),
        QueryAndParams::new_without_params("DELETE FROM t"),
    ];

    let mut ex = executor(&mem);
    let cancel = CancellationToken::new();

    let err = ex.execute_batch_async(&batch, &cancel).await.unwrap_err();
    assert!(matches!(err, SqlConduitError::Execution(_)));
    assert_eq!(mem.committed(), vec!["INSERT INTO t VALUES (1)".to_string()]);

    let err = ex
        .execute_batch_transacted_async(&batch, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::Execution(_)));
    // The transacted attempt added nothing.
    assert_eq!(mem.committed(), vec!["INSERT INTO t VALUES (1)".to_string()]);
    assert!(!mem.in_transaction());
    Ok(())
}

#[tokio::test]
async fn typed_stream_pulls_rows_until_exhausted() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    script_users(&mem);

    let mut ex = executor(&mem);
    let cancel = CancellationToken::new();
    let mut stream = ex
        .query("SELECT id, name FROM users")
        .fetch_stream::<User>(&cancel)
        .await?;

    let mut names = Vec::new();
    while let Some(user) = stream.next().await? {
        names.push(user.name);
    }
    assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);
    Ok(())
}

#[tokio::test]
async fn typed_stream_honors_cancellation_mid_stream() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    script_users(&mem);

    let mut ex = executor(&mem);
    let cancel = CancellationToken::new();
    let mut stream = ex
        .query("SELECT id, name FROM users")
        .fetch_stream::<User>(&cancel)
        .await?;

    let first = stream.next().await?.expect("first row");
    assert_eq!(first.id, 1);

    cancel.cancel();
    let err = stream.next().await.unwrap_err();
    assert!(matches!(err, SqlConduitError::Cancelled));
    Ok(())
}

#[tokio::test]
async fn async_reader_on_connection_string_carries_the_connection()
-> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    mem.script_rows("SELECT id FROM t", vec!["id"], vec![vec![SqlValue::Int(1)]]);

    let mut ex = executor(&mem);
    let cancel = CancellationToken::new();
    let mut cursor = ex
        .query("SELECT id FROM t")
        .on_connection_string("mem://scoped")
        .reader_async(&cancel)
        .await?;

    assert_eq!(
        cursor.next_row_async(&cancel).await?,
        Some(vec![SqlValue::Int(1)])
    );
    assert_eq!(mem.close_count(), 0);
    cursor.close()?;
    assert_eq!(mem.close_count(), 1);
    Ok(())
}

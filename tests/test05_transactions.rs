use std::sync::Arc;

use sql_conduit::prelude::*;
use sql_conduit::test_utils::MemoryFactory;

fn executor(mem: &MemoryFactory) -> SqlExecutor {
    SqlExecutor::new(ObjectFactory::new(Arc::new(mem.clone())), "mem://tx")
}

#[test]
fn transacted_success_commits_once() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    let mut ex = executor(&mem);

    let affected = ex.execute_transacted("INSERT INTO t VALUES (1)")?;
    assert_eq!(affected, 1);
    assert_eq!(mem.committed(), vec!["INSERT INTO t VALUES (1)".to_string()]);
    assert!(!mem.in_transaction());
    Ok(())
}

#[test]
fn transacted_failure_rolls_back_and_surfaces_original_error() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    mem.fail_when_contains("violates");

    let mut ex = executor(&mem);
    let err = ex
        .execute_transacted("INSERT violates constraint")
        .unwrap_err();

    // The original execution error, not a transaction error, reaches the
    // caller; nothing was committed and the transaction is gone.
    assert!(matches!(err, SqlConduitError::Execution(_)));
    assert!(mem.committed().is_empty());
    assert!(!mem.in_transaction());
    Ok(())
}

#[test]
fn failed_rollback_chains_both_errors() {
    let mem = MemoryFactory::new();
    mem.fail_when_contains("violates");
    mem.fail_rollback(true);

    let mut ex = executor(&mem);
    let err = ex
        .execute_transacted("INSERT violates constraint")
        .unwrap_err();

    match err {
        SqlConduitError::RollbackFailed { original, rollback } => {
            assert!(matches!(*original, SqlConduitError::Execution(_)));
            assert!(matches!(*rollback, SqlConduitError::Transaction(_)));
        }
        other => panic!("expected RollbackFailed, got {other:?}"),
    }
}

#[test]
fn failed_commit_propagates() {
    let mem = MemoryFactory::new();
    mem.fail_commit(true);

    let mut ex = executor(&mem);
    let err = ex.execute_transacted("INSERT INTO t VALUES (1)").unwrap_err();
    assert!(matches!(err, SqlConduitError::Transaction(_)));
}

#[test]
fn prior_uncommitted_statement_is_absent_after_rollback() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    mem.fail_when_contains("violates");

    // Open a transaction explicitly and apply one statement without
    // committing.
    let mut conn = mem.create_connection("mem://tx")?;
    conn.open()?;
    let mut tx = conn.begin(IsolationLevel::Default)?;
    let mut ex = SqlExecutor::with_connection(ObjectFactory::new(Arc::new(mem.clone())), conn);

    ex.execute_in_transaction("INSERT INTO t VALUES (1)", tx.as_mut(), false)?;
    assert!(mem.in_transaction());

    // The failing statement triggers rollback of the whole transaction,
    // taking the earlier uncommitted statement with it.
    let err = ex
        .execute_in_transaction("INSERT violates constraint", tx.as_mut(), true)
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::Execution(_)));
    assert!(!mem.in_transaction());

    let committed = mem.committed();
    assert!(
        !committed.contains(&"INSERT INTO t VALUES (1)".to_string()),
        "rolled-back statement must not be committed: {committed:?}"
    );
    Ok(())
}

#[test]
fn supplied_transaction_with_commit_false_stays_open() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    let mut conn = mem.create_connection("mem://tx")?;
    conn.open()?;
    let mut tx = conn.begin(IsolationLevel::Default)?;

    let mut ex = SqlExecutor::with_connection(ObjectFactory::new(Arc::new(mem.clone())), conn);
    ex.execute_in_transaction("INSERT INTO t VALUES (1)", tx.as_mut(), false)?;

    assert!(mem.in_transaction());
    assert!(mem.committed().is_empty());

    tx.commit()?;
    assert!(!mem.in_transaction());
    assert_eq!(mem.committed(), vec!["INSERT INTO t VALUES (1)".to_string()]);
    Ok(())
}

#[test]
fn completed_transaction_rejects_reuse() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    let mut conn = mem.create_connection("mem://tx")?;
    conn.open()?;
    let mut tx = conn.begin(IsolationLevel::Default)?;
    tx.commit()?;
    assert!(matches!(
        tx.commit(),
        Err(SqlConduitError::Transaction(_))
    ));
    assert!(matches!(
        tx.rollback(),
        Err(SqlConduitError::Transaction(_))
    ));
    Ok(())
}

#[test]
fn transacted_on_connection_string_closes_scoped_connection() -> Result<(), SqlConduitError> {
    let mem = MemoryFactory::new();
    let mut ex = executor(&mem);

    ex.execute_transacted_on(
        QueryTarget::ConnectionString("mem://scoped"),
        "INSERT INTO t VALUES (9)",
        TransactedOptions::default(),
    )?;
    assert_eq!(mem.committed(), vec!["INSERT INTO t VALUES (9)".to_string()]);
    assert_eq!(mem.open_count(), 1);
    assert_eq!(mem.close_count(), 1);
    Ok(())
}

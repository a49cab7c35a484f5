use std::time::Duration;

use anyhow::Result;
use tempfile::NamedTempFile;

use burrowdb::{Database, Field, Operator, PageId, Permission, TableId, Tuple};

fn row(n: i64) -> Tuple {
    Tuple::new(vec![Field::Int(n)])
}

fn count_rows(db: &Database, table_id: TableId) -> Result<usize> {
    let tid = db.begin_transaction();
    let mut scan = db.scan(tid, table_id)?;
    scan.open()?;
    let mut rows = 0;
    while scan.next()?.is_some() {
        rows += 1;
    }
    scan.close()?;
    db.commit(tid)?;
    Ok(rows)
}

#[test]
fn test_commit_persists_and_releases_locks() -> Result<()> {
    let file = NamedTempFile::new()?;
    let db = Database::new(8);
    let table_id = db.register_table("t", file.path())?;

    let tid = db.begin_transaction();
    let rid = db.buffer_pool().insert_tuple(tid, table_id, &row(42))?;
    assert!(db.buffer_pool().holds_lock(tid, rid.page));

    db.commit(tid)?;
    assert!(!db.buffer_pool().holds_lock(tid, rid.page));

    // A separate database over the same file sees the committed tuple
    let db2 = Database::new(8);
    let table2 = db2.register_table("t", file.path())?;
    assert_eq!(count_rows(&db2, table2)?, 1);

    Ok(())
}

#[test]
fn test_abort_discards_dirty_pages_and_releases_locks() -> Result<()> {
    let file = NamedTempFile::new()?;
    let db = Database::new(8);
    let table_id = db.register_table("t", file.path())?;

    let tid = db.begin_transaction();
    db.buffer_pool().insert_tuple(tid, table_id, &row(1))?;
    db.commit(tid)?;

    let doomed = db.begin_transaction();
    let rid = db.buffer_pool().insert_tuple(doomed, table_id, &row(2))?;
    assert!(db.buffer_pool().holds_lock(doomed, rid.page));
    db.abort(doomed)?;
    assert!(!db.buffer_pool().holds_lock(doomed, rid.page));

    // Re-fetching the page rereads the persisted version
    assert_eq!(count_rows(&db, table_id)?, 1);

    Ok(())
}

#[test]
fn test_aborted_delete_leaves_tuple_in_place() -> Result<()> {
    let file = NamedTempFile::new()?;
    let db = Database::new(8);
    let table_id = db.register_table("t", file.path())?;

    let tid = db.begin_transaction();
    let rid = db.buffer_pool().insert_tuple(tid, table_id, &row(9))?;
    db.commit(tid)?;

    let doomed = db.begin_transaction();
    db.buffer_pool().delete_tuple(doomed, rid)?;
    db.abort(doomed)?;

    assert_eq!(count_rows(&db, table_id)?, 1);
    Ok(())
}

#[test]
fn test_abort_with_no_work_is_safe() -> Result<()> {
    let db = Database::new(4);
    let tid = db.begin_transaction();
    db.abort(tid)?;
    db.commit(db.begin_transaction())?;
    Ok(())
}

#[test]
fn test_lock_timeout_signals_transaction_abort() -> Result<()> {
    let file = NamedTempFile::new()?;
    let db = Database::with_lock_timeout(8, Duration::from_millis(50));
    let table_id = db.register_table("t", file.path())?;
    db.catalog().file(table_id).unwrap().allocate_page()?;
    let pid = PageId::new(table_id, 0);

    let writer = db.begin_transaction();
    db.buffer_pool().get_page(writer, pid, Permission::Exclusive)?;

    let reader = db.begin_transaction();
    let err = db
        .buffer_pool()
        .get_page(reader, pid, Permission::Shared)
        .unwrap_err();
    assert!(err.is_transaction_abort());
    db.abort(reader)?;

    // Once the writer commits, the page is reachable again
    db.commit(writer)?;
    let reader = db.begin_transaction();
    db.buffer_pool().get_page(reader, pid, Permission::Shared)?;
    db.commit(reader)?;

    Ok(())
}

#[test]
fn test_shared_then_upgrade_through_buffer_pool() -> Result<()> {
    let file = NamedTempFile::new()?;
    let db = Database::with_lock_timeout(8, Duration::from_millis(50));
    let table_id = db.register_table("t", file.path())?;
    db.catalog().file(table_id).unwrap().allocate_page()?;
    let pid = PageId::new(table_id, 0);

    let tid = db.begin_transaction();
    db.buffer_pool().get_page(tid, pid, Permission::Shared)?;
    db.buffer_pool().get_page(tid, pid, Permission::Exclusive)?;

    // The upgrade shut out shared readers
    let other = db.begin_transaction();
    let err = db
        .buffer_pool()
        .get_page(other, pid, Permission::Shared)
        .unwrap_err();
    assert!(err.is_transaction_abort());
    db.abort(other)?;
    db.commit(tid)?;

    Ok(())
}

#[test]
fn test_concurrent_writers_serialize_with_retry() -> Result<()> {
    const THREADS: u64 = 4;
    const ROUNDS: u64 = 10;

    let file = NamedTempFile::new()?;
    let db = Database::with_lock_timeout(8, Duration::from_millis(100));
    let table_id = db.register_table("counter", file.path())?;

    let tid = db.begin_transaction();
    db.buffer_pool().insert_tuple(tid, table_id, &row(0))?;
    db.commit(tid)?;

    crossbeam::thread::scope(|scope| {
        for thread in 0..THREADS {
            let db = &db;
            scope.spawn(move |_| {
                for round in 0..ROUNDS {
                    // Timed-out transactions abort and retry from scratch
                    loop {
                        let tid = db.begin_transaction();
                        match db
                            .buffer_pool()
                            .insert_tuple(tid, table_id, &row((thread * ROUNDS + round) as i64))
                        {
                            Ok(_) => {
                                db.commit(tid).unwrap();
                                break;
                            }
                            Err(e) if e.is_transaction_abort() => {
                                db.abort(tid).unwrap();
                            }
                            Err(e) => panic!("insert failed: {}", e),
                        }
                    }
                }
            });
        }
    })
    .unwrap();

    assert_eq!(count_rows(&db, table_id)?, (1 + THREADS * ROUNDS) as usize);
    Ok(())
}

use anyhow::Result;

use burrowdb::{Database, Field, Operator, Tuple};

fn main() -> Result<()> {
    // Create a database with a 64-page buffer pool
    let db = Database::new(64);
    let table_id = db.register_table("demo", "demo.db")?;

    // Insert a few rows under one transaction
    let tid = db.begin_transaction();
    for i in 0..5 {
        let tuple = Tuple::new(vec![Field::Int(i), Field::Text(format!("row-{}", i))]);
        let rid = db.buffer_pool().insert_tuple(tid, table_id, &tuple)?;
        println!("inserted tuple at page {} slot {}", rid.page, rid.slot);
    }
    db.commit(tid)?;

    // Scan them back under a second transaction
    let tid = db.begin_transaction();
    let mut scan = db.scan(tid, table_id)?;
    scan.open()?;
    while let Some(tuple) = scan.next()? {
        let cells: Vec<String> = tuple.fields().iter().map(|f| f.to_string()).collect();
        println!("{}", cells.join(" | "));
    }
    scan.close()?;
    db.commit(tid)?;

    Ok(())
}

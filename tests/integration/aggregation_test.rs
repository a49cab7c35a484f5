use anyhow::Result;
use tempfile::NamedTempFile;

use burrowdb::{
    AggregateOp, Aggregator, Database, Field, FieldType, GroupBy, Operator, Tuple,
};

fn keyed(key: &str, value: i64) -> Tuple {
    Tuple::new(vec![Field::Text(key.to_string()), Field::Int(value)])
}

fn drain(agg: &Aggregator) -> Result<Vec<Vec<Field>>> {
    let mut iter = agg.iterator();
    iter.open()?;
    let mut rows = Vec::new();
    while let Some(tuple) = iter.next()? {
        rows.push(tuple.fields().to_vec());
    }
    iter.close()?;
    Ok(rows)
}

#[test]
fn test_sum_groups_by_key() -> Result<()> {
    let group_by = GroupBy {
        field: 0,
        field_type: FieldType::Text,
    };
    let mut agg = Aggregator::new(Some(group_by), 1, AggregateOp::Sum);
    for (key, value) in [("A", 1), ("B", 2), ("A", 3)] {
        agg.merge_tuple_into_group(&keyed(key, value))?;
    }

    assert_eq!(
        drain(&agg)?,
        vec![
            vec![Field::Text("A".to_string()), Field::Int(4)],
            vec![Field::Text("B".to_string()), Field::Int(2)],
        ]
    );
    Ok(())
}

#[test]
fn test_count_without_grouping() -> Result<()> {
    let mut agg = Aggregator::new(None, 1, AggregateOp::Count);
    for (key, value) in [("A", 1), ("B", 2), ("A", 3)] {
        agg.merge_tuple_into_group(&keyed(key, value))?;
    }

    assert_eq!(drain(&agg)?, vec![vec![Field::Int(3)]]);
    Ok(())
}

#[test]
fn test_min_and_max() -> Result<()> {
    let group_by = GroupBy {
        field: 0,
        field_type: FieldType::Text,
    };
    let rows = [("A", 5), ("A", -2), ("B", 7), ("A", 3)];

    let mut min = Aggregator::new(Some(group_by), 1, AggregateOp::Min);
    let mut max = Aggregator::new(Some(group_by), 1, AggregateOp::Max);
    for (key, value) in rows {
        min.merge_tuple_into_group(&keyed(key, value))?;
        max.merge_tuple_into_group(&keyed(key, value))?;
    }

    assert_eq!(
        drain(&min)?,
        vec![
            vec![Field::Text("A".to_string()), Field::Int(-2)],
            vec![Field::Text("B".to_string()), Field::Int(7)],
        ]
    );
    assert_eq!(
        drain(&max)?,
        vec![
            vec![Field::Text("A".to_string()), Field::Int(5)],
            vec![Field::Text("B".to_string()), Field::Int(7)],
        ]
    );
    Ok(())
}

#[test]
fn test_avg_uses_integer_division() -> Result<()> {
    let group_by = GroupBy {
        field: 0,
        field_type: FieldType::Text,
    };
    let mut agg = Aggregator::new(Some(group_by), 1, AggregateOp::Avg);
    for (key, value) in [("A", 1), ("A", 2), ("B", 9)] {
        agg.merge_tuple_into_group(&keyed(key, value))?;
    }

    // 3 / 2 truncates to 1
    assert_eq!(
        drain(&agg)?,
        vec![
            vec![Field::Text("A".to_string()), Field::Int(1)],
            vec![Field::Text("B".to_string()), Field::Int(9)],
        ]
    );
    Ok(())
}

#[test]
fn test_group_type_mismatch_is_rejected() -> Result<()> {
    let group_by = GroupBy {
        field: 0,
        field_type: FieldType::Int,
    };
    let mut agg = Aggregator::new(Some(group_by), 1, AggregateOp::Sum);
    assert!(agg.merge_tuple_into_group(&keyed("A", 1)).is_err());
    Ok(())
}

#[test]
fn test_aggregate_over_table_scan() -> Result<()> {
    let file = NamedTempFile::new()?;
    let db = Database::new(16);
    let table_id = db.register_table("sales", file.path())?;

    let tid = db.begin_transaction();
    for (region, amount) in [("east", 10), ("west", 20), ("east", 5), ("west", 1)] {
        db.buffer_pool()
            .insert_tuple(tid, table_id, &keyed(region, amount))?;
    }
    db.commit(tid)?;

    let tid = db.begin_transaction();
    let group_by = GroupBy {
        field: 0,
        field_type: FieldType::Text,
    };
    let mut agg = Aggregator::new(Some(group_by), 1, AggregateOp::Sum);
    let mut scan = db.scan(tid, table_id)?;
    scan.open()?;
    while let Some(tuple) = scan.next()? {
        agg.merge_tuple_into_group(&tuple)?;
    }
    scan.close()?;
    db.commit(tid)?;

    assert_eq!(
        drain(&agg)?,
        vec![
            vec![Field::Text("east".to_string()), Field::Int(15)],
            vec![Field::Text("west".to_string()), Field::Int(21)],
        ]
    );
    Ok(())
}

// Grouped Aggregation Operator
//
// Folds tuples into per-group running state and yields one result row per
// group.

use linked_hash_map::LinkedHashMap;

use crate::query::executor::operators::TupleListIterator;
use crate::query::executor::result::{QueryError, QueryResult};
use crate::storage::tuple::{Field, FieldType, Tuple};

/// Aggregate operators. All of them fold integer fields; COUNT also
/// accepts text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

/// Grouping configuration: which field to group on and its declared type.
#[derive(Debug, Clone, Copy)]
pub struct GroupBy {
    pub field: usize,
    pub field_type: FieldType,
}

/// Running state for one group
#[derive(Debug, Clone)]
struct GroupState {
    count: i64,
    sum: i64,
    min: i64,
    max: i64,
}

/// Groups tuples by an optional key field and folds one aggregate over
/// them. With no grouping configured, everything lands in a single
/// implicit group. Results come back in first-seen group order.
pub struct Aggregator {
    group_by: Option<GroupBy>,
    agg_field: usize,
    op: AggregateOp,
    groups: LinkedHashMap<Option<Field>, GroupState>,
}

impl Aggregator {
    pub fn new(group_by: Option<GroupBy>, agg_field: usize, op: AggregateOp) -> Self {
        Self {
            group_by,
            agg_field,
            op,
            groups: LinkedHashMap::new(),
        }
    }

    /// Fold one tuple into its group's running state. The group field must
    /// match the declared type; Sum/Min/Max/Avg reject non-integer
    /// aggregate fields. Both checks happen here, at merge time.
    pub fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> QueryResult<()> {
        let key = match self.group_by {
            None => None,
            Some(group_by) => {
                let field = tuple
                    .field(group_by.field)
                    .ok_or(QueryError::FieldOutOfRange(group_by.field))?;
                if field.field_type() != group_by.field_type {
                    return Err(QueryError::GroupTypeMismatch {
                        declared: group_by.field_type,
                        found: field.field_type(),
                    });
                }
                Some(field.clone())
            }
        };

        let field = tuple
            .field(self.agg_field)
            .ok_or(QueryError::FieldOutOfRange(self.agg_field))?;
        let value = match (self.op, field) {
            (AggregateOp::Count, _) => 0,
            (_, Field::Int(value)) => *value,
            (_, Field::Text(_)) => return Err(QueryError::IntegerAggregateRequired),
        };

        match self.groups.get_mut(&key) {
            Some(state) => {
                state.count += 1;
                match self.op {
                    AggregateOp::Count => {}
                    AggregateOp::Sum | AggregateOp::Avg => state.sum += value,
                    AggregateOp::Min => state.min = state.min.min(value),
                    AggregateOp::Max => state.max = state.max.max(value),
                }
            }
            None => {
                self.groups.insert(
                    key,
                    GroupState {
                        count: 1,
                        sum: value,
                        min: value,
                        max: value,
                    },
                );
            }
        }
        Ok(())
    }

    /// One result row per group, in first-seen order: `(group, value)`
    /// when grouping, a single `(value)` row otherwise. Zero merged tuples
    /// yield an empty iterator. AVG divides the running sum by the running
    /// count in integer arithmetic, truncating toward zero.
    pub fn iterator(&self) -> TupleListIterator {
        let mut rows = Vec::with_capacity(self.groups.len());
        for (key, state) in self.groups.iter() {
            let value = Field::Int(self.result_of(state));
            rows.push(match key {
                Some(group) => Tuple::new(vec![group.clone(), value]),
                None => Tuple::new(vec![value]),
            });
        }
        TupleListIterator::new(rows)
    }

    fn result_of(&self, state: &GroupState) -> i64 {
        match self.op {
            AggregateOp::Count => state.count,
            AggregateOp::Sum => state.sum,
            AggregateOp::Min => state.min,
            AggregateOp::Max => state.max,
            AggregateOp::Avg => state.sum / state.count,
        }
    }
}

//! Projection and aggregation over final key lists.

use tabula_core::ast::{Aggregate, DataType};

use crate::error::{EngineError, Result};
use crate::relation::Relation;
use crate::value::Value;

/// Materializes one column of a relation for the given keys, in key order.
#[must_use]
pub fn fetch_column(relation: &Relation, keys: &[Value], column: &str) -> Vec<Value> {
    keys.iter()
        .filter_map(|key| relation.value_of(key, column).cloned())
        .collect()
}

/// Folds a column with an aggregate. Returns `None` over an empty input;
/// aggregates of nothing produce an empty output column.
///
/// # Errors
///
/// Returns [`EngineError::AggregateType`] for `SUM`/`AVG` over a VARCHAR
/// column.
pub fn aggregate(
    agg: Aggregate,
    values: &[Value],
    data_type: DataType,
    column: &str,
) -> Result<Option<Value>> {
    if matches!(agg, Aggregate::Sum | Aggregate::Avg) && !data_type.is_numeric() {
        return Err(EngineError::AggregateType {
            aggregate: String::from(agg.as_str()),
            column: String::from(column),
            data_type,
        });
    }
    if values.is_empty() {
        return Ok(None);
    }

    let folded = match agg {
        Aggregate::Min => values
            .iter()
            .min_by(|a, b| a.compare(b))
            .cloned(),
        Aggregate::Max => values
            .iter()
            .max_by(|a, b| a.compare(b))
            .cloned(),
        Aggregate::Sum => Some(sum(values)),
        Aggregate::Avg => {
            let total: f64 = values.iter().filter_map(Value::as_f64).sum();
            #[allow(clippy::cast_precision_loss)]
            Some(Value::Float(total / values.len() as f64))
        }
    };
    Ok(folded)
}

/// Sums numeric values; integers stay integral unless the total overflows.
fn sum(values: &[Value]) -> Value {
    let mut int_total = Some(0i64);
    let mut float_total = 0f64;
    for value in values {
        match value {
            Value::Int(i) => {
                int_total = int_total.and_then(|t| t.checked_add(*i));
                #[allow(clippy::cast_precision_loss)]
                {
                    float_total += *i as f64;
                }
            }
            Value::Float(x) => {
                int_total = None;
                float_total += x;
            }
            Value::Str(_) => {}
        }
    }
    int_total.map_or(Value::Float(float_total), Value::Int)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|i| Value::Int(*i)).collect()
    }

    #[test]
    fn test_avg_of_ints_is_float() {
        let result = aggregate(Aggregate::Avg, &ints(&[1, 2, 3, 4, 5]), DataType::Int, "x")
            .unwrap()
            .unwrap();
        assert_eq!(result, Value::Float(3.0));
    }

    #[test]
    fn test_min_max_on_strings() {
        let values = vec![
            Value::Str(String::from("pear")),
            Value::Str(String::from("apple")),
        ];
        assert_eq!(
            aggregate(Aggregate::Min, &values, DataType::Varchar(8), "s")
                .unwrap()
                .unwrap(),
            Value::Str(String::from("apple"))
        );
        assert_eq!(
            aggregate(Aggregate::Max, &values, DataType::Varchar(8), "s")
                .unwrap()
                .unwrap(),
            Value::Str(String::from("pear"))
        );
    }

    #[test]
    fn test_sum_of_strings_rejected() {
        let values = vec![Value::Str(String::from("a"))];
        assert!(matches!(
            aggregate(Aggregate::Sum, &values, DataType::Varchar(1), "s"),
            Err(EngineError::AggregateType { .. })
        ));
    }

    #[test]
    fn test_empty_input_folds_to_none() {
        assert_eq!(
            aggregate(Aggregate::Sum, &[], DataType::Int, "x").unwrap(),
            None
        );
    }

    #[test]
    fn test_integer_sum_stays_integral() {
        assert_eq!(
            aggregate(Aggregate::Sum, &ints(&[1, 2, 3]), DataType::Int, "x")
                .unwrap()
                .unwrap(),
            Value::Int(6)
        );
    }
}

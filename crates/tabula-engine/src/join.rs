//! Cost-based equi-join over candidate key sets.
//!
//! Inputs are two candidate key lists with a join column each. The planner
//! estimates `nested = |A|·|B|` against
//! `merge = |A|·log|A| + |B|·log|B| + |A| + |B|` and picks the cheaper
//! strategy. Key comparisons are counted on the outcome so planner behavior
//! is observable.

use std::cell::Cell;

use tracing::debug;

use crate::error::Result;
use crate::relation::Relation;
use crate::value::Value;

/// The two join strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrategy {
    /// Double scan with the smaller set as the outer loop.
    NestedLoop,
    /// Sort both sides, advance twin cursors.
    SortMerge,
}

/// One side of a join: a relation, its candidate keys, and the join column.
#[derive(Debug, Clone, Copy)]
pub struct JoinInput<'a> {
    /// The owning relation.
    pub relation: &'a Relation,
    /// Candidate primary keys.
    pub keys: &'a [Value],
    /// The join column; resolved through row bodies when not the key.
    pub column: &'a str,
}

/// The positional pairing produced by a join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    /// Matched keys of the left input, pairwise with `right_keys`.
    pub left_keys: Vec<Value>,
    /// Matched keys of the right input.
    pub right_keys: Vec<Value>,
    /// The strategy the planner chose.
    pub strategy: JoinStrategy,
    /// Key comparisons performed, including sort comparisons.
    pub comparisons: u64,
}

/// Picks the cheaper strategy for the given input sizes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn choose_strategy(left_len: usize, right_len: usize) -> JoinStrategy {
    let l = left_len as f64;
    let r = right_len as f64;
    let nested_cost = l * r;
    let merge_cost = l * l.max(1.0).log2() + r * r.max(1.0).log2() + l + r;
    if merge_cost < nested_cost {
        JoinStrategy::SortMerge
    } else {
        JoinStrategy::NestedLoop
    }
}

/// Joins two candidate key sets on equality of their join-column values.
///
/// Either input may be empty, yielding an empty pairing. Duplicate values
/// on both sides emit their full cross product.
///
/// # Errors
///
/// Propagates column resolution errors from the inputs.
pub fn execute(left: JoinInput<'_>, right: JoinInput<'_>) -> Result<JoinOutcome> {
    let left_resolved = resolve(&left)?;
    let right_resolved = resolve(&right)?;

    let strategy = choose_strategy(left_resolved.len(), right_resolved.len());
    debug!(
        ?strategy,
        left = left_resolved.len(),
        right = right_resolved.len(),
        "join planned"
    );

    match strategy {
        JoinStrategy::NestedLoop => Ok(nested_loop(&left_resolved, &right_resolved)),
        JoinStrategy::SortMerge => Ok(sort_merge(left_resolved, right_resolved)),
    }
}

/// Materializes `(join value, key)` pairs for one side. When the join
/// column is the primary key the value is the key itself; otherwise it is
/// read from the row body.
fn resolve(input: &JoinInput<'_>) -> Result<Vec<(Value, Value)>> {
    input.relation.position(input.column)?;
    let pairs = if input.relation.is_primary_key(input.column) {
        input
            .keys
            .iter()
            .map(|k| (k.clone(), k.clone()))
            .collect()
    } else {
        input
            .keys
            .iter()
            .filter_map(|k| {
                input
                    .relation
                    .value_of(k, input.column)
                    .map(|v| (v.clone(), k.clone()))
            })
            .collect()
    };
    Ok(pairs)
}

fn nested_loop(left: &[(Value, Value)], right: &[(Value, Value)]) -> JoinOutcome {
    let mut left_keys = Vec::new();
    let mut right_keys = Vec::new();
    let mut comparisons = 0u64;

    // Smaller set drives the outer loop.
    if left.len() <= right.len() {
        for (lv, lk) in left {
            for (rv, rk) in right {
                comparisons += 1;
                if lv.matches(rv) {
                    left_keys.push(lk.clone());
                    right_keys.push(rk.clone());
                }
            }
        }
    } else {
        for (rv, rk) in right {
            for (lv, lk) in left {
                comparisons += 1;
                if lv.matches(rv) {
                    left_keys.push(lk.clone());
                    right_keys.push(rk.clone());
                }
            }
        }
    }

    JoinOutcome {
        left_keys,
        right_keys,
        strategy: JoinStrategy::NestedLoop,
        comparisons,
    }
}

fn sort_merge(mut left: Vec<(Value, Value)>, mut right: Vec<(Value, Value)>) -> JoinOutcome {
    let counter = Cell::new(0u64);
    let counting = |a: &(Value, Value), b: &(Value, Value)| {
        counter.set(counter.get() + 1);
        a.0.compare(&b.0)
    };
    left.sort_by(counting);
    right.sort_by(counting);

    let mut left_keys = Vec::new();
    let mut right_keys = Vec::new();
    let mut comparisons = counter.get();

    let (mut i, mut j) = (0usize, 0usize);
    while i < left.len() && j < right.len() {
        comparisons += 1;
        match left[i].0.compare(&right[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                // Extend over duplicate runs on both sides and emit the
                // full cross product of the matching block.
                let mut i_end = i + 1;
                while i_end < left.len() && {
                    comparisons += 1;
                    left[i_end].0.matches(&left[i].0)
                } {
                    i_end += 1;
                }
                let mut j_end = j + 1;
                while j_end < right.len() && {
                    comparisons += 1;
                    right[j_end].0.matches(&right[j].0)
                } {
                    j_end += 1;
                }
                for l in &left[i..i_end] {
                    for r in &right[j..j_end] {
                        left_keys.push(l.1.clone());
                        right_keys.push(r.1.clone());
                    }
                }
                i = i_end;
                j = j_end;
            }
        }
    }

    JoinOutcome {
        left_keys,
        right_keys,
        strategy: JoinStrategy::SortMerge,
        comparisons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tabula_core::ast::{ColumnDef, DataType};

    fn relation(name: &str, keys: &[i64]) -> Relation {
        let mut rel = Relation::new(
            String::from(name),
            vec![ColumnDef {
                name: String::from("k"),
                data_type: DataType::Int,
            }],
            String::from("k"),
            HashMap::new(),
        )
        .unwrap();
        for k in keys {
            rel.insert_row(vec![Value::Int(*k)]);
        }
        rel
    }

    fn keys(rel: &Relation) -> Vec<Value> {
        rel.all_keys()
    }

    #[test]
    fn test_small_inputs_use_nested_loop() {
        assert_eq!(choose_strategy(4, 4), JoinStrategy::NestedLoop);
    }

    #[test]
    fn test_large_inputs_use_sort_merge() {
        assert_eq!(choose_strategy(1000, 1000), JoinStrategy::SortMerge);
    }

    #[test]
    fn test_empty_side_yields_empty_pairing() {
        let a = relation("a", &[1, 2]);
        let b = relation("b", &[]);
        let a_keys = keys(&a);
        let b_keys = keys(&b);
        let outcome = execute(
            JoinInput {
                relation: &a,
                keys: &a_keys,
                column: "k",
            },
            JoinInput {
                relation: &b,
                keys: &b_keys,
                column: "k",
            },
        )
        .unwrap();
        assert!(outcome.left_keys.is_empty());
        assert!(outcome.right_keys.is_empty());
    }

    #[test]
    fn test_strategies_agree_on_pairs() {
        let a = relation("a", &(0..300).collect::<Vec<_>>());
        let b = relation("b", &(150..450).collect::<Vec<_>>());
        let a_keys = keys(&a);
        let b_keys = keys(&b);

        let a_resolved = resolve(&JoinInput {
            relation: &a,
            keys: &a_keys,
            column: "k",
        })
        .unwrap();
        let b_resolved = resolve(&JoinInput {
            relation: &b,
            keys: &b_keys,
            column: "k",
        })
        .unwrap();

        let nested = nested_loop(&a_resolved, &b_resolved);
        let merged = sort_merge(a_resolved, b_resolved);

        let mut nested_pairs: Vec<_> = nested
            .left_keys
            .iter()
            .zip(&nested.right_keys)
            .collect();
        let mut merged_pairs: Vec<_> = merged
            .left_keys
            .iter()
            .zip(&merged.right_keys)
            .collect();
        nested_pairs.sort_by(|x, y| x.0.compare(y.0));
        merged_pairs.sort_by(|x, y| x.0.compare(y.0));
        assert_eq!(nested_pairs, merged_pairs);
        assert_eq!(nested.left_keys.len(), 150);
    }

    #[test]
    fn test_sort_merge_comparison_bound() {
        let n = 1000i64;
        let a = relation("a", &(0..n).collect::<Vec<_>>());
        let b = relation("b", &(0..n).collect::<Vec<_>>());
        let a_keys = keys(&a);
        let b_keys = keys(&b);
        let outcome = execute(
            JoinInput {
                relation: &a,
                keys: &a_keys,
                column: "k",
            },
            JoinInput {
                relation: &b,
                keys: &b_keys,
                column: "k",
            },
        )
        .unwrap();
        assert_eq!(outcome.strategy, JoinStrategy::SortMerge);
        assert_eq!(outcome.left_keys.len(), 1000);
        // Far below the quadratic bound; on the order of n log n.
        #[allow(clippy::cast_sign_loss)]
        let quadratic = (n * n) as u64;
        assert!(outcome.comparisons < quadratic / 10);
    }

    #[test]
    fn test_duplicates_emit_cross_product() {
        // Join on a non-key column with duplicated values.
        let mut a = Relation::new(
            String::from("a"),
            vec![
                ColumnDef {
                    name: String::from("k"),
                    data_type: DataType::Int,
                },
                ColumnDef {
                    name: String::from("c"),
                    data_type: DataType::Varchar(3),
                },
            ],
            String::from("k"),
            HashMap::new(),
        )
        .unwrap();
        for (k, c) in [(1, "Red"), (2, "Red"), (3, "Blue")] {
            a.insert_row(vec![Value::Int(k), Value::Str(String::from(c))]);
        }
        let b = a.clone();

        let a_keys = a.all_keys();
        let b_keys = b.all_keys();
        let left = JoinInput {
            relation: &a,
            keys: &a_keys,
            column: "c",
        };
        let right = JoinInput {
            relation: &b,
            keys: &b_keys,
            column: "c",
        };
        let a_resolved = resolve(&left).unwrap();
        let b_resolved = resolve(&right).unwrap();

        // Red x Red gives 4 pairs, Blue x Blue gives 1.
        let nested = nested_loop(&a_resolved, &b_resolved);
        assert_eq!(nested.left_keys.len(), 5);
        let merged = sort_merge(a_resolved, b_resolved);
        assert_eq!(merged.left_keys.len(), 5);
    }
}

//! Combination of per-predicate candidate sets under the root connective.

use indexmap::IndexSet;
use tabula_core::ast::Connective;

use crate::error::Result;
use crate::join::{execute, JoinInput};
use crate::relation::Relation;
use crate::value::Value;

/// Reduces one relation's candidate sets to a single key list.
///
/// Under `AND` the sets are ordered by ascending size (most selective
/// first) and intersected pairwise; each intersection is realized as a join
/// with the primary key on both sides, so large sets merge in
/// `O(n log n)`. Under `OR` the sets union with stable deduplication.
///
/// # Errors
///
/// Propagates join execution errors.
pub fn combine(
    relation: &Relation,
    connective: Connective,
    mut results: Vec<Vec<Value>>,
) -> Result<Vec<Value>> {
    match results.len() {
        0 => Ok(relation.all_keys()),
        1 => Ok(results.remove(0)),
        _ => match connective {
            Connective::And => {
                results.sort_by_key(Vec::len);
                let mut acc = results.remove(0);
                for next in &results {
                    if acc.is_empty() {
                        break;
                    }
                    let outcome = execute(
                        JoinInput {
                            relation,
                            keys: &acc,
                            column: relation.primary_key(),
                        },
                        JoinInput {
                            relation,
                            keys: next,
                            column: relation.primary_key(),
                        },
                    )?;
                    acc = outcome.left_keys;
                }
                Ok(acc)
            }
            Connective::Or => {
                let mut union: IndexSet<Value> = IndexSet::new();
                for result in results {
                    union.extend(result);
                }
                Ok(union.into_iter().collect())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tabula_core::ast::{ColumnDef, DataType};

    fn relation(keys: &[i64]) -> Relation {
        let mut rel = Relation::new(
            String::from("t"),
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

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|i| Value::Int(*i)).collect()
    }

    #[test]
    fn test_no_predicates_selects_full_domain() {
        let rel = relation(&[1, 2, 3]);
        let combined = combine(&rel, Connective::And, vec![]).unwrap();
        assert_eq!(combined, ints(&[1, 2, 3]));
    }

    #[test]
    fn test_and_intersects() {
        let rel = relation(&[1, 2, 3, 4, 5]);
        let combined = combine(
            &rel,
            Connective::And,
            vec![ints(&[1, 2, 3, 4]), ints(&[3, 4, 5]), ints(&[4, 3])],
        )
        .unwrap();
        let mut sorted = combined;
        sorted.sort_by(Value::compare);
        assert_eq!(sorted, ints(&[3, 4]));
    }

    #[test]
    fn test_and_with_empty_set_short_circuits() {
        let rel = relation(&[1, 2, 3]);
        let combined = combine(
            &rel,
            Connective::And,
            vec![ints(&[1, 2]), ints(&[]), ints(&[2, 3])],
        )
        .unwrap();
        assert!(combined.is_empty());
    }

    #[test]
    fn test_or_unions_stably() {
        let rel = relation(&[1, 2, 3, 4]);
        let combined = combine(
            &rel,
            Connective::Or,
            vec![ints(&[2, 1]), ints(&[3, 2]), ints(&[1])],
        )
        .unwrap();
        assert_eq!(combined, ints(&[2, 1, 3]));
    }
}

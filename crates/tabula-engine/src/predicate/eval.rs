//! Evaluation of compiled predicates against their owning relation.

use std::cmp::Ordering;

use indexmap::IndexSet;
use tabula_core::ast::CmpOp;

use super::{BoundExpr, CompiledPredicate, PatternShape, PredicateKind};
use crate::error::{EngineError, Result};
use crate::relation::Relation;
use crate::value::{apply_num_op, Value};

/// Per-row variable environment for expression evaluation.
enum Env<'a> {
    /// No columns referenced.
    Empty,
    /// Single-column predicates scan distinct values, so the environment is
    /// one binding.
    Single(&'a str, &'a Value),
    /// Multi-column predicates scan whole rows.
    Row(&'a Relation, &'a [Value]),
}

impl Env<'_> {
    fn lookup(&self, column: &str) -> Result<Value> {
        match self {
            Env::Empty => Err(EngineError::UnboundColumn(String::from(column))),
            Env::Single(name, value) => {
                if *name == column {
                    Ok((*value).clone())
                } else {
                    Err(EngineError::UnboundColumn(String::from(column)))
                }
            }
            Env::Row(relation, row) => {
                let position = relation.position(column)?;
                Ok(row[position].clone())
            }
        }
    }
}

fn eval_expr(expr: &BoundExpr, env: &Env<'_>) -> Result<Value> {
    match expr {
        BoundExpr::Literal(value) => Ok(value.clone()),
        BoundExpr::Column(column) => env.lookup(column),
        BoundExpr::Binary { left, op, right } => {
            let a = eval_expr(left, env)?;
            let b = eval_expr(right, env)?;
            apply_num_op(*op, &a, &b)
        }
        BoundExpr::Neg(inner) => {
            let v = eval_expr(inner, env)?;
            match v {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Float(x) => Ok(Value::Float(-x)),
                Value::Str(_) => Err(EngineError::StringArithmetic { op: "-" }),
            }
        }
    }
}

const fn cmp_matches(op: CmpOp, ordering: Ordering) -> bool {
    match op {
        CmpOp::Lt => matches!(ordering, Ordering::Less),
        CmpOp::LtEq => !matches!(ordering, Ordering::Greater),
        CmpOp::Gt => matches!(ordering, Ordering::Greater),
        CmpOp::GtEq => !matches!(ordering, Ordering::Less),
        CmpOp::Eq => matches!(ordering, Ordering::Equal),
        CmpOp::NotEq => !matches!(ordering, Ordering::Equal),
    }
}

/// Collects the keys selected by one matching column value: the value
/// itself when the column is the primary key, otherwise its bucket.
fn collect_value(relation: &Relation, column: &str, value: &Value, out: &mut IndexSet<Value>) {
    if relation.is_primary_key(column) {
        out.insert(value.clone());
    } else if let Some(bucket) = relation.bucket(column, value) {
        out.extend(bucket.iter().cloned());
    }
}

/// Evaluates one compiled predicate, producing a deduplicated candidate
/// list of the relation's primary keys in first-appearance order.
///
/// # Errors
///
/// Returns an evaluation error when an expression applies a numeric
/// operator to string values.
pub fn evaluate(predicate: &CompiledPredicate, relation: &Relation) -> Result<Vec<Value>> {
    let mut out: IndexSet<Value> = IndexSet::new();

    match &predicate.kind {
        PredicateKind::Compare {
            op,
            left,
            right,
            columns,
        } => match columns.as_slice() {
            // Constant condition: everything or nothing.
            [] => {
                let a = eval_expr(left, &Env::Empty)?;
                let b = eval_expr(right, &Env::Empty)?;
                if cmp_matches(*op, a.compare(&b)) {
                    out.extend(relation.all_keys());
                }
            }
            // One distinct column: test each distinct value once.
            [column] => {
                for value in relation.distinct_values(column) {
                    let env = Env::Single(column, value);
                    let a = eval_expr(left, &env)?;
                    let b = eval_expr(right, &env)?;
                    if cmp_matches(*op, a.compare(&b)) {
                        collect_value(relation, column, value, &mut out);
                    }
                }
            }
            // Several columns: build the environment from each row body.
            _ => {
                for (key, row) in relation.iter_rows() {
                    let env = Env::Row(relation, row);
                    let a = eval_expr(left, &env)?;
                    let b = eval_expr(right, &env)?;
                    if cmp_matches(*op, a.compare(&b)) {
                        out.insert(key.clone());
                    }
                }
            }
        },

        PredicateKind::Membership {
            column,
            values,
            negated,
        } => {
            if *negated {
                for value in relation.distinct_values(column) {
                    if !values.contains(value) {
                        collect_value(relation, column, value, &mut out);
                    }
                }
            } else if relation.is_primary_key(column) {
                for value in values {
                    if relation.contains_key(value) {
                        out.insert(value.clone());
                    }
                }
            } else {
                for value in values {
                    if let Some(bucket) = relation.bucket(column, value) {
                        out.extend(bucket.iter().cloned());
                    }
                }
            }
        }

        PredicateKind::Pattern {
            column,
            shape,
            needle,
            negated,
        } => {
            for value in relation.distinct_values(column) {
                let Value::Str(text) = value else { continue };
                let hit = match shape {
                    PatternShape::Prefix => text.starts_with(needle.as_str()),
                    PatternShape::Suffix => text.ends_with(needle.as_str()),
                    PatternShape::Contains => text.contains(needle.as_str()),
                };
                if hit != *negated {
                    collect_value(relation, column, value, &mut out);
                }
            }
        }
    }

    Ok(out.into_iter().collect())
}

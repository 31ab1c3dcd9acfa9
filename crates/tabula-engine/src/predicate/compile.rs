//! Normalization of `WHERE` leaves into compiled predicates.

use tabula_core::ast::{ArithExpr, ColumnRef, Condition, WhereClause};

use super::{BoundExpr, CompiledPredicate, PatternShape, PredicateKind};
use crate::binder::Binder;
use crate::error::{EngineError, Result};
use crate::value::Value;

/// Compiles every leaf of a `WHERE` clause.
///
/// # Errors
///
/// Returns a binding error for unresolved columns or a predicate spanning
/// two sources, and a semantic error for ill-typed `IN` literals or
/// malformed `LIKE` patterns.
pub fn compile(binder: &Binder<'_>, clause: &WhereClause) -> Result<Vec<CompiledPredicate>> {
    clause
        .conditions
        .iter()
        .map(|condition| compile_condition(binder, condition))
        .collect()
}

fn compile_condition(binder: &Binder<'_>, condition: &Condition) -> Result<CompiledPredicate> {
    match condition {
        Condition::Compare { left, op, right } => {
            let mut refs: Vec<&ColumnRef> = Vec::new();
            left.collect_columns(&mut refs);
            right.collect_columns(&mut refs);

            let mut binding: Option<String> = None;
            let mut columns = Vec::new();
            for column_ref in refs {
                let bound = binder.resolve(column_ref)?;
                match &binding {
                    Some(owner) if *owner != bound.binding => {
                        return Err(EngineError::PredicateSpansSources {
                            left: owner.clone(),
                            right: bound.binding,
                        });
                    }
                    Some(_) => {}
                    None => binding = Some(bound.binding.clone()),
                }
                if !columns.contains(&bound.column) {
                    columns.push(bound.column);
                }
            }

            // A condition with no column operands still needs an owner; it
            // charges the first source.
            let binding = match binding {
                Some(b) => b,
                None => binder
                    .first_binding()
                    .map(String::from)
                    .ok_or_else(|| EngineError::UnboundColumn(String::from("*")))?,
            };

            Ok(CompiledPredicate {
                binding,
                kind: PredicateKind::Compare {
                    op: *op,
                    left: bind_expr(left),
                    right: bind_expr(right),
                    columns,
                },
            })
        }

        Condition::InList {
            column,
            list,
            negated,
        } => {
            let bound = binder.resolve(column)?;
            let relation = binder.relation(&bound.binding)?;
            let data_type = relation.data_type(&bound.column)?;
            let values = list
                .iter()
                .map(|literal| Value::from_literal(literal, data_type))
                .collect::<Result<Vec<_>>>()?;
            Ok(CompiledPredicate {
                binding: bound.binding,
                kind: PredicateKind::Membership {
                    column: bound.column,
                    values,
                    negated: *negated,
                },
            })
        }

        Condition::Like {
            column,
            pattern,
            negated,
        } => {
            let bound = binder.resolve(column)?;
            let relation = binder.relation(&bound.binding)?;
            let data_type = relation.data_type(&bound.column)?;
            if data_type.is_numeric() {
                return Err(EngineError::PatternType {
                    column: bound.column,
                    data_type,
                });
            }

            let (shape, needle) = classify_pattern(pattern)?;
            Ok(CompiledPredicate {
                binding: bound.binding,
                kind: PredicateKind::Pattern {
                    column: bound.column,
                    shape,
                    needle,
                    negated: *negated,
                },
            })
        }
    }
}

/// Classifies a pattern into prefix, suffix, or contains. `%` is only
/// recognized at the ends; any other shape is rejected.
fn classify_pattern(pattern: &str) -> Result<(PatternShape, String)> {
    let (shape, needle) = if pattern.len() >= 2
        && pattern.starts_with('%')
        && pattern.ends_with('%')
    {
        (PatternShape::Contains, &pattern[1..pattern.len() - 1])
    } else if let Some(needle) = pattern.strip_suffix('%') {
        (PatternShape::Prefix, needle)
    } else if let Some(needle) = pattern.strip_prefix('%') {
        (PatternShape::Suffix, needle)
    } else {
        return Err(EngineError::InvalidPattern(String::from(pattern)));
    };

    if needle.contains('%') {
        return Err(EngineError::InvalidPattern(String::from(pattern)));
    }
    Ok((shape, String::from(needle)))
}

/// Rewrites a parsed expression with column references reduced to the
/// column name; the owner is recorded on the predicate.
fn bind_expr(expr: &ArithExpr) -> BoundExpr {
    match expr {
        ArithExpr::Literal(literal) => BoundExpr::Literal(match literal {
            tabula_core::ast::Literal::Int(i) => Value::Int(*i),
            tabula_core::ast::Literal::Float(x) => Value::Float(*x),
            tabula_core::ast::Literal::Str(s) => Value::Str(s.clone()),
        }),
        ArithExpr::Column(column_ref) => BoundExpr::Column(column_ref.column.clone()),
        ArithExpr::Binary { left, op, right } => BoundExpr::Binary {
            left: Box::new(bind_expr(left)),
            op: *op,
            right: Box::new(bind_expr(right)),
        },
        ArithExpr::Neg(inner) => BoundExpr::Neg(Box::new(bind_expr(inner))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_pattern() {
        assert_eq!(
            classify_pattern("aa%").unwrap(),
            (PatternShape::Prefix, String::from("aa"))
        );
        assert_eq!(
            classify_pattern("%na").unwrap(),
            (PatternShape::Suffix, String::from("na"))
        );
        assert_eq!(
            classify_pattern("%an%").unwrap(),
            (PatternShape::Contains, String::from("an"))
        );
        assert!(classify_pattern("plain").is_err());
        assert!(classify_pattern("a%b").is_err());
    }
}

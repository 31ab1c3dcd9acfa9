//! The query pipeline: bind, compile, evaluate, combine, join, project.

use indexmap::IndexMap;
use serde::Serialize;
use tabula_core::ast::{Aggregate, Connective, Select, SourceRef, WhereClause};
use tracing::debug;

use crate::binder::Binder;
use crate::catalog::Catalog;
use crate::combine::combine;
use crate::error::{EngineError, Result};
use crate::join::{execute as execute_join, JoinInput};
use crate::predicate::{compile, evaluate};
use crate::project::{aggregate, fetch_column};
use crate::value::Value;

/// A query result: output column name -> ordered values, in projection
/// order. Aggregates yield single-element columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryOutput {
    /// The projected columns.
    pub columns: IndexMap<String, Vec<Value>>,
}

impl QueryOutput {
    /// Number of result rows (the length of the longest column).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.values().map(Vec::len).max().unwrap_or(0)
    }
}

/// One projection with its binding and output name settled.
struct ResolvedProjection {
    binding: String,
    column: String,
    aggregate: Option<Aggregate>,
    name: String,
}

/// Runs a `SELECT` against the catalog.
///
/// # Errors
///
/// Returns binding, semantic, or evaluation errors as described in the
/// error type.
pub fn run_select(catalog: &Catalog, select: &Select) -> Result<QueryOutput> {
    let binder = Binder::new(catalog, &select.sources)?;
    if binder.len() > 2 {
        return Err(EngineError::TooManySources);
    }
    if binder.len() == 2 && select.join.is_none() {
        return Err(EngineError::MissingJoin);
    }
    if binder.len() == 1 && select.join.is_some() {
        return Err(EngineError::JoinBinding);
    }

    let final_keys = resolve_keys(&binder, select)?;
    let projections = resolve_projections(&binder, select)?;

    let has_aggregate = projections.iter().any(|p| p.aggregate.is_some());
    let has_plain = projections.iter().any(|p| p.aggregate.is_none());
    if has_aggregate && has_plain {
        return Err(EngineError::MixedProjection);
    }

    let mut output = QueryOutput::default();
    for projection in projections {
        let relation = binder.relation(&projection.binding)?;
        let keys = final_keys
            .get(&projection.binding)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let values = fetch_column(relation, keys, &projection.column);

        let values = match projection.aggregate {
            Some(agg) => {
                let data_type = relation.data_type(&projection.column)?;
                aggregate(agg, &values, data_type, &projection.column)?
                    .map(|v| vec![v])
                    .unwrap_or_default()
            }
            None => values,
        };
        output.columns.insert(projection.name, values);
    }

    debug!(rows = output.row_count(), "query finished");
    Ok(output)
}

/// Produces the final key list per binding: per-predicate candidate sets,
/// combined per relation, then joined when two sources are present.
fn resolve_keys(binder: &Binder<'_>, select: &Select) -> Result<IndexMap<String, Vec<Value>>> {
    let connective = select
        .where_clause
        .as_ref()
        .map_or(Connective::And, |w| w.connective);

    let mut per_binding: IndexMap<String, Vec<Vec<Value>>> = binder
        .sources()
        .map(|(binding, _)| (String::from(binding), Vec::new()))
        .collect();

    if let Some(clause) = &select.where_clause {
        for predicate in compile(binder, clause)? {
            let relation = binder.relation(&predicate.binding)?;
            let candidates = evaluate(&predicate, relation)?;
            debug!(
                binding = %predicate.binding,
                candidates = candidates.len(),
                "predicate evaluated"
            );
            if let Some(results) = per_binding.get_mut(&predicate.binding) {
                results.push(candidates);
            }
        }
    }

    let mut combined: IndexMap<String, Vec<Value>> = IndexMap::new();
    for (binding, results) in per_binding {
        let relation = binder.relation(&binding)?;
        combined.insert(binding, combine(relation, connective, results)?);
    }

    if let Some(join) = &select.join {
        let left_bound = binder.resolve(&join.left)?;
        let right_bound = binder.resolve(&join.right)?;
        let bindings: Vec<String> = binder.sources().map(|(b, _)| String::from(b)).collect();

        // The join condition must name one column of each source.
        let (first, second) = if left_bound.binding == bindings[0]
            && right_bound.binding == bindings[1]
        {
            (left_bound, right_bound)
        } else if left_bound.binding == bindings[1] && right_bound.binding == bindings[0] {
            (right_bound, left_bound)
        } else {
            return Err(EngineError::JoinBinding);
        };

        let left_relation = binder.relation(&first.binding)?;
        let right_relation = binder.relation(&second.binding)?;
        let outcome = execute_join(
            JoinInput {
                relation: left_relation,
                keys: &combined[&first.binding],
                column: &first.column,
            },
            JoinInput {
                relation: right_relation,
                keys: &combined[&second.binding],
                column: &second.column,
            },
        )?;
        combined.insert(first.binding, outcome.left_keys);
        combined.insert(second.binding, outcome.right_keys);
    }

    Ok(combined)
}

/// Expands `*` and settles output names.
fn resolve_projections(
    binder: &Binder<'_>,
    select: &Select,
) -> Result<Vec<ResolvedProjection>> {
    let mut resolved = Vec::new();

    for projection in &select.projections {
        if projection.column.column == "*" {
            if projection.aggregate.is_some() {
                return Err(EngineError::AggregateStar);
            }
            let bindings: Vec<String> = match &projection.column.qualifier {
                Some(qualifier) => {
                    binder.relation(qualifier)?;
                    vec![qualifier.clone()]
                }
                None => binder.sources().map(|(b, _)| String::from(b)).collect(),
            };
            for binding in bindings {
                let relation = binder.relation(&binding)?;
                for column in relation.columns() {
                    // Over a join, expanded names are prefixed with the
                    // relation name to keep the two sides apart.
                    let name = if binder.len() > 1 {
                        format!("{}.{}", relation.name(), column.name)
                    } else {
                        column.name.clone()
                    };
                    resolved.push(ResolvedProjection {
                        binding: binding.clone(),
                        column: column.name.clone(),
                        aggregate: None,
                        name,
                    });
                }
            }
            continue;
        }

        let bound = binder.resolve(&projection.column)?;
        let name = projection.alias.clone().unwrap_or_else(|| {
            projection.aggregate.map_or_else(
                || projection.column.to_string(),
                |agg| format!("{agg}({})", projection.column),
            )
        });
        resolved.push(ResolvedProjection {
            binding: bound.binding,
            column: bound.column,
            aggregate: projection.aggregate,
            name,
        });
    }

    Ok(resolved)
}

/// Evaluates a `WHERE` clause against one relation and returns the
/// selected primary keys. An absent clause selects every row. Shared by
/// `UPDATE` and `DELETE`.
pub(crate) fn candidate_keys(
    catalog: &Catalog,
    table: &str,
    where_clause: Option<&WhereClause>,
) -> Result<Vec<Value>> {
    let sources = [SourceRef {
        table: String::from(table),
        alias: None,
    }];
    let binder = Binder::new(catalog, &sources)?;
    let relation = binder.relation(table)?;

    let Some(clause) = where_clause else {
        return Ok(relation.all_keys());
    };

    let mut results = Vec::new();
    for predicate in compile(&binder, clause)? {
        results.push(evaluate(&predicate, relation)?);
    }
    combine(relation, clause.connective, results)
}

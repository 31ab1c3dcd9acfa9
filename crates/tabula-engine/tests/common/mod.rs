#![allow(dead_code)]

use tabula_engine::{Database, Outcome, QueryOutput, Value};

/// Runs a script where every command must succeed, returning the outcomes.
pub fn run_all(db: &mut Database, script: &str) -> Vec<Outcome> {
    db.execute_script(script)
        .into_iter()
        .map(|r| r.unwrap_or_else(|e| panic!("command failed: {e}")))
        .collect()
}

/// Runs a single query and returns its result.
pub fn query(db: &mut Database, command: &str) -> QueryOutput {
    let mut outcomes = run_all(db, command);
    match outcomes.pop() {
        Some(Outcome::Rows(output)) => output,
        other => panic!("expected rows, got {other:?}"),
    }
}

/// Runs a single command and returns its error.
pub fn fail(db: &mut Database, command: &str) -> tabula_engine::EngineError {
    let mut results = db.execute_script(command);
    match results.pop() {
        Some(Err(e)) => e,
        other => panic!("expected failure, got {other:?}"),
    }
}

pub fn strs(values: &[&str]) -> Vec<Value> {
    values
        .iter()
        .map(|s| Value::Str(String::from(*s)))
        .collect()
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|i| Value::Int(*i)).collect()
}

/// Checks the storage invariants of one relation through the public API:
/// bucket sizes sum to the row count, every row's key sits in the bucket of
/// each of its values exactly once, and FK values resolve in their parents.
pub fn assert_consistent(db: &Database, table: &str) {
    let relation = db.catalog().get(table).unwrap();
    let keys = relation.all_keys();
    assert_eq!(keys.len(), relation.row_count());

    for column in relation.columns() {
        if relation.is_primary_key(&column.name) {
            continue;
        }

        let bucket_total: usize = relation
            .distinct_values(&column.name)
            .map(|value| relation.bucket(&column.name, value).map_or(0, <[Value]>::len))
            .sum();
        assert_eq!(
            bucket_total,
            relation.row_count(),
            "bucket sizes of {table}.{} must cover every row",
            column.name
        );

        for key in &keys {
            let value = relation.value_of(key, &column.name).unwrap();
            let bucket = relation.bucket(&column.name, value).unwrap();
            assert_eq!(
                bucket.iter().filter(|k| *k == key).count(),
                1,
                "key {key:?} must appear exactly once in its {table}.{} bucket",
                column.name
            );
        }
    }

    for (fk_column, fk) in relation.foreign_keys() {
        let parent = db.catalog().get(&fk.parent_table).unwrap();
        for key in &keys {
            let value = relation.value_of(key, fk_column).unwrap();
            assert!(
                parent.contains_key(value),
                "FK value {value:?} of {table}.{fk_column} must exist in {}",
                fk.parent_table
            );
        }
    }
}

/// Checks every relation currently registered.
pub fn assert_all_consistent(db: &Database) {
    let names: Vec<String> = db.catalog().names().map(String::from).collect();
    for name in names {
        assert_consistent(db, &name);
    }
}

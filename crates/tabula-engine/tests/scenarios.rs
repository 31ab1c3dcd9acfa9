//! End-to-end command scenarios.

mod common;
use common::*;

use tabula_engine::{Database, EngineError, Value};

#[test]
fn schema_insert_select() {
    let mut db = Database::new();
    run_all(
        &mut db,
        "CREATE TABLE t (id INT, name VARCHAR(3), PRIMARY KEY (id));
         INSERT INTO t (id,name) VALUES (1,abc);
         INSERT INTO t (id,name) VALUES (2,def);",
    );
    let output = query(&mut db, "SELECT name FROM t WHERE id < 2;");
    assert_eq!(output.columns["name"], strs(&["abc"]));
    assert_all_consistent(&db);
}

#[test]
fn foreign_key_insert_rejected() {
    let mut db = Database::new();
    run_all(
        &mut db,
        "CREATE TABLE p (k INT, PRIMARY KEY(k));
         CREATE TABLE c (k INT, FOREIGN KEY (k) REFERENCES p(k), PRIMARY KEY(k));",
    );
    let error = fail(&mut db, "INSERT INTO c (k) VALUES (7);");
    assert!(matches!(error, EngineError::ForeignKeyViolation { .. }));
    assert_eq!(db.catalog().get("c").unwrap().row_count(), 0);
    assert_all_consistent(&db);
}

#[test]
fn cascade_delete_empties_children() {
    let mut db = Database::new();
    run_all(
        &mut db,
        "CREATE TABLE p (k INT, PRIMARY KEY(k));
         CREATE TABLE c (k INT, FOREIGN KEY (k) REFERENCES p(k), PRIMARY KEY(k));
         INSERT INTO p (k) VALUES (1);
         INSERT INTO c (k) VALUES (1);
         DELETE FROM p WHERE k == 1;",
    );
    let output = query(&mut db, "SELECT k FROM c;");
    assert_eq!(output.columns["k"], Vec::<Value>::new());
    assert_all_consistent(&db);
}

#[test]
fn cascade_delete_through_two_levels() {
    let mut db = Database::new();
    run_all(
        &mut db,
        "CREATE TABLE a (k INT, PRIMARY KEY(k));
         CREATE TABLE b (k INT, a_k INT, FOREIGN KEY (a_k) REFERENCES a(k), PRIMARY KEY(k));
         CREATE TABLE c (k INT, b_k INT, FOREIGN KEY (b_k) REFERENCES b(k), PRIMARY KEY(k));
         INSERT INTO a (k) VALUES (1);
         INSERT INTO b (k, a_k) VALUES (10, 1);
         INSERT INTO b (k, a_k) VALUES (11, 1);
         INSERT INTO c (k, b_k) VALUES (100, 10);
         DELETE FROM a WHERE k == 1;",
    );
    assert_eq!(db.catalog().get("a").unwrap().row_count(), 0);
    assert_eq!(db.catalog().get("b").unwrap().row_count(), 0);
    assert_eq!(db.catalog().get("c").unwrap().row_count(), 0);
    assert_all_consistent(&db);
}

#[test]
fn like_patterns() {
    let mut db = Database::new();
    run_all(
        &mut db,
        "CREATE TABLE f (name VARCHAR(10), PRIMARY KEY (name));
         INSERT INTO f (name) VALUES (apple);
         INSERT INTO f (name) VALUES (apricot);
         INSERT INTO f (name) VALUES (banana);",
    );
    let prefix = query(&mut db, "SELECT name FROM f WHERE name LIKE 'a%';");
    assert_eq!(prefix.columns["name"], strs(&["apple", "apricot"]));
    let suffix = query(&mut db, "SELECT name FROM f WHERE name LIKE '%na';");
    assert_eq!(suffix.columns["name"], strs(&["banana"]));
    let contains = query(&mut db, "SELECT name FROM f WHERE name LIKE '%an%';");
    assert_eq!(contains.columns["name"], strs(&["banana"]));
    let negated = query(&mut db, "SELECT name FROM f WHERE name NOT LIKE 'a%';");
    assert_eq!(negated.columns["name"], strs(&["banana"]));
}

#[test]
fn average_over_integers() {
    let mut db = Database::new();
    run_all(
        &mut db,
        "CREATE TABLE t (x INT, PRIMARY KEY (x));
         INSERT INTO t (x) VALUES (1);
         INSERT INTO t (x) VALUES (2);
         INSERT INTO t (x) VALUES (3);
         INSERT INTO t (x) VALUES (4);
         INSERT INTO t (x) VALUES (5);",
    );
    let output = query(&mut db, "SELECT AVG(x) FROM t;");
    assert_eq!(output.columns["AVG(x)"], vec![Value::Float(3.0)]);
}

// ===================================================================
// Round-trip laws
// ===================================================================

#[test]
fn insert_then_select_by_key_returns_the_row() {
    let mut db = Database::new();
    run_all(
        &mut db,
        "CREATE TABLE df2 (name VARCHAR(3), decimal FLOAT, state VARCHAR(10), year INT, \
         PRIMARY KEY (name));
         INSERT INTO df2 (name,decimal,state,year) VALUES (aab,0.2,Minnesota,2002);",
    );
    let output = query(&mut db, "SELECT * FROM df2 WHERE name == 'aab';");
    assert_eq!(output.columns["name"], strs(&["aab"]));
    assert_eq!(output.columns["decimal"], vec![Value::Float(0.2)]);
    assert_eq!(output.columns["state"], strs(&["Minnesota"]));
    assert_eq!(output.columns["year"], vec![Value::Int(2002)]);
}

#[test]
fn update_then_select_returns_new_value() {
    let mut db = Database::new();
    run_all(
        &mut db,
        "CREATE TABLE t (id INT, color VARCHAR(6), PRIMARY KEY (id));
         INSERT INTO t (id,color) VALUES (1,Red);
         INSERT INTO t (id,color) VALUES (2,Red);
         UPDATE t SET color = Blue WHERE id == 1;",
    );
    let output = query(&mut db, "SELECT color FROM t WHERE id == 1;");
    assert_eq!(output.columns["color"], strs(&["Blue"]));
    let reds = query(&mut db, "SELECT id FROM t WHERE color == 'Red';");
    assert_eq!(reds.columns["id"], ints(&[2]));
    assert_all_consistent(&db);
}

#[test]
fn varchar_values_truncate_to_declared_length() {
    let mut db = Database::new();
    run_all(
        &mut db,
        "CREATE TABLE t (id INT, state VARCHAR(6), PRIMARY KEY (id));
         INSERT INTO t (id,state) VALUES (1,Minnesota);",
    );
    let output = query(&mut db, "SELECT state FROM t;");
    assert_eq!(output.columns["state"], strs(&["Minnes"]));
}

#[test]
fn malformed_command_mid_script_leaves_the_rest_running() {
    let mut db = Database::new();
    let results = db.execute_script(
        "CREATE TABLE t (id INT, PRIMARY KEY (id));
         SELECT FROM WHERE;
         INSERT INTO t (id) VALUES (1);
         SELECT id FROM t;",
    );
    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(EngineError::Parse(_))));
    assert!(results[2].is_ok());
    let Ok(tabula_engine::Outcome::Rows(output)) = &results[3] else {
        panic!("expected rows, got {:?}", results[3]);
    };
    assert_eq!(output.columns["id"], ints(&[1]));
}

#[test]
fn every_mutation_preserves_invariants() {
    let mut db = Database::new();
    let script = "CREATE TABLE df1 (Letter VARCHAR(3), Number INT, Color VARCHAR(6), PRIMARY KEY (Letter));
         INSERT INTO df1 (Letter,Number,Color) VALUES (aab,10,Red);
         INSERT INTO df1 (Letter,Number,Color) VALUES (aac,20,Red);
         INSERT INTO df1 (Letter,Number,Color) VALUES (aad,30,Blue);
         CREATE TABLE df2 (name VARCHAR(3), year INT, FOREIGN KEY (name) REFERENCES df1(Letter), PRIMARY KEY (name));
         INSERT INTO df2 (name,year) VALUES (aab,2002);
         UPDATE df1 SET Color = Green WHERE Number > 15;
         DELETE FROM df1 WHERE Letter == 'aac';";
    for command in script.split(';').filter(|c| !c.trim().is_empty()) {
        run_all(&mut db, &format!("{command};"));
        assert_all_consistent(&db);
    }
}

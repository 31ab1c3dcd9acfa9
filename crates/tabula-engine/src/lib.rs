//! # tabula-engine
//!
//! An in-memory relational engine behind the tabula command language.
//!
//! Storage is a doubly-keyed column index: each relation holds row bodies
//! under the primary-key column and an inverted index (value -> bucket of
//! primary keys) under every other column. Equality predicates and `IN`
//! lists resolve through bucket lookups; range and pattern predicates scan
//! distinct values only. Queries flow through predicate compilation,
//! per-predicate candidate sets, a conjunctive/disjunctive combiner, and a
//! cost-based join planner choosing nested-loop or sort-merge.
//!
//! ```rust
//! use tabula_engine::{Database, Outcome};
//!
//! let mut db = Database::new();
//! let results = db.execute_script(
//!     "CREATE TABLE t (id INT, name VARCHAR(3), PRIMARY KEY (id));
//!      INSERT INTO t (id, name) VALUES (1, abc);
//!      SELECT name FROM t WHERE id < 2;",
//! );
//! assert!(results.iter().all(Result::is_ok));
//! ```

pub mod binder;
pub mod catalog;
pub mod combine;
pub mod database;
pub mod error;
pub mod ingest;
pub mod join;
pub mod predicate;
pub mod project;
pub mod query;
pub mod relation;
pub mod value;

pub use catalog::Catalog;
pub use database::{Database, Outcome};
pub use error::{EngineError, Result};
pub use join::{JoinOutcome, JoinStrategy};
pub use query::QueryOutput;
pub use relation::Relation;
pub use value::Value;

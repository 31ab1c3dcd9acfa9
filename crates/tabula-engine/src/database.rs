//! The session type: owns the catalog and executes commands.

use tabula_core::ast::Command;
use tabula_core::Parser;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::ingest;
use crate::query::{candidate_keys, run_select, QueryOutput};

/// What a successfully executed command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `CREATE TABLE` registered a relation.
    TableCreated(String),
    /// `DROP TABLE` removed a relation (and, transitively, its children).
    TableDropped(String),
    /// `LOAD` ingested this many rows.
    Loaded {
        /// Target relation.
        table: String,
        /// Rows ingested.
        rows: usize,
    },
    /// `INSERT` stored one row.
    Inserted {
        /// Target relation.
        table: String,
    },
    /// `UPDATE` rewrote this many rows.
    Updated {
        /// Target relation.
        table: String,
        /// Rows rewritten.
        rows: usize,
    },
    /// `DELETE` removed this many rows across the cascade.
    Deleted {
        /// Target relation.
        table: String,
        /// Rows removed, children included.
        rows: usize,
    },
    /// `SELECT` produced a result.
    Rows(QueryOutput),
}

/// An in-memory database session. Commands execute synchronously in the
/// order submitted; a failed command leaves the catalog consistent and
/// later commands proceed.
#[derive(Debug, Default)]
pub struct Database {
    catalog: Catalog,
}

impl Database {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Executes one parsed command.
    ///
    /// # Errors
    ///
    /// Returns the engine error that aborted the command; the catalog is
    /// left as it was before the command started, except for a `LOAD`
    /// which keeps the rows ingested before the failing one.
    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        debug!(?command, "executing");
        match command {
            Command::CreateTable(def) => {
                let name = def.name.clone();
                self.catalog.create_table(def)?;
                Ok(Outcome::TableCreated(name))
            }
            Command::DropTable { name } => {
                self.catalog.drop_table(&name)?;
                Ok(Outcome::TableDropped(name))
            }
            Command::Load(load) => {
                let rows = ingest::load(&mut self.catalog, &load)?;
                Ok(Outcome::Loaded {
                    table: load.table,
                    rows,
                })
            }
            Command::Insert(insert) => {
                self.catalog
                    .insert(&insert.table, &insert.columns, &insert.values)?;
                Ok(Outcome::Inserted {
                    table: insert.table,
                })
            }
            Command::Select(select) => {
                let output = run_select(&self.catalog, &select)?;
                Ok(Outcome::Rows(output))
            }
            Command::Update(update) => {
                let keys =
                    candidate_keys(&self.catalog, &update.table, update.where_clause.as_ref())?;
                let rows = self
                    .catalog
                    .update_keys(&update.table, &update.assignments, &keys)?;
                Ok(Outcome::Updated {
                    table: update.table,
                    rows,
                })
            }
            Command::Delete(delete) => {
                let keys =
                    candidate_keys(&self.catalog, &delete.table, delete.where_clause.as_ref())?;
                let rows = self.catalog.delete_keys(&delete.table, &keys)?;
                Ok(Outcome::Deleted {
                    table: delete.table,
                    rows,
                })
            }
        }
    }

    /// Parses and executes a `;`-separated script, one result per command.
    /// Commands parse and run independently: a failing command, parse
    /// errors included, yields an error in its own slot while the commands
    /// before and after it still run.
    #[must_use]
    pub fn execute_script(&mut self, input: &str) -> Vec<Result<Outcome>> {
        let mut results = Vec::new();
        for chunk in split_commands(input) {
            match Parser::new(chunk).parse_script() {
                Ok(commands) => {
                    for command in commands {
                        results.push(self.execute(command));
                    }
                }
                Err(e) => results.push(Err(e.into())),
            }
        }
        results
    }
}

/// Splits a script into `;`-delimited command texts. Quoted literals may
/// contain `;`, so the split tracks quote state rather than splitting
/// blindly on the byte.
fn split_commands(input: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                ';' => {
                    chunks.push(&input[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    if start < input.len() {
        chunks.push(&input[start..]);
    }
    chunks.retain(|chunk| !chunk.trim().is_empty());
    chunks
}

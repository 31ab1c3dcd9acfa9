//! Command AST types.

use std::fmt;

use super::expr::{ColumnRef, Literal, WhereClause};
use super::types::ColumnDef;

/// A foreign-key declaration in `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    /// The local column carrying the reference.
    pub column: String,
    /// The referenced relation.
    pub parent_table: String,
    /// The referenced column (the parent's primary key).
    pub parent_column: String,
}

/// `CREATE TABLE name (col TYPE, …, PRIMARY KEY (col), FOREIGN KEY (col) REFERENCES other(col))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    /// Relation name.
    pub name: String,
    /// Ordered column declarations.
    pub columns: Vec<ColumnDef>,
    /// The primary-key column.
    pub primary_key: String,
    /// Foreign-key declarations.
    pub foreign_keys: Vec<ForeignKeyDef>,
}

/// `LOAD DATA [LOCAL] INFILE 'path' INTO TABLE name …`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Load {
    /// Target relation.
    pub table: String,
    /// Path of the delimited input file.
    pub path: String,
    /// Field separator (`FIELDS TERMINATED BY`); defaults to `,`.
    pub field_separator: char,
    /// Line terminator (`LINES TERMINATED BY`); defaults to `\n`.
    pub line_terminator: char,
    /// Number of leading rows to skip (`IGNORE n ROWS`).
    pub skip_rows: usize,
}

/// `INSERT INTO name (col, …) VALUES (v, …)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    /// Target relation.
    pub table: String,
    /// Named columns, in the order values are supplied.
    pub columns: Vec<String>,
    /// Values, one per named column.
    pub values: Vec<Literal>,
}

/// An aggregate function in a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Sum of values (numeric columns only).
    Sum,
    /// Arithmetic mean (numeric columns only).
    Avg,
}

impl Aggregate {
    /// Returns the aggregate's canonical upper-case spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One projected column, e.g. `min(a.Letter) as minimum`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// The projected column; `*` parses as a bare column named `*`.
    pub column: ColumnRef,
    /// Aggregate applied to the column, if any.
    pub aggregate: Option<Aggregate>,
    /// Output alias (`AS name`).
    pub alias: Option<String>,
}

/// One entry of the `FROM` list, e.g. `df2 AS b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Relation name.
    pub table: String,
    /// Alias; defaults to the relation name when omitted.
    pub alias: Option<String>,
}

impl SourceRef {
    /// Returns the name this source binds to in qualified references.
    #[must_use]
    pub fn binding(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// The equi-join condition of `JOIN ON a.c = b.c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    /// Left join column, alias-qualified.
    pub left: ColumnRef,
    /// Right join column, alias-qualified.
    pub right: ColumnRef,
}

/// `SELECT projlist FROM src [,src] [JOIN ON a.c = b.c] [WHERE conds]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// Projected columns.
    pub projections: Vec<Projection>,
    /// Source relations (one or two).
    pub sources: Vec<SourceRef>,
    /// Join condition; required when two sources are listed.
    pub join: Option<JoinSpec>,
    /// Filter predicates.
    pub where_clause: Option<WhereClause>,
}

/// `UPDATE name SET col=val,… [WHERE conds]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// Target relation.
    pub table: String,
    /// `SET` assignments, in declaration order.
    pub assignments: Vec<(String, Literal)>,
    /// Filter predicates; an absent clause selects every row.
    pub where_clause: Option<WhereClause>,
}

/// `DELETE FROM name [WHERE conds]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    /// Target relation.
    pub table: String,
    /// Filter predicates; an absent clause selects every row.
    pub where_clause: Option<WhereClause>,
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Schema definition.
    CreateTable(CreateTable),
    /// Schema removal (cascades through child relations).
    DropTable {
        /// Relation to drop.
        name: String,
    },
    /// Bulk ingest from a delimited file.
    Load(Load),
    /// Single-row insertion.
    Insert(Insert),
    /// Projection query.
    Select(Select),
    /// Row mutation.
    Update(Update),
    /// Row removal (cascades through FK children).
    Delete(Delete),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_binding() {
        let aliased = SourceRef {
            table: String::from("df2"),
            alias: Some(String::from("b")),
        };
        let plain = SourceRef {
            table: String::from("df2"),
            alias: None,
        };
        assert_eq!(aliased.binding(), "b");
        assert_eq!(plain.binding(), "df2");
    }

    #[test]
    fn test_aggregate_spelling() {
        assert_eq!(Aggregate::Avg.as_str(), "AVG");
        assert_eq!(Aggregate::Min.to_string(), "MIN");
    }
}

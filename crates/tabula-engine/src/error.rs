//! Error types for the engine.

use tabula_core::ast::DataType;
use tabula_core::ParseError;

use crate::value::Value;

/// Errors surfaced while executing commands.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The command text did not parse.
    #[error("{0}")]
    Parse(#[from] ParseError),

    // --- schema errors ---
    /// `CREATE TABLE` with a name already registered.
    #[error("table {0} already exists")]
    DuplicateTable(String),

    /// A command referenced a relation the catalog does not hold.
    #[error("table {0} does not exist")]
    UnknownTable(String),

    /// A command referenced a column the relation does not declare.
    #[error("column {column} does not exist in table {table}")]
    UnknownColumn {
        /// The relation searched.
        table: String,
        /// The missing column.
        column: String,
    },

    /// Duplicate column name in a `CREATE TABLE`.
    #[error("duplicate column {column} in table {table}")]
    DuplicateColumn {
        /// The relation being created.
        table: String,
        /// The repeated column.
        column: String,
    },

    /// A foreign key referencing something other than the parent's primary key.
    #[error("foreign key on {column} must reference the primary key of {parent}")]
    ForeignKeyTarget {
        /// The local FK column.
        column: String,
        /// The referenced relation.
        parent: String,
    },

    // --- constraint errors ---
    /// Insert of a primary-key value already present.
    #[error("duplicate primary key value {value} in table {table}")]
    DuplicateKey {
        /// The relation inserted into.
        table: String,
        /// The offending key.
        value: Value,
    },

    /// Insert of an FK value absent from the parent relation.
    #[error("value {value} is not present in foreign key table {parent}, column {parent_column}")]
    ForeignKeyViolation {
        /// The offending value.
        value: Value,
        /// The referenced relation.
        parent: String,
        /// The referenced column.
        parent_column: String,
    },

    /// A value could not be converted to the column's declared type.
    #[error("cannot convert value '{value}' to {data_type}")]
    TypeConversion {
        /// The raw value.
        value: String,
        /// The declared type.
        data_type: DataType,
    },

    /// Row width differs from the relation's column count.
    #[error("row of length {got} does not match {table} column count of {want}")]
    ArityMismatch {
        /// The relation inserted into.
        table: String,
        /// Supplied value count.
        got: usize,
        /// Declared column count.
        want: usize,
    },

    // --- binding errors ---
    /// A qualifier that names no source of the query.
    #[error("alias {0} is not bound to a table")]
    UnknownAlias(String),

    /// Two sources bound to the same alias.
    #[error("duplicate source binding {0}")]
    DuplicateBinding(String),

    /// An unqualified column present in no source relation.
    #[error("column {0} does not exist in any source table")]
    UnboundColumn(String),

    /// An unqualified column present in more than one source relation.
    #[error("column {0} is ambiguous across the source tables")]
    AmbiguousColumn(String),

    /// A single condition referencing columns of two sources.
    #[error("condition references columns of both {left} and {right}")]
    PredicateSpansSources {
        /// One source binding.
        left: String,
        /// The other source binding.
        right: String,
    },

    /// A projection mixing aggregates with plain columns.
    #[error("cannot mix aggregate and plain columns in one projection")]
    MixedProjection,

    /// An aggregate applied to `*`.
    #[error("cannot apply an aggregate to *")]
    AggregateStar,

    // --- semantic errors ---
    /// Aggregate applied to an unsupported column type.
    #[error("cannot apply {aggregate} to column {column} of type {data_type}")]
    AggregateType {
        /// The aggregate requested.
        aggregate: String,
        /// The projected column.
        column: String,
        /// Its declared type.
        data_type: DataType,
    },

    /// `UPDATE` assigning the primary-key column.
    #[error("cannot assign to primary key column {column} of table {table}")]
    PrimaryKeyAssignment {
        /// The relation updated.
        table: String,
        /// Its primary-key column.
        column: String,
    },

    /// Two sources listed without a `JOIN ON` condition.
    #[error("two source tables require a JOIN ON condition")]
    MissingJoin,

    /// More than two sources listed.
    #[error("queries over more than two tables are not supported")]
    TooManySources,

    /// The two join columns did not bind to the two distinct sources.
    #[error("join condition must name one column of each source table")]
    JoinBinding,

    /// A `LIKE` pattern outside the prefix/suffix/contains grammar.
    #[error("unsupported LIKE pattern '{0}'")]
    InvalidPattern(String),

    /// `LIKE` against a non-string column.
    #[error("LIKE requires a VARCHAR column, {column} is {data_type}")]
    PatternType {
        /// The tested column.
        column: String,
        /// Its declared type.
        data_type: DataType,
    },

    /// A numeric operator applied to a string operand.
    #[error("numeric operator {op} applied to string value")]
    StringArithmetic {
        /// The operator.
        op: &'static str,
    },

    /// A separator character outside the ASCII range.
    #[error("separator '{0}' is not an ASCII character")]
    InvalidSeparator(char),

    // --- I/O errors ---
    /// The input file of a `LOAD` was missing or unreadable.
    #[error("cannot read input file: {0}")]
    Io(#[from] std::io::Error),

    /// A malformed row in a `LOAD` input file.
    #[error("malformed input row: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

//! Predicate expression AST types.

use std::fmt;

/// A literal value appearing in a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// String literal. Bare identifiers in value positions parse as strings.
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "'{s}'"),
        }
    }
}

/// A column reference, optionally qualified by a source alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Source alias (the `a` in `a.Letter`), if qualified.
    pub qualifier: Option<String>,
    /// Column name; case is preserved.
    pub column: String,
}

impl ColumnRef {
    /// Creates an unqualified column reference.
    #[must_use]
    pub fn bare(column: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            column: column.into(),
        }
    }

    /// Creates a qualified column reference.
    #[must_use]
    pub fn qualified(qualifier: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{q}.{}", self.column),
            None => f.write_str(&self.column),
        }
    }
}

/// Numeric operators usable inside a predicate expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

impl NumOp {
    /// Returns the operator's surface spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ==
    Eq,
    /// !=
    NotEq,
}

impl CmpOp {
    /// Returns the operator's surface spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Eq => "==",
            Self::NotEq => "!=",
        }
    }
}

/// An arithmetic expression over column references and numeric literals.
#[derive(Debug, Clone, PartialEq)]
pub enum ArithExpr {
    /// A literal operand.
    Literal(Literal),
    /// A column operand.
    Column(ColumnRef),
    /// A binary numeric operation.
    Binary {
        /// Left operand.
        left: Box<ArithExpr>,
        /// Operator.
        op: NumOp,
        /// Right operand.
        right: Box<ArithExpr>,
    },
    /// Unary negation.
    Neg(Box<ArithExpr>),
}

impl ArithExpr {
    /// Collects every column referenced by the expression, in order of
    /// first appearance.
    pub fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Self::Literal(_) => {}
            Self::Column(c) => {
                if !out.contains(&c) {
                    out.push(c);
                }
            }
            Self::Binary { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Self::Neg(inner) => inner.collect_columns(out),
        }
    }
}

/// A leaf condition of a `WHERE` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Arithmetic comparison, e.g. `b.decimal * 800 + b.year < 1910`.
    Compare {
        /// Left-hand expression.
        left: ArithExpr,
        /// Comparison operator.
        op: CmpOp,
        /// Right-hand expression.
        right: ArithExpr,
    },
    /// Set membership, e.g. `state IN ('Iowa', 'Minnesota')`.
    InList {
        /// The tested column.
        column: ColumnRef,
        /// Listed literals; cast to the column type at compile time.
        list: Vec<Literal>,
        /// True for `NOT IN`.
        negated: bool,
    },
    /// Pattern match, e.g. `name LIKE 'aa%'`.
    Like {
        /// The tested column.
        column: ColumnRef,
        /// Raw pattern text including `%` markers.
        pattern: String,
        /// True for `NOT LIKE`.
        negated: bool,
    },
}

/// Root connective of a `WHERE` clause. Mixing the two at one level is
/// rejected by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connective {
    /// All conditions must hold.
    #[default]
    And,
    /// At least one condition must hold.
    Or,
}

/// A parsed `WHERE` clause: leaf conditions under a single root connective.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    /// The root connective. Irrelevant when only one condition is present.
    pub connective: Connective,
    /// The leaf conditions.
    pub conditions: Vec<Condition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_ref_display() {
        assert_eq!(ColumnRef::bare("name").to_string(), "name");
        assert_eq!(ColumnRef::qualified("a", "Letter").to_string(), "a.Letter");
    }

    #[test]
    fn test_collect_columns_dedups() {
        let expr = ArithExpr::Binary {
            left: Box::new(ArithExpr::Column(ColumnRef::bare("x"))),
            op: NumOp::Add,
            right: Box::new(ArithExpr::Column(ColumnRef::bare("x"))),
        };
        let mut cols = Vec::new();
        expr.collect_columns(&mut cols);
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].column, "x");
    }
}

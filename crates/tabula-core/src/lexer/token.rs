//! Token and keyword definitions for the command language.

use super::Span;

/// Keywords of the command language, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    // DDL
    Create,
    Table,
    Drop,
    Primary,
    Key,
    Foreign,
    References,

    // Bulk ingest
    Load,
    Data,
    Local,
    Infile,
    Into,
    Ignore,
    Rows,
    Fields,
    Terminated,
    By,
    Lines,

    // DML
    Insert,
    Values,
    Update,
    Set,
    Delete,

    // Queries
    Select,
    From,
    Where,
    Join,
    On,
    As,

    // Predicates
    And,
    Or,
    In,
    Not,
    Like,

    // Types
    Int,
    Float,
    Varchar,

    // Aggregates
    Min,
    Max,
    Sum,
    Avg,
}

impl Keyword {
    /// Attempts to parse a keyword from a string (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Some(Self::Create),
            "TABLE" => Some(Self::Table),
            "DROP" => Some(Self::Drop),
            "PRIMARY" => Some(Self::Primary),
            "KEY" => Some(Self::Key),
            "FOREIGN" => Some(Self::Foreign),
            "REFERENCES" => Some(Self::References),
            "LOAD" => Some(Self::Load),
            "DATA" => Some(Self::Data),
            "LOCAL" => Some(Self::Local),
            "INFILE" => Some(Self::Infile),
            "INTO" => Some(Self::Into),
            "IGNORE" => Some(Self::Ignore),
            "ROWS" => Some(Self::Rows),
            "FIELDS" => Some(Self::Fields),
            "TERMINATED" => Some(Self::Terminated),
            "BY" => Some(Self::By),
            "LINES" => Some(Self::Lines),
            "INSERT" => Some(Self::Insert),
            "VALUES" => Some(Self::Values),
            "UPDATE" => Some(Self::Update),
            "SET" => Some(Self::Set),
            "DELETE" => Some(Self::Delete),
            "SELECT" => Some(Self::Select),
            "FROM" => Some(Self::From),
            "WHERE" => Some(Self::Where),
            "JOIN" => Some(Self::Join),
            "ON" => Some(Self::On),
            "AS" => Some(Self::As),
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "IN" => Some(Self::In),
            "NOT" => Some(Self::Not),
            "LIKE" => Some(Self::Like),
            "INT" => Some(Self::Int),
            "FLOAT" => Some(Self::Float),
            "VARCHAR" => Some(Self::Varchar),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            "SUM" => Some(Self::Sum),
            "AVG" => Some(Self::Avg),
            _ => None,
        }
    }

    /// Returns the keyword as its canonical upper-case spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Table => "TABLE",
            Self::Drop => "DROP",
            Self::Primary => "PRIMARY",
            Self::Key => "KEY",
            Self::Foreign => "FOREIGN",
            Self::References => "REFERENCES",
            Self::Load => "LOAD",
            Self::Data => "DATA",
            Self::Local => "LOCAL",
            Self::Infile => "INFILE",
            Self::Into => "INTO",
            Self::Ignore => "IGNORE",
            Self::Rows => "ROWS",
            Self::Fields => "FIELDS",
            Self::Terminated => "TERMINATED",
            Self::By => "BY",
            Self::Lines => "LINES",
            Self::Insert => "INSERT",
            Self::Values => "VALUES",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::Delete => "DELETE",
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Join => "JOIN",
            Self::On => "ON",
            Self::As => "AS",
            Self::And => "AND",
            Self::Or => "OR",
            Self::In => "IN",
            Self::Not => "NOT",
            Self::Like => "LIKE",
            Self::Int => "INT",
            Self::Float => "FLOAT",
            Self::Varchar => "VARCHAR",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
        }
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal (e.g., 42)
    Integer(i64),
    /// Float literal (e.g., 3.14 or .05)
    Float(f64),
    /// String literal (e.g., 'hello' or "hello")
    String(String),

    // Identifiers and keywords
    /// Identifier; case is preserved.
    Identifier(String),
    /// Command-language keyword.
    Keyword(Keyword),

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// = (assignment in UPDATE SET)
    Eq,
    /// == (equality comparison)
    EqEq,
    /// !=
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,

    // Special
    /// End of input
    Eof,
    /// Invalid/unknown token
    Error(String),
}

/// A token with its span in the command text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the command text.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Keyword::from_str("SELECT"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("select"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("TeRmInAtEd"), Some(Keyword::Terminated));
        assert_eq!(Keyword::from_str("emissions"), None);
    }

    #[test]
    fn test_keyword_as_str() {
        assert_eq!(Keyword::Varchar.as_str(), "VARCHAR");
        assert_eq!(Keyword::Avg.as_str(), "AVG");
    }

    #[test]
    fn test_token_as_keyword() {
        let kw = Token::new(TokenKind::Keyword(Keyword::Where), Span::new(0, 5));
        let comma = Token::new(TokenKind::Comma, Span::new(0, 1));
        assert_eq!(kw.as_keyword(), Some(Keyword::Where));
        assert_eq!(comma.as_keyword(), None);
    }
}

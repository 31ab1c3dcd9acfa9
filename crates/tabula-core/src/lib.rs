//! # tabula-core
//!
//! The command language of the tabula in-memory relational engine.
//!
//! This crate provides:
//! - A hand-written lexer producing spanned tokens
//! - A typed command AST (DDL, bulk load, insert, select, update, delete)
//! - A recursive-descent parser over the token stream
//!
//! Keywords are case-insensitive; identifiers preserve case; commands are
//! delimited by `;`.
//!
//! ```rust
//! use tabula_core::{Command, Parser};
//!
//! let mut parser = Parser::new("SELECT name FROM t WHERE id < 2");
//! let command = parser.parse_command().unwrap();
//! assert!(matches!(command, Command::Select(_)));
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Command, WhereClause};
pub use lexer::{Keyword, Lexer, Span, Token, TokenKind};
pub use parser::{ParseError, Parser};

//! Command parser implementation.

use super::error::ParseError;
use crate::ast::{
    Aggregate, ArithExpr, CmpOp, ColumnDef, ColumnRef, Command, Condition, Connective,
    CreateTable, DataType, Delete, ForeignKeyDef, Insert, JoinSpec, Literal, Load, NumOp,
    Projection, Select, SourceRef, Update, WhereClause,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// Recursive-descent parser over the token stream.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self { lexer, current }
    }

    /// Parses a `;`-separated script into a list of commands.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` for the first malformed command.
    pub fn parse_script(&mut self) -> Result<Vec<Command>, ParseError> {
        let mut commands = Vec::new();
        loop {
            while self.check(&TokenKind::Semicolon) {
                self.advance();
            }
            if self.current.is_eof() {
                break;
            }
            commands.push(self.parse_command()?);
            if !self.check(&TokenKind::Semicolon) && !self.current.is_eof() {
                return Err(ParseError::unexpected(
                    "';'",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        }
        Ok(commands)
    }

    /// Parses a single command.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a valid command.
    pub fn parse_command(&mut self) -> Result<Command, ParseError> {
        match self.current.as_keyword() {
            Some(Keyword::Create) => self.parse_create_table(),
            Some(Keyword::Drop) => self.parse_drop_table(),
            Some(Keyword::Load) => self.parse_load(),
            Some(Keyword::Insert) => self.parse_insert(),
            Some(Keyword::Select) => Ok(Command::Select(self.parse_select()?)),
            Some(Keyword::Update) => self.parse_update(),
            Some(Keyword::Delete) => self.parse_delete(),
            _ => Err(ParseError::unexpected(
                "CREATE, DROP, LOAD, INSERT, SELECT, UPDATE, or DELETE",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    // ===============================================================
    // DDL
    // ===============================================================

    fn parse_create_table(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LeftParen)?;

        let mut columns = Vec::new();
        let mut primary_key: Option<String> = None;
        let mut foreign_keys = Vec::new();

        loop {
            match self.current.as_keyword() {
                Some(Keyword::Primary) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    self.expect(&TokenKind::LeftParen)?;
                    let col = self.expect_identifier()?;
                    self.expect(&TokenKind::RightParen)?;
                    if primary_key.replace(col).is_some() {
                        return Err(ParseError::new(
                            "duplicate PRIMARY KEY clause",
                            self.current.span,
                        ));
                    }
                }
                Some(Keyword::Foreign) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    self.expect(&TokenKind::LeftParen)?;
                    let column = self.expect_identifier()?;
                    self.expect(&TokenKind::RightParen)?;
                    self.expect_keyword(Keyword::References)?;
                    let parent_table = self.expect_identifier()?;
                    self.expect(&TokenKind::LeftParen)?;
                    let parent_column = self.expect_identifier()?;
                    self.expect(&TokenKind::RightParen)?;
                    foreign_keys.push(ForeignKeyDef {
                        column,
                        parent_table,
                        parent_column,
                    });
                }
                _ => {
                    let col_name = self.expect_identifier()?;
                    let data_type = self.parse_data_type()?;
                    columns.push(ColumnDef {
                        name: col_name,
                        data_type,
                    });
                }
            }

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;

        let primary_key = primary_key.ok_or_else(|| {
            ParseError::new(
                format!("CREATE TABLE {name} is missing a PRIMARY KEY clause"),
                self.current.span,
            )
        })?;

        Ok(Command::CreateTable(CreateTable {
            name,
            columns,
            primary_key,
            foreign_keys,
        }))
    }

    fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let dtype = match self.current.as_keyword() {
            Some(Keyword::Int) => {
                self.advance();
                DataType::Int
            }
            Some(Keyword::Float) => {
                self.advance();
                DataType::Float
            }
            Some(Keyword::Varchar) => {
                self.advance();
                // Length defaults to 1 when omitted.
                if self.check(&TokenKind::LeftParen) {
                    self.advance();
                    let len = self.expect_integer()?;
                    self.expect(&TokenKind::RightParen)?;
                    if len < 1 {
                        return Err(ParseError::new(
                            format!("invalid VARCHAR length {len}"),
                            self.current.span,
                        ));
                    }
                    #[allow(clippy::cast_sign_loss)]
                    DataType::Varchar(len as usize)
                } else {
                    DataType::Varchar(1)
                }
            }
            _ => {
                return Err(ParseError::unexpected(
                    "INT, FLOAT, or VARCHAR",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };
        Ok(dtype)
    }

    fn parse_drop_table(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword(Keyword::Drop)?;
        self.expect_keyword(Keyword::Table)?;
        let name = self.expect_identifier()?;
        Ok(Command::DropTable { name })
    }

    // ===============================================================
    // Bulk ingest
    // ===============================================================

    fn parse_load(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword(Keyword::Load)?;
        self.expect_keyword(Keyword::Data)?;
        if self.check_keyword(Keyword::Local) {
            self.advance();
        }
        self.expect_keyword(Keyword::Infile)?;
        let path = self.expect_string()?;
        self.expect_keyword(Keyword::Into)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.expect_identifier()?;

        let mut field_separator = ',';
        let mut line_terminator = '\n';
        let mut skip_rows = 0usize;

        loop {
            match self.current.as_keyword() {
                Some(Keyword::Fields) => {
                    self.advance();
                    self.expect_keyword(Keyword::Terminated)?;
                    self.expect_keyword(Keyword::By)?;
                    field_separator = self.parse_separator()?;
                }
                Some(Keyword::Lines) => {
                    self.advance();
                    self.expect_keyword(Keyword::Terminated)?;
                    self.expect_keyword(Keyword::By)?;
                    line_terminator = self.parse_separator()?;
                }
                Some(Keyword::Ignore) => {
                    self.advance();
                    let n = self.expect_integer()?;
                    self.expect_keyword(Keyword::Rows)?;
                    if n < 0 {
                        return Err(ParseError::new(
                            format!("invalid IGNORE count {n}"),
                            self.current.span,
                        ));
                    }
                    #[allow(clippy::cast_sign_loss)]
                    {
                        skip_rows = n as usize;
                    }
                }
                _ => break,
            }
        }

        Ok(Command::Load(Load {
            table,
            path,
            field_separator,
            line_terminator,
            skip_rows,
        }))
    }

    /// Parses a quoted separator literal into a single character. The escape
    /// spellings `\n`, `\t`, and `\r` are accepted.
    fn parse_separator(&mut self) -> Result<char, ParseError> {
        let span = self.current.span;
        let raw = self.expect_string()?;
        match raw.as_str() {
            "\\n" => Ok('\n'),
            "\\t" => Ok('\t'),
            "\\r" => Ok('\r'),
            s => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(ParseError::new(
                        format!("separator must be a single character, got '{s}'"),
                        span,
                    )),
                }
            }
        }
    }

    // ===============================================================
    // DML
    // ===============================================================

    fn parse_insert(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table = self.expect_identifier()?;

        self.expect(&TokenKind::LeftParen)?;
        let mut columns = vec![self.expect_identifier()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            columns.push(self.expect_identifier()?);
        }
        self.expect(&TokenKind::RightParen)?;

        self.expect_keyword(Keyword::Values)?;
        self.expect(&TokenKind::LeftParen)?;
        let mut values = vec![self.parse_literal()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            values.push(self.parse_literal()?);
        }
        self.expect(&TokenKind::RightParen)?;

        Ok(Command::Insert(Insert {
            table,
            columns,
            values,
        }))
    }

    fn parse_update(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword(Keyword::Update)?;
        let table = self.expect_identifier()?;
        self.expect_keyword(Keyword::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_literal()?;
            assignments.push((column, value));
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        let where_clause = self.parse_optional_where()?;
        Ok(Command::Update(Update {
            table,
            assignments,
            where_clause,
        }))
    }

    fn parse_delete(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier()?;
        let where_clause = self.parse_optional_where()?;
        Ok(Command::Delete(Delete {
            table,
            where_clause,
        }))
    }

    // ===============================================================
    // SELECT
    // ===============================================================

    fn parse_select(&mut self) -> Result<Select, ParseError> {
        self.expect_keyword(Keyword::Select)?;

        let mut projections = vec![self.parse_projection()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            projections.push(self.parse_projection()?);
        }

        self.expect_keyword(Keyword::From)?;
        let mut sources = vec![self.parse_source()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            sources.push(self.parse_source()?);
        }

        let join = if self.check_keyword(Keyword::Join) {
            self.advance();
            if self.check_keyword(Keyword::On) {
                self.advance();
            }
            let left = self.parse_column_ref()?;
            if self.check(&TokenKind::Eq) || self.check(&TokenKind::EqEq) {
                self.advance();
            } else {
                return Err(ParseError::unexpected(
                    "'=' in join condition",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
            let right = self.parse_column_ref()?;
            Some(JoinSpec { left, right })
        } else {
            None
        };

        let where_clause = self.parse_optional_where()?;

        // No Cartesian product: a second source requires a join condition.
        if sources.len() > 1 && join.is_none() {
            return Err(ParseError::new(
                "two source tables require a JOIN ON condition",
                self.current.span,
            ));
        }

        Ok(Select {
            projections,
            sources,
            join,
            where_clause,
        })
    }

    fn parse_projection(&mut self) -> Result<Projection, ParseError> {
        let aggregate = match self.current.as_keyword() {
            Some(Keyword::Min) => Some(Aggregate::Min),
            Some(Keyword::Max) => Some(Aggregate::Max),
            Some(Keyword::Sum) => Some(Aggregate::Sum),
            Some(Keyword::Avg) => Some(Aggregate::Avg),
            _ => None,
        };

        let column = if aggregate.is_some() {
            self.advance();
            self.expect(&TokenKind::LeftParen)?;
            let column = self.parse_column_ref()?;
            self.expect(&TokenKind::RightParen)?;
            column
        } else {
            self.parse_column_ref()?
        };

        let alias = if self.check_keyword(Keyword::As) {
            self.advance();
            Some(self.expect_identifier()?)
        } else {
            None
        };

        Ok(Projection {
            column,
            aggregate,
            alias,
        })
    }

    /// Parses `col`, `alias.col`, `*`, or `alias.*`.
    fn parse_column_ref(&mut self) -> Result<ColumnRef, ParseError> {
        if self.check(&TokenKind::Star) {
            self.advance();
            return Ok(ColumnRef::bare("*"));
        }

        let first = self.expect_identifier()?;
        if self.check(&TokenKind::Dot) {
            self.advance();
            if self.check(&TokenKind::Star) {
                self.advance();
                return Ok(ColumnRef::qualified(first, "*"));
            }
            let column = self.expect_identifier()?;
            Ok(ColumnRef::qualified(first, column))
        } else {
            Ok(ColumnRef::bare(first))
        }
    }

    fn parse_source(&mut self) -> Result<SourceRef, ParseError> {
        let table = self.expect_identifier()?;
        let alias = if self.check_keyword(Keyword::As) {
            self.advance();
            Some(self.expect_identifier()?)
        } else if matches!(&self.current.kind, TokenKind::Identifier(_)) {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        Ok(SourceRef { table, alias })
    }

    // ===============================================================
    // WHERE
    // ===============================================================

    fn parse_optional_where(&mut self) -> Result<Option<WhereClause>, ParseError> {
        if self.check_keyword(Keyword::Where) {
            self.advance();
            Ok(Some(self.parse_where()?))
        } else {
            Ok(None)
        }
    }

    /// Parses conditions under a single root connective. `AND` and `OR`
    /// cannot be mixed at one level.
    fn parse_where(&mut self) -> Result<WhereClause, ParseError> {
        let mut conditions = vec![self.parse_condition()?];
        let mut connective: Option<Connective> = None;

        loop {
            let next = match self.current.as_keyword() {
                Some(Keyword::And) => Connective::And,
                Some(Keyword::Or) => Connective::Or,
                _ => break,
            };
            if *connective.get_or_insert(next) != next {
                return Err(ParseError::new(
                    "cannot mix AND and OR in one WHERE clause",
                    self.current.span,
                ));
            }
            self.advance();
            conditions.push(self.parse_condition()?);
        }

        Ok(WhereClause {
            connective: connective.unwrap_or_default(),
            conditions,
        })
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        let left = self.parse_arith_expr()?;

        let negated = if self.check_keyword(Keyword::Not) {
            self.advance();
            true
        } else {
            false
        };

        match self.current.as_keyword() {
            Some(Keyword::In) => {
                self.advance();
                let column = Self::require_column(left, "IN")?;
                self.expect(&TokenKind::LeftParen)?;
                let mut list = vec![self.parse_literal()?];
                while self.check(&TokenKind::Comma) {
                    self.advance();
                    list.push(self.parse_literal()?);
                }
                self.expect(&TokenKind::RightParen)?;
                Ok(Condition::InList {
                    column,
                    list,
                    negated,
                })
            }
            Some(Keyword::Like) => {
                self.advance();
                let column = Self::require_column(left, "LIKE")?;
                let pattern = self.expect_string()?;
                Ok(Condition::Like {
                    column,
                    pattern,
                    negated,
                })
            }
            _ if negated => Err(ParseError::unexpected(
                "IN or LIKE after NOT",
                self.current.kind.clone(),
                self.current.span,
            )),
            _ => {
                let op = self.parse_cmp_op()?;
                let right = self.parse_arith_expr()?;
                Ok(Condition::Compare { left, op, right })
            }
        }
    }

    fn require_column(expr: ArithExpr, construct: &str) -> Result<ColumnRef, ParseError> {
        match expr {
            ArithExpr::Column(c) => Ok(c),
            other => Err(ParseError::new(
                format!("left side of {construct} must be a column, got {other:?}"),
                Span::default(),
            )),
        }
    }

    fn parse_cmp_op(&mut self) -> Result<CmpOp, ParseError> {
        let op = match &self.current.kind {
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::LtEq => CmpOp::LtEq,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::GtEq => CmpOp::GtEq,
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::NotEq => CmpOp::NotEq,
            other => {
                return Err(ParseError::unexpected(
                    "comparison operator",
                    other.clone(),
                    self.current.span,
                ));
            }
        };
        self.advance();
        Ok(op)
    }

    /// Parses `term { (+|-) term }`.
    fn parse_arith_expr(&mut self) -> Result<ArithExpr, ParseError> {
        let mut expr = self.parse_arith_term()?;
        loop {
            let op = match &self.current.kind {
                TokenKind::Plus => NumOp::Add,
                TokenKind::Minus => NumOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_arith_term()?;
            expr = ArithExpr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    /// Parses `factor { (*|/) factor }`.
    fn parse_arith_term(&mut self) -> Result<ArithExpr, ParseError> {
        let mut expr = self.parse_arith_factor()?;
        loop {
            let op = match &self.current.kind {
                TokenKind::Star => NumOp::Mul,
                TokenKind::Slash => NumOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_arith_factor()?;
            expr = ArithExpr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_arith_factor(&mut self) -> Result<ArithExpr, ParseError> {
        match &self.current.kind {
            TokenKind::Minus => {
                self.advance();
                let inner = self.parse_arith_factor()?;
                Ok(ArithExpr::Neg(Box::new(inner)))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_arith_expr()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(inner)
            }
            TokenKind::Integer(i) => {
                let value = *i;
                self.advance();
                Ok(ArithExpr::Literal(Literal::Int(value)))
            }
            TokenKind::Float(x) => {
                let value = *x;
                self.advance();
                Ok(ArithExpr::Literal(Literal::Float(value)))
            }
            TokenKind::String(s) => {
                let value = s.clone();
                self.advance();
                Ok(ArithExpr::Literal(Literal::Str(value)))
            }
            TokenKind::Identifier(_) => Ok(ArithExpr::Column(self.parse_column_ref()?)),
            other => Err(ParseError::unexpected(
                "literal, column, or '('",
                other.clone(),
                self.current.span,
            )),
        }
    }

    /// Parses a literal value. Bare identifiers are accepted as strings so
    /// unquoted values (`VALUES (aab, Minnesota)`) round-trip from data files.
    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        match &self.current.kind {
            TokenKind::Integer(i) => {
                let value = *i;
                self.advance();
                Ok(Literal::Int(value))
            }
            TokenKind::Float(x) => {
                let value = *x;
                self.advance();
                Ok(Literal::Float(value))
            }
            TokenKind::String(s) => {
                let value = s.clone();
                self.advance();
                Ok(Literal::Str(value))
            }
            TokenKind::Identifier(s) => {
                let value = s.clone();
                self.advance();
                Ok(Literal::Str(value))
            }
            TokenKind::Minus => {
                self.advance();
                match &self.current.kind {
                    TokenKind::Integer(i) => {
                        let value = -*i;
                        self.advance();
                        Ok(Literal::Int(value))
                    }
                    TokenKind::Float(x) => {
                        let value = -*x;
                        self.advance();
                        Ok(Literal::Float(value))
                    }
                    other => Err(ParseError::unexpected(
                        "number after '-'",
                        other.clone(),
                        self.current.span,
                    )),
                }
            }
            other => Err(ParseError::unexpected(
                "literal value",
                other.clone(),
                self.current.span,
            )),
        }
    }

    // ===============================================================
    // Token helpers
    // ===============================================================

    /// Advances to the next token, returning the one just consumed.
    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current.as_keyword() == Some(keyword)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else if self.current.is_eof() {
            Err(ParseError::unexpected_eof(
                format!("{kind:?}"),
                self.current.span,
            ))
        } else {
            Err(ParseError::unexpected(
                format!("{kind:?}"),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(
                keyword.as_str(),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::unexpected(
                "identifier",
                other.clone(),
                self.current.span,
            )),
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            other => Err(ParseError::unexpected(
                "string literal",
                other.clone(),
                self.current.span,
            )),
        }
    }

    fn expect_integer(&mut self) -> Result<i64, ParseError> {
        match &self.current.kind {
            TokenKind::Integer(i) => {
                let i = *i;
                self.advance();
                Ok(i)
            }
            other => Err(ParseError::unexpected(
                "integer literal",
                other.clone(),
                self.current.span,
            )),
        }
    }
}

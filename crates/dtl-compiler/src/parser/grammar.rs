//! Grammar productions.
//!
//! One method per rule. Binary expressions use precedence climbing:
//! comparison < additive < multiplicative, all left-associative.

use crate::ast::{
    BinaryOp, ColumnBinding, DistinctClause, Expr, GroupByClause, Ident, JoinClause,
    JoinConstraint, Literal, Script, SelectExpr, Statement, StringLit, TableBinding, TableExpr,
    WhereClause,
};
use crate::lexer::{TokenKind, string_value};
use crate::{ErrorKind, Result};

use super::core::Parser;

impl Parser<'_> {
    pub(super) fn parse_script(mut self) -> Result<Script> {
        let mut statements = Vec::new();
        while !self.eof() {
            statements.push(self.parse_statement()?);
        }
        Ok(Script { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.peek() {
            Some(TokenKind::Export) => self.parse_export_statement(),
            Some(TokenKind::Update) => self.parse_update_statement(),
            Some(TokenKind::Name) if self.peek_nth(1) == Some(TokenKind::Eq) => {
                self.parse_assignment_statement()
            }
            _ => Err(self.error("expected statement")),
        }
    }

    /// `name = table_expr ;`
    fn parse_assignment_statement(&mut self) -> Result<Statement> {
        let target = self.parse_name()?;
        self.expect(TokenKind::Eq, "'='")?;
        let expression = self.parse_table_expr()?;
        let semicolon = self.expect(TokenKind::Semicolon, "';'")?;

        Ok(Statement::Assignment {
            span: target.span.cover(semicolon.span),
            target,
            expression,
        })
    }

    /// `EXPORT table_expr TO 'path' ;`
    fn parse_export_statement(&mut self) -> Result<Statement> {
        let export = self.bump();
        let expression = self.parse_table_expr()?;
        self.expect(TokenKind::To, "'TO'")?;
        let path = self.parse_string()?;
        let semicolon = self.expect(TokenKind::Semicolon, "';'")?;

        Ok(Statement::Export {
            expression,
            path,
            span: export.span.cover(semicolon.span),
        })
    }

    /// `UPDATE … ;` - declared but uncompiled; the body is skipped.
    fn parse_update_statement(&mut self) -> Result<Statement> {
        let update = self.bump();
        while !self.eof() && !self.at(TokenKind::Semicolon) {
            self.bump();
        }
        let semicolon = self.expect(TokenKind::Semicolon, "';'")?;

        Ok(Statement::Update {
            span: update.span.cover(semicolon.span),
        })
    }

    fn parse_table_expr(&mut self) -> Result<TableExpr> {
        match self.peek() {
            Some(TokenKind::Select) => Ok(TableExpr::Select(Box::new(self.parse_select()?))),
            Some(TokenKind::Import) => {
                let import = self.bump();
                let path = self.parse_string()?;
                Ok(TableExpr::Import {
                    span: import.span.cover(path.span),
                    path,
                })
            }
            Some(TokenKind::Name) => {
                let name = self.parse_name()?;
                Ok(TableExpr::Reference {
                    span: name.span,
                    name,
                })
            }
            _ => Err(self.error("expected table expression")),
        }
    }

    fn parse_select(&mut self) -> Result<SelectExpr> {
        let select = self.bump();

        let distinct = if self.at(TokenKind::Distinct) {
            let keyword = self.bump();
            let consecutive = self.eat(TokenKind::Consecutive);
            Some(DistinctClause {
                consecutive,
                span: keyword.span.cover(self.last_span()),
            })
        } else {
            None
        };

        let mut columns = vec![self.parse_column_binding()?];
        while self.eat(TokenKind::Comma) {
            columns.push(self.parse_column_binding()?);
        }

        self.expect(TokenKind::From, "'FROM'")?;
        let source = self.parse_table_binding()?;

        let mut joins = Vec::new();
        while self.at(TokenKind::Join) {
            joins.push(self.parse_join_clause()?);
        }

        let where_clause = if self.at(TokenKind::Where) {
            let keyword = self.bump();
            let predicate = self.parse_expr()?;
            Some(WhereClause {
                span: keyword.span.cover(predicate.span()),
                predicate,
            })
        } else {
            None
        };

        let group_by = if self.at(TokenKind::Group) {
            let keyword = self.bump();
            let consecutive = self.eat(TokenKind::Consecutive);
            self.expect(TokenKind::By, "'BY'")?;
            let mut expressions = vec![self.parse_expr()?];
            while self.eat(TokenKind::Comma) {
                expressions.push(self.parse_expr()?);
            }
            Some(GroupByClause {
                consecutive,
                span: keyword.span.cover(self.last_span()),
                expressions,
            })
        } else {
            None
        };

        Ok(SelectExpr {
            distinct,
            columns,
            source,
            joins,
            where_clause,
            group_by,
            span: select.span.cover(self.last_span()),
        })
    }

    fn parse_column_binding(&mut self) -> Result<ColumnBinding> {
        if self.at(TokenKind::Star) {
            let star = self.bump();
            return Ok(ColumnBinding::Wildcard { span: star.span });
        }

        let expression = self.parse_expr()?;
        if self.eat(TokenKind::As) {
            let alias = self.parse_name()?;
            Ok(ColumnBinding::Aliased {
                span: expression.span().cover(alias.span),
                expression,
                alias,
            })
        } else {
            Ok(ColumnBinding::Implicit { expression })
        }
    }

    fn parse_table_binding(&mut self) -> Result<TableBinding> {
        let expression = self.parse_table_expr()?;
        let alias = if self.eat(TokenKind::As) {
            Some(self.parse_name()?)
        } else {
            None
        };

        let span = match &alias {
            Some(alias) => expression.span().cover(alias.span),
            None => expression.span(),
        };
        Ok(TableBinding {
            expression,
            alias,
            span,
        })
    }

    fn parse_join_clause(&mut self) -> Result<JoinClause> {
        let join = self.bump();
        let binding = self.parse_table_binding()?;

        let constraint = if self.at(TokenKind::On) {
            let keyword = self.bump();
            let predicate = self.parse_expr()?;
            Some(JoinConstraint::On {
                span: keyword.span.cover(predicate.span()),
                predicate,
            })
        } else if self.at(TokenKind::Using) {
            let keyword = self.bump();
            self.expect(TokenKind::OpenParen, "'('")?;
            let mut names = vec![self.parse_name()?];
            while self.eat(TokenKind::Comma) {
                names.push(self.parse_name()?);
            }
            let close = self.expect(TokenKind::CloseParen, "')'")?;
            Some(JoinConstraint::Using {
                columns: names,
                span: keyword.span.cover(close.span),
            })
        } else {
            None
        };

        Ok(JoinClause {
            span: join.span.cover(self.last_span()),
            binding,
            constraint,
        })
    }

    /* === Expressions ===================================================== */

    pub(super) fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        while let Some(op) = self.peek().and_then(comparison_op) {
            self.bump();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_primary()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => BinaryOp::Multiply,
                Some(TokenKind::Slash) => BinaryOp::Divide,
                _ => break,
            };
            self.bump();
            let right = self.parse_primary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(TokenKind::Int) => {
                let token = self.bump();
                let value: i64 = self
                    .text(&token)
                    .parse()
                    .map_err(|_| {
                        crate::CompileError::new(
                            ErrorKind::Syntax,
                            token.span,
                            "integer literal out of range",
                        )
                    })?;
                Ok(Expr::Literal(Literal::Int {
                    value,
                    span: token.span,
                }))
            }
            Some(TokenKind::String) => {
                let lit = self.parse_string()?;
                Ok(Expr::Literal(Literal::String(lit)))
            }
            Some(TokenKind::OpenParen) => {
                self.bump();
                let expression = self.parse_expr()?;
                self.expect(TokenKind::CloseParen, "')'")?;
                Ok(expression)
            }
            Some(TokenKind::Name) => {
                let first = self.parse_name()?;

                if self.at(TokenKind::Dot) {
                    self.bump();
                    let name = self.parse_name()?;
                    return Ok(Expr::ColumnReference {
                        span: first.span.cover(name.span),
                        namespace: Some(first),
                        name,
                    });
                }

                if self.at(TokenKind::OpenParen) {
                    self.bump();
                    let mut arguments = Vec::new();
                    if !self.at(TokenKind::CloseParen) {
                        arguments.push(self.parse_expr()?);
                        while self.eat(TokenKind::Comma) {
                            arguments.push(self.parse_expr()?);
                        }
                    }
                    let close = self.expect(TokenKind::CloseParen, "')'")?;
                    return Ok(Expr::FunctionCall {
                        span: first.span.cover(close.span),
                        function: first,
                        arguments,
                    });
                }

                Ok(Expr::ColumnReference {
                    span: first.span,
                    namespace: None,
                    name: first,
                })
            }
            _ => Err(self.error("expected expression")),
        }
    }

    /* === Terminals ======================================================= */

    fn parse_name(&mut self) -> Result<Ident> {
        let token = self.expect(TokenKind::Name, "name")?;
        Ok(Ident {
            name: self.text(&token).to_owned(),
            span: token.span,
        })
    }

    fn parse_string(&mut self) -> Result<StringLit> {
        let token = self.expect(TokenKind::String, "string literal")?;
        Ok(StringLit {
            value: string_value(self.text(&token)),
            span: token.span,
        })
    }
}

fn comparison_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Eq => Some(BinaryOp::EqualTo),
        TokenKind::LessThan => Some(BinaryOp::LessThan),
        TokenKind::LessThanEq => Some(BinaryOp::LessThanOrEqual),
        TokenKind::GreaterThan => Some(BinaryOp::GreaterThan),
        TokenKind::GreaterThanEq => Some(BinaryOp::GreaterThanOrEqual),
        _ => None,
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        span: left.span().cover(right.span()),
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

use crate::program::ast::{BinaryOp, Expr, ExprKind, Lit, ProgramAst, Section, Stmt, UnaryOp};
use crate::program::error::ProgramError;
use crate::program::lexer::{Span, Token, TokenKind, lex};
use crate::synth::builder::Location;
use crate::synth::names;

pub(crate) fn parse_program(src: &str) -> Result<ProgramAst, ProgramError> {
    let tokens = lex(src)?;
    let mut p = Parser { tokens, pos: 0 };
    p.parse_program()
}

/// Parse a standalone expression (used to validate user formulas).
pub(crate) fn parse_expr(src: &str) -> Result<Expr, ProgramError> {
    let tokens = lex(src)?;
    let mut p = Parser { tokens, pos: 0 };
    let expr = p.parse_select()?;
    p.expect(TokenKind::Eof)?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + ahead).min(last)].kind
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Span, ProgramError> {
        if self.peek().kind == kind {
            Ok(self.bump().span)
        } else {
            Err(ProgramError::syntax(
                self.span().start,
                format!("expected {kind:?}, found {:?}", self.peek().kind),
            ))
        }
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ProgramError> {
        let t = self.bump();
        match t.kind {
            TokenKind::Ident(s) => Ok((s, t.span)),
            other => Err(ProgramError::syntax(
                t.span.start,
                format!("expected identifier, found {other:?}"),
            )),
        }
    }

    fn expect_count(&mut self) -> Result<usize, ProgramError> {
        let t = self.bump();
        match t.kind {
            TokenKind::Number(v) if v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX) => {
                Ok(v as usize)
            }
            other => Err(ProgramError::syntax(
                t.span.start,
                format!("expected a non-negative integer, found {other:?}"),
            )),
        }
    }

    // -------------------------------------------------------------------------------------
    // Program structure
    // -------------------------------------------------------------------------------------

    fn parse_program(&mut self) -> Result<ProgramAst, ProgramError> {
        let mut ast = ProgramAst {
            name: "program".to_owned(),
            uses: Vec::new(),
            channels: 0,
            params: 0,
            progress_steps: 2,
            sections: Vec::new(),
        };

        loop {
            let directive = match &self.peek().kind {
                TokenKind::Ident(s) => s.clone(),
                _ => break,
            };
            match directive.as_str() {
                "program" => {
                    self.bump();
                    let t = self.bump();
                    let TokenKind::Str(name) = t.kind else {
                        return Err(ProgramError::syntax(
                            t.span.start,
                            "expected program name string",
                        ));
                    };
                    ast.name = name;
                }
                "use" => {
                    self.bump();
                    ast.uses.push(self.expect_ident()?);
                }
                "channels" => {
                    self.bump();
                    ast.channels = self.expect_count()?;
                }
                "params" => {
                    self.bump();
                    ast.params = self.expect_count()?;
                }
                "progress" => {
                    self.bump();
                    ast.progress_steps = self.expect_count()?;
                }
                _ => break,
            }
            self.expect(TokenKind::Semi)?;
        }

        let mut last: Option<Location> = None;
        loop {
            let t = self.bump();
            let name = match t.kind {
                TokenKind::Eof => break,
                TokenKind::Section(name) => name,
                other => {
                    return Err(ProgramError::syntax(
                        t.span.start,
                        format!("expected a directive or section marker, found {other:?}"),
                    ));
                }
            };
            let Some(location) = Location::from_section(&name) else {
                return Err(ProgramError::syntax(
                    t.span.start,
                    format!("unknown section @{name}"),
                ));
            };
            if last.is_some_and(|l| l >= location) {
                return Err(ProgramError::syntax(
                    t.span.start,
                    format!("section @{name} is repeated or out of order"),
                ));
            }
            last = Some(location);

            let mut body = Vec::new();
            while !matches!(self.peek().kind, TokenKind::Section(_) | TokenKind::Eof) {
                body.push(self.parse_stmt()?);
            }
            ast.sections.push(Section { location, body });
        }

        Ok(ast)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ProgramError> {
        let start = self.span().start;
        if self.consume(TokenKind::Let) {
            let (name, _) = self.expect_ident()?;
            self.expect(TokenKind::Assign)?;
            let value = self.parse_select()?;
            let end = self.expect(TokenKind::Semi)?.end;
            return Ok(Stmt::Let {
                name,
                value,
                span: Span { start, end },
            });
        }

        let (name, _) = self.expect_ident()?;
        if name == names::CHANNEL && *self.peek_at(0) == TokenKind::LBracket {
            self.bump();
            let index = self.expect_count()?;
            self.expect(TokenKind::RBracket)?;
            self.expect(TokenKind::Assign)?;
            let value = self.parse_select()?;
            let end = self.expect(TokenKind::Semi)?.end;
            return Ok(Stmt::Channel {
                index,
                value,
                span: Span { start, end },
            });
        }

        self.expect(TokenKind::Assign)?;
        let value = self.parse_select()?;
        let end = self.expect(TokenKind::Semi)?.end;
        Ok(Stmt::Assign {
            name,
            value,
            span: Span { start, end },
        })
    }

    // -------------------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------------------

    fn parse_select(&mut self) -> Result<Expr, ProgramError> {
        let cond = self.parse_or()?;
        if !self.consume(TokenKind::Question) {
            return Ok(cond);
        }
        let then = self.parse_select()?;
        self.expect(TokenKind::Colon)?;
        let otherwise = self.parse_select()?;
        let span = Span {
            start: cond.span.start,
            end: otherwise.span.end,
        };
        Ok(Expr {
            kind: ExprKind::Select {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            span,
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ProgramError> {
        let mut e = self.parse_and()?;
        while self.consume(TokenKind::OrOr) {
            let r = self.parse_and()?;
            e = binary(BinaryOp::Or, e, r);
        }
        Ok(e)
    }

    fn parse_and(&mut self) -> Result<Expr, ProgramError> {
        let mut e = self.parse_equality()?;
        while self.consume(TokenKind::AndAnd) {
            let r = self.parse_equality()?;
            e = binary(BinaryOp::And, e, r);
        }
        Ok(e)
    }

    fn parse_equality(&mut self) -> Result<Expr, ProgramError> {
        let mut e = self.parse_comparison()?;
        loop {
            let op = if self.consume(TokenKind::EqEq) {
                BinaryOp::Eq
            } else if self.consume(TokenKind::Ne) {
                BinaryOp::Ne
            } else {
                break;
            };
            let r = self.parse_comparison()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ProgramError> {
        let mut e = self.parse_term()?;
        loop {
            let op = if self.consume(TokenKind::Lt) {
                BinaryOp::Lt
            } else if self.consume(TokenKind::Le) {
                BinaryOp::Le
            } else if self.consume(TokenKind::Gt) {
                BinaryOp::Gt
            } else if self.consume(TokenKind::Ge) {
                BinaryOp::Ge
            } else {
                break;
            };
            let r = self.parse_term()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_term(&mut self) -> Result<Expr, ProgramError> {
        let mut e = self.parse_factor()?;
        loop {
            let op = if self.consume(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.consume(TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            let r = self.parse_factor()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_factor(&mut self) -> Result<Expr, ProgramError> {
        let mut e = self.parse_unary()?;
        loop {
            let op = if self.consume(TokenKind::Star) {
                BinaryOp::Mul
            } else if self.consume(TokenKind::Slash) {
                BinaryOp::Div
            } else if self.consume(TokenKind::Percent) {
                BinaryOp::Mod
            } else {
                break;
            };
            let r = self.parse_unary()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_unary(&mut self) -> Result<Expr, ProgramError> {
        let start = self.span().start;
        let op = if self.consume(TokenKind::Minus) {
            UnaryOp::Neg
        } else if self.consume(TokenKind::Bang) {
            UnaryOp::Not
        } else {
            return self.parse_postfix();
        };
        let e = self.parse_unary()?;
        let span = Span {
            start,
            end: e.span.end,
        };
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                expr: Box::new(e),
            },
            span,
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ProgramError> {
        let e = self.parse_primary()?;
        if !self.consume(TokenKind::LParen) {
            return Ok(e);
        }
        let func = match e.kind {
            ExprKind::Ident(name) => name,
            _ => {
                return Err(ProgramError::syntax(
                    e.span.start,
                    "call target must be an identifier",
                ));
            }
        };
        let (args, end) = self.parse_args()?;
        Ok(Expr {
            kind: ExprKind::Call { func, args },
            span: Span {
                start: e.span.start,
                end,
            },
        })
    }

    fn parse_args(&mut self) -> Result<(Vec<Expr>, usize), ProgramError> {
        let mut args = Vec::new();
        if *self.peek_at(0) == TokenKind::RParen {
            return Ok((args, self.bump().span.end));
        }
        loop {
            args.push(self.parse_select()?);
            if self.consume(TokenKind::Comma) {
                continue;
            }
            let end = self.expect(TokenKind::RParen)?.end;
            return Ok((args, end));
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ProgramError> {
        let t = self.bump();
        let kind = match t.kind {
            TokenKind::Number(v) => ExprKind::Lit(Lit::F64(v)),
            TokenKind::True => ExprKind::Lit(Lit::Bool(true)),
            TokenKind::False => ExprKind::Lit(Lit::Bool(false)),
            TokenKind::Ident(s) => ExprKind::Ident(s),
            TokenKind::LParen => {
                let e = self.parse_select()?;
                let end = self.expect(TokenKind::RParen)?.end;
                return Ok(Expr {
                    kind: e.kind,
                    span: Span {
                        start: t.span.start,
                        end,
                    },
                });
            }
            other => {
                return Err(ProgramError::syntax(
                    t.span.start,
                    format!("unexpected token {other:?}"),
                ));
            }
        };
        Ok(Expr { kind, span: t.span })
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = Span {
        start: left.span.start,
        end: right.span.end,
    };
    Expr {
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/program/parser.rs"]
mod tests;

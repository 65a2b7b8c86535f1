use std::str::FromStr;

use gateway_core::model::ValueType;

use crate::ast::{BinOp, Expr, FunctionDef, Param, Stmt, UnaryOp};
use crate::lexer::Token;

#[derive(Debug, thiserror::Error)]
#[error("parse error: {0}")]
pub struct ParseError(pub String);

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        let tok = self.advance();
        if &tok == expected {
            Ok(())
        } else {
            Err(ParseError(format!("expected {expected}, found {tok}")))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Token::Ident(name) => Ok(name),
            other => Err(ParseError(format!("expected identifier, found {other}"))),
        }
    }

    pub fn parse_function(&mut self) -> Result<FunctionDef, ParseError> {
        self.expect(&Token::Fn)?;
        let name = self.expect_ident()?;
        self.expect(&Token::LParen)?;

        let mut params = Vec::new();
        if self.peek() != &Token::RParen {
            loop {
                let pname = self.expect_ident()?;
                self.expect(&Token::Colon)?;
                let type_name = self.expect_ident()?;
                let ty = ValueType::from_str(&type_name)
                    .map_err(|e| ParseError(format!("in parameter '{pname}': {e}")))?;
                params.push(Param { name: pname, ty });
                if self.peek() == &Token::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(&Token::RParen)?;
        self.expect(&Token::Arrow)?;
        let return_type_name = self.expect_ident()?;
        let return_type = ValueType::from_str(&return_type_name)
            .map_err(|e| ParseError(format!("in return type: {e}")))?;

        self.expect(&Token::LBrace)?;
        let (body, tail) = self.parse_block_body()?;
        self.expect(&Token::RBrace)?;

        if self.peek() != &Token::Eof {
            return Err(ParseError(format!(
                "unexpected trailing token {}",
                self.peek()
            )));
        }

        Ok(FunctionDef {
            name,
            params,
            return_type,
            body,
            tail,
        })
    }

    /// Parses `let` statements followed by a single tail expression, the
    /// function's result.
    fn parse_block_body(&mut self) -> Result<(Vec<Stmt>, Expr), ParseError> {
        let mut stmts = Vec::new();
        loop {
            if self.peek() == &Token::Let {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(&Token::Eq)?;
                let value = self.parse_expr()?;
                self.expect(&Token::Semicolon)?;
                stmts.push(Stmt::Let { name, value });
                continue;
            }
            let tail = self.parse_expr()?;
            // Optional trailing semicolon after the tail is tolerated.
            if self.peek() == &Token::Semicolon {
                self.advance();
            }
            return Ok((stmts, tail));
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == &Token::OrOr {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(Box::new(lhs), BinOp::Or, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.peek() == &Token::AndAnd {
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(Box::new(lhs), BinOp::And, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinOp::Eq,
                Token::NotEq => BinOp::NotEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinOp::Lt,
                Token::LtEq => BinOp::LtEq,
                Token::Gt => BinOp::Gt,
                Token::GtEq => BinOp::GtEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Token::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)))
            }
            Token::Bang => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Token::Int(v) => Ok(Expr::Int(v)),
            Token::Float(v) => Ok(Expr::Float(v)),
            Token::Str(v) => Ok(Expr::Str(v)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::Ident(name) => {
                if self.peek() == &Token::LParen {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek() != &Token::RParen {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.peek() == &Token::Comma {
                                self.advance();
                                continue;
                            }
                            break;
                        }
                    }
                    self.expect(&Token::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            other => Err(ParseError(format!("unexpected token {other}"))),
        }
    }
}

pub fn parse(source: &str) -> Result<FunctionDef, ParseError> {
    let tokens = crate::lexer::Lexer::new(source)
        .tokenize()
        .map_err(|e| ParseError(e.to_string()))?;
    Parser::new(tokens).parse_function()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_function_with_let_and_call() {
        let f = parse(
            "fn greet(name: str) -> str { let prefix = \"hi \"; concat(prefix, name) }",
        )
        .unwrap();
        assert_eq!(f.name, "greet");
        assert_eq!(f.params.len(), 1);
        assert_eq!(f.body.len(), 1);
        assert!(matches!(f.tail, Expr::Call(ref n, _) if n == "concat"));
    }

    #[test]
    fn rejects_bad_type_name() {
        let err = parse("fn f(x: weird) -> int { x }").unwrap_err();
        assert!(err.0.contains("unknown type"));
    }
}

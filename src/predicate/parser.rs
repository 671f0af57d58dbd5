//! Recursive-descent parser for the trip-condition predicate grammar:
//!
//! ```text
//! expr    := or
//! or      := and ('||' and)*
//! and     := cmp ('&&' cmp)*
//! cmp     := call op number
//! op      := '>' | '<' | '==' | '!='
//! call    := ident '(' args? ')'
//! args    := num (',' num)*
//! ident   := NetworkErrorRatio | LatencyAtQuantile | ResponseCodeRatio
//! ```
//!
//! Whitespace is insignificant everywhere. Numbers are IEEE-754 doubles; the
//! right-hand side of a `LatencyAtQuantile` comparison is interpreted as a
//! nanosecond count (see [`super::ast`]).

use super::ast::{Call, CompareOp, Expr};
use crate::error::PredicateError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    LParen,
    RParen,
    Comma,
    Gt,
    Lt,
    Eq,
    Neq,
    AndAnd,
    OrOr,
}

struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, PredicateError> {
        let bytes = self.input.as_bytes();
        let mut tokens = Vec::new();

        while self.position < bytes.len() {
            let c = bytes[self.position] as char;

            if c.is_whitespace() {
                self.position += 1;
                continue;
            }

            let start = self.position;
            match c {
                '(' => {
                    tokens.push((Token::LParen, start));
                    self.position += 1;
                }
                ')' => {
                    tokens.push((Token::RParen, start));
                    self.position += 1;
                }
                ',' => {
                    tokens.push((Token::Comma, start));
                    self.position += 1;
                }
                '>' => {
                    tokens.push((Token::Gt, start));
                    self.position += 1;
                }
                '<' => {
                    tokens.push((Token::Lt, start));
                    self.position += 1;
                }
                '=' if self.peek_is('=', 1) => {
                    tokens.push((Token::Eq, start));
                    self.position += 2;
                }
                '!' if self.peek_is('=', 1) => {
                    tokens.push((Token::Neq, start));
                    self.position += 2;
                }
                '&' if self.peek_is('&', 1) => {
                    tokens.push((Token::AndAnd, start));
                    self.position += 2;
                }
                '|' if self.peek_is('|', 1) => {
                    tokens.push((Token::OrOr, start));
                    self.position += 2;
                }
                c if c.is_ascii_digit() || c == '-' || c == '.' => {
                    let text = self.take_while(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == 'e' || c == 'E');
                    let value = text.parse::<f64>().map_err(|_| PredicateError::InvalidNumber {
                        text: text.to_string(),
                        position: start,
                    })?;
                    tokens.push((Token::Number(value), start));
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let text = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                    tokens.push((Token::Ident(text.to_string()), start));
                }
                other => {
                    return Err(PredicateError::UnexpectedToken {
                        token: other.to_string(),
                        position: start,
                    });
                }
            }
        }

        Ok(tokens)
    }

    fn peek_is(&self, c: char, offset: usize) -> bool {
        self.input[self.position..].chars().nth(offset) == Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.position;
        while self.position < self.input.len() && pred(self.input.as_bytes()[self.position] as char) {
            self.position += 1;
        }
        &self.input[start..self.position]
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&(Token, usize)> {
        self.tokens.get(self.position)
    }

    fn bump(&mut self) -> Option<(Token, usize)> {
        let tok = self.tokens.get(self.position).cloned();
        if tok.is_some() {
            self.position += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<(), PredicateError> {
        match self.bump() {
            Some((tok, _)) if &tok == expected => Ok(()),
            Some((tok, pos)) => Err(PredicateError::UnexpectedToken {
                token: format!("{tok:?}"),
                position: pos,
            }),
            None => Err(PredicateError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, PredicateError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some((Token::OrOr, _))) {
            self.bump();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.parse_cmp()?;
        while matches!(self.peek(), Some((Token::AndAnd, _))) {
            self.bump();
            let rhs = self.parse_cmp()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr, PredicateError> {
        let call = self.parse_call()?;
        let op = self.parse_op()?;
        let number = self.parse_number()?;
        Ok(Expr::Compare(call, op, number))
    }

    fn parse_op(&mut self) -> Result<CompareOp, PredicateError> {
        match self.bump() {
            Some((Token::Gt, _)) => Ok(CompareOp::Gt),
            Some((Token::Lt, _)) => Ok(CompareOp::Lt),
            Some((Token::Eq, _)) => Ok(CompareOp::Eq),
            Some((Token::Neq, _)) => Ok(CompareOp::Neq),
            Some((tok, pos)) => Err(PredicateError::UnexpectedToken {
                token: format!("{tok:?}"),
                position: pos,
            }),
            None => Err(PredicateError::UnexpectedEnd),
        }
    }

    fn parse_number(&mut self) -> Result<f64, PredicateError> {
        match self.bump() {
            Some((Token::Number(n), _)) => Ok(n),
            Some((tok, pos)) => Err(PredicateError::UnexpectedToken {
                token: format!("{tok:?}"),
                position: pos,
            }),
            None => Err(PredicateError::UnexpectedEnd),
        }
    }

    fn parse_call(&mut self) -> Result<Call, PredicateError> {
        let (name, name_pos) = match self.bump() {
            Some((Token::Ident(name), pos)) => (name, pos),
            Some((tok, pos)) => {
                return Err(PredicateError::UnexpectedToken {
                    token: format!("{tok:?}"),
                    position: pos,
                })
            }
            None => return Err(PredicateError::UnexpectedEnd),
        };

        self.expect(&Token::LParen)?;
        let args = self.parse_args()?;
        self.expect(&Token::RParen)?;

        match name.as_str() {
            "NetworkErrorRatio" => {
                self.require_arity(&name, name_pos, &args, 0)?;
                Ok(Call::NetworkErrorRatio)
            }
            "LatencyAtQuantile" => {
                self.require_arity(&name, name_pos, &args, 1)?;
                Ok(Call::LatencyAtQuantile(args[0]))
            }
            "ResponseCodeRatio" => {
                self.require_arity(&name, name_pos, &args, 4)?;
                Ok(Call::ResponseCodeRatio(
                    args[0] as u16,
                    args[1] as u16,
                    args[2] as u16,
                    args[3] as u16,
                ))
            }
            other => Err(PredicateError::UnknownBuiltin {
                name: other.to_string(),
                position: name_pos,
            }),
        }
    }

    fn require_arity(
        &self,
        name: &str,
        _position: usize,
        args: &[f64],
        expected: usize,
    ) -> Result<(), PredicateError> {
        if args.len() != expected {
            Err(PredicateError::ArityMismatch {
                name: name.to_string(),
                expected,
                actual: args.len(),
            })
        } else {
            Ok(())
        }
    }

    fn parse_args(&mut self) -> Result<Vec<f64>, PredicateError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some((Token::RParen, _))) {
            return Ok(args);
        }
        args.push(self.parse_number()?);
        while matches!(self.peek(), Some((Token::Comma, _))) {
            self.bump();
            args.push(self.parse_number()?);
        }
        Ok(args)
    }
}

/// Parses a predicate string into an [`Expr`], or a [`PredicateError`]
/// pinpointing the offending token.
pub fn parse(input: &str) -> Result<Expr, PredicateError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser { tokens, position: 0 };
    let expr = parser.parse_expr()?;

    if let Some((tok, pos)) = parser.peek() {
        return Err(PredicateError::TrailingInput {
            rest: format!("{tok:?} at position {pos}"),
        });
    }

    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::ast::{Call, CompareOp};

    #[test]
    fn parses_a_single_comparison() {
        let expr = parse("NetworkErrorRatio() > 0.5").unwrap();
        assert_eq!(
            expr,
            Expr::Compare(Call::NetworkErrorRatio, CompareOp::Gt, 0.5)
        );
    }

    #[test]
    fn parses_latency_at_quantile_in_nanoseconds() {
        let expr = parse("LatencyAtQuantile(0.99) > 100000000").unwrap();
        assert_eq!(
            expr,
            Expr::Compare(Call::LatencyAtQuantile(0.99), CompareOp::Gt, 100_000_000.0)
        );
    }

    #[test]
    fn parses_response_code_ratio_with_four_args() {
        let expr = parse("ResponseCodeRatio(500,600,0,600) > 0.2").unwrap();
        assert_eq!(
            expr,
            Expr::Compare(Call::ResponseCodeRatio(500, 600, 0, 600), CompareOp::Gt, 0.2)
        );
    }

    #[test]
    fn parses_and_or_compositions_left_associatively() {
        let expr = parse("NetworkErrorRatio() > 0.5 && LatencyAtQuantile(0.9) > 1 || NetworkErrorRatio() == 1").unwrap();
        match expr {
            Expr::Or(lhs, rhs) => {
                assert!(matches!(*lhs, Expr::And(_, _)));
                assert!(matches!(*rhs, Expr::Compare(Call::NetworkErrorRatio, CompareOp::Eq, _)));
            }
            other => panic!("expected Or at the top, got {other:?}"),
        }
    }

    #[test]
    fn whitespace_is_insignificant() {
        let a = parse("NetworkErrorRatio()>0.5").unwrap();
        let b = parse("  NetworkErrorRatio ( ) > 0.5  ").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_unknown_builtin() {
        let err = parse("Bogus() > 1").unwrap_err();
        assert!(matches!(err, PredicateError::UnknownBuiltin { .. }));
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = parse("NetworkErrorRatio(1) > 0.5").unwrap_err();
        assert!(matches!(err, PredicateError::ArityMismatch { .. }));
    }

    #[test]
    fn rejects_trailing_input() {
        let err = parse("NetworkErrorRatio() > 0.5 foo").unwrap_err();
        assert!(matches!(err, PredicateError::TrailingInput { .. }));
    }

    #[test]
    fn rejects_incomplete_input() {
        let err = parse("NetworkErrorRatio() >").unwrap_err();
        assert!(matches!(err, PredicateError::UnexpectedEnd));
    }

    #[test]
    fn pretty_printing_then_reparsing_round_trips() {
        let original = "NetworkErrorRatio() > 0.5 && LatencyAtQuantile(0.99) > 100000000";
        let expr = parse(original).unwrap();
        let printed = expr.to_string();
        let reparsed = parse(&printed).unwrap();
        assert_eq!(expr, reparsed);
    }
}

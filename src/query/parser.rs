//! Recursive-descent reader for the s-expression query dialect.

use super::ast::{Expr, ExprKind, Item, PredicateArg, PredicateCall, Spanned};
use super::Quantifier;
use crate::error::{CompileError, CompileErrorKind};

type Result<T> = std::result::Result<T, CompileError>;

pub(crate) fn parse(source: &str) -> Result<Vec<Expr>> {
    let mut parser = Parser { src: source, pos: 0 };
    let mut patterns = Vec::new();
    loop {
        parser.skip_trivia();
        match parser.peek() {
            None => break,
            Some('?' | '*' | '+') => {
                return Err(parser.error(CompileErrorKind::MalformedQuantifier(
                    "quantifier with no pattern before it".to_string(),
                )))
            }
            Some('@') => {
                return Err(parser.error(CompileErrorKind::SyntaxError(
                    "capture with no pattern before it".to_string(),
                )))
            }
            Some('.') => {
                return Err(parser.error(CompileErrorKind::SyntaxError(
                    "anchor outside of a node pattern".to_string(),
                )))
            }
            Some(_) => patterns.push(parser.expr()?),
        }
    }
    Ok(patterns)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '?' | '!')
}

fn is_capture_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, kind: CompileErrorKind) -> CompileError {
        self.error_at(self.pos, kind)
    }

    fn error_at(&self, offset: usize, kind: CompileErrorKind) -> CompileError {
        CompileError::at(self.src, offset, kind)
    }

    fn syntax(&self, msg: &str) -> CompileError {
        self.error(CompileErrorKind::SyntaxError(msg.to_string()))
    }

    /// Skip whitespace and `;` line comments.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> Spanned {
        let offset = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        Spanned { text: self.src[offset..self.pos].to_string(), offset }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.peek() == Some(c) {
            self.bump();
            Ok(())
        } else {
            Err(self.syntax(&format!("expected `{}`", c)))
        }
    }

    fn expr(&mut self) -> Result<Expr> {
        self.skip_trivia();
        let offset = self.pos;
        let kind = match self.peek() {
            Some('(') => self.paren()?,
            Some('[') => self.alternation()?,
            Some('"') => ExprKind::Token(self.string()?),
            Some('_') if !self.peek_second().is_some_and(is_ident_char) => {
                self.bump();
                ExprKind::Wildcard
            }
            Some(c) if is_ident_char(c) => {
                return Err(self.syntax("node patterns must be wrapped in parentheses"));
            }
            Some(c) => return Err(self.syntax(&format!("unexpected `{}`", c))),
            None => return Err(self.syntax("unexpected end of query")),
        };
        let mut expr = Expr { kind, quantifier: Quantifier::One, captures: Vec::new(), offset };
        self.suffixes(&mut expr)?;
        Ok(expr)
    }

    /// Quantifier, then any number of captures.
    fn suffixes(&mut self, expr: &mut Expr) -> Result<()> {
        loop {
            self.skip_trivia();
            let quantifier = match self.peek() {
                Some('?') => Quantifier::ZeroOrOne,
                Some('*') => Quantifier::ZeroOrMore,
                Some('+') => Quantifier::OneOrMore,
                Some('@') => {
                    self.bump();
                    let name = self.take_while(is_capture_char);
                    if name.text.is_empty() {
                        return Err(self.syntax("expected a capture name after `@`"));
                    }
                    expr.captures.push(name);
                    continue;
                }
                _ => return Ok(()),
            };
            if expr.quantifier != Quantifier::One {
                return Err(self.error(CompileErrorKind::MalformedQuantifier(
                    "quantifiers cannot be stacked".to_string(),
                )));
            }
            if !expr.captures.is_empty() {
                return Err(self.error(CompileErrorKind::MalformedQuantifier(
                    "quantifier must come before captures".to_string(),
                )));
            }
            self.bump();
            expr.quantifier = quantifier;
        }
    }

    fn paren(&mut self) -> Result<ExprKind> {
        let open = self.pos;
        self.expect('(')?;
        self.skip_trivia();
        match self.peek() {
            Some(c) if is_ident_char(c) => {
                let name = self.take_while(is_ident_char);
                let (items, predicates) = self.items(open, true)?;
                let kind = if name.text == "_" { None } else { Some(name) };
                Ok(ExprKind::Node { kind, items, predicates })
            }
            Some(')') => Err(self.syntax("empty pattern")),
            Some('#') => Err(self.syntax("predicates must appear inside a pattern")),
            _ => {
                let (items, predicates) = self.items(open, false)?;
                if !items.iter().any(|i| matches!(i, Item::Child { .. })) {
                    return Err(self.error_at(open, CompileErrorKind::SyntaxError("empty group".to_string())));
                }
                Ok(ExprKind::Group { items, predicates })
            }
        }
    }

    fn items(&mut self, open: usize, in_node: bool) -> Result<(Vec<Item>, Vec<PredicateCall>)> {
        let mut items = Vec::new();
        let mut predicates = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    return Err(self.error_at(
                        open,
                        CompileErrorKind::SyntaxError("unclosed parenthesis".to_string()),
                    ))
                }
                Some(')') => {
                    self.bump();
                    return Ok((items, predicates));
                }
                Some('.') => {
                    items.push(Item::Anchor(self.pos));
                    self.bump();
                }
                Some('?' | '*' | '+') => {
                    return Err(self.error(CompileErrorKind::MalformedQuantifier(
                        "quantifier with no pattern before it".to_string(),
                    )))
                }
                Some('@') => return Err(self.syntax("capture with no pattern before it")),
                Some('!') => {
                    if !in_node {
                        return Err(self.syntax("negated fields are only allowed in node patterns"));
                    }
                    self.bump();
                    let field = self.take_while(is_ident_char);
                    if field.text.is_empty() {
                        return Err(self.syntax("expected a field name after `!`"));
                    }
                    items.push(Item::NegatedField(field));
                }
                Some('(') if self.peek_second() == Some('#') => predicates.push(self.predicate()?),
                Some(c) if is_ident_char(c) => {
                    let start = self.pos;
                    let name = self.take_while(is_ident_char);
                    self.skip_trivia();
                    if self.peek() == Some(':') {
                        if !in_node {
                            return Err(self.error_at(
                                start,
                                CompileErrorKind::SyntaxError("fields are only allowed in node patterns".to_string()),
                            ));
                        }
                        self.bump();
                        let expr = self.expr()?;
                        items.push(Item::Child { field: Some(name), expr });
                    } else {
                        self.pos = start;
                        let expr = self.expr()?;
                        items.push(Item::Child { field: None, expr });
                    }
                }
                Some(_) => {
                    let expr = self.expr()?;
                    items.push(Item::Child { field: None, expr });
                }
            }
        }
    }

    fn alternation(&mut self) -> Result<ExprKind> {
        let open = self.pos;
        self.expect('[')?;
        let mut branches = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    break;
                }
                None => {
                    return Err(self.error_at(open, CompileErrorKind::SyntaxError("unclosed bracket".to_string())))
                }
                Some('?' | '*' | '+') => {
                    return Err(self.error(CompileErrorKind::MalformedQuantifier(
                        "quantifier with no pattern before it".to_string(),
                    )))
                }
                Some(_) => branches.push(self.expr()?),
            }
        }
        if branches.is_empty() {
            return Err(self.error_at(open, CompileErrorKind::SyntaxError("empty alternation".to_string())));
        }
        Ok(ExprKind::Alternation(branches))
    }

    fn string(&mut self) -> Result<String> {
        let open = self.pos;
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(self.error_at(open, CompileErrorKind::SyntaxError("unterminated string".to_string())))
                }
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some(c) => out.push(c),
                    None => {
                        return Err(self.error_at(open, CompileErrorKind::SyntaxError("unterminated string".to_string())))
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn predicate(&mut self) -> Result<PredicateCall> {
        let offset = self.pos;
        self.expect('(')?;
        self.expect('#')?;
        let name = self.take_while(is_name_char);
        if name.text.is_empty() {
            return Err(self.syntax("expected a predicate name after `#`"));
        }
        let mut args = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(')') => {
                    self.bump();
                    break;
                }
                Some('@') => {
                    self.bump();
                    let capture = self.take_while(is_capture_char);
                    if capture.text.is_empty() {
                        return Err(self.syntax("expected a capture name after `@`"));
                    }
                    args.push(PredicateArg::Capture(capture));
                }
                Some('"') => args.push(PredicateArg::Literal(self.string()?)),
                Some('(' | '[' | ']') => return Err(self.syntax("patterns are not allowed inside predicates")),
                Some(_) => {
                    let word = self.take_while(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '"' | ';'));
                    args.push(PredicateArg::Literal(word.text));
                }
                None => {
                    return Err(self.error_at(offset, CompileErrorKind::SyntaxError("unclosed predicate".to_string())))
                }
            }
        }
        Ok(PredicateCall { name: name.text, args, offset })
    }
}

//! Token cursor shared by the statement parsers.

use crate::error::ParseError;
use crate::parser::lexer::{error_at, tokenize, Token, TokenKind};

pub(crate) struct Cursor<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(source: &'a str) -> Result<Self, ParseError> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    pub(crate) fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    pub(crate) fn peek_at(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    pub(crate) fn advance(&mut self) -> Option<TokenKind> {
        let token = self.tokens.get(self.pos).map(|t| t.kind.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.offset)
            .unwrap_or(self.source.len())
    }

    /// A parse error at the current position.
    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        let mut message = message.into();
        match self.peek() {
            Some(kind) => {
                message.push_str(&format!(", found {}", kind.describe()));
            }
            None => message.push_str(", found end of input"),
        }
        error_at(self.source, self.offset(), message)
    }

    /// Consume the next token if it equals `kind`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", kind.describe())))
        }
    }

    /// Consume and return the next token as an identifier.
    pub(crate) fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek() {
            Some(TokenKind::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    /// Whether the next token is the given caseless keyword.
    pub(crate) fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Ident(name)) if name.eq_ignore_ascii_case(keyword))
    }

    /// Consume the next token if it is the given caseless keyword.
    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("expected keyword {keyword:?}")))
        }
    }

    /// Parse a dotted qualified identifier, e.g. `colors.Color`.
    pub(crate) fn qualified_ident(&mut self, what: &str) -> Result<String, ParseError> {
        let mut name = self.expect_ident(what)?;
        while self.peek() == Some(&TokenKind::Dot) {
            // Only a dot directly followed by an identifier continues the name.
            match self.peek_at(1) {
                Some(TokenKind::Ident(part)) => {
                    name.push('.');
                    name.push_str(part);
                    self.pos += 2;
                }
                _ => break,
            }
        }
        Ok(name)
    }
}

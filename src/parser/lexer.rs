//! Tokenizer for the mapping language.
//!
//! Comments start with `%` and run to the end of the line; they are skipped
//! here so the parser never sees them. Quoted strings may not span lines and
//! unescape `\c` to `c` for any character.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// A bare identifier or keyword.
    Ident(String),
    /// An unsigned integer literal.
    Int(i64),
    /// A quoted string literal, with escapes already resolved.
    Quoted(String),
    /// A `#name` solver builtin, e.g. `#succ`.
    Hash(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Lt,
    Gt,
    Le,
    Ge,
    LtGt,
    EqEq,
    BangEq,
    Eq,
    Dot,
    Comma,
    Colon,
    Semi,
    Amp,
    Slash,
    Arrow,
    Minus,
}

impl TokenKind {
    /// Human-readable description for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier {name:?}"),
            TokenKind::Int(n) => format!("integer {n}"),
            TokenKind::Quoted(s) => format!("string {s:?}"),
            TokenKind::Hash(name) => format!("builtin #{name}"),
            TokenKind::LParen => "'('".into(),
            TokenKind::RParen => "')'".into(),
            TokenKind::LBracket => "'['".into(),
            TokenKind::RBracket => "']'".into(),
            TokenKind::LBrace => "'{'".into(),
            TokenKind::RBrace => "'}'".into(),
            TokenKind::Lt => "'<'".into(),
            TokenKind::Gt => "'>'".into(),
            TokenKind::Le => "'<='".into(),
            TokenKind::Ge => "'>='".into(),
            TokenKind::LtGt => "'<>'".into(),
            TokenKind::EqEq => "'=='".into(),
            TokenKind::BangEq => "'!='".into(),
            TokenKind::Eq => "'='".into(),
            TokenKind::Dot => "'.'".into(),
            TokenKind::Comma => "','".into(),
            TokenKind::Colon => "':'".into(),
            TokenKind::Semi => "';'".into(),
            TokenKind::Amp => "'&'".into(),
            TokenKind::Slash => "'/'".into(),
            TokenKind::Arrow => "'->'".into(),
            TokenKind::Minus => "'-'".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    /// Byte offset into the source, for error positions.
    pub(crate) offset: usize,
}

/// Compute the 1-based line and column of a byte offset.
pub(crate) fn position(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

pub(crate) fn error_at(source: &str, offset: usize, message: impl Into<String>) -> ParseError {
    let (line, column) = position(source, offset);
    ParseError {
        message: message.into(),
        line,
        column,
    }
}

/// Tokenize the whole source up front.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                i += 1;
            }
            '%' => {
                // Line comment.
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            '"' => {
                let start = i;
                i += 1;
                let mut text = String::new();
                loop {
                    if i >= bytes.len() || bytes[i] == b'\n' {
                        return Err(error_at(source, start, "unterminated string literal"));
                    }
                    match bytes[i] {
                        b'"' => {
                            i += 1;
                            break;
                        }
                        b'\\' => match source[i + 1..].chars().next() {
                            None | Some('\n') => {
                                return Err(error_at(
                                    source,
                                    start,
                                    "unterminated string literal",
                                ));
                            }
                            Some(ch) => {
                                text.push(ch);
                                i += 1 + ch.len_utf8();
                            }
                        },
                        _ => {
                            // Strings are arbitrary UTF-8 between the quotes.
                            let rest = &source[i..];
                            let ch = rest.chars().next().unwrap_or('\0');
                            text.push(ch);
                            i += ch.len_utf8();
                        }
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Quoted(text),
                    offset: start,
                });
            }
            '0'..='9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let digits = &source[start..i];
                let value: i64 = digits
                    .parse()
                    .map_err(|_| error_at(source, start, "integer literal out of range"))?;
                tokens.push(Token {
                    kind: TokenKind::Int(value),
                    offset: start,
                });
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(source[start..i].to_string()),
                    offset: start,
                });
            }
            '#' => {
                let start = i;
                i += 1;
                let name_start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                if i == name_start {
                    return Err(error_at(source, start, "expected a name after '#'"));
                }
                tokens.push(Token {
                    kind: TokenKind::Hash(source[name_start..i].to_string()),
                    offset: start,
                });
            }
            _ => {
                let start = i;
                // Guard the slice: the next byte may sit inside a multibyte
                // character.
                let two = if source.is_char_boundary(i + 1) && source.is_char_boundary(i + 2) {
                    &source[i..i + 2]
                } else {
                    ""
                };
                let kind = match two {
                    "<=" => Some((TokenKind::Le, 2)),
                    ">=" => Some((TokenKind::Ge, 2)),
                    "<>" => Some((TokenKind::LtGt, 2)),
                    "==" => Some((TokenKind::EqEq, 2)),
                    "!=" => Some((TokenKind::BangEq, 2)),
                    "->" => Some((TokenKind::Arrow, 2)),
                    _ => None,
                };
                let (kind, width) = match kind {
                    Some(found) => found,
                    None => {
                        let single = match c {
                            '(' => TokenKind::LParen,
                            ')' => TokenKind::RParen,
                            '[' => TokenKind::LBracket,
                            ']' => TokenKind::RBracket,
                            '{' => TokenKind::LBrace,
                            '}' => TokenKind::RBrace,
                            '<' => TokenKind::Lt,
                            '>' => TokenKind::Gt,
                            '=' => TokenKind::Eq,
                            '.' => TokenKind::Dot,
                            ',' => TokenKind::Comma,
                            ':' => TokenKind::Colon,
                            ';' => TokenKind::Semi,
                            '&' => TokenKind::Amp,
                            '/' => TokenKind::Slash,
                            '-' => TokenKind::Minus,
                            _ => {
                                let other = source[i..].chars().next().unwrap_or('\0');
                                return Err(error_at(
                                    source,
                                    start,
                                    format!("unexpected character {other:?}"),
                                ));
                            }
                        };
                        (single, 1)
                    }
                };
                tokens.push(Token { kind, offset: start });
                i += width;
            }
        }
    }
    Ok(tokens)
}

//! Parser for one answer-set line of the solver's output.
//!
//! The wire format is `{pred(arg,...), pred2, ...}`: predicate names are
//! lowercase (optionally strongly negated with a `-` prefix), arguments are
//! nonnegative integers, bare constant symbols, or quoted strings. Bare
//! symbols and quoted strings stay distinct ground terms.

use crate::asp::{GroundTerm, RawAnswerSet};
use crate::error::ParseError;
use crate::parser::cursor::Cursor;
use crate::parser::lexer::TokenKind;

pub(crate) fn answer_set(line: &str) -> Result<RawAnswerSet, ParseError> {
    let mut cur = Cursor::new(line)?;
    cur.expect(&TokenKind::LBrace)?;
    let mut set = RawAnswerSet::new();
    if !cur.eat(&TokenKind::RBrace) {
        loop {
            let (predicate, args) = fact(&mut cur)?;
            set.push(predicate, args);
            if !cur.eat(&TokenKind::Comma) {
                break;
            }
        }
        cur.expect(&TokenKind::RBrace)?;
    }
    if !cur.at_end() {
        return Err(cur.error("trailing input after answer set"));
    }
    Ok(set)
}

fn fact(cur: &mut Cursor<'_>) -> Result<(String, Vec<GroundTerm>), ParseError> {
    let strongly_negated = cur.eat(&TokenKind::Minus);
    let name = match cur.advance() {
        Some(TokenKind::Ident(name))
            if name.starts_with(|c: char| c.is_ascii_lowercase()) =>
        {
            name
        }
        _ => return Err(cur.error("expected a predicate name")),
    };
    let predicate = if strongly_negated {
        format!("-{name}")
    } else {
        name
    };

    let mut args = Vec::new();
    if cur.eat(&TokenKind::LParen) {
        loop {
            args.push(argument(cur)?);
            if !cur.eat(&TokenKind::Comma) {
                break;
            }
        }
        cur.expect(&TokenKind::RParen)?;
    }
    Ok((predicate, args))
}

fn argument(cur: &mut Cursor<'_>) -> Result<GroundTerm, ParseError> {
    match cur.advance() {
        Some(TokenKind::Int(n)) => Ok(GroundTerm::Int(n)),
        Some(TokenKind::Quoted(s)) => Ok(GroundTerm::Str(s)),
        Some(TokenKind::Ident(name))
            if name.starts_with(|c: char| c.is_ascii_lowercase()) =>
        {
            Ok(GroundTerm::Sym(name))
        }
        _ => Err(cur.error("expected a ground term")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_answer_set() {
        let set = answer_set("{}").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn facts_with_mixed_arguments() {
        let set = answer_set(r#"{p(abc,1), p(def,0), q("a b\"c"), flag}"#).unwrap();
        assert_eq!(
            set.get("p"),
            &[
                vec![GroundTerm::Sym("abc".into()), GroundTerm::Int(1)],
                vec![GroundTerm::Sym("def".into()), GroundTerm::Int(0)],
            ]
        );
        assert_eq!(set.get("q"), &[vec![GroundTerm::Str(r#"a b"c"#.into())]]);
        assert_eq!(set.get("flag"), &[vec![]]);
    }

    #[test]
    fn symbols_and_strings_stay_distinct() {
        let set = answer_set(r#"{p(abc), p("abc")}"#).unwrap();
        assert_eq!(
            set.get("p"),
            &[
                vec![GroundTerm::Sym("abc".into())],
                vec![GroundTerm::Str("abc".into())],
            ]
        );
    }

    #[test]
    fn strongly_negated_facts() {
        let set = answer_set("{-p(1)}").unwrap();
        assert_eq!(set.get("-p"), &[vec![GroundTerm::Int(1)]]);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(answer_set("").is_err());
        assert!(answer_set("{p(1)").is_err());
        assert!(answer_set("{p(1)} trailing").is_err());
        assert!(answer_set("{P(1)}").is_err());
    }
}

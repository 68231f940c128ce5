//! Recursive-descent grammar for the OUTPUT statement.

use crate::asp::{Literal, Query, Term};
use crate::error::ParseError;
use crate::output::{DictionaryExpr, Expr, OutputSpec, SequenceExpr, SetExpr};
use crate::parser::cursor::Cursor;
use crate::parser::lexer::TokenKind;
use crate::value::Value;

/// Parse an OUTPUT statement; the `OUTPUT` keyword itself is consumed here.
pub(crate) fn statement(cur: &mut Cursor<'_>) -> Result<OutputSpec, crate::error::SeshError> {
    cur.expect_keyword("OUTPUT")?;
    cur.expect(&TokenKind::LBrace)?;
    let mut bindings = Vec::new();
    while !cur.eat(&TokenKind::RBrace) {
        let name = cur.expect_ident("an output name")?;
        cur.expect(&TokenKind::Eq)?;
        let expr = expr(cur)?;
        cur.expect(&TokenKind::Semi)?;
        bindings.push((name, expr));
    }
    Ok(OutputSpec::new(bindings)?)
}

fn expr(cur: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    match cur.peek() {
        Some(TokenKind::Int(_)) | Some(TokenKind::Minus) => {
            let negative = cur.eat(&TokenKind::Minus);
            match cur.advance() {
                Some(TokenKind::Int(n)) => {
                    Ok(Expr::Constant(Value::Int(if negative { -n } else { n })))
                }
                _ => Err(cur.error("expected an integer literal")),
            }
        }
        Some(TokenKind::Quoted(s)) => {
            let value = Value::Str(s.clone());
            cur.advance();
            Ok(Expr::Constant(value))
        }
        Some(TokenKind::Amp) => {
            cur.advance();
            Ok(Expr::Reference(cur.expect_ident("a referenced name")?))
        }
        // A plain tuple: object expression without a constructor.
        Some(TokenKind::LParen) => {
            cur.advance();
            object(cur, None)
        }
        Some(TokenKind::Ident(name)) => {
            let is_collection = matches!(cur.peek_at(1), Some(TokenKind::LBrace));
            if is_collection && name.eq_ignore_ascii_case("set") {
                cur.advance();
                cur.advance();
                set_body(cur)
            } else if is_collection && name.eq_ignore_ascii_case("sequence") {
                cur.advance();
                cur.advance();
                sequence_body(cur)
            } else if is_collection && name.eq_ignore_ascii_case("dictionary") {
                cur.advance();
                cur.advance();
                dictionary_body(cur)
            } else if name.starts_with(|c: char| c.is_ascii_uppercase())
                && !matches!(cur.peek_at(1), Some(TokenKind::LParen) | Some(TokenKind::Dot))
            {
                let name = name.clone();
                cur.advance();
                Ok(Expr::Variable(name))
            } else {
                let constructor = cur.qualified_ident("a constructor name")?;
                cur.expect(&TokenKind::LParen)?;
                object(cur, Some(constructor))
            }
        }
        _ => Err(cur.error("expected an expression")),
    }
}

/// The argument list of an object expression, after the opening parenthesis.
fn object(cur: &mut Cursor<'_>, constructor: Option<String>) -> Result<Expr, ParseError> {
    let mut args = Vec::new();
    if cur.peek() != Some(&TokenKind::RParen) {
        loop {
            args.push(expr(cur)?);
            if !cur.eat(&TokenKind::Comma) {
                break;
            }
            if cur.peek() == Some(&TokenKind::RParen) {
                break;
            }
        }
    }
    cur.expect(&TokenKind::RParen)?;
    Ok(Expr::Object { constructor, args })
}

// ---- collection bodies ----

/// Tracks the clauses of one collection while they are parsed in any order.
#[derive(Default)]
struct Clauses {
    query: Option<Query>,
    content: Option<Expr>,
    index: Option<String>,
    key: Option<Expr>,
}

impl Clauses {
    fn require_query(&mut self, cur: &Cursor<'_>) -> Result<Query, ParseError> {
        self.query
            .take()
            .ok_or_else(|| cur.error("collection is missing its query clause"))
    }

    fn require_content(&mut self, cur: &Cursor<'_>) -> Result<Expr, ParseError> {
        self.content
            .take()
            .ok_or_else(|| cur.error("collection is missing its content clause"))
    }
}

/// Parse `query:`/`content:`/`index:`/`key:` clauses until the closing brace.
/// `allowed` names the clauses valid for this collection kind.
fn clauses(cur: &mut Cursor<'_>, allowed: &[&str]) -> Result<Clauses, ParseError> {
    let mut out = Clauses::default();
    while !cur.eat(&TokenKind::RBrace) {
        let clause = allowed
            .iter()
            .find(|&&c| cur.is_keyword(c))
            .copied()
            .ok_or_else(|| cur.error("expected a collection clause"))?;
        cur.advance();
        cur.expect(&TokenKind::Colon)?;
        let duplicate = match clause {
            "query" => out.query.replace(query(cur)?).is_some(),
            "content" => out.content.replace(expr(cur)?).is_some(),
            "index" => out.index.replace(variable(cur)?).is_some(),
            "key" => out.key.replace(expr(cur)?).is_some(),
            _ => unreachable!(),
        };
        if duplicate {
            return Err(cur.error(format!("duplicate {clause} clause")));
        }
        cur.expect(&TokenKind::Semi)?;
    }
    Ok(out)
}

fn set_body(cur: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    // `set { pred/arity }`, optionally `-> constructor`, is shorthand for a
    // set of the predicate's argument tuples.
    if matches!(cur.peek(), Some(TokenKind::Ident(_)))
        && cur.peek_at(1) == Some(&TokenKind::Slash)
    {
        return simple_set_body(cur);
    }
    let mut parsed = clauses(cur, &["query", "content"])?;
    let query = parsed.require_query(cur)?;
    let content = parsed.require_content(cur)?;
    Ok(Expr::Set(SetExpr {
        query,
        content: Box::new(content),
        captures: None,
    }))
}

fn simple_set_body(cur: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let predicate = match cur.advance() {
        Some(TokenKind::Ident(name))
            if name.starts_with(|c: char| c.is_ascii_lowercase()) =>
        {
            name
        }
        _ => return Err(cur.error("expected a predicate name")),
    };
    cur.expect(&TokenKind::Slash)?;
    let arity = match cur.advance() {
        Some(TokenKind::Int(n)) if n >= 0 => n as usize,
        _ => return Err(cur.error("expected a predicate arity")),
    };
    let constructor = if cur.eat(&TokenKind::Arrow) {
        Some(cur.qualified_ident("a constructor name")?)
    } else {
        None
    };
    cur.expect(&TokenKind::RBrace)?;

    let variables: Vec<String> = (0..arity).map(|i| format!("X{i}")).collect();
    let query = Query::new(vec![Literal::new(
        predicate,
        variables.iter().map(|v| Term::Var(v.clone())).collect(),
        false,
    )]);
    // 1-tuples without a constructor are unpacked automatically.
    let content = if arity == 1 && constructor.is_none() {
        Expr::Variable(variables[0].clone())
    } else {
        Expr::Object {
            constructor,
            args: variables.into_iter().map(Expr::Variable).collect(),
        }
    };
    Ok(Expr::Set(SetExpr {
        query,
        content: Box::new(content),
        captures: None,
    }))
}

fn sequence_body(cur: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let mut parsed = clauses(cur, &["query", "content", "index"])?;
    let query = parsed.require_query(cur)?;
    let content = parsed.require_content(cur)?;
    let index = parsed
        .index
        .take()
        .ok_or_else(|| cur.error("sequence is missing its index clause"))?;
    Ok(Expr::Sequence(SequenceExpr {
        query,
        content: Box::new(content),
        index,
        captures: None,
    }))
}

fn dictionary_body(cur: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let mut parsed = clauses(cur, &["query", "content", "key"])?;
    let query = parsed.require_query(cur)?;
    let content = parsed.require_content(cur)?;
    let key = parsed
        .key
        .take()
        .ok_or_else(|| cur.error("dictionary is missing its key clause"))?;
    Ok(Expr::Dictionary(DictionaryExpr {
        query,
        content: Box::new(content),
        key: Box::new(key),
        captures: None,
    }))
}

// ---- queries ----

/// An ASP variable name: uppercase first letter.
fn variable(cur: &mut Cursor<'_>) -> Result<String, ParseError> {
    match cur.peek() {
        Some(TokenKind::Ident(name))
            if name.starts_with(|c: char| c.is_ascii_uppercase()) =>
        {
            let name = name.clone();
            cur.advance();
            Ok(name)
        }
        _ => Err(cur.error("expected an ASP variable")),
    }
}

pub(crate) fn query(cur: &mut Cursor<'_>) -> Result<Query, ParseError> {
    let mut literals = vec![literal(cur)?];
    while cur.eat(&TokenKind::Comma) {
        literals.push(literal(cur)?);
    }
    Ok(Query::new(literals))
}

/// The builtin comparison predicate for an operator token, if any.
fn builtin_op(kind: &TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::Eq => Some("="),
        TokenKind::EqEq => Some("=="),
        TokenKind::BangEq => Some("!="),
        TokenKind::LtGt => Some("<>"),
        TokenKind::Lt => Some("<"),
        TokenKind::Le => Some("<="),
        TokenKind::Gt => Some(">"),
        TokenKind::Ge => Some(">="),
        TokenKind::Hash(name) if name == "succ" => Some("#succ"),
        _ => None,
    }
}

fn literal(cur: &mut Cursor<'_>) -> Result<Literal, ParseError> {
    // `not` default-negates whatever atom follows.
    let negated = cur.is_keyword("not")
        && !matches!(cur.peek_at(1), Some(TokenKind::LParen) | Some(TokenKind::Comma));
    if negated {
        cur.advance();
    }

    // Prefix builtin: `<(X, Y)`, `#succ(X, Y)`.
    if let Some(op) = cur.peek().and_then(builtin_op).map(str::to_string) {
        cur.advance();
        cur.expect(&TokenKind::LParen)?;
        let left = term(cur)?;
        cur.expect(&TokenKind::Comma)?;
        let right = term(cur)?;
        cur.expect(&TokenKind::RParen)?;
        return Ok(Literal::new(op, vec![left, right], negated));
    }

    // Classical atom, with an optional `-` for strong negation.
    let strongly_negated = cur.eat(&TokenKind::Minus);
    if let Some(TokenKind::Ident(name)) = cur.peek() {
        if name.starts_with(|c: char| c.is_ascii_lowercase()) {
            let name = name.clone();
            cur.advance();
            let predicate = if strongly_negated {
                format!("-{name}")
            } else {
                name
            };
            let mut args = Vec::new();
            if cur.eat(&TokenKind::LParen) {
                if cur.peek() != Some(&TokenKind::RParen) {
                    loop {
                        args.push(term(cur)?);
                        if !cur.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                cur.expect(&TokenKind::RParen)?;
            }
            return Ok(Literal::new(predicate, args, negated));
        }
    }
    if strongly_negated {
        return Err(cur.error("expected a predicate name after '-'"));
    }

    // Infix builtin: `X < Y`.
    let left = term(cur)?;
    let op = cur
        .peek()
        .and_then(builtin_op)
        .map(str::to_string)
        .ok_or_else(|| cur.error("expected a comparison operator"))?;
    cur.advance();
    let right = term(cur)?;
    Ok(Literal::new(op, vec![left, right], negated))
}

fn term(cur: &mut Cursor<'_>) -> Result<Term, ParseError> {
    match cur.peek() {
        Some(TokenKind::Int(n)) => {
            let n = *n;
            cur.advance();
            Ok(Term::Int(n))
        }
        Some(TokenKind::Quoted(s)) => {
            let s = s.clone();
            cur.advance();
            Ok(Term::Str(s))
        }
        Some(TokenKind::Ident(name)) => {
            let term = if name == "_" {
                Term::Anon
            } else if name.starts_with(|c: char| c.is_ascii_uppercase() || c == '_') {
                Term::Var(name.clone())
            } else {
                Term::Sym(name.clone())
            };
            cur.advance();
            Ok(term)
        }
        _ => Err(cur.error("expected a term")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_output_spec;

    #[test]
    fn constructor_and_tuple_expressions() {
        let spec = parse_output_spec(
            r#"OUTPUT {
                t = (1, -2, "three");
                c = colors.Color(255, 0, 0);
                e = ();
            }"#,
        )
        .unwrap();
        let names: Vec<&str> = spec.names().collect();
        assert_eq!(names, ["t", "c", "e"]);
    }

    #[test]
    fn builtin_atoms_infix_and_prefix() {
        let spec = parse_output_spec(
            "OUTPUT { xs = set { query: p(X, Y), X < Y, #succ(X, Y), not q(X); content: X; }; }",
        )
        .unwrap();
        assert_eq!(
            spec.additional_rules(),
            ["sesh__0(X) :- p(X,Y),<(X,Y),#succ(X,Y),not q(X)."]
        );
    }

    #[test]
    fn strong_negation_in_queries() {
        let spec = parse_output_spec(
            "OUTPUT { xs = set { query: -p(X); content: X; }; }",
        )
        .unwrap();
        assert_eq!(spec.additional_rules(), ["sesh__0(X) :- -p(X)."]);
    }

    #[test]
    fn clauses_in_any_order() {
        let spec = parse_output_spec(
            "OUTPUT { xs = sequence { index: I; query: p(X, I); content: X; }; }",
        )
        .unwrap();
        assert_eq!(spec.additional_rules(), ["sesh__0(X,I) :- p(X,I)."]);
    }

    #[test]
    fn duplicate_clause_rejected() {
        let err = parse_output_spec(
            "OUTPUT { xs = set { query: p(X); query: q(X); content: X; }; }",
        )
        .unwrap_err();
        assert!(format!("{err}").contains("duplicate"));
    }

    #[test]
    fn missing_clause_rejected() {
        assert!(parse_output_spec("OUTPUT { xs = set { content: X; }; }").is_err());
        assert!(
            parse_output_spec("OUTPUT { xs = sequence { query: p(X, I); content: X; }; }")
                .is_err()
        );
        assert!(
            parse_output_spec("OUTPUT { d = dictionary { query: p(K, V); content: V; }; }")
                .is_err()
        );
    }

    #[test]
    fn simple_set_with_constructor() {
        let spec = parse_output_spec("OUTPUT { xs = set { edge/2 -> graph.Edge }; }").unwrap();
        assert_eq!(spec.additional_rules(), ["sesh__0(X0,X1) :- edge(X0,X1)."]);
    }

    #[test]
    fn keywords_are_caseless() {
        let spec = parse_output_spec(
            "output { xs = SET { QUERY: p(X); CONTENT: X; }; }",
        )
        .unwrap();
        assert_eq!(spec.additional_rules(), ["sesh__0(X) :- p(X)."]);
    }
}

//! Recursive-descent grammar for the INPUT statement.

use crate::error::ParseError;
use crate::input::{Accessor, InputSpec, Iteration, PredicateRule, Step, Target};
use crate::parser::cursor::Cursor;
use crate::parser::lexer::TokenKind;
use crate::value::SubscriptKey;

/// Names that cannot be used as variables inside an INPUT statement.
fn is_reserved(name: &str) -> bool {
    name == "_" || name.eq_ignore_ascii_case("for") || name.eq_ignore_ascii_case("in")
}

fn variable_name(cur: &mut Cursor<'_>) -> Result<String, ParseError> {
    match cur.peek() {
        Some(TokenKind::Ident(name)) if !is_reserved(name) => {
            let name = name.clone();
            cur.advance();
            Ok(name)
        }
        _ => Err(cur.error("expected a variable name")),
    }
}

/// Parse an INPUT statement; the `INPUT` keyword itself is consumed here.
pub(crate) fn statement(cur: &mut Cursor<'_>) -> Result<InputSpec, crate::error::SeshError> {
    cur.expect_keyword("INPUT")?;
    cur.expect(&TokenKind::LParen)?;
    let parameters = parameters(cur)?;
    cur.expect(&TokenKind::RParen)?;
    cur.expect(&TokenKind::LBrace)?;
    let mut rules = Vec::new();
    while !cur.eat(&TokenKind::RBrace) {
        rules.push(rule(cur)?);
    }
    Ok(InputSpec::new(parameters, rules)?)
}

/// The parameter list: optionally typed names, trailing comma allowed.
/// Type annotations (`Set<Node> xs`) are parsed and discarded.
fn parameters(cur: &mut Cursor<'_>) -> Result<Vec<String>, ParseError> {
    let mut names = Vec::new();
    if cur.peek() == Some(&TokenKind::RParen) {
        return Ok(names);
    }
    loop {
        names.push(parameter(cur)?);
        if !cur.eat(&TokenKind::Comma) {
            break;
        }
        // Trailing comma.
        if cur.peek() == Some(&TokenKind::RParen) {
            break;
        }
    }
    Ok(names)
}

fn parameter(cur: &mut Cursor<'_>) -> Result<String, ParseError> {
    let first = cur.qualified_ident("parameter name")?;
    match cur.peek() {
        // `Type name` with the type discarded.
        Some(TokenKind::Ident(_)) => variable_name(cur),
        // `Type<args...> name`, also discarded.
        Some(TokenKind::Lt) => {
            skip_type_arguments(cur)?;
            variable_name(cur)
        }
        _ => {
            if first.contains('.') || is_reserved(&first) {
                Err(cur.error("expected a parameter name"))
            } else {
                Ok(first)
            }
        }
    }
}

/// Skip a balanced `<...>` type-argument list.
fn skip_type_arguments(cur: &mut Cursor<'_>) -> Result<(), ParseError> {
    cur.expect(&TokenKind::Lt)?;
    let mut depth = 1usize;
    while depth > 0 {
        match cur.advance() {
            Some(TokenKind::Lt) => depth += 1,
            Some(TokenKind::Gt) => depth -= 1,
            Some(TokenKind::Ident(_)) | Some(TokenKind::Comma) | Some(TokenKind::Dot) => {}
            _ => return Err(cur.error("malformed type annotation")),
        }
    }
    Ok(())
}

/// One predicate rule: `pred(accessors) for t in a ... ;`
fn rule(cur: &mut Cursor<'_>) -> Result<PredicateRule, ParseError> {
    let strongly_negated = cur.eat(&TokenKind::Minus);
    let name = match cur.peek() {
        Some(TokenKind::Ident(name))
            if name.starts_with(|c: char| c.is_ascii_lowercase()) =>
        {
            let name = name.clone();
            cur.advance();
            name
        }
        _ => return Err(cur.error("expected a predicate name")),
    };
    let predicate = if strongly_negated {
        format!("-{name}")
    } else {
        name
    };

    cur.expect(&TokenKind::LParen)?;
    let mut arguments = Vec::new();
    if cur.peek() != Some(&TokenKind::RParen) {
        loop {
            arguments.push(accessor(cur)?);
            if !cur.eat(&TokenKind::Comma) {
                break;
            }
            if cur.peek() == Some(&TokenKind::RParen) {
                break;
            }
        }
    }
    cur.expect(&TokenKind::RParen)?;

    let mut iterations = Vec::new();
    while cur.eat_keyword("for") {
        let target = target(cur)?;
        cur.expect_keyword("in")?;
        let source = accessor(cur)?;
        iterations.push(Iteration { target, source });
    }
    cur.expect(&TokenKind::Semi)?;

    Ok(PredicateRule {
        predicate,
        arguments,
        iterations,
    })
}

fn target(cur: &mut Cursor<'_>) -> Result<Target, ParseError> {
    match cur.peek() {
        Some(TokenKind::Ident(name)) if name == "_" => {
            cur.advance();
            Ok(Target::Anon)
        }
        Some(TokenKind::Ident(_)) => Ok(Target::Name(variable_name(cur)?)),
        Some(TokenKind::LParen) => {
            cur.advance();
            let mut targets = vec![target(cur)?];
            while cur.eat(&TokenKind::Comma) {
                if cur.peek() == Some(&TokenKind::RParen) {
                    break;
                }
                targets.push(target(cur)?);
            }
            cur.expect(&TokenKind::RParen)?;
            Ok(Target::Tuple(targets))
        }
        _ => Err(cur.error("expected an iteration target")),
    }
}

fn accessor(cur: &mut Cursor<'_>) -> Result<Accessor, ParseError> {
    let base = variable_name(cur)?;
    let mut path = Vec::new();
    loop {
        match cur.peek() {
            Some(TokenKind::Dot) => {
                cur.advance();
                path.push(Step::Field(cur.expect_ident("field name")?));
            }
            Some(TokenKind::LBracket) => {
                cur.advance();
                let key = subscript(cur)?;
                cur.expect(&TokenKind::RBracket)?;
                path.push(Step::Index(key));
            }
            _ => break,
        }
    }
    Ok(Accessor { base, path })
}

fn subscript(cur: &mut Cursor<'_>) -> Result<SubscriptKey, ParseError> {
    let negative = cur.eat(&TokenKind::Minus);
    match cur.advance() {
        Some(TokenKind::Int(n)) => Ok(SubscriptKey::Int(if negative { -n } else { n })),
        Some(TokenKind::Quoted(s)) if !negative => Ok(SubscriptKey::Str(s)),
        _ => Err(cur.error("expected an integer or string subscript")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SeshError, SpecError};
    use crate::parser::parse_input_spec;

    #[test]
    fn parses_typed_and_untyped_parameters() {
        let spec = parse_input_spec(
            "INPUT (graph.Graph g, Set<Node> nodes, plain, trailing,) { }",
        )
        .unwrap();
        assert_eq!(spec.parameters(), ["g", "nodes", "plain", "trailing"]);
    }

    #[test]
    fn parses_rules_with_iterations() {
        let spec = parse_input_spec(
            r#"INPUT (g) {
                vertex(v) for v in g.vertices;
                edge(e[0], e[1]) for e in g.edges;
                label(v, l) for (v, ls) in g.labels for (_, l) in ls;
                size(g.edges[0][1]);
            }"#,
        )
        .unwrap();
        assert_eq!(spec.parameters(), ["g"]);
    }

    #[test]
    fn keywords_cannot_be_variables() {
        assert!(parse_input_spec("INPUT (for) { }").is_err());
        assert!(parse_input_spec("INPUT (x) { p(y) for In in x; }").is_err());
        assert!(parse_input_spec("INPUT (_) { }").is_err());
    }

    #[test]
    fn missing_semicolon_is_a_parse_error() {
        let err = parse_input_spec("INPUT (x) { p(x) }").unwrap_err();
        assert!(matches!(err, SeshError::Parse(_)));
    }

    #[test]
    fn scope_errors_are_not_parse_errors() {
        let err = parse_input_spec("INPUT (x, x) { }").unwrap_err();
        assert!(matches!(
            err,
            SeshError::Spec(SpecError::RedefinedName { .. })
        ));
    }

    #[test]
    fn string_subscripts_unescape() {
        let spec = parse_input_spec(r#"INPUT (m) { p(m["a\"b"]); }"#).unwrap();
        assert_eq!(spec.parameters(), ["m"]);
    }
}

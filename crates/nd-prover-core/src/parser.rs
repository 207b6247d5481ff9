//! Tokenizer and recursive-descent parser from the textual syntax (§4.2) into
//! `Formula`/`Term`, plus the line/justification/premise-list entry points
//! built on top of it. The binary-connective grammar is one function:
//! `parse_formula` scans its whole token slice once for the lowest-precedence
//! operator still at paren-depth 0 and splits there, rather than stacking one
//! function per precedence level — ties go rightmost for the left-associative
//! operators (`∧ ∨ ↔`) and leftmost for the right-associative `→`.

use crate::error::ParsingError;
use crate::models::formula::{Formula, Term};
use crate::models::logic::Logic;
use crate::models::rule::Rule;
use crate::checker::CitationRef;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dash,
    Not,
    And,
    Or,
    Imp,
    Iff,
    Bot,
    Forall,
    Exists,
    Box_,
    Dia,
    Eq,
    Ident(String),
    Number(usize),
}

fn tokenize(s: &str) -> Result<Vec<Token>, ParsingError> {
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;
    let mut out = Vec::new();
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '_' && chars.get(i + 1) == Some(&'|') && chars.get(i + 2) == Some(&'_') {
            out.push(Token::Bot);
            i += 3;
            continue;
        }
        if c == '-' && chars.get(i + 1) == Some(&'>') {
            out.push(Token::Imp);
            i += 2;
            continue;
        }
        if c == '<' && chars.get(i + 1) == Some(&'-') && chars.get(i + 2) == Some(&'>') {
            out.push(Token::Iff);
            i += 3;
            continue;
        }
        if c == '<' && chars.get(i + 1) == Some(&'>') {
            out.push(Token::Dia);
            i += 2;
            continue;
        }
        if c == '[' && chars.get(i + 1) == Some(&']') {
            out.push(Token::Box_);
            i += 2;
            continue;
        }
        match c {
            '¬' | '!' => {
                out.push(Token::Not);
                i += 1;
            }
            '∧' | '&' => {
                out.push(Token::And);
                i += 1;
            }
            '∨' | '|' => {
                out.push(Token::Or);
                i += 1;
            }
            '→' => {
                out.push(Token::Imp);
                i += 1;
            }
            '↔' => {
                out.push(Token::Iff);
                i += 1;
            }
            '⊥' => {
                out.push(Token::Bot);
                i += 1;
            }
            '∀' => {
                out.push(Token::Forall);
                i += 1;
            }
            '∃' => {
                out.push(Token::Exists);
                i += 1;
            }
            '☐' => {
                out.push(Token::Box_);
                i += 1;
            }
            '◇' => {
                out.push(Token::Dia);
                i += 1;
            }
            '=' => {
                out.push(Token::Eq);
                i += 1;
            }
            '(' => {
                out.push(Token::LParen);
                i += 1;
            }
            ')' => {
                out.push(Token::RParen);
                i += 1;
            }
            ',' => {
                out.push(Token::Comma);
                i += 1;
            }
            ';' => {
                out.push(Token::Semicolon);
                i += 1;
            }
            '-' | '–' | '—' => {
                out.push(Token::Dash);
                i += 1;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                out.push(Token::Number(text.parse().unwrap()));
            }
            c if c.is_alphanumeric() => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                if (name == "A" || name == "E") && chars.get(i) == Some(&'.') {
                    i += 1;
                    out.push(if name == "A" { Token::Forall } else { Token::Exists });
                } else {
                    out.push(Token::Ident(name));
                }
            }
            other => {
                return Err(ParsingError::new(format!("unexpected character '{}'", other)));
            }
        }
    }
    Ok(out)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Iff,
    Imp,
    Or,
    And,
}

impl BinOp {
    fn precedence(self) -> u8 {
        match self {
            BinOp::Iff => 0,
            BinOp::Imp => 1,
            BinOp::Or => 2,
            BinOp::And => 3,
        }
    }

    fn right_associative(self) -> bool {
        matches!(self, BinOp::Imp)
    }

    fn build(self, a: Formula, b: Formula) -> Formula {
        match self {
            BinOp::Iff => Formula::iff(a, b),
            BinOp::Imp => Formula::imp(a, b),
            BinOp::Or => Formula::or(a, b),
            BinOp::And => Formula::and(a, b),
        }
    }
}

/// The lowest-precedence depth-0 binary operator in `tokens`, and the index
/// to split on — rightmost occurrence for the three left-associative
/// operators, leftmost for `→`.
fn find_main_connective(tokens: &[Token]) -> Option<(usize, BinOp)> {
    let mut depth = 0i32;
    let mut best: Option<(usize, BinOp)> = None;
    for (idx, tok) in tokens.iter().enumerate() {
        match tok {
            Token::LParen => depth += 1,
            Token::RParen => depth -= 1,
            _ if depth == 0 => {
                let op = match tok {
                    Token::Iff => BinOp::Iff,
                    Token::Imp => BinOp::Imp,
                    Token::Or => BinOp::Or,
                    Token::And => BinOp::And,
                    _ => continue,
                };
                let take = match best {
                    None => true,
                    Some((_, b)) if op.precedence() < b.precedence() => true,
                    Some((_, b)) if op.precedence() == b.precedence() => !op.right_associative(),
                    _ => false,
                };
                if take {
                    best = Some((idx, op));
                }
            }
            _ => {}
        }
    }
    best
}

fn parse_formula_tokens(tokens: &[Token]) -> Result<Formula, ParsingError> {
    if tokens.is_empty() {
        return Err(ParsingError::new("expected a formula, found nothing"));
    }
    if let Some((idx, op)) = find_main_connective(tokens) {
        let left = parse_formula_tokens(&tokens[..idx])?;
        let right = parse_formula_tokens(&tokens[idx + 1..])?;
        return Ok(op.build(left, right));
    }
    parse_prefix_or_atom(tokens)
}

fn parse_prefix_or_atom(tokens: &[Token]) -> Result<Formula, ParsingError> {
    match &tokens[0] {
        Token::Not => Ok(Formula::not(parse_formula_tokens(&tokens[1..])?)),
        Token::Box_ => Ok(Formula::BoxF(Box::new(parse_formula_tokens(&tokens[1..])?))),
        Token::Dia => Ok(Formula::Dia(Box::new(parse_formula_tokens(&tokens[1..])?))),
        Token::Forall | Token::Exists => {
            let is_forall = tokens[0] == Token::Forall;
            let var = match tokens.get(1) {
                Some(Token::Ident(name)) => name.clone(),
                _ => return Err(ParsingError::new("expected a variable after a quantifier")),
            };
            let body = parse_formula_tokens(&tokens[2..])?;
            Ok(if is_forall {
                Formula::Forall(var, Box::new(body))
            } else {
                Formula::Exists(var, Box::new(body))
            })
        }
        Token::Bot => {
            if tokens.len() != 1 {
                return Err(ParsingError::new("⊥ takes no arguments"));
            }
            Ok(Formula::Bot)
        }
        Token::LParen => {
            if !matches!(tokens.last(), Some(Token::RParen)) || !matches_outer_parens(tokens) {
                return Err(ParsingError::new("unbalanced parentheses"));
            }
            parse_formula_tokens(&tokens[1..tokens.len() - 1])
        }
        Token::Ident(_) => parse_pred_or_eq(tokens),
        other => Err(ParsingError::new(format!("unexpected token near {:?}", other))),
    }
}

fn matches_outer_parens(tokens: &[Token]) -> bool {
    let mut depth = 0i32;
    for (i, tok) in tokens.iter().enumerate() {
        match tok {
            Token::LParen => depth += 1,
            Token::RParen => depth -= 1,
            _ => {}
        }
        if depth == 0 && i != tokens.len() - 1 {
            return false;
        }
    }
    depth == 0
}

/// A bare single-letter name is a variable when it falls in `s..=z`, a
/// constant otherwise — the convention the data model fixes for individual
/// terms (predicate and function names are never reclassified this way).
fn classify_bare_ident(name: &str) -> Term {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() && ('s'..='z').contains(&c) => Term::var(name),
        _ => Term::constant(name),
    }
}

fn parse_pred_or_eq(tokens: &[Token]) -> Result<Formula, ParsingError> {
    let (name, rest) = match tokens.first() {
        Some(Token::Ident(name)) => (name.clone(), &tokens[1..]),
        other => return Err(ParsingError::new(format!("expected a predicate or term, found {:?}", other))),
    };
    if let Some(Token::LParen) = rest.first() {
        let (args, after) = parse_term_list(&rest[1..])?;
        if !after.is_empty() {
            return Err(ParsingError::new("unexpected tokens after a predicate"));
        }
        return Ok(Formula::Pred(name, args));
    }
    if let Some(Token::Eq) = rest.first() {
        let lhs = classify_bare_ident(&name);
        let (rhs, after) = parse_term(&rest[1..])?;
        if !after.is_empty() {
            return Err(ParsingError::new("unexpected tokens after an equality"));
        }
        return Ok(Formula::Eq(lhs, rhs));
    }
    if !rest.is_empty() {
        return Err(ParsingError::new("unexpected tokens after a predicate"));
    }
    Ok(Formula::Pred(name, Vec::new()))
}

/// Parse one term (`name`, `name(t1, t2, ...)`, or a bare variable/constant
/// classified by `classify_bare_ident`) from the front of `tokens`,
/// returning it with the unconsumed remainder.
fn parse_term(tokens: &[Token]) -> Result<(Term, &[Token]), ParsingError> {
    match tokens.first() {
        Some(Token::Ident(name)) => {
            let rest = &tokens[1..];
            if let Some(Token::LParen) = rest.first() {
                let (args, after) = parse_term_list(&rest[1..])?;
                Ok((Term::Func(name.clone(), args), after))
            } else {
                Ok((classify_bare_ident(name), rest))
            }
        }
        other => Err(ParsingError::new(format!("expected a term, found {:?}", other))),
    }
}

fn parse_term_list(tokens: &[Token]) -> Result<(Vec<Term>, &[Token]), ParsingError> {
    let mut args = Vec::new();
    let mut rest = tokens;
    loop {
        let (t, after) = parse_term(rest)?;
        args.push(t);
        match after.first() {
            Some(Token::Comma) => rest = &after[1..],
            Some(Token::RParen) => return Ok((args, &after[1..])),
            other => return Err(ParsingError::new(format!("expected ',' or ')', found {:?}", other))),
        }
    }
}

/// Parse a bare formula with no justification (`parse_assumption`).
pub fn parse_formula(s: &str) -> Result<Formula, ParsingError> {
    let tokens = tokenize(s)?;
    parse_formula_tokens(&tokens)
}

/// `parse_formula`, rejecting anything outside `logic`'s fragment.
pub fn parse_and_verify_formula(s: &str, logic: Logic) -> Result<Formula, ParsingError> {
    let formula = parse_formula(s)?;
    if logic.is_wellformed(&formula) {
        Ok(formula)
    } else {
        Err(ParsingError::new(format!("{} is not a wellformed {} formula", formula, logic)))
    }
}

/// Split `s` on top-level `,`/`;` and parse each piece, or the empty list
/// when `s` trims to `NA` (case-insensitive).
pub fn parse_and_verify_premises(s: &str, logic: Logic) -> Result<Vec<Formula>, ParsingError> {
    if s.trim().eq_ignore_ascii_case("NA") {
        return Ok(Vec::new());
    }
    split_top_level(s, &[',', ';'])
        .into_iter()
        .filter(|piece| !piece.trim().is_empty())
        .map(|piece| parse_and_verify_formula(piece.trim(), logic))
        .collect()
}

/// Split `s` at top-level (paren-depth 0) occurrences of any char in
/// `separators`.
fn split_top_level(s: &str, separators: &[char]) -> Vec<&str> {
    let mut depth = 0i32;
    let mut parts = Vec::new();
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if depth == 0 && separators.contains(&c) => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// `<rule> [<citations>]` — the part of a line after the `;` separator.
pub fn parse_justification(s: &str) -> Result<(Rule, Vec<CitationRef>), ParsingError> {
    let trimmed = s.trim_start();
    if trimmed.is_empty() {
        return Err(ParsingError::new("expected a rule name"));
    }
    let boundary = trimmed.find(|c: char| c.is_whitespace()).unwrap_or(trimmed.len());
    let rule_text = &trimmed[..boundary];
    let rule = Rule::from_token(rule_text)
        .ok_or_else(|| ParsingError::new(format!("unknown rule '{}'", rule_text)))?;
    let citation_text = trimmed[boundary..].trim();
    let citations = if citation_text.is_empty() {
        Vec::new()
    } else {
        parse_citations(citation_text)?
    };
    Ok((rule, citations))
}

fn parse_citations(s: &str) -> Result<Vec<CitationRef>, ParsingError> {
    split_top_level(s, &[','])
        .into_iter()
        .map(|piece| piece.trim())
        .filter(|piece| !piece.is_empty())
        .map(parse_one_citation)
        .collect()
}

fn parse_one_citation(piece: &str) -> Result<CitationRef, ParsingError> {
    let tokens = tokenize(piece)?;
    match tokens.as_slice() {
        [Token::Number(n)] => Ok(CitationRef::Line(*n)),
        [Token::Number(a), Token::Dash, Token::Number(b)] => Ok(CitationRef::Range(*a, *b)),
        _ => Err(ParsingError::new(format!("malformed citation '{}'", piece))),
    }
}

/// `<formula> ; <rule> [<citations>]`.
pub fn parse_line(s: &str) -> Result<(Formula, Rule, Vec<CitationRef>), ParsingError> {
    let parts = split_top_level(s, &[';']);
    if parts.len() != 2 {
        return Err(ParsingError::new("a line is '<formula> ; <rule> [<citations>]'"));
    }
    let formula = parse_formula(parts[0].trim())?;
    let (rule, citations) = parse_justification(parts[1].trim())?;
    Ok((formula, rule, citations))
}

/// A bare formula with no justification — what `begin_subproof` takes.
///
/// Two extra forms beyond an ordinary formula open a *strict* subproof
/// (§4.3): a bare `☐` assumes `Formula::BoxMarker(None)`, the modal
/// world-shift `☐I`/`◇E` need; `☐[c]` (matching `BoxMarker`'s own `Display`)
/// assumes `Formula::BoxMarker(Some(c))`, the fresh-individual-constant
/// declaration `∀I`/`∃E` need. Neither form is reachable through the
/// ordinary formula grammar, since `☐` there always takes a formula operand.
pub fn parse_assumption(s: &str) -> Result<Formula, ParsingError> {
    let trimmed = s.trim();
    if trimmed == "☐" {
        return Ok(Formula::BoxMarker(None));
    }
    if let Some(inner) = trimmed.strip_prefix('☐').and_then(|r| r.strip_prefix('[')).and_then(|r| r.strip_suffix(']')) {
        let tokens = tokenize(inner.trim())?;
        return match tokens.as_slice() {
            [Token::Ident(name)] => Ok(Formula::BoxMarker(Some(classify_bare_ident(name)))),
            _ => Err(ParsingError::new(format!("expected a single constant inside ☐[...], found '{}'", inner))),
        };
    }
    parse_formula(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conjunction_with_correct_precedence() {
        let f = parse_formula("P ∧ Q → R").unwrap();
        assert_eq!(f, Formula::imp(Formula::and(Formula::atom("P"), Formula::atom("Q")), Formula::atom("R")));
    }

    #[test]
    fn right_associates_multiple_arrows() {
        let f = parse_formula("P -> Q -> R").unwrap();
        assert_eq!(f, Formula::imp(Formula::atom("P"), Formula::imp(Formula::atom("Q"), Formula::atom("R"))));
    }

    #[test]
    fn parses_negation_binding_tighter_than_conjunction() {
        let f = parse_formula("!P & Q").unwrap();
        assert_eq!(f, Formula::and(Formula::not(Formula::atom("P")), Formula::atom("Q")));
    }

    #[test]
    fn parses_parenthesized_subexpression() {
        let f = parse_formula("(P ∨ Q) ∧ R").unwrap();
        assert_eq!(f, Formula::and(Formula::or(Formula::atom("P"), Formula::atom("Q")), Formula::atom("R")));
    }

    #[test]
    fn parses_quantifiers_and_predicates() {
        let f = parse_formula("∀x Loves(x, a)").unwrap();
        match f {
            Formula::Forall(v, body) => {
                assert_eq!(v, "x");
                assert_eq!(
                    *body,
                    Formula::Pred("Loves".to_string(), vec![Term::var("x"), Term::constant("a")])
                );
            }
            _ => panic!("expected a universal"),
        }
    }

    #[test]
    fn ascii_quantifier_alias_requires_the_trailing_dot() {
        assert!(parse_formula("A.x P(x)").is_ok());
        assert!(parse_formula("A x P(x)").is_err());
    }

    #[test]
    fn parse_line_splits_formula_and_justification() {
        let (formula, rule, citations) = parse_line("B ; →E 1, 2").unwrap();
        assert_eq!(formula, Formula::atom("B"));
        assert_eq!(rule, Rule::ImpE);
        assert_eq!(citations, vec![CitationRef::Line(1), CitationRef::Line(2)]);
    }

    #[test]
    fn parse_line_accepts_a_subproof_range_citation() {
        let (_, rule, citations) = parse_line("P → P ; →I 1–2").unwrap();
        assert_eq!(rule, Rule::ImpI);
        assert_eq!(citations, vec![CitationRef::Range(1, 2)]);
    }

    #[test]
    fn na_premise_list_is_empty() {
        assert_eq!(parse_and_verify_premises("NA", Logic::Tfl).unwrap(), Vec::new());
    }

    #[test]
    fn parse_assumption_recognizes_a_bare_box_marker() {
        assert_eq!(parse_assumption("☐").unwrap(), Formula::BoxMarker(None));
    }

    #[test]
    fn parse_assumption_recognizes_a_boxed_fresh_constant() {
        assert_eq!(parse_assumption("☐[c]").unwrap(), Formula::BoxMarker(Some(Term::constant("c"))));
        assert_eq!(parse_assumption(" ☐[ c ] ").unwrap(), Formula::BoxMarker(Some(Term::constant("c"))));
    }

    #[test]
    fn parse_assumption_still_parses_an_ordinary_boxed_formula() {
        assert_eq!(parse_assumption("☐P").unwrap(), Formula::BoxF(Box::new(Formula::atom("P"))));
    }

    #[test]
    fn premise_list_splits_on_top_level_commas() {
        let premises = parse_and_verify_premises("P, Q -> R", Logic::Tfl).unwrap();
        assert_eq!(premises.len(), 2);
    }
}

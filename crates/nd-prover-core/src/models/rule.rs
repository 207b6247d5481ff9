//! The rule catalog: one tag per inference/equivalence rule plus the
//! citation shape (`Arity`) the checker expects for it. Schema *construction*
//! — the metavariable patterns and side conditions each rule actually
//! checks against — lives in `crate::schema`, grounded on these tags and
//! arities.

use std::fmt;

/// How many plain-line citations and how many subproof citations a rule
/// takes. Every rule in this catalog has a single fixed shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub lines: usize,
    pub subproofs: usize,
}

impl Arity {
    const fn new(lines: usize, subproofs: usize) -> Self {
        Arity { lines, subproofs }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Pr,
    As,
    R,
    X,
    Ip,
    AndI,
    AndE,
    OrI,
    OrE,
    ImpI,
    ImpE,
    IffI,
    IffE,
    NotI,
    NotE,
    ForallI,
    ForallE,
    ExistsI,
    ExistsE,
    EqI,
    EqE,
    BoxI,
    DiaE,
    BoxE,
    DiaI,
}

impl Rule {
    pub const TFL_RULES: [Rule; 15] = [
        Rule::Pr,
        Rule::As,
        Rule::R,
        Rule::X,
        Rule::Ip,
        Rule::AndI,
        Rule::AndE,
        Rule::OrI,
        Rule::OrE,
        Rule::ImpI,
        Rule::ImpE,
        Rule::IffI,
        Rule::IffE,
        Rule::NotI,
        Rule::NotE,
    ];

    pub const FOL_RULES: [Rule; 6] =
        [Rule::ForallI, Rule::ForallE, Rule::ExistsI, Rule::ExistsE, Rule::EqI, Rule::EqE];

    /// Always sound, regardless of accessibility tier: introducing a box by
    /// proving the body in an arbitrary accessible world, and eliminating a
    /// diamond by assuming its witness world arbitrarily.
    pub const MODAL_INTRO_RULES: [Rule; 2] = [Rule::BoxI, Rule::DiaE];

    /// Sound only once the accessibility relation is reflexive (T and up).
    pub const MODAL_T_RULES: [Rule; 2] = [Rule::BoxE, Rule::DiaI];

    pub fn canonical(&self) -> &'static str {
        match self {
            Rule::Pr => "PR",
            Rule::As => "AS",
            Rule::R => "R",
            Rule::X => "X",
            Rule::Ip => "IP",
            Rule::AndI => "∧I",
            Rule::AndE => "∧E",
            Rule::OrI => "∨I",
            Rule::OrE => "∨E",
            Rule::ImpI => "→I",
            Rule::ImpE => "→E",
            Rule::IffI => "↔I",
            Rule::IffE => "↔E",
            Rule::NotI => "¬I",
            Rule::NotE => "¬E",
            Rule::ForallI => "∀I",
            Rule::ForallE => "∀E",
            Rule::ExistsI => "∃I",
            Rule::ExistsE => "∃E",
            Rule::EqI => "=I",
            Rule::EqE => "=E",
            Rule::BoxI => "☐I",
            Rule::DiaE => "◇E",
            Rule::BoxE => "☐E",
            Rule::DiaI => "◇I",
        }
    }

    pub fn ascii(&self) -> &'static str {
        match self {
            Rule::Pr => "PR",
            Rule::As => "AS",
            Rule::R => "R",
            Rule::X => "X",
            Rule::Ip => "IP",
            Rule::AndI => "AND_I",
            Rule::AndE => "AND_E",
            Rule::OrI => "OR_I",
            Rule::OrE => "OR_E",
            Rule::ImpI => "IMP_I",
            Rule::ImpE => "IMP_E",
            Rule::IffI => "IFF_I",
            Rule::IffE => "IFF_E",
            Rule::NotI => "NOT_I",
            Rule::NotE => "NOT_E",
            Rule::ForallI => "FORALL_I",
            Rule::ForallE => "FORALL_E",
            Rule::ExistsI => "EXISTS_I",
            Rule::ExistsE => "EXISTS_E",
            Rule::EqI => "EQ_I",
            Rule::EqE => "EQ_E",
            Rule::BoxI => "BOX_I",
            Rule::DiaE => "DIA_E",
            Rule::BoxE => "BOX_E",
            Rule::DiaI => "DIA_I",
        }
    }

    pub fn from_token(tok: &str) -> Option<Rule> {
        Self::all().into_iter().find(|r| r.canonical() == tok || r.ascii().eq_ignore_ascii_case(tok))
    }

    pub fn all() -> Vec<Rule> {
        let mut v = Rule::TFL_RULES.to_vec();
        v.extend_from_slice(&Rule::FOL_RULES);
        v.extend_from_slice(&Rule::MODAL_INTRO_RULES);
        v.extend_from_slice(&Rule::MODAL_T_RULES);
        v
    }

    pub fn arity(&self) -> Arity {
        match self {
            Rule::Pr => Arity::new(0, 0),
            Rule::As => Arity::new(0, 0),
            Rule::R => Arity::new(1, 0),
            Rule::X => Arity::new(1, 0),
            Rule::Ip => Arity::new(0, 1),
            Rule::AndI => Arity::new(2, 0),
            Rule::AndE => Arity::new(1, 0),
            Rule::OrI => Arity::new(1, 0),
            Rule::OrE => Arity::new(1, 2),
            Rule::ImpI => Arity::new(0, 1),
            Rule::ImpE => Arity::new(2, 0),
            Rule::IffI => Arity::new(0, 2),
            Rule::IffE => Arity::new(2, 0),
            Rule::NotI => Arity::new(0, 1),
            Rule::NotE => Arity::new(2, 0),
            Rule::ForallI => Arity::new(0, 1),
            Rule::ForallE => Arity::new(1, 0),
            Rule::ExistsI => Arity::new(1, 0),
            Rule::ExistsE => Arity::new(1, 1),
            Rule::EqI => Arity::new(0, 0),
            Rule::EqE => Arity::new(2, 0),
            Rule::BoxI => Arity::new(0, 1),
            Rule::DiaE => Arity::new(1, 1),
            Rule::BoxE => Arity::new(1, 0),
            Rule::DiaI => Arity::new(1, 0),
        }
    }

    /// Whether this rule opens/uses a *strict* subproof (one delimited by a
    /// `BoxMarker` assumption) rather than an ordinary one.
    pub fn is_strict(&self) -> bool {
        matches!(self, Rule::ForallI | Rule::ExistsE | Rule::BoxI | Rule::DiaE)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_both_spellings() {
        assert_eq!(Rule::from_token("∧I"), Some(Rule::AndI));
        assert_eq!(Rule::from_token("AND_I"), Some(Rule::AndI));
        assert_eq!(Rule::from_token("and_i"), Some(Rule::AndI));
        assert_eq!(Rule::from_token("nonsense"), None);
    }

    #[test]
    fn arities_match_citation_shapes() {
        assert_eq!(Rule::OrE.arity(), Arity::new(1, 2));
        assert_eq!(Rule::ImpI.arity(), Arity::new(0, 1));
        assert_eq!(Rule::AndI.arity(), Arity::new(2, 0));
    }
}

//! The ten supported deductive systems and the well-formedness predicate
//! each one imposes on a submitted premise or conclusion.

use super::formula::{free_vars, Formula};
use super::rule::Rule;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logic {
    Tfl,
    Fol,
    Mlk,
    Mlt,
    Mls4,
    Mls5,
    Fomlk,
    Fomlt,
    Fomls4,
    Fomls5,
}

/// The accessibility tier a modal logic sits at, independent of whether it
/// is propositional or first-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalTier {
    K,
    T,
    S4,
    S5,
}

impl Logic {
    pub const ALL: [Logic; 10] = [
        Logic::Tfl,
        Logic::Fol,
        Logic::Mlk,
        Logic::Mlt,
        Logic::Mls4,
        Logic::Mls5,
        Logic::Fomlk,
        Logic::Fomlt,
        Logic::Fomls4,
        Logic::Fomls5,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Logic::Tfl => "TFL",
            Logic::Fol => "FOL",
            Logic::Mlk => "MLK",
            Logic::Mlt => "MLT",
            Logic::Mls4 => "MLS4",
            Logic::Mls5 => "MLS5",
            Logic::Fomlk => "FOMLK",
            Logic::Fomlt => "FOMLT",
            Logic::Fomls4 => "FOMLS4",
            Logic::Fomls5 => "FOMLS5",
        }
    }

    pub fn from_name(s: &str) -> Option<Logic> {
        Logic::ALL.into_iter().find(|l| l.name().eq_ignore_ascii_case(s))
    }

    pub fn is_first_order(&self) -> bool {
        matches!(self, Logic::Fol | Logic::Fomlk | Logic::Fomlt | Logic::Fomls4 | Logic::Fomls5)
    }

    pub fn is_modal(&self) -> bool {
        self.modal_tier().is_some()
    }

    pub fn modal_tier(&self) -> Option<ModalTier> {
        match self {
            Logic::Mlk | Logic::Fomlk => Some(ModalTier::K),
            Logic::Mlt | Logic::Fomlt => Some(ModalTier::T),
            Logic::Mls4 | Logic::Fomls4 => Some(ModalTier::S4),
            Logic::Mls5 | Logic::Fomls5 => Some(ModalTier::S5),
            Logic::Tfl | Logic::Fol => None,
        }
    }

    /// Whether `formula` lies in the fragment this logic admits as a
    /// premise, conclusion, or any derived line: no free variables, no
    /// connectives/quantifiers the logic doesn't carry.
    pub fn is_wellformed(&self, formula: &Formula) -> bool {
        let shape_ok = match (self.is_first_order(), self.is_modal()) {
            (false, false) => is_tfl_formula(formula),
            (true, false) => is_fol_formula(formula),
            (false, true) => is_ml_formula(formula),
            (true, true) => is_foml_formula(formula),
        };
        shape_ok && free_vars(formula).is_empty()
    }

    /// The full rule catalog for this logic (TFL rules are shared by every
    /// logic; FOL/modal rules layer on top per `Logic::is_first_order`/
    /// `Logic::modal_tier`).
    pub fn rules(&self) -> Vec<Rule> {
        let mut rules = Rule::TFL_RULES.to_vec();
        if self.is_first_order() {
            rules.extend_from_slice(&Rule::FOL_RULES);
        }
        if let Some(tier) = self.modal_tier() {
            rules.extend_from_slice(&Rule::MODAL_INTRO_RULES);
            if matches!(tier, ModalTier::T | ModalTier::S4 | ModalTier::S5) {
                rules.extend_from_slice(&Rule::MODAL_T_RULES);
            }
        }
        rules
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub fn is_tfl_formula(f: &Formula) -> bool {
    match f {
        Formula::Bot => true,
        Formula::Pred(_, args) => args.is_empty(),
        Formula::Not(a) => is_tfl_formula(a),
        Formula::And(a, b) | Formula::Or(a, b) | Formula::Imp(a, b) | Formula::Iff(a, b) => {
            is_tfl_formula(a) && is_tfl_formula(b)
        }
        _ => false,
    }
}

pub fn is_fol_formula(f: &Formula) -> bool {
    match f {
        Formula::Bot | Formula::Pred(_, _) | Formula::Eq(_, _) => true,
        Formula::Not(a) => is_fol_formula(a),
        Formula::Forall(_, a) | Formula::Exists(_, a) => is_fol_formula(a),
        Formula::And(a, b) | Formula::Or(a, b) | Formula::Imp(a, b) | Formula::Iff(a, b) => {
            is_fol_formula(a) && is_fol_formula(b)
        }
        _ => false,
    }
}

pub fn is_fol_sentence(f: &Formula) -> bool {
    is_fol_formula(f) && free_vars(f).is_empty()
}

pub fn is_ml_formula(f: &Formula) -> bool {
    match f {
        Formula::Bot => true,
        Formula::Pred(_, args) => args.is_empty(),
        Formula::Not(a) | Formula::BoxF(a) | Formula::Dia(a) => is_ml_formula(a),
        Formula::And(a, b) | Formula::Or(a, b) | Formula::Imp(a, b) | Formula::Iff(a, b) => {
            is_ml_formula(a) && is_ml_formula(b)
        }
        _ => false,
    }
}

pub fn is_foml_formula(f: &Formula) -> bool {
    match f {
        Formula::Bot | Formula::Pred(_, _) | Formula::Eq(_, _) => true,
        Formula::Not(a) | Formula::BoxF(a) | Formula::Dia(a) => is_foml_formula(a),
        Formula::Forall(_, a) | Formula::Exists(_, a) => is_foml_formula(a),
        Formula::And(a, b) | Formula::Or(a, b) | Formula::Imp(a, b) | Formula::Iff(a, b) => {
            is_foml_formula(a) && is_foml_formula(b)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::formula::Term;

    #[test]
    fn tfl_rejects_predicates_with_arguments() {
        let f = Formula::Pred("P".to_string(), vec![Term::constant("a")]);
        assert!(!Logic::Tfl.is_wellformed(&f));
        assert!(Logic::Fol.is_wellformed(&f));
    }

    #[test]
    fn fol_rejects_modal_operators() {
        let f = Formula::BoxF(Box::new(Formula::atom("P")));
        assert!(!Logic::Fol.is_wellformed(&f));
        assert!(Logic::Mlk.is_wellformed(&f));
        assert!(Logic::Fomlk.is_wellformed(&f));
    }

    #[test]
    fn modal_tier_ordering() {
        assert_eq!(Logic::Mlk.modal_tier(), Some(ModalTier::K));
        assert_eq!(Logic::Fomls5.modal_tier(), Some(ModalTier::S5));
        assert_eq!(Logic::Tfl.modal_tier(), None);
    }

    #[test]
    fn rule_catalog_grows_with_logic_power() {
        assert!(Logic::Tfl.rules().len() < Logic::Fol.rules().len());
        assert!(Logic::Mlk.rules().len() < Logic::Mlt.rules().len());
    }
}

//! A brute-force propositional oracle used to guide proof search and to
//! report countermodels. Quantified, modal, and atomic (`Pred`/`Eq`)
//! subformulas are all opaque here — each maximal non-boolean subformula is
//! one propositional variable, the same abstraction a truth table gives a
//! TFL argument whose atoms happen to be first-order or modal. With fewer
//! than a dozen distinct atoms per problem in practice, plain `2^n`
//! enumeration needs no DPLL.

use crate::models::formula::Formula;
use std::collections::HashMap;

/// The maximal non-boolean subformulas occurring anywhere in `formulas`, in
/// first-occurrence order — the propositional variables a truth table over
/// `formulas` ranges over.
pub fn prop_vars(formulas: &[&Formula]) -> Vec<Formula> {
    let mut vars = Vec::new();
    for f in formulas {
        collect_vars(f, &mut vars);
    }
    vars
}

fn collect_vars(formula: &Formula, acc: &mut Vec<Formula>) {
    match formula {
        Formula::Not(a) => collect_vars(a, acc),
        Formula::And(a, b) | Formula::Or(a, b) | Formula::Imp(a, b) | Formula::Iff(a, b) => {
            collect_vars(a, acc);
            collect_vars(b, acc);
        }
        Formula::Bot => {}
        _ => {
            if !acc.contains(formula) {
                acc.push(formula.clone());
            }
        }
    }
}

/// `formula`'s truth value under `assignment`. An atom missing from
/// `assignment` is treated as false — callers always build a total
/// assignment over `prop_vars` first.
pub fn evaluate(formula: &Formula, assignment: &HashMap<Formula, bool>) -> bool {
    match formula {
        Formula::Bot => false,
        Formula::Not(a) => !evaluate(a, assignment),
        Formula::And(a, b) => evaluate(a, assignment) && evaluate(b, assignment),
        Formula::Or(a, b) => evaluate(a, assignment) || evaluate(b, assignment),
        Formula::Imp(a, b) => !evaluate(a, assignment) || evaluate(b, assignment),
        Formula::Iff(a, b) => evaluate(a, assignment) == evaluate(b, assignment),
        other => *assignment.get(other).unwrap_or(&false),
    }
}

/// Every assignment of `vars`, as a bit pattern over `0..2^vars.len()`.
fn assignment_at(vars: &[Formula], bits: u32) -> HashMap<Formula, bool> {
    vars.iter()
        .enumerate()
        .map(|(i, v)| (v.clone(), bits & (1 << i) != 0))
        .collect()
}

/// An assignment making every premise true and the conclusion false, if one
/// exists — a propositional countermodel to the argument.
pub fn countermodel(premises: &[Formula], conclusion: &Formula) -> Option<HashMap<Formula, bool>> {
    let mut all: Vec<&Formula> = premises.iter().collect();
    all.push(conclusion);
    let vars = prop_vars(&all);
    if vars.len() >= 20 {
        return None;
    }
    let total = 1u32 << vars.len();
    for bits in 0..total {
        let assignment = assignment_at(&vars, bits);
        if premises.iter().all(|p| evaluate(p, &assignment)) && !evaluate(conclusion, &assignment) {
            return Some(assignment);
        }
    }
    None
}

/// Whether `conclusion` is a tautological consequence of `premises` under
/// this propositional abstraction — `countermodel` finding none.
pub fn is_valid(premises: &[Formula], conclusion: &Formula) -> bool {
    countermodel(premises, conclusion).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modus_ponens_is_valid() {
        let p = Formula::atom("P");
        let q = Formula::atom("Q");
        let premises = vec![p.clone(), Formula::Imp(Box::new(p), Box::new(q.clone()))];
        assert!(is_valid(&premises, &q));
    }

    #[test]
    fn affirming_the_consequent_has_a_countermodel() {
        let p = Formula::atom("P");
        let q = Formula::atom("Q");
        let premises = vec![q.clone(), Formula::Imp(Box::new(p.clone()), Box::new(q))];
        let model = countermodel(&premises, &p);
        assert!(model.is_some());
    }

    #[test]
    fn quantified_atoms_are_opaque_propositional_variables() {
        let f = Formula::Forall("x".to_string(), Box::new(Formula::atom("P")));
        assert!(is_valid(&[f.clone()], &f));
    }
}

//! Per-rule schema checking: given a rule and its cited lines/subproofs,
//! decide whether a proposed conclusion follows. Most rules reduce to exact
//! structural equality; the quantifier rules reuse `Formula::unify`'s
//! metavariable machinery to recover a witness term instead of hand-rolling
//! a separate "does some term exist" search.

use crate::error::InferenceError;
use crate::models::formula::{constants, substitute, Formula, Subst, Term};
use crate::models::logic::ModalTier;
use crate::models::proof::{ObjectId, Problem};
use crate::models::rule::Rule;

/// Check `conclusion` as a fresh line justified by `rule` citing `lines` and
/// `subproofs` (already resolved to object ids; arity is the caller's
/// responsibility — see `crate::checker::validate_citations`).
pub fn check(
    problem: &Problem,
    rule: Rule,
    lines: &[ObjectId],
    subproofs: &[ObjectId],
    conclusion: &Formula,
) -> Result<(), InferenceError> {
    match rule {
        Rule::Pr | Rule::As => {
            Err(InferenceError::new(format!("{} is assigned automatically, not cited", rule)))
        }
        Rule::R => check_r(problem, lines[0], conclusion),
        Rule::X => {
            let cited = line_formula(problem, lines[0])?;
            if *cited == Formula::Bot {
                Ok(())
            } else {
                Err(InferenceError::new(format!("X requires a contradiction, not {}", cited)))
            }
        }
        Rule::Ip => {
            let sp = subproof(problem, subproofs[0])?;
            let assumed = &sp.assumption().formula;
            let derived = sp
                .conclusion()
                .ok_or_else(|| InferenceError::new("IP's subproof has no conclusion line"))?;
            if *assumed != Formula::not(conclusion.clone()) {
                return Err(InferenceError::new(format!(
                    "IP's subproof must assume ¬({}), not {}",
                    conclusion, assumed
                )));
            }
            if derived.formula != Formula::Bot {
                return Err(InferenceError::new("IP's subproof must derive a contradiction"));
            }
            Ok(())
        }
        Rule::AndI => {
            let a = line_formula(problem, lines[0])?;
            let b = line_formula(problem, lines[1])?;
            expect(conclusion, &Formula::and(a.clone(), b.clone()))
        }
        Rule::AndE => {
            let cited = line_formula(problem, lines[0])?;
            match cited {
                Formula::And(a, b) if conclusion == a.as_ref() || conclusion == b.as_ref() => Ok(()),
                Formula::And(a, b) => Err(InferenceError::new(format!(
                    "{} is neither conjunct of {} ∧ {}",
                    conclusion, a, b
                ))),
                other => Err(InferenceError::new(format!("{} is not a conjunction", other))),
            }
        }
        Rule::OrI => {
            let cited = line_formula(problem, lines[0])?;
            match conclusion {
                Formula::Or(a, b) if a.as_ref() == cited || b.as_ref() == cited => Ok(()),
                Formula::Or(..) => {
                    Err(InferenceError::new(format!("{} occurs in neither disjunct", cited)))
                }
                _ => Err(InferenceError::new(format!("{} is not a disjunction", conclusion))),
            }
        }
        Rule::OrE => check_or_e(problem, lines[0], subproofs, conclusion),
        Rule::ImpI => {
            let sp = subproof(problem, subproofs[0])?;
            let derived = sp
                .conclusion()
                .ok_or_else(|| InferenceError::new("→I's subproof has no conclusion line"))?;
            expect(
                conclusion,
                &Formula::imp(sp.assumption().formula.clone(), derived.formula.clone()),
            )
        }
        Rule::ImpE => check_imp_e(problem, lines, conclusion),
        Rule::IffI => check_iff_i(problem, subproofs, conclusion),
        Rule::IffE => check_iff_e(problem, lines, conclusion),
        Rule::NotI => {
            let sp = subproof(problem, subproofs[0])?;
            let derived = sp
                .conclusion()
                .ok_or_else(|| InferenceError::new("¬I's subproof has no conclusion line"))?;
            if derived.formula != Formula::Bot {
                return Err(InferenceError::new("¬I's subproof must derive a contradiction"));
            }
            expect(conclusion, &Formula::not(sp.assumption().formula.clone()))
        }
        Rule::NotE => check_not_e(problem, lines, conclusion),
        Rule::ForallI => check_forall_i(problem, subproofs[0], conclusion),
        Rule::ForallE => check_forall_e(problem, lines[0], conclusion),
        Rule::ExistsI => check_exists_i(problem, lines[0], conclusion),
        Rule::ExistsE => check_exists_e(problem, lines[0], subproofs[0], conclusion),
        Rule::EqI => match conclusion {
            Formula::Eq(a, b) if a == b => Ok(()),
            Formula::Eq(a, b) => Err(InferenceError::new(format!("{} is not identical to {}", a, b))),
            _ => Err(InferenceError::new("=I's conclusion must be an identity t = t")),
        },
        Rule::EqE => check_eq_e(problem, lines, conclusion),
        Rule::BoxI => {
            let sp = subproof(problem, subproofs[0])?;
            if !sp.is_modal_strict() {
                return Err(InferenceError::new("☐I's subproof must open a new accessible world"));
            }
            let derived = sp
                .conclusion()
                .ok_or_else(|| InferenceError::new("☐I's subproof has no conclusion line"))?;
            expect(conclusion, &Formula::BoxF(Box::new(derived.formula.clone())))
        }
        Rule::DiaE => check_dia_e(problem, lines[0], subproofs[0], conclusion),
        Rule::BoxE => {
            let cited = line_formula(problem, lines[0])?;
            match cited {
                Formula::BoxF(a) => expect(conclusion, a),
                other => Err(InferenceError::new(format!("{} is not boxed", other))),
            }
        }
        Rule::DiaI => {
            let cited = line_formula(problem, lines[0])?;
            expect(conclusion, &Formula::Dia(Box::new(cited.clone())))
        }
    }
}

fn expect(got: &Formula, want: &Formula) -> Result<(), InferenceError> {
    if got == want {
        Ok(())
    } else {
        Err(InferenceError::new(format!("expected {}, not {}", want, got)))
    }
}

fn line_formula(problem: &Problem, id: ObjectId) -> Result<&Formula, InferenceError> {
    problem
        .find_line(id)
        .map(|l| &l.formula)
        .ok_or_else(|| InferenceError::new("citation does not name an accessible line"))
}

fn subproof(problem: &Problem, id: ObjectId) -> Result<&crate::models::proof::Subproof, InferenceError> {
    problem
        .find_subproof(id)
        .ok_or_else(|| InferenceError::new("citation does not name an accessible subproof"))
}

fn check_r(problem: &Problem, cited_id: ObjectId, conclusion: &Formula) -> Result<(), InferenceError> {
    let cited = line_formula(problem, cited_id)?.clone();
    let crossed = problem.modal_boundaries_crossed(cited_id);
    if crossed == 0 {
        return expect(conclusion, &cited);
    }
    let tier = match problem.logic.modal_tier() {
        Some(tier) => tier,
        None => {
            return Err(InferenceError::new(
                "R cannot cross a strict subproof boundary outside a modal logic",
            ))
        }
    };
    let mut candidates = vec![cited];
    for _ in 0..crossed {
        let mut next = Vec::new();
        for c in &candidates {
            for variant in modal_reiteration_step(c, tier) {
                if !next.contains(&variant) {
                    next.push(variant);
                }
            }
        }
        candidates = next;
    }
    if candidates.contains(conclusion) {
        Ok(())
    } else {
        Err(InferenceError::new(format!(
            "{} does not reiterate across {} world boundary(ies) under {:?}",
            conclusion, crossed, tier
        )))
    }
}

/// One step of the per-tier reiteration policy: what a formula true outside
/// a strict (world-shift) subproof is still guaranteed to mean one
/// accessible world further in.
fn modal_reiteration_step(formula: &Formula, tier: ModalTier) -> Vec<Formula> {
    let mut out = Vec::new();
    if let Formula::BoxF(inner) = formula {
        out.push((**inner).clone());
        if matches!(tier, ModalTier::S4 | ModalTier::S5) {
            out.push(formula.clone());
        }
    }
    if matches!(tier, ModalTier::S5) {
        if let Formula::Dia(_) = formula {
            out.push(formula.clone());
        }
    }
    out
}

fn check_or_e(
    problem: &Problem,
    disjunction_id: ObjectId,
    subproofs: &[ObjectId],
    conclusion: &Formula,
) -> Result<(), InferenceError> {
    let (a, b) = match line_formula(problem, disjunction_id)? {
        Formula::Or(a, b) => (a.as_ref().clone(), b.as_ref().clone()),
        other => return Err(InferenceError::new(format!("{} is not a disjunction", other))),
    };
    let sp1 = subproof(problem, subproofs[0])?;
    let sp2 = subproof(problem, subproofs[1])?;
    let concl1 = sp1.conclusion().ok_or_else(|| InferenceError::new("∨E's first subproof has no conclusion line"))?;
    let concl2 = sp2.conclusion().ok_or_else(|| InferenceError::new("∨E's second subproof has no conclusion line"))?;
    if concl1.formula != *conclusion || concl2.formula != *conclusion {
        return Err(InferenceError::new("both ∨E subproofs must derive the cited conclusion"));
    }
    let assumptions_match = (sp1.assumption().formula == a && sp2.assumption().formula == b)
        || (sp1.assumption().formula == b && sp2.assumption().formula == a);
    if assumptions_match {
        Ok(())
    } else {
        Err(InferenceError::new(format!("the two subproofs must assume {} and {}", a, b)))
    }
}

fn check_imp_e(problem: &Problem, lines: &[ObjectId], conclusion: &Formula) -> Result<(), InferenceError> {
    let l0 = line_formula(problem, lines[0])?;
    let l1 = line_formula(problem, lines[1])?;
    let pairs = [(l0, l1), (l1, l0)];
    for (imp, ant) in pairs {
        if let Formula::Imp(a, b) = imp {
            if a.as_ref() == ant && b.as_ref() == conclusion {
                return Ok(());
            }
        }
    }
    Err(InferenceError::new(format!(
        "→E needs φ → ψ and φ among its citations to conclude ψ; got {} and {}",
        l0, l1
    )))
}

fn check_iff_i(problem: &Problem, subproofs: &[ObjectId], conclusion: &Formula) -> Result<(), InferenceError> {
    let sp1 = subproof(problem, subproofs[0])?;
    let sp2 = subproof(problem, subproofs[1])?;
    let c1 = sp1.conclusion().ok_or_else(|| InferenceError::new("↔I's first subproof has no conclusion line"))?;
    let c2 = sp2.conclusion().ok_or_else(|| InferenceError::new("↔I's second subproof has no conclusion line"))?;
    let phi = sp1.assumption().formula.clone();
    let psi = sp2.assumption().formula.clone();
    if c1.formula != psi || c2.formula != phi {
        return Err(InferenceError::new(
            "↔I's subproofs must derive each side of the biconditional from the other",
        ));
    }
    expect(conclusion, &Formula::iff(phi, psi))
}

fn check_iff_e(problem: &Problem, lines: &[ObjectId], conclusion: &Formula) -> Result<(), InferenceError> {
    let l0 = line_formula(problem, lines[0])?;
    let l1 = line_formula(problem, lines[1])?;
    let pairs = [(l0, l1), (l1, l0)];
    for (bicond, side) in pairs {
        if let Formula::Iff(a, b) = bicond {
            if a.as_ref() == side && b.as_ref() == conclusion {
                return Ok(());
            }
            if b.as_ref() == side && a.as_ref() == conclusion {
                return Ok(());
            }
        }
    }
    Err(InferenceError::new(format!(
        "↔E needs φ ↔ ψ and one side among its citations; got {} and {}",
        l0, l1
    )))
}

fn check_not_e(problem: &Problem, lines: &[ObjectId], conclusion: &Formula) -> Result<(), InferenceError> {
    if *conclusion != Formula::Bot {
        return Err(InferenceError::new("¬E's conclusion must be ⊥"));
    }
    let l0 = line_formula(problem, lines[0])?;
    let l1 = line_formula(problem, lines[1])?;
    if *l0 == Formula::not(l1.clone()) || *l1 == Formula::not(l0.clone()) {
        Ok(())
    } else {
        Err(InferenceError::new(format!("{} and {} are not contradictory", l0, l1)))
    }
}

fn check_forall_i(problem: &Problem, subproof_id: ObjectId, conclusion: &Formula) -> Result<(), InferenceError> {
    let (var, body) = match conclusion {
        Formula::Forall(v, body) => (v.clone(), body.as_ref().clone()),
        _ => return Err(InferenceError::new("∀I's conclusion must be a universal")),
    };
    let sp = subproof(problem, subproof_id)?;
    let c = match &sp.assumption().formula {
        Formula::BoxMarker(Some(c)) => c.clone(),
        _ => return Err(InferenceError::new("∀I's subproof must introduce a fresh individual constant")),
    };
    let derived = sp
        .conclusion()
        .ok_or_else(|| InferenceError::new("∀I's subproof has no conclusion line"))?;
    if substitute(&body, &var, &c) != derived.formula {
        return Err(InferenceError::new(format!(
            "the subproof's conclusion does not generalize to {}",
            conclusion
        )));
    }
    if constants(conclusion).contains(&c) {
        return Err(InferenceError::new(format!("{} escapes into the conclusion", c)));
    }
    if !problem.constant_fresh_outside(&c) {
        return Err(InferenceError::new(format!("{} is not fresh outside this subproof", c)));
    }
    Ok(())
}

fn check_forall_e(problem: &Problem, cited_id: ObjectId, conclusion: &Formula) -> Result<(), InferenceError> {
    let cited = line_formula(problem, cited_id)?;
    let (var, body) = match cited {
        Formula::Forall(v, body) => (v.clone(), body.as_ref().clone()),
        other => return Err(InferenceError::new(format!("{} is not a universal", other))),
    };
    let pattern = substitute(&body, &var, &Term::meta(0));
    let mut subst = Subst::new();
    if Formula::unify(&pattern, conclusion, &mut subst) {
        Ok(())
    } else {
        Err(InferenceError::new(format!("{} is not an instance of {}", conclusion, cited)))
    }
}

fn check_exists_i(problem: &Problem, cited_id: ObjectId, conclusion: &Formula) -> Result<(), InferenceError> {
    let (var, body) = match conclusion {
        Formula::Exists(v, body) => (v.clone(), body.as_ref().clone()),
        _ => return Err(InferenceError::new("∃I's conclusion must be an existential")),
    };
    let cited = line_formula(problem, cited_id)?;
    let pattern = substitute(&body, &var, &Term::meta(0));
    let mut subst = Subst::new();
    if Formula::unify(&pattern, cited, &mut subst) {
        Ok(())
    } else {
        Err(InferenceError::new(format!("{} is not an instance of {}", cited, conclusion)))
    }
}

fn check_exists_e(
    problem: &Problem,
    existential_id: ObjectId,
    subproof_id: ObjectId,
    conclusion: &Formula,
) -> Result<(), InferenceError> {
    let (var, body) = match line_formula(problem, existential_id)? {
        Formula::Exists(v, body) => (v.clone(), body.as_ref().clone()),
        other => return Err(InferenceError::new(format!("{} is not an existential", other))),
    };
    let sp = subproof(problem, subproof_id)?;
    let c = match &sp.assumption().formula {
        Formula::BoxMarker(Some(c)) => c.clone(),
        _ => return Err(InferenceError::new("∃E's subproof must introduce a fresh individual constant")),
    };
    let instance = sp
        .instance_line()
        .ok_or_else(|| InferenceError::new("∃E's subproof must assume the instantiated witness next"))?;
    if instance.formula != substitute(&body, &var, &c) {
        return Err(InferenceError::new("the subproof does not assume the witness instance"));
    }
    let derived = sp
        .conclusion()
        .ok_or_else(|| InferenceError::new("∃E's subproof has no conclusion line"))?;
    if derived.formula != *conclusion {
        return Err(InferenceError::new("the subproof's conclusion does not match"));
    }
    if constants(conclusion).contains(&c) {
        return Err(InferenceError::new(format!("{} escapes into the conclusion", c)));
    }
    if !problem.constant_fresh_outside(&c) {
        return Err(InferenceError::new(format!("{} is not fresh outside this subproof", c)));
    }
    Ok(())
}

fn check_dia_e(
    problem: &Problem,
    diamond_id: ObjectId,
    subproof_id: ObjectId,
    conclusion: &Formula,
) -> Result<(), InferenceError> {
    let body = match line_formula(problem, diamond_id)? {
        Formula::Dia(body) => body.as_ref().clone(),
        other => return Err(InferenceError::new(format!("{} is not a diamond", other))),
    };
    let sp = subproof(problem, subproof_id)?;
    if !sp.is_modal_strict() {
        return Err(InferenceError::new("◇E's subproof must open a new accessible world"));
    }
    let instance = sp
        .instance_line()
        .ok_or_else(|| InferenceError::new("◇E's subproof must assume the diamond's body next"))?;
    if instance.formula != body {
        return Err(InferenceError::new("the subproof does not assume the diamond's body"));
    }
    let derived = sp
        .conclusion()
        .ok_or_else(|| InferenceError::new("◇E's subproof has no conclusion line"))?;
    expect(conclusion, &derived.formula)
}

fn check_eq_e(problem: &Problem, lines: &[ObjectId], conclusion: &Formula) -> Result<(), InferenceError> {
    let l0 = line_formula(problem, lines[0])?;
    let l1 = line_formula(problem, lines[1])?;
    let pairs = [(l0, l1), (l1, l0)];
    for (eq, phi) in pairs {
        if let Formula::Eq(a, b) = eq {
            if formula_substitutable(phi, conclusion, a, b) || formula_substitutable(phi, conclusion, b, a) {
                return Ok(());
            }
        }
    }
    Err(InferenceError::new(format!(
        "=E needs an identity and a formula citing one of its sides; got {} and {}",
        l0, l1
    )))
}

/// Whether `result` replaces zero or more occurrences of `from` in `phi`
/// with `to`, leaving everything else unchanged — `=E`'s "substitute some
/// occurrences" semantics, checked structurally rather than enumerating
/// every subset of positions.
fn formula_substitutable(phi: &Formula, result: &Formula, from: &Term, to: &Term) -> bool {
    match (phi, result) {
        (Formula::Bot, Formula::Bot) => true,
        (Formula::Pred(n1, a1), Formula::Pred(n2, a2)) if n1 == n2 && a1.len() == a2.len() => {
            a1.iter().zip(a2).all(|(x, y)| term_substitutable(x, y, from, to))
        }
        (Formula::Eq(l1, r1), Formula::Eq(l2, r2)) => {
            term_substitutable(l1, l2, from, to) && term_substitutable(r1, r2, from, to)
        }
        (Formula::Not(a), Formula::Not(b)) => formula_substitutable(a, b, from, to),
        (Formula::BoxF(a), Formula::BoxF(b)) => formula_substitutable(a, b, from, to),
        (Formula::Dia(a), Formula::Dia(b)) => formula_substitutable(a, b, from, to),
        (Formula::And(a1, b1), Formula::And(a2, b2))
        | (Formula::Or(a1, b1), Formula::Or(a2, b2))
        | (Formula::Imp(a1, b1), Formula::Imp(a2, b2))
        | (Formula::Iff(a1, b1), Formula::Iff(a2, b2)) => {
            formula_substitutable(a1, a2, from, to) && formula_substitutable(b1, b2, from, to)
        }
        (Formula::Forall(v1, a), Formula::Forall(v2, b)) if v1 == v2 => formula_substitutable(a, b, from, to),
        (Formula::Exists(v1, a), Formula::Exists(v2, b)) if v1 == v2 => formula_substitutable(a, b, from, to),
        _ => false,
    }
}

fn term_substitutable(t1: &Term, t2: &Term, from: &Term, to: &Term) -> bool {
    if t1 == t2 {
        return true;
    }
    if t1 == from && t2 == to {
        return true;
    }
    match (t1, t2) {
        (Term::Func(n1, a1), Term::Func(n2, a2)) if n1 == n2 && a1.len() == a2.len() => {
            a1.iter().zip(a2).all(|(x, y)| term_substitutable(x, y, from, to))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::CitationRef;
    use crate::models::logic::Logic;
    use crate::models::proof::{Citation, Justification};

    fn atom(s: &str) -> Formula {
        Formula::atom(s)
    }

    fn pred(name: &str, t: Term) -> Formula {
        Formula::Pred(name.to_string(), vec![t])
    }

    #[test]
    fn and_i_requires_both_cited_conjuncts_in_order() {
        let mut p = Problem::new(Logic::Tfl, vec![atom("P"), atom("Q")], Formula::and(atom("P"), atom("Q")));
        let l0 = p.proof.context[0].id;
        let l1 = p.proof.context[1].id;
        assert!(check(&p, Rule::AndI, &[l0, l1], &[], &Formula::and(atom("P"), atom("Q"))).is_ok());
        assert!(check(&p, Rule::AndI, &[l1, l0], &[], &Formula::and(atom("P"), atom("Q"))).is_err());
        p.errors.clear();
    }

    #[test]
    fn modus_ponens_checks_out() {
        let p = Problem::new(
            Logic::Tfl,
            vec![atom("P"), Formula::imp(atom("P"), atom("Q"))],
            atom("Q"),
        );
        let l0 = p.proof.context[0].id;
        let l1 = p.proof.context[1].id;
        assert!(check(&p, Rule::ImpE, &[l1, l0], &[], &atom("Q")).is_ok());
    }

    #[test]
    fn x_requires_a_contradiction() {
        let p = Problem::new(Logic::Tfl, vec![Formula::Bot], atom("Q"));
        let l0 = p.proof.context[0].id;
        assert!(check(&p, Rule::X, &[l0], &[], &atom("Q")).is_ok());
    }

    #[test]
    fn eq_e_allows_replacing_a_subset_of_occurrences() {
        let a = Term::constant("a");
        let b = Term::constant("b");
        let phi = Formula::Pred("R".to_string(), vec![a.clone(), a.clone()]);
        let partial = Formula::Pred("R".to_string(), vec![b.clone(), a.clone()]);
        let full = Formula::Pred("R".to_string(), vec![b.clone(), b.clone()]);
        let wrong = Formula::Pred("R".to_string(), vec![b.clone(), Term::constant("c")]);
        assert!(formula_substitutable(&phi, &partial, &a, &b));
        assert!(formula_substitutable(&phi, &full, &a, &b));
        assert!(!formula_substitutable(&phi, &wrong, &a, &b));
    }

    #[test]
    fn modal_reiteration_step_strips_a_box_under_t() {
        let f = Formula::BoxF(Box::new(atom("P")));
        let out = modal_reiteration_step(&f, ModalTier::T);
        assert_eq!(out, vec![atom("P")]);
    }

    #[test]
    fn modal_reiteration_step_lets_boxes_persist_under_s4() {
        let f = Formula::BoxF(Box::new(atom("P")));
        let out = modal_reiteration_step(&f, ModalTier::S4);
        assert!(out.contains(&atom("P")));
        assert!(out.contains(&f));
    }

    #[test]
    fn modal_reiteration_step_forbids_crossing_under_k() {
        let f = Formula::BoxF(Box::new(atom("P")));
        assert!(modal_reiteration_step(&f, ModalTier::K).is_empty());
        assert!(modal_reiteration_step(&atom("P"), ModalTier::K).is_empty());
    }

    #[test]
    fn unused_imports_are_exercised() {
        let _ = Justification::premise();
        let _: Citation = Citation::Line(0);
    }

    #[test]
    fn forall_e_instantiates_a_universal_at_a_chosen_term() {
        let forall_p = Formula::Forall("x".to_string(), Box::new(pred("P", Term::var("x"))));
        let p = Problem::new(Logic::Fol, vec![forall_p], pred("P", Term::constant("a")));
        let l0 = p.proof.context[0].id;
        assert!(check(&p, Rule::ForallE, &[l0], &[], &pred("P", Term::constant("a"))).is_ok());
        assert!(check(&p, Rule::ForallE, &[l0], &[], &atom("Q")).is_err());
    }

    #[test]
    fn exists_i_generalizes_a_witness_into_an_existential() {
        let p = Problem::new(Logic::Fol, vec![pred("P", Term::constant("a"))], atom("Q"));
        let l0 = p.proof.context[0].id;
        let existential = Formula::Exists("x".to_string(), Box::new(pred("P", Term::var("x"))));
        assert!(check(&p, Rule::ExistsI, &[l0], &[], &existential).is_ok());
    }

    #[test]
    fn forall_i_generalizes_a_derivation_over_a_fresh_constant() {
        let forall_p = Formula::Forall("x".to_string(), Box::new(pred("P", Term::var("x"))));
        let mut p = Problem::new(Logic::Fol, vec![forall_p.clone()], forall_p.clone());
        let sp_id = p.begin_subproof(Formula::BoxMarker(Some(Term::constant("c"))));
        p.add_line(pred("P", Term::constant("c")), Rule::ForallE, &[CitationRef::Line(1)]).unwrap();
        p.end_subproof().unwrap();
        assert!(check(&p, Rule::ForallI, &[], &[sp_id], &forall_p).is_ok());
        assert!(p.constant_fresh_outside(&Term::constant("c")));
    }

    #[test]
    fn forall_i_rejects_a_constant_that_already_occurs_in_the_premises() {
        let forall_p = Formula::Forall("x".to_string(), Box::new(pred("P", Term::var("x"))));
        let mut p = Problem::new(
            Logic::Fol,
            vec![forall_p.clone(), pred("Q", Term::constant("c"))],
            forall_p.clone(),
        );
        let sp_id = p.begin_subproof(Formula::BoxMarker(Some(Term::constant("c"))));
        p.add_line(pred("P", Term::constant("c")), Rule::ForallE, &[CitationRef::Line(1)]).unwrap();
        p.end_subproof().unwrap();
        assert!(check(&p, Rule::ForallI, &[], &[sp_id], &forall_p).is_err());
    }

    #[test]
    fn forall_i_rejects_a_constant_that_escapes_into_the_conclusion() {
        // The marker constant `c` occurs nowhere outside the subproof, but
        // `∀x (x = c)` still mentions it directly -- `c` is not fresh with
        // respect to the *conclusion* even though `constant_fresh_outside`
        // (which only looks at accessible lines) would say yes.
        let c = Term::constant("c");
        let mut p = Problem::new(Logic::Fol, vec![], Formula::atom("Z"));
        let sp_id = p.begin_subproof(Formula::BoxMarker(Some(c.clone())));
        p.add_line(Formula::Eq(c.clone(), c.clone()), Rule::EqI, &[]).unwrap();
        p.end_subproof().unwrap();
        let bogus = Formula::Forall("x".to_string(), Box::new(Formula::Eq(Term::var("x"), c.clone())));
        assert!(check(&p, Rule::ForallI, &[], &[sp_id], &bogus).is_err());
    }

    #[test]
    fn exists_e_discharges_an_instantiated_witness() {
        let existential = Formula::Exists("x".to_string(), Box::new(pred("P", Term::var("x"))));
        let mut p = Problem::new(Logic::Fol, vec![existential.clone(), atom("Z")], atom("Z"));
        let ex_id = p.proof.context[0].id;
        let sp_id = p.begin_subproof(Formula::BoxMarker(Some(Term::constant("c"))));
        p.assume_next(pred("P", Term::constant("c"))).unwrap();
        p.add_line(atom("Z"), Rule::R, &[CitationRef::Line(2)]).unwrap();
        p.end_subproof().unwrap();
        assert!(check(&p, Rule::ExistsE, &[ex_id], &[sp_id], &atom("Z")).is_ok());
    }

    #[test]
    fn dia_e_discharges_a_diamond_s_instantiated_world() {
        let mut p = Problem::new(Logic::Mlk, vec![Formula::Dia(Box::new(atom("P")))], atom("P"));
        let dia_id = p.proof.context[0].id;
        let sp_id = p.begin_subproof(Formula::BoxMarker(None));
        p.assume_next(atom("P")).unwrap();
        p.add_line(atom("P"), Rule::R, &[CitationRef::Line(2)]).unwrap();
        p.end_subproof().unwrap();
        assert!(check(&p, Rule::DiaE, &[dia_id], &[sp_id], &atom("P")).is_ok());
    }

    #[test]
    fn box_e_and_dia_i_are_sound_only_once_reflexive() {
        let p = Problem::new(Logic::Mlt, vec![Formula::BoxF(Box::new(atom("P")))], atom("P"));
        let l0 = p.proof.context[0].id;
        assert!(check(&p, Rule::BoxE, &[l0], &[], &atom("P")).is_ok());

        let p2 = Problem::new(Logic::Mlt, vec![atom("P")], Formula::Dia(Box::new(atom("P"))));
        let l1 = p2.proof.context[0].id;
        assert!(check(&p2, Rule::DiaI, &[l1], &[], &Formula::Dia(Box::new(atom("P")))).is_ok());
    }

    #[test]
    fn eq_i_only_accepts_a_reflexive_identity() {
        let p = Problem::new(Logic::Fol, vec![], atom("Q"));
        let a = Term::constant("a");
        let b = Term::constant("b");
        assert!(check(&p, Rule::EqI, &[], &[], &Formula::Eq(a.clone(), a.clone())).is_ok());
        assert!(check(&p, Rule::EqI, &[], &[], &Formula::Eq(a, b)).is_err());
    }
}

//! End-to-end scenarios spanning parser -> checker -> prover -> facade:
//! unification purity, proof monotonicity, scope safety, prover
//! soundness/completeness on TFL, countermodel correctness, and
//! post-processing idempotence.

use std::time::Duration;

use nd_prover_core::checker::CitationRef;
use nd_prover_core::facade::{self, CheckLine, CheckStatus, LineKind};
use nd_prover_core::models::formula::{Formula, Subst, Term};
use nd_prover_core::models::logic::Logic;
use nd_prover_core::models::proof::Problem;
use nd_prover_core::models::rule::Rule;
use nd_prover_core::parser::{parse_and_verify_formula, parse_and_verify_premises};
use nd_prover_core::prover;
use nd_prover_core::sat;

fn timeout() -> Duration {
    Duration::from_secs(3)
}

#[test]
fn checker_accepts_a_hand_built_modus_ponens_proof() {
    let p = parse_and_verify_formula("P", Logic::Tfl).unwrap();
    let imp = parse_and_verify_formula("P -> Q", Logic::Tfl).unwrap();
    let q = parse_and_verify_formula("Q", Logic::Tfl).unwrap();

    let mut problem = Problem::new(Logic::Tfl, vec![p, imp], q);
    assert!(!problem.is_complete());

    let conclusion = parse_and_verify_formula("Q", Logic::Tfl).unwrap();
    let refs = vec![CitationRef::Line(2), CitationRef::Line(1)];
    problem.add_line(conclusion, Rule::ImpE, &refs).unwrap();

    assert!(problem.is_complete());
    assert!(problem.errors().is_empty());
}

#[test]
fn checker_rejects_a_non_sequitur_and_records_a_message() {
    let premises = parse_and_verify_premises("P", Logic::Tfl).unwrap();
    let conclusion = parse_and_verify_formula("Q", Logic::Tfl).unwrap();
    let mut problem = Problem::new(Logic::Tfl, premises, conclusion);

    let bogus = parse_and_verify_formula("Q", Logic::Tfl).unwrap();
    let err = problem.add_line(bogus, Rule::R, &[CitationRef::Line(1)]).unwrap_err();
    assert!(err.message.starts_with("Line 2:"));
    assert!(!problem.is_complete());
}

#[test]
fn proof_is_monotone_an_uncited_extra_line_does_not_invalidate_completion() {
    // Adding a line that doesn't touch the existing derivation should never
    // un-complete an already-complete proof built before it.
    let premises = parse_and_verify_premises("P, P -> Q", Logic::Tfl).unwrap();
    let conclusion = parse_and_verify_formula("Q", Logic::Tfl).unwrap();
    let mut problem = Problem::new(Logic::Tfl, premises, conclusion);
    let q = parse_and_verify_formula("Q", Logic::Tfl).unwrap();
    problem.add_line(q, Rule::ImpE, &[CitationRef::Line(2), CitationRef::Line(1)]).unwrap();
    assert!(problem.is_complete());

    let p_again = parse_and_verify_formula("P", Logic::Tfl).unwrap();
    problem.add_line(p_again, Rule::R, &[CitationRef::Line(1)]).unwrap();
    assert!(problem.is_complete());
}

#[test]
fn prover_finds_a_proof_requiring_indirect_proof() {
    // Law of excluded middle has no direct TFL proof; the prover must reach
    // for IP (assume the negation, derive a contradiction).
    let p = parse_and_verify_formula("P", Logic::Tfl).unwrap();
    let not_p = parse_and_verify_formula("~P", Logic::Tfl).unwrap();
    let disj = Formula::Or(Box::new(p), Box::new(not_p));

    let problem = prover::prove(vec![], disj, timeout()).unwrap();
    assert!(problem.is_complete());
}

#[test]
fn prover_is_sound_every_generated_proof_checks() {
    for (premises_text, conclusion_text) in [
        ("P, P -> Q", "Q"),
        ("P -> Q, Q -> R", "P -> R"),
        ("P & Q", "Q & P"),
        ("NA", "P | ~P"),
    ] {
        let premises = parse_and_verify_premises(premises_text, Logic::Tfl).unwrap();
        let conclusion = parse_and_verify_formula(conclusion_text, Logic::Tfl).unwrap();
        let problem = prover::prove(premises, conclusion, timeout()).unwrap();
        assert!(problem.is_complete(), "failed to complete: {} |- {}", premises_text, conclusion_text);
        assert!(problem.errors().is_empty());
    }
}

#[test]
fn prover_reports_a_countermodel_for_an_invalid_argument() {
    let premises = parse_and_verify_premises("P -> Q", Logic::Tfl).unwrap();
    let conclusion = parse_and_verify_formula("P", Logic::Tfl).unwrap();
    let err = prover::prove(premises, conclusion, timeout()).unwrap_err();
    assert!(err.message.to_lowercase().contains("countermodel") || err.message.contains("not valid"));
}

#[test]
fn sat_countermodel_agrees_with_prover_on_validity() {
    let premises = parse_and_verify_premises("P, P -> Q", Logic::Tfl).unwrap();
    let conclusion = parse_and_verify_formula("Q", Logic::Tfl).unwrap();
    assert!(sat::is_valid(&premises, &conclusion));
    assert!(prover::prove(premises, conclusion, timeout()).is_ok());

    let premises2 = parse_and_verify_premises("P -> Q", Logic::Tfl).unwrap();
    let conclusion2 = parse_and_verify_formula("P", Logic::Tfl).unwrap();
    assert!(sat::countermodel(&premises2, &conclusion2).is_some());
    assert!(prover::prove(premises2, conclusion2, timeout()).is_err());
}

#[test]
fn unification_failure_leaves_the_substitution_unchanged() {
    // A failed top-level unify() call must not leave partial bindings behind
    // -- a prior binding for a metavariable survives a later call that binds
    // the same id to something inconsistent and then fails.
    let mut subst = Subst::new();
    let a = Term::constant("a");
    assert!(Term::unify(&Term::meta(0), &a, &mut subst));
    assert_eq!(subst.term_value(0), Some(&a));

    // `f(X0, X0)` against `f(a, b)` binds X0 to `a` then fails to rebind it
    // to `b` -- the whole call should fail and leave X0 at `a`.
    let pattern = Term::Func("f".to_string(), vec![Term::meta(1), Term::meta(1)]);
    let concrete = Term::Func("f".to_string(), vec![Term::constant("a"), Term::constant("b")]);
    assert!(!Term::unify(&pattern, &concrete, &mut subst));
    assert_eq!(subst.term_value(0), Some(&a));
    assert_eq!(subst.term_value(1), None);
}

#[test]
fn facade_check_round_trips_a_generated_proof_through_render() {
    let generated = facade::generate(Logic::Tfl, "P, P -> Q", "Q", timeout());
    assert!(generated.ok);
    let lines = generated.lines.unwrap();
    assert!(!lines.is_empty());

    // Replaying the same sequent through `check` with no lines yet must be
    // incomplete, never an error -- round-tripping a wellformed sequent
    // through validate/check should never itself fail.
    let validated = facade::validate(Logic::Tfl, "P, P -> Q", "Q");
    assert!(validated.ok);

    let checked = facade::check(Logic::Tfl, "P, P -> Q", "Q", &[]);
    assert_eq!(checked.status, CheckStatus::Incomplete);
}

/// `CloseSubproof` mirrors `main.rs`'s `Edit::EndSubproof`: it closes the
/// currently open subproof *then* adds its own formula at the now-current
/// (outer) scope, so a subproof's real last line must arrive as an ordinary
/// `Line` entry before the `CloseSubproof` entry that follows it.
#[test]
fn facade_check_replays_assumption_and_close_for_a_conditional_proof() {
    let lines = vec![
        CheckLine {
            kind: LineKind::Assumption,
            raw: String::new(),
            line_number: Some(1),
            formula_text: "P".to_string(),
            just_text: String::new(),
        },
        CheckLine {
            kind: LineKind::Line,
            raw: String::new(),
            line_number: Some(2),
            formula_text: "P".to_string(),
            just_text: "R 1".to_string(),
        },
        CheckLine {
            kind: LineKind::CloseSubproof,
            raw: String::new(),
            line_number: Some(3),
            formula_text: "P -> P".to_string(),
            just_text: "IMP_I 1-2".to_string(),
        },
    ];
    let result = facade::check(Logic::Tfl, "NA", "P -> P", &lines);
    assert!(result.ok);
    assert_eq!(result.status, CheckStatus::Complete);
}

#[test]
fn facade_generate_refuses_non_tfl_logics_without_parsing_anything() {
    let result = facade::generate(Logic::Fomls5, "NA", "Fa", timeout());
    assert!(!result.ok);
    assert_eq!(result.message, "Proof generation is only supported for TFL.");
}

/// `∀I` opens a strict subproof on a fresh individual constant — the only
/// way to write that assumption is the boxed-constant marker syntax `☐[c]`
/// `parse_assumption` recognizes (§4.3). This exercises the whole pipeline
/// a front-end actually drives: text in, `facade::check` out.
#[test]
fn facade_check_completes_a_forall_i_proof_through_the_boxed_constant_marker() {
    let lines = vec![
        CheckLine {
            kind: LineKind::Assumption,
            raw: String::new(),
            line_number: Some(2),
            formula_text: "☐[c]".to_string(),
            just_text: String::new(),
        },
        CheckLine {
            kind: LineKind::Line,
            raw: String::new(),
            line_number: Some(3),
            formula_text: "P(c)".to_string(),
            just_text: "FORALL_E 1".to_string(),
        },
        CheckLine {
            kind: LineKind::CloseSubproof,
            raw: String::new(),
            line_number: Some(4),
            formula_text: "∀x P(x)".to_string(),
            just_text: "FORALL_I 2-3".to_string(),
        },
    ];
    let result = facade::check(Logic::Fol, "∀x P(x)", "∀x P(x)", &lines);
    assert!(result.ok, "{}", result.message);
    assert_eq!(result.status, CheckStatus::Complete);
}

/// `☐I` opens a strict subproof with a bare `☐` assumption (a world-shift,
/// no fresh constant attached) and proves the boxed body inside it — here a
/// trivial `P -> P` nested inside the shifted world.
#[test]
fn facade_check_completes_a_box_i_proof_through_the_bare_marker() {
    let lines = vec![
        CheckLine {
            kind: LineKind::Assumption,
            raw: String::new(),
            line_number: Some(1),
            formula_text: "☐".to_string(),
            just_text: String::new(),
        },
        CheckLine {
            kind: LineKind::Assumption,
            raw: String::new(),
            line_number: Some(2),
            formula_text: "P".to_string(),
            just_text: String::new(),
        },
        CheckLine {
            kind: LineKind::Line,
            raw: String::new(),
            line_number: Some(3),
            formula_text: "P".to_string(),
            just_text: "R 2".to_string(),
        },
        CheckLine {
            kind: LineKind::CloseSubproof,
            raw: String::new(),
            line_number: Some(4),
            formula_text: "P -> P".to_string(),
            just_text: "IMP_I 2-3".to_string(),
        },
        CheckLine {
            kind: LineKind::CloseSubproof,
            raw: String::new(),
            line_number: Some(5),
            formula_text: "☐(P -> P)".to_string(),
            just_text: "BOX_I 1-4".to_string(),
        },
    ];
    let result = facade::check(Logic::Mlk, "NA", "☐(P -> P)", &lines);
    assert!(result.ok, "{}", result.message);
    assert_eq!(result.status, CheckStatus::Complete);
}

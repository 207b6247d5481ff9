//! The public entry points a front-end (the CLI in this repo, or any future
//! HTTP layer) calls instead of touching `Problem`/`checker`/`prover`
//! directly — per-logic dispatch, textual premise-list parsing, and the
//! three external operations a caller needs: checking an in-progress proof,
//! validating a sequent, and generating one automatically.
//!
//! Every result here is a plain struct rather than an error type: a façade
//! call never fails to return — it reports failure as `ok: false` with a
//! message, a uniform shape every caller can match on without catching.

use std::time::Duration;

use crate::models::logic::Logic;
use crate::models::proof::{Problem, SerializedLine};
use crate::parser::{
    parse_and_verify_formula, parse_and_verify_premises, parse_assumption, parse_line,
};
use crate::prover;

/// One line of the incremental edit `check` replays against a fresh
/// `Problem` — one entry per line the front-end currently has on screen.
#[derive(Debug, Clone)]
pub struct CheckLine {
    pub kind: LineKind,
    /// The full `<formula> ; <rule> [<citations>]` text, if the caller has
    /// it assembled already; otherwise built from `formula_text`/`just_text`.
    pub raw: String,
    pub line_number: Option<usize>,
    pub formula_text: String,
    pub just_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Already represented in `Problem::new`'s context; skipped.
    Premise,
    Assumption,
    EndAndBegin,
    Line,
    CloseSubproof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Complete,
    Incomplete,
    Error,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub ok: bool,
    pub status: CheckStatus,
    pub message: String,
    pub proof_string: Option<String>,
}

impl CheckResult {
    fn error(message: impl Into<String>) -> Self {
        CheckResult { ok: false, status: CheckStatus::Error, message: message.into(), proof_string: None }
    }
}

#[derive(Debug, Clone)]
pub struct ValidateResult {
    pub ok: bool,
    pub message: String,
}

impl ValidateResult {
    fn error(message: impl Into<String>) -> Self {
        ValidateResult { ok: false, message: message.into() }
    }

    fn ok() -> Self {
        ValidateResult { ok: true, message: String::new() }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub ok: bool,
    pub message: String,
    pub lines: Option<Vec<SerializedLine>>,
}

impl GenerateResult {
    fn error(message: impl Into<String>) -> Self {
        GenerateResult { ok: false, message: message.into(), lines: None }
    }
}

fn prefix_for(line_number: Option<usize>) -> String {
    match line_number {
        Some(n) => format!("Line {}: ", n),
        None => String::new(),
    }
}

/// Replay `lines` against a fresh `Problem(logic, premises, conclusion)` and
/// report its final state — `status: complete` once the conclusion has been
/// derived at the top level, `incomplete` if every line checks out but the
/// proof isn't finished, `error` (with the first offending message) at the
/// first line that doesn't.
pub fn check(logic: Logic, premises_text: &str, conclusion_text: &str, lines: &[CheckLine]) -> CheckResult {
    let premises = match parse_and_verify_premises(premises_text, logic) {
        Ok(p) => p,
        Err(e) => return CheckResult::error(e.message),
    };
    let conclusion = match parse_and_verify_formula(conclusion_text, logic) {
        Ok(c) => c,
        Err(e) => return CheckResult::error(e.message),
    };

    let mut problem = Problem::new(logic, premises, conclusion);

    for line in lines {
        let prefix = prefix_for(line.line_number);

        match line.kind {
            LineKind::Premise => continue,
            LineKind::Assumption | LineKind::EndAndBegin => {
                if line.formula_text.trim().is_empty() {
                    return CheckResult::error(format!("{}Formula is missing.", prefix));
                }
                let assumption = match parse_assumption(line.formula_text.trim()) {
                    Ok(f) => f,
                    Err(e) => return CheckResult::error(format!("{}{}", prefix, e.message)),
                };
                if line.kind == LineKind::Assumption {
                    problem.begin_subproof(assumption);
                } else if let Err(e) = problem.end_and_begin_subproof(assumption) {
                    return CheckResult::error(format!("{}{}", prefix, e.message));
                }
            }
            LineKind::Line | LineKind::CloseSubproof => {
                if line.formula_text.trim().is_empty() {
                    return CheckResult::error(format!("{}Formula is missing.", prefix));
                }
                if line.just_text.trim().is_empty() {
                    return CheckResult::error(format!("{}Justification is missing.", prefix));
                }
                let raw = if line.raw.trim().is_empty() {
                    format!("{}; {}", line.formula_text.trim(), line.just_text.trim())
                } else {
                    line.raw.clone()
                };
                let (formula, rule, refs) = match parse_line(&raw) {
                    Ok(parsed) => parsed,
                    Err(e) => return CheckResult::error(format!("{}{}", prefix, e.message)),
                };
                if line.kind == LineKind::CloseSubproof {
                    if let Err(e) = problem.end_subproof() {
                        return CheckResult::error(format!("{}{}", prefix, e.message));
                    }
                }
                // `add_line`'s error already embeds "Line N: " via the
                // checker's own display numbering; prefixing again here
                // would double it up.
                if let Err(e) = problem.add_line(formula, rule, &refs) {
                    return CheckResult::error(e.message);
                }
            }
        }
    }

    let (status, message) = if problem.is_complete() {
        (CheckStatus::Complete, "Proof complete!".to_string())
    } else {
        (CheckStatus::Incomplete, "No errors yet, but the proof is incomplete!".to_string())
    };
    CheckResult { ok: true, status, message, proof_string: Some(problem.render()) }
}

/// Parse `premisesText`/`conclusionText` against `logic` without building a
/// `Problem` — the "does this sequent even make sense" check a front-end
/// runs before letting the user start editing lines.
pub fn validate(logic: Logic, premises_text: &str, conclusion_text: &str) -> ValidateResult {
    if let Err(e) = parse_and_verify_premises(premises_text, logic) {
        return ValidateResult::error(format!("Invalid premise(s): {}", e.message));
    }
    if conclusion_text.trim().is_empty() {
        return ValidateResult::error("Invalid conclusion: A conclusion must be provided.");
    }
    if let Err(e) = parse_and_verify_formula(conclusion_text, logic) {
        return ValidateResult::error(format!("Invalid conclusion: {}", e.message));
    }
    ValidateResult::ok()
}

/// Search for a complete TFL proof of `conclusionText` from `premisesText`
/// within `timeout`. `logic` is still taken explicitly (so the caller's
/// "wrong logic" UI path has something to check against), but only
/// `Logic::Tfl` is ever accepted — proof search over FOL/modal fragments is
/// explicitly out of scope (§1 Non-goals).
pub fn generate(logic: Logic, premises_text: &str, conclusion_text: &str, timeout: Duration) -> GenerateResult {
    if logic != Logic::Tfl {
        return GenerateResult::error("Proof generation is only supported for TFL.");
    }
    let premises = match parse_and_verify_premises(premises_text, logic) {
        Ok(p) => p,
        Err(e) => return GenerateResult::error(e.message),
    };
    let conclusion = match parse_and_verify_formula(conclusion_text, logic) {
        Ok(c) => c,
        Err(e) => return GenerateResult::error(e.message),
    };
    match prover::prove(premises, conclusion, timeout) {
        Ok(problem) => {
            GenerateResult { ok: true, message: "Proof complete!".to_string(), lines: Some(problem.serialize()) }
        }
        Err(e) => GenerateResult::error(e.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_timeout() -> Duration {
        Duration::from_secs(3)
    }

    #[test]
    fn check_reports_incomplete_with_no_lines() {
        let result = check(Logic::Tfl, "P, P -> Q", "Q", &[]);
        assert!(result.ok);
        assert_eq!(result.status, CheckStatus::Incomplete);
    }

    #[test]
    fn check_reports_complete_once_conclusion_is_derived() {
        let lines = vec![CheckLine {
            kind: LineKind::Line,
            raw: String::new(),
            line_number: Some(3),
            formula_text: "Q".to_string(),
            just_text: "IMP_E 2, 1".to_string(),
        }];
        let result = check(Logic::Tfl, "P, P -> Q", "Q", &lines);
        assert!(result.ok);
        assert_eq!(result.status, CheckStatus::Complete);
        assert!(result.proof_string.is_some());
    }

    #[test]
    fn check_surfaces_the_first_inference_error() {
        let lines = vec![CheckLine {
            kind: LineKind::Line,
            raw: String::new(),
            line_number: Some(2),
            formula_text: "Q".to_string(),
            just_text: "R 1".to_string(),
        }];
        let result = check(Logic::Tfl, "P", "Q", &lines);
        assert!(!result.ok);
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.message.starts_with("Line 2:"));
    }

    #[test]
    fn validate_rejects_a_blank_conclusion() {
        let result = validate(Logic::Tfl, "P", "   ");
        assert!(!result.ok);
        assert!(result.message.starts_with("Invalid conclusion"));
    }

    #[test]
    fn validate_accepts_a_wellformed_sequent() {
        let result = validate(Logic::Tfl, "P, P -> Q", "Q");
        assert!(result.ok);
    }

    #[test]
    fn generate_rejects_non_tfl_logics() {
        let result = generate(Logic::Fol, "NA", "P", default_timeout());
        assert!(!result.ok);
        assert_eq!(result.message, "Proof generation is only supported for TFL.");
    }

    #[test]
    fn generate_finds_a_tfl_proof() {
        let result = generate(Logic::Tfl, "P, P -> Q", "Q", default_timeout());
        assert!(result.ok);
        assert!(result.lines.is_some());
    }
}

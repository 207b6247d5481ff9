//! The mutating half of a `Problem`: adding a justified line, opening and
//! closing subproofs, and undoing the most recent edit. A schema failure
//! does not reject the edit outright — the line is inserted so the user can
//! see exactly what they wrote, `errors()` reports why it doesn't check out,
//! and the caller (the façade's edit loop, or the CLI directly) calls
//! `delete_line` to roll it back before the user tries again.

use crate::error::InferenceError;
use crate::models::logic::Logic;
use crate::models::proof::{
    AccessKind, Citation, Edit, Justification, Line, ObjectId, Problem, ProofObject, Subproof,
};
use crate::models::formula::Formula;
use crate::models::rule::Rule;
use crate::schema;

/// A citation exactly as a user types it: a display line number, or the
/// `start–end` range of a closed subproof. Resolved against the live
/// `Problem` at validation time — the parser never sees object ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationRef {
    Line(usize),
    Range(usize, usize),
}

impl Problem {
    fn fail<T>(&mut self, msg: impl Into<String>) -> Result<T, InferenceError> {
        let err = InferenceError::new(msg);
        self.errors.push(err.message.clone());
        Err(err)
    }

    fn resolve_citations(
        &self,
        refs: &[CitationRef],
    ) -> Result<(Vec<ObjectId>, Vec<ObjectId>, Vec<Citation>), String> {
        let accessible = self.accessible();
        let mut lines = Vec::new();
        let mut subproofs = Vec::new();
        let mut citations = Vec::new();
        for r in refs {
            let (id, kind) = match *r {
                CitationRef::Line(n) => {
                    let id = self.id_at_number(n).ok_or_else(|| format!("no line {}", n))?;
                    (id, AccessKind::Line)
                }
                CitationRef::Range(start, end) => {
                    let id = self
                        .subproof_id_spanning(start, end)
                        .ok_or_else(|| format!("no closed subproof spans lines {}–{}", start, end))?;
                    (id, AccessKind::Subproof)
                }
            };
            if accessible.get(&id) != Some(&kind) {
                return Err("that citation is not accessible from here".to_string());
            }
            match kind {
                AccessKind::Line => {
                    lines.push(id);
                    citations.push(Citation::Line(id));
                }
                AccessKind::Subproof => {
                    subproofs.push(id);
                    citations.push(Citation::Subproof(id));
                }
            }
        }
        Ok((lines, subproofs, citations))
    }

    fn validate_last(
        &self,
        rule: Rule,
        lines: &[ObjectId],
        subproofs: &[ObjectId],
        formula: &Formula,
    ) -> Result<(), InferenceError> {
        if !self.logic.rules().contains(&rule) {
            return Err(InferenceError::new(format!("{} is not available in {}", rule, self.logic)));
        }
        let arity = rule.arity();
        if lines.len() != arity.lines || subproofs.len() != arity.subproofs {
            return Err(InferenceError::new(format!(
                "{} takes {} line(s) and {} subproof(s), got {} and {}",
                rule,
                arity.lines,
                arity.subproofs,
                lines.len(),
                subproofs.len()
            )));
        }
        schema::check(self, rule, lines, subproofs, formula)
    }

    /// Append `formula` as a new line justified by `rule` citing `refs`.
    /// The line is always inserted; if it doesn't check out, the returned
    /// (and recorded) error names the problem and the line stays in place
    /// for `delete_line` to remove.
    pub fn add_line(&mut self, formula: Formula, rule: Rule, refs: &[CitationRef]) -> Result<ObjectId, InferenceError> {
        self.errors.clear();
        let (lines, subproofs, citations) = match self.resolve_citations(refs) {
            Ok(resolved) => resolved,
            Err(msg) => return self.fail(msg),
        };
        let id = self.mint_id();
        self.current_seq_mut().push(ProofObject::Line(Line {
            id,
            formula: formula.clone(),
            justification: Justification::new(rule, citations),
        }));
        self.edits.push(Edit::AddLine);
        if let Err(err) = self.validate_last(rule, &lines, &subproofs, &formula) {
            let n = self.line_number(id).unwrap_or(0);
            let numbered = InferenceError::on_line(n, &err);
            self.errors.push(numbered.message.clone());
            return Err(numbered);
        }
        Ok(id)
    }

    /// Open a subproof assuming `assumption`. Always succeeds — a subproof
    /// may assume anything wellformed, including a `Formula::BoxMarker` to
    /// open a *strict* subproof (see `Subproof::is_strict`).
    pub fn begin_subproof(&mut self, assumption: Formula) -> ObjectId {
        self.errors.clear();
        let line_id = self.mint_id();
        let sp_id = self.mint_id();
        let line = Line { id: line_id, formula: assumption, justification: Justification::assumption() };
        let idx = self.current_seq().len();
        self.current_seq_mut().push(ProofObject::Subproof(Subproof { id: sp_id, sequence: vec![ProofObject::Line(line)] }));
        self.open_path.push(idx);
        self.edits.push(Edit::BeginSubproof);
        sp_id
    }

    /// Assume `formula` as the second line of the just-opened strict
    /// subproof — `∃E`'s instantiated witness, or `◇E`'s diamond body.
    pub fn assume_next(&mut self, formula: Formula) -> Result<ObjectId, InferenceError> {
        self.errors.clear();
        let sp_id = match self.open_subproof_ids().last().copied() {
            Some(id) => id,
            None => return self.fail("no subproof is open"),
        };
        let sp = self.find_subproof(sp_id).expect("open subproof must exist");
        if !sp.is_strict() || sp.sequence.len() != 1 {
            return self.fail("only the line right after a strict subproof opens can assume a second formula");
        }
        let line_id = self.mint_id();
        self.current_seq_mut().push(ProofObject::Line(Line {
            id: line_id,
            formula,
            justification: Justification::assumption(),
        }));
        self.edits.push(Edit::AddLine);
        Ok(line_id)
    }

    /// Close the innermost open subproof, making it citable as a single
    /// `start–end` range.
    pub fn end_subproof(&mut self) -> Result<ObjectId, InferenceError> {
        self.errors.clear();
        let reopened_idx = match self.open_path.last().copied() {
            Some(idx) => idx,
            None => return self.fail("no subproof is open"),
        };
        let sp_id = self.open_subproof_ids().last().copied().unwrap();
        let sp = self.find_subproof(sp_id).expect("open subproof must exist");
        if sp.sequence.len() < 2 {
            return self.fail("a subproof needs at least one line beyond its assumption before it can close");
        }
        self.open_path.pop();
        self.edits.push(Edit::EndSubproof { reopened_idx });
        Ok(sp_id)
    }

    /// Close the innermost open subproof and immediately open a sibling
    /// assuming `assumption` — the two halves of `∨E`/`↔I` are written this
    /// way, one atomic edit `delete_line` can undo as a whole.
    pub fn end_and_begin_subproof(&mut self, assumption: Formula) -> Result<ObjectId, InferenceError> {
        self.errors.clear();
        let reopened_idx = match self.open_path.last().copied() {
            Some(idx) => idx,
            None => return self.fail("no subproof is open"),
        };
        let sp_id = self.open_subproof_ids().last().copied().unwrap();
        let sp = self.find_subproof(sp_id).expect("open subproof must exist");
        if sp.sequence.len() < 2 {
            return self.fail("a subproof needs at least one line beyond its assumption before another can follow it");
        }
        self.open_path.pop();
        let line_id = self.mint_id();
        let new_sp_id = self.mint_id();
        let line = Line { id: line_id, formula: assumption, justification: Justification::assumption() };
        let idx = self.current_seq().len();
        self.current_seq_mut().push(ProofObject::Subproof(Subproof { id: new_sp_id, sequence: vec![ProofObject::Line(line)] }));
        self.open_path.push(idx);
        self.edits.push(Edit::EndAndBeginSubproof { reopened_idx });
        Ok(new_sp_id)
    }

    /// Undo the single most recent `add_line`/`begin_subproof`/
    /// `end_subproof`/`end_and_begin_subproof`/`assume_next`.
    pub fn delete_line(&mut self) -> Result<(), InferenceError> {
        self.errors.clear();
        match self.edits.pop() {
            None => self.fail("nothing to undo"),
            Some(Edit::AddLine) => {
                self.current_seq_mut().pop();
                Ok(())
            }
            Some(Edit::BeginSubproof) => {
                self.open_path.pop();
                self.current_seq_mut().pop();
                Ok(())
            }
            Some(Edit::EndSubproof { reopened_idx }) => {
                self.open_path.push(reopened_idx);
                Ok(())
            }
            Some(Edit::EndAndBeginSubproof { reopened_idx }) => {
                self.open_path.pop();
                self.current_seq_mut().pop();
                self.open_path.push(reopened_idx);
                Ok(())
            }
        }
    }
}

/// Build the automatically-assigned premise line for a given logic,
/// validating its well-formedness — `Problem::new` callers (the façade)
/// reject a malformed premise before a `Problem` is even constructed, so
/// this mirrors that check for a premise list already validated elsewhere.
pub fn premises_are_wellformed(logic: Logic, premises: &[Formula]) -> bool {
    premises.iter().all(|p| logic.is_wellformed(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::proof::Problem as P;

    fn atom(s: &str) -> Formula {
        Formula::atom(s)
    }

    #[test]
    fn modus_ponens_proof_completes() {
        let mut p = P::new(
            Logic::Tfl,
            vec![atom("P"), Formula::imp(atom("P"), atom("Q"))],
            atom("Q"),
        );
        let q = p.add_line(atom("Q"), Rule::ImpE, &[CitationRef::Line(2), CitationRef::Line(1)]);
        assert!(q.is_ok());
        assert!(p.is_complete());
    }

    #[test]
    fn invalid_line_stays_visible_until_deleted() {
        let mut p = P::new(Logic::Tfl, vec![atom("P")], atom("Q"));
        let bad = p.add_line(atom("Q"), Rule::R, &[CitationRef::Line(1)]);
        assert!(bad.is_err());
        assert_eq!(p.flatten().len(), 2);
        assert!(!p.errors().is_empty());
        p.delete_line().unwrap();
        assert_eq!(p.flatten().len(), 1);
    }

    #[test]
    fn imp_i_round_trips_through_a_subproof() {
        let mut p = P::new(Logic::Tfl, vec![], Formula::imp(atom("P"), atom("P")));
        p.begin_subproof(atom("P"));
        p.add_line(atom("P"), Rule::R, &[CitationRef::Line(1)]).unwrap();
        p.end_subproof().unwrap();
        let id = p.add_line(Formula::imp(atom("P"), atom("P")), Rule::ImpI, &[CitationRef::Range(1, 2)]);
        assert!(id.is_ok());
        assert!(p.is_complete());
    }

    #[test]
    fn delete_line_undoes_begin_subproof() {
        let mut p = P::new(Logic::Tfl, vec![], atom("P"));
        p.begin_subproof(atom("P"));
        assert_eq!(p.depth(), 1);
        p.delete_line().unwrap();
        assert_eq!(p.depth(), 0);
        assert_eq!(p.flatten().len(), 0);
    }
}

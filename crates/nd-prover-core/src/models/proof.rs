//! The proof object model: lines, subproofs, and the `Problem` a checker
//! session operates on. A `Proof` is a tree — `ProofObject::Subproof` nests
//! recursively — matching the shape the façade walks to serialize a proof
//! for external consumers (one entry per line or closed subproof, at
//! increasing indent).

use super::formula::Formula;
use super::logic::Logic;
use super::rule::Rule;
use std::fmt;

pub type ObjectId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Citation {
    Line(ObjectId),
    Subproof(ObjectId),
}

#[derive(Debug, Clone)]
pub struct Justification {
    pub rule: Rule,
    pub citations: Vec<Citation>,
}

impl Justification {
    pub fn new(rule: Rule, citations: Vec<Citation>) -> Self {
        Self { rule, citations }
    }

    pub fn premise() -> Self {
        Self { rule: Rule::Pr, citations: Vec::new() }
    }

    pub fn assumption() -> Self {
        Self { rule: Rule::As, citations: Vec::new() }
    }

    pub fn referenced_ids(&self) -> Vec<ObjectId> {
        self.citations
            .iter()
            .map(|c| match c {
                Citation::Line(id) | Citation::Subproof(id) => *id,
            })
            .collect()
    }
}

impl fmt::Display for Justification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.citations.is_empty() {
            return write!(f, "{}", self.rule);
        }
        let ids: Vec<String> = self.citations.iter().map(|c| format!("{}", citation_id(c))).collect();
        write!(f, "{} {}", self.rule, ids.join(", "))
    }
}

fn citation_id(c: &Citation) -> ObjectId {
    match c {
        Citation::Line(id) | Citation::Subproof(id) => *id,
    }
}

#[derive(Debug, Clone)]
pub struct Line {
    pub id: ObjectId,
    pub formula: Formula,
    pub justification: Justification,
}

/// A subproof: a nested derivation whose first element is always an
/// assumption line (rule `AS`). `ForallI`/`ExistsE`/`BoxI`/`DiaE` use a
/// *strict* subproof, marked `Formula::BoxMarker` on that first line.
#[derive(Debug, Clone)]
pub struct Subproof {
    pub id: ObjectId,
    pub sequence: Vec<ProofObject>,
}

impl Subproof {
    pub fn assumption(&self) -> &Line {
        match self.sequence.first() {
            Some(ProofObject::Line(l)) => l,
            _ => panic!("a subproof's first element is always an assumption line"),
        }
    }

    pub fn conclusion(&self) -> Option<&Line> {
        match self.sequence.last() {
            Some(ProofObject::Line(l)) => Some(l),
            _ => None,
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self.assumption().formula, Formula::BoxMarker(_))
    }

    /// Whether this is specifically a *modal* strict subproof (a world-shift,
    /// `BoxMarker(None)`) rather than a FOL freshness subproof
    /// (`BoxMarker(Some(c))`). Only the former is subject to the per-logic
    /// reiteration policy in §4.3.
    pub fn is_modal_strict(&self) -> bool {
        matches!(self.assumption().formula, Formula::BoxMarker(None))
    }

    /// The second line of a strict subproof that assumes an *instantiated*
    /// witness formula — `∃E`'s `φ[c/v]` or `◇E`'s `φ` — rather than
    /// introducing the fresh constant/world itself.
    pub fn instance_line(&self) -> Option<&Line> {
        match self.sequence.get(1) {
            Some(ProofObject::Line(l)) => Some(l),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ProofObject {
    Line(Line),
    Subproof(Subproof),
}

impl ProofObject {
    pub fn is_line(&self) -> bool {
        matches!(self, ProofObject::Line(_))
    }

    pub fn id(&self) -> ObjectId {
        match self {
            ProofObject::Line(l) => l.id,
            ProofObject::Subproof(s) => s.id,
        }
    }
}

/// The root derivation: a flat list of premises (`context`) plus a growing
/// sequence of lines and nested subproofs (`seq`).
#[derive(Debug, Clone, Default)]
pub struct Proof {
    pub context: Vec<Line>,
    pub seq: Vec<ProofObject>,
}

/// What the checker is editing: a logic, a fixed sequent (premises and
/// conclusion), the proof built so far, and the per-line errors accumulated
/// by the last edit. Mutating methods live in `crate::checker`;
/// this struct only owns the state and the bookkeeping (id minting, the
/// open-subproof cursor, accessibility) that every edit needs.
#[derive(Debug, Clone)]
pub struct Problem {
    pub logic: Logic,
    pub conclusion: Formula,
    pub proof: Proof,
    pub(crate) next_id: ObjectId,
    /// Index path from the root into the currently open (innermost)
    /// subproof. Empty means we are adding directly to `proof.seq`.
    pub(crate) open_path: Vec<usize>,
    pub(crate) errors: Vec<String>,
    /// One entry per public edit, sufficient for `delete_line` to undo the
    /// most recent `add_line`/`begin_subproof`/`end_subproof`/
    /// `end_and_begin_subproof` — see `crate::checker`.
    pub(crate) edits: Vec<Edit>,
}

/// The undo record for one public edit. `EndSubproof`/`EndAndBeginSubproof`
/// carry the index the closed subproof held in its parent's sequence, so
/// undoing can push it back onto `open_path` to reopen it.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Edit {
    AddLine,
    BeginSubproof,
    EndSubproof { reopened_idx: usize },
    EndAndBeginSubproof { reopened_idx: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Line,
    Subproof,
}

impl Problem {
    pub fn new(logic: Logic, premises: Vec<Formula>, conclusion: Formula) -> Self {
        let mut next_id = 0;
        let context = premises
            .into_iter()
            .map(|formula| {
                let id = next_id;
                next_id += 1;
                Line { id, formula, justification: Justification::premise() }
            })
            .collect();
        Problem {
            logic,
            conclusion,
            proof: Proof { context, seq: Vec::new() },
            next_id,
            open_path: Vec::new(),
            errors: Vec::new(),
            edits: Vec::new(),
        }
    }

    pub fn mint_id(&mut self) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn depth(&self) -> usize {
        self.open_path.len()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_complete(&self) -> bool {
        self.depth() == 0
            && matches!(
                self.proof.seq.last(),
                Some(ProofObject::Line(l)) if l.formula == self.conclusion
            )
    }

    /// Walk `open_path` from the root and return the sequence currently
    /// being appended to (the innermost open subproof's, or the root's).
    pub(crate) fn current_seq(&self) -> &Vec<ProofObject> {
        let mut seq = &self.proof.seq;
        for &idx in &self.open_path {
            seq = match &seq[idx] {
                ProofObject::Subproof(sp) => &sp.sequence,
                ProofObject::Line(_) => unreachable!("open_path must index subproofs"),
            };
        }
        seq
    }

    pub(crate) fn current_seq_mut(&mut self) -> &mut Vec<ProofObject> {
        let mut seq = &mut self.proof.seq;
        for &idx in &self.open_path {
            seq = match &mut seq[idx] {
                ProofObject::Subproof(sp) => &mut sp.sequence,
                ProofObject::Line(_) => unreachable!("open_path must index subproofs"),
            };
        }
        seq
    }

    /// Every object id currently citable from the position about to be
    /// written to: every premise, every object textually preceding the
    /// current position in every enclosing subproof (the subproof itself
    /// never being one of them, since it isn't closed yet), and every
    /// object already present at the current depth.
    pub fn accessible(&self) -> std::collections::HashMap<ObjectId, AccessKind> {
        let mut out = std::collections::HashMap::new();
        for line in &self.proof.context {
            out.insert(line.id, AccessKind::Line);
        }
        let mut seq = &self.proof.seq;
        for &idx in &self.open_path {
            collect_accessible(seq, idx, &mut out);
            seq = match &seq[idx] {
                ProofObject::Subproof(sp) => &sp.sequence,
                ProofObject::Line(_) => unreachable!("open_path must index subproofs"),
            };
        }
        collect_accessible(seq, seq.len(), &mut out);
        out
    }

    pub fn find_line(&self, id: ObjectId) -> Option<&Line> {
        for line in &self.proof.context {
            if line.id == id {
                return Some(line);
            }
        }
        find_line_in(&self.proof.seq, id)
    }

    pub fn find_subproof(&self, id: ObjectId) -> Option<&Subproof> {
        find_subproof_in(&self.proof.seq, id)
    }

    /// True when `outer_id` names a subproof that strictly contains the
    /// object currently being validated (i.e. the current position lies
    /// inside it). Used to detect a citation that crosses a strict
    /// subproof boundary, which the reiteration policy governs specially.
    pub fn encloses_current(&self, outer_id: ObjectId) -> bool {
        let mut seq = &self.proof.seq;
        for &idx in &self.open_path {
            match &seq[idx] {
                ProofObject::Subproof(sp) => {
                    if sp.id == outer_id {
                        return true;
                    }
                    seq = &sp.sequence;
                }
                ProofObject::Line(_) => unreachable!(),
            }
        }
        false
    }

    /// The strict subproofs (by id, outermost first) enclosing the current
    /// position, innermost last.
    pub fn enclosing_strict_subproofs(&self) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut seq = &self.proof.seq;
        for &idx in &self.open_path {
            match &seq[idx] {
                ProofObject::Subproof(sp) => {
                    if sp.is_strict() {
                        out.push(sp.id);
                    }
                    seq = &sp.sequence;
                }
                ProofObject::Line(_) => unreachable!(),
            }
        }
        out
    }

    /// The ids of the subproofs currently open, outermost first — the
    /// `Subproof` counterpart of `open_path`.
    pub fn open_subproof_ids(&self) -> Vec<ObjectId> {
        let mut ids = Vec::new();
        let mut seq = &self.proof.seq;
        for &idx in &self.open_path {
            match &seq[idx] {
                ProofObject::Subproof(sp) => {
                    ids.push(sp.id);
                    seq = &sp.sequence;
                }
                ProofObject::Line(_) => unreachable!(),
            }
        }
        ids
    }

    /// The chain of enclosing subproof ids for `target` (a line or subproof
    /// id), outermost first. Empty if `target` is a premise or sits directly
    /// at the root.
    pub fn ancestor_subproof_ids(&self, target: ObjectId) -> Vec<ObjectId> {
        let mut stack = Vec::new();
        let mut out = Vec::new();
        find_ancestors(&self.proof.seq, target, &mut stack, &mut out);
        out
    }

    /// How many *modal* strict (world-shift) subproof boundaries separate
    /// `cited_id` from the current editing position — the quantity §4.3's
    /// per-logic reiteration policy is indexed on.
    pub fn modal_boundaries_crossed(&self, cited_id: ObjectId) -> usize {
        let cited_path = self.ancestor_subproof_ids(cited_id);
        let current_path = self.open_subproof_ids();
        let common = cited_path.iter().zip(current_path.iter()).take_while(|(a, b)| a == b).count();
        current_path[common..]
            .iter()
            .filter(|id| self.find_subproof(**id).map(|sp| sp.is_modal_strict()).unwrap_or(false))
            .count()
    }

    /// Whether `c` occurs as a constant in no line currently accessible from
    /// the editing position — the freshness side condition `∀I`/`∃E` need.
    pub fn constant_fresh_outside(&self, c: &super::formula::Term) -> bool {
        !self.accessible().keys().any(|&id| {
            self.find_line(id).map(|l| super::formula::constants(&l.formula).contains(c)).unwrap_or(false)
        })
    }

    /// Every subproof in the tree as `(subproof_id, assumption_line_id,
    /// conclusion_line_id)`, used to translate a closed subproof into the
    /// `n–m` citation range a user would write for it.
    pub fn collect_subproofs(&self) -> Vec<(ObjectId, ObjectId, ObjectId)> {
        let mut out = Vec::new();
        collect_subproofs_in(&self.proof.seq, &mut out);
        out
    }

    /// A depth-first walk assigning display line numbers 1.. across the
    /// premises and the proof tree — the numbering `errors()` messages and
    /// the §6 serialized proof both use (distinct from the internal,
    /// never-reused `ObjectId`, per §5's Ordering note).
    pub fn flatten(&self) -> Vec<FlatLine> {
        let mut out = Vec::new();
        let mut n = 0usize;
        for line in &self.proof.context {
            n += 1;
            out.push(FlatLine {
                number: n,
                indent: 0,
                id: line.id,
                formula: line.formula.clone(),
                justification: Some(line.justification.clone()),
                is_premise: true,
                is_assumption: false,
            });
        }
        flatten_seq(&self.proof.seq, 1, &mut n, &mut out);
        out
    }

    pub fn line_number(&self, id: ObjectId) -> Option<usize> {
        self.flatten().into_iter().find(|l| l.id == id).map(|l| l.number)
    }

    pub fn id_at_number(&self, number: usize) -> Option<ObjectId> {
        self.flatten().into_iter().find(|l| l.number == number).map(|l| l.id)
    }

    /// The subproof whose assumption and conclusion display as lines `start`
    /// and `end` — the object a citation written `start–end` resolves to.
    pub fn subproof_id_spanning(&self, start: usize, end: usize) -> Option<ObjectId> {
        let flat = self.flatten();
        let number_of = |id: ObjectId| flat.iter().find(|l| l.id == id).map(|l| l.number);
        self.collect_subproofs()
            .into_iter()
            .find(|(_, asm, concl)| number_of(*asm) == Some(start) && number_of(*concl) == Some(end))
            .map(|(sp_id, _, _)| sp_id)
    }

    /// `justification` rendered with display line numbers (and `n–m`
    /// subproof ranges) instead of raw object ids.
    pub fn justification_text(&self, justification: &Justification) -> String {
        if justification.citations.is_empty() {
            return justification.rule.to_string();
        }
        let flat = self.flatten();
        let number_of = |id: ObjectId| flat.iter().find(|l| l.id == id).map(|l| l.number);
        let subproofs = self.collect_subproofs();
        let parts: Vec<String> = justification
            .citations
            .iter()
            .map(|c| match c {
                Citation::Line(id) => number_of(*id).map(|n| n.to_string()).unwrap_or_else(|| "?".to_string()),
                Citation::Subproof(id) => subproofs
                    .iter()
                    .find(|(sp_id, _, _)| sp_id == id)
                    .map(|(_, asm, concl)| {
                        format!(
                            "{}–{}",
                            number_of(*asm).unwrap_or(0),
                            number_of(*concl).unwrap_or(0)
                        )
                    })
                    .unwrap_or_else(|| "?".to_string()),
            })
            .collect();
        format!("{} {}", justification.rule, parts.join(", "))
    }

    /// The Fitch diagram for the whole problem, one indented/numbered line
    /// per premise, assumption, and derived line.
    pub fn render(&self) -> String {
        self.flatten()
            .into_iter()
            .map(|l| {
                let indent = "  ".repeat(l.indent);
                let just = l
                    .justification
                    .as_ref()
                    .map(|j| self.justification_text(j))
                    .unwrap_or_default();
                format!("{:>3}. {}{}   {}", l.number, indent, l.formula, just)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The §6 external "serialized proof" shape, one entry per flattened line.
    pub fn serialize(&self) -> Vec<SerializedLine> {
        self.flatten()
            .into_iter()
            .map(|l| SerializedLine {
                indent: l.indent,
                text: l.formula.to_string(),
                just_text: l.justification.as_ref().map(|j| self.justification_text(j)).unwrap_or_default(),
                is_assumption: l.is_assumption,
                is_premise: l.is_premise,
            })
            .collect()
    }
}

/// One flattened, display-numbered line of a `Problem` — a premise, an
/// assumption, or an ordinarily derived line.
#[derive(Debug, Clone)]
pub struct FlatLine {
    pub number: usize,
    pub indent: usize,
    pub id: ObjectId,
    pub formula: Formula,
    pub justification: Option<Justification>,
    pub is_premise: bool,
    pub is_assumption: bool,
}

/// The §6 "serialized proof" record: `{ indent, text, justText, isAssumption, isPremise }`.
#[derive(Debug, Clone)]
pub struct SerializedLine {
    pub indent: usize,
    pub text: String,
    pub just_text: String,
    pub is_assumption: bool,
    pub is_premise: bool,
}

fn flatten_seq(seq: &[ProofObject], indent: usize, n: &mut usize, out: &mut Vec<FlatLine>) {
    for obj in seq {
        match obj {
            ProofObject::Line(l) => {
                *n += 1;
                out.push(FlatLine {
                    number: *n,
                    indent,
                    id: l.id,
                    formula: l.formula.clone(),
                    justification: Some(l.justification.clone()),
                    is_premise: false,
                    is_assumption: l.justification.rule == Rule::As,
                });
            }
            ProofObject::Subproof(sp) => flatten_seq(&sp.sequence, indent + 1, n, out),
        }
    }
}

fn collect_subproofs_in(seq: &[ProofObject], out: &mut Vec<(ObjectId, ObjectId, ObjectId)>) {
    for obj in seq {
        if let ProofObject::Subproof(sp) = obj {
            if let Some(concl) = sp.conclusion() {
                out.push((sp.id, sp.assumption().id, concl.id));
            }
            collect_subproofs_in(&sp.sequence, out);
        }
    }
}

fn find_ancestors(seq: &[ProofObject], target: ObjectId, stack: &mut Vec<ObjectId>, out: &mut Vec<ObjectId>) -> bool {
    for obj in seq {
        match obj {
            ProofObject::Line(l) if l.id == target => {
                *out = stack.clone();
                return true;
            }
            ProofObject::Subproof(sp) => {
                if sp.id == target {
                    *out = stack.clone();
                    return true;
                }
                stack.push(sp.id);
                if find_ancestors(&sp.sequence, target, stack, out) {
                    return true;
                }
                stack.pop();
            }
            _ => {}
        }
    }
    false
}

fn collect_accessible(seq: &[ProofObject], limit: usize, out: &mut std::collections::HashMap<ObjectId, AccessKind>) {
    for obj in &seq[..limit] {
        match obj {
            ProofObject::Line(l) => {
                out.insert(l.id, AccessKind::Line);
            }
            ProofObject::Subproof(sp) => {
                out.insert(sp.id, AccessKind::Subproof);
            }
        }
    }
}

fn find_line_in(seq: &[ProofObject], id: ObjectId) -> Option<&Line> {
    for obj in seq {
        match obj {
            ProofObject::Line(l) if l.id == id => return Some(l),
            ProofObject::Subproof(sp) => {
                if let Some(found) = find_line_in(&sp.sequence, id) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

fn find_subproof_in(seq: &[ProofObject], id: ObjectId) -> Option<&Subproof> {
    for obj in seq {
        match obj {
            ProofObject::Subproof(sp) => {
                if sp.id == id {
                    return Some(sp);
                }
                if let Some(found) = find_subproof_in(&sp.sequence, id) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> Problem {
        Problem::new(Logic::Tfl, vec![Formula::atom("P")], Formula::atom("P"))
    }

    #[test]
    fn premises_are_always_accessible() {
        let problem = p();
        let acc = problem.accessible();
        assert_eq!(acc.get(&0), Some(&AccessKind::Line));
    }

    #[test]
    fn fresh_problem_is_not_complete() {
        assert!(!p().is_complete());
    }

    #[test]
    fn mint_id_is_monotonic() {
        let mut problem = p();
        let a = problem.mint_id();
        let b = problem.mint_id();
        assert!(b > a);
    }
}

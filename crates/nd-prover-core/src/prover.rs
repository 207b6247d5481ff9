//! Proof search: given a TFL sequent, find a natural-deduction proof or
//! report that none exists. The search runs over a flat, append-only
//! sequence (every ancestor line plus whatever the search derives at the
//! current level) and only folds newly derived material into a nested
//! subproof once that subproof's own search finishes. `SProof`/`SLine` are
//! the flat search-local stand-ins for `Subproof`/`Line`, and `translate` is
//! the one place that mints real `Problem` object ids and nests the result.
//!
//! A saturating elimination sweep (`eliminate`) and a goal-directed
//! introduction dispatch (`introduce`) run first; when both are stuck, five
//! SAT-guided "forcing" strategies are tried in turn, each on its own forked
//! copy of the search state, and `commit_best_branch` keeps whichever
//! succeeding fork minimizes `(ip_count, line_count)`.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::error::ProverError;
use crate::models::formula::Formula;
use crate::models::logic::Logic;
use crate::models::proof::{AccessKind, Citation, Justification, Line, ObjectId, Problem, ProofObject, Subproof};
use crate::models::rule::Rule;
use crate::sat::{countermodel, is_valid};

type Ids = Rc<RefCell<u64>>;

fn mint(ids: &Ids) -> u64 {
    let mut b = ids.borrow_mut();
    let id = *b;
    *b += 1;
    id
}

/// A search-local line: the flat-search counterpart of `models::proof::Line`,
/// addressed by a search-only id distinct from any `ObjectId`.
#[derive(Clone, PartialEq)]
struct SLine {
    id: u64,
    formula: Formula,
    rule: Rule,
    citations: Vec<u64>,
}

impl SLine {
    fn is_assumption(&self) -> bool {
        matches!(self.rule, Rule::Pr | Rule::As)
    }
}

#[derive(Clone, PartialEq)]
enum SObj {
    Line(SLine),
    Sub(SProof),
}

impl SObj {
    fn id(&self) -> u64 {
        match self {
            SObj::Line(l) => l.id,
            SObj::Sub(s) => s.id,
        }
    }

    fn line_count(&self) -> usize {
        match self {
            SObj::Line(_) => 1,
            SObj::Sub(s) => s.line_count(),
        }
    }

    fn ip_count(&self) -> usize {
        match self {
            SObj::Line(l) => usize::from(l.rule == Rule::Ip),
            SObj::Sub(s) => s.ip_count(),
        }
    }
}

/// A search-local derivation: `goal` is what this scope is trying to derive,
/// `seq` is everything accessible to it (ancestor lines included, flattened,
/// until the point this scope is folded back into its parent as a nested
/// `Subproof`).
#[derive(Clone, PartialEq)]
struct SProof {
    id: u64,
    seq: Vec<SObj>,
    goal: Formula,
}

impl SProof {
    fn new(ids: &Ids, seq: Vec<SObj>, goal: Formula) -> Self {
        SProof { id: mint(ids), seq, goal }
    }

    /// Top-level line formulas only — a nested subproof's internal lines
    /// aren't accessible once it closes, so they don't count here.
    fn formulas(&self) -> HashSet<Formula> {
        self.seq
            .iter()
            .filter_map(|o| match o {
                SObj::Line(l) => Some(l.formula.clone()),
                SObj::Sub(_) => None,
            })
            .collect()
    }

    fn assumptions(&self) -> HashSet<Formula> {
        self.seq
            .iter()
            .filter_map(|o| match o {
                SObj::Line(l) if l.is_assumption() => Some(l.formula.clone()),
                _ => None,
            })
            .collect()
    }

    fn line_count(&self) -> usize {
        self.seq.iter().map(SObj::line_count).sum()
    }

    fn ip_count(&self) -> usize {
        self.seq.iter().map(SObj::ip_count).sum()
    }

    fn add(&mut self, objs: Vec<SObj>) {
        self.seq.extend(objs);
    }

    /// Drop and return the citation of a trailing pure reiteration — used
    /// after a sibling branch finishes, to cite the original line directly
    /// rather than through a pointless `R`.
    fn pop_reiteration(&mut self) -> u64 {
        if let Some(SObj::Line(l)) = self.seq.last() {
            if l.rule == Rule::R {
                let cite = l.citations[0];
                self.seq.pop();
                return cite;
            }
        }
        self.seq.last().expect("a branch always derives at least one line").id()
    }

    /// Replace `self.seq` with whichever of `branches` minimizes
    /// `(ip_count, line_count)`, returning whether any branch succeeded.
    fn commit_best_branch(&mut self, branches: Vec<SProof>) -> bool {
        match branches.into_iter().min_by_key(|p| (p.ip_count(), p.line_count())) {
            Some(best) => {
                self.seq = best.seq;
                true
            }
            None => false,
        }
    }
}

type Seen = Rc<RefCell<HashMap<(BTreeSet<Formula>, Formula), ((usize, usize), HashSet<Formula>)>>>;

/// The sharing policy the reference search uses for the second half of a
/// two-branch forcing strategy (`∨E`'s second disjunct, `↔E`-force's second
/// side): the original code forks a private copy of the memo table rather
/// than sharing it with the first branch, which can make the search miss a
/// proof the shared table would have pruned into reach. `false` reproduces
/// that policy exactly; flip it to let branches within one forcing move
/// share memoization.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub share_seen_on_second_branch: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions { share_seen_on_second_branch: false }
    }
}

struct Prover {
    proof: SProof,
    seen: Seen,
    deadline: Option<Instant>,
    ids: Ids,
    options: SearchOptions,
}

impl Prover {
    fn fork(&self) -> Prover {
        Prover {
            proof: self.proof.clone(),
            seen: self.seen.clone(),
            deadline: self.deadline,
            ids: self.ids.clone(),
            options: self.options,
        }
    }

    fn forked_seen(&self) -> Seen {
        if self.options.share_seen_on_second_branch {
            self.seen.clone()
        } else {
            Rc::new(RefCell::new(self.seen.borrow().clone()))
        }
    }

    /// Memoize `(assumptions, goal)` against the cost/derived-formula set
    /// already seen for that state, pruning this call if it's dominated.
    fn enter_state(&mut self) -> bool {
        let key: (BTreeSet<Formula>, Formula) =
            (self.proof.assumptions().into_iter().collect(), self.proof.goal.clone());
        let mut cost = (self.proof.ip_count(), self.proof.line_count());
        let mut formulas = self.proof.formulas();
        let mut seen = self.seen.borrow_mut();
        if let Some((prev_cost, prev_formulas)) = seen.get(&key).cloned() {
            if cost >= prev_cost && formulas.is_subset(&prev_formulas) {
                return false;
            }
            if cost > prev_cost {
                cost = prev_cost;
            }
            if formulas.is_subset(&prev_formulas) && formulas != prev_formulas {
                formulas = prev_formulas;
            }
        }
        seen.insert(key, (cost, formulas));
        true
    }

    /// `complete`: keep exploring every strategy and keep the cheapest
    /// (used for the primary, time-bounded search); when false, commit to
    /// the first strategy that succeeds (the unbounded fallback search,
    /// which only needs *a* proof, not the best one).
    fn prove(&mut self, complete: bool) -> Result<bool, ()> {
        if let Some(dl) = self.deadline {
            if Instant::now() >= dl {
                return Err(());
            }
        }
        if !self.enter_state() {
            return Ok(false);
        }
        if eliminate(self) {
            return Ok(true);
        }
        if introduce(self, complete)? {
            return Ok(true);
        }

        let mut branches: Vec<SProof> = Vec::new();

        let mut p = self.fork();
        if not_e_force(&mut p, complete)? && p.prove(complete)? {
            branches.push(p.proof);
            if !complete {
                return Ok(self.proof.commit_best_branch(branches));
            }
        }

        let mut p = self.fork();
        if imp_e_force(&mut p, complete)? && p.prove(complete)? {
            branches.push(p.proof);
            if !complete {
                return Ok(self.proof.commit_best_branch(branches));
            }
        }

        let mut p = self.fork();
        if iff_e_force(&mut p, complete)? && p.prove(complete)? {
            branches.push(p.proof);
            if !complete {
                return Ok(self.proof.commit_best_branch(branches));
            }
        }

        let mut p = self.fork();
        if or_e(&mut p, complete)? {
            branches.push(p.proof);
            if !complete {
                return Ok(self.proof.commit_best_branch(branches));
            }
        }

        let mut p = self.fork();
        if ip(&mut p, complete)? {
            branches.push(p.proof);
            if !complete {
                return Ok(self.proof.commit_best_branch(branches));
            }
        }

        Ok(self.proof.commit_best_branch(branches))
    }
}

/// The (assumption, conclusion) subproof already present in `seq`, if any —
/// reused instead of opening a fresh one for `¬I`/`→I`/`↔I`/`∨E`.
fn find_subproof<'a>(seq: &'a [SObj], assumption: &Formula, conclusion: &Formula) -> Option<&'a SProof> {
    seq.iter().find_map(|obj| match obj {
        SObj::Sub(sp) if sp.seq.len() > 1 => match (sp.seq.first(), sp.seq.last()) {
            (Some(SObj::Line(a)), Some(SObj::Line(b))) if a.formula == *assumption && b.formula == *conclusion => {
                Some(sp)
            }
            _ => None,
        },
        _ => None,
    })
}

/// Prove `goal` in a subproof assuming `assumption`, reusing a matching
/// subproof already in `base_seq` if one exists. Returns `(subproof, is_new)`
/// — `is_new` tells the caller whether to fold it into `proof.seq` or skip
/// it (it's already there).
fn prove_subproof_with_seen(
    ids: &Ids,
    deadline: Option<Instant>,
    options: SearchOptions,
    seen: Seen,
    base_seq: &[SObj],
    assumption: Formula,
    goal: Formula,
    complete: bool,
) -> Result<Option<(SProof, bool)>, ()> {
    if let Some(sp) = find_subproof(base_seq, &assumption, &goal) {
        return Ok(Some((sp.clone(), false)));
    }
    let assumption_id = mint(ids);
    let mut seq = base_seq.to_vec();
    let base_len = seq.len();
    seq.push(SObj::Line(SLine { id: assumption_id, formula: assumption, rule: Rule::As, citations: Vec::new() }));
    let sub = SProof::new(ids, seq, goal);
    let mut sub_prover = Prover { proof: sub, seen, deadline, ids: ids.clone(), options };
    if !sub_prover.prove(complete)? {
        return Ok(None);
    }
    let mut final_sp = sub_prover.proof;
    final_sp.seq = final_sp.seq[base_len..].to_vec();
    Ok(Some((final_sp, true)))
}

fn prove_subproof(
    prover: &Prover,
    base_seq: &[SObj],
    assumption: Formula,
    goal: Formula,
    complete: bool,
) -> Result<Option<(SProof, bool)>, ()> {
    prove_subproof_with_seen(
        &prover.ids,
        prover.deadline,
        prover.options,
        prover.seen.clone(),
        base_seq,
        assumption,
        goal,
        complete,
    )
}

// ---------------------------------------------------------------------
// Elimination: a saturating, non-branching sweep. Every member can only
// ever add a line, never fail a search, so it needs no `Result`.
// ---------------------------------------------------------------------

fn eliminate(prover: &mut Prover) -> bool {
    loop {
        if reiterate(prover) {
            return true;
        }
        if explosion(prover) {
            return true;
        }
        if not_e(prover) || and_e(prover) || imp_e(prover) || iff_e(prover) {
            continue;
        }
        return false;
    }
}

fn reiterate(prover: &mut Prover) -> bool {
    let goal = prover.proof.goal.clone();
    if let Some(SObj::Line(l)) = prover.proof.seq.last() {
        if l.formula == goal && !l.is_assumption() {
            return true;
        }
    }
    let cited = prover.proof.seq.iter().find_map(|o| match o {
        SObj::Line(l) if l.formula == goal => Some(l.id),
        _ => None,
    });
    match cited {
        Some(id) => {
            let nid = mint(&prover.ids);
            prover.proof.add(vec![SObj::Line(SLine { id: nid, formula: goal, rule: Rule::R, citations: vec![id] })]);
            true
        }
        None => false,
    }
}

fn explosion(prover: &mut Prover) -> bool {
    let goal = prover.proof.goal.clone();
    let cited = prover.proof.seq.iter().find_map(|o| match o {
        SObj::Line(l) if l.formula == Formula::Bot => Some(l.id),
        _ => None,
    });
    match cited {
        Some(id) => {
            let nid = mint(&prover.ids);
            prover.proof.add(vec![SObj::Line(SLine { id: nid, formula: goal, rule: Rule::X, citations: vec![id] })]);
            true
        }
        None => false,
    }
}

fn not_e(prover: &mut Prover) -> bool {
    let seq = prover.proof.seq.clone();
    for obj in &seq {
        if let SObj::Line(l) = obj {
            if let Formula::Not(inner) = &l.formula {
                if let Some(other_id) = seq.iter().find_map(|o| match o {
                    SObj::Line(l2) if l2.formula == **inner => Some(l2.id),
                    _ => None,
                }) {
                    let nid = mint(&prover.ids);
                    prover.proof.add(vec![SObj::Line(SLine {
                        id: nid,
                        formula: Formula::Bot,
                        rule: Rule::NotE,
                        citations: vec![l.id, other_id],
                    })]);
                    return true;
                }
            }
        }
    }
    false
}

fn and_e(prover: &mut Prover) -> bool {
    let seq = prover.proof.seq.clone();
    let formulas = prover.proof.formulas();
    for obj in &seq {
        if let SObj::Line(l) = obj {
            if let Formula::And(a, b) = &l.formula {
                for conjunct in [a.as_ref(), b.as_ref()] {
                    if !formulas.contains(conjunct) {
                        let nid = mint(&prover.ids);
                        prover.proof.add(vec![SObj::Line(SLine {
                            id: nid,
                            formula: conjunct.clone(),
                            rule: Rule::AndE,
                            citations: vec![l.id],
                        })]);
                        return true;
                    }
                }
            }
        }
    }
    false
}

fn imp_e(prover: &mut Prover) -> bool {
    let seq = prover.proof.seq.clone();
    let formulas = prover.proof.formulas();
    for obj in &seq {
        if let SObj::Line(l) = obj {
            if let Formula::Imp(a, b) = &l.formula {
                if formulas.contains(b.as_ref()) {
                    continue;
                }
                if let Some(other_id) = seq.iter().find_map(|o| match o {
                    SObj::Line(l2) if l2.formula == **a => Some(l2.id),
                    _ => None,
                }) {
                    let nid = mint(&prover.ids);
                    prover.proof.add(vec![SObj::Line(SLine {
                        id: nid,
                        formula: (**b).clone(),
                        rule: Rule::ImpE,
                        citations: vec![l.id, other_id],
                    })]);
                    return true;
                }
            }
        }
    }
    false
}

fn iff_e(prover: &mut Prover) -> bool {
    let seq = prover.proof.seq.clone();
    let formulas = prover.proof.formulas();
    for obj in &seq {
        if let SObj::Line(l) = obj {
            if let Formula::Iff(a, b) = &l.formula {
                for (side, other) in [(a.as_ref(), b.as_ref()), (b.as_ref(), a.as_ref())] {
                    if formulas.contains(other) {
                        continue;
                    }
                    if let Some(side_id) = seq.iter().find_map(|o| match o {
                        SObj::Line(l2) if l2.formula == *side => Some(l2.id),
                        _ => None,
                    }) {
                        let nid = mint(&prover.ids);
                        prover.proof.add(vec![SObj::Line(SLine {
                            id: nid,
                            formula: other.clone(),
                            rule: Rule::IffE,
                            citations: vec![l.id, side_id],
                        })]);
                        return true;
                    }
                }
            }
        }
    }
    false
}

// ---------------------------------------------------------------------
// Introduction: dispatched on the goal's principal connective.
// ---------------------------------------------------------------------

fn introduce(prover: &mut Prover, complete: bool) -> Result<bool, ()> {
    match prover.proof.goal.clone() {
        Formula::Not(_) => not_i(prover, complete),
        Formula::And(_, _) => and_i(prover, complete),
        Formula::Or(_, _) => or_i(prover, complete),
        Formula::Imp(_, _) => imp_i(prover, complete),
        Formula::Iff(_, _) => iff_i(prover, complete),
        _ => Ok(false),
    }
}

fn not_i(prover: &mut Prover, complete: bool) -> Result<bool, ()> {
    let goal = prover.proof.goal.clone();
    let inner = match &goal {
        Formula::Not(a) => (**a).clone(),
        _ => unreachable!(),
    };
    let base = prover.proof.seq.clone();
    match prove_subproof(prover, &base, inner, Formula::Bot, complete)? {
        None => Ok(false),
        Some((sp, is_new)) => {
            let nid = mint(&prover.ids);
            let mut objs = Vec::new();
            if is_new {
                objs.push(SObj::Sub(sp.clone()));
            }
            objs.push(SObj::Line(SLine { id: nid, formula: goal, rule: Rule::NotI, citations: vec![sp.id] }));
            prover.proof.add(objs);
            Ok(true)
        }
    }
}

fn imp_i(prover: &mut Prover, complete: bool) -> Result<bool, ()> {
    let goal = prover.proof.goal.clone();
    let (left, right) = match &goal {
        Formula::Imp(a, b) => ((**a).clone(), (**b).clone()),
        _ => unreachable!(),
    };
    let base = prover.proof.seq.clone();
    match prove_subproof(prover, &base, left, right, complete)? {
        None => Ok(false),
        Some((sp, is_new)) => {
            let nid = mint(&prover.ids);
            let mut objs = Vec::new();
            if is_new {
                objs.push(SObj::Sub(sp.clone()));
            }
            objs.push(SObj::Line(SLine { id: nid, formula: goal, rule: Rule::ImpI, citations: vec![sp.id] }));
            prover.proof.add(objs);
            Ok(true)
        }
    }
}

fn ip(prover: &mut Prover, complete: bool) -> Result<bool, ()> {
    let goal = prover.proof.goal.clone();
    if is_valid(&[goal.clone()], &Formula::Bot) {
        return Ok(false);
    }
    let base = prover.proof.seq.clone();
    match prove_subproof(prover, &base, goal.negate(), Formula::Bot, complete)? {
        None => Ok(false),
        Some((sp, is_new)) => {
            let nid = mint(&prover.ids);
            let mut objs = Vec::new();
            if is_new {
                objs.push(SObj::Sub(sp.clone()));
            }
            objs.push(SObj::Line(SLine { id: nid, formula: goal, rule: Rule::Ip, citations: vec![sp.id] }));
            prover.proof.add(objs);
            Ok(true)
        }
    }
}

fn and_i(prover: &mut Prover, complete: bool) -> Result<bool, ()> {
    let goal = prover.proof.goal.clone();
    let (left, right) = match &goal {
        Formula::And(a, b) => ((**a).clone(), (**b).clone()),
        _ => unreachable!(),
    };
    let mut branches = Vec::new();
    for (c1, c2) in [(left.clone(), right.clone()), (right, left)] {
        let branch1_init = SProof::new(&prover.ids, prover.proof.seq.clone(), c1);
        let mut p1 = Prover {
            proof: branch1_init,
            seen: prover.seen.clone(),
            deadline: prover.deadline,
            ids: prover.ids.clone(),
            options: prover.options,
        };
        if !p1.prove(complete)? {
            continue;
        }
        let mut branch1 = p1.proof;
        let c1_id = branch1.pop_reiteration();

        let branch2_init = SProof::new(&prover.ids, branch1.seq.clone(), c2);
        let mut p2 = Prover {
            proof: branch2_init,
            seen: prover.seen.clone(),
            deadline: prover.deadline,
            ids: prover.ids.clone(),
            options: prover.options,
        };
        if !p2.prove(complete)? {
            continue;
        }
        let mut branch2 = p2.proof;
        let c2_id = branch2.pop_reiteration();

        let nid = mint(&prover.ids);
        branch2.add(vec![SObj::Line(SLine { id: nid, formula: goal.clone(), rule: Rule::AndI, citations: vec![c1_id, c2_id] })]);
        branches.push(branch2);
        if !complete {
            break;
        }
    }
    Ok(prover.proof.commit_best_branch(branches))
}

fn or_i(prover: &mut Prover, complete: bool) -> Result<bool, ()> {
    let goal = prover.proof.goal.clone();
    let (left, right) = match &goal {
        Formula::Or(a, b) => ((**a).clone(), (**b).clone()),
        _ => unreachable!(),
    };
    if let Some(id) = prover.proof.seq.iter().find_map(|o| match o {
        SObj::Line(l) if l.formula == left || l.formula == right => Some(l.id),
        _ => None,
    }) {
        let nid = mint(&prover.ids);
        prover.proof.add(vec![SObj::Line(SLine { id: nid, formula: goal, rule: Rule::OrI, citations: vec![id] })]);
        return Ok(true);
    }
    let assumptions: Vec<Formula> = prover.proof.assumptions().into_iter().collect();
    let mut branches = Vec::new();
    for disjunct in [left, right] {
        if !is_valid(&assumptions, &disjunct) {
            continue;
        }
        let branch_init = SProof::new(&prover.ids, prover.proof.seq.clone(), disjunct);
        let mut p = Prover {
            proof: branch_init,
            seen: prover.seen.clone(),
            deadline: prover.deadline,
            ids: prover.ids.clone(),
            options: prover.options,
        };
        if !p.prove(complete)? {
            continue;
        }
        let mut branch = p.proof;
        let disjunct_id = branch.pop_reiteration();
        let nid = mint(&prover.ids);
        branch.add(vec![SObj::Line(SLine { id: nid, formula: goal.clone(), rule: Rule::OrI, citations: vec![disjunct_id] })]);
        branches.push(branch);
        if !complete {
            break;
        }
    }
    Ok(prover.proof.commit_best_branch(branches))
}

fn iff_i(prover: &mut Prover, complete: bool) -> Result<bool, ()> {
    let goal = prover.proof.goal.clone();
    let (left, right) = match &goal {
        Formula::Iff(a, b) => ((**a).clone(), (**b).clone()),
        _ => unreachable!(),
    };

    let base1 = prover.proof.seq.clone();
    let (sp1, is_new1) = match prove_subproof(prover, &base1, left.clone(), right.clone(), complete)? {
        Some(x) => x,
        None => return Ok(false),
    };

    let mut base2 = base1;
    if is_new1 {
        base2.push(SObj::Sub(sp1.clone()));
    }
    let (sp2, is_new2) = match prove_subproof(prover, &base2, right, left, complete)? {
        Some(x) => x,
        None => return Ok(false),
    };

    let nid = mint(&prover.ids);
    let mut objs = Vec::new();
    if is_new1 {
        objs.push(SObj::Sub(sp1.clone()));
    }
    if is_new2 {
        objs.push(SObj::Sub(sp2.clone()));
    }
    objs.push(SObj::Line(SLine { id: nid, formula: goal, rule: Rule::IffI, citations: vec![sp1.id, sp2.id] }));
    prover.proof.add(objs);
    Ok(true)
}

// ---------------------------------------------------------------------
// SAT-guided forcing strategies, tried only once elimination and
// introduction are both stuck.
// ---------------------------------------------------------------------

fn not_e_force(prover: &mut Prover, complete: bool) -> Result<bool, ()> {
    let assumptions: Vec<Formula> = prover.proof.assumptions().into_iter().collect();
    if !is_valid(&assumptions, &Formula::Bot) {
        return Ok(false);
    }
    let seq0 = prover.proof.seq.clone();
    let mut branches = Vec::new();
    for obj in &seq0 {
        if let SObj::Line(l) = obj {
            if let Formula::Not(inner) = &l.formula {
                let branch_init = SProof::new(&prover.ids, seq0.clone(), (**inner).clone());
                let mut p = Prover {
                    proof: branch_init,
                    seen: prover.seen.clone(),
                    deadline: prover.deadline,
                    ids: prover.ids.clone(),
                    options: prover.options,
                };
                if !p.prove(complete)? {
                    continue;
                }
                let mut branch = p.proof;
                branch.pop_reiteration();
                if branch.seq != seq0 {
                    branches.push(branch);
                    if !complete {
                        break;
                    }
                }
            }
        }
    }
    Ok(prover.proof.commit_best_branch(branches))
}

fn imp_e_force(prover: &mut Prover, complete: bool) -> Result<bool, ()> {
    let seq0 = prover.proof.seq.clone();
    let formulas = prover.proof.formulas();
    let assumptions: Vec<Formula> = prover.proof.assumptions().into_iter().collect();
    for obj in &seq0 {
        if let SObj::Line(l) = obj {
            if let Formula::Imp(a, b) = &l.formula {
                if formulas.contains(b.as_ref()) {
                    continue;
                }
                if !is_valid(&assumptions, a) {
                    continue;
                }
                let branch_init = SProof::new(&prover.ids, seq0.clone(), (**a).clone());
                let mut p = Prover {
                    proof: branch_init,
                    seen: prover.seen.clone(),
                    deadline: prover.deadline,
                    ids: prover.ids.clone(),
                    options: prover.options,
                };
                if p.prove(complete)? {
                    let mut branch = p.proof;
                    branch.pop_reiteration();
                    if branch.seq != seq0 {
                        prover.proof.seq = branch.seq;
                        return Ok(true);
                    }
                }
            }
        }
    }
    Ok(false)
}

fn iff_e_force(prover: &mut Prover, complete: bool) -> Result<bool, ()> {
    let seq0 = prover.proof.seq.clone();
    let formulas = prover.proof.formulas();
    let assumptions: Vec<Formula> = prover.proof.assumptions().into_iter().collect();
    for obj in &seq0 {
        if let SObj::Line(l) = obj {
            if let Formula::Iff(a, b) = &l.formula {
                if formulas.contains(a.as_ref()) || formulas.contains(b.as_ref()) {
                    continue;
                }
                if !is_valid(&assumptions, a) {
                    continue;
                }
                let mut branches = Vec::new();
                for (i, side) in [(**a).clone(), (**b).clone()].into_iter().enumerate() {
                    let seen = if i == 0 { prover.seen.clone() } else { prover.forked_seen() };
                    let branch_init = SProof::new(&prover.ids, seq0.clone(), side);
                    let mut p = Prover {
                        proof: branch_init,
                        seen,
                        deadline: prover.deadline,
                        ids: prover.ids.clone(),
                        options: prover.options,
                    };
                    if !p.prove(complete)? {
                        continue;
                    }
                    let mut branch = p.proof;
                    branch.pop_reiteration();
                    if branch.seq != seq0 {
                        branches.push(branch);
                        if !complete {
                            break;
                        }
                    }
                }
                if prover.proof.commit_best_branch(branches) {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

fn or_e(prover: &mut Prover, complete: bool) -> Result<bool, ()> {
    let goal = prover.proof.goal.clone();
    let seq0 = prover.proof.seq.clone();
    let mut branches = Vec::new();
    for obj in &seq0 {
        if let SObj::Line(l) = obj {
            if let Formula::Or(a, b) = &l.formula {
                let mut objs = Vec::new();

                let r1 = prove_subproof_with_seen(
                    &prover.ids,
                    prover.deadline,
                    prover.options,
                    prover.seen.clone(),
                    &seq0,
                    (**a).clone(),
                    goal.clone(),
                    complete,
                )?;
                let (sp1, is_new1) = match r1 {
                    Some(x) => x,
                    None => continue,
                };
                if is_new1 {
                    objs.push(SObj::Sub(sp1.clone()));
                }

                let mut seq1 = seq0.clone();
                seq1.extend(objs.iter().cloned());
                let r2 = prove_subproof_with_seen(
                    &prover.ids,
                    prover.deadline,
                    prover.options,
                    prover.forked_seen(),
                    &seq1,
                    (**b).clone(),
                    goal.clone(),
                    complete,
                )?;
                let (sp2, is_new2) = match r2 {
                    Some(x) => x,
                    None => continue,
                };
                if is_new2 {
                    objs.push(SObj::Sub(sp2.clone()));
                }

                let nid = mint(&prover.ids);
                objs.push(SObj::Line(SLine {
                    id: nid,
                    formula: goal.clone(),
                    rule: Rule::OrE,
                    citations: vec![l.id, sp1.id, sp2.id],
                }));

                let mut full_seq = seq0.clone();
                full_seq.extend(objs);
                branches.push(SProof::new(&prover.ids, full_seq, goal.clone()));
                if !complete {
                    break;
                }
            }
        }
    }
    Ok(prover.proof.commit_best_branch(branches))
}

// ---------------------------------------------------------------------
// Post-processing: drop uncited lines, collapse pure reiterations, and
// translate the flat search result into a real, nested `Problem`.
// ---------------------------------------------------------------------

fn process(proof: &mut SProof, ids: &Ids) {
    remove_uncited(proof);
    let id_to_obj = id_to_obj(&proof.seq);
    let id_to_citers = id_to_citers(&proof.seq);
    let mut replace = HashMap::new();
    replace_reiterations(proof, &id_to_obj, &id_to_citers, &mut replace, ids);
}

fn id_to_citers(seq: &[SObj]) -> HashMap<u64, HashSet<u64>> {
    let mut out = HashMap::new();
    collect_citers(seq, &mut out);
    out
}

fn collect_citers(seq: &[SObj], out: &mut HashMap<u64, HashSet<u64>>) {
    for obj in seq {
        match obj {
            SObj::Line(l) => {
                out.entry(l.id).or_default();
                for c in &l.citations {
                    out.entry(*c).or_default().insert(l.id);
                }
            }
            SObj::Sub(sp) => {
                out.entry(sp.id).or_default();
                collect_citers(&sp.seq, out);
            }
        }
    }
}

fn id_to_obj(seq: &[SObj]) -> HashMap<u64, SLine> {
    let mut out = HashMap::new();
    collect_obj(seq, &mut out);
    out
}

fn collect_obj(seq: &[SObj], out: &mut HashMap<u64, SLine>) {
    for obj in seq {
        match obj {
            SObj::Line(l) => {
                out.insert(l.id, l.clone());
            }
            SObj::Sub(sp) => collect_obj(&sp.seq, out),
        }
    }
}

/// Fixpoint: repeatedly drop any non-assumption, non-final line with no
/// citer, since dropping one can make a line that cited only it uncited too.
fn remove_uncited(proof: &mut SProof) {
    loop {
        let citers = id_to_citers(&proof.seq);
        let n = proof.seq.len();
        let mut kept = Vec::with_capacity(n);
        for (idx, obj) in proof.seq.iter().enumerate() {
            match obj {
                SObj::Sub(sp) => {
                    let mut sp = sp.clone();
                    remove_uncited(&mut sp);
                    kept.push(SObj::Sub(sp));
                }
                SObj::Line(l) => {
                    let cited = citers.get(&l.id).map_or(false, |s| !s.is_empty());
                    if l.is_assumption() || idx == n - 1 || cited {
                        kept.push(SObj::Line(l.clone()));
                    }
                }
            }
        }
        let changed = kept.len() != n;
        proof.seq = kept;
        if !changed {
            break;
        }
    }
}

/// Fold a reiteration's citer(s) back to a direct copy of the original line
/// whenever *every* citer of a line is a plain `R` of it — the indirection
/// is then pointless, so the original is dropped and each `R` site becomes
/// its own copy of the line it was reiterating.
fn replace_reiterations(
    proof: &mut SProof,
    id_to_obj: &HashMap<u64, SLine>,
    id_to_citers: &HashMap<u64, HashSet<u64>>,
    replace: &mut HashMap<u64, SLine>,
    ids: &Ids,
) {
    let n = proof.seq.len();
    let mut seq = Vec::with_capacity(n);
    for (idx, obj) in proof.seq.iter().enumerate() {
        match obj {
            SObj::Sub(sp) => {
                let mut sp = sp.clone();
                replace_reiterations(&mut sp, id_to_obj, id_to_citers, replace, ids);
                seq.push(SObj::Sub(sp));
            }
            SObj::Line(l) => {
                if let Some(orig) = replace.get(&l.id) {
                    let mut copy = orig.clone();
                    copy.id = mint(ids);
                    seq.push(SObj::Line(copy));
                    continue;
                }
                if l.is_assumption() || idx == n - 1 {
                    seq.push(SObj::Line(l.clone()));
                    continue;
                }
                let citers = id_to_citers.get(&l.id).cloned().unwrap_or_default();
                let all_reiterations =
                    citers.iter().all(|c| id_to_obj.get(c).map_or(false, |o| o.rule == Rule::R));
                if !all_reiterations {
                    seq.push(SObj::Line(l.clone()));
                    continue;
                }
                for c in &citers {
                    replace.insert(*c, l.clone());
                }
            }
        }
    }
    proof.seq = seq;
}

/// Translate a processed search tree into real `ProofObject`s, minting
/// fresh `Problem` ids and recording each search id's new id/kind so later
/// citations (which reference search ids) resolve correctly.
fn translate(
    problem: &mut Problem,
    seq: &[SObj],
    id_to_new: &mut HashMap<u64, ObjectId>,
    id_kind: &mut HashMap<u64, AccessKind>,
) -> Vec<ProofObject> {
    let mut out = Vec::with_capacity(seq.len());
    for obj in seq {
        match obj {
            SObj::Line(l) => {
                let citations = l
                    .citations
                    .iter()
                    .map(|old| match id_kind[old] {
                        AccessKind::Line => Citation::Line(id_to_new[old]),
                        AccessKind::Subproof => Citation::Subproof(id_to_new[old]),
                    })
                    .collect();
                let new_id = problem.mint_id();
                id_to_new.insert(l.id, new_id);
                id_kind.insert(l.id, AccessKind::Line);
                out.push(ProofObject::Line(Line {
                    id: new_id,
                    formula: l.formula.clone(),
                    justification: Justification::new(l.rule, citations),
                }));
            }
            SObj::Sub(sp) => {
                let inner = translate(problem, &sp.seq, id_to_new, id_kind);
                let new_id = problem.mint_id();
                id_to_new.insert(sp.id, new_id);
                id_kind.insert(sp.id, AccessKind::Subproof);
                out.push(ProofObject::Subproof(Subproof { id: new_id, sequence: inner }));
            }
        }
    }
    out
}

fn build_problem(premises: Vec<Formula>, conclusion: Formula, final_seq: Vec<SObj>, premise_count: usize) -> Problem {
    let mut problem = Problem::new(Logic::Tfl, premises, conclusion);
    let mut id_to_new = HashMap::new();
    let mut id_kind = HashMap::new();
    for (i, obj) in final_seq.iter().take(premise_count).enumerate() {
        if let SObj::Line(l) = obj {
            id_to_new.insert(l.id, problem.proof.context[i].id);
            id_kind.insert(l.id, AccessKind::Line);
        }
    }
    let derived = &final_seq[premise_count..];
    let translated = translate(&mut problem, derived, &mut id_to_new, &mut id_kind);
    problem.proof.seq = translated;
    problem
}

/// Search for a natural-deduction proof of `conclusion` from `premises` in
/// TFL, within `timeout`. Checks validity with the propositional oracle
/// first (§4.1's cheap veto): an invalid argument is reported with a
/// countermodel instead of spending the search budget on it.
///
/// The search itself runs in two phases (§4.5): a time-bounded, exhaustive
/// `complete` pass that keeps the cheapest proof it finds, and — only if
/// that pass times out — an unbounded fallback pass that commits to the
/// first proof found at all, since the argument is already known valid.
pub fn prove(premises: Vec<Formula>, conclusion: Formula, timeout: Duration) -> Result<Problem, ProverError> {
    prove_with_options(premises, conclusion, timeout, SearchOptions::default())
}

pub fn prove_with_options(
    premises: Vec<Formula>,
    conclusion: Formula,
    timeout: Duration,
    options: SearchOptions,
) -> Result<Problem, ProverError> {
    if let Some(model) = countermodel(&premises, &conclusion) {
        let mut lines: Vec<String> = model.iter().map(|(k, v)| format!("{} : {}", k, v)).collect();
        lines.sort();
        return Err(ProverError::new(format!("Invalid argument. Countermodel:\n\n{}", lines.join("\n"))));
    }

    let ids: Ids = Rc::new(RefCell::new(0));
    let premise_seq: Vec<SObj> = premises
        .iter()
        .cloned()
        .map(|formula| SObj::Line(SLine { id: mint(&ids), formula, rule: Rule::Pr, citations: Vec::new() }))
        .collect();
    let premise_count = premise_seq.len();

    let sproof = SProof::new(&ids, premise_seq.clone(), conclusion.clone());
    let mut prover = Prover {
        proof: sproof,
        seen: Rc::new(RefCell::new(HashMap::new())),
        deadline: Some(Instant::now() + timeout),
        ids: ids.clone(),
        options,
    };

    let mut final_proof = if matches!(prover.prove(true), Ok(true)) {
        prover.proof
    } else {
        let sproof2 = SProof::new(&ids, premise_seq, conclusion.clone());
        let mut prover2 = Prover {
            proof: sproof2,
            seen: Rc::new(RefCell::new(HashMap::new())),
            deadline: None,
            ids: ids.clone(),
            options,
        };
        match prover2.prove(false) {
            Ok(true) => prover2.proof,
            _ => return Err(ProverError::new("Argument is valid, but no proof was found.")),
        }
    };

    process(&mut final_proof, &ids);
    Ok(build_problem(premises, conclusion, final_proof.seq, premise_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn atom(s: &str) -> Formula {
        Formula::atom(s)
    }

    fn timeout() -> Duration {
        Duration::from_secs(3)
    }

    #[test]
    fn modus_ponens_is_proved() {
        let p = atom("P");
        let q = atom("Q");
        let premises = vec![p.clone(), Formula::imp(p, q.clone())];
        let problem = prove(premises, q, timeout()).expect("modus ponens is provable");
        assert!(problem.is_complete());
    }

    #[test]
    fn conjunction_introduction_is_proved() {
        let p = atom("P");
        let q = atom("Q");
        let premises = vec![p.clone(), q.clone()];
        let problem = prove(premises, Formula::and(p, q), timeout()).expect("conjunction holds");
        assert!(problem.is_complete());
    }

    #[test]
    fn law_of_excluded_middle_needs_indirect_proof() {
        let p = atom("P");
        let goal = Formula::or(p.clone(), Formula::not(p));
        let problem = prove(Vec::new(), goal, timeout()).expect("excluded middle is a TFL theorem");
        assert!(problem.is_complete());
    }

    #[test]
    fn disjunction_elimination_is_proved() {
        let p = atom("P");
        let q = atom("Q");
        let r = atom("R");
        let premises = vec![
            Formula::or(p.clone(), q.clone()),
            Formula::imp(p, r.clone()),
            Formula::imp(q, r.clone()),
        ];
        let problem = prove(premises, r, timeout()).expect("disjunction elimination holds");
        assert!(problem.is_complete());
    }

    #[test]
    fn invalid_argument_reports_a_countermodel() {
        let p = atom("P");
        let q = atom("Q");
        let err = prove(vec![q], p, timeout()).unwrap_err();
        assert!(err.message.contains("Countermodel"));
    }

    #[test]
    fn biconditional_introduction_is_proved() {
        let p = atom("P");
        let q = atom("Q");
        let premises = vec![Formula::imp(p.clone(), q.clone()), Formula::imp(q.clone(), p.clone())];
        let problem = prove(premises, Formula::iff(p, q), timeout()).expect("biconditional holds");
        assert!(problem.is_complete());
    }
}

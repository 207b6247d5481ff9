//! Formulas and terms as value types, plus one-way pattern/concrete unification.
//!
//! A `Formula::Meta` / `Term::Meta` is a schematic hole used only inside rule
//! schemas (see `crate::models::rule`) — it never appears in a formula typed
//! or parsed from user input. Unification binds metavariables into a
//! `Subst`, tracking only the bindings made during the current top-level
//! call so a failed unification leaves the substitution exactly as it found
//! it (see `Formula::unify`/`Term::unify`).

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

pub type MetaId = u32;

/// A term: a function application (0-ary = constant), a variable, or a
/// schematic hole standing for either.
#[derive(Clone)]
pub enum Term {
    Func(String, Vec<Term>),
    Var(String),
    Meta(TermMeta),
}

#[derive(Clone)]
pub struct TermMeta {
    pub id: MetaId,
    pub domain: Option<Rc<dyn Fn(&Term) -> bool>>,
}

impl Term {
    pub fn constant(name: impl Into<String>) -> Term {
        Term::Func(name.into(), Vec::new())
    }

    pub fn var(name: impl Into<String>) -> Term {
        Term::Var(name.into())
    }

    pub fn meta(id: MetaId) -> Term {
        Term::Meta(TermMeta { id, domain: None })
    }

    pub fn meta_with_domain(id: MetaId, domain: Rc<dyn Fn(&Term) -> bool>) -> Term {
        Term::Meta(TermMeta { id, domain: Some(domain) })
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Term::Func(_, args) if args.is_empty())
    }

    /// One-way unification: `pattern` may contain metavariables, `concrete`
    /// must not. Bindings made while exploring a failed branch are rolled
    /// back; bindings already committed by a prior, successful top-level
    /// call are untouched.
    pub fn unify(pattern: &Term, concrete: &Term, subst: &mut Subst) -> bool {
        let mut trail = Vec::new();
        if unify_term(pattern, concrete, subst, &mut trail) {
            true
        } else {
            for id in trail {
                subst.terms.remove(&id);
            }
            false
        }
    }
}

fn unify_term(pattern: &Term, concrete: &Term, subst: &mut Subst, trail: &mut Vec<MetaId>) -> bool {
    match pattern {
        Term::Meta(m) => {
            if let Some(bound) = subst.terms.get(&m.id).cloned() {
                return unify_term(&bound, concrete, subst, trail);
            }
            if let Some(domain) = &m.domain {
                if !domain(concrete) {
                    return false;
                }
            }
            subst.terms.insert(m.id, concrete.clone());
            trail.push(m.id);
            true
        }
        Term::Func(n1, a1) => match concrete {
            Term::Func(n2, a2) if n1 == n2 && a1.len() == a2.len() => {
                a1.iter().zip(a2.iter()).all(|(x, y)| unify_term(x, y, subst, trail))
            }
            _ => false,
        },
        Term::Var(n1) => matches!(concrete, Term::Var(n2) if n1 == n2),
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Func(n1, a1), Term::Func(n2, a2)) => n1 == n2 && a1 == a2,
            (Term::Var(n1), Term::Var(n2)) => n1 == n2,
            (Term::Meta(m1), Term::Meta(m2)) => m1.id == m2.id,
            _ => false,
        }
    }
}

impl Eq for Term {}

impl std::hash::Hash for Term {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Term::Func(n, a) => {
                0u8.hash(state);
                n.hash(state);
                a.hash(state);
            }
            Term::Var(n) => {
                1u8.hash(state);
                n.hash(state);
            }
            Term::Meta(m) => {
                2u8.hash(state);
                m.id.hash(state);
            }
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Func(name, args) => {
                if args.is_empty() {
                    write!(f, "{}", name)
                } else {
                    let rendered: Vec<String> = args.iter().map(|t| t.to_string()).collect();
                    write!(f, "{}({})", name, rendered.join(", "))
                }
            }
            Term::Var(name) => write!(f, "{}", name),
            Term::Meta(m) => write!(f, "?t{}", m.id),
        }
    }
}

/// A substitution built up by unification. Callers share one `Subst` across
/// a sequence of `unify` calls for the citations of a single rule
/// application, and a failed call only undoes the bindings it made.
#[derive(Default, Clone, Debug)]
pub struct Subst {
    formulas: std::collections::HashMap<MetaId, Formula>,
    terms: std::collections::HashMap<MetaId, Term>,
}

impl Subst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn formula_value(&self, id: MetaId) -> Option<&Formula> {
        self.formulas.get(&id)
    }

    pub fn term_value(&self, id: MetaId) -> Option<&Term> {
        self.terms.get(&id)
    }
}

/// A formula. `Meta` is a schematic hole (see module docs); `BoxMarker` is
/// the distinguished assumption formula that opens an "arbitrary individual
/// / arbitrary accessible world" subproof — carrying the freshly introduced
/// constant for `ForallI`/`ExistsE`, or nothing for the modal `BoxI`/`DiaE`
/// world-shift. Neither variant is well-formed under any `Logic`.
#[derive(Clone)]
pub enum Formula {
    Bot,
    Pred(String, Vec<Term>),
    Eq(Term, Term),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Imp(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
    Forall(String, Box<Formula>),
    Exists(String, Box<Formula>),
    BoxF(Box<Formula>),
    Dia(Box<Formula>),
    Meta(FormulaMeta),
    BoxMarker(Option<Term>),
}

#[derive(Clone)]
pub struct FormulaMeta {
    pub id: MetaId,
    pub domain: Option<Rc<dyn Fn(&Formula) -> bool>>,
}

impl Formula {
    pub fn meta(id: MetaId) -> Formula {
        Formula::Meta(FormulaMeta { id, domain: None })
    }

    pub fn meta_with_domain(id: MetaId, domain: Rc<dyn Fn(&Formula) -> bool>) -> Formula {
        Formula::Meta(FormulaMeta { id, domain: Some(domain) })
    }

    pub fn atom(name: impl Into<String>) -> Formula {
        Formula::Pred(name.into(), Vec::new())
    }

    pub fn not(a: Formula) -> Formula {
        Formula::Not(Box::new(a))
    }

    pub fn and(a: Formula, b: Formula) -> Formula {
        Formula::And(Box::new(a), Box::new(b))
    }

    pub fn or(a: Formula, b: Formula) -> Formula {
        Formula::Or(Box::new(a), Box::new(b))
    }

    pub fn imp(a: Formula, b: Formula) -> Formula {
        Formula::Imp(Box::new(a), Box::new(b))
    }

    pub fn iff(a: Formula, b: Formula) -> Formula {
        Formula::Iff(Box::new(a), Box::new(b))
    }

    pub fn is_negation(&self) -> bool {
        matches!(self, Formula::Not(_))
    }

    pub fn negate(&self) -> Formula {
        Formula::not(self.clone())
    }

    /// One-way unification: `pattern` may contain metavariables, `concrete`
    /// must not. See the module docs and `Term::unify` for the rollback
    /// discipline.
    pub fn unify(pattern: &Formula, concrete: &Formula, subst: &mut Subst) -> bool {
        let mut tf = Vec::new();
        let mut tt = Vec::new();
        if unify_formula(pattern, concrete, subst, &mut tf, &mut tt) {
            true
        } else {
            for id in tf {
                subst.formulas.remove(&id);
            }
            for id in tt {
                subst.terms.remove(&id);
            }
            false
        }
    }
}

fn unify_formula(
    pattern: &Formula,
    concrete: &Formula,
    subst: &mut Subst,
    tf: &mut Vec<MetaId>,
    tt: &mut Vec<MetaId>,
) -> bool {
    match pattern {
        Formula::Meta(m) => {
            if let Some(bound) = subst.formulas.get(&m.id).cloned() {
                return unify_formula(&bound, concrete, subst, tf, tt);
            }
            if let Some(domain) = &m.domain {
                if !domain(concrete) {
                    return false;
                }
            }
            subst.formulas.insert(m.id, concrete.clone());
            tf.push(m.id);
            true
        }
        Formula::Bot => matches!(concrete, Formula::Bot),
        Formula::BoxMarker(t1) => matches!(concrete, Formula::BoxMarker(t2) if t1 == t2),
        Formula::Pred(n1, a1) => match concrete {
            Formula::Pred(n2, a2) if n1 == n2 && a1.len() == a2.len() => {
                a1.iter().zip(a2.iter()).all(|(x, y)| unify_term(x, y, subst, tt))
            }
            _ => false,
        },
        Formula::Eq(l1, r1) => match concrete {
            Formula::Eq(l2, r2) => unify_term(l1, l2, subst, tt) && unify_term(r1, r2, subst, tt),
            _ => false,
        },
        Formula::Not(a) => match concrete {
            Formula::Not(b) => unify_formula(a, b, subst, tf, tt),
            _ => false,
        },
        Formula::And(a1, b1) => match concrete {
            Formula::And(a2, b2) => {
                unify_formula(a1, a2, subst, tf, tt) && unify_formula(b1, b2, subst, tf, tt)
            }
            _ => false,
        },
        Formula::Or(a1, b1) => match concrete {
            Formula::Or(a2, b2) => {
                unify_formula(a1, a2, subst, tf, tt) && unify_formula(b1, b2, subst, tf, tt)
            }
            _ => false,
        },
        Formula::Imp(a1, b1) => match concrete {
            Formula::Imp(a2, b2) => {
                unify_formula(a1, a2, subst, tf, tt) && unify_formula(b1, b2, subst, tf, tt)
            }
            _ => false,
        },
        Formula::Iff(a1, b1) => match concrete {
            Formula::Iff(a2, b2) => {
                unify_formula(a1, a2, subst, tf, tt) && unify_formula(b1, b2, subst, tf, tt)
            }
            _ => false,
        },
        Formula::Forall(v1, a1) => match concrete {
            Formula::Forall(v2, a2) if v1 == v2 => unify_formula(a1, a2, subst, tf, tt),
            _ => false,
        },
        Formula::Exists(v1, a1) => match concrete {
            Formula::Exists(v2, a2) if v1 == v2 => unify_formula(a1, a2, subst, tf, tt),
            _ => false,
        },
        Formula::BoxF(a) => match concrete {
            Formula::BoxF(b) => unify_formula(a, b, subst, tf, tt),
            _ => false,
        },
        Formula::Dia(a) => match concrete {
            Formula::Dia(b) => unify_formula(a, b, subst, tf, tt),
            _ => false,
        },
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Formula) -> bool {
        match (self, other) {
            (Formula::Bot, Formula::Bot) => true,
            (Formula::BoxMarker(a), Formula::BoxMarker(b)) => a == b,
            (Formula::Pred(n1, a1), Formula::Pred(n2, a2)) => n1 == n2 && a1 == a2,
            (Formula::Eq(l1, r1), Formula::Eq(l2, r2)) => l1 == l2 && r1 == r2,
            (Formula::Not(a), Formula::Not(b)) => a == b,
            (Formula::And(a1, b1), Formula::And(a2, b2)) => a1 == a2 && b1 == b2,
            (Formula::Or(a1, b1), Formula::Or(a2, b2)) => a1 == a2 && b1 == b2,
            (Formula::Imp(a1, b1), Formula::Imp(a2, b2)) => a1 == a2 && b1 == b2,
            (Formula::Iff(a1, b1), Formula::Iff(a2, b2)) => a1 == a2 && b1 == b2,
            (Formula::Forall(v1, a1), Formula::Forall(v2, a2)) => v1 == v2 && a1 == a2,
            (Formula::Exists(v1, a1), Formula::Exists(v2, a2)) => v1 == v2 && a1 == a2,
            (Formula::BoxF(a), Formula::BoxF(b)) => a == b,
            (Formula::Dia(a), Formula::Dia(b)) => a == b,
            (Formula::Meta(m1), Formula::Meta(m2)) => m1.id == m2.id,
            _ => false,
        }
    }
}

impl Eq for Formula {}

impl std::hash::Hash for Formula {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Formula::Bot => 0u8.hash(state),
            Formula::Pred(n, a) => {
                1u8.hash(state);
                n.hash(state);
                a.hash(state);
            }
            Formula::Eq(l, r) => {
                2u8.hash(state);
                l.hash(state);
                r.hash(state);
            }
            Formula::Not(a) => {
                3u8.hash(state);
                a.hash(state);
            }
            Formula::And(a, b) => {
                4u8.hash(state);
                a.hash(state);
                b.hash(state);
            }
            Formula::Or(a, b) => {
                5u8.hash(state);
                a.hash(state);
                b.hash(state);
            }
            Formula::Imp(a, b) => {
                6u8.hash(state);
                a.hash(state);
                b.hash(state);
            }
            Formula::Iff(a, b) => {
                7u8.hash(state);
                a.hash(state);
                b.hash(state);
            }
            Formula::Forall(v, a) => {
                8u8.hash(state);
                v.hash(state);
                a.hash(state);
            }
            Formula::Exists(v, a) => {
                9u8.hash(state);
                v.hash(state);
                a.hash(state);
            }
            Formula::BoxF(a) => {
                10u8.hash(state);
                a.hash(state);
            }
            Formula::Dia(a) => {
                11u8.hash(state);
                a.hash(state);
            }
            Formula::Meta(m) => {
                12u8.hash(state);
                m.id.hash(state);
            }
            Formula::BoxMarker(t) => {
                13u8.hash(state);
                t.hash(state);
            }
        }
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Ordered by display string — gives formulas a total, deterministic order
/// for use as `BTreeSet`/`BTreeMap` keys (the prover's memoization tables)
/// without needing to walk the tree structurally.
impl PartialOrd for Formula {
    fn partial_cmp(&self, other: &Formula) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Formula {
    fn cmp(&self, other: &Formula) -> std::cmp::Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl Formula {
    fn str_inner(&self) -> String {
        match self {
            Formula::Bot => "⊥".to_string(),
            Formula::BoxMarker(Some(c)) => format!("☐[{}]", c),
            Formula::BoxMarker(None) => "☐".to_string(),
            Formula::Pred(name, args) => {
                if args.is_empty() {
                    name.clone()
                } else {
                    let rendered: Vec<String> = args.iter().map(|t| t.to_string()).collect();
                    format!("{}({})", name, rendered.join(", "))
                }
            }
            Formula::Eq(l, r) => format!("{} = {}", l, r),
            Formula::Not(a) => format!("¬{}", a.str_inner()),
            Formula::And(a, b) => format!("({} ∧ {})", a.str_inner(), b.str_inner()),
            Formula::Or(a, b) => format!("({} ∨ {})", a.str_inner(), b.str_inner()),
            Formula::Imp(a, b) => format!("({} → {})", a.str_inner(), b.str_inner()),
            Formula::Iff(a, b) => format!("({} ↔ {})", a.str_inner(), b.str_inner()),
            Formula::Forall(v, a) => format!("∀{} {}", v, a.str_inner()),
            Formula::Exists(v, a) => format!("∃{} {}", v, a.str_inner()),
            Formula::BoxF(a) => format!("☐{}", a.str_inner()),
            Formula::Dia(a) => format!("◇{}", a.str_inner()),
            Formula::Meta(m) => format!("?m{}", m.id),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.str_inner();
        if s.starts_with('(') && s.ends_with(')') {
            write!(f, "{}", &s[1..s.len() - 1])
        } else {
            write!(f, "{}", s)
        }
    }
}

/// All atomic terms (0-ary functions and variables) occurring in `formula`.
/// When `free` is true, only the free occurrences are kept (bound variables
/// are stripped as `Forall`/`Exists` scopes close over them).
pub fn atomic_terms(formula: &Formula, free: bool) -> HashSet<Term> {
    let mut acc = HashSet::new();
    collect_atomic_terms(formula, free, &mut acc);
    acc
}

fn collect_atomic_terms(formula: &Formula, free: bool, acc: &mut HashSet<Term>) {
    match formula {
        Formula::Bot | Formula::Meta(_) | Formula::BoxMarker(_) => {}
        Formula::Not(a) | Formula::BoxF(a) | Formula::Dia(a) => collect_atomic_terms(a, free, acc),
        Formula::And(a, b) | Formula::Or(a, b) | Formula::Imp(a, b) | Formula::Iff(a, b) => {
            collect_atomic_terms(a, free, acc);
            collect_atomic_terms(b, free, acc);
        }
        Formula::Eq(l, r) => {
            collect_atomic_terms_term(l, acc);
            collect_atomic_terms_term(r, acc);
        }
        Formula::Pred(_, args) => {
            for t in args {
                collect_atomic_terms_term(t, acc);
            }
        }
        Formula::Forall(v, a) | Formula::Exists(v, a) => {
            let mut inner = HashSet::new();
            collect_atomic_terms(a, free, &mut inner);
            if free {
                inner.remove(&Term::var(v.clone()));
            }
            acc.extend(inner);
        }
    }
}

fn collect_atomic_terms_term(term: &Term, acc: &mut HashSet<Term>) {
    match term {
        Term::Func(_, args) => {
            if args.is_empty() {
                acc.insert(term.clone());
            } else {
                for t in args {
                    collect_atomic_terms_term(t, acc);
                }
            }
        }
        Term::Var(_) => {
            acc.insert(term.clone());
        }
        Term::Meta(_) => {}
    }
}

pub fn constants(formula: &Formula) -> HashSet<Term> {
    atomic_terms(formula, false).into_iter().filter(Term::is_constant).collect()
}

pub fn free_vars(formula: &Formula) -> HashSet<Term> {
    atomic_terms(formula, true).into_iter().filter(Term::is_var).collect()
}

/// Replace every occurrence of `target` in `formula` with a term minted by
/// `gen` (called once per surviving occurrence), skipping any occurrence a
/// `Forall`/`Exists` has bound over, and any occurrence `ignore` rejects.
pub fn sub_term(
    formula: &Formula,
    target: &Term,
    gen: &mut dyn FnMut() -> Term,
    ignore: &dyn Fn(&Term) -> bool,
) -> Formula {
    match formula {
        Formula::Bot | Formula::Meta(_) | Formula::BoxMarker(_) => formula.clone(),
        Formula::Pred(name, args) => Formula::Pred(
            name.clone(),
            args.iter().map(|t| sub_term_term(t, target, gen, ignore)).collect(),
        ),
        Formula::Eq(l, r) => Formula::Eq(
            sub_term_term(l, target, gen, ignore),
            sub_term_term(r, target, gen, ignore),
        ),
        Formula::Not(a) => Formula::Not(Box::new(sub_term(a, target, gen, ignore))),
        Formula::And(a, b) => Formula::And(
            Box::new(sub_term(a, target, gen, ignore)),
            Box::new(sub_term(b, target, gen, ignore)),
        ),
        Formula::Or(a, b) => Formula::Or(
            Box::new(sub_term(a, target, gen, ignore)),
            Box::new(sub_term(b, target, gen, ignore)),
        ),
        Formula::Imp(a, b) => Formula::Imp(
            Box::new(sub_term(a, target, gen, ignore)),
            Box::new(sub_term(b, target, gen, ignore)),
        ),
        Formula::Iff(a, b) => Formula::Iff(
            Box::new(sub_term(a, target, gen, ignore)),
            Box::new(sub_term(b, target, gen, ignore)),
        ),
        Formula::Forall(v, a) => {
            if *target == Term::var(v.clone()) {
                formula.clone()
            } else {
                Formula::Forall(v.clone(), Box::new(sub_term(a, target, gen, ignore)))
            }
        }
        Formula::Exists(v, a) => {
            if *target == Term::var(v.clone()) {
                formula.clone()
            } else {
                Formula::Exists(v.clone(), Box::new(sub_term(a, target, gen, ignore)))
            }
        }
        Formula::BoxF(a) => Formula::BoxF(Box::new(sub_term(a, target, gen, ignore))),
        Formula::Dia(a) => Formula::Dia(Box::new(sub_term(a, target, gen, ignore))),
    }
}

fn sub_term_term(
    term: &Term,
    target: &Term,
    gen: &mut dyn FnMut() -> Term,
    ignore: &dyn Fn(&Term) -> bool,
) -> Term {
    if term == target && !ignore(term) {
        return gen();
    }
    match term {
        Term::Func(name, args) => {
            Term::Func(name.clone(), args.iter().map(|t| sub_term_term(t, target, gen, ignore)).collect())
        }
        _ => term.clone(),
    }
}

/// Replace every free occurrence of `var` in `formula` with a single fixed
/// term — the ordinary capture-avoiding instantiation used by `ForallE`
/// (replacing the bound variable with a chosen witness) and by schema
/// construction for `ExistsI`/`ForallE` (replacing it with a fresh
/// metavariable, then letting unification recover the witness).
pub fn substitute(formula: &Formula, var: &str, replacement: &Term) -> Formula {
    let target = Term::var(var.to_string());
    let mut gen = move || replacement.clone();
    sub_term(formula, &target, &mut gen, &|_| false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_elides_outer_parens() {
        let f = Formula::and(Formula::atom("P"), Formula::atom("Q"));
        assert_eq!(f.to_string(), "P ∧ Q");
    }

    #[test]
    fn display_nests_parens_for_compound() {
        let f = Formula::imp(Formula::and(Formula::atom("P"), Formula::atom("Q")), Formula::atom("R"));
        assert_eq!(f.to_string(), "(P ∧ Q) → R");
    }

    #[test]
    fn unify_binds_metavariable() {
        let pattern = Formula::and(Formula::meta(0), Formula::meta(1));
        let concrete = Formula::and(Formula::atom("P"), Formula::atom("Q"));
        let mut subst = Subst::new();
        assert!(Formula::unify(&pattern, &concrete, &mut subst));
        assert_eq!(subst.formula_value(0), Some(&Formula::atom("P")));
        assert_eq!(subst.formula_value(1), Some(&Formula::atom("Q")));
    }

    #[test]
    fn unify_rolls_back_on_failure() {
        let pattern = Formula::and(Formula::meta(0), Formula::atom("R"));
        let concrete = Formula::and(Formula::atom("P"), Formula::atom("Q"));
        let mut subst = Subst::new();
        assert!(!Formula::unify(&pattern, &concrete, &mut subst));
        assert_eq!(subst.formula_value(0), None);
    }

    #[test]
    fn unify_consistent_metavariable_must_repeat() {
        let pattern = Formula::and(Formula::meta(0), Formula::meta(0));
        let ok = Formula::and(Formula::atom("P"), Formula::atom("P"));
        let bad = Formula::and(Formula::atom("P"), Formula::atom("Q"));
        let mut subst = Subst::new();
        assert!(Formula::unify(&pattern, &ok, &mut subst));
        let mut subst2 = Subst::new();
        assert!(!Formula::unify(&pattern, &bad, &mut subst2));
    }

    #[test]
    fn free_vars_strip_bound_occurrences() {
        let f = Formula::Forall(
            "x".to_string(),
            Box::new(Formula::Pred("Loves".to_string(), vec![Term::var("x"), Term::constant("a")])),
        );
        let fv = free_vars(&f);
        assert!(fv.is_empty());
        assert_eq!(constants(&f), HashSet::from([Term::constant("a")]));
    }

    #[test]
    fn sub_term_replaces_constant_with_fresh_var() {
        let f = Formula::Pred("P".to_string(), vec![Term::constant("c")]);
        let mut n = 0;
        let mut gen = || {
            n += 1;
            Term::var("x")
        };
        let generalized = sub_term(&f, &Term::constant("c"), &mut gen, &|_| false);
        assert_eq!(generalized, Formula::Pred("P".to_string(), vec![Term::var("x")]));
    }
}

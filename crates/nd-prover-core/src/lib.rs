//! Core library for natural-deduction proof checking and TFL proof search:
//! syntax and unification (`models::formula`), the textual parser
//! (`parser`), the rule catalog and per-logic schemas (`models::rule`,
//! `schema`), the mutating checker (`checker`), the propositional SAT
//! oracle (`sat`), the proof-search engine (`prover`), and the external
//! façade (`facade`) a front-end calls instead of touching any of the above
//! directly.

pub mod checker;
pub mod error;
pub mod facade;
pub mod models;
pub mod parser;
pub mod prover;
pub mod sat;
pub mod schema;

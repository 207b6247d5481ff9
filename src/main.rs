//! Interactive CLI: prompts for a logic, a sequent, and then repeatedly
//! prompts for proof edits until the conclusion is reached — a thin
//! wrapper around the core's `Problem` API with no proof logic of its own.

use std::io::{self, Write};
use std::time::Duration;

use clap::Parser;
use nd_prover_core::checker::CitationRef;
use nd_prover_core::error::ParsingError;
use nd_prover_core::models::logic::Logic;
use nd_prover_core::models::proof::Problem;
use nd_prover_core::parser::{
    parse_and_verify_formula, parse_and_verify_premises, parse_assumption, parse_line,
};
use nd_prover_core::prover;

#[derive(Parser)]
#[command(name = "ndproof")]
#[command(about = "Interactive natural-deduction proof checker and TFL prover")]
struct Cli {
    /// Deadline for `prove`'s complete search, in seconds, before it falls
    /// back to the unbounded any-proof search.
    #[arg(long, default_value_t = 3)]
    timeout: u64,

    /// Search for a complete TFL proof instead of entering the edit loop.
    #[arg(long)]
    prove: bool,
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().read_line(&mut line).expect("stdin is readable");
    line.trim().to_string()
}

fn select_logic() -> Logic {
    loop {
        let raw = prompt(&format!(
            "Select logic ({}): ",
            Logic::ALL.iter().map(|l| l.name()).collect::<Vec<_>>().join(", ")
        ));
        if let Some(logic) = Logic::from_name(&raw) {
            return logic;
        }
        println!("Logic not recognized. Please try again.");
    }
}

fn input_premises(logic: Logic) -> Vec<nd_prover_core::models::formula::Formula> {
    loop {
        let raw = prompt("Enter premises (separated by \",\" or \";\"), or \"NA\" if none: ");
        match parse_and_verify_premises(&raw, logic) {
            Ok(premises) => return premises,
            Err(e) => println!("{} Please try again.", e),
        }
    }
}

fn input_conclusion(logic: Logic) -> nd_prover_core::models::formula::Formula {
    loop {
        let raw = prompt("Enter conclusion: ");
        match parse_and_verify_formula(&raw, logic) {
            Ok(f) => return f,
            Err(e) => println!("{} Please try again.", e),
        }
    }
}

fn create_problem() -> Problem {
    let logic = select_logic();
    let premises = input_premises(logic);
    let conclusion = input_conclusion(logic);
    Problem::new(logic, premises, conclusion)
}

#[derive(Clone, Copy)]
enum Edit {
    AddLine,
    BeginSubproof,
    EndSubproof,
    EndAndBeginSubproof,
    DeleteLine,
}

fn select_edit() -> Edit {
    loop {
        let raw = prompt(
            "\n1 - Add a new line\n2 - Begin a new subproof\n3 - End the current subproof\n4 - End the current subproof and begin a new one\n5 - Delete the last line\n\nSelect edit: ",
        );
        match raw.parse::<u32>() {
            Ok(1) => return Edit::AddLine,
            Ok(2) => return Edit::BeginSubproof,
            Ok(3) => return Edit::EndSubproof,
            Ok(4) => return Edit::EndAndBeginSubproof,
            Ok(5) => return Edit::DeleteLine,
            _ => println!("Invalid edit. Please try again.\n"),
        }
    }
}

fn input_line() -> Result<(nd_prover_core::models::formula::Formula, nd_prover_core::models::rule::Rule, Vec<CitationRef>), ParsingError> {
    parse_line(&prompt("Enter line: "))
}

fn input_assumption() -> Result<nd_prover_core::models::formula::Formula, ParsingError> {
    parse_assumption(&prompt("Enter assumption: "))
}

/// Perform one edit. `add_line` always records its edit even when the line
/// fails its schema, so any error past that point is rolled back with
/// `delete_line`; a failure that happens *before* any edit was recorded
/// (a bad parse, or `end_subproof`/`end_and_begin_subproof` rejecting an
/// edit outright) needs no rollback at all.
fn perform_edit(problem: &mut Problem, edit: Edit) {
    let outcome = match edit {
        Edit::AddLine => match input_line() {
            Err(e) => Err((e.message, false)),
            Ok((formula, rule, refs)) => {
                problem.add_line(formula, rule, &refs).err().map(|e| (e.message, true)).map_or(Ok(()), Err)
            }
        },
        Edit::BeginSubproof => match input_assumption() {
            Err(e) => Err((e.message, false)),
            Ok(assumption) => {
                problem.begin_subproof(assumption);
                Ok(())
            }
        },
        Edit::EndSubproof => match problem.end_subproof() {
            Err(e) => Err((e.message, false)),
            Ok(_) => match input_line() {
                Err(e) => Err((e.message, true)),
                Ok((formula, rule, refs)) => {
                    problem.add_line(formula, rule, &refs).err().map(|e| (e.message, true)).map_or(Ok(()), Err)
                }
            },
        },
        Edit::EndAndBeginSubproof => match input_assumption() {
            Err(e) => Err((e.message, false)),
            Ok(assumption) => {
                problem.end_and_begin_subproof(assumption).err().map(|e| (e.message, true)).map_or(Ok(()), Err)
            }
        },
        Edit::DeleteLine => problem.delete_line().err().map(|e| (e.message, false)).map_or(Ok(()), Err),
    };

    if let Err((message, needs_rollback)) = outcome {
        if needs_rollback {
            problem.delete_line().ok();
        }
        println!("{} Please try again.", message);
    }
}

fn run_edit_loop() {
    let mut problem = create_problem();
    while !problem.is_complete() {
        println!();
        let rendered = problem.render();
        if !rendered.is_empty() {
            println!("{}\n", rendered);
        }
        let edit = select_edit();
        perform_edit(&mut problem, edit);
    }
    println!("\n{}\n", problem.render());
    println!("Proof complete!");
}

fn run_prove(timeout: Duration) {
    let logic = Logic::Tfl;
    let premises = input_premises(logic);
    let conclusion = input_conclusion(logic);
    match prover::prove(premises, conclusion, timeout) {
        Ok(problem) => {
            println!("\n{}\n", problem.render());
            println!("Proof complete!");
        }
        Err(e) => println!("{}", e.message),
    }
}

fn main() {
    let cli = Cli::parse();
    if cli.prove {
        run_prove(Duration::from_secs(cli.timeout));
    } else {
        run_edit_loop();
    }
}

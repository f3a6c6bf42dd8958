//! Imperative shell for operating on first-order formulas.
//!
//! Holds the session's axiom set and named lemma table, dispatches REPL commands against them, and
//! reports parse errors and proof traces. The engine (see [crate::core::prover]) never sees this
//! state; it only ever receives a slice of axioms and a goal.

use std::io::{self, BufRead};

use crate::core::algebra::Expr;
use crate::core::prover::{self, prove_traced};
use crate::parser::parse_formula;
use crate::util::{file_exists, read_file};

const HELP_TEXT: &str = "\
commands:
  axioms                 list the current axioms
  lemmas                 list the names of proved lemmas
  axiom <formula>        add <formula> to the axiom set
  lemma <name> = <f>     prove <f> against the current axioms; store it as <name> on success
  remove <formula>       remove <formula> from the axiom set, if present
  reset                  clear both the axiom set and the lemma table
  prove <formula>        prove <formula> against the current axioms, without storing it
  help                   print this summary";

/// Session state for one REPL run: the axiom set and the table of named, already-proved lemmas.
///
/// Neither is persisted; both are cleared by `reset` and lost when the process exits, matching the
/// engine's own non-goal of not persisting state across runs.
struct Session {
    axioms: Vec<Expr>,
    lemmas: Vec<(String, Expr)>,
    trace: bool,
    max_steps: u64,
}

impl Session {
    fn new(trace: bool, max_steps: u64) -> Self {
        Session { axioms: Vec::new(), lemmas: Vec::new(), trace, max_steps }
    }

    fn list_axioms(&self) {
        for axiom in &self.axioms {
            println!("{axiom}");
        }
    }

    fn list_lemmas(&self) {
        for (name, _) in &self.lemmas {
            println!("{name}");
        }
    }

    fn add_axiom(&mut self, text: &str) {
        match parse_formula(text) {
            Ok(expr) => self.axioms.push(expr),
            Err(err) => println!("parse error: {err}"),
        }
    }

    fn remove_axiom(&mut self, text: &str) {
        match parse_formula(text) {
            Ok(expr) => self.axioms.retain(|axiom| axiom != &expr),
            Err(err) => println!("parse error: {err}"),
        }
    }

    fn reset(&mut self) {
        self.axioms.clear();
        self.lemmas.clear();
    }

    /// Decides `goal` against the current axioms, printing a trace first when `self.trace` is set.
    /// `None` means the step budget was exhausted before a verdict was reached.
    fn decide(&self, goal: &Expr) -> Option<bool> {
        if self.trace {
            prove_traced(
                &self.axioms,
                goal,
                self.max_steps,
                |sequent| println!("{sequent}"),
                |substitution| {
                    for (term, replacement) in substitution.bindings() {
                        println!("  {term} = {replacement}");
                    }
                },
            )
        } else {
            prover::prove_bounded(&self.axioms, goal, self.max_steps)
        }
    }

    fn prove_command(&mut self, text: &str) {
        let goal = match parse_formula(text) {
            Ok(expr) => expr,
            Err(err) => {
                println!("parse error: {err}");
                return;
            }
        };
        match self.decide(&goal) {
            Some(true) => println!("provable."),
            Some(false) => println!("not provable."),
            None => println!("not provable. (exceeded {} steps)", self.max_steps),
        }
    }

    fn lemma_command(&mut self, name: &str, formula: &str) {
        let goal = match parse_formula(formula) {
            Ok(expr) => expr,
            Err(err) => {
                println!("parse error: {err}");
                return;
            }
        };
        match self.decide(&goal) {
            Some(true) => {
                self.lemmas.push((name.to_owned(), goal));
                println!("proved.");
            }
            Some(false) => println!("not proved."),
            None => println!("not proved. (exceeded {} steps)", self.max_steps),
        }
    }
}

fn dispatch(session: &mut Session, line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }
    if line == "quit" || line == "exit" {
        return false;
    }
    if line == "axioms" {
        session.list_axioms();
    } else if line == "lemmas" {
        session.list_lemmas();
    } else if line == "reset" {
        session.reset();
    } else if line == "help" {
        println!("{HELP_TEXT}");
    } else if let Some(rest) = line.strip_prefix("axiom ") {
        session.add_axiom(rest.trim());
    } else if let Some(rest) = line.strip_prefix("remove ") {
        session.remove_axiom(rest.trim());
    } else if let Some(rest) = line.strip_prefix("prove ") {
        session.prove_command(rest.trim());
    } else if let Some(rest) = line.strip_prefix("lemma ") {
        match rest.split_once('=') {
            Some((name, formula)) => session.lemma_command(name.trim(), formula.trim()),
            None => println!("expected `lemma <name> = <formula>`"),
        }
    } else {
        println!("unrecognized command; type `help` for a list of commands");
    }
    true
}

/// Reads commands one per line from `input` and runs them against a fresh session, writing
/// responses to standard output. Returns once `input` reaches EOF or a `quit`/`exit` line.
fn run_lines(input: impl BufRead, trace: bool, max_steps: u64) {
    let mut session = Session::new(trace, max_steps);
    for line in input.lines() {
        let line = line.expect("failed to read a line of input");
        if !dispatch(&mut session, &line) {
            break;
        }
    }
}

/// Main entry point.
///
/// With no script argument (or `-`), runs an interactive REPL against standard input. With a
/// script file argument, replays its lines as commands; if the file does not exist, reports the
/// error and signals failure to the caller via `false`.
pub fn main(script: Option<String>, trace: bool, max_steps: u64) -> bool {
    match script {
        None => {
            run_lines(io::stdin().lock(), trace, max_steps);
            true
        }
        Some(ref path) if path == "-" => {
            run_lines(io::stdin().lock(), trace, max_steps);
            true
        }
        Some(path) => {
            if !file_exists(&path) {
                eprintln!("no such file: {path}");
                return false;
            }
            let contents = read_file(&path);
            run_lines(contents.as_bytes(), trace, max_steps);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(commands: &[&str]) -> Session {
        let mut session = Session::new(false, 10_000);
        for command in commands {
            dispatch(&mut session, command);
        }
        session
    }

    #[test]
    fn axiom_then_remove_empties_the_axiom_set() {
        let session = run(&["axiom P", "remove P"]);
        assert!(session.axioms.is_empty());
    }

    #[test]
    fn reset_clears_axioms_and_lemmas() {
        let mut session = run(&["axiom P", "lemma id = P implies P"]);
        assert_eq!(session.lemmas.len(), 1);
        dispatch(&mut session, "reset");
        assert!(session.axioms.is_empty());
        assert!(session.lemmas.is_empty());
    }

    #[test]
    fn failed_lemma_is_not_stored() {
        let session = run(&["lemma unreachable = P"]);
        assert!(session.lemmas.is_empty());
    }

    #[test]
    fn successful_lemma_is_stored_under_its_name() {
        let session = run(&["lemma id = P implies P"]);
        assert_eq!(session.lemmas[0].0, "id");
    }
}

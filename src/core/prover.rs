//! The sequent proof-search engine: frontier-driven rule expansion with sibling tracking for
//! quantifier branches and simultaneous unification across open branches.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use super::algebra::{Connective, Expr};
use super::sequent::Sequent;
use super::unify::{self, Substitution};

/// Which side of a sequent a selected formula sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Outcome of attempting to close a sibling group around the sequent currently being processed.
enum SiblingOutcome {
    /// A simultaneous substitution was found; every sibling is now in `proven`.
    Closed(Substitution),
    /// Some sibling (not necessarily the current sequent) has no unifiable cross-side pair at
    /// all; the group cannot close yet.
    CannotCloseYet,
    /// Every sibling has candidate pairs, but no simultaneous choice unifies.
    NoMatch,
}

/// Owns the frontier, the `proven` set, and the table of sibling groups for one `prove` call.
///
/// Sibling groups are a `Vec<Vec<Sequent>>` rather than sequents holding a shared, reference-
/// counted, interior-mutable handle to their group: the search loop has single-threaded,
/// exclusive ownership throughout, so a prover-owned table indexed by a plain `usize` is the
/// simpler equivalent the original design explicitly sanctions.
pub(crate) struct Prover {
    frontier: VecDeque<Sequent>,
    proven: FxHashSet<Sequent>,
    sibling_groups: Vec<Vec<Sequent>>,
    /// True only until the first [Prover::dequeue] call returns.
    ///
    /// The goal sequent seeds both the frontier and `proven` at initialization. Every later
    /// dequeue must skip sequents already in `proven`, but the very first one must not, or a
    /// single-entry frontier closes instantly without ever trying a rule. This flag reproduces
    /// that first-iteration behavior directly instead of leaving it as an accidental side effect
    /// of loop structure.
    first_dequeue: bool,
}

impl Prover {
    fn new(initial: Sequent) -> Self {
        let mut frontier = VecDeque::new();
        let mut proven = FxHashSet::default();
        frontier.push_back(initial.clone());
        proven.insert(initial);
        Prover {
            frontier,
            proven,
            sibling_groups: Vec::new(),
            first_dequeue: true,
        }
    }

    fn dequeue(&mut self) -> Option<Sequent> {
        loop {
            let sequent = self.frontier.pop_front()?;
            if self.first_dequeue {
                self.first_dequeue = false;
                return Some(sequent);
            }
            if !self.proven.contains(&sequent) {
                return Some(sequent);
            }
        }
    }

    /// Builds a successor sequent one search-depth step below `parent`, inheriting its sibling
    /// group (creating a fresh singleton group first if `parent` has none and `new_sibling` asks
    /// for one).
    fn make_successor(
        &mut self,
        parent: &Sequent,
        left: Vec<(Expr, u32)>,
        right: Vec<(Expr, u32)>,
        new_sibling: bool,
    ) -> Sequent {
        let mut sibling_group = parent.sibling_group;
        if new_sibling && sibling_group.is_none() {
            let idx = self.sibling_groups.len();
            self.sibling_groups.push(Vec::new());
            sibling_group = Some(idx);
        }
        Sequent {
            left,
            right,
            sibling_group,
            depth: parent.depth + 1,
        }
    }

    /// Pushes a successor onto the frontier, inserting it into its sibling group's member list
    /// if it has one — every successor that inherits a sibling group joins that group's set, not
    /// just the ones freshly introducing a unification term.
    fn push_successor(&mut self, successor: Sequent) {
        if let Some(idx) = successor.sibling_group {
            if !self.sibling_groups[idx].contains(&successor) {
                self.sibling_groups[idx].push(successor.clone());
            }
        }
        self.frontier.push_back(successor);
    }

    fn try_close_sibling_group(&mut self, idx: usize) -> SiblingOutcome {
        let siblings = self.sibling_groups[idx].clone();
        let mut per_sibling_pairs = Vec::with_capacity(siblings.len());
        for sibling in &siblings {
            let pairs = sibling.unification_pairs();
            if pairs.is_empty() {
                return SiblingOutcome::CannotCloseYet;
            }
            per_sibling_pairs.push(pairs);
        }
        if let Some(substitution) = first_closing_combination(&per_sibling_pairs) {
            for sibling in &siblings {
                self.proven.insert(sibling.clone());
            }
            self.frontier.retain(|s| !siblings.contains(s));
            return SiblingOutcome::Closed(substitution);
        }
        SiblingOutcome::NoMatch
    }

    /// Picks the lowest-depth non-atomic formula (left checked before right, so a left candidate
    /// wins any depth tie) and applies its rule, pushing successors. Returns `false` if no
    /// non-atomic formula remains on either side (the branch is stuck).
    fn expand(&mut self, sequent: Sequent) -> bool {
        let Some((side, index)) = select_formula(&sequent) else {
            return false;
        };
        let (formula, counter) = match side {
            Side::Left => sequent.left[index].clone(),
            Side::Right => sequent.right[index].clone(),
        };
        let child_counter = counter + 1;
        let successor_depth = sequent.depth + 1;

        match (side, formula.connective()) {
            (Side::Left, Connective::Not(inner)) => {
                let left = remove_one(&sequent.left, &formula);
                let right = push(sequent.right.clone(), inner.clone(), child_counter);
                let succ = self.make_successor(&sequent, left, right, false);
                self.push_successor(succ);
            }
            (Side::Left, Connective::And(a, b)) => {
                let mut left = remove_one(&sequent.left, &formula);
                left.push((a.clone(), child_counter));
                left.push((b.clone(), child_counter));
                let succ = self.make_successor(&sequent, left, sequent.right.clone(), false);
                self.push_successor(succ);
            }
            (Side::Left, Connective::Or(a, b)) => {
                let base = remove_one(&sequent.left, &formula);
                let mut left_a = base.clone();
                left_a.push((a.clone(), child_counter));
                let mut left_b = base;
                left_b.push((b.clone(), child_counter));
                let succ_a = self.make_successor(&sequent, left_a, sequent.right.clone(), false);
                let succ_b = self.make_successor(&sequent, left_b, sequent.right.clone(), false);
                self.push_successor(succ_a);
                self.push_successor(succ_b);
            }
            (Side::Left, Connective::Implies(a, b)) => {
                let base = remove_one(&sequent.left, &formula);
                let right_a = push(sequent.right.clone(), a.clone(), child_counter);
                let succ_a = self.make_successor(&sequent, base.clone(), right_a, false);
                let mut left_b = base;
                left_b.push((b.clone(), child_counter));
                let succ_b = self.make_successor(&sequent, left_b, sequent.right.clone(), false);
                self.push_successor(succ_a);
                self.push_successor(succ_b);
            }
            (Side::Left, Connective::ForAll(variable, body)) => {
                let mut left = sequent.left.clone();
                left[index].1 = child_counter;
                let term = Expr::term(sequent.fresh_name("t"));
                let instantiated = body.replace(&Expr::variable(variable), &term);
                instantiated.set_creation_time(successor_depth);
                let left = push_if_absent(left, instantiated, child_counter);
                let succ = self.make_successor(&sequent, left, sequent.right.clone(), true);
                self.push_successor(succ);
            }
            (Side::Left, Connective::ThereExists(variable, body)) => {
                let left = remove_one(&sequent.left, &formula);
                let eigen = Expr::variable(sequent.fresh_name("v"));
                let instantiated = body.replace(&Expr::variable(variable), &eigen);
                instantiated.set_creation_time(successor_depth);
                let left = push(left, instantiated, child_counter);
                let succ = self.make_successor(&sequent, left, sequent.right.clone(), false);
                self.push_successor(succ);
            }
            (Side::Left, Connective::Atomic) => unreachable!("atomic formulas are never selected"),

            (Side::Right, Connective::Not(inner)) => {
                let right = remove_one(&sequent.right, &formula);
                let left = push(sequent.left.clone(), inner.clone(), child_counter);
                let succ = self.make_successor(&sequent, left, right, false);
                self.push_successor(succ);
            }
            (Side::Right, Connective::And(a, b)) => {
                let base = remove_one(&sequent.right, &formula);
                let mut right_a = base.clone();
                right_a.push((a.clone(), child_counter));
                let mut right_b = base;
                right_b.push((b.clone(), child_counter));
                let succ_a = self.make_successor(&sequent, sequent.left.clone(), right_a, false);
                let succ_b = self.make_successor(&sequent, sequent.left.clone(), right_b, false);
                self.push_successor(succ_a);
                self.push_successor(succ_b);
            }
            (Side::Right, Connective::Or(a, b)) => {
                let mut right = remove_one(&sequent.right, &formula);
                right.push((a.clone(), child_counter));
                right.push((b.clone(), child_counter));
                let succ = self.make_successor(&sequent, sequent.left.clone(), right, false);
                self.push_successor(succ);
            }
            (Side::Right, Connective::Implies(a, b)) => {
                let right = remove_one(&sequent.right, &formula);
                let left = push(sequent.left.clone(), a.clone(), child_counter);
                let right = push(right, b.clone(), child_counter);
                let succ = self.make_successor(&sequent, left, right, false);
                self.push_successor(succ);
            }
            (Side::Right, Connective::ForAll(variable, body)) => {
                let right = remove_one(&sequent.right, &formula);
                let eigen = Expr::variable(sequent.fresh_name("v"));
                let instantiated = body.replace(&Expr::variable(variable), &eigen);
                instantiated.set_creation_time(successor_depth);
                let right = push(right, instantiated, child_counter);
                let succ = self.make_successor(&sequent, sequent.left.clone(), right, false);
                self.push_successor(succ);
            }
            (Side::Right, Connective::ThereExists(variable, body)) => {
                let mut right = sequent.right.clone();
                right[index].1 = child_counter;
                let term = Expr::term(sequent.fresh_name("t"));
                let instantiated = body.replace(&Expr::variable(variable), &term);
                instantiated.set_creation_time(successor_depth);
                let right = push_if_absent(right, instantiated, child_counter);
                let succ = self.make_successor(&sequent, sequent.left.clone(), right, true);
                self.push_successor(succ);
            }
            (Side::Right, Connective::Atomic) => unreachable!("atomic formulas are never selected"),
        }
        true
    }

    fn run(mut self) -> bool {
        loop {
            let Some(sequent) = self.dequeue() else {
                return true;
            };
            if sequent.is_axiomatically_closed() {
                self.proven.insert(sequent);
                continue;
            }
            if let Some(idx) = sequent.sibling_group {
                match self.try_close_sibling_group(idx) {
                    SiblingOutcome::Closed(_) => continue,
                    SiblingOutcome::CannotCloseYet => {
                        self.sibling_groups[idx].retain(|s| s != &sequent);
                    }
                    SiblingOutcome::NoMatch => {}
                }
            }
            if !self.expand(sequent) {
                return false;
            }
        }
    }
}

/// Removes the first entry structurally equal to `formula`.
fn remove_one(entries: &[(Expr, u32)], formula: &Expr) -> Vec<(Expr, u32)> {
    let mut out = Vec::with_capacity(entries.len());
    let mut removed = false;
    for (e, d) in entries {
        if !removed && e == formula {
            removed = true;
            continue;
        }
        out.push((e.clone(), *d));
    }
    out
}

fn push(mut entries: Vec<(Expr, u32)>, formula: Expr, counter: u32) -> Vec<(Expr, u32)> {
    entries.push((formula, counter));
    entries
}

fn push_if_absent(mut entries: Vec<(Expr, u32)>, formula: Expr, counter: u32) -> Vec<(Expr, u32)> {
    if !entries.iter().any(|(e, _)| *e == formula) {
        entries.push((formula, counter));
    }
    entries
}

/// Picks the non-atomic formula with the smallest expansion-depth counter, left side checked
/// before right so a left candidate wins any tie.
fn select_formula(sequent: &Sequent) -> Option<(Side, usize)> {
    let mut best: Option<(Side, usize, u32)> = None;
    for (i, (formula, depth)) in sequent.left.iter().enumerate() {
        if formula.is_atomic() {
            continue;
        }
        let improves = match best {
            None => true,
            Some((_, _, best_depth)) => *depth < best_depth,
        };
        if improves {
            best = Some((Side::Left, i, *depth));
        }
    }
    for (i, (formula, depth)) in sequent.right.iter().enumerate() {
        if formula.is_atomic() {
            continue;
        }
        let improves = match best {
            None => true,
            Some((_, _, best_depth)) => *depth < best_depth,
        };
        if improves {
            best = Some((Side::Right, i, *depth));
        }
    }
    best.map(|(side, i, _)| (side, i))
}

/// Enumerates the cartesian product of per-sibling pair choices in lexicographic odometer order
/// (the last sibling's choice varies fastest) and returns the first simultaneous substitution, if
/// any selection's chosen pairs all unify consistently under [unify::unify_list].
fn first_closing_combination(sibling_pairs: &[Vec<(Expr, Expr)>]) -> Option<Substitution> {
    if sibling_pairs.iter().any(|pairs| pairs.is_empty()) {
        return None;
    }
    let total: u64 = sibling_pairs.iter().map(|pairs| pairs.len() as u64).product();
    for linear in 0..total {
        let mut remaining = linear;
        let mut chosen = Vec::with_capacity(sibling_pairs.len());
        let mut indices = vec![0usize; sibling_pairs.len()];
        for i in (0..sibling_pairs.len()).rev() {
            let len = sibling_pairs[i].len() as u64;
            indices[i] = (remaining % len) as usize;
            remaining /= len;
        }
        for (i, pairs) in sibling_pairs.iter().enumerate() {
            chosen.push(pairs[indices[i]].clone());
        }
        if let Some(sub) = unify::unify_list(&chosen) {
            return Some(sub);
        }
    }
    None
}

/// Decides whether `goal` is provable from `axioms` by Gentzen-style sequent proof search.
///
/// May not terminate if `goal` is not provable and contains essential quantifiers; this is
/// expected semi-decidability, not a bug (see the crate's Non-goals). Callers wanting a bound on
/// search effort wrap this call externally (the `shell` controller's `--max-steps` budget is one
/// such wrapper, built around a step-counted variant of this same loop).
pub fn prove(axioms: &[Expr], goal: &Expr) -> bool {
    for axiom in axioms {
        axiom.set_creation_time(0);
    }
    goal.set_creation_time(0);
    let initial = Sequent::initial(axioms, goal);
    Prover::new(initial).run()
}

/// Like [prove], but returns `None` instead of looping forever once `max_steps` dequeues have
/// happened without reaching a verdict. Used by the `shell` controller's `--max-steps` flag; the
/// engine itself has no notion of a step budget (see the crate's Non-goals on nontermination).
pub fn prove_bounded(axioms: &[Expr], goal: &Expr, max_steps: u64) -> Option<bool> {
    for axiom in axioms {
        axiom.set_creation_time(0);
    }
    goal.set_creation_time(0);
    let initial = Sequent::initial(axioms, goal);
    let mut prover = Prover::new(initial);
    let mut steps = 0u64;
    loop {
        if steps >= max_steps {
            return None;
        }
        steps += 1;
        let Some(sequent) = prover.dequeue() else {
            return Some(true);
        };
        if sequent.is_axiomatically_closed() {
            prover.proven.insert(sequent);
            continue;
        }
        if let Some(idx) = sequent.sibling_group {
            match prover.try_close_sibling_group(idx) {
                SiblingOutcome::Closed(_) => continue,
                SiblingOutcome::CannotCloseYet => {
                    prover.sibling_groups[idx].retain(|s| s != &sequent);
                }
                SiblingOutcome::NoMatch => {}
            }
        }
        if !prover.expand(sequent) {
            return Some(false);
        }
    }
}

/// Like [prove_bounded], but invokes `on_step` with every sequent as it is dequeued (and with the
/// closing substitution whenever a sibling group closes), for a controller that wants to render a
/// search trace. The engine has no notion of tracing on its own; this is purely an observation
/// hook threaded through the same loop `prove_bounded` runs.
pub fn prove_traced(
    axioms: &[Expr],
    goal: &Expr,
    max_steps: u64,
    mut on_step: impl FnMut(&Sequent),
    mut on_closure: impl FnMut(&Substitution),
) -> Option<bool> {
    for axiom in axioms {
        axiom.set_creation_time(0);
    }
    goal.set_creation_time(0);
    let initial = Sequent::initial(axioms, goal);
    let mut prover = Prover::new(initial);
    let mut steps = 0u64;
    loop {
        if steps >= max_steps {
            return None;
        }
        steps += 1;
        let Some(sequent) = prover.dequeue() else {
            return Some(true);
        };
        on_step(&sequent);
        if sequent.is_axiomatically_closed() {
            prover.proven.insert(sequent);
            continue;
        }
        if let Some(idx) = sequent.sibling_group {
            match prover.try_close_sibling_group(idx) {
                SiblingOutcome::Closed(substitution) => {
                    on_closure(&substitution);
                    continue;
                }
                SiblingOutcome::CannotCloseYet => {
                    prover.sibling_groups[idx].retain(|s| s != &sequent);
                }
                SiblingOutcome::NoMatch => {}
            }
        }
        if !prover.expand(sequent) {
            return Some(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicate(name: &str) -> Expr {
        Expr::predicate(name, vec![])
    }

    #[test]
    fn propositional_axiom_p_implies_p() {
        let p = predicate("P");
        let goal = Expr::implies(p.clone(), p);
        assert!(prove(&[], &goal));
    }

    #[test]
    fn de_morgan() {
        let a = predicate("A");
        let b = predicate("B");
        let goal = Expr::implies(
            Expr::not(Expr::or(a.clone(), b.clone())),
            Expr::and(Expr::not(a), Expr::not(b)),
        );
        assert!(prove(&[], &goal));
    }

    #[test]
    fn universal_instantiation() {
        let x = Expr::variable("x");
        let axiom = Expr::for_all("x", Expr::predicate("P", vec![x]));
        let a = Expr::functor("a", vec![]);
        let goal = Expr::predicate("P", vec![a]);
        assert!(prove(&[axiom], &goal));
    }

    #[test]
    fn existential_introduction() {
        let a = Expr::functor("a", vec![]);
        let axiom = Expr::predicate("P", vec![a]);
        let x = Expr::variable("x");
        let goal = Expr::there_exists("x", Expr::predicate("P", vec![x]));
        assert!(prove(&[axiom], &goal));
    }

    #[test]
    fn syllogism() {
        let x = Expr::variable("x");
        let man_implies_mortal = Expr::for_all(
            "x",
            Expr::implies(
                Expr::predicate("Man", vec![x.clone()]),
                Expr::predicate("Mortal", vec![x]),
            ),
        );
        let socrates = Expr::functor("socrates", vec![]);
        let man_socrates = Expr::predicate("Man", vec![socrates.clone()]);
        let goal = Expr::predicate("Mortal", vec![socrates]);
        assert!(prove(&[man_implies_mortal, man_socrates], &goal));
    }

    #[test]
    fn quantifier_swap_valid_direction() {
        let x = Expr::variable("x");
        let y = Expr::variable("y");
        let r_xy = Expr::predicate("R", vec![x.clone(), y.clone()]);
        let goal = Expr::implies(
            Expr::there_exists("x", Expr::for_all("y", r_xy.clone())),
            Expr::for_all("y", Expr::there_exists("x", r_xy)),
        );
        assert_eq!(prove_bounded(&[], &goal, 5_000), Some(true));
    }

    #[test]
    fn quantifier_swap_invalid_direction_does_not_close_quickly() {
        let x = Expr::variable("x");
        let y = Expr::variable("y");
        let r_xy = Expr::predicate("R", vec![x.clone(), y.clone()]);
        let goal = Expr::implies(
            Expr::for_all("y", Expr::there_exists("x", r_xy.clone())),
            Expr::there_exists("x", Expr::for_all("y", r_xy)),
        );
        assert_eq!(prove_bounded(&[], &goal, 2_000), None);
    }

    #[test]
    fn unprovable_atomic_goal_is_rejected() {
        let goal = predicate("P");
        assert!(!prove(&[], &goal));
    }
}

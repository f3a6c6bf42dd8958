//! A sequent: a pair of formula multisets, with expansion-depth bookkeeping and fresh-name
//! allocation, plus cross-side unification-pair enumeration used to close quantifier branches.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashSet, FxHasher};

use super::algebra::Expr;
use super::unify;

/// An entry on one side of a sequent: a formula together with how many times it has been
/// expanded on this branch.
type Entry = (Expr, u32);

/// A judgement `left ⊢ right`.
///
/// `left` and `right` are semantically multisets keyed by structural formula identity; we keep
/// them as `Vec`s (rather than a `HashMap<Expr, u32>`) because rule selection (§4.4) needs stable
/// insertion order to break depth ties in favor of whichever qualifying formula was added first.
///
/// Equality and hashing ignore both the expansion-depth counters and `sibling_group`/`depth`:
/// two sequents are the same judgement iff their left and right sides hold the same formulas as
/// sets, which is what membership in `Prover`'s `proven` set and sibling groups relies on.
#[derive(Debug, Clone)]
pub(crate) struct Sequent {
    pub(crate) left: Vec<Entry>,
    pub(crate) right: Vec<Entry>,
    /// Index into [crate::core::prover::Prover]'s table of sibling groups, if this sequent shares
    /// unification terms with other open branches.
    pub(crate) sibling_group: Option<usize>,
    /// This sequent's own search depth, monotonically increasing along a branch.
    pub(crate) depth: u32,
}

fn formula_set(entries: &[Entry]) -> FxHashSet<&Expr> {
    entries.iter().map(|(e, _)| e).collect()
}

fn hash_one(e: &Expr) -> u64 {
    let mut hasher = FxHasher::default();
    e.hash(&mut hasher);
    hasher.finish()
}

/// Order-insensitive fold so that the hash agrees with the set-based [PartialEq] below.
fn hash_side(entries: &[Entry]) -> u64 {
    entries.iter().fold(0u64, |acc, (e, _)| acc ^ hash_one(e))
}

impl PartialEq for Sequent {
    fn eq(&self, other: &Self) -> bool {
        formula_set(&self.left) == formula_set(&other.left)
            && formula_set(&self.right) == formula_set(&other.right)
    }
}

impl Eq for Sequent {}

impl Hash for Sequent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(hash_side(&self.left));
        state.write_u64(hash_side(&self.right).wrapping_add(1));
    }
}

impl Sequent {
    /// Builds the initial sequent for a proof attempt: the axioms on the left, the goal alone on
    /// the right, every formula at expansion depth 0.
    pub(crate) fn initial(axioms: &[Expr], goal: &Expr) -> Self {
        Sequent {
            left: axioms.iter().map(|a| (a.clone(), 0)).collect(),
            right: vec![(goal.clone(), 0)],
            sibling_group: None,
            depth: 0,
        }
    }

    /// True iff some formula appears (structurally) on both sides: the sequent closes
    /// propositionally without any unification.
    pub(crate) fn is_axiomatically_closed(&self) -> bool {
        self.left
            .iter()
            .any(|(l, _)| self.right.iter().any(|(r, _)| l == r))
    }

    /// The free variables across both sides.
    pub(crate) fn free_variables(&self) -> FxHashSet<Expr> {
        self.left
            .iter()
            .chain(self.right.iter())
            .flat_map(|(e, _)| e.free_variables())
            .collect()
    }

    /// The free unification terms across both sides.
    pub(crate) fn free_terms(&self) -> FxHashSet<Expr> {
        self.left
            .iter()
            .chain(self.right.iter())
            .flat_map(|(e, _)| e.free_terms())
            .collect()
    }

    /// Returns `prefix1`, `prefix2`, ... for the smallest `k` such that no `Variable` or `Term`
    /// by that name occurs free anywhere in this sequent.
    pub(crate) fn fresh_name(&self, prefix: &str) -> String {
        let taken: FxHashSet<String> = self
            .free_variables()
            .iter()
            .chain(self.free_terms().iter())
            .filter_map(|e| e.name().map(str::to_owned))
            .collect();
        let mut k = 1u64;
        loop {
            let candidate = format!("{prefix}{k}");
            if !taken.contains(&candidate) {
                return candidate;
            }
            k += 1;
        }
    }

    /// Every cross-side pair of formulas whose individual unification succeeds in isolation (no
    /// substitution shared with any other pair).
    pub(crate) fn unification_pairs(&self) -> Vec<(Expr, Expr)> {
        let mut pairs = Vec::new();
        for (l, _) in &self.left {
            for (r, _) in &self.right {
                if unify::unify(l, r).is_some() {
                    pairs.push((l.clone(), r.clone()));
                }
            }
        }
        pairs
    }
}

impl fmt::Display for Sequent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let lhs = self
            .left
            .iter()
            .map(|(e, _)| e.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let rhs = self
            .right
            .iter()
            .map(|(e, _)| e.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}. {} \u{22a2} {}", self.depth, lhs, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axiomatic_closure_detects_shared_formula() {
        let p = Expr::predicate("P", vec![]);
        let sequent = Sequent {
            left: vec![(p.clone(), 0)],
            right: vec![(p, 0)],
            sibling_group: None,
            depth: 0,
        };
        assert!(sequent.is_axiomatically_closed());
    }

    #[test]
    fn fresh_name_skips_names_already_in_use() {
        let sequent = Sequent {
            left: vec![(Expr::predicate("P", vec![Expr::term("t1")]), 0)],
            right: vec![(Expr::predicate("Q", vec![Expr::variable("v2")]), 0)],
            sibling_group: None,
            depth: 0,
        };
        assert_eq!(sequent.fresh_name("t"), "t2");
        assert_eq!(sequent.fresh_name("v"), "v1");
    }

    #[test]
    fn equality_ignores_depth_and_insertion_order() {
        let a = Expr::predicate("A", vec![]);
        let b = Expr::predicate("B", vec![]);
        let s1 = Sequent {
            left: vec![(a.clone(), 0), (b.clone(), 3)],
            right: vec![],
            sibling_group: None,
            depth: 5,
        };
        let s2 = Sequent {
            left: vec![(b, 0), (a, 1)],
            right: vec![],
            sibling_group: Some(2),
            depth: 9,
        };
        assert_eq!(s1, s2);
    }

    #[test]
    fn unification_pairs_finds_only_unifiable_cross_side_pairs() {
        let sequent = Sequent {
            left: vec![(Expr::predicate("P", vec![Expr::term("t1")]), 0)],
            right: vec![
                (Expr::predicate("Q", vec![Expr::functor("a", vec![])]), 0),
                (Expr::predicate("P", vec![Expr::functor("a", vec![])]), 0),
            ],
            sibling_group: None,
            depth: 0,
        };
        let pairs = sequent.unification_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1.to_string(), "P(a)");
    }
}

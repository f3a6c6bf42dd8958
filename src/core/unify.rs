//! First-order unification with an occurs check and a creation-time ordering discipline.

use super::algebra::Expr;

/// A unification substitution: an ordered list of bindings from a unification [Term][Expr::term]
/// to its replacement expression.
///
/// Kept as a `Vec` rather than a map because bindings must be threaded through subsequent
/// unification steps in the order they were discovered (a later binding may need to be applied to
/// the left-hand side of an equation produced by an earlier one); lookups are rare compared to the
/// fold-and-apply access pattern of [unify] and [unify_list].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution(Vec<(Expr, Expr)>);

impl Substitution {
    pub fn empty() -> Self {
        Substitution(Vec::new())
    }

    fn singleton(term: Expr, replacement: Expr) -> Self {
        Substitution(vec![(term, replacement)])
    }

    /// Applies every binding in this substitution to `expr`, in order.
    pub fn apply(&self, expr: &Expr) -> Expr {
        self.0
            .iter()
            .fold(expr.clone(), |acc, (term, replacement)| {
                acc.replace(term, replacement)
            })
    }

    /// Appends `other`'s bindings after this substitution's own.
    fn merge(mut self, other: Substitution) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn bindings(&self) -> &[(Expr, Expr)] {
        &self.0
    }
}

/// Unifies two expressions, returning the most general substitution that makes them structurally
/// equal, or `None` on failure.
///
/// Failure is an ordinary, expected outcome of proof search (not a Rust error): callers try the
/// next alternative rather than propagating it.
pub fn unify(a: &Expr, b: &Expr) -> Option<Substitution> {
    if a.is_term() {
        return bind_term(a, b);
    }
    if b.is_term() {
        return bind_term(b, a);
    }
    if a.is_variable() && b.is_variable() {
        return if a == b {
            Some(Substitution::empty())
        } else {
            None
        };
    }
    unify_application(a, b)
}

/// Binds unification term `term` to `replacement`, enforcing the occurs check and the
/// creation-time (eigenvariable) ordering discipline.
fn bind_term(term: &Expr, replacement: &Expr) -> Option<Substitution> {
    if replacement.occurs(term) {
        return None;
    }
    if replacement.max_creation_time() > term.creation_time() {
        return None;
    }
    Some(Substitution::singleton(term.clone(), replacement.clone()))
}

/// Unifies two `Functor`/`Functor` or `Predicate`/`Predicate` applications pairwise, threading the
/// accumulated substitution through each subsequent pair before unifying it.
fn unify_application(a: &Expr, b: &Expr) -> Option<Substitution> {
    let (role_a, name_a, children_a) = a.as_application()?;
    let (role_b, name_b, children_b) = b.as_application()?;
    if role_a != role_b || name_a != name_b || children_a.len() != children_b.len() {
        return None;
    }
    let mut substitution = Substitution::empty();
    for (child_a, child_b) in children_a.iter().zip(children_b.iter()) {
        let a = substitution.apply(child_a);
        let b = substitution.apply(child_b);
        let step = unify(&a, &b)?;
        substitution = substitution.merge(step);
    }
    Some(substitution)
}

/// Unifies a list of equation pairs, threading the accumulated substitution through subsequent
/// pairs.
///
/// Used to close a sibling group: every pair must unify under one mutually consistent
/// substitution.
pub fn unify_list(pairs: &[(Expr, Expr)]) -> Option<Substitution> {
    let mut substitution = Substitution::empty();
    for (term_a, term_b) in pairs {
        let a = substitution.apply(term_a);
        let b = substitution.apply(term_b);
        let step = unify(&a, &b)?;
        substitution = substitution.merge(step);
    }
    Some(substitution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifies_term_with_functor() {
        let t = Expr::term("t1");
        let a = Expr::functor("a", vec![]);
        let sub = unify(&t, &a).expect("should unify");
        assert_eq!(sub.apply(&t), a);
    }

    #[test]
    fn occurs_check_rejects_self_reference() {
        let t = Expr::term("t1");
        let nested = Expr::functor("f", vec![t.clone()]);
        assert!(unify(&t, &nested).is_none());
    }

    #[test]
    fn eigenvariable_ordering_rejects_later_time() {
        let t = Expr::term("t1");
        t.set_creation_time(1);
        let v = Expr::variable("v1");
        v.set_creation_time(2);
        assert!(unify(&t, &v).is_none());
    }

    #[test]
    fn eigenvariable_ordering_accepts_earlier_time() {
        let t = Expr::term("t1");
        t.set_creation_time(5);
        let v = Expr::variable("v1");
        v.set_creation_time(2);
        assert!(unify(&t, &v).is_some());
    }

    #[test]
    fn predicate_unification_merges_substitutions_pairwise() {
        let t1 = Expr::term("t1");
        let t2 = Expr::term("t2");
        let lhs = Expr::predicate("R", vec![t1.clone(), t2.clone()]);
        let rhs = Expr::predicate(
            "R",
            vec![
                Expr::functor("a", vec![]),
                Expr::functor("f", vec![t1.clone()]),
            ],
        );
        let sub = unify(&lhs, &rhs).expect("should unify");
        assert_eq!(sub.apply(&t1), Expr::functor("a", vec![]));
        assert_eq!(
            sub.apply(&t2),
            Expr::functor("f", vec![Expr::functor("a", vec![])])
        );
    }

    #[test]
    fn mismatched_predicate_name_fails() {
        let a = Expr::predicate("P", vec![Expr::term("t1")]);
        let b = Expr::predicate("Q", vec![Expr::term("t1")]);
        assert!(unify(&a, &b).is_none());
    }

    #[test]
    fn mismatched_arity_fails() {
        let a = Expr::predicate("P", vec![Expr::term("t1")]);
        let b = Expr::predicate("P", vec![Expr::term("t1"), Expr::term("t2")]);
        assert!(unify(&a, &b).is_none());
    }

    #[test]
    fn unify_list_threads_substitution_across_pairs() {
        let t1 = Expr::term("t1");
        let pairs = vec![
            (t1.clone(), Expr::functor("a", vec![])),
            (
                Expr::functor("f", vec![t1.clone()]),
                Expr::functor("f", vec![Expr::functor("a", vec![])]),
            ),
        ];
        assert!(unify_list(&pairs).is_some());
    }
}

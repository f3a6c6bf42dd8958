//! Data structures and algorithms for first-order terms and formulas.

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHashSet;

/// The search depth at which an expression was instantiated.
///
/// Used by the unifier to enforce the eigenvariable condition (see [crate::core::unify]).
/// Monotonic within a single search: [Expr::set_creation_time] only ever moves it forward.
pub type Time = u32;

/// An immutable term or formula of first-order logic.
///
/// Structurally, this is a tagged tree: every composite variant owns its children directly (no
/// arena, no shared identifiers), since the algebra here has no analogue to a feature-model
/// formula's structural-sharing DAG — each sequent clones whichever subtrees it needs, and the
/// only thing ever mutated in place on an existing tree is [Expr::creation_time].
///
/// Equality and hashing are structural and deliberately ignore `creation_time`: two expressions
/// that print identically are the same logical object regardless of when they were instantiated.
#[derive(Debug, Clone)]
pub struct Expr {
    kind: Box<ExprKind>,
    creation_time: Cell<Time>,
}

/// The shape of an [Expr], without its creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ExprKind {
    /// A bound or free logical variable (an eigenvariable once introduced by the prover).
    Variable(String),

    /// A unification term (metavariable), unifiable against any expression.
    Term(String),

    /// An applied function symbol `f(e1, .., en)`.
    Functor(String, Vec<Expr>),

    /// An atomic predicate `P(e1, .., en)`. Treated as a formula, never expanded by the prover.
    Predicate(String, Vec<Expr>),

    /// Negation.
    Not(Expr),

    /// Conjunction.
    And(Expr, Expr),

    /// Disjunction.
    Or(Expr, Expr),

    /// Implication.
    Implies(Expr, Expr),

    /// Universal quantification over a variable name.
    ForAll(String, Expr),

    /// Existential quantification over a variable name.
    ThereExists(String, Expr),
}

/// Which of the two syntactically-applied variants an expression is.
///
/// Kept distinct from the name/arity check in [Expr::as_application] so that a [Functor] and a
/// [Predicate] that happened to share a name could never be unified against each other, even
/// though the surface lexical convention (§3) never produces such a collision for well-formed
/// input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApplicationRole {
    Functor,
    Predicate,
}

/// The top-level connective of a formula, as returned by [Expr::connective].
pub(crate) enum Connective<'a> {
    /// A `Predicate`: atomic, never expanded by the prover.
    Atomic,
    Not(&'a Expr),
    And(&'a Expr, &'a Expr),
    Or(&'a Expr, &'a Expr),
    Implies(&'a Expr, &'a Expr),
    ForAll(&'a str, &'a Expr),
    ThereExists(&'a str, &'a Expr),
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

/// Constructors, one per variant in the surface algebra.
impl Expr {
    fn new(kind: ExprKind) -> Self {
        Expr {
            kind: Box::new(kind),
            creation_time: Cell::new(0),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Variable(name.into()))
    }

    pub fn term(name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Term(name.into()))
    }

    pub fn functor(name: impl Into<String>, children: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Functor(name.into(), children))
    }

    pub fn predicate(name: impl Into<String>, children: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Predicate(name.into(), children))
    }

    pub fn not(inner: Expr) -> Self {
        Expr::new(ExprKind::Not(inner))
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Expr::new(ExprKind::And(lhs, rhs))
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Expr::new(ExprKind::Or(lhs, rhs))
    }

    pub fn implies(lhs: Expr, rhs: Expr) -> Self {
        Expr::new(ExprKind::Implies(lhs, rhs))
    }

    pub fn for_all(variable: impl Into<String>, body: Expr) -> Self {
        Expr::new(ExprKind::ForAll(variable.into(), body))
    }

    pub fn there_exists(variable: impl Into<String>, body: Expr) -> Self {
        Expr::new(ExprKind::ThereExists(variable.into(), body))
    }

    /// True iff this expression is a [Predicate], the only variant the prover treats as atomic.
    pub fn is_atomic(&self) -> bool {
        matches!(&*self.kind, ExprKind::Predicate(..))
    }

    /// True iff this expression is a [Variable].
    pub fn is_variable(&self) -> bool {
        matches!(&*self.kind, ExprKind::Variable(_))
    }

    /// True iff this expression is a [Term] (a unification metavariable).
    pub fn is_term(&self) -> bool {
        matches!(&*self.kind, ExprKind::Term(_))
    }

    /// The creation time most recently assigned by [Expr::set_creation_time].
    pub fn creation_time(&self) -> Time {
        self.creation_time.get()
    }

    /// Returns `(role, name, children)` if this expression is a `Functor` or `Predicate`.
    ///
    /// Exposed so [crate::core::unify] can pattern-match on applications without the unifier
    /// needing to reach into [ExprKind] directly (it stays private to this module).
    pub(crate) fn as_application(&self) -> Option<(ApplicationRole, &str, &[Expr])> {
        match &*self.kind {
            ExprKind::Functor(name, children) => {
                Some((ApplicationRole::Functor, name.as_str(), children.as_slice()))
            }
            ExprKind::Predicate(name, children) => {
                Some((ApplicationRole::Predicate, name.as_str(), children.as_slice()))
            }
            _ => None,
        }
    }

    /// The name of this expression, if it is a [Variable] or [Term].
    ///
    /// Used by [crate::core::sequent::Sequent::fresh_name] to check a candidate name against
    /// every variable and term already in play.
    pub(crate) fn name(&self) -> Option<&str> {
        match &*self.kind {
            ExprKind::Variable(name) | ExprKind::Term(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// The top-level logical connective of this expression, for rule dispatch in
    /// [crate::core::prover].
    ///
    /// Must only be called on a formula (a [Predicate] or one of the connective/quantifier
    /// variants); calling it on a bare [Variable], [Term], or [Functor] is a logic error in the
    /// caller, since those never appear directly on a sequent side.
    pub(crate) fn connective(&self) -> Connective<'_> {
        match &*self.kind {
            ExprKind::Predicate(..) => Connective::Atomic,
            ExprKind::Not(inner) => Connective::Not(inner),
            ExprKind::And(a, b) => Connective::And(a, b),
            ExprKind::Or(a, b) => Connective::Or(a, b),
            ExprKind::Implies(a, b) => Connective::Implies(a, b),
            ExprKind::ForAll(variable, body) => Connective::ForAll(variable, body),
            ExprKind::ThereExists(variable, body) => Connective::ThereExists(variable, body),
            ExprKind::Variable(_) | ExprKind::Term(_) | ExprKind::Functor(..) => {
                unreachable!("connective() called on a non-formula expression")
            }
        }
    }

    fn children(&self) -> Vec<&Expr> {
        match &*self.kind {
            ExprKind::Variable(_) | ExprKind::Term(_) => vec![],
            ExprKind::Functor(_, children) | ExprKind::Predicate(_, children) => {
                children.iter().collect()
            }
            ExprKind::Not(inner) => vec![inner],
            ExprKind::And(a, b) | ExprKind::Or(a, b) | ExprKind::Implies(a, b) => vec![a, b],
            ExprKind::ForAll(_, body) | ExprKind::ThereExists(_, body) => vec![body],
        }
    }

    /// Assigns `time` to this expression and, recursively, to every child.
    ///
    /// For [Variable] and [Term], `time` is simply this node's scalar attribute. For composite
    /// expressions, `time` is stored on the node itself in addition to being propagated to
    /// children, so [Expr::max_creation_time] can be computed by a single bottom-up fold.
    pub fn set_creation_time(&self, time: Time) {
        self.creation_time.set(time);
        for child in self.children() {
            child.set_creation_time(time);
        }
    }

    /// The maximum creation time over this expression and every subexpression.
    ///
    /// Used by the unifier's eigenvariable-ordering check: a replacement expression may have been
    /// built out of subterms stamped at different times (e.g. a `Functor` applied to terms
    /// introduced at different points in the search), so a single scalar read of the root's own
    /// `creation_time` would not suffice.
    pub fn max_creation_time(&self) -> Time {
        self.children()
            .into_iter()
            .map(Expr::max_creation_time)
            .fold(self.creation_time(), Time::max)
    }

    /// True iff the unification term `term` occurs anywhere in this expression.
    ///
    /// `term` must itself be a [Term]; this is the occurs check used before binding a term to a
    /// replacement (see [crate::core::unify::unify]).
    pub fn occurs(&self, term: &Expr) -> bool {
        debug_assert!(term.is_term());
        self == term || self.children().into_iter().any(|child| child.occurs(term))
    }

    /// The free [Variable]s of this expression (never [Term]s).
    pub fn free_variables(&self) -> FxHashSet<Expr> {
        match &*self.kind {
            ExprKind::Variable(_) => FxHashSet::from_iter([self.clone()]),
            ExprKind::Term(_) => FxHashSet::default(),
            ExprKind::ForAll(variable, body) | ExprKind::ThereExists(variable, body) => {
                let mut result = body.free_variables();
                result.remove(&Expr::variable(variable.clone()));
                result
            }
            _ => self
                .children()
                .into_iter()
                .flat_map(Expr::free_variables)
                .collect(),
        }
    }

    /// The free [Term]s of this expression (never [Variable]s).
    ///
    /// Quantifiers bind a [Variable], not a [Term], so they never remove anything here.
    pub fn free_terms(&self) -> FxHashSet<Expr> {
        match &*self.kind {
            ExprKind::Term(_) => FxHashSet::from_iter([self.clone()]),
            ExprKind::Variable(_) => FxHashSet::default(),
            _ => self
                .children()
                .into_iter()
                .flat_map(Expr::free_terms)
                .collect(),
        }
    }

    /// Returns a new expression with every subtree structurally equal to `current` replaced by
    /// `new`.
    ///
    /// Quantifier bodies (and bound variables) are substituted without any capture avoidance;
    /// soundness instead rests on `new` always being a name fresh enough to avoid capture (see
    /// [crate::core::sequent::Sequent::fresh_name]).
    pub fn replace(&self, current: &Expr, new: &Expr) -> Expr {
        if self == current {
            return new.clone();
        }
        match &*self.kind {
            ExprKind::Variable(_) | ExprKind::Term(_) => self.clone(),
            ExprKind::Functor(name, children) => Expr::functor(
                name.clone(),
                children.iter().map(|c| c.replace(current, new)).collect(),
            ),
            ExprKind::Predicate(name, children) => Expr::predicate(
                name.clone(),
                children.iter().map(|c| c.replace(current, new)).collect(),
            ),
            ExprKind::Not(inner) => Expr::not(inner.replace(current, new)),
            ExprKind::And(a, b) => Expr::and(a.replace(current, new), b.replace(current, new)),
            ExprKind::Or(a, b) => Expr::or(a.replace(current, new), b.replace(current, new)),
            ExprKind::Implies(a, b) => {
                Expr::implies(a.replace(current, new), b.replace(current, new))
            }
            ExprKind::ForAll(variable, body) => Expr::for_all(
                variable.clone(),
                body.replace(current, new),
            ),
            ExprKind::ThereExists(variable, body) => Expr::there_exists(
                variable.clone(),
                body.replace(current, new),
            ),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &*self.kind {
            ExprKind::Variable(name) | ExprKind::Term(name) => write!(f, "{name}"),
            ExprKind::Functor(name, children) | ExprKind::Predicate(name, children) => {
                if children.is_empty() {
                    write!(f, "{name}")
                } else {
                    write!(f, "{name}(")?;
                    for (i, child) in children.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{child}")?;
                    }
                    write!(f, ")")
                }
            }
            ExprKind::Not(inner) => write!(f, "\u{ac}{inner}"),
            ExprKind::And(a, b) => write!(f, "({a} \u{2227} {b})"),
            ExprKind::Or(a, b) => write!(f, "({a} \u{2228} {b})"),
            ExprKind::Implies(a, b) => write!(f, "({a} \u{2192} {b})"),
            ExprKind::ForAll(variable, body) => write!(f, "(\u{2200}{variable}. {body})"),
            ExprKind::ThereExists(variable, body) => write!(f, "(\u{2203}{variable}. {body})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_canonical_form() {
        let p = Expr::predicate("P", vec![Expr::variable("x")]);
        assert_eq!(p.to_string(), "P(x)");
        let not_p = Expr::not(p.clone());
        assert_eq!(not_p.to_string(), "\u{ac}P(x)");
        let all_x_p = Expr::for_all("x", p);
        assert_eq!(all_x_p.to_string(), "(\u{2200}x. P(x))");
    }

    #[test]
    fn equality_ignores_creation_time() {
        let a = Expr::variable("x");
        let b = Expr::variable("x");
        a.set_creation_time(3);
        b.set_creation_time(7);
        assert_eq!(a, b);
        let mut hasher_a = rustc_hash::FxHasher::default();
        let mut hasher_b = rustc_hash::FxHasher::default();
        a.hash(&mut hasher_a);
        b.hash(&mut hasher_b);
        use std::hash::Hasher as _;
        assert_eq!(hasher_a.finish(), hasher_b.finish());
    }

    #[test]
    fn free_variables_excludes_bound_variable() {
        let px = Expr::predicate("P", vec![Expr::variable("x")]);
        let all_x_p = Expr::for_all("x", px.clone());
        assert!(all_x_p.free_variables().is_empty());
        let exists_x_p = Expr::there_exists("x", px);
        assert!(exists_x_p.free_variables().is_empty());
    }

    #[test]
    fn free_terms_are_distinct_from_free_variables() {
        let expr = Expr::predicate("P", vec![Expr::variable("x"), Expr::term("t1")]);
        assert_eq!(expr.free_variables(), FxHashSet::from_iter([Expr::variable("x")]));
        assert_eq!(expr.free_terms(), FxHashSet::from_iter([Expr::term("t1")]));
    }

    #[test]
    fn occurs_check_finds_nested_term() {
        let t = Expr::term("t1");
        let nested = Expr::functor("f", vec![Expr::variable("x"), t.clone()]);
        assert!(nested.occurs(&t));
        assert!(!nested.occurs(&Expr::term("t2")));
    }

    #[test]
    fn replace_substitutes_every_occurrence() {
        let x = Expr::variable("x");
        let a = Expr::functor("a", vec![]);
        let formula = Expr::and(
            Expr::predicate("P", vec![x.clone()]),
            Expr::predicate("Q", vec![x.clone()]),
        );
        let replaced = formula.replace(&x, &a);
        assert_eq!(replaced.to_string(), "(P(a) \u{2227} Q(a))");
    }

    #[test]
    fn replace_is_idempotent_when_new_does_not_contain_current() {
        let t = Expr::term("t1");
        let a = Expr::functor("a", vec![]);
        let formula = Expr::predicate("P", vec![t.clone()]);
        let once = formula.replace(&t, &a);
        let twice = once.replace(&t, &a);
        assert_eq!(once, twice);
    }

    #[test]
    fn set_creation_time_propagates_to_children() {
        let formula = Expr::and(
            Expr::predicate("P", vec![Expr::variable("x")]),
            Expr::predicate("Q", vec![Expr::variable("y")]),
        );
        formula.set_creation_time(5);
        assert_eq!(formula.max_creation_time(), 5);
    }
}

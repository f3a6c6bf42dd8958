//! Surface-syntax parser for first-order formulas.
//!
//! Turns `not`/`and`/`or`/`implies`/`forall`/`exists` (or their Unicode equivalents, as rendered by
//! [Expr]'s `Display`), lowercase variable/functor identifiers, uppercase predicate identifiers, and
//! `f(a, b)` application into [Expr] trees.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::core::algebra::Expr;

#[derive(Parser)]
#[grammar = "parser/formula.pest"]
struct FormulaParser;

/// A surface-syntax parse failure, carrying the underlying `pest` diagnostic (which already
/// renders a source excerpt and expected-token summary).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ParseError(#[from] Box<pest::error::Error<Rule>>);

/// Parses a single formula from its surface-syntax text.
pub fn parse_formula(input: &str) -> Result<Expr, ParseError> {
    let mut pairs =
        FormulaParser::parse(Rule::formula, input).map_err(|e| ParseError(Box::new(e)))?;
    let formula_pair = pairs.next().expect("formula rule always matches once on success");
    let expr_pair = formula_pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .expect("formula rule always contains an expr");
    Ok(build_expr(expr_pair))
}

fn build_args(pair: Pair<Rule>) -> Vec<Expr> {
    pair.into_inner().map(build_expr).collect()
}

fn build_expr(pair: Pair<Rule>) -> Expr {
    match pair.as_rule() {
        Rule::expr => build_expr(pair.into_inner().next().unwrap()),
        Rule::implies_expr => {
            let mut inner = pair.into_inner();
            let lhs = build_expr(inner.next().unwrap());
            match inner.next() {
                Some(rhs) => Expr::implies(lhs, build_expr(rhs)),
                None => lhs,
            }
        }
        Rule::or_expr => {
            let mut inner = pair.into_inner();
            let mut acc = build_expr(inner.next().unwrap());
            for next in inner {
                acc = Expr::or(acc, build_expr(next));
            }
            acc
        }
        Rule::and_expr => {
            let mut inner = pair.into_inner();
            let mut acc = build_expr(inner.next().unwrap());
            for next in inner {
                acc = Expr::and(acc, build_expr(next));
            }
            acc
        }
        Rule::not_expr => Expr::not(build_expr(pair.into_inner().next().unwrap())),
        Rule::group => build_expr(pair.into_inner().next().unwrap()),
        Rule::forall => {
            let mut inner = pair.into_inner();
            let variable = inner.next().unwrap().as_str().to_owned();
            let body = build_expr(inner.next().unwrap());
            Expr::for_all(variable, body)
        }
        Rule::exists => {
            let mut inner = pair.into_inner();
            let variable = inner.next().unwrap().as_str().to_owned();
            let body = build_expr(inner.next().unwrap());
            Expr::there_exists(variable, body)
        }
        Rule::predicate => {
            let mut inner = pair.into_inner();
            let name = inner.next().unwrap().as_str().to_owned();
            let children = inner.next().map(build_args).unwrap_or_default();
            Expr::predicate(name, children)
        }
        Rule::application => {
            let mut inner = pair.into_inner();
            let name = inner.next().unwrap().as_str().to_owned();
            let children = build_args(inner.next().unwrap());
            Expr::functor(name, children)
        }
        Rule::atom => Expr::variable(pair.as_str()),
        rule => unreachable!("build_expr called on non-expression rule {rule:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_propositional_implication() {
        let expr = parse_formula("P implies P").unwrap();
        assert_eq!(expr.to_string(), "(P \u{2192} P)");
    }

    #[test]
    fn parses_negation_conjunction_disjunction() {
        let expr = parse_formula("not (A or B) implies (not A and not B)").unwrap();
        assert_eq!(
            expr.to_string(),
            "(\u{ac}(A \u{2228} B) \u{2192} (\u{ac}A \u{2227} \u{ac}B))"
        );
    }

    #[test]
    fn parses_quantifiers_and_application() {
        let expr = parse_formula("forall x. P(x)").unwrap();
        assert_eq!(expr.to_string(), "(\u{2200}x. P(x))");
        let expr = parse_formula("exists x. P(f(x, a))").unwrap();
        assert_eq!(expr.to_string(), "(\u{2203}x. P(f(x, a)))");
    }

    #[test]
    fn implies_is_right_associative() {
        let expr = parse_formula("A implies B implies C").unwrap();
        assert_eq!(expr.to_string(), "(A \u{2192} (B \u{2192} C))");
    }

    #[test]
    fn round_trips_through_display() {
        let expr = parse_formula("forall x. (P(x) implies exists y. Q(x, y))").unwrap();
        let rendered = expr.to_string();
        let reparsed = parse_formula(&rendered).unwrap();
        assert_eq!(expr, reparsed);
    }

    #[test]
    fn parses_unicode_operators_rendered_by_display() {
        let expr = parse_formula("¬(A ∨ B) → (¬A ∧ ¬B)").unwrap();
        assert_eq!(
            expr.to_string(),
            "(\u{ac}(A \u{2228} B) \u{2192} (\u{ac}A \u{2227} \u{ac}B))"
        );
        let quantified = parse_formula("∀x. (P(x) → ∃y. Q(x, y))").unwrap();
        let ascii_equivalent =
            parse_formula("forall x. (P(x) implies exists y. Q(x, y))").unwrap();
        assert_eq!(quantified, ascii_equivalent);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_formula("P(").is_err());
        assert!(parse_formula("forall . P(x)").is_err());
    }

    #[test]
    fn keywords_are_not_usable_as_identifiers() {
        // "notable" starts with the reserved word "not" but is a distinct identifier.
        let expr = parse_formula("notable").unwrap();
        assert_eq!(expr.to_string(), "notable");
    }
}

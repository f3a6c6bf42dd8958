//! entail decides whether a first-order goal formula follows from a set of axioms, via Gentzen-
//! style sequent proof search with unification-driven quantifier instantiation.
//!
//! * entail should be called from a binary crate via [shell::main]; use in library crates beyond
//!   that is not intended.
//! * As a starting point in this documentation, see [core::algebra::Expr] and [core::prover::prove]
//!   for the central data type and algorithm.

#![allow(rustdoc::private_intra_doc_links)]

mod core;
mod panic;
mod parser;
pub mod shell;
mod util;

pub use crate::core::algebra::Expr;
pub use crate::core::prover::{prove, prove_bounded};
pub use crate::panic::install_panic_hook;

//! Abbreviation extraction for one-loop diagram code generation.
//!
//! A batch pipeline that deduplicates repeated symbolic subexpressions in
//! large polynomial expressions by replacing each structurally distinct
//! bracketed subexpression with a stable abbreviation symbol, then runs a
//! common-subexpression optimization pass and splits the result into two
//! tagged contributions before emitting the generated artifact streams.
//!
//! # Pipeline
//!
//! ```text
//! canonicalize → extract abbreviations → optimize (CSE) → split → emit
//! ```
//!
//! - [`canon`]: normal form (sorted monomial sums, exact rational
//!   coefficients) and bracket/anti-bracket grouping.
//! - [`abbrev`]: the fixed-point extraction loop, the run-scoped
//!   abbreviation table, and the append-only record stream.
//! - [`optimize`]: common-subexpression elimination in its own namespace.
//! - [`split`]: projection onto the two mutually exclusive indicator tags.
//! - [`emit`]: the optimized-expression and generated-procedure streams.
//! - [`process_diagram`]: drives one diagram through all stages.
//!
//! # Example
//!
//! ```
//! use loopabbr::{AbbrevTable, DiagramConfig, Expr, process_diagram};
//!
//! // CC*(s12 + mT^2) + R2*(s12 + mT^2): one shared subexpression.
//! let shared = Expr::sum(vec![
//!     Expr::symbol("s12"),
//!     Expr::pow(Expr::symbol("mT"), Expr::integer(2)),
//! ]);
//! let expr = Expr::sum(vec![
//!     Expr::product(vec![Expr::symbol("CC"), shared.clone()]),
//!     Expr::product(vec![Expr::symbol("R2"), shared]),
//! ]);
//!
//! let cfg = DiagramConfig::new("1")
//!     .symbols(["Qspk1"])
//!     .generated_on("2026-08-07");
//! let mut table = AbbrevTable::new();
//! let (mut records, mut optimized, mut procedure) = (Vec::new(), Vec::new(), Vec::new());
//!
//! let summary = process_diagram(
//!     &expr, &cfg, &mut table, &mut records, &mut optimized, &mut procedure,
//! )
//! .expect("pipeline run");
//! assert_eq!(summary.new_abbreviations, 1);
//! ```

mod canon;
mod config;
mod display;
mod emit;
mod error;
mod optimize;
mod pipeline;
mod split;

pub mod abbrev;
pub(crate) mod core;

#[cfg(test)]
mod tests;

// Re-export the public surface.
pub use crate::abbrev::{AbbrevEntry, AbbrevTable, RecordWriter, extract_abbreviations};
pub use crate::canon::{BracketMode, SymbolSet, normalize};
pub use crate::config::{DiagramConfig, Leg, kinematic_symbols};
pub use crate::core::expr::{Expr, ExprKind, replace_all, substitute_symbols};
pub use crate::core::symbol::{
    InternedSymbol, Symbol, SymbolError, symb, symb_get, symbol_count, symbol_exists,
};
pub use crate::emit::{write_optimized_stream, write_procedure_stream};
pub use crate::error::AbbrevError;
pub use crate::optimize::{Optimized, optimize};
pub use crate::pipeline::{RunSummary, process_diagram};
pub use crate::split::{SplitComponents, split};

//! The fixed-point abbreviation-extraction loop.
//!
//! The expression is first canonicalized and bracketed so every candidate
//! subexpression appears as a single-argument head application. The loop then
//! repeats: find one not-yet-abbreviated bracket argument (in canonical term
//! order), assign it a sequence number — reusing the table entry when a
//! syntactically identical pattern was already captured — and rewrite *every*
//! occurrence of that exact argument to the abbreviation symbol. The search
//! is "find one", the rewrite is "replace all". The loop terminates when no
//! bracket application remains; each iteration retires at least one distinct
//! argument, which bounds the iteration count.
//!
//! Pre-pass before the loop: bracket content that is a bare number is folded
//! into its parent (numbers never consume a sequence number; the grouping
//! step already guarantees this), and content that is a bare symbol issued
//! earlier by the same table is folded back likewise, so re-running
//! extraction on fully abbreviated input allocates nothing.

use std::io;

use log::{debug, trace};
use rustc_hash::FxHashSet;

use super::{AbbrevTable, RecordWriter};
use crate::canon::{BracketMode, SymbolSet, bracket_terms, normalize};
use crate::core::expr::{Expr, ExprKind, replace_all};
use crate::core::symbol::{InternedSymbol, symb_interned};
use crate::error::AbbrevError;

/// Reserved head used to mark collected bracket content during extraction.
const COLLECT_HEAD: &str = "__collect";

/// Extract abbreviations from `expr` under the given mode and symbol set,
/// assigning numbers under `prefix` in `table` and appending one record per
/// newly confirmed pattern to `writer`.
///
/// Returns the fully abbreviated expression in normal form.
///
/// # Errors
/// - [`AbbrevError::EmptySymbolSet`] if the symbol set is empty.
/// - [`AbbrevError::FixedPointOverrun`] if the loop fails to converge
///   (a caller-side contract violation; the bound is defensive).
/// - [`AbbrevError::Io`] on record sink failures.
pub fn extract_abbreviations<W: io::Write>(
    expr: &Expr,
    symbols: &SymbolSet,
    mode: BracketMode,
    prefix: &str,
    table: &mut AbbrevTable,
    writer: &mut RecordWriter<W>,
) -> Result<Expr, AbbrevError> {
    if symbols.is_empty() {
        return Err(AbbrevError::EmptySymbolSet);
    }

    let head = symb_interned(COLLECT_HEAD);
    let bracketed = bracket_terms(expr, symbols, mode, &head);
    let mut current = fold_resolved(&bracketed, &head, table);

    // Each iteration must retire one distinct argument; anything beyond this
    // bound means the rewrite is not making progress.
    let bound = distinct_args(&current, &head).len() + 1;

    for iteration in 0..bound {
        let Some(pattern) = first_bracket_arg(&current, &head) else {
            debug!("extraction for prefix '{prefix}' reached fixed point after {iteration} iterations");
            return Ok(current);
        };

        let seq = match table.lookup(prefix, &pattern) {
            Some(seq) => {
                trace!("reusing {prefix}{seq} for repeated pattern");
                seq
            }
            None => {
                let reservation = table.reserve(prefix);
                let entry = table.confirm(reservation, pattern.clone());
                writer.record(entry)?;
                trace!("allocated {} = {}", entry.name(), entry.pattern);
                entry.seq
            }
        };

        let abbreviation = Expr::symbol(format!("{prefix}{seq}"));
        let target = Expr::bracket(head.clone(), pattern);
        // Replace all occurrences, then re-normalize: the matching step
        // assumes a canonical, fully up-to-date snapshot on every pass.
        current = normalize(&replace_all(&current, &target, &abbreviation));
    }

    Err(AbbrevError::FixedPointOverrun { iterations: bound })
}

/// Fold away bracket applications whose content is already resolved: a bare
/// abbreviation symbol issued by this table substitutes back to itself.
fn fold_resolved(expr: &Expr, head: &InternedSymbol, table: &AbbrevTable) -> Expr {
    fn walk(e: &Expr, head: &InternedSymbol, table: &AbbrevTable) -> Expr {
        match &e.kind {
            ExprKind::Bracket { head: h, arg } if h == head => {
                if let ExprKind::Symbol(s) = &arg.kind {
                    if table.is_issued(s.id()) {
                        return (**arg).clone();
                    }
                }
                e.clone()
            }
            ExprKind::Sum(terms) => {
                Expr::sum(terms.iter().map(|t| walk(t, head, table)).collect())
            }
            ExprKind::Product(factors) => {
                Expr::product(factors.iter().map(|f| walk(f, head, table)).collect())
            }
            _ => e.clone(),
        }
    }
    normalize(&walk(expr, head, table))
}

/// All distinct bracket arguments present in the expression.
fn distinct_args(expr: &Expr, head: &InternedSymbol) -> FxHashSet<Expr> {
    fn walk(e: &Expr, head: &InternedSymbol, out: &mut FxHashSet<Expr>) {
        match &e.kind {
            ExprKind::Bracket { head: h, arg } => {
                if h == head {
                    out.insert((**arg).clone());
                }
            }
            ExprKind::Sum(children) | ExprKind::Product(children) => {
                for child in children {
                    walk(child, head, out);
                }
            }
            ExprKind::Pow(base, exp) => {
                walk(base, head, out);
                walk(exp, head, out);
            }
            ExprKind::Number(_) | ExprKind::Symbol(_) => {}
        }
    }
    let mut out = FxHashSet::default();
    walk(expr, head, &mut out);
    out
}

/// The first bracket argument in canonical term order, if any remains.
fn first_bracket_arg(expr: &Expr, head: &InternedSymbol) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Sum(terms) => terms.iter().find_map(|t| term_bracket_arg(t, head)),
        _ => term_bracket_arg(expr, head),
    }
}

fn term_bracket_arg(term: &Expr, head: &InternedSymbol) -> Option<Expr> {
    match &term.kind {
        ExprKind::Bracket { head: h, arg } if h == head => Some((**arg).clone()),
        ExprKind::Product(factors) => factors.iter().find_map(|f| match &f.kind {
            ExprKind::Bracket { head: h, arg } if h == head => Some((**arg).clone()),
            _ => None,
        }),
        _ => None,
    }
}

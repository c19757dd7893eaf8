//! Rewriting passes: replace-all substitution over whole subtrees and
//! symbol-for-value substitution.
//!
//! Both passes share unchanged subtrees: a node is rebuilt only when one of
//! its children actually changed, otherwise the original `Arc` is reused.
//! Rebuilt nodes go through the smart constructors, so numeric folding
//! applies along the rewritten spine (a product that picks up a zero factor
//! collapses immediately).

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{Expr, ExprKind};

/// Replace every occurrence of `target` (an exact subtree) with `replacement`.
///
/// The search is "replace all": one call rewrites every occurrence anywhere
/// in the tree, which is what the fixed-point extraction loop relies on.
#[must_use]
pub fn replace_all(expr: &Expr, target: &Expr, replacement: &Expr) -> Expr {
    if expr == target {
        return replacement.clone();
    }
    match walk(expr, target, replacement) {
        Some(rewritten) => rewritten,
        None => expr.clone(),
    }
}

/// Returns `Some(rewritten)` if anything under `expr` matched, else `None`.
fn walk(expr: &Expr, target: &Expr, replacement: &Expr) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Number(_) | ExprKind::Symbol(_) => None,
        ExprKind::Bracket { head, arg } => {
            let new_arg = walk_arc(arg, target, replacement)?;
            Some(Expr::bracket(head.clone(), Expr::unwrap_arc(new_arg)))
        }
        ExprKind::Sum(terms) => {
            let new_terms = walk_list(terms, target, replacement)?;
            Some(Expr::sum_from_arcs(new_terms))
        }
        ExprKind::Product(factors) => {
            let new_factors = walk_list(factors, target, replacement)?;
            Some(Expr::product_from_arcs(new_factors))
        }
        ExprKind::Pow(base, exp) => {
            let new_base = walk_arc(base, target, replacement);
            let new_exp = walk_arc(exp, target, replacement);
            if new_base.is_none() && new_exp.is_none() {
                return None;
            }
            let base = new_base.unwrap_or_else(|| Arc::clone(base));
            let exp = new_exp.unwrap_or_else(|| Arc::clone(exp));
            Some(Expr::pow_from_arcs(base, exp))
        }
    }
}

fn walk_arc(node: &Arc<Expr>, target: &Expr, replacement: &Expr) -> Option<Arc<Expr>> {
    if node.as_ref() == target {
        return Some(Arc::new(replacement.clone()));
    }
    walk(node, target, replacement).map(Arc::new)
}

fn walk_list(
    nodes: &[Arc<Expr>],
    target: &Expr,
    replacement: &Expr,
) -> Option<Vec<Arc<Expr>>> {
    let mut changed = false;
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match walk_arc(node, target, replacement) {
            Some(new_node) => {
                changed = true;
                out.push(new_node);
            }
            None => out.push(Arc::clone(node)),
        }
    }
    if changed { Some(out) } else { None }
}

/// Substitute symbols by expressions, keyed on the interned symbol id.
///
/// Used for the split-indicator projection (tag → 0/1) and for resolving
/// abbreviation symbols back to their table patterns.
#[must_use]
pub fn substitute_symbols(expr: &Expr, map: &FxHashMap<u64, Expr>) -> Expr {
    match subst_walk(expr, map) {
        Some(rewritten) => rewritten,
        None => expr.clone(),
    }
}

fn subst_walk(expr: &Expr, map: &FxHashMap<u64, Expr>) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Number(_) => None,
        ExprKind::Symbol(s) => map.get(&s.id()).cloned(),
        ExprKind::Bracket { head, arg } => {
            let new_arg = subst_walk(arg, map)?;
            Some(Expr::bracket(head.clone(), new_arg))
        }
        ExprKind::Sum(terms) => {
            let new_terms = subst_walk_list(terms, map)?;
            Some(Expr::sum_from_arcs(new_terms))
        }
        ExprKind::Product(factors) => {
            let new_factors = subst_walk_list(factors, map)?;
            Some(Expr::product_from_arcs(new_factors))
        }
        ExprKind::Pow(base, exp) => {
            let new_base = subst_walk(base, map);
            let new_exp = subst_walk(exp, map);
            if new_base.is_none() && new_exp.is_none() {
                return None;
            }
            let base = new_base.map_or_else(|| Arc::clone(base), Arc::new);
            let exp = new_exp.map_or_else(|| Arc::clone(exp), Arc::new);
            Some(Expr::pow_from_arcs(base, exp))
        }
    }
}

fn subst_walk_list(nodes: &[Arc<Expr>], map: &FxHashMap<u64, Expr>) -> Option<Vec<Arc<Expr>>> {
    let mut changed = false;
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match subst_walk(node, map) {
            Some(new_node) => {
                changed = true;
                out.push(Arc::new(new_node));
            }
            None => out.push(Arc::clone(node)),
        }
    }
    if changed { Some(out) } else { None }
}

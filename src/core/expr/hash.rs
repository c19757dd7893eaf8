//! Structural hashing for expression nodes.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use super::ExprKind;

/// Compute the structural hash of an expression kind.
///
/// Every `Expr` caches this value at construction time so equality checks can
/// reject mismatches in O(1) before falling back to a structural comparison.
pub fn compute_expr_hash(kind: &ExprKind) -> u64 {
    let mut hasher = FxHasher::default();
    kind.hash(&mut hasher);
    hasher.finish()
}

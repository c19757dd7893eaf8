//! Expression trees for polynomial amplitude algebra.
//!
//! This module defines:
//! - `Expr` - the central expression node type
//! - `ExprKind` - the node variants (Number, Symbol, Bracket, Sum, Product, Pow)
//!
//! # Architecture
//!
//! ## N-ary Sum/Product
//! Instead of binary `Add(left, right)`, sums and products are N-ary
//! (`Sum(Vec<Arc<Expr>>)`). Flattening happens in the constructors, and
//! like-term collection is a single O(N) pass in `canon::normalize`.
//!
//! ## Structural hashing
//! Each `Expr` carries a pre-computed `hash` for O(1) equality rejection.
//! Two expressions with different hashes are definitely not equal; equal
//! hashes fall back to a structural comparison. The abbreviation table and
//! the CSE pass both key on this.
//!
//! ## Exact coefficients
//! Numbers are exact rationals (`BigRational`); numeric folding never loses
//! precision, and "is this bracket content a bare number" is an exact test.
//!
//! ## Bracket heads
//! `Bracket { head, arg }` is the function-like wrapper that marks a
//! subexpression as one unit for abbreviation. The head is an interned
//! symbol; the argument is a full sub-expression.

mod constructors;
mod hash;
mod ordering;
mod subst;

pub use hash::compute_expr_hash;
pub use ordering::{expr_cmp, expr_cmp_type_strict};
pub use subst::{replace_all, substitute_symbols};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use num_rational::BigRational;
use num_traits::Zero;

use crate::core::symbol::InternedSymbol;

// =============================================================================
// EXPRESSION ID COUNTER AND CACHED CONSTANTS
// =============================================================================

static EXPR_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

pub(crate) fn next_id() -> u64 {
    EXPR_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Cached `Arc<Expr>` for 0, used during Drop to swap out children without
/// allocating.
static DUMMY_ARC: LazyLock<Arc<Expr>> = LazyLock::new(|| {
    let kind = ExprKind::Number(BigRational::zero());
    Arc::new(Expr {
        id: 0,
        hash: compute_expr_hash(&kind),
        kind,
    })
});

// =============================================================================
// EXPR - The main expression type
// =============================================================================

/// A symbolic expression.
///
/// Immutable once built; rewriting (substitution, normalization) produces new
/// trees, sharing unchanged subtrees through `Arc`.
#[derive(Debug, Clone)]
pub struct Expr {
    /// Unique id for debugging (not part of equality).
    pub(crate) id: u64,
    /// Structural hash for O(1) equality rejection.
    pub(crate) hash: u64,
    /// The node structure.
    pub(crate) kind: ExprKind,
}

impl Expr {
    /// The node structure.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// The pre-computed structural hash.
    #[inline]
    #[must_use]
    pub const fn structural_hash(&self) -> u64 {
        self.hash
    }
}

// Structural equality based on kind only (with hash fast-reject).
impl PartialEq for Expr {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        if self.hash != other.hash {
            return false;
        }
        self.kind == other.kind
    }
}

impl Eq for Expr {}

impl std::hash::Hash for Expr {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

// =============================================================================
// EXPRKIND
// =============================================================================

/// The kind (structure) of an expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Exact rational constant.
    Number(BigRational),

    /// Interned symbol (kinematic invariant, coupling, tag, abbreviation, ...).
    Symbol(InternedSymbol),

    /// Bracket head application: a wrapper marking `arg` as one candidate
    /// unit for abbreviation.
    Bracket {
        /// The wrapper symbol.
        head: InternedSymbol,
        /// The wrapped sub-expression.
        arg: Arc<Expr>,
    },

    /// N-ary sum: a + b + c + ...
    /// Stored flat; subtraction is `Sum([a, Product([-1, b])])`.
    Sum(Vec<Arc<Expr>>),

    /// N-ary product: a * b * c * ...
    /// Stored flat and sorted into canonical factor order at construction.
    Product(Vec<Arc<Expr>>),

    /// Exponentiation (binary, not associative).
    Pow(Arc<Expr>, Arc<Expr>),
}

// =============================================================================
// DROP IMPLEMENTATION - iterative drop to prevent stack overflow
// =============================================================================

impl Drop for Expr {
    fn drop(&mut self) {
        fn drain_children(kind: &mut ExprKind, queue: &mut Vec<Arc<Expr>>) {
            match kind {
                ExprKind::Sum(terms) => queue.extend(std::mem::take(terms)),
                ExprKind::Product(factors) => queue.extend(std::mem::take(factors)),
                ExprKind::Bracket { arg, .. } => {
                    queue.push(std::mem::replace(arg, Arc::clone(&DUMMY_ARC)));
                }
                ExprKind::Pow(base, exp) => {
                    queue.push(std::mem::replace(base, Arc::clone(&DUMMY_ARC)));
                    queue.push(std::mem::replace(exp, Arc::clone(&DUMMY_ARC)));
                }
                ExprKind::Number(_) | ExprKind::Symbol(_) => {}
            }
        }

        let mut work_queue = Vec::new();
        drain_children(&mut self.kind, &mut work_queue);

        while let Some(child_arc) = work_queue.pop() {
            if let Ok(mut child_expr) = Arc::try_unwrap(child_arc) {
                drain_children(&mut child_expr.kind, &mut work_queue);
            }
        }
    }
}

// =============================================================================
// HASH FOR EXPRKIND
// =============================================================================

impl std::hash::Hash for ExprKind {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Number(n) => n.hash(state),
            Self::Symbol(s) => s.hash(state),
            Self::Bracket { head, arg } => {
                head.hash(state);
                arg.hash.hash(state);
            }
            // Commutative hash (sum of child hashes) so that ordering of the
            // stored vector never affects the value; constructors sort
            // products but sums stay unsorted until normalization.
            Self::Sum(terms) => {
                let mut acc: u64 = 0;
                for t in terms {
                    acc = acc.wrapping_add(t.hash);
                }
                acc.hash(state);
            }
            Self::Product(factors) => {
                let mut acc: u64 = 0;
                for f in factors {
                    acc = acc.wrapping_add(f.hash);
                }
                acc.hash(state);
            }
            Self::Pow(base, exp) => {
                base.hash.hash(state);
                exp.hash.hash(state);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Expression constructors.
//!
//! All construction goes through these smart constructors: nested sums and
//! products are flattened, numeric parts are folded exactly, and products are
//! sorted into canonical factor order. Sorting of sum *terms* is deferred to
//! `canon::normalize`, which also collects like terms.

use std::sync::Arc;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Pow, Signed, ToPrimitive, Zero};

use super::{Expr, ExprKind, compute_expr_hash, expr_cmp, next_id};
use crate::core::symbol::{InternedSymbol, symb_interned};

impl Expr {
    /// Create a new expression with a fresh id.
    #[must_use]
    pub fn new(kind: ExprKind) -> Self {
        let hash = compute_expr_hash(&kind);
        Self {
            id: next_id(),
            hash,
            kind,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The exact numeric value, if this node is a number.
    #[inline]
    #[must_use]
    pub const fn as_number(&self) -> Option<&BigRational> {
        match &self.kind {
            ExprKind::Number(n) => Some(n),
            _ => None,
        }
    }

    /// The interned symbol, if this node is a bare symbol.
    #[inline]
    #[must_use]
    pub const fn as_symbol(&self) -> Option<&InternedSymbol> {
        match &self.kind {
            ExprKind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Is this node exactly the number zero?
    #[inline]
    #[must_use]
    pub fn is_zero_num(&self) -> bool {
        self.as_number().is_some_and(Zero::is_zero)
    }

    /// Is this node exactly the number one?
    #[inline]
    #[must_use]
    pub fn is_one_num(&self) -> bool {
        self.as_number().is_some_and(One::is_one)
    }

    // -------------------------------------------------------------------------
    // Basic constructors
    // -------------------------------------------------------------------------

    /// Create a number from an exact rational.
    #[must_use]
    pub fn number(n: BigRational) -> Self {
        Self::new(ExprKind::Number(n))
    }

    /// Create an integer constant.
    #[must_use]
    pub fn integer(n: i64) -> Self {
        Self::number(BigRational::from_integer(BigInt::from(n)))
    }

    /// Create an exact fraction `num/den`.
    ///
    /// # Panics
    /// Panics if `den` is zero.
    #[must_use]
    pub fn rational(num: i64, den: i64) -> Self {
        Self::number(BigRational::new(BigInt::from(num), BigInt::from(den)))
    }

    /// Create a symbol expression (auto-interned).
    pub fn symbol(name: impl AsRef<str>) -> Self {
        Self::new(ExprKind::Symbol(symb_interned(name.as_ref())))
    }

    /// Create from an already-interned symbol.
    pub(crate) fn from_interned(interned: InternedSymbol) -> Self {
        Self::new(ExprKind::Symbol(interned))
    }

    /// Create a bracket head application wrapping `arg`.
    #[must_use]
    pub fn bracket(head: InternedSymbol, arg: Self) -> Self {
        Self::new(ExprKind::Bracket {
            head,
            arg: Arc::new(arg),
        })
    }

    // -------------------------------------------------------------------------
    // N-ary Sum constructor (flattens, folds numerics; term sort deferred)
    // -------------------------------------------------------------------------

    /// Create a sum. Nested sums are flattened and numeric terms folded into
    /// a single leading constant.
    #[must_use]
    pub fn sum(terms: Vec<Self>) -> Self {
        let arcs = terms.into_iter().map(Arc::new).collect();
        Self::sum_from_arcs(arcs)
    }

    /// Create a sum from `Arc` terms without cloning shared subtrees.
    #[must_use]
    pub fn sum_from_arcs(terms: Vec<Arc<Self>>) -> Self {
        let mut flat: Vec<Arc<Self>> = Vec::with_capacity(terms.len());
        let mut numeric_sum = BigRational::zero();

        for t in terms {
            match &t.kind {
                ExprKind::Number(n) => numeric_sum += n,
                ExprKind::Sum(_) => match Arc::try_unwrap(t) {
                    Ok(expr) => {
                        if let ExprKind::Sum(inner) = expr.kind.clone() {
                            for i in inner {
                                match &i.kind {
                                    ExprKind::Number(n) => numeric_sum += n,
                                    _ => flat.push(i),
                                }
                            }
                        }
                    }
                    Err(arc) => {
                        if let ExprKind::Sum(inner) = &arc.kind {
                            for i in inner {
                                match &i.kind {
                                    ExprKind::Number(n) => numeric_sum += n,
                                    _ => flat.push(Arc::clone(i)),
                                }
                            }
                        }
                    }
                },
                _ => flat.push(t),
            }
        }

        // Accumulated constant goes first (canonical order: numbers lead).
        if !numeric_sum.is_zero() {
            let mut with_num = Vec::with_capacity(flat.len() + 1);
            with_num.push(Arc::new(Self::number(numeric_sum)));
            with_num.extend(flat);
            flat = with_num;
        }

        match flat.len() {
            0 => Self::integer(0),
            1 => Self::unwrap_arc(flat.into_iter().next().expect("len checked")),
            _ => Self::new(ExprKind::Sum(flat)),
        }
    }

    // -------------------------------------------------------------------------
    // N-ary Product constructor (flattens, folds numerics, sorts)
    // -------------------------------------------------------------------------

    /// Create a product. Nested products are flattened, numeric factors are
    /// folded into a single leading coefficient, and factors are sorted into
    /// canonical order. A zero factor collapses the whole product.
    #[must_use]
    pub fn product(factors: Vec<Self>) -> Self {
        let arcs = factors.into_iter().map(Arc::new).collect();
        Self::product_from_arcs(arcs)
    }

    /// Create a product from `Arc` factors without cloning shared subtrees.
    #[must_use]
    pub fn product_from_arcs(factors: Vec<Arc<Self>>) -> Self {
        let mut flat: Vec<Arc<Self>> = Vec::with_capacity(factors.len());
        let mut numeric_prod = BigRational::one();

        for f in factors {
            match &f.kind {
                ExprKind::Number(n) => {
                    if n.is_zero() {
                        return Self::integer(0);
                    }
                    numeric_prod *= n;
                }
                ExprKind::Product(_) => match Arc::try_unwrap(f) {
                    Ok(expr) => {
                        if let ExprKind::Product(inner) = expr.kind.clone() {
                            for i in inner {
                                match &i.kind {
                                    ExprKind::Number(n) => numeric_prod *= n,
                                    _ => flat.push(i),
                                }
                            }
                        }
                    }
                    Err(arc) => {
                        if let ExprKind::Product(inner) = &arc.kind {
                            for i in inner {
                                match &i.kind {
                                    ExprKind::Number(n) => numeric_prod *= n,
                                    _ => flat.push(Arc::clone(i)),
                                }
                            }
                        }
                    }
                },
                _ => flat.push(f),
            }
        }

        flat.sort_by(|a, b| expr_cmp(a, b));

        if !numeric_prod.is_one() {
            let mut with_coeff = Vec::with_capacity(flat.len() + 1);
            with_coeff.push(Arc::new(Self::number(numeric_prod)));
            with_coeff.extend(flat);
            flat = with_coeff;
        }

        match flat.len() {
            0 => Self::integer(1),
            1 => Self::unwrap_arc(flat.into_iter().next().expect("len checked")),
            _ => Self::new(ExprKind::Product(flat)),
        }
    }

    // -------------------------------------------------------------------------
    // Binary operation helpers
    // -------------------------------------------------------------------------

    /// a + b
    #[must_use]
    pub fn add_expr(left: Self, right: Self) -> Self {
        Self::sum(vec![left, right])
    }

    /// a - b  →  Sum([a, Product([-1, b])])
    #[must_use]
    pub fn sub_expr(left: Self, right: Self) -> Self {
        Self::sum(vec![left, right.negate()])
    }

    /// a * b
    #[must_use]
    pub fn mul_expr(left: Self, right: Self) -> Self {
        Self::product(vec![left, right])
    }

    /// -x = Product([-1, x])
    #[must_use]
    pub fn negate(self) -> Self {
        Self::product(vec![Self::integer(-1), self])
    }

    /// Create a power expression.
    ///
    /// Inline folds: `x^0 → 1`, `x^1 → x`, `1^x → 1`, `0^n → 0` for positive
    /// numeric `n`, and exact evaluation `n^m` for numeric base and integer
    /// exponent fitting `i32`.
    #[must_use]
    pub fn pow(base: Self, exponent: Self) -> Self {
        if exponent.is_zero_num() {
            return Self::integer(1);
        }
        if exponent.is_one_num() {
            return base;
        }
        if base.is_one_num() {
            return Self::integer(1);
        }
        if base.is_zero_num() {
            if let Some(n) = exponent.as_number() {
                if n.is_positive() {
                    return Self::integer(0);
                }
            }
        }
        // (b^m)^n with numeric exponents folds to b^(m*n).
        if let ExprKind::Pow(inner_base, inner_exp) = &base.kind {
            if let (Some(m), Some(n)) = (inner_exp.as_number(), exponent.as_number()) {
                let combined = m * n;
                return Self::pow((**inner_base).clone(), Self::number(combined));
            }
        }
        if let (Some(b), Some(e)) = (base.as_number(), exponent.as_number()) {
            // Exact fold; a zero base with a non-positive exponent stays
            // symbolic rather than dividing by zero.
            if e.is_integer() && !b.is_zero() {
                if let Some(e32) = e.to_integer().to_i32() {
                    return Self::number(b.clone().pow(e32));
                }
            }
        }
        Self::new(ExprKind::Pow(Arc::new(base), Arc::new(exponent)))
    }

    /// Create a power from `Arc` operands (avoids cloning when unshared).
    #[must_use]
    pub fn pow_from_arcs(base: Arc<Self>, exponent: Arc<Self>) -> Self {
        if exponent.is_zero_num() || exponent.is_one_num() || base.is_one_num() {
            return Self::pow(Self::unwrap_arc(base), Self::unwrap_arc(exponent));
        }
        Self::new(ExprKind::Pow(base, exponent))
    }

    /// Unwrap an `Arc<Expr>` without cloning if the refcount is 1.
    #[inline]
    #[must_use]
    pub fn unwrap_arc(arc: Arc<Self>) -> Self {
        Arc::try_unwrap(arc).unwrap_or_else(|a| (*a).clone())
    }
}

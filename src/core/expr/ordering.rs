//! Canonical ordering for expressions.
//!
//! `expr_cmp` defines the total order used for sorting product factors and
//! sum terms into canonical form. Numbers come first; for everything else the
//! numeric coefficient is stripped off so that `x` and `2*x` sort adjacently
//! (compared by their shared monomial, then by coefficient).

use std::cmp::Ordering as CmpOrdering;
use std::sync::{Arc, LazyLock};

use num_rational::BigRational;
use num_traits::One;

use super::{Expr, ExprKind};

static RAT_ONE: LazyLock<BigRational> = LazyLock::new(BigRational::one);

/// Compare expressions for canonical ordering.
///
/// Order: Numbers (by value) < everything else, compared coefficient-stripped
/// first, with the coefficient as the final tie-breaker.
pub fn expr_cmp(a: &Expr, b: &Expr) -> CmpOrdering {
    use ExprKind::Number;

    // 1. Numbers always come first, ordered by exact value.
    match (&a.kind, &b.kind) {
        (Number(x), Number(y)) => return x.cmp(y),
        (Number(_), _) => return CmpOrdering::Less,
        (_, Number(_)) => return CmpOrdering::Greater,
        _ => {}
    }

    // 2. Strip coefficients so 2*x and x compare by the shared monomial.
    let (fa, ca) = term_parts(a);
    let (fb, cb) = term_parts(b);

    cmp_factor_seq(&fa, &fb).then_with(|| match (ca, cb) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(x), None) => x.cmp(&RAT_ONE),
        (None, Some(y)) => RAT_ONE.cmp(y),
        (None, None) => CmpOrdering::Equal,
    })
}

/// A term viewed as its non-numeric factors.
enum Factors<'a> {
    Single(&'a Expr),
    Many(&'a [Arc<Expr>]),
}

impl<'a> Factors<'a> {
    fn len(&self) -> usize {
        match self {
            Factors::Single(_) => 1,
            Factors::Many(fs) => fs.len(),
        }
    }

    fn get(&self, i: usize) -> &'a Expr {
        match self {
            Factors::Single(e) => e,
            Factors::Many(fs) => &fs[i],
        }
    }
}

/// Split a term into its factor list and optional numeric coefficient.
fn term_parts(e: &Expr) -> (Factors<'_>, Option<&BigRational>) {
    match &e.kind {
        ExprKind::Product(fs) => {
            if let ExprKind::Number(n) = &fs[0].kind {
                let rest = &fs[1..];
                if rest.len() == 1 {
                    (Factors::Single(&rest[0]), Some(n))
                } else {
                    (Factors::Many(rest), Some(n))
                }
            } else {
                (Factors::Many(fs), None)
            }
        }
        _ => (Factors::Single(e), None),
    }
}

fn cmp_factor_seq(a: &Factors<'_>, b: &Factors<'_>) -> CmpOrdering {
    let n = a.len().min(b.len());
    for i in 0..n {
        match expr_cmp_type_strict(a.get(i), b.get(i)) {
            CmpOrdering::Equal => {}
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Strict type comparison for non-term contexts.
/// Order: Number < Symbol < Bracket < Pow < Product < Sum.
pub fn expr_cmp_type_strict(a: &Expr, b: &Expr) -> CmpOrdering {
    use ExprKind::{Bracket, Number, Pow, Product, Sum, Symbol};
    match (&a.kind, &b.kind) {
        (Number(x), Number(y)) => x.cmp(y),
        (Number(_), _) => CmpOrdering::Less,
        (_, Number(_)) => CmpOrdering::Greater,

        // Symbols sort alphabetically (the InternedSymbol order).
        (Symbol(x), Symbol(y)) => x.cmp(y),
        (Symbol(_), _) => CmpOrdering::Less,
        (_, Symbol(_)) => CmpOrdering::Greater,

        (Bracket { head: h1, arg: a1 }, Bracket { head: h2, arg: a2 }) => {
            h1.cmp(h2).then_with(|| expr_cmp(a1, a2))
        }
        (Bracket { .. }, _) => CmpOrdering::Less,
        (_, Bracket { .. }) => CmpOrdering::Greater,

        (Pow(b1, e1), Pow(b2, e2)) => {
            expr_cmp_type_strict(b1, b2).then_with(|| expr_cmp_type_strict(e1, e2))
        }
        (Pow(_, _), _) => CmpOrdering::Less,
        (_, Pow(_, _)) => CmpOrdering::Greater,

        (Product(f1), Product(f2)) => cmp_arc_lists(f1, f2),
        (Product(_), _) => CmpOrdering::Less,
        (_, Product(_)) => CmpOrdering::Greater,

        (Sum(t1), Sum(t2)) => cmp_arc_lists(t1, t2),
    }
}

fn cmp_arc_lists(xs: &[Arc<Expr>], ys: &[Arc<Expr>]) -> CmpOrdering {
    let n = xs.len().min(ys.len());
    for i in 0..n {
        match expr_cmp(&xs[i], &ys[i]) {
            CmpOrdering::Equal => {}
            other => return other,
        }
    }
    xs.len().cmp(&ys.len())
}

//! Canonicalization and bracket grouping.
//!
//! `normalize` reduces an expression to its normal form: a sorted sum of
//! monomial terms with exact numeric coefficients collected. `bracket_terms`
//! then reorganizes the normal form for abbreviation extraction: every term
//! is split into an "external" monomial (symbols kept outside the bracket)
//! and the remaining content, and terms sharing an external monomial are
//! grouped under one bracket head application.
//!
//! Which symbols stay external is decided by a single eligibility predicate
//! parameterized by [`BracketMode`]: bracket mode keeps the named set
//! external and captures everything else; anti-bracket mode is the exact
//! complement. Bracket content that collapses to a bare number is folded
//! straight into the parent term and never wrapped.

use std::sync::Arc;

use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::expr::{Expr, ExprKind, expr_cmp};
use crate::core::symbol::{InternedSymbol, Symbol, symb};

/// Maximum integer exponent for which a power of a sum is expanded by
/// repeated multiplication during normalization.
const POW_EXPAND_LIMIT: i64 = 16;

// ============================================================================
// Symbol sets and bracket modes
// ============================================================================

/// A set of symbols, by interned id.
#[derive(Debug, Clone, Default)]
pub struct SymbolSet {
    ids: FxHashSet<u64>,
}

impl SymbolSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from symbol names, interning as needed.
    pub fn from_names<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(symb(name.as_ref()));
        }
        set
    }

    pub fn insert(&mut self, sym: Symbol) {
        self.ids.insert(sym.id());
    }

    pub fn remove(&mut self, sym: Symbol) {
        self.ids.remove(&sym.id());
    }

    #[must_use]
    pub fn contains_id(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn contains(&self, sym: &InternedSymbol) -> bool {
        self.contains_id(sym.id())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Which side of the symbol set stays outside the brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketMode {
    /// The named set is external; everything else is captured.
    Bracket,
    /// The complement is external; the named set is captured.
    AntiBracket,
}

impl BracketMode {
    /// Does a symbol with this id stay outside the bracket?
    #[must_use]
    pub fn keeps_external(self, set: &SymbolSet, id: u64) -> bool {
        match self {
            Self::Bracket => set.contains_id(id),
            Self::AntiBracket => !set.contains_id(id),
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Reduce to normal form: a canonically sorted sum of monomials with numeric
/// coefficients collected exactly and repeated factors merged into powers
/// (`x*x` and `x^2` are the same monomial). Idempotent.
#[must_use]
pub fn normalize(e: &Expr) -> Expr {
    let expanded = expand(e);
    let mut groups: FxHashMap<Expr, BigRational> = FxHashMap::default();
    let mut constant = BigRational::zero();

    for term in terms_of(&expanded) {
        let (coeff, factors) = term_factors(&term);
        match collect_powers(factors) {
            None => constant += coeff,
            Some(m) => {
                let entry = groups.entry(m).or_insert_with(BigRational::zero);
                *entry += coeff;
            }
        }
    }

    let mut terms: Vec<Arc<Expr>> = Vec::with_capacity(groups.len() + 1);
    if !constant.is_zero() {
        terms.push(Arc::new(Expr::number(constant)));
    }
    for (monomial, coeff) in groups {
        if coeff.is_zero() {
            continue;
        }
        if coeff.is_one() {
            terms.push(Arc::new(monomial));
        } else {
            terms.push(Arc::new(Expr::product(vec![Expr::number(coeff), monomial])));
        }
    }
    terms.sort_by(|a, b| expr_cmp(a, b));

    match terms.len() {
        0 => Expr::integer(0),
        1 => Expr::unwrap_arc(terms.into_iter().next().expect("len checked")),
        _ => Expr::new(ExprKind::Sum(terms)),
    }
}

/// Distribute products over sums and expand small integer powers of sums.
/// Bracket arguments are normalized in place but never distributed across
/// the bracket boundary.
fn expand(e: &Expr) -> Expr {
    match &e.kind {
        ExprKind::Number(_) | ExprKind::Symbol(_) => e.clone(),

        ExprKind::Bracket { head, arg } => Expr::bracket(head.clone(), normalize(arg)),

        ExprKind::Sum(terms) => Expr::sum(terms.iter().map(|t| expand(t)).collect()),

        ExprKind::Product(factors) => {
            // Cross-product distribution over any sum factors.
            let mut acc: Vec<Expr> = vec![Expr::integer(1)];
            for factor in factors {
                let ef = expand(factor);
                let factor_terms = terms_of(&ef);
                let mut next = Vec::with_capacity(acc.len() * factor_terms.len());
                for lhs in &acc {
                    for rhs in &factor_terms {
                        next.push(Expr::mul_expr(lhs.clone(), rhs.clone()));
                    }
                }
                acc = next;
            }
            Expr::sum(acc)
        }

        ExprKind::Pow(base, exp) => {
            let base = expand(base);
            let exp = expand(exp);
            // (a*b)^n distributes over the factors unconditionally; a sum
            // base is expanded by repeated multiplication for small n.
            if let Some(n) = positive_int_exponent(&exp) {
                if let ExprKind::Product(factors) = &base.kind {
                    let powered = factors
                        .iter()
                        .map(|f| Expr::pow((**f).clone(), Expr::integer(n)))
                        .collect();
                    return expand(&Expr::product(powered));
                }
                if (2..=POW_EXPAND_LIMIT).contains(&n) && matches!(base.kind, ExprKind::Sum(_)) {
                    let copies = vec![base; n as usize];
                    return expand(&Expr::new(ExprKind::Product(
                        copies.into_iter().map(Arc::new).collect(),
                    )));
                }
            }
            Expr::pow(base, exp)
        }
    }
}

fn positive_int_exponent(exp: &Expr) -> Option<i64> {
    let n = exp.as_number()?;
    if !n.is_integer() || !n.is_positive() {
        return None;
    }
    n.to_integer().to_i64()
}

/// The additive terms of an expression (empty for zero).
fn terms_of(e: &Expr) -> Vec<Expr> {
    match &e.kind {
        ExprKind::Sum(terms) => terms.iter().map(|t| (**t).clone()).collect(),
        ExprKind::Number(n) if n.is_zero() => Vec::new(),
        _ => vec![e.clone()],
    }
}

/// Merge repeated factors into powers and rebuild the monomial.
/// Returns `None` when no factors remain (the term was purely numeric).
fn collect_powers(factors: Vec<Arc<Expr>>) -> Option<Expr> {
    // (base, accumulated exponent), in first-seen order; the final product
    // constructor re-sorts canonically.
    let mut bases: Vec<(Expr, BigRational)> = Vec::new();
    let mut index: FxHashMap<Expr, usize> = FxHashMap::default();

    for factor in factors {
        let (base, exp) = match &factor.kind {
            ExprKind::Pow(b, e) => match e.as_number() {
                Some(n) if n.is_integer() => ((**b).clone(), n.clone()),
                _ => ((*factor).clone(), BigRational::one()),
            },
            _ => ((*factor).clone(), BigRational::one()),
        };
        match index.get(&base) {
            Some(&i) => bases[i].1 += exp,
            None => {
                index.insert(base.clone(), bases.len());
                bases.push((base, exp));
            }
        }
    }

    let mut rebuilt: Vec<Expr> = Vec::with_capacity(bases.len());
    for (base, exp) in bases {
        if exp.is_zero() {
            continue;
        }
        if exp.is_one() {
            rebuilt.push(base);
        } else {
            rebuilt.push(Expr::pow(base, Expr::number(exp)));
        }
    }

    if rebuilt.is_empty() {
        return None;
    }
    Some(Expr::product(rebuilt))
}

// ============================================================================
// Bracket grouping
// ============================================================================

/// Bracket the normal form of `e`: group each term's captured part under a
/// `head` application, keyed by the external monomial. Content that reduces
/// to a bare number is folded into the parent term instead of being wrapped.
#[must_use]
pub fn bracket_terms(
    e: &Expr,
    set: &SymbolSet,
    mode: BracketMode,
    head: &InternedSymbol,
) -> Expr {
    let normalized = normalize(e);
    let mut groups: FxHashMap<Expr, Vec<Expr>> = FxHashMap::default();

    for term in terms_of(&normalized) {
        let (coeff, factors) = term_factors(&term);

        let mut outer: Vec<Arc<Expr>> = Vec::new();
        let mut inner: Vec<Arc<Expr>> = Vec::new();
        for factor in factors {
            if factor_is_external(&factor, set, mode) {
                outer.push(factor);
            } else {
                inner.push(factor);
            }
        }

        let outer_key = if outer.is_empty() {
            Expr::integer(1)
        } else {
            Expr::product_from_arcs(outer)
        };

        let mut content_factors: Vec<Arc<Expr>> = Vec::with_capacity(inner.len() + 1);
        content_factors.push(Arc::new(Expr::number(coeff)));
        content_factors.extend(inner);
        let content_term = Expr::product_from_arcs(content_factors);

        groups.entry(outer_key).or_default().push(content_term);
    }

    let mut out_terms: Vec<Expr> = Vec::with_capacity(groups.len());
    for (outer, contents) in groups {
        let content = normalize(&Expr::sum(contents));
        let piece = if content.as_number().is_some() {
            // A purely numeric bracket is substituted back to itself.
            content
        } else {
            Expr::bracket(head.clone(), content)
        };
        out_terms.push(Expr::mul_expr(outer, piece));
    }

    normalize(&Expr::sum(out_terms))
}

/// A term as coefficient plus multiplicative factors.
fn term_factors(term: &Expr) -> (BigRational, Vec<Arc<Expr>>) {
    match &term.kind {
        ExprKind::Number(n) => (n.clone(), Vec::new()),
        ExprKind::Product(factors) => {
            if let ExprKind::Number(n) = &factors[0].kind {
                (n.clone(), factors[1..].to_vec())
            } else {
                (BigRational::one(), factors.clone())
            }
        }
        _ => (BigRational::one(), vec![Arc::new(term.clone())]),
    }
}

/// Does this factor stay outside the bracket?
fn factor_is_external(factor: &Expr, set: &SymbolSet, mode: BracketMode) -> bool {
    match &factor.kind {
        ExprKind::Symbol(s) => mode.keeps_external(set, s.id()),
        ExprKind::Pow(base, _) => match &base.kind {
            ExprKind::Symbol(s) => mode.keeps_external(set, s.id()),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Expr {
        Expr::symbol(name)
    }

    #[test]
    fn normalize_collects_like_terms() {
        // 2*x*y + y*x + 3 - 3  ->  3*x*y
        let e = Expr::sum(vec![
            Expr::product(vec![Expr::integer(2), sym("canon_x"), sym("canon_y")]),
            Expr::product(vec![sym("canon_y"), sym("canon_x")]),
            Expr::integer(3),
            Expr::integer(-3),
        ]);
        let n = normalize(&e);
        let expected = Expr::product(vec![Expr::integer(3), sym("canon_x"), sym("canon_y")]);
        assert_eq!(n, expected);
    }

    #[test]
    fn normalize_cancels_to_zero() {
        let e = Expr::sum(vec![
            Expr::product(vec![sym("canon_a"), sym("canon_b")]),
            Expr::product(vec![Expr::integer(-1), sym("canon_b"), sym("canon_a")]),
        ]);
        assert!(normalize(&e).is_zero_num());
    }

    #[test]
    fn normalize_distributes_products_over_sums() {
        // (x + 1)*(x - 1) -> x^2 - 1
        let x = sym("canon_d");
        let e = Expr::product(vec![
            Expr::sum(vec![x.clone(), Expr::integer(1)]),
            Expr::sum(vec![x.clone(), Expr::integer(-1)]),
        ]);
        let n = normalize(&e);
        let expected = normalize(&Expr::sum(vec![
            Expr::pow(x, Expr::integer(2)),
            Expr::integer(-1),
        ]));
        assert_eq!(n, expected);
    }

    #[test]
    fn normalize_expands_small_powers_of_sums() {
        // (x + y)^2 -> x^2 + 2*x*y + y^2
        let x = sym("canon_p");
        let y = sym("canon_q");
        let e = Expr::pow(Expr::sum(vec![x.clone(), y.clone()]), Expr::integer(2));
        let n = normalize(&e);
        let expected = normalize(&Expr::sum(vec![
            Expr::pow(x.clone(), Expr::integer(2)),
            Expr::product(vec![Expr::integer(2), x, y.clone()]),
            Expr::pow(y, Expr::integer(2)),
        ]));
        assert_eq!(n, expected);
    }

    #[test]
    fn normalize_is_idempotent() {
        let e = Expr::sum(vec![
            Expr::product(vec![Expr::integer(2), sym("canon_i"), sym("canon_j")]),
            Expr::pow(sym("canon_i"), Expr::integer(3)),
            Expr::rational(1, 2),
        ]);
        let once = normalize(&e);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn bracket_groups_by_external_monomial() {
        // CC*x + CC*y + R2*x  with external {CC, R2}:
        //   CC*H(x + y) + R2*H(x)
        let head = crate::core::symbol::symb_interned("canon_head");
        let set = SymbolSet::from_names(["canon_CC", "canon_R2"]);
        let e = Expr::sum(vec![
            Expr::product(vec![sym("canon_CC"), sym("canon_bx")]),
            Expr::product(vec![sym("canon_CC"), sym("canon_by")]),
            Expr::product(vec![sym("canon_R2"), sym("canon_bx")]),
        ]);
        let b = bracket_terms(&e, &set, BracketMode::Bracket, &head);

        let expected = normalize(&Expr::sum(vec![
            Expr::product(vec![
                sym("canon_CC"),
                Expr::bracket(
                    head.clone(),
                    normalize(&Expr::sum(vec![sym("canon_bx"), sym("canon_by")])),
                ),
            ]),
            Expr::product(vec![
                sym("canon_R2"),
                Expr::bracket(head.clone(), sym("canon_bx")),
            ]),
        ]));
        assert_eq!(b, expected);
    }

    #[test]
    fn bracket_folds_numeric_content() {
        // 3*CC with external {CC}: content is the bare number 3, no wrapping.
        let head = crate::core::symbol::symb_interned("canon_head2");
        let set = SymbolSet::from_names(["canon_CC2"]);
        let e = Expr::product(vec![Expr::integer(3), sym("canon_CC2")]);
        let b = bracket_terms(&e, &set, BracketMode::Bracket, &head);
        assert_eq!(b, normalize(&e));
    }

    #[test]
    fn anti_bracket_flips_eligibility() {
        // x*k1 with named set {x}: anti-bracket keeps k1 external, captures x.
        let head = crate::core::symbol::symb_interned("canon_head3");
        let set = SymbolSet::from_names(["canon_ax"]);
        let e = Expr::product(vec![sym("canon_ax"), sym("canon_ak1")]);
        let b = bracket_terms(&e, &set, BracketMode::AntiBracket, &head);

        let expected = Expr::product(vec![
            sym("canon_ak1"),
            Expr::bracket(head, sym("canon_ax")),
        ]);
        assert_eq!(b, normalize(&expected));
    }

    #[test]
    fn external_powers_stay_outside() {
        // CC^2*x with external {CC}: CC^2 * H(x)
        let head = crate::core::symbol::symb_interned("canon_head4");
        let set = SymbolSet::from_names(["canon_pc"]);
        let e = Expr::product(vec![
            Expr::pow(sym("canon_pc"), Expr::integer(2)),
            sym("canon_px"),
        ]);
        let b = bracket_terms(&e, &set, BracketMode::Bracket, &head);
        let expected = Expr::product(vec![
            Expr::pow(sym("canon_pc"), Expr::integer(2)),
            Expr::bracket(head, sym("canon_px")),
        ]);
        assert_eq!(b, normalize(&expected));
    }
}

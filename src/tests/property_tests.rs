//! Property-based tests for the extraction and split invariants.
//!
//! Random polynomial expressions are generated over a small pool of
//! "external" tag-like symbols and "internal" kinematic-like symbols, then
//! the documented properties are checked: normalization idempotence,
//! extraction round-trip/completeness/idempotence, table injectivity, and
//! split disjointness/coverage.

use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::abbrev::{AbbrevTable, RecordWriter, extract_abbreviations};
use crate::canon::{BracketMode, SymbolSet, normalize};
use crate::core::expr::{Expr, ExprKind, substitute_symbols};
use crate::core::symbol::symb;
use crate::split::split;

const OUTER: [&str; 3] = ["pt_CC", "pt_R2", "pt_T"];
const INNER: [&str; 4] = ["pt_x", "pt_y", "pt_z", "pt_w"];

/// A random polynomial over the two symbol pools, with small exact
/// coefficients and powers.
#[derive(Clone, Debug)]
struct RandomPoly(Expr);

impl Arbitrary for RandomPoly {
    fn arbitrary(g: &mut Gen) -> Self {
        let n_terms = usize::arbitrary(g) % 6 + 1;
        let mut terms = Vec::with_capacity(n_terms);
        for _ in 0..n_terms {
            let mut factors = Vec::new();

            let coeff = i64::from(i8::arbitrary(g)) % 5;
            factors.push(Expr::integer(if coeff == 0 { 1 } else { coeff }));

            for name in OUTER {
                if bool::arbitrary(g) {
                    factors.push(Expr::symbol(name));
                }
            }
            let n_inner = usize::arbitrary(g) % 3;
            for _ in 0..n_inner {
                let name = g.choose(&INNER).expect("pool is nonempty");
                let base = Expr::symbol(*name);
                if bool::arbitrary(g) {
                    factors.push(Expr::pow(base, Expr::integer(2)));
                } else {
                    factors.push(base);
                }
            }
            terms.push(Expr::product(factors));
        }
        RandomPoly(Expr::sum(terms))
    }
}

fn outer_set() -> SymbolSet {
    SymbolSet::from_names(OUTER)
}

fn extract(
    e: &Expr,
    table: &mut AbbrevTable,
) -> Result<Expr, crate::error::AbbrevError> {
    let mut writer = RecordWriter::new(Vec::new());
    extract_abbreviations(e, &outer_set(), BracketMode::Bracket, "pt_Z", table, &mut writer)
}

fn fully_abbreviated(e: &Expr) -> bool {
    match &e.kind {
        ExprKind::Bracket { .. } => false,
        ExprKind::Sum(children) | ExprKind::Product(children) => {
            children.iter().all(|c| fully_abbreviated(c))
        }
        ExprKind::Pow(base, exp) => fully_abbreviated(base) && fully_abbreviated(exp),
        ExprKind::Number(_) | ExprKind::Symbol(_) => true,
    }
}

#[test]
fn normalization_is_idempotent() {
    fn prop(poly: RandomPoly) -> bool {
        let once = normalize(&poly.0);
        normalize(&once) == once
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(RandomPoly) -> bool);
}

#[test]
fn extraction_round_trips_and_is_complete() {
    fn prop(poly: RandomPoly) -> TestResult {
        let mut table = AbbrevTable::new();
        let abbreviated = match extract(&poly.0, &mut table) {
            Ok(e) => e,
            Err(err) => return TestResult::error(err.to_string()),
        };

        if !fully_abbreviated(&abbreviated) {
            return TestResult::failed();
        }

        let mut restored = abbreviated;
        for entry in table.entries().iter().rev() {
            let mut map = FxHashMap::default();
            map.insert(entry.symbol.id(), entry.pattern.clone());
            restored = substitute_symbols(&restored, &map);
        }
        TestResult::from_bool(normalize(&restored) == normalize(&poly.0))
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(RandomPoly) -> TestResult);
}

#[test]
fn extraction_is_idempotent_and_injective() {
    fn prop(poly: RandomPoly) -> TestResult {
        let mut table = AbbrevTable::new();
        let first = match extract(&poly.0, &mut table) {
            Ok(e) => e,
            Err(err) => return TestResult::error(err.to_string()),
        };
        let entries_after_first = table.len();

        // Injectivity: distinct patterns, distinct numbers.
        let mut patterns = FxHashSet::default();
        let mut seqs = FxHashSet::default();
        for entry in table.entries() {
            if !patterns.insert(entry.pattern.clone()) || !seqs.insert(entry.seq) {
                return TestResult::failed();
            }
        }

        // Idempotence: a second pass finds nothing new.
        let second = match extract(&first, &mut table) {
            Ok(e) => e,
            Err(err) => return TestResult::error(err.to_string()),
        };
        TestResult::from_bool(table.len() == entries_after_first && second == first)
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(RandomPoly) -> TestResult);
}

#[test]
fn split_components_are_disjoint_and_cover() {
    fn prop(a: RandomPoly, b: RandomPoly) -> bool {
        let cc = symb("pt_CC");
        let r2 = symb("pt_R2");

        // Strip the tags out of the random parts, then tag them explicitly:
        // e = CC*qa + R2*qb with qa, qb tag-free.
        let mut drop_tags = FxHashMap::default();
        drop_tags.insert(cc.id(), Expr::integer(1));
        drop_tags.insert(r2.id(), Expr::integer(1));
        let qa = substitute_symbols(&a.0, &drop_tags);
        let qb = substitute_symbols(&b.0, &drop_tags);

        let e = Expr::sum(vec![
            Expr::product(vec![cc.to_expr(), qa.clone()]),
            Expr::product(vec![r2.to_expr(), qb.clone()]),
        ]);

        let components = split(&e, cc, r2);
        components.primary == normalize(&qa) && components.secondary == normalize(&qb)
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(RandomPoly, RandomPoly) -> bool);
}

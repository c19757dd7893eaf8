//! Secondary optimization: common-subexpression elimination over the
//! abbreviated expression.
//!
//! This pass runs after abbreviation extraction and owns its own symbol
//! namespace, independent of the extraction table. Shared compound
//! subexpressions are hoisted into optimizer-local assignments; the result
//! is the assignment list in dependency order (innermost first) plus the
//! reduced body.
//!
//! Caching has overhead, so only subexpressions that are worth naming are
//! hoisted: sums and products with two or more operands, and powers of
//! compound bases. Subexpressions containing a protected symbol (the split
//! indicator tags) are never hoisted — the downstream projection substitutes
//! those symbols in the body and must be able to see them.

use log::debug;
use rustc_hash::FxHashMap;

use crate::canon::SymbolSet;
use crate::core::expr::{Expr, ExprKind};

/// The result of the optimization pass.
#[derive(Debug, Clone)]
pub struct Optimized {
    /// Optimizer-local assignments `(name, subexpression)` in dependency
    /// order: every assignment only references names defined before it.
    pub assignments: Vec<(String, Expr)>,
    /// The reduced expression body, referencing the assignment names.
    pub body: Expr,
}

/// Run common-subexpression elimination over `expr`, naming hoisted
/// subexpressions `{prefix}1`, `{prefix}2`, ... Symbols in `protected` are
/// kept visible in the body (subexpressions containing them are not hoisted).
#[must_use]
pub fn optimize(expr: &Expr, prefix: &str, protected: &SymbolSet) -> Optimized {
    let mut counts: FxHashMap<Expr, usize> = FxHashMap::default();
    count_occurrences(expr, &mut counts);

    let mut cse = Cse {
        counts,
        assigned: FxHashMap::default(),
        protected_memo: FxHashMap::default(),
        assignments: Vec::new(),
        prefix,
        next_seq: 1,
        protected,
    };
    let body = cse.rewrite(expr);

    debug!(
        "cse introduced {} assignments under prefix '{}'",
        cse.assignments.len(),
        prefix
    );
    Optimized {
        assignments: cse.assignments,
        body,
    }
}

fn count_occurrences(e: &Expr, counts: &mut FxHashMap<Expr, usize>) {
    match &e.kind {
        ExprKind::Number(_) | ExprKind::Symbol(_) => return,
        _ => {
            *counts.entry(e.clone()).or_insert(0) += 1;
        }
    }
    match &e.kind {
        ExprKind::Sum(children) | ExprKind::Product(children) => {
            for child in children {
                count_occurrences(child, counts);
            }
        }
        ExprKind::Pow(base, exp) => {
            count_occurrences(base, counts);
            count_occurrences(exp, counts);
        }
        ExprKind::Bracket { arg, .. } => count_occurrences(arg, counts),
        ExprKind::Number(_) | ExprKind::Symbol(_) => {}
    }
}

struct Cse<'a> {
    counts: FxHashMap<Expr, usize>,
    /// Already-hoisted subexpressions → their assignment symbol.
    assigned: FxHashMap<Expr, Expr>,
    protected_memo: FxHashMap<Expr, bool>,
    assignments: Vec<(String, Expr)>,
    prefix: &'a str,
    next_seq: u32,
    protected: &'a SymbolSet,
}

impl Cse<'_> {
    fn rewrite(&mut self, e: &Expr) -> Expr {
        if let Some(sym) = self.assigned.get(e) {
            return sym.clone();
        }

        let rebuilt = match &e.kind {
            ExprKind::Number(_) | ExprKind::Symbol(_) => e.clone(),
            ExprKind::Bracket { head, arg } => Expr::bracket(head.clone(), self.rewrite(arg)),
            ExprKind::Sum(terms) => {
                Expr::sum(terms.iter().map(|t| self.rewrite(t)).collect())
            }
            ExprKind::Product(factors) => {
                Expr::product(factors.iter().map(|f| self.rewrite(f)).collect())
            }
            ExprKind::Pow(base, exp) => Expr::pow(self.rewrite(base), self.rewrite(exp)),
        };

        if self.counts.get(e).copied().unwrap_or(0) >= 2 && self.worth_hoisting(e) {
            let name = format!("{}{}", self.prefix, self.next_seq);
            self.next_seq += 1;
            let sym = Expr::symbol(&name);
            self.assignments.push((name, rebuilt));
            self.assigned.insert(e.clone(), sym.clone());
            return sym;
        }
        rebuilt
    }

    /// Is this subexpression expensive enough to justify a named slot?
    fn worth_hoisting(&mut self, e: &Expr) -> bool {
        let worthwhile = match &e.kind {
            ExprKind::Sum(terms) => terms.len() >= 2,
            ExprKind::Product(factors) => factors.len() >= 2,
            // Powers of compound bases; symbol powers are cheap to repeat.
            ExprKind::Pow(base, _) => {
                !matches!(base.kind, ExprKind::Number(_) | ExprKind::Symbol(_))
            }
            _ => false,
        };
        worthwhile && !self.contains_protected(e)
    }

    fn contains_protected(&mut self, e: &Expr) -> bool {
        if self.protected.is_empty() {
            return false;
        }
        if let Some(&cached) = self.protected_memo.get(e) {
            return cached;
        }
        let found = match &e.kind {
            ExprKind::Number(_) => false,
            ExprKind::Symbol(s) => self.protected.contains(s),
            ExprKind::Bracket { arg, .. } => self.contains_protected(arg),
            ExprKind::Sum(children) | ExprKind::Product(children) => {
                children.iter().any(|c| self.contains_protected(c))
            }
            ExprKind::Pow(base, exp) => {
                self.contains_protected(base) || self.contains_protected(exp)
            }
        };
        self.protected_memo.insert(e.clone(), found);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::normalize;
    use crate::core::expr::substitute_symbols;
    use crate::core::symbol::symb;

    #[test]
    fn shared_subexpression_is_hoisted_once() {
        // (a + b)*c + (a + b)*d: the sum a + b gets one slot.
        let ab = Expr::sum(vec![Expr::symbol("opt_a"), Expr::symbol("opt_b")]);
        let e = Expr::sum(vec![
            Expr::product(vec![ab.clone(), Expr::symbol("opt_c")]),
            Expr::product(vec![ab.clone(), Expr::symbol("opt_d")]),
        ]);

        let result = optimize(&e, "opt_t", &SymbolSet::new());
        assert_eq!(result.assignments.len(), 1);
        assert_eq!(result.assignments[0].0, "opt_t1");
        assert_eq!(result.assignments[0].1, ab);
    }

    #[test]
    fn unshared_subexpressions_stay_inline() {
        let e = Expr::sum(vec![
            Expr::product(vec![Expr::symbol("opt_p"), Expr::symbol("opt_q")]),
            Expr::symbol("opt_r"),
        ]);
        let result = optimize(&e, "opt_u", &SymbolSet::new());
        assert!(result.assignments.is_empty());
        assert_eq!(result.body, e);
    }

    #[test]
    fn substituting_assignments_back_reconstructs_input() {
        let ab = Expr::sum(vec![Expr::symbol("opt_x"), Expr::symbol("opt_y")]);
        let e = Expr::sum(vec![
            Expr::product(vec![ab.clone(), ab.clone()]),
            Expr::product(vec![ab.clone(), Expr::symbol("opt_z")]),
        ]);

        let result = optimize(&e, "opt_v", &SymbolSet::new());
        assert!(!result.assignments.is_empty());

        // Substitute in reverse dependency order.
        let mut restored = result.body.clone();
        for (name, rhs) in result.assignments.iter().rev() {
            let mut map = rustc_hash::FxHashMap::default();
            map.insert(symb(name).id(), rhs.clone());
            restored = substitute_symbols(&restored, &map);
        }
        assert_eq!(normalize(&restored), normalize(&e));
    }

    #[test]
    fn protected_symbols_stay_in_the_body() {
        // CC*(a + b) appearing twice would normally be hoisted whole; with CC
        // protected, only the inner sum may be named.
        let tags = SymbolSet::from_names(["opt_CC"]);
        let cc_term = Expr::product(vec![
            Expr::symbol("opt_CC"),
            Expr::sum(vec![Expr::symbol("opt_m"), Expr::symbol("opt_n")]),
        ]);
        let e = Expr::sum(vec![
            Expr::product(vec![cc_term.clone(), Expr::symbol("opt_s")]),
            Expr::product(vec![cc_term.clone(), Expr::symbol("opt_u2")]),
        ]);

        let result = optimize(&e, "opt_w", &tags);
        for (_, rhs) in &result.assignments {
            let mut map = rustc_hash::FxHashMap::default();
            map.insert(symb("opt_CC").id(), Expr::integer(0));
            // If CC were buried in an assignment, substituting it there would
            // change the assignment; the body must carry every CC occurrence.
            assert_eq!(&substitute_symbols(rhs, &map), rhs);
        }
    }
}

//! Split-indicator projection.
//!
//! The two indicator symbols are mutually exclusive markers: setting the
//! pair to (1,0) projects out the primary component, (0,1) the secondary.
//! The components are disjoint projections of the same expression, and
//! `primary_tag*primary + secondary_tag*secondary` reconstructs the input.

use rustc_hash::FxHashMap;

use crate::canon::normalize;
use crate::core::expr::{Expr, substitute_symbols};
use crate::core::symbol::Symbol;

/// The two disjoint components of a tagged expression.
#[derive(Debug, Clone)]
pub struct SplitComponents {
    /// The component with the primary tag set to 1 and the secondary to 0.
    pub primary: Expr,
    /// The component with the primary tag set to 0 and the secondary to 1.
    pub secondary: Expr,
}

/// Project `expr` onto its two tagged components.
#[must_use]
pub fn split(expr: &Expr, primary_tag: Symbol, secondary_tag: Symbol) -> SplitComponents {
    SplitComponents {
        primary: project(expr, primary_tag, secondary_tag),
        secondary: project(expr, secondary_tag, primary_tag),
    }
}

/// Substitute `kept -> 1`, `dropped -> 0` and renormalize.
fn project(expr: &Expr, kept: Symbol, dropped: Symbol) -> Expr {
    let mut map = FxHashMap::default();
    map.insert(kept.id(), Expr::integer(1));
    map.insert(dropped.id(), Expr::integer(0));
    normalize(&substitute_symbols(expr, &map))
}

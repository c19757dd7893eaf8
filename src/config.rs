//! Configuration surface: external-leg descriptors, kinematic symbol-set
//! assembly, and the per-diagram configuration consumed by the pipeline.
//!
//! The surrounding code-generation layer enumerates process legs with their
//! mass/spin flags and feeds the result into the core through the single
//! bracket-symbol-set parameter; the core algorithm never inspects leg data
//! itself.

use crate::canon::BracketMode;
use crate::core::expr::Expr;
use crate::error::AbbrevError;

// ============================================================================
// Leg descriptors and kinematic symbols
// ============================================================================

/// One external leg of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    /// 1-based leg index.
    pub index: usize,
    /// Twice the spin (2 for a vector, 1 for a fermion, 0 for a scalar).
    pub twice_spin: i32,
    /// Carries a nonzero mass.
    pub massive: bool,
    /// Lightlike momentum.
    pub lightlike: bool,
}

impl Leg {
    #[must_use]
    pub const fn new(index: usize, twice_spin: i32, massive: bool, lightlike: bool) -> Self {
        Self {
            index,
            twice_spin,
            massive,
            lightlike,
        }
    }

    /// A massless lightlike vector leg (gluon, photon).
    #[must_use]
    pub const fn massless_vector(index: usize) -> Self {
        Self::new(index, 2, false, true)
    }

    #[must_use]
    pub const fn is_vector(&self) -> bool {
        self.twice_spin == 2
    }

    /// Momentum label used in spinor-product symbols: lightlike legs use
    /// their momentum `k`, massive legs the associated lightlike projection
    /// `l`.
    const fn momentum_label(&self) -> char {
        if self.lightlike { 'k' } else { 'l' }
    }
}

/// Assemble the kinematic symbol names for the bracket set: the loop
/// momentum invariants, one momentum projection per leg, polarisation
/// vectors when in use, and the pairwise spinor-product symbols.
#[must_use]
pub fn kinematic_symbols(legs: &[Leg], polarisation_vectors: bool) -> Vec<String> {
    let mut out: Vec<String> = vec!["Qt2".to_owned(), "QspQ".to_owned()];

    for leg in legs {
        out.push(format!("Qspk{}", leg.index));
        if leg.massive {
            out.push(format!("Qspl{}", leg.index));
        }
    }

    if polarisation_vectors {
        for leg in legs {
            if leg.lightlike && leg.is_vector() {
                out.push(format!("Qspe{}", leg.index));
            }
        }
    }

    // Spinor products for every ordered pair of distinct legs.
    for a in legs {
        for b in legs {
            if a.index == b.index {
                continue;
            }
            out.push(format!(
                "Qspva{}{}{}{}",
                a.momentum_label(),
                a.index,
                b.momentum_label(),
                b.index
            ));
        }
    }

    if polarisation_vectors {
        // Momentum/polarisation mixed products.
        for a in legs {
            for b in legs {
                if a.index == b.index || !(b.lightlike && b.is_vector()) {
                    continue;
                }
                out.push(format!(
                    "Qspva{}{}e{}",
                    a.momentum_label(),
                    a.index,
                    b.index
                ));
                out.push(format!(
                    "Qspvae{}{}{}",
                    b.index,
                    a.momentum_label(),
                    a.index
                ));
            }
        }
        // Polarisation/polarisation products, both orders per unordered pair.
        for a in legs {
            for b in legs {
                if a.index >= b.index {
                    continue;
                }
                if a.lightlike && a.is_vector() && b.lightlike && b.is_vector() {
                    out.push(format!("Qspvae{}e{}", a.index, b.index));
                    out.push(format!("Qspvae{}e{}", b.index, a.index));
                }
            }
        }
    }

    out.dedup();
    out
}

// ============================================================================
// Per-diagram configuration
// ============================================================================

/// Configuration for one diagram's pipeline run.
///
/// Built in the chained style: `DiagramConfig::new("12").symbols(...)`.
#[derive(Debug, Clone)]
pub struct DiagramConfig {
    pub(crate) diagram_id: String,
    pub(crate) proc_name: String,
    pub(crate) abbrev_prefix: String,
    pub(crate) opt_prefix: String,
    pub(crate) mode: BracketMode,
    pub(crate) bracket_symbols: Vec<String>,
    pub(crate) split_tags: (String, String),
    pub(crate) prefactor: Expr,
    pub(crate) generated_on: String,
}

impl DiagramConfig {
    /// Defaults for a diagram: prefix `abb{id}n`, optimizer prefix
    /// `abb{id}_`, bracket mode, split tags `CC`/`R2`, unit prefactor.
    #[must_use]
    pub fn new(diagram_id: impl Into<String>) -> Self {
        let id = diagram_id.into();
        Self {
            proc_name: format!("d{id}"),
            abbrev_prefix: format!("abb{id}n"),
            opt_prefix: format!("abb{id}_"),
            mode: BracketMode::Bracket,
            bracket_symbols: Vec::new(),
            split_tags: ("CC".to_owned(), "R2".to_owned()),
            prefactor: Expr::integer(1),
            generated_on: "unknown".to_owned(),
            diagram_id: id,
        }
    }

    /// Set the bracket symbol set by name.
    #[must_use]
    pub fn symbols<I>(mut self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.bracket_symbols = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the bracket symbol set from leg descriptors.
    #[must_use]
    pub fn symbols_for_legs(self, legs: &[Leg], polarisation_vectors: bool) -> Self {
        let names = kinematic_symbols(legs, polarisation_vectors);
        self.symbols(names)
    }

    /// Select bracket or anti-bracket extraction.
    #[must_use]
    pub fn extraction_mode(mut self, mode: BracketMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the abbreviation prefix.
    #[must_use]
    pub fn abbrev_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.abbrev_prefix = prefix.into();
        self
    }

    /// Override the optimizer's namespace prefix.
    #[must_use]
    pub fn optimizer_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.opt_prefix = prefix.into();
        self
    }

    /// Override the generated procedure name.
    #[must_use]
    pub fn procedure_name(mut self, name: impl Into<String>) -> Self {
        self.proc_name = name.into();
        self
    }

    /// Set the split indicator pair (primary, secondary).
    #[must_use]
    pub fn split_tags(
        mut self,
        primary: impl Into<String>,
        secondary: impl Into<String>,
    ) -> Self {
        self.split_tags = (primary.into(), secondary.into());
        self
    }

    /// Set the secondary-branch prefactor.
    #[must_use]
    pub fn prefactor(mut self, prefactor: Expr) -> Self {
        self.prefactor = prefactor;
        self
    }

    /// Set the generation timestamp written to the stream header. The
    /// driver layer owns the clock; the core never reads it.
    #[must_use]
    pub fn generated_on(mut self, timestamp: impl Into<String>) -> Self {
        self.generated_on = timestamp.into();
        self
    }

    /// The diagram identifier.
    #[must_use]
    pub fn diagram_id(&self) -> &str {
        &self.diagram_id
    }

    /// Reject invalid configurations before extraction begins.
    ///
    /// # Errors
    /// Returns [`AbbrevError::EmptySymbolSet`] for an empty bracket set.
    pub fn validate(&self) -> Result<(), AbbrevError> {
        if self.bracket_symbols.is_empty() {
            return Err(AbbrevError::EmptySymbolSet);
        }
        Ok(())
    }
}

//! Interned symbols.
//!
//! Symbols are opaque named atoms, interned globally for O(1) equality: each
//! unique name exists exactly once in the registry, and all references share
//! the same slotmap key. Two occurrences of the same name are the identical
//! symbol.

mod interned;
pub mod registry;

pub use interned::InternedSymbol;
pub use registry::{lookup_by_id, symb, symb_get, symb_interned, symbol_count, symbol_exists};

use slotmap::{DefaultKey, Key};

use crate::core::expr::Expr;

// ============================================================================
// Symbol Error Type
// ============================================================================

/// Errors that can occur during symbol operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// Attempted to get a symbol that doesn't exist.
    NotFound(String),
}

impl std::fmt::Display for SymbolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(name) => {
                write!(f, "symbol '{name}' not found; use symb() to create it")
            }
        }
    }
}

impl std::error::Error for SymbolError {}

// ============================================================================
// Public Symbol Type
// ============================================================================

/// A lightweight, `Copy` handle to an interned symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(pub(crate) DefaultKey);

impl Symbol {
    /// Reconstruct a symbol from its unique id.
    #[inline]
    #[must_use]
    pub fn from_id(id: u64) -> Self {
        Self(registry::key_from_id(id))
    }

    /// The symbol's unique id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.data().as_ffi()
    }

    /// The symbol's name.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        lookup_by_id(self.id()).map(|s| s.as_str().to_owned())
    }

    /// The full interned data for this symbol.
    #[must_use]
    pub fn interned(&self) -> Option<InternedSymbol> {
        lookup_by_id(self.id())
    }

    /// Convert to an expression node.
    ///
    /// # Panics
    ///
    /// Panics if the symbol was not created through the registry.
    #[must_use]
    pub fn to_expr(&self) -> Expr {
        let data = lookup_by_id(self.id()).expect("symbol must come from the registry");
        Expr::from_interned(data)
    }
}

impl From<Symbol> for Expr {
    fn from(s: Symbol) -> Self {
        s.to_expr()
    }
}

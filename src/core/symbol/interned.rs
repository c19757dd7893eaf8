//! Interned symbol data: the name/key pair stored in the global registry.

use std::sync::Arc;

use slotmap::{DefaultKey, Key};

/// A symbol with its registry key and name bundled together.
///
/// Cloning is cheap (`Arc<str>` name). Equality and hashing go through the
/// registry key, so two `InternedSymbol`s compare equal iff they denote the
/// same registered symbol.
#[derive(Clone, Debug)]
pub struct InternedSymbol {
    key: DefaultKey,
    name: Arc<str>,
}

impl InternedSymbol {
    pub(crate) fn new(name: &str, key: DefaultKey) -> Self {
        Self {
            key,
            name: Arc::from(name),
        }
    }

    /// The symbol's unique id (the slotmap key in FFI form).
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.key.data().as_ffi()
    }

    #[inline]
    #[must_use]
    pub const fn key(&self) -> DefaultKey {
        self.key
    }

    /// The symbol's name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The name without cloning the underlying string.
    #[must_use]
    pub fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }
}

impl PartialEq for InternedSymbol {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for InternedSymbol {}

impl std::hash::Hash for InternedSymbol {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

// Ordering is by name so canonical term order is stable across runs,
// independent of registration order. Keys break ties to keep the order total.
impl PartialOrd for InternedSymbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternedSymbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .as_ref()
            .cmp(other.name.as_ref())
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl AsRef<str> for InternedSymbol {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for InternedSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

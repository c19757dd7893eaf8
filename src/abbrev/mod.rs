//! Abbreviation table and sequence-number allocation.
//!
//! The table owns one counter per prefix (namespace). Numbers are issued
//! through a reserve/confirm pair: [`AbbrevTable::reserve`] hands out the
//! next number and bumps the counter immediately, so a dropped
//! [`Reservation`] burns its number; [`AbbrevTable::confirm`] is the only way
//! a number enters the table. Confirmed entries are never mutated or removed
//! and keep their pattern resolvable for the rest of the run.
//!
//! Distinct runs may share one table as long as each claims its own prefix;
//! a prefix claimed by two different owners is a configuration error.

mod extract;
mod writer;

pub use extract::extract_abbreviations;
pub use writer::RecordWriter;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::expr::Expr;
use crate::core::symbol::{Symbol, symb};
use crate::error::AbbrevError;

/// One confirmed abbreviation: `{prefix}{seq}` stands for `pattern`.
#[derive(Debug, Clone)]
pub struct AbbrevEntry {
    /// Namespace the entry belongs to.
    pub prefix: String,
    /// Sequence number within the prefix (starts at 1).
    pub seq: u32,
    /// The interned abbreviation symbol `{prefix}{seq}`.
    pub symbol: Symbol,
    /// The captured subexpression this abbreviation stands for.
    pub pattern: Expr,
}

impl AbbrevEntry {
    /// The fully qualified symbol name.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}{}", self.prefix, self.seq)
    }
}

/// A provisionally reserved sequence number. Confirm it to enter the table;
/// dropping it burns the number (it is never reissued).
#[must_use = "a reservation that is not confirmed burns its sequence number"]
#[derive(Debug)]
pub struct Reservation {
    prefix: String,
    seq: u32,
}

impl Reservation {
    /// The reserved sequence number.
    #[must_use]
    pub const fn seq(&self) -> u32 {
        self.seq
    }
}

#[derive(Debug, Default)]
struct Namespace {
    /// Last issued sequence number (0 before the first reservation).
    last_seq: u32,
    /// Syntactic dedup: pattern → confirmed sequence number.
    patterns: FxHashMap<Expr, u32>,
    /// Highest confirmed sequence number, for the monotonic-record assertion.
    last_confirmed: u32,
}

/// The run-scoped abbreviation table shared by all extraction calls.
#[derive(Debug, Default)]
pub struct AbbrevTable {
    namespaces: FxHashMap<String, Namespace>,
    claims: FxHashMap<String, String>,
    entries: Vec<AbbrevEntry>,
    issued_symbols: FxHashSet<u64>,
}

impl AbbrevTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a prefix for an owner (typically the diagram id). Two owners
    /// claiming one prefix is a configuration error; re-claiming by the same
    /// owner is fine (repeated extraction calls within one run).
    ///
    /// # Errors
    /// Returns [`AbbrevError::PrefixCollision`] when the prefix is already
    /// claimed by a different owner.
    pub fn claim(&mut self, prefix: &str, owner: &str) -> Result<(), AbbrevError> {
        match self.claims.get(prefix) {
            Some(existing) if existing != owner => Err(AbbrevError::PrefixCollision {
                prefix: prefix.to_owned(),
                owner: existing.clone(),
                claimant: owner.to_owned(),
            }),
            Some(_) => Ok(()),
            None => {
                self.claims.insert(prefix.to_owned(), owner.to_owned());
                Ok(())
            }
        }
    }

    /// Look up the sequence number already assigned to a syntactically
    /// identical pattern under this prefix.
    #[must_use]
    pub fn lookup(&self, prefix: &str, pattern: &Expr) -> Option<u32> {
        self.namespaces
            .get(prefix)
            .and_then(|ns| ns.patterns.get(pattern).copied())
    }

    /// Reserve the next sequence number for a prefix. Strictly increasing,
    /// starting at 1, never reused — even if the reservation is dropped.
    pub fn reserve(&mut self, prefix: &str) -> Reservation {
        let ns = self.namespaces.entry(prefix.to_owned()).or_default();
        ns.last_seq += 1;
        Reservation {
            prefix: prefix.to_owned(),
            seq: ns.last_seq,
        }
    }

    /// Confirm a reservation, binding its number to `pattern`.
    ///
    /// Returns the new entry. Panics in debug builds if the pattern is
    /// already present or the sequence number is not monotonically above all
    /// confirmed entries for the prefix — both indicate a table-consistency
    /// bug in the caller, not a recoverable condition.
    pub fn confirm(&mut self, reservation: Reservation, pattern: Expr) -> &AbbrevEntry {
        let Reservation { prefix, seq } = reservation;
        let symbol = symb(&format!("{prefix}{seq}"));

        let ns = self
            .namespaces
            .get_mut(&prefix)
            .expect("reservation implies namespace exists");
        debug_assert!(
            seq > ns.last_confirmed,
            "sequence number {seq} for prefix '{prefix}' is not monotonic"
        );
        debug_assert!(
            !ns.patterns.contains_key(&pattern),
            "pattern already abbreviated under prefix '{prefix}'"
        );
        ns.last_confirmed = seq;
        ns.patterns.insert(pattern.clone(), seq);

        self.issued_symbols.insert(symbol.id());
        self.entries.push(AbbrevEntry {
            prefix,
            seq,
            symbol,
            pattern,
        });
        self.entries.last().expect("entry just pushed")
    }

    /// Was this symbol issued as an abbreviation by this table?
    #[must_use]
    pub fn is_issued(&self, symbol_id: u64) -> bool {
        self.issued_symbols.contains(&symbol_id)
    }

    /// Resolve a (prefix, seq) pair back to its pattern.
    #[must_use]
    pub fn pattern_of(&self, prefix: &str, seq: u32) -> Option<&Expr> {
        self.entries
            .iter()
            .find(|e| e.prefix == prefix && e.seq == seq)
            .map(|e| &e.pattern)
    }

    /// All confirmed entries, in allocation order.
    #[must_use]
    pub fn entries(&self) -> &[AbbrevEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

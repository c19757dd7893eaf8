//! Global symbol registry.
//!
//! Name → key lookups are sharded over `FxHash` to keep lock contention low;
//! key → data lives in a single `SlotMap` behind an `RwLock`. A thread-local
//! name cache covers the hot path (the same handful of kinematic symbol names
//! is interned over and over while assembling bracket sets).

use std::sync::{LazyLock, Mutex, RwLock};

use rustc_hash::{FxHashMap, FxHasher};
use slotmap::{DefaultKey, SlotMap};
use std::hash::Hasher;

use super::interned::InternedSymbol;
use super::{Symbol, SymbolError};

const NUM_SHARDS: usize = 16;

struct RegistryShard {
    name_to_key: FxHashMap<String, DefaultKey>,
}

struct SymbolRegistry {
    shards: [Mutex<RegistryShard>; NUM_SHARDS],
    id_to_data: RwLock<SlotMap<DefaultKey, InternedSymbol>>,
}

impl SymbolRegistry {
    fn new() -> Self {
        let shards: [Mutex<RegistryShard>; NUM_SHARDS] = std::array::from_fn(|_| {
            Mutex::new(RegistryShard {
                name_to_key: FxHashMap::default(),
            })
        });
        Self {
            shards,
            id_to_data: RwLock::new(SlotMap::with_key()),
        }
    }

    fn shard_for(&self, name: &str) -> &Mutex<RegistryShard> {
        let mut hasher = FxHasher::default();
        std::hash::Hash::hash(name, &mut hasher);
        let idx = (hasher.finish() as usize) % NUM_SHARDS;
        &self.shards[idx]
    }
}

static REGISTRY: LazyLock<SymbolRegistry> = LazyLock::new(SymbolRegistry::new);

thread_local! {
    // Hot path: symbol set assembly and abbreviation naming intern the same
    // names repeatedly; skip the shard lock for those.
    static NAME_CACHE: std::cell::RefCell<FxHashMap<String, Symbol>> =
        std::cell::RefCell::new(FxHashMap::default());
}

/// Reconstruct a `DefaultKey` from a 64-bit id (the reverse of
/// `key.data().as_ffi()`).
#[inline]
pub fn key_from_id(id: u64) -> DefaultKey {
    slotmap::KeyData::from_ffi(id).into()
}

/// Look up the interned data for a symbol id.
///
/// # Panics
///
/// Panics if the global registry lock is poisoned.
pub fn lookup_by_id(id: u64) -> Option<InternedSymbol> {
    REGISTRY
        .id_to_data
        .read()
        .expect("global symbol registry poisoned")
        .get(key_from_id(id))
        .cloned()
}

/// Create or get a symbol by name.
///
/// # Panics
///
/// Panics if a global registry lock is poisoned.
#[must_use]
pub fn symb(name: &str) -> Symbol {
    if let Some(sym) = NAME_CACHE.with(|cache| cache.borrow().get(name).copied()) {
        return sym;
    }

    let shard_lock = REGISTRY.shard_for(name);
    let mut shard = shard_lock.lock().expect("symbol registry shard poisoned");

    let key = match shard.name_to_key.get(name) {
        Some(&key) => key,
        None => {
            let key = REGISTRY
                .id_to_data
                .write()
                .expect("global symbol registry poisoned")
                .insert_with_key(|k| InternedSymbol::new(name, k));
            shard.name_to_key.insert(name.to_owned(), key);
            key
        }
    };
    drop(shard);

    let sym = Symbol(key);
    NAME_CACHE.with(|cache| {
        cache.borrow_mut().insert(name.to_owned(), sym);
    });
    sym
}

/// Get an existing symbol by name.
///
/// # Errors
/// Returns `SymbolError::NotFound` if the name is not registered.
///
/// # Panics
///
/// Panics if the registry shard lock is poisoned.
pub fn symb_get(name: &str) -> Result<Symbol, SymbolError> {
    let shard_lock = REGISTRY.shard_for(name);
    let shard = shard_lock.lock().expect("symbol registry shard poisoned");
    shard
        .name_to_key
        .get(name)
        .map(|&key| Symbol(key))
        .ok_or_else(|| SymbolError::NotFound(name.to_owned()))
}

/// Get or create an interned symbol (key + name bundle).
///
/// # Panics
///
/// Panics if a global registry lock is poisoned.
pub fn symb_interned(name: &str) -> InternedSymbol {
    let symbol = symb(name);
    lookup_by_id(symbol.id()).expect("just-created symbol must be registered")
}

/// Check whether a name is registered.
///
/// # Panics
///
/// Panics if the registry shard lock is poisoned.
pub fn symbol_exists(name: &str) -> bool {
    let shard_lock = REGISTRY.shard_for(name);
    let shard = shard_lock.lock().expect("symbol registry shard poisoned");
    shard.name_to_key.contains_key(name)
}

/// Number of registered symbols.
///
/// # Panics
///
/// Panics if the global registry lock is poisoned.
pub fn symbol_count() -> usize {
    REGISTRY
        .id_to_data
        .read()
        .expect("global symbol registry poisoned")
        .len()
}

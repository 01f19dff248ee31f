//! Per-decoder instruction cache: a content-addressed map from schema hash
//! (plus caller affinity id) to a compiled [`Program`]. Readers hold the
//! lock only for the lookup; compilation happens outside it, and a race on
//! insert is benign — the first writer wins and later compilers adopt the
//! winning program.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::decode::Program;

type AddedHook = Box<dyn Fn(u32) + Send + Sync>;

pub struct InstructionCache<T> {
    map: RwLock<HashMap<(u32, u64), Arc<Program<T>>>>,
    added: Option<AddedHook>,
}

impl<T> Default for InstructionCache<T> {
    fn default() -> Self {
        InstructionCache::new()
    }
}

impl<T> InstructionCache<T> {
    pub fn new() -> InstructionCache<T> {
        InstructionCache {
            map: RwLock::new(HashMap::new()),
            added: None,
        }
    }

    /// Installs a hook observing newly inserted hashes. The hook runs under
    /// the write lock and must not re-enter the cache or block.
    pub fn on_added(&mut self, hook: impl Fn(u32) + Send + Sync + 'static) {
        self.added = Some(Box::new(hook));
    }

    pub fn get(&self, hash: u32, affinity: u64) -> Option<Arc<Program<T>>> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(hash, affinity))
            .cloned()
    }

    /// Inserts a freshly compiled program, returning whichever program is
    /// authoritative for the hash after the insert.
    pub fn insert(&self, hash: u32, affinity: u64, program: Arc<Program<T>>) -> Arc<Program<T>> {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        let entry = map.entry((hash, affinity)).or_insert_with(|| {
            log::trace!("instruction cache insert for schema hash {hash}");
            if let Some(hook) = &self.added {
                hook(hash);
            }
            program
        });
        Arc::clone(entry)
    }

    pub fn contains(&self, hash: u32, affinity: u64) -> bool {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(hash, affinity))
    }

    pub fn len(&self) -> usize {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Caller-supplied decode state: an external instruction cache plus an
/// affinity id folded into the cache key.
pub struct DecodeContext<'a, T> {
    pub cache: &'a InstructionCache<T>,
    pub affinity: u64,
}

impl<'a, T> DecodeContext<'a, T> {
    pub fn new(cache: &'a InstructionCache<T>) -> DecodeContext<'a, T> {
        DecodeContext { cache, affinity: 0 }
    }

    pub fn with_affinity(cache: &'a InstructionCache<T>, affinity: u64) -> DecodeContext<'a, T> {
        DecodeContext { cache, affinity }
    }
}

//! The mutable top run (`curr`): a thin, SM-flavoured facade over
//! [llrb::Index], since the bulk-built run format in [crate::run] cannot
//! absorb single-key inserts. Grounded on `llrb::Index`'s API, not its
//! implementation — a fresh [llrb::Index] is exactly the mutable-run
//! primitive the stepped-merge design calls for.

use crate::{db, llrb, Result};

/// The mutable top run. Every insert lands here first; once it accumulates
/// `max_inmem_tuples` entries it is handed to the merge engine and replaced
/// by a fresh, empty one.
pub struct MutableRun<K, V = u64>
where
    K: Clone + Ord + db::Footprint,
    V: Clone + db::Diff + db::Footprint,
    <V as db::Diff>::Delta: db::Footprint,
{
    inner: llrb::Index<K, V>,
}

impl<K, V> MutableRun<K, V>
where
    K: Clone + Ord + db::Footprint,
    V: Clone + db::Diff + db::Footprint,
    <V as db::Diff>::Delta: db::Footprint,
{
    /// Create a fresh, empty mutable run identified by `name`.
    pub fn new(name: &str) -> MutableRun<K, V> {
        MutableRun {
            inner: llrb::Index::new(name, false /* spin */),
        }
    }

    /// Insert or overwrite `key` with `value`. Returns the superseded entry,
    /// if one existed.
    pub fn insert(&self, key: K, value: V) -> Result<Option<db::Entry<K, V>>> {
        Ok(self.inner.set(key, value)?.old_entry)
    }

    /// Point lookup.
    pub fn get<Q>(&self, key: &Q) -> Result<db::Entry<K, V>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.get(key)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Sorted, full-table iterator, the shape [crate::run::Builder] expects
    /// when bulk-loading this run's contents into an immutable run at flush
    /// time.
    pub fn iter(&self) -> Result<impl Iterator<Item = db::Entry<K, V>>> {
        self.inner.iter()
    }

    pub fn to_seqno(&self) -> u64 {
        self.inner.to_seqno()
    }
}

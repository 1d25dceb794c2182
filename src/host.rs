//! External-collaborator seam (§6): the host primitives the core calls into
//! to materialise, open and destroy run relations, and to build per-attribute
//! sort-support. [FsRunCatalog] is the one concrete implementation this
//! crate provides, backing runs with plain files under a directory instead
//! of a host buffer manager / DDL layer — everything else in this crate
//! talks only to the [RunCatalog] trait.

use std::{
    cmp, ffi, fs,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{db, run, Result};

/// Opaque handle to a run relation, handed out by the catalog. The core
/// never interprets this value; it only stores it in the manifest.
pub type RunId = u64;

/// DDL seam: create, open and destroy run relations. A real embedding would
/// implement this against the host's catalog/buffer-manager/WAL rather than
/// plain files, exactly as [FsRunCatalog] does here.
pub trait RunCatalog<K, V, B>
where
    K: db::RunKey,
    V: db::RunValue,
    B: db::Bloom,
{
    /// Allocate a fresh mutable top run (`curr`). Used at build time and
    /// whenever `curr` is promoted and replaced.
    fn new_curr(&self) -> Result<(RunId, run::mutable::MutableRun<K, V>)>;

    /// Bulk-load `iter` (already sorted) into a brand-new immutable run.
    /// Used both for promoting `curr` into level 0 and for merge outputs.
    fn define_run<I>(&self, iter: I, bitmap: B, seqno: Option<u64>) -> Result<RunId>
    where
        I: Iterator<Item = db::Entry<K, V>>;

    /// Open a previously defined run for reading.
    fn open_run(&self, id: RunId) -> Result<run::Run<K, V, B>>;

    /// Destroy a run's backing storage. Only called by the merge engine
    /// after the manifest referencing the replacement has been durably
    /// stored, and only once no live scan still references it (§5).
    fn drop_run(&self, id: RunId) -> Result<()>;
}

/// [RunCatalog] backed by plain files under a directory: `curr-<id>` is a
/// name handed to [run::mutable::MutableRun], `run-<id>` is the on-disk name
/// of a bulk-built [run::Run].
pub struct FsRunCatalog {
    dir: ffi::OsString,
    next_id: AtomicU64,
}

impl FsRunCatalog {
    pub fn new(dir: &ffi::OsStr) -> Result<FsRunCatalog> {
        err_at!(IOError, fs::create_dir_all(dir))?;
        Ok(FsRunCatalog {
            dir: dir.to_os_string(),
            next_id: AtomicU64::new(1),
        })
    }

    fn alloc_id(&self) -> RunId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn run_name(&self, id: RunId) -> String {
        format!("run-{:020}", id)
    }

    fn curr_name(&self, id: RunId) -> String {
        format!("curr-{:020}", id)
    }
}

impl<K, V, B> RunCatalog<K, V, B> for FsRunCatalog
where
    K: db::RunKey,
    V: db::RunValue,
    B: db::Bloom,
{
    fn new_curr(&self) -> Result<(RunId, run::mutable::MutableRun<K, V>)> {
        let id = self.alloc_id();
        let curr = run::mutable::MutableRun::new(&self.curr_name(id));
        Ok((id, curr))
    }

    fn define_run<I>(&self, iter: I, bitmap: B, seqno: Option<u64>) -> Result<RunId>
    where
        I: Iterator<Item = db::Entry<K, V>>,
    {
        let id = self.alloc_id();
        let name = self.run_name(id);
        let config = run::Config::new(&self.dir, &name);
        let mut builder: run::RunBuilder<K, V> = run::RunBuilder::initial(config, Vec::new())?;
        db::BuildIndex::build_index(&mut builder, iter, bitmap, seqno)?;
        Ok(id)
    }

    fn open_run(&self, id: RunId) -> Result<run::Run<K, V, B>> {
        run::Run::open(&self.dir, &self.run_name(id))
    }

    fn drop_run(&self, id: RunId) -> Result<()> {
        let name = self.run_name(id);
        let iloc = run::to_index_location(&self.dir, &name);
        err_at!(PurgeFile, fs::remove_file(&iloc))?;
        let vloc = run::to_vlog_location(&self.dir, &name);
        fs::remove_file(&vloc).ok(); // vlog file is optional, depending on config
        Ok(())
    }
}

/// Per-attribute comparator construction (§6's
/// `prepare_sort_support_from_index_rel`). The host builds this from
/// collation, nulls-first and ASC/DESC flags; this crate's keys are plain
/// Rust values, so the only sort-support it needs collapses to `K`'s own
/// [Ord] implementation.
pub trait SortSupport<K> {
    fn compare(&self, a: &K, b: &K) -> cmp::Ordering;
}

/// The only [SortSupport] this crate provides: delegate to `K: Ord`.
#[derive(Clone, Copy, Default, Debug)]
pub struct NativeOrd;

impl<K: Ord> SortSupport<K> for NativeOrd {
    fn compare(&self, a: &K, b: &K) -> cmp::Ordering {
        a.cmp(b)
    }
}

#[cfg(test)]
#[path = "host_test.rs"]
mod host_test;

//! Component G: the AM facade (§4.G) — the operation vector and capability
//! flags a host would dispatch index operations through. [SmIndex] bundles
//! the manifest, the mutable top run and the run catalog behind the
//! build/insert/scan/vacuum/cost-estimate surface §6 enumerates.

use std::{ffi, fs, marker::PhantomData};

use crate::{
    config::Config,
    db, host, insert,
    manifest::{self, Manifest},
    run,
    scan::{self, Scan},
    Result,
};

/// §4.G capability flags. Cross-run uniqueness is unresolved at the AM
/// level (§9 Open Question 4): the sub-run primitive enforces uniqueness
/// within a single run when [Config::unique] is set, but nothing checks
/// across runs, so `can_unique` stays false rather than overclaiming — see
/// DESIGN.md.
#[derive(Clone, Copy, Debug)]
pub struct Capabilities {
    pub can_unique: bool,
    pub can_multicol: bool,
    pub can_order: bool,
    pub can_backward: bool,
    pub pred_locks: bool,
}

pub const CAPABILITIES: Capabilities = Capabilities {
    can_unique: false,
    can_multicol: true,
    can_order: false,
    can_backward: false,
    pred_locks: false,
};

/// No-op bulk-delete/vacuum-cleanup statistics. §9 Open Question 5: entry
/// deletion has no tombstone design yet, so there is nothing for either
/// operation to report.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VacuumStats {
    pub num_pages: usize,
    pub num_index_tuples: usize,
    pub tuples_removed: usize,
}

impl db::ToJson for VacuumStats {
    fn to_json(&self) -> String {
        format!(
            concat!(
                r#"{{ "vacuum": {{ "num_pages": {}, "#,
                r#""num_index_tuples": {}, "tuples_removed": {} }} }}"#,
            ),
            self.num_pages, self.num_index_tuples, self.tuples_removed,
        )
    }
}

/// §6's planner-facing cost shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostEstimate {
    pub startup_cost: f64,
    pub total_cost: f64,
    pub selectivity: f64,
    pub correlation: f64,
}

impl db::ToJson for CostEstimate {
    fn to_json(&self) -> String {
        format!(
            concat!(
                r#"{{ "cost_estimate": {{ "startup_cost": {}, "total_cost": {}, "#,
                r#""selectivity": {}, "correlation": {} }} }}"#,
            ),
            self.startup_cost, self.total_cost, self.selectivity, self.correlation,
        )
    }
}

/// Per-tuple cost weight `cost_estimate` scales by — a stand-in for the
/// planner's real per-page I/O cost constants, which this crate has no
/// buffer manager to derive (§9 Open Question 2: scale with live-run size
/// rather than returning a fixed near-zero constant).
const COST_PER_TUPLE: f64 = 0.01;

/// The AM facade's handle on one stepped-merge index: the manifest, the
/// catalog of run relations, the comparator construction, and the mutable
/// top run currently receiving inserts.
///
/// `curr` lives only in this struct's memory for the process's lifetime —
/// unlike the numbered-level and root runs, which [host::RunCatalog]
/// materialises durably, `curr` is a [run::mutable::MutableRun] (an
/// in-memory LLRB tree) with no on-disk representation of its own. A real
/// embedding's host buffer manager would keep `curr` resident the same
/// way; this crate has no process-crossing persistence story for it, which
/// is recorded as a deliberate limitation in DESIGN.md rather than guessed
/// at.
pub struct SmIndex<K, B, C, S = host::NativeOrd>
where
    K: db::RunKey,
    B: db::Bloom + Default,
    C: host::RunCatalog<K, db::Tid, B>,
    S: host::SortSupport<K>,
{
    dir: ffi::OsString,
    name: String,
    config: Config,
    catalog: C,
    sort_support: S,
    manifest: Manifest,
    curr: run::mutable::MutableRun<K, db::Tid>,
    _bitmap: PhantomData<B>,
}

impl<K, B, C, S> SmIndex<K, B, C, S>
where
    K: db::RunKey,
    B: db::Bloom + Default,
    C: host::RunCatalog<K, db::Tid, B>,
    S: host::SortSupport<K>,
{
    /// §4.G `build`: create the first run via the DDL path, initialise the
    /// manifest (`levels[*]=0`, `tree[*][*]=NIL`, `curr=<new run>`,
    /// `root=NIL`, `currTuples=0`) and persist it.
    pub fn build(
        dir: &ffi::OsStr,
        name: &str,
        config: Config,
        catalog: C,
        sort_support: S,
    ) -> Result<Self> {
        config.validate()?;
        let (curr_id, curr) = catalog.new_curr()?;
        let manifest = Manifest::new(&config, curr_id)?;
        manifest::store(dir, name, &manifest)?;
        Ok(SmIndex {
            dir: dir.to_os_string(),
            name: name.to_string(),
            config,
            catalog,
            sort_support,
            manifest,
            curr,
            _bitmap: PhantomData,
        })
    }

    /// §4.G `build-empty`: the init-fork placeholder a host needs for
    /// unlogged-index initialisation semantics. This crate has no init
    /// fork to write a metapage into, so the stand-in is an empty marker
    /// file beside the manifest, written and synced immediately.
    pub fn build_empty(dir: &ffi::OsStr, name: &str) -> Result<()> {
        let mut path = std::path::PathBuf::from(dir);
        path.push(format!("{}.init", name));
        let fd = err_at!(IOError, fs::File::create(&path))?;
        err_at!(IOError, fd.sync_all())?;
        Ok(())
    }

    /// Reopen an index previously created with [SmIndex::build]. The
    /// caller supplies the `curr` it has held in memory since build (or
    /// the last `open`) — see the struct-level note on why this crate
    /// cannot rehydrate `curr` from the manifest alone.
    pub fn open(
        dir: &ffi::OsStr,
        name: &str,
        config: Config,
        catalog: C,
        sort_support: S,
        curr: run::mutable::MutableRun<K, db::Tid>,
    ) -> Result<Self> {
        let manifest = manifest::load(dir, name)?;
        Ok(SmIndex {
            dir: dir.to_os_string(),
            name: name.to_string(),
            config,
            catalog,
            sort_support,
            manifest,
            curr,
            _bitmap: PhantomData,
        })
    }

    /// §4.D `insert(key, tid, heapRel, uniqueCheck)`.
    pub fn insert(&mut self, key: K, tid: db::Tid) -> Result<()> {
        insert::insert(
            &self.dir,
            &self.name,
            &mut self.manifest,
            &mut self.curr,
            &self.catalog,
            &self.sort_support,
            self.config.max_inmem_tuples,
            key,
            tid,
        )
    }

    /// §4.F `begin_scan(rel, nkeys, norderbys)`.
    pub fn begin_scan(&self, range: scan::KeyRange<K>) -> Result<Scan<'_, K, B, C>> {
        let manifest = manifest::load(&self.dir, &self.name)?;
        Scan::begin(&self.catalog, manifest, &self.curr, range)
    }

    /// §4.F `rescan(scan, keys, orderbys)`.
    pub fn rescan(&self, scan: &mut Scan<'_, K, B, C>, range: scan::KeyRange<K>) -> Result<()> {
        scan.rescan(&self.curr, range)
    }

    /// §4.F `next(scan, dir) -> tuple | end`. Forward-only: [CAPABILITIES]
    /// declares `can_backward = false`.
    pub fn next(&self, scan: &mut Scan<'_, K, B, C>) -> Result<Option<(K, db::Tid)>> {
        let entry = match scan.next()? {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let tid = match entry.to_value() {
            Some(tid) => tid,
            None => err_at!(Fatal, msg: "index entry carries no tid — tombstones are unsupported")?,
        };
        Ok(Some((entry.to_key(), tid)))
    }

    /// §4.F `end_scan`: no resource outlives the [Scan] value itself in
    /// this crate, so ending a scan is just dropping it.
    pub fn end_scan(&self, scan: Scan<'_, K, B, C>) {
        drop(scan)
    }

    /// §4.G `bulk-delete`/`amvacuumcleanup`: no-op (§9 Open Question 5 —
    /// there is no tombstone scheme to sweep yet).
    pub fn bulk_delete(&self) -> VacuumStats {
        VacuumStats::default()
    }

    pub fn vacuum_cleanup(&self) -> VacuumStats {
        VacuumStats::default()
    }

    /// §4.G `can-return-index-only`: every run stores the full key and
    /// its TID, so index-only scans are always satisfiable.
    pub fn can_return(&self) -> bool {
        true
    }

    /// §4.G `cost-estimate` (§9 Open Question 2): scale with the sum of
    /// live run tuple counts rather than a fixed near-zero constant, so
    /// the planner doesn't treat an index with millions of entries as
    /// free.
    pub fn cost_estimate(&self) -> Result<CostEstimate> {
        let mut tuples = self.manifest.curr_tuples;
        for (level, occupancy) in self.manifest.tree.iter().zip(self.manifest.levels.iter()) {
            for slot in level.iter().take(*occupancy).flatten() {
                tuples += self.catalog.open_run(*slot)?.len();
            }
        }
        if let Some(id) = self.manifest.root {
            tuples += self.catalog.open_run(id)?.len();
        }
        Ok(CostEstimate {
            startup_cost: 0.0,
            total_cost: tuples as f64 * COST_PER_TUPLE,
            selectivity: 0.0,
            correlation: 0.9,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

#[cfg(test)]
#[path = "am_test.rs"]
mod am_test;

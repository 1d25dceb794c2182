//! Component D: the insert path (§4.D). Routes a new `(key, tid)` pair into
//! the mutable top run, promotes it to level 0 once it overflows, and hands
//! off to the merge engine (component E) to re-establish invariant 3 (no
//! level holds `K` runs) before the manifest is persisted.

use std::ffi;

use crate::{
    db, host,
    manifest::{self, Manifest},
    merge,
    run::{self, ZBLOCKSIZE},
    Result,
};

/// §4.D `insert(key, tid, heapRel, uniqueCheck)`. `dir`/`name` locate the
/// manifest; `max_inmem_tuples` is the `MAX_INMEM_TUPLES` design constant
/// bounding `curr`'s working-set size before promotion.
#[allow(clippy::too_many_arguments)]
pub fn insert<K, B, C, S>(
    dir: &ffi::OsStr,
    name: &str,
    manifest: &mut Manifest,
    curr: &mut run::mutable::MutableRun<K, db::Tid>,
    catalog: &C,
    sort_support: &S,
    max_inmem_tuples: usize,
    key: K,
    tid: db::Tid,
) -> Result<()>
where
    K: db::RunKey,
    B: db::Bloom + Default,
    C: host::RunCatalog<K, db::Tid, B>,
    S: host::SortSupport<K>,
{
    // §4.D.1: load manifest.
    *manifest = manifest::load(dir, name)?;

    oversize_check(&key, tid)?;

    // §4.D.2: insert into `curr`. Uniqueness delegates to the sub-run
    // primitive when `unique` is set; cross-run uniqueness is not enforced
    // here (§9 Open Question 4 — see DESIGN.md).
    if manifest.unique && curr.get(&key).is_ok() {
        err_at!(UniqueViolation, msg: "duplicate key in current top run")?;
    }
    curr.insert(key, tid)?;

    // §4.D.3: promote `curr` into level 0 once it overflows.
    manifest.curr_tuples += 1;
    if manifest.curr_tuples >= max_inmem_tuples {
        promote(manifest, curr, catalog)?;
    }

    // §4.D.4: re-establish invariant 3.
    merge::maybe_flush(dir, name, manifest, catalog, sort_support)?;

    // §4.D.5: store manifest.
    manifest::store(dir, name, manifest)?;
    Ok(())
}

/// §7 `OversizeTuple`: a single index tuple — key plus TID — exceeding 1/3
/// of a page is fatal to the containing insert.
fn oversize_check<K>(key: &K, tid: db::Tid) -> Result<()>
where
    K: db::Footprint,
{
    let limit = (ZBLOCKSIZE / 3) as isize;
    if key.footprint()? + tid.footprint()? > limit {
        err_at!(OversizeTuple, msg: "index tuple footprint exceeds 1/3 of a block")?;
    }
    Ok(())
}

/// Close `curr`, append it to level 0, and replace it with a fresh, empty
/// top run (§4.D.3).
fn promote<K, B, C>(
    manifest: &mut Manifest,
    curr: &mut run::mutable::MutableRun<K, db::Tid>,
    catalog: &C,
) -> Result<()>
where
    K: db::RunKey,
    B: db::Bloom + Default,
    C: host::RunCatalog<K, db::Tid, B>,
{
    let entries = curr.iter()?;
    let run_id = catalog.define_run(entries, B::default(), None)?;

    let slot = manifest.levels[0];
    manifest.tree[0][slot] = Some(run_id);
    manifest.levels[0] += 1;

    let (new_id, new_curr) = catalog.new_curr()?;
    manifest.curr = new_id;
    *curr = new_curr;
    manifest.curr_tuples = 0;
    Ok(())
}

#[cfg(test)]
#[path = "insert_test.rs"]
mod insert_test;

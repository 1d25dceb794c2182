//! Component F: the cross-run scan engine (§4.F). Presents a single,
//! unordered logical index by concatenating `curr`'s entries with every
//! live run's entries, one run at a time.

use std::{
    marker::PhantomData,
    ops::{Bound, RangeBounds},
};

use crate::{db, host, manifest::Manifest, run, Result};

/// A half-open key range pushed down into each run's own ordered scan.
/// §1's non-goal excludes multi-attribute range predicates *across* runs;
/// a single-attribute range against the sole indexed key is still honoured
/// per run, since the run primitive already supports it.
pub type KeyRange<K> = (Bound<K>, Bound<K>);

/// The full-index range: every key.
pub fn unbounded<K>() -> KeyRange<K> {
    (Bound::Unbounded, Bound::Unbounded)
}

/// §4.F's outer iterator position. `Curr` and the sentinel pair
/// `currLevel == -1`/`currLevel == N` collapse into this
/// enum's variants; `seek` is the "increment currPos; while currLevel ==
/// -1 or currPos >= levels[currLevel], zero currPos and advance
/// currLevel" loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    Curr,
    Tree(usize, usize),
    Root,
    Done,
}

fn seek(manifest: &Manifest, mut level: usize, mut pos: usize) -> Cursor {
    loop {
        if level >= manifest.n {
            return match manifest.root {
                Some(_) => Cursor::Root,
                None => Cursor::Done,
            };
        }
        if pos < manifest.levels[level] {
            return Cursor::Tree(level, pos);
        }
        level += 1;
        pos = 0;
    }
}

/// A single logical scan over `curr` plus every live run named in a
/// manifest snapshot taken at [Scan::begin] (§4.F, §5). A concurrent merge
/// may drop a run this scan still references after that snapshot; §5
/// requires the host defer the physical drop until every referencing scan
/// has ended — this crate's `FsRunCatalog::drop_run` has no such
/// deferral, so running a scan concurrently with a merge that could
/// consume one of its runs is this embedding's own responsibility to
/// avoid (see DESIGN.md).
pub struct Scan<'a, K, B, C>
where
    K: db::RunKey,
    B: db::Bloom,
    C: host::RunCatalog<K, db::Tid, B>,
{
    catalog: &'a C,
    manifest: Manifest,
    range: KeyRange<K>,
    cursor: Cursor,
    inner: std::vec::IntoIter<db::Entry<K, db::Tid>>,
    _bitmap: PhantomData<B>,
}

impl<'a, K, B, C> Scan<'a, K, B, C>
where
    K: db::RunKey,
    B: db::Bloom,
    C: host::RunCatalog<K, db::Tid, B>,
{
    /// §4.F `begin_scan(rel, nkeys, norderbys)`: snapshot the manifest and
    /// open `curr` — the initial inner scan, `currLevel == -1`.
    pub fn begin(
        catalog: &'a C,
        manifest: Manifest,
        curr: &run::mutable::MutableRun<K, db::Tid>,
        range: KeyRange<K>,
    ) -> Result<Scan<'a, K, B, C>> {
        let inner = curr
            .iter()?
            .filter(|e| range.contains(e.as_key()))
            .collect::<Vec<_>>()
            .into_iter();
        Ok(Scan {
            catalog,
            manifest,
            cursor: Cursor::Curr,
            inner,
            range,
            _bitmap: PhantomData,
        })
    }

    /// §4.F `rescan(scan, keys, orderbys)`: propagate new scan keys to the
    /// inner scan and restart from `curr`.
    pub fn rescan(
        &mut self,
        curr: &run::mutable::MutableRun<K, db::Tid>,
        range: KeyRange<K>,
    ) -> Result<()> {
        self.inner = curr
            .iter()?
            .filter(|e| range.contains(e.as_key()))
            .collect::<Vec<_>>()
            .into_iter();
        self.range = range;
        self.cursor = Cursor::Curr;
        Ok(())
    }

    fn open_filtered(&self, id: host::RunId) -> Result<std::vec::IntoIter<db::Entry<K, db::Tid>>> {
        let mut run = self.catalog.open_run(id)?;
        let entries = run.iter(self.range.clone())?.collect::<Result<Vec<_>>>()?;
        Ok(entries.into_iter())
    }

    /// §4.F `next(scan, dir) -> tuple | end`. Forward-only — the AM
    /// facade's capability record declares `can_backward = false`.
    pub fn next(&mut self) -> Result<Option<db::Entry<K, db::Tid>>> {
        loop {
            if let Some(entry) = self.inner.next() {
                return Ok(Some(entry));
            }
            self.cursor = match self.cursor {
                Cursor::Curr => seek(&self.manifest, 0, 0),
                Cursor::Tree(level, pos) => seek(&self.manifest, level, pos + 1),
                Cursor::Root | Cursor::Done => Cursor::Done,
            };
            match self.cursor {
                Cursor::Tree(level, pos) => {
                    let id = match self.manifest.tree[level][pos] {
                        Some(id) => id,
                        None => {
                            err_at!(CorruptMetadata, msg: "tree[{}][{}] should be occupied", level, pos)?
                        }
                    };
                    self.inner = self.open_filtered(id)?;
                }
                Cursor::Root => {
                    let id = match self.manifest.root {
                        Some(id) => id,
                        None => err_at!(CorruptMetadata, msg: "root should be occupied")?,
                    };
                    self.inner = self.open_filtered(id)?;
                }
                Cursor::Done => return Ok(None),
                Cursor::Curr => unreachable!("seek never returns to Curr"),
            }
        }
    }
}

#[cfg(test)]
#[path = "scan_test.rs"]
mod scan_test;

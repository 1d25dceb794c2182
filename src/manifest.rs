//! Component B: the persistent manifest describing every live run, and the
//! crash-atomic load/store contract a host's metapage + WAL would normally
//! provide (component C, the page I/O shim, is folded in here: a
//! write-to-temp-then-rename plus a checksum trailer is this crate's
//! analogue of a single WAL-logged whole-page write).

use cbordata::Cborize;
use crc::{Crc, CRC_32_ISO_HDLC};

use std::{
    convert::TryInto,
    ffi, fs,
    io::Write as _,
    path::{Path, PathBuf},
};

use crate::{config::Config, host::RunId, util, Result};

const MANIFEST_VER: u32 = 0x000a0001;
const CHECKSUM: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Persistent, fixed-shape description of every run making up one
/// stepped-merge index: which runs occupy which level slots, the mutable
/// top run currently receiving inserts, the root run beyond the deepest
/// level, and the tuple count accumulated in `curr` since it was created.
///
/// Re-established at recovery (§3 invariants 1-5), re-read at the start of
/// every public operation and re-written at its end (§5): no core-owned
/// mutable state outlives a single call.
#[derive(Clone, Debug, PartialEq, Cborize)]
pub struct Manifest {
    /// Fan-out per level.
    pub k: usize,
    /// Number of numbered levels, 0 .. n-1.
    pub n: usize,
    /// Number of indexed attributes.
    pub attnum: usize,
    /// Indexed attribute numbers, in key order, length `attnum`.
    pub attrs: Vec<usize>,
    /// Number of live runs at each level, length `n`, each in `0..=k`.
    pub levels: Vec<usize>,
    /// `tree[i][j]` is the RunId at level `i`, slot `j`, or `None` (NIL).
    /// Outer length `n`, inner length `k`.
    pub tree: Vec<Vec<Option<RunId>>>,
    /// The mutable top run currently receiving inserts.
    pub curr: RunId,
    /// The single run beyond level `n-1`, `None` until the first deep merge.
    pub root: Option<RunId>,
    /// Tuples accumulated in `curr` since it was created.
    pub curr_tuples: usize,
    /// Whether this index enforces/records key uniqueness.
    pub unique: bool,
}

impl Manifest {
    const ID: u32 = MANIFEST_VER;

    /// Build the manifest for a freshly created, empty index: every level
    /// empty, `root` NIL, `curr` pointing at the run the caller just
    /// allocated.
    pub fn new(config: &Config, curr: RunId) -> Result<Manifest> {
        config.validate()?;
        Ok(Manifest {
            k: config.k,
            n: config.n,
            attnum: config.attnum,
            attrs: (0..config.attnum).collect(),
            levels: vec![0; config.n],
            tree: vec![vec![None; config.k]; config.n],
            curr,
            root: None,
            curr_tuples: 0,
            unique: config.unique,
        })
    }

    /// Re-check the shape invariants that don't require consulting `curr`
    /// or the run catalog (§3 invariants 1 and 4; invariant 2 is the
    /// insert path's job, invariant 3 the merge engine's).
    pub fn validate(&self) -> Result<()> {
        if self.levels.len() != self.n || self.tree.len() != self.n {
            err_at!(CorruptMetadata, msg: "manifest level count mismatch")?;
        }
        let mut seen = std::collections::HashSet::new();
        seen.insert(self.curr);
        for (i, occupancy) in self.levels.iter().enumerate() {
            if *occupancy > self.k {
                err_at!(CorruptMetadata, msg: "level {} occupancy {} > k {}", i, occupancy, self.k)?;
            }
            let slots = &self.tree[i];
            if slots.len() != self.k {
                err_at!(CorruptMetadata, msg: "level {} has {} slots, want {}", i, slots.len(), self.k)?;
            }
            for (j, slot) in slots.iter().enumerate() {
                match (j < *occupancy, slot) {
                    (true, Some(id)) => {
                        if !seen.insert(*id) {
                            err_at!(CorruptMetadata, msg: "run {} referenced twice", id)?;
                        }
                    }
                    (true, None) => {
                        err_at!(CorruptMetadata, msg: "level {} slot {} should be occupied", i, j)?;
                    }
                    (false, None) => (),
                    (false, Some(_)) => {
                        err_at!(CorruptMetadata, msg: "level {} slot {} should be NIL", i, j)?;
                    }
                }
            }
        }
        if let Some(id) = self.root {
            if !seen.insert(id) {
                err_at!(CorruptMetadata, msg: "root run {} also referenced elsewhere", id)?;
            }
        }
        Ok(())
    }

    /// Is level `i` saturated (at capacity `k`, the transient state the
    /// merge engine must immediately reduce)?
    pub fn is_saturated(&self, level: usize) -> bool {
        self.levels[level] == self.k
    }
}

impl crate::db::ToJson for Manifest {
    fn to_json(&self) -> String {
        format!(
            concat!(
                r#"{{ "manifest": {{ "k": {}, "n": {}, "#,
                r#""levels": {:?}, "curr": {}, "root": {:?}, "#,
                r#""curr_tuples": {}, "unique": {} }} }}"#,
            ),
            self.k, self.n, self.levels, self.curr, self.root, self.curr_tuples, self.unique,
        )
    }
}

fn manifest_location(dir: &ffi::OsStr, name: &str) -> PathBuf {
    let mut path = PathBuf::from(dir);
    path.push(format!("{}.manifest", name));
    path
}

fn manifest_temp_location(dir: &ffi::OsStr, name: &str) -> PathBuf {
    let mut path = PathBuf::from(dir);
    path.push(format!("{}.manifest.tmp", name));
    path
}

/// Persist `manifest` under `dir/name.manifest`. Writes the encoded record
/// plus a CRC32 trailer to a temp file, fsyncs it, then renames it over the
/// final path — the rename is atomic at the filesystem level, this crate's
/// analogue of a single WAL-logged whole-page write (§4.B/§4.C).
pub fn store(dir: &ffi::OsStr, name: &str, manifest: &Manifest) -> Result<()> {
    let mut buf = util::into_cbor_bytes(manifest.clone())?;
    let checksum = CHECKSUM.checksum(&buf);
    buf.extend_from_slice(&checksum.to_be_bytes());

    let temp_path = manifest_temp_location(dir, name);
    {
        let mut fd = err_at!(IOError, fs::File::create(&temp_path))?;
        err_at!(IOError, fd.write_all(&buf))?;
        err_at!(IOError, fd.sync_all())?;
    }
    err_at!(IOError, fs::rename(&temp_path, manifest_location(dir, name)))?;
    Ok(())
}

/// Load the manifest from `dir/name.manifest`, validating its checksum and
/// shape. A checksum mismatch or shape violation is `CorruptMetadata`,
/// fatal to the caller (§4.B, §7).
pub fn load(dir: &ffi::OsStr, name: &str) -> Result<Manifest> {
    let path = manifest_location(dir, name);
    let buf = err_at!(IOError, fs::read(&path))?;
    check_remaining!(buf, 4, "manifest checksum trailer")?;

    let at = buf.len() - 4;
    let (body, trailer) = buf.split_at(at);
    let want = u32::from_be_bytes(trailer.try_into().unwrap());
    let got = CHECKSUM.checksum(body);
    if want != got {
        err_at!(CorruptMetadata, msg: "manifest checksum mismatch {:?}", path)?;
    }

    let (manifest, _): (Manifest, usize) = util::from_cbor_bytes(body)?;
    manifest.validate()?;
    Ok(manifest)
}

/// Does a manifest already exist at `dir/name.manifest`?
pub fn exists(dir: &ffi::OsStr, name: &str) -> bool {
    Path::new(&manifest_location(dir, name)).exists()
}

#[cfg(test)]
#[path = "manifest_test.rs"]
mod manifest_test;

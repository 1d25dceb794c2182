//! Immutable, sorted run format: the on-disk representation for one numbered
//! level's runs, and for the root run beyond the deepest level.
//!
//! Use [Builder] to build a new run from a pre-sorted iterator — bulk-built,
//! never mutated in place once flushed. Subsequently open the run for reading
//! with [Index]. A reader can be cloned to share the underlying file
//! descriptors across threads; a single instance should not be shared
//! directly across threads.
//!
//! **Inventory of features**
//!
//! * Parametrized over key-type, value-type and bitmap-type.
//! * Uses [CBOR][cbor] for serialization and deserialization.
//! * Value can either be stored in leaf-node or in a separate log-file.
//! * Bloom filter can help optimize false lookups via the [db::Bloom] trait.
//! * `get()` operation, with bloom-filter support.
//! * `iter()` and `reverse()` for forward and reverse iteration.
//! * `iter_versions()` and `reverse_versions()` additionally fetch older
//!   versions for an entry.
//!
//! **Value-log file**
//!
//! Values and their deltas (older versions) can be stored in a separate log
//! file, keeping the leaf-node compact:
//!
//! * Keep the leaf-node extremely compact and help better caching.
//! * Efficient when building multi-level runs via k-way merge.
//! * Hosts typically deal with older-versions as archives.
//!
//! A separate value-log-file is created only when [Config::value_in_vlog] or
//! [Config::delta_ok] is set.
//!
//! **Building a run**
//!
//! Unlike a mutable data-structure that supports `set()`/`insert()`, a run
//! is built from a pre-sorted iterator. Each run is an immutable snapshot of
//! a sorted `{key,value}` data-set:
//!
//! ```ignore
//! let config = Config::new("/opt/data/", "level0-run0");
//! let mut builder = Builder::initial(config, app_meta)?;
//! builder.build_from_iter(iter, NoBitmap)?;
//!
//! let reader1 = Index::open("/opt/data", "level0-run0")?;
//! let reader2 = reader1.try_clone()?;
//! ```
//!
//! * First create a [Config]. More configuration is available via the
//!   `set_*` methods.
//! * By supplying `app_meta`, callers can persist snapshot-specific metadata.
//! * [Builder::initial] starts a fresh run; [Builder::incremental] reuses an
//!   existing value-log for incremental builds.
//! * A bitmap instance can optionally be threaded through to implement a
//!   [bloom filter][bloom-filter]; pass `NoBitmap` when one is not needed.
//!
//! A run is made up of a `root-node`, `intermediate-node`s (m-blocks) and
//! `leaf-node`s (z-blocks). The whole data-set lives in leaf nodes; the
//! intermediate nodes are built bottoms-up from the first key in each leaf,
//! all the way up to the root.
//!
//! [bloom-filter]: https://en.wikipedia.org/wiki/Bloom_filter
//! [cbor]: https://en.wikipedia.org/wiki/CBOR

mod build;
mod config;
mod entry;
mod files;
mod flush;
mod index;
mod marker;
mod reader;
mod scans;
mod vlog;

pub mod mutable;

pub use config::{
    to_index_location, to_vlog_location, Config, Stats, FLUSH_QUEUE_SIZE, MBLOCKSIZE,
    VBLOCKSIZE, ZBLOCKSIZE,
};
pub use files::{IndexFileName, VlogFileName};
pub use index::{Builder, Index};

use entry::Entry;
use flush::Flusher;
use marker::ROOT_MARKER;

/// Alias matching the vocabulary used by the merge/scan engines: a
/// [Builder] constructs one immutable [Run].
pub type Run<K, V, B> = Index<K, V, B>;
/// Alias for [Builder], the constructor for an immutable [Run].
pub type RunBuilder<K, V> = Builder<K, V>;

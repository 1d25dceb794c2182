use std::{fmt, result};

/// Error variants that are returned by this package's API.
///
/// Each variant carries a `file:line` prefix (stamped in by [err_at]) and a
/// display-formatted message describing the failure.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// Fatal, unrecoverable invariant violation. A host embedding this crate
    /// should treat this the way it treats a PANIC: something internal is
    /// corrupt and no amount of retrying will help.
    Fatal(String, String),
    /// I/O error performing a file-system operation.
    IOError(String, String),
    /// Encoding/decoding a CBOR-serialized value failed.
    FailCbor(String, String),
    /// A numeric or type conversion failed.
    FailConvert(String, String),
    /// Not enough bytes remained while decoding a fixed-layout record.
    DecodeFail(String, String),
    /// A file on disk does not have the expected shape or name.
    InvalidFile(String, String),
    /// Caller supplied an argument that is not valid for this call.
    InvalidInput(String, String),
    /// Caller supplied a `cas` that does not match the current sequence
    /// number of the entry.
    InvalidCAS(String, String),
    /// Lookup found no entry for the requested key.
    KeyNotFound(String, String),
    /// A run file could not be purged, typically because something still
    /// holds a shared lock on it.
    PurgeFile(String, String),
    /// A background thread failed to join, or panicked.
    ThreadFail(String, String),
    /// Inter-thread / inter-process channel send or receive failed.
    IPCFail(String, String),
    /// The on-disk manifest failed its checksum or shape validation. This is
    /// treated as fatal: the caller should not attempt to keep operating
    /// against a corrupt manifest.
    CorruptMetadata(String, String),
    /// The host-collaborator's run-creation DDL call failed. Surfaced
    /// unchanged; no manifest change is committed.
    RunCreateFailed(String, String),
    /// A unique-key insert collided with an existing entry in the same run.
    UniqueViolation(String, String),
    /// A k-way merge was interrupted before completing. The partially
    /// written output run is abandoned; the manifest is left unchanged.
    MergeAborted(String, String),
    /// A single index entry exceeds the configured block size.
    OversizeTuple(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use Error::*;

        match self {
            Fatal(p, msg) => write!(f, "{} Fatal: {}", p, msg),
            IOError(p, msg) => write!(f, "{} IOError: {}", p, msg),
            FailCbor(p, msg) => write!(f, "{} FailCbor: {}", p, msg),
            FailConvert(p, msg) => write!(f, "{} FailConvert: {}", p, msg),
            DecodeFail(p, msg) => write!(f, "{} DecodeFail: {}", p, msg),
            InvalidFile(p, msg) => write!(f, "{} InvalidFile: {}", p, msg),
            InvalidInput(p, msg) => write!(f, "{} InvalidInput: {}", p, msg),
            InvalidCAS(p, msg) => write!(f, "{} InvalidCAS: {}", p, msg),
            KeyNotFound(p, msg) => write!(f, "{} KeyNotFound: {}", p, msg),
            PurgeFile(p, msg) => write!(f, "{} PurgeFile: {}", p, msg),
            ThreadFail(p, msg) => write!(f, "{} ThreadFail: {}", p, msg),
            IPCFail(p, msg) => write!(f, "{} IPCFail: {}", p, msg),
            CorruptMetadata(p, msg) => write!(f, "{} CorruptMetadata: {}", p, msg),
            RunCreateFailed(p, msg) => write!(f, "{} RunCreateFailed: {}", p, msg),
            UniqueViolation(p, msg) => write!(f, "{} UniqueViolation: {}", p, msg),
            MergeAborted(p, msg) => write!(f, "{} MergeAborted: {}", p, msg),
            OversizeTuple(p, msg) => write!(f, "{} OversizeTuple: {}", p, msg),
        }
    }
}

impl std::error::Error for Error {}

/// Result type used throughout this crate.
pub type Result<T> = result::Result<T, Error>;

/// Raise an [Error], stamping in the call-site's `file:line` as provenance.
///
/// Three forms:
/// * `err_at!(Variant, msg: "fmt", args...)` — build the error directly.
/// * `err_at!(Variant, fallible_expr)` — evaluate `fallible_expr` (a
///   `Result<T, E>` where `E: Display`), passing `T` through on `Ok` and
///   wrapping the display-formatted `E` on `Err`.
/// * `err_at!(Variant, fallible_expr, "fmt", args...)` — same, with an
///   additional caller-supplied message prefixed onto the wrapped error.
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err($crate::Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err($crate::Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let msg = format!($($arg),+);
                Err($crate::Error::$v(prefix, format!("{}: {}", msg, err)))
            }
        }
    }};
}

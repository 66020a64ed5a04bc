//! Content fingerprints for skip-if-unchanged regeneration.
//!
//! Every generated artifact (collection manifests, the content index) stores
//! the hash of its inputs under `meta.hash`. Before regenerating, the
//! generator hashes the current inputs and compares against what the artifact
//! on disk recorded.
//!
//! ## Signatures
//!
//! A file's signature is `"{path}:{size}:{mtime_ms}"`. File contents are not
//! read: size plus modification time is the change proxy. The hash of a file
//! set is SHA-256 over the concatenated signatures of the **sorted** paths,
//! so enumeration order never matters, while adding or removing a file
//! always changes the hash.
//!
//! ## Freshness
//!
//! Comparing against the prior artifact is a three-state decision:
//!
//! | Prior artifact | Result | Action |
//! |---|---|---|
//! | not found | [`Freshness::Missing`] | write |
//! | stored hash equals current | [`Freshness::UpToDate`] | skip |
//! | stored hash differs, or not parseable | [`Freshness::Stale`] | write |
//!
//! Only `NotFound` counts as "no prior artifact". Any other I/O error while
//! reading the prior artifact propagates to the caller.

use rayon::prelude::*;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Signature of one file: path, byte size, and mtime in milliseconds.
pub fn file_signature(path: &Path) -> io::Result<String> {
    let meta = std::fs::metadata(path)?;
    let mtime_ms = meta
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    Ok(format!("{}:{}:{}", path.display(), meta.len(), mtime_ms))
}

/// SHA-256 hex digest over the signatures of `paths`, sorted first.
///
/// Signatures are collected in parallel; the digest only depends on the set.
pub fn content_hash(paths: &[PathBuf]) -> io::Result<String> {
    let mut sorted: Vec<&PathBuf> = paths.iter().collect();
    sorted.sort();
    sorted.dedup();

    let signatures: Vec<String> = sorted
        .par_iter()
        .map(|p| file_signature(p))
        .collect::<io::Result<_>>()?;

    let mut hasher = Sha256::new();
    for sig in &signatures {
        hasher.update(sig.as_bytes());
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// How a previously written artifact relates to the current inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Missing,
    UpToDate,
    Stale,
}

impl Freshness {
    pub fn needs_write(self) -> bool {
        !matches!(self, Freshness::UpToDate)
    }
}

#[derive(Deserialize)]
struct Stamped {
    meta: Stamp,
}

#[derive(Deserialize)]
struct Stamp {
    hash: String,
}

/// The `meta.hash` stored in a generated JSON artifact, if it has one.
pub fn stored_hash(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<Stamped>(bytes)
        .ok()
        .map(|s| s.meta.hash)
}

/// Compare the artifact at `artifact` against `current_hash`.
pub fn freshness(artifact: &Path, current_hash: &str) -> io::Result<Freshness> {
    let bytes = match std::fs::read(artifact) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Freshness::Missing),
        Err(e) => return Err(e),
    };
    Ok(match stored_hash(&bytes) {
        Some(prior) if prior == current_hash => Freshness::UpToDate,
        _ => Freshness::Stale,
    })
}

//! Suffix discovery over place-name corpora.
//!
//! This crate provides a branching-entropy suffix analysis, including:
//! - A suffix n-gram index with its character alphabet
//! - Memoized left branching entropy
//! - Variation of Branching Entropy (VBE) scoring, normalized per length
//! - Threshold-based selection of the suffixes worth mapping
//! - Loading of place corpora and export of per-suffix point sets
//!
//! The engine itself only sees names. Coordinates live in `Place` values
//! owned by the loader and exporter side.

/// Suffix index, entropy engine, VBE scoring and selection.
///
/// `SuffixAnalysis` is the high-level entry point tying the pieces together.
pub mod model;

/// Corpus loading (CSV and plain text) and result export.
pub mod io;

/// Error type shared by the whole crate.
pub mod error;

pub use error::VbeError;

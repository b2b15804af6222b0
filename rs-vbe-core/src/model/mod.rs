//! Top-level module for the suffix discovery engine.
//!
//! Data flows leaf to root:
//! - Normalized names (`Corpus`)
//! - Suffix counts and character alphabet (`NGramIndex`)
//! - Memoized left branching entropy (`EntropyEngine`)
//! - Length-normalized VBE ranking (`VbeScorer`)
//! - Threshold selection (`SuffixSelector`)
//! - A high-level run over one corpus (`SuffixAnalysis`)

/// High-level analysis owning every stage for one corpus.
///
/// Exposes ranking, selection and membership queries.
pub mod analysis;

/// Run parameters with validated setters.
pub mod config;

/// Validated list of normalized names.
pub mod corpus;

/// Left branching entropy with a per-engine cache.
///
/// Supports on-demand computation and multithreaded bucket sweeps.
pub mod entropy;

/// Suffix count table and character alphabet.
///
/// Supports sequential and parallel construction, and merging.
pub mod ngram_index;

/// Final selection: thresholds plus single-letter baseline entries.
pub mod selector;

/// Variation of Branching Entropy scoring and ranking.
pub mod vbe;

pub use analysis::{LengthSummary, SuffixAnalysis};
pub use config::AnalysisConfig;
pub use corpus::Corpus;
pub use entropy::EntropyEngine;
pub use ngram_index::{Alphabet, NGramIndex, NGramTable};
pub use selector::SuffixSelector;
pub use vbe::{AverageVbe, RankedSuffix, VbeScorer};

use std::collections::BTreeSet;

use log::info;
use serde::{Deserialize, Serialize};

use super::config::AnalysisConfig;
use super::corpus::Corpus;
use super::entropy::EntropyEngine;
use super::ngram_index::NGramIndex;
use super::selector::SuffixSelector;
use super::vbe::{AverageVbe, RankedSuffix, VbeScorer};
use crate::error::VbeError;

/// Index statistics for one suffix length.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LengthSummary {
	pub length: usize,
	/// Number of distinct suffixes of this length.
	pub distinct: usize,
	/// Most common suffixes with their counts.
	pub top: Vec<(String, usize)>,
}

/// High-level suffix analysis over one corpus.
///
/// # Responsibilities
/// - Own the corpus, the suffix index and the entropy cache for one run
/// - Rank suffixes by normalized VBE and select the ones worth mapping
/// - Answer membership queries for renderers
///
/// Two analyses share nothing, so independent corpora can be analyzed side by side.
#[derive(Debug, Clone)]
pub struct SuffixAnalysis {
	corpus: Corpus,
	config: AnalysisConfig,
	scorer: VbeScorer,
}

impl SuffixAnalysis {
	/// Builds the index, warms the entropy cache and computes VBE averages.
	///
	/// # Errors
	/// - Returns an error if the config is invalid.
	/// - Returns an error if a worker thread fails.
	pub fn new(corpus: Corpus, config: AnalysisConfig) -> Result<Self, VbeError> {
		config.validate()?;

		let index = NGramIndex::build_parallel(&corpus, config.max_suffix_length(), config.threads)?;
		let engine = EntropyEngine::new(index, config.min_sample_count(), config.threads)?;
		let scorer = VbeScorer::new(engine)?;

		info!(
			"analysis ready: {} names, {} characters, {} cached entropies",
			corpus.len(),
			scorer.engine().index().alphabet().len(),
			scorer.engine().cached_len()
		);
		Ok(Self { corpus, config, scorer })
	}

	/// Validates `names` as a corpus, then builds the analysis.
	///
	/// # Errors
	/// Returns an error if the corpus is empty or holds a name shorter than 2 characters.
	pub fn from_names<I, S>(names: I, config: AnalysisConfig) -> Result<Self, VbeError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(Corpus::from_names(names)?, config)
	}

	pub fn corpus(&self) -> &Corpus {
		&self.corpus
	}

	pub fn config(&self) -> &AnalysisConfig {
		&self.config
	}

	pub fn index(&self) -> &NGramIndex {
		self.scorer.engine().index()
	}

	/// Number of names ending with `suffix`.
	pub fn count(&self, suffix: &str) -> usize {
		self.index().table().count(suffix)
	}

	/// Number of memoized entropies, defined or not.
	pub fn cached_entropies(&self) -> usize {
		self.scorer.engine().cached_len()
	}

	pub fn left_entropy(&mut self, suffix: &str) -> Option<f64> {
		self.scorer.engine_mut().left_entropy(suffix)
	}

	pub fn vbe(&mut self, suffix: &str) -> Option<f64> {
		self.scorer.engine_mut().vbe(suffix)
	}

	pub fn normalized_vbe(&mut self, suffix: &str) -> Option<f64> {
		self.scorer.normalized_vbe(suffix)
	}

	pub fn average_vbe(&self) -> &AverageVbe {
		self.scorer.average()
	}

	/// Multi-character suffixes with positive normalized VBE, best first.
	pub fn rank(&mut self) -> Vec<RankedSuffix> {
		self.scorer.rank_top(self.config.min_count, self.config.top_per_length)
	}

	/// Final `(suffix, count, score)` list handed to exporters and renderers.
	///
	/// Scored suffixes first, in ranking order, then single-letter entries.
	pub fn select(&mut self) -> Vec<RankedSuffix> {
		let ranked = self.rank();
		let index = self.scorer.engine().index();
		let selection = SuffixSelector::new(index.table(), index.alphabet()).select(&ranked, &self.config);
		info!("selected {} suffixes ({} scored)", selection.len(), ranked.len());
		selection
	}

	/// Distinct names ending with `suffix`.
	///
	/// The empty suffix matches every name.
	pub fn members_of(&self, suffix: &str) -> BTreeSet<String> {
		self.corpus.iter().filter(|name| name.ends_with(suffix)).map(str::to_owned).collect()
	}

	/// Corpus positions of names ending with `suffix`, in ascending order.
	///
	/// Used to join names back to data the loader keeps, such as coordinates.
	pub fn member_indices(&self, suffix: &str) -> Vec<usize> {
		self.corpus
			.iter()
			.enumerate()
			.filter(|(_, name)| name.ends_with(suffix))
			.map(|(i, _)| i)
			.collect()
	}

	/// Distinct suffix count and the `top` most common suffixes, per length.
	pub fn summary(&self, top: usize) -> Vec<LengthSummary> {
		let table = self.index().table();
		(1..=table.len_max())
			.map(|length| LengthSummary {
				length,
				distinct: table.distinct(length),
				top: table
					.most_common(length, top)
					.into_iter()
					.map(|(suffix, count)| (suffix.to_owned(), count))
					.collect(),
			})
			.collect()
	}
}

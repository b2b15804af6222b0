use super::config::AnalysisConfig;
use super::ngram_index::{Alphabet, NGramTable};
use super::vbe::RankedSuffix;

/// Turns a VBE ranking into the final list of suffixes to map.
///
/// The output is a two-stage composition:
/// 1. scored suffixes, in ranking order, after threshold filtering
/// 2. single-letter baseline entries, appended without re-sorting
///
/// Single letters are never VBE-scored: branching entropy trivially favours
/// the shortest strings. They get a score of exactly 0 and skip score filters.
pub struct SuffixSelector<'a> {
	table: &'a NGramTable,
	alphabet: &'a Alphabet,
}

impl<'a> SuffixSelector<'a> {
	pub fn new(table: &'a NGramTable, alphabet: &'a Alphabet) -> Self {
		Self { table, alphabet }
	}

	/// Alphabet characters seen more than `min_count` times, score 0.
	///
	/// Ordered by descending count, then character.
	pub fn single_letters(&self, min_count: usize) -> Vec<RankedSuffix> {
		let mut letters: Vec<RankedSuffix> = self
			.alphabet
			.iter()
			.filter(|(_, count)| *count > min_count)
			.map(|(c, count)| RankedSuffix::new(c.to_string(), count, 0.0))
			.collect();
		letters.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.suffix.cmp(&b.suffix)));
		letters
	}

	/// Applies the configured thresholds and appends single letters.
	///
	/// # Behavior
	/// - Member counts of scored entries are re-read from the table.
	/// - Entries with `count < min_count` and the empty suffix are dropped.
	/// - Scored entries outside `[min_score, max_score]` are dropped, when set.
	pub fn select(&self, ranked: &[RankedSuffix], config: &AnalysisConfig) -> Vec<RankedSuffix> {
		let min_count = config.min_count;
		let in_score_range = |score: f64| {
			config.min_score().is_none_or(|min| score >= min) && config.max_score().is_none_or(|max| score <= max)
		};

		let scored = ranked
			.iter()
			.filter(|entry| !entry.suffix.is_empty() && entry.suffix.chars().count() > 1)
			.map(|entry| RankedSuffix::new(entry.suffix.clone(), self.table.count(&entry.suffix), entry.score))
			.filter(|entry| entry.count >= min_count && in_score_range(entry.score));

		scored
			.chain(self.single_letters(min_count))
			.filter(|entry| entry.count >= min_count)
			.collect()
	}
}

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::entropy::EntropyEngine;
use crate::error::VbeError;

/// A scored suffix, as handed to exporters and renderers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RankedSuffix {
	pub suffix: String,
	/// Number of names ending with `suffix` for scored entries.
	///
	/// Single-letter baseline entries carry the alphabet count instead: how
	/// often the letter occurs at any position, not how many names end with it.
	pub count: usize,
	/// Normalized VBE, 0 for single-letter baseline entries.
	pub score: f64,
}

impl RankedSuffix {
	pub fn new(suffix: impl Into<String>, count: usize, score: f64) -> Self {
		Self { suffix: suffix.into(), count, score }
	}
}

/// Count-weighted mean VBE per suffix length.
///
/// Lengths where no suffix has a defined VBE have no entry.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AverageVbe {
	by_length: BTreeMap<usize, f64>,
}

impl AverageVbe {
	pub fn get(&self, length: usize) -> Option<f64> {
		self.by_length.get(&length).copied()
	}

	/// `(length, average)` pairs in ascending length order.
	pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
		self.by_length.iter().map(|(k, v)| (*k, *v))
	}
}

/// Scores suffixes by their length-normalized Variation of Branching Entropy.
///
/// Owns the entropy engine. The average VBE per length is computed once at
/// construction, from a fully warmed cache, and never changes afterwards.
#[derive(Debug, Clone)]
pub struct VbeScorer {
	engine: EntropyEngine,
	average: AverageVbe,
}

impl VbeScorer {
	/// Warms the engine cache and computes the per-length averages.
	///
	/// # Errors
	/// Returns an error if a worker thread fails while warming the cache.
	pub fn new(mut engine: EntropyEngine) -> Result<Self, VbeError> {
		engine.warm_all()?;
		let average = Self::compute_average_vbe(&mut engine);
		debug!("average VBE by length: {:?}", average.by_length);
		Ok(Self { engine, average })
	}

	/// Count-weighted mean VBE for every candidate length.
	///
	/// For each suffix of length `k` with a defined VBE, accumulates
	/// `count * vbe` and `count`. Undefined VBEs are left out of both sums.
	pub fn compute_average_vbe(engine: &mut EntropyEngine) -> AverageVbe {
		let mut by_length = BTreeMap::new();

		for k in 1..=engine.index().table().len_max() {
			let bucket: Vec<(String, usize)> = engine
				.index()
				.table()
				.bucket(k)
				.map(|(suffix, count)| (suffix.to_owned(), count))
				.collect();

			let mut weighted_sum = 0.0;
			let mut weight = 0usize;
			for (suffix, count) in &bucket {
				if let Some(vbe) = engine.vbe(suffix) {
					weighted_sum += *count as f64 * vbe;
					weight += count;
				}
			}

			if weight > 0 {
				by_length.insert(k, weighted_sum / weight as f64);
			}
		}

		AverageVbe { by_length }
	}

	pub fn engine(&self) -> &EntropyEngine {
		&self.engine
	}

	pub fn engine_mut(&mut self) -> &mut EntropyEngine {
		&mut self.engine
	}

	pub fn average(&self) -> &AverageVbe {
		&self.average
	}

	/// `vbe(suffix) - average[len(suffix)]`.
	///
	/// Undefined when the VBE or the length average is undefined.
	pub fn normalized_vbe(&mut self, suffix: &str) -> Option<f64> {
		let vbe = self.engine.vbe(suffix)?;
		let average = self.average.get(suffix.chars().count())?;
		Some(vbe - average)
	}

	/// Ranks every multi-character suffix seen more than `min_count` times.
	pub fn rank(&mut self, min_count: usize) -> Vec<RankedSuffix> {
		self.rank_top(min_count, None)
	}

	/// Ranks suffixes, optionally considering only the `top_per_length`
	/// most common suffixes of each length.
	///
	/// # Behavior
	/// - Candidates have 2 to `len_max` characters and `count > min_count`.
	/// - Undefined and non-positive normalized VBEs are excluded.
	/// - Sorted by descending score, then descending count, then suffix.
	///
	/// The output is deterministic for a given index.
	pub fn rank_top(&mut self, min_count: usize, top_per_length: Option<usize>) -> Vec<RankedSuffix> {
		let len_max = self.engine.index().table().len_max();
		let mut candidates: Vec<(String, usize)> = Vec::new();
		for k in 2..=len_max {
			let table = self.engine.index().table();
			let bucket = match top_per_length {
				Some(n) => table.most_common(k, n),
				None => table.bucket(k).collect(),
			};
			candidates.extend(
				bucket
					.into_iter()
					.filter(|(_, count)| *count > min_count)
					.map(|(suffix, count)| (suffix.to_owned(), count)),
			);
		}

		let mut ranked: Vec<RankedSuffix> = candidates
			.into_iter()
			.filter_map(|(suffix, count)| {
				let score = self.normalized_vbe(&suffix)?;
				(score > 0.0).then(|| RankedSuffix { suffix, count, score })
			})
			.collect();

		ranked.sort_by(|a, b| {
			b.score
				.total_cmp(&a.score)
				.then_with(|| b.count.cmp(&a.count))
				.then_with(|| a.suffix.cmp(&b.suffix))
		});
		ranked
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::corpus::Corpus;
	use crate::model::ngram_index::NGramIndex;
	use approx::assert_relative_eq;

	fn scorer(names: &[String], len_max: usize, min_sample_count: usize) -> VbeScorer {
		let corpus = Corpus::new(names.to_vec()).unwrap();
		let index = NGramIndex::build(&corpus, len_max).unwrap();
		VbeScorer::new(EntropyEngine::new(index, min_sample_count, 2).unwrap()).unwrap()
	}

	/// Names built from a few stems and endings, so some endings are real units.
	fn names() -> Vec<String> {
		let stems = ["ab", "ron", "nev", "mar", "sol", "pit", "cor", "lu"];
		let endings = ["ville", "court", "ac", "y", "heim"];
		let mut names = Vec::new();
		for (i, stem) in stems.iter().enumerate() {
			for (j, ending) in endings.iter().enumerate() {
				for repeat in 0..(1 + (i + j) % 3) {
					names.push(format!("{stem}{}{ending}", "e".repeat(repeat)));
				}
			}
		}
		names
	}

	#[test]
	fn average_is_count_weighted() {
		let mut scorer = scorer(&names(), 6, 1);
		let expected = {
			let engine = scorer.engine_mut();
			let bucket: Vec<(String, usize)> =
				engine.index().table().bucket(2).map(|(s, c)| (s.to_owned(), c)).collect();
			let (sum, weight) = bucket.iter().fold((0.0, 0usize), |(sum, weight), (suffix, count)| {
				match engine.vbe(suffix) {
					Some(v) => (sum + *count as f64 * v, weight + count),
					None => (sum, weight),
				}
			});
			sum / weight as f64
		};
		assert_relative_eq!(scorer.average().get(2).unwrap(), expected, epsilon = 1e-12);
	}

	#[test]
	fn undefined_vbe_is_left_out_of_averages() {
		// With a high sample threshold only short suffixes are defined
		let names = names();
		let mut scorer = scorer(&names, 6, names.len());
		// Only "" has enough samples, so no length has a defined VBE
		assert_eq!(scorer.average().iter().count(), 0);
		assert_eq!(scorer.normalized_vbe("ville"), None);
	}

	#[test]
	fn normalized_vbe_subtracts_length_average() {
		let mut scorer = scorer(&names(), 6, 1);
		let vbe = scorer.engine_mut().vbe("ville").unwrap();
		let average = scorer.average().get(5).unwrap();
		assert_relative_eq!(scorer.normalized_vbe("ville").unwrap(), vbe - average);
	}

	#[test]
	fn rank_is_sorted_filtered_and_deterministic() {
		let mut scorer = scorer(&names(), 6, 1);
		let ranked = scorer.rank(3);
		assert!(!ranked.is_empty());

		for entry in &ranked {
			assert!(entry.score > 0.0);
			assert!(entry.count > 3);
			assert!(entry.suffix.chars().count() >= 2);
		}
		for pair in ranked.windows(2) {
			assert!(pair[0].score >= pair[1].score);
		}
		assert_eq!(ranked, scorer.rank(3));
	}

	#[test]
	fn equal_scores_break_ties_by_count_then_suffix() {
		// "xa", "ya" and "za" are all preceded by 'p' and 'q' in equal shares,
		// so their normalized VBEs are identical. "bc" and the bare "?c"
		// names pull the length-2 average down so those three score above it.
		let names: Vec<String> = [
			"pxa", "pxa", "qxa", "qxa", "pya", "qya", "qza", "pza", "abc", "abc", "abc", "abc", "dc", "ec", "fc",
			"gc",
		]
		.iter()
		.map(|s| (*s).to_owned())
		.collect();
		let mut scorer = scorer(&names, 2, 1);
		let ranked = scorer.rank(0);

		let suffixes: Vec<&str> = ranked.iter().map(|e| e.suffix.as_str()).collect();
		assert_eq!(suffixes, vec!["xa", "ya", "za"]);
		assert_eq!(ranked[0].count, 4);
		assert_eq!(ranked[1].count, 2);
		assert!(ranked[0].score > 0.0);
		assert_eq!(ranked[0].score.to_bits(), ranked[1].score.to_bits());
		assert_eq!(ranked[1].score.to_bits(), ranked[2].score.to_bits());
	}

	#[test]
	fn top_per_length_restricts_candidates() {
		let mut scorer = scorer(&names(), 6, 1);
		let all = scorer.rank(0);
		let limited = scorer.rank_top(0, Some(1));

		assert!(limited.len() <= 5);
		for entry in &limited {
			assert!(all.contains(entry));
		}
	}
}

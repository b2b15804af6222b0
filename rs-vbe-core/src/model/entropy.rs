use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

use log::debug;

use super::ngram_index::NGramIndex;
use crate::error::VbeError;

/// Default minimum suffix count below which entropy is undefined.
pub const DEFAULT_MIN_SAMPLE_COUNT: usize = 20;

/// Left branching entropy of `suffix`, without memoization.
///
/// Shannon entropy of the character preceding `suffix`, conditioned on
/// `suffix` occurring: `-Σ p_c ln p_c` with `p_c = count(c + suffix) / count(suffix)`.
///
/// Returns `None` (undefined) when:
/// - `count(suffix) < min_sample_count`, or the suffix is unseen
/// - `suffix` is longer than `len_max`, so its extensions are not indexed
fn branching_entropy(index: &NGramIndex, min_sample_count: usize, suffix: &str) -> Option<f64> {
	let table = index.table();
	let n = table.count(suffix);
	if n == 0 || n < min_sample_count {
		return None;
	}
	if suffix.chars().count() > table.len_max() {
		return None;
	}

	let n = n as f64;
	let mut extended = String::with_capacity(suffix.len() + 4);
	let entropy = index
		.alphabet()
		.chars()
		.map(|c| {
			extended.clear();
			extended.push(c);
			extended.push_str(suffix);
			table.count(&extended)
		})
		// Zero counts never reach ln()
		.filter(|&count| count > 0)
		.map(|count| {
			let p = count as f64 / n;
			-p * p.ln()
		})
		.sum();

	Some(entropy)
}

/// Drops the first character of `suffix`.
///
/// Returns `None` for the empty suffix.
pub(crate) fn truncate_first(suffix: &str) -> Option<&str> {
	let mut chars = suffix.chars();
	chars.next()?;
	Some(chars.as_str())
}

/// Memoized left branching entropy over a suffix index.
///
/// The engine owns its index and its cache, so two analyses never share
/// state. The cache only grows: an entry, once computed, is never invalidated.
///
/// # Responsibilities
/// - Compute left branching entropy on demand and memoize it
/// - Compute the Variation of Branching Entropy (VBE)
/// - Pre-fill the cache bucket by bucket over worker threads
#[derive(Debug, Clone)]
pub struct EntropyEngine {
	index: NGramIndex,
	min_sample_count: usize,
	threads: usize,
	/// `None` values are memoized too: undefined is a result, not a miss.
	cache: HashMap<String, Option<f64>>,
}

impl EntropyEngine {
	/// Creates an engine over `index`.
	///
	/// `threads` is the worker count used by `warm` (0 means one per CPU).
	///
	/// # Errors
	/// Returns an error if `min_sample_count < 1`.
	pub fn new(index: NGramIndex, min_sample_count: usize, threads: usize) -> Result<Self, VbeError> {
		if min_sample_count < 1 {
			return Err(VbeError::InvalidConfig("min sample count must be >= 1".to_owned()));
		}
		Ok(Self { index, min_sample_count, threads, cache: HashMap::new() })
	}

	pub fn index(&self) -> &NGramIndex {
		&self.index
	}

	pub fn min_sample_count(&self) -> usize {
		self.min_sample_count
	}

	/// Number of memoized suffixes, defined or not.
	pub fn cached_len(&self) -> usize {
		self.cache.len()
	}

	/// Left branching entropy of `suffix`, memoized.
	///
	/// `None` means undefined (insufficient sample), never zero.
	pub fn left_entropy(&mut self, suffix: &str) -> Option<f64> {
		if let Some(value) = self.cache.get(suffix) {
			return *value;
		}
		let value = branching_entropy(&self.index, self.min_sample_count, suffix);
		self.cache.insert(suffix.to_owned(), value);
		value
	}

	/// Variation of Branching Entropy.
	///
	/// `left_entropy(suffix) - left_entropy(suffix[1..])`.
	/// Undefined if either side is undefined, or for the empty suffix.
	pub fn vbe(&mut self, suffix: &str) -> Option<f64> {
		let shorter = truncate_first(suffix)?;
		let full = self.left_entropy(suffix)?;
		Some(full - self.left_entropy(shorter)?)
	}

	/// Fills the cache for every indexed suffix of length `k`.
	///
	/// # Behavior
	/// - Skips suffixes already cached.
	/// - Splits the remaining ones into one chunk per worker.
	/// - Workers only read the index; results are merged here, on the owner.
	///
	/// Values are identical to the ones `left_entropy` computes on demand.
	pub fn warm(&mut self, k: usize) -> Result<(), VbeError> {
		let missing: Vec<&str> = self
			.index
			.table()
			.bucket(k)
			.map(|(suffix, _)| suffix)
			.filter(|suffix| !self.cache.contains_key(*suffix))
			.collect();
		if missing.is_empty() {
			return Ok(());
		}

		let workers = if self.threads == 0 { num_cpus::get() } else { self.threads };
		let chunk_size = missing.len().div_ceil(workers).max(1);
		let index = &self.index;
		let min_sample_count = self.min_sample_count;

		let (tx, rx) = mpsc::channel();
		let mut spawned = 0;
		thread::scope(|scope| {
			for chunk in missing.chunks(chunk_size) {
				let tx = tx.clone();
				spawned += 1;

				scope.spawn(move || {
					let partial: Vec<(String, Option<f64>)> = chunk
						.iter()
						.map(|suffix| ((*suffix).to_owned(), branching_entropy(index, min_sample_count, suffix)))
						.collect();
					let _ = tx.send(partial);
				});
			}
		});
		drop(tx);

		let mut computed = Vec::with_capacity(missing.len());
		let mut received = 0;
		for partial in rx.iter() {
			computed.extend(partial);
			received += 1;
		}
		if received != spawned {
			return Err(VbeError::Worker(format!("{received} of {spawned} entropy sweeps received")));
		}

		debug!("warmed {} suffixes of length {} with {} workers", computed.len(), k, spawned);
		self.cache.extend(computed);
		Ok(())
	}

	/// Fills the cache for every candidate suffix, empty suffix included.
	pub fn warm_all(&mut self) -> Result<(), VbeError> {
		for k in 0..=self.index.table().len_max() {
			self.warm(k)?;
		}
		Ok(())
	}
}

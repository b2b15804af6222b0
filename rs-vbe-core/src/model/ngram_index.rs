use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread;

use log::debug;
use serde::{Deserialize, Serialize};

use super::corpus::Corpus;
use crate::error::VbeError;

/// Default maximum suffix length indexed.
pub const DEFAULT_MAX_SUFFIX_LENGTH: usize = 15;

/// Character frequencies over every position of every name.
///
/// This is the enumeration domain when asking "which character could
/// precede this suffix".
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Alphabet {
	counts: BTreeMap<char, usize>,
}

impl Alphabet {
	/// Counts every character of `name`.
	pub fn add_name(&mut self, name: &str) {
		for c in name.chars() {
			*self.counts.entry(c).or_insert(0) += 1;
		}
	}

	/// Occurrence count of `c`, 0 if never seen.
	pub fn count(&self, c: char) -> usize {
		self.counts.get(&c).copied().unwrap_or(0)
	}

	/// Characters in ascending order.
	pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
		self.counts.keys().copied()
	}

	/// `(character, count)` pairs in ascending character order.
	pub fn iter(&self) -> impl Iterator<Item = (char, usize)> + '_ {
		self.counts.iter().map(|(c, count)| (*c, *count))
	}

	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	/// Sums the counts of `other` into this alphabet.
	pub fn merge(&mut self, other: &Self) {
		for (c, count) in &other.counts {
			*self.counts.entry(*c).or_insert(0) += *count;
		}
	}
}

/// Occurrence counts of name endings, bucketed by length.
///
/// Bucket `k` maps every distinct `k`-character tail to the number of names
/// ending with it. Bucket 0 holds the empty suffix, counting every name.
///
/// Candidate suffixes go up to `len_max` characters. One extra bucket
/// (`len_max + 1`) is kept as the extension domain of the longest candidates,
/// so their preceding character can still be counted.
///
/// # Invariants
/// - `len_max >= 1`
/// - `buckets.len() == len_max + 2`
/// - A name contributes once per bucket `k <= min(len(name), len_max + 1)`
/// - All stored counts are >= 1
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NGramTable {
	len_max: usize,
	buckets: Vec<BTreeMap<String, usize>>,
}

impl NGramTable {
	/// Creates an empty table for candidate suffixes up to `len_max` characters.
	///
	/// # Errors
	/// Returns an error if `len_max < 1`.
	pub fn new(len_max: usize) -> Result<Self, VbeError> {
		if len_max < 1 {
			return Err(VbeError::InvalidConfig("max suffix length must be >= 1".to_owned()));
		}
		Ok(Self { len_max, buckets: vec![BTreeMap::new(); len_max + 2] })
	}

	/// Longest candidate suffix length.
	pub fn len_max(&self) -> usize {
		self.len_max
	}

	/// Longest indexed tail, extension bucket included.
	pub fn depth(&self) -> usize {
		self.len_max + 1
	}

	/// Records every tail of `name`, from the empty suffix up to `depth()` characters.
	///
	/// Names shorter than `k` are skipped for bucket `k`.
	pub fn add_name(&mut self, name: &str) {
		// Byte offset of each char start, so tails are sliced without re-encoding
		let starts: Vec<usize> = name.char_indices().map(|(i, _)| i).collect();
		let n_chars = starts.len();

		for k in 0..=self.depth().min(n_chars) {
			let suffix = if k == 0 { "" } else { &name[starts[n_chars - k]..] };
			let bucket = &mut self.buckets[k];
			match bucket.get_mut(suffix) {
				Some(count) => *count += 1,
				None => {
					bucket.insert(suffix.to_owned(), 1);
				}
			}
		}
	}

	/// Number of names ending with `suffix`.
	///
	/// Returns 0 for unseen suffixes and for suffixes longer than `depth()`.
	pub fn count(&self, suffix: &str) -> usize {
		let k = suffix.chars().count();
		if k > self.depth() {
			return 0;
		}
		self.buckets[k].get(suffix).copied().unwrap_or(0)
	}

	/// Number of names in the table (count of the empty suffix).
	pub fn total(&self) -> usize {
		self.count("")
	}

	/// `(suffix, count)` pairs of length `k`, in lexicographic order.
	///
	/// Empty for `k > depth()`.
	pub fn bucket(&self, k: usize) -> impl Iterator<Item = (&str, usize)> + '_ {
		self.buckets
			.get(k)
			.into_iter()
			.flat_map(|bucket| bucket.iter().map(|(s, c)| (s.as_str(), *c)))
	}

	/// Number of distinct suffixes of length `k`.
	pub fn distinct(&self, k: usize) -> usize {
		self.buckets.get(k).map_or(0, BTreeMap::len)
	}

	/// The `n` most frequent suffixes of length `k`.
	///
	/// Sorted by descending count, ties broken lexicographically.
	pub fn most_common(&self, k: usize, n: usize) -> Vec<(&str, usize)> {
		let mut entries: Vec<(&str, usize)> = self.bucket(k).collect();
		entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
		entries.truncate(n);
		entries
	}

	/// Merges another table into this one.
	///
	/// Counts of matching suffixes are summed.
	///
	/// # Errors
	/// Returns an error if the tables index different maximum lengths.
	pub fn merge(&mut self, other: &Self) -> Result<(), VbeError> {
		if self.len_max != other.len_max {
			return Err(VbeError::LengthMismatch(self.len_max, other.len_max));
		}

		for (bucket, other_bucket) in self.buckets.iter_mut().zip(&other.buckets) {
			for (suffix, count) in other_bucket {
				*bucket.entry(suffix.clone()).or_insert(0) += *count;
			}
		}

		Ok(())
	}
}

/// Suffix table and alphabet built together from one corpus.
///
/// Both are built once and never mutated afterwards by the engine.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NGramIndex {
	table: NGramTable,
	alphabet: Alphabet,
}

impl NGramIndex {
	/// Creates an empty index.
	///
	/// # Errors
	/// Returns an error if `len_max < 1`.
	pub fn empty(len_max: usize) -> Result<Self, VbeError> {
		Ok(Self { table: NGramTable::new(len_max)?, alphabet: Alphabet::default() })
	}

	/// Builds the index sequentially.
	pub fn build(corpus: &Corpus, len_max: usize) -> Result<Self, VbeError> {
		let mut index = Self::empty(len_max)?;
		for name in corpus.iter() {
			index.add_name(name);
		}
		Ok(index)
	}

	/// Builds the index over `threads` workers (0 means one per CPU).
	///
	/// # Behavior
	/// - Splits the corpus into one chunk per worker.
	/// - Each worker builds a partial index for its chunk.
	/// - Partial indexes are collected through a channel and merged.
	///
	/// The result equals `build` since counts are simply summed.
	pub fn build_parallel(corpus: &Corpus, len_max: usize, threads: usize) -> Result<Self, VbeError> {
		let template = Self::empty(len_max)?;
		let workers = if threads == 0 { num_cpus::get() } else { threads };
		let chunk_size = corpus.len().div_ceil(workers).max(1);

		let (tx, rx) = mpsc::channel();
		let mut spawned = 0;
		thread::scope(|scope| {
			for chunk in corpus.names().chunks(chunk_size) {
				let tx = tx.clone();
				let mut partial = template.clone();
				spawned += 1;

				scope.spawn(move || {
					for name in chunk {
						partial.add_name(name);
					}
					// The receiver lives until after the scope, send cannot fail
					let _ = tx.send(partial);
				});
			}
		});
		drop(tx);

		let mut index = template;
		let mut merged = 0;
		for partial in rx.iter() {
			index.merge(&partial)?;
			merged += 1;
		}
		if merged != spawned {
			return Err(VbeError::Worker(format!("{merged} of {spawned} partial indexes received")));
		}

		debug!(
			"built suffix index over {} names with {} workers ({} characters)",
			corpus.len(),
			spawned,
			index.alphabet.len()
		);
		Ok(index)
	}

	/// Adds one name to both the table and the alphabet.
	pub fn add_name(&mut self, name: &str) {
		self.table.add_name(name);
		self.alphabet.add_name(name);
	}

	/// Merges another index into this one.
	///
	/// # Errors
	/// Returns an error if the maximum lengths differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), VbeError> {
		self.table.merge(&other.table)?;
		self.alphabet.merge(&other.alphabet);
		Ok(())
	}

	pub fn table(&self) -> &NGramTable {
		&self.table
	}

	pub fn alphabet(&self) -> &Alphabet {
		&self.alphabet
	}

	pub fn into_parts(self) -> (NGramTable, Alphabet) {
		(self.table, self.alphabet)
	}
}

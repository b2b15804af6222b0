use serde::{Deserialize, Serialize};

use super::entropy::DEFAULT_MIN_SAMPLE_COUNT;
use super::ngram_index::DEFAULT_MAX_SUFFIX_LENGTH;
use crate::error::VbeError;

/// Default count a suffix must exceed to be ranked or selected.
pub const DEFAULT_MIN_COUNT: usize = 50;

/// Parameters of one suffix analysis run.
///
/// `AnalysisConfig` holds both **engine parameters** (index depth, sample
/// threshold, worker count) and **selection thresholds** (count and score bounds).
///
/// # Invariants
/// - `max_suffix_length >= 1`
/// - `min_sample_count >= 1`
/// - `min_score <= max_score` when both are set
///
/// Fields with an invariant are private and changed through checked setters.
/// A deserialized config is checked again by `validate`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
	/// Longest candidate suffix.
	max_suffix_length: usize,

	/// Count below which branching entropy is undefined.
	min_sample_count: usize,

	/// Count a suffix must exceed to be ranked, and reach to be selected.
	pub min_count: usize,

	/// Lowest normalized VBE kept in the selection.
	min_score: Option<f64>,

	/// Highest normalized VBE kept in the selection.
	max_score: Option<f64>,

	/// Only rank the n most common suffixes of each length.
	pub top_per_length: Option<usize>,

	/// Worker threads for index build and entropy sweep (0 = one per CPU).
	pub threads: usize,
}

impl Default for AnalysisConfig {
	fn default() -> Self {
		Self {
			max_suffix_length: DEFAULT_MAX_SUFFIX_LENGTH,
			min_sample_count: DEFAULT_MIN_SAMPLE_COUNT,
			min_count: DEFAULT_MIN_COUNT,
			min_score: None,
			max_score: None,
			top_per_length: None,
			threads: 0,
		}
	}
}

impl AnalysisConfig {
	pub fn max_suffix_length(&self) -> usize {
		self.max_suffix_length
	}

	pub fn min_sample_count(&self) -> usize {
		self.min_sample_count
	}

	pub fn min_score(&self) -> Option<f64> {
		self.min_score
	}

	pub fn max_score(&self) -> Option<f64> {
		self.max_score
	}

	/// Sets the longest candidate suffix.
	///
	/// # Errors
	/// Returns an error if `length` is 0.
	pub fn set_max_suffix_length(&mut self, length: usize) -> Result<(), VbeError> {
		if length < 1 {
			return Err(VbeError::InvalidConfig("max suffix length must be >= 1".to_owned()));
		}
		self.max_suffix_length = length;
		Ok(())
	}

	/// Sets the entropy sample threshold. Small corpora may need less than the default.
	///
	/// # Errors
	/// Returns an error if `count` is 0.
	pub fn set_min_sample_count(&mut self, count: usize) -> Result<(), VbeError> {
		if count < 1 {
			return Err(VbeError::InvalidConfig("min sample count must be >= 1".to_owned()));
		}
		self.min_sample_count = count;
		Ok(())
	}

	/// Sets the score window of the selection. `None` leaves a side open.
	///
	/// # Errors
	/// Returns an error if a bound is NaN or if `min > max`.
	pub fn set_score_range(&mut self, min: Option<f64>, max: Option<f64>) -> Result<(), VbeError> {
		check_score_range(min, max)?;
		self.min_score = min;
		self.max_score = max;
		Ok(())
	}

	/// Checks every invariant, for configs built through serde.
	pub fn validate(&self) -> Result<(), VbeError> {
		if self.max_suffix_length < 1 {
			return Err(VbeError::InvalidConfig("max suffix length must be >= 1".to_owned()));
		}
		if self.min_sample_count < 1 {
			return Err(VbeError::InvalidConfig("min sample count must be >= 1".to_owned()));
		}
		check_score_range(self.min_score, self.max_score)
	}
}

fn check_score_range(min: Option<f64>, max: Option<f64>) -> Result<(), VbeError> {
	if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) {
		return Err(VbeError::InvalidConfig("score bounds must be numbers".to_owned()));
	}
	if let (Some(min), Some(max)) = (min, max) {
		if min > max {
			return Err(VbeError::InvalidConfig(format!("min score {min} is above max score {max}")));
		}
	}
	Ok(())
}

use serde::{Deserialize, Serialize};

use crate::error::VbeError;

/// Minimum number of characters a name needs to reach the engine.
pub const MIN_NAME_LENGTH: usize = 2;

/// Read-only list of normalized names analyzed by the engine.
///
/// Names are expected to be already normalized by the loader
/// (lower-case, parenthetical part removed, trimmed).
///
/// # Invariants
/// - The corpus is never empty
/// - Every name has at least `MIN_NAME_LENGTH` characters
/// - Order is preserved, so positions can be joined back to the loader's rows
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Corpus {
	names: Vec<String>,
}

impl Corpus {
	/// Creates a corpus from already normalized names.
	///
	/// # Errors
	/// - `VbeError::EmptyCorpus` if `names` is empty.
	/// - `VbeError::NameTooShort` for the first name shorter than 2 characters.
	///   Malformed names are the loader's job to filter; reaching here is an input error.
	pub fn new(names: Vec<String>) -> Result<Self, VbeError> {
		if names.is_empty() {
			return Err(VbeError::EmptyCorpus);
		}
		if let Some((index, name)) = names
			.iter()
			.enumerate()
			.find(|(_, name)| name.chars().count() < MIN_NAME_LENGTH)
		{
			return Err(VbeError::NameTooShort { index, name: name.clone() });
		}
		Ok(Self { names })
	}

	/// Convenience constructor from any iterator of string-likes.
	pub fn from_names<I, S>(names: I) -> Result<Self, VbeError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(names.into_iter().map(Into::into).collect())
	}

	pub fn names(&self) -> &[String] {
		&self.names
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	/// Always `false` for a constructed corpus, kept for API symmetry with `len`.
	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.names.iter().map(String::as_str)
	}
}

use thiserror::Error;

/// Errors raised while building or querying a suffix analysis.
#[derive(Error, Debug)]
pub enum VbeError {
	/// A name reached the engine with fewer than 2 characters.
	#[error("name {name:?} at position {index} is shorter than 2 characters")]
	NameTooShort { index: usize, name: String },

	#[error("corpus is empty")]
	EmptyCorpus,

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// Two indexes built with different maximum suffix lengths.
	#[error("suffix length mismatch: {0} != {1}")]
	LengthMismatch(usize, usize),

	#[error("missing column {0:?} in CSV header")]
	MissingColumn(String),

	#[error("worker thread failed: {0}")]
	Worker(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// CSV place loading and name normalization.
pub mod loader;

/// JSON export of the selection and per-suffix point sets.
pub mod export;

pub use export::{Exporter, PointSet};
pub use loader::{CsvColumns, LoadReport, Place};

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_lines<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	Ok(read_to_string(filename)?.lines().map(str::to_owned).collect())
}

/// Reads a whole file, accepting Latin-1 encoded exports.
///
/// Valid UTF-8 sequences are kept as is. Only bytes that are not valid UTF-8
/// are decoded one to one as Latin-1 characters, which is what public
/// administrative CSV exports commonly use.
pub fn read_to_string<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	let mut bytes = Vec::new();
	File::open(filename)?.read_to_end(&mut bytes)?;

	let mut contents = String::with_capacity(bytes.len());
	for chunk in bytes.utf8_chunks() {
		contents.push_str(chunk.valid());
		contents.extend(chunk.invalid().iter().map(|b| *b as char));
	}
	Ok(contents)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/communes.csv"` → `"communes"`
/// - `"communes.csv"` → `"communes"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

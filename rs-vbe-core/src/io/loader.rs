//! Place corpus loading.
//!
//! Supports two inputs:
//! - CSV: one place per row, name and `x`/`y` columns picked by header
//! - TXT: one name per line, no coordinates
//!
//! The delimiter of a CSV file is sniffed from its header (`;` or `,`),
//! records are then read with the `csv` crate.

use std::path::Path;

use csv::StringRecord;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{read_lines, read_to_string};
use crate::error::VbeError;
use crate::model::corpus::{Corpus, MIN_NAME_LENGTH};

/// A named point, as read from one CSV row.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Place {
	/// Normalized name.
	pub name: String,
	pub x: f64,
	pub y: f64,
}

/// Header names of the columns to read.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CsvColumns {
	pub name: String,
	pub x: String,
	pub y: String,
}

impl Default for CsvColumns {
	/// Columns of the French postal code / INSEE code open-data export.
	fn default() -> Self {
		Self { name: "Nom Commune".to_owned(), x: "X Centroid".to_owned(), y: "Y Centroid".to_owned() }
	}
}

/// Places read from a CSV file, with row accounting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
	pub places: Vec<Place>,
	/// Data rows read, header excluded.
	pub rows: usize,
	/// Rows dropped for a short name or unparsable coordinates.
	pub skipped: usize,
}

impl LoadReport {
	/// Corpus of the loaded names, in place order.
	///
	/// Positions in the corpus are positions in `places`.
	pub fn corpus(&self) -> Result<Corpus, VbeError> {
		Corpus::new(self.places.iter().map(|place| place.name.clone()).collect())
	}
}

/// Lower-cases a raw name, drops any parenthetical part and trims it.
///
/// Example: `"Castillon (Canton de Lembeye)"` → `"castillon"`.
pub fn normalize_name(raw: &str) -> String {
	let lowered = raw.to_lowercase();
	lowered.split('(').next().unwrap_or_default().trim().to_owned()
}

/// Picks `;` or `,`, whichever appears more in the header line.
///
/// Ties go to `;`.
pub fn sniff_delimiter(header: &str) -> u8 {
	let semicolons = header.matches(';').count();
	let commas = header.matches(',').count();
	if commas > semicolons { b',' } else { b';' }
}

/// Parses CSV content into places.
///
/// Quoted fields may hold delimiters, doubled quotes and line breaks.
/// Records with a short name, unparsable coordinates or a malformed
/// layout are counted as skipped.
///
/// # Errors
/// Returns `VbeError::MissingColumn` if a configured column is not in the header.
/// An empty input yields an empty report.
pub fn parse_places(content: &str, columns: &CsvColumns) -> Result<LoadReport, VbeError> {
	let content = content.trim_start_matches('\u{feff}');
	let Some(header_line) = content.lines().next().filter(|line| !line.trim().is_empty()) else {
		return Ok(LoadReport::default());
	};

	let mut reader = csv::ReaderBuilder::new()
		.delimiter(sniff_delimiter(header_line))
		.flexible(true)
		.from_reader(content.as_bytes());

	let headers = reader.headers()?.clone();
	let position = |column: &str| {
		headers
			.iter()
			.position(|h| h.trim() == column)
			.ok_or_else(|| VbeError::MissingColumn(column.to_owned()))
	};
	let name_at = position(&columns.name)?;
	let x_at = position(&columns.x)?;
	let y_at = position(&columns.y)?;

	let mut report = LoadReport::default();
	for result in reader.records() {
		let record = match result {
			Ok(record) => record,
			Err(e) => {
				debug!("unreadable record: {e}");
				report.rows += 1;
				report.skipped += 1;
				continue;
			}
		};
		if record.iter().all(|field| field.trim().is_empty()) {
			continue;
		}

		report.rows += 1;
		match parse_row(&record, name_at, x_at, y_at) {
			Some(place) => report.places.push(place),
			None => report.skipped += 1,
		}
	}

	Ok(report)
}

fn parse_row(record: &StringRecord, name_at: usize, x_at: usize, y_at: usize) -> Option<Place> {
	let raw_name = record.get(name_at)?;
	if raw_name.chars().count() < MIN_NAME_LENGTH {
		return None;
	}
	let x = record.get(x_at)?.trim().parse::<f64>().ok()?;
	let y = record.get(y_at)?.trim().parse::<f64>().ok()?;

	let name = normalize_name(raw_name);
	if name.chars().count() < MIN_NAME_LENGTH {
		return None;
	}
	Some(Place { name, x, y })
}

/// Reads places from a CSV file.
///
/// # Errors
/// Returns an error on I/O failure or missing column.
pub fn read_places<P: AsRef<Path>>(path: P, columns: &CsvColumns) -> Result<LoadReport, VbeError> {
	let content = read_to_string(&path)?;
	let report = parse_places(&content, columns)?;
	if report.skipped > 0 {
		warn!("{}: skipped {} of {} rows", path.as_ref().display(), report.skipped, report.rows);
	}
	info!("{}: loaded {} places", path.as_ref().display(), report.places.len());
	Ok(report)
}

/// Reads a plain text corpus, one name per line.
///
/// Lines are normalized; blank lines, `#` comments and names shorter than
/// 2 characters after normalization are skipped.
pub fn read_names<P: AsRef<Path>>(path: P) -> Result<Corpus, VbeError> {
	let names: Vec<String> = read_lines(&path)?
		.iter()
		.map(|line| line.trim())
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.map(normalize_name)
		.filter(|name| name.chars().count() >= MIN_NAME_LENGTH)
		.collect();
	info!("{}: loaded {} names", path.as_ref().display(), names.len());
	Corpus::new(names)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalizes_names() {
		assert_eq!(normalize_name("Castillon (Canton de Lembeye)"), "castillon");
		assert_eq!(normalize_name("  Saint-Étienne "), "saint-étienne");
		assert_eq!(normalize_name("(x)"), "");
	}

	#[test]
	fn sniffs_delimiter_from_header() {
		assert_eq!(sniff_delimiter("Code;Nom Commune;X Centroid"), b';');
		assert_eq!(sniff_delimiter("Code,Nom Commune,X Centroid"), b',');
		assert_eq!(sniff_delimiter("single"), b';');
	}

	#[test]
	fn quoted_fields_keep_delimiters_and_quotes() {
		let content = "Nom Commune;X Centroid;Y Centroid\n\"Pont; \"\"Vieux\"\"\";1.0;2.0\n";
		let report = parse_places(content, &CsvColumns::default()).unwrap();
		assert_eq!(report.places[0].name, "pont; \"vieux\"");
	}

	#[test]
	fn quoted_line_break_stays_in_one_record() {
		let content = "CODE INSEE;Nom Commune;X Centroid;Y Centroid\n01001;\"Saint-Jean\nde-Luz\";1.0;2.0\n01002;Paris;3.0;4.0\n";
		let report = parse_places(content, &CsvColumns::default()).unwrap();

		assert_eq!(report.rows, 2);
		assert_eq!(report.skipped, 0);
		let names: Vec<&str> = report.places.iter().map(|p| p.name.as_str()).collect();
		assert_eq!(names, vec!["saint-jean\nde-luz", "paris"]);
	}

	#[test]
	fn empty_input_is_an_empty_report() {
		assert_eq!(parse_places("", &CsvColumns::default()).unwrap(), LoadReport::default());
	}

	#[test]
	fn parses_rows_and_skips_bad_ones() {
		let content = "\
CODE INSEE;Nom Commune;X Centroid;Y Centroid
01001;L'Abergement-Clémenciat;8717.6;65459.3
01002;Castillon (Canton de Lembeye);8800.1;65400.0
01003;Y;8000.0;65000.0
01004;Nowhere;n/a;65000.0

01005;Ambérieu-en-Bugey;8827.8;65433.7
";
		let report = parse_places(content, &CsvColumns::default()).unwrap();

		assert_eq!(report.rows, 5);
		assert_eq!(report.skipped, 2);
		let names: Vec<&str> = report.places.iter().map(|p| p.name.as_str()).collect();
		assert_eq!(names, vec!["l'abergement-clémenciat", "castillon", "ambérieu-en-bugey"]);
		assert_eq!(report.places[1].x, 8800.1);
		assert_eq!(report.corpus().unwrap().len(), 3);
	}

	#[test]
	fn missing_column_is_an_error() {
		let content = "name,x,y\nparis,1,2\n";
		let err = parse_places(content, &CsvColumns::default()).unwrap_err();
		assert!(matches!(err, VbeError::MissingColumn(column) if column == "Nom Commune"));
	}

	#[test]
	fn custom_columns_with_commas() {
		let columns = CsvColumns { name: "name".to_owned(), x: "lon".to_owned(), y: "lat".to_owned() };
		let content = "name,lat,lon\n\"Lyon\",45.76,4.83\n";
		let report = parse_places(content, &columns).unwrap();
		assert_eq!(report.places, vec![Place { name: "lyon".to_owned(), x: 4.83, y: 45.76 }]);
	}

	#[test]
	fn reads_plain_names() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("names.txt");
		std::fs::write(&path, "# communes\nParis\n\nA\nLyon (Rhône)\n").unwrap();

		let corpus = read_names(&path).unwrap();
		assert_eq!(corpus.names(), &["paris".to_owned(), "lyon".to_owned()]);
	}
}

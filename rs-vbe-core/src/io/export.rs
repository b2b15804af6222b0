use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use super::loader::Place;
use crate::error::VbeError;
use crate::model::analysis::SuffixAnalysis;
use crate::model::vbe::RankedSuffix;

/// Points of the places ending with one suffix.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PointSet {
	pub suffix: String,
	/// Count of the selection entry (see `RankedSuffix::count`), or the
	/// ending count for suffixes outside the selection.
	pub count: usize,
	/// Number of places ending with `suffix`, i.e. `points.len()`.
	pub members: usize,
	/// Normalized VBE from the selection, `None` outside of it.
	pub score: Option<f64>,
	pub points: Vec<[f64; 2]>,
}

/// File name of a suffix point set: reversed suffix, then member count.
///
/// Reversing groups files of suffixes sharing an ending when listed.
/// Example: `("ville", 1234)` → `"elliv_1234.json"`.
pub fn export_file_name(suffix: &str, count: usize) -> String {
	let reversed: String = suffix.chars().rev().collect();
	format!("{reversed}_{count}.json")
}

/// Joins analysis results back to place coordinates.
///
/// Built from the places the analysis corpus was made of, in the same order.
/// The background (every point) is computed once, up front, and reused.
#[derive(Clone, Debug, Default)]
pub struct Exporter {
	background: Vec<[f64; 2]>,
}

impl Exporter {
	pub fn new(places: &[Place]) -> Self {
		Self { background: places.iter().map(|place| [place.x, place.y]).collect() }
	}

	/// Every point of the corpus.
	pub fn background(&self) -> &[[f64; 2]] {
		&self.background
	}

	/// Points of the places ending with `suffix`.
	pub fn points_of(&self, analysis: &SuffixAnalysis, suffix: &str) -> Vec<[f64; 2]> {
		analysis
			.member_indices(suffix)
			.into_iter()
			.filter_map(|i| self.background.get(i).copied())
			.collect()
	}

	/// Point set of one selected entry.
	pub fn point_set(&self, analysis: &SuffixAnalysis, entry: &RankedSuffix) -> PointSet {
		let points = self.points_of(analysis, &entry.suffix);
		PointSet {
			suffix: entry.suffix.clone(),
			count: entry.count,
			members: points.len(),
			score: Some(entry.score),
			points,
		}
	}

	/// Point set of any suffix, scored only if `selection` holds it.
	///
	/// Only reads the analysis: looking up arbitrary suffixes never
	/// computes or caches an entropy.
	pub fn lookup(&self, analysis: &SuffixAnalysis, selection: &[RankedSuffix], suffix: &str) -> PointSet {
		match selection.iter().find(|entry| entry.suffix == suffix) {
			Some(entry) => self.point_set(analysis, entry),
			None => {
				let points = self.points_of(analysis, suffix);
				PointSet {
					suffix: suffix.to_owned(),
					count: analysis.count(suffix),
					members: points.len(),
					score: None,
					points,
				}
			}
		}
	}

	/// Writes the selection and its point sets into `dir`.
	///
	/// # Behavior
	/// - Creates `dir` if needed.
	/// - Writes `ranking.json` with the selection.
	/// - Writes `background.json` with every point, once.
	/// - Writes one `<reversed suffix>_<count>.json` per selected suffix,
	///   named with the same count `ranking.json` reports.
	///
	/// Returns the paths written, in that order.
	///
	/// # Errors
	/// Returns an error if the corpus and places differ in size, or on I/O failure.
	pub fn write_all<P: AsRef<Path>>(
		&self,
		dir: P,
		analysis: &SuffixAnalysis,
		selection: &[RankedSuffix],
	) -> Result<Vec<PathBuf>, VbeError> {
		if analysis.corpus().len() != self.background.len() {
			return Err(VbeError::InvalidConfig(format!(
				"corpus has {} names but {} places were given",
				analysis.corpus().len(),
				self.background.len()
			)));
		}

		let dir = dir.as_ref();
		fs::create_dir_all(dir)?;

		let mut written = Vec::with_capacity(selection.len() + 2);
		written.push(write_json(dir.join("ranking.json"), selection)?);
		written.push(write_json(dir.join("background.json"), &self.background)?);

		for entry in selection.iter().filter(|entry| !entry.suffix.is_empty()) {
			let point_set = self.point_set(analysis, entry);
			let path = dir.join(export_file_name(&point_set.suffix, point_set.count));
			written.push(write_json(path, &point_set)?);
		}

		info!("exported {} files into {}", written.len(), dir.display());
		Ok(written)
	}
}

fn write_json<T: Serialize + ?Sized>(path: PathBuf, value: &T) -> Result<PathBuf, VbeError> {
	let bytes = serde_json::to_vec(value)?;
	fs::write(&path, bytes)?;
	Ok(path)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::config::AnalysisConfig;

	fn places() -> Vec<Place> {
		["abelville", "rondville", "other", "newville"]
			.iter()
			.enumerate()
			.map(|(i, name)| Place { name: (*name).to_owned(), x: i as f64, y: 10.0 * i as f64 })
			.collect()
	}

	fn analysis(places: &[Place]) -> SuffixAnalysis {
		let mut config = AnalysisConfig::default();
		config.set_min_sample_count(1).unwrap();
		config.set_max_suffix_length(6).unwrap();
		config.min_count = 0;
		SuffixAnalysis::from_names(places.iter().map(|p| p.name.clone()), config).unwrap()
	}

	#[test]
	fn file_name_is_reversed_suffix_and_count() {
		assert_eq!(export_file_name("ville", 1234), "elliv_1234.json");
		assert_eq!(export_file_name("ac", 3), "ca_3.json");
	}

	#[test]
	fn points_follow_member_positions() {
		let places = places();
		let analysis = analysis(&places);
		let exporter = Exporter::new(&places);

		assert_eq!(exporter.background().len(), 4);
		assert_eq!(exporter.points_of(&analysis, "ville"), vec![[0.0, 0.0], [1.0, 10.0], [3.0, 30.0]]);
	}

	#[test]
	fn writes_ranking_background_and_point_sets() {
		let places = places();
		let analysis = analysis(&places);
		let exporter = Exporter::new(&places);
		let dir = tempfile::tempdir().unwrap();
		let selection = vec![RankedSuffix::new("ville", 3, 0.5), RankedSuffix::new("r", 1, 0.0)];

		let written = exporter.write_all(dir.path(), &analysis, &selection).unwrap();
		let names: Vec<String> = written.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
		assert_eq!(names, vec!["ranking.json", "background.json", "elliv_3.json", "r_1.json"]);

		let bytes = fs::read(dir.path().join("elliv_3.json")).unwrap();
		let point_set: PointSet = serde_json::from_slice(&bytes).unwrap();
		assert_eq!(point_set.count, 3);
		assert_eq!(point_set.members, 3);
		assert_eq!(point_set.score, Some(0.5));
	}

	#[test]
	fn letter_files_use_the_ranking_count() {
		let places = places();
		let analysis = analysis(&places);
		let exporter = Exporter::new(&places);
		let dir = tempfile::tempdir().unwrap();
		// 'l' occurs 7 times across names but ends none of them
		let letter = RankedSuffix::new("l", analysis.index().alphabet().count('l'), 0.0);
		assert_eq!(letter.count, 7);

		let written = exporter.write_all(dir.path(), &analysis, &[letter]).unwrap();
		assert_eq!(written[2].file_name().unwrap(), "l_7.json");

		let point_set: PointSet = serde_json::from_slice(&fs::read(&written[2]).unwrap()).unwrap();
		assert_eq!(point_set.count, 7);
		assert_eq!(point_set.members, 0);
		assert!(point_set.points.is_empty());
	}

	#[test]
	fn lookup_scores_only_selected_suffixes() {
		let places = places();
		let analysis = analysis(&places);
		let exporter = Exporter::new(&places);
		let selection = vec![RankedSuffix::new("ville", 3, 0.5)];
		let cached = analysis.cached_entropies();

		let selected = exporter.lookup(&analysis, &selection, "ville");
		assert_eq!(selected.score, Some(0.5));
		assert_eq!(selected.members, 3);

		let other = exporter.lookup(&analysis, &selection, "er");
		assert_eq!(other.score, None);
		assert_eq!(other.count, 1);
		assert_eq!(other.points, vec![[2.0, 20.0]]);

		for i in 0..100 {
			assert_eq!(exporter.lookup(&analysis, &selection, &format!("zz{i}")).score, None);
		}
		assert_eq!(analysis.cached_entropies(), cached);
	}

	#[test]
	fn rejects_mismatched_places() {
		let places = places();
		let analysis = analysis(&places);
		let exporter = Exporter::new(&places[..2]);
		let dir = tempfile::tempdir().unwrap();
		assert!(exporter.write_all(dir.path(), &analysis, &[]).is_err());
	}
}

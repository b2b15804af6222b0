// Corpus-level properties of the suffix index, entropy engine and selection.

use std::collections::{BTreeMap, BTreeSet};

use approx::assert_relative_eq;
use proptest::prelude::*;
use rs_vbe_core::model::{AnalysisConfig, Corpus, EntropyEngine, NGramIndex, SuffixAnalysis};

/// Deterministic corpus of stems and endings with uneven repetition.
fn communes() -> Vec<String> {
	let stems = ["abel", "ron", "nev", "mar", "sol", "pit", "cor", "lu", "ber", "tour", "gar", "mon"];
	let endings = ["ville", "court", "ac", "y", "heim", "ing", "ieu", "ans", "o"];
	let mut names = Vec::new();
	for (i, stem) in stems.iter().enumerate() {
		for (j, ending) in endings.iter().enumerate() {
			for repeat in 0..(1 + (i * 7 + j * 3) % 4) {
				let link = ["", "e", "a", "i"][repeat];
				names.push(format!("{stem}{link}{ending}"));
			}
		}
	}
	names
}

fn config(len_max: usize, min_sample_count: usize, min_count: usize) -> AnalysisConfig {
	let mut config = AnalysisConfig::default();
	config.set_max_suffix_length(len_max).unwrap();
	config.set_min_sample_count(min_sample_count).unwrap();
	config.min_count = min_count;
	config.threads = 3;
	config
}

fn every_suffix(index: &NGramIndex) -> Vec<String> {
	let table = index.table();
	(0..=table.len_max()).flat_map(|k| table.bucket(k).map(|(s, _)| s.to_owned()).collect::<Vec<_>>()).collect()
}

#[test]
fn ville_has_three_predecessors() {
	let mut analysis = SuffixAnalysis::from_names(["abelville", "rondville", "newville", "other"], config(5, 1, 0)).unwrap();

	assert_eq!(analysis.count("ville"), 3);
	assert_relative_eq!(analysis.left_entropy("ville").unwrap(), 3.0_f64.ln(), epsilon = 1e-12);
}

#[test]
fn empty_suffix_entropy_is_final_character_entropy() {
	let names = communes();
	let mut analysis = SuffixAnalysis::from_names(names.clone(), config(6, 20, 0)).unwrap();

	let mut finals: BTreeMap<char, usize> = BTreeMap::new();
	for name in &names {
		*finals.entry(name.chars().last().unwrap()).or_insert(0) += 1;
	}
	let total = names.len() as f64;
	let expected: f64 = finals
		.values()
		.map(|count| {
			let p = *count as f64 / total;
			-p * p.ln()
		})
		.sum();

	assert_relative_eq!(analysis.left_entropy("").unwrap(), expected, epsilon = 1e-12);
}

#[test]
fn low_count_suffixes_stay_undefined() {
	let mut analysis = SuffixAnalysis::from_names(communes(), config(8, 20, 0)).unwrap();

	let rare: Vec<String> = every_suffix(analysis.index())
		.into_iter()
		.filter(|s| !s.is_empty() && analysis.count(s) < 20)
		.collect();
	assert!(!rare.is_empty());

	for suffix in rare {
		assert_eq!(analysis.left_entropy(&suffix), None, "{suffix}");
		assert_eq!(analysis.vbe(&suffix), None, "{suffix}");
		assert_eq!(analysis.normalized_vbe(&suffix), None, "{suffix}");
	}
}

#[test]
fn ranking_is_reproducible_across_runs() {
	let mut first = SuffixAnalysis::from_names(communes(), config(10, 5, 10)).unwrap();
	let mut second = SuffixAnalysis::from_names(communes(), config(10, 5, 10)).unwrap();

	let ranked = first.rank();
	assert!(!ranked.is_empty());
	assert_eq!(ranked, first.rank());

	let again = second.rank();
	assert_eq!(ranked.len(), again.len());
	for (a, b) in ranked.iter().zip(&again) {
		assert_eq!(a.suffix, b.suffix);
		assert_eq!(a.count, b.count);
		assert_eq!(a.score.to_bits(), b.score.to_bits());
	}
}

#[test]
fn selection_has_letters_at_zero_and_no_empty_suffix() {
	let min_count = 15;
	let mut analysis = SuffixAnalysis::from_names(communes(), config(10, 5, min_count)).unwrap();
	let selection = analysis.select();

	assert!(selection.iter().all(|entry| !entry.suffix.is_empty()));

	let alphabet = analysis.index().alphabet().clone();
	for (c, count) in alphabet.iter().filter(|(_, count)| *count > min_count) {
		let entry = selection
			.iter()
			.find(|entry| entry.suffix == c.to_string())
			.unwrap_or_else(|| panic!("letter {c} ({count}) missing"));
		assert_eq!(entry.score, 0.0);
		assert_eq!(entry.count, count);
	}

	// Scored entries come first, letters after
	let first_letter = selection.iter().position(|entry| entry.suffix.chars().count() == 1).unwrap();
	assert!(selection[first_letter..].iter().all(|entry| entry.suffix.chars().count() == 1));
	assert!(selection[..first_letter].iter().all(|entry| entry.score > 0.0));
}

#[test]
fn parallel_and_sequential_indexes_agree() {
	let corpus = Corpus::new(communes()).unwrap();
	let sequential = NGramIndex::build(&corpus, 9).unwrap();
	assert_eq!(NGramIndex::build_parallel(&corpus, 9, 0).unwrap(), sequential);

	let mut warmed = EntropyEngine::new(sequential.clone(), 2, 4).unwrap();
	let mut lazy = EntropyEngine::new(sequential.clone(), 2, 1).unwrap();
	warmed.warm_all().unwrap();
	for suffix in every_suffix(&sequential) {
		assert_eq!(warmed.left_entropy(&suffix), lazy.left_entropy(&suffix));
	}
}

fn name_strategy() -> impl Strategy<Value = String> {
	"[abcde]{2,7}"
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(48))]

	#[test]
	fn suffix_count_bounds_its_extensions(names in prop::collection::vec(name_strategy(), 1..60)) {
		let corpus = Corpus::new(names).unwrap();
		let index = NGramIndex::build(&corpus, 5).unwrap();
		let table = index.table();

		for k in 0..=table.len_max() {
			for (suffix, count) in table.bucket(k) {
				let extensions: usize = index
					.alphabet()
					.chars()
					.map(|c| table.count(&format!("{c}{suffix}")))
					.sum();
				prop_assert!(count >= extensions, "{suffix:?}: {count} < {extensions}");
			}
		}
		prop_assert_eq!(table.total(), corpus.len());
	}

	#[test]
	fn higher_min_count_selects_a_subset(
		names in prop::collection::vec(name_strategy(), 20..120),
		low in 0usize..6,
		step in 1usize..6,
	) {
		let high = low + step;
		let mut analysis = SuffixAnalysis::from_names(names.clone(), config(4, 2, low)).unwrap();
		let low_set: BTreeSet<String> = analysis.select().into_iter().map(|e| e.suffix).collect();

		let mut analysis = SuffixAnalysis::from_names(names, config(4, 2, high)).unwrap();
		let high_set: BTreeSet<String> = analysis.select().into_iter().map(|e| e.suffix).collect();

		prop_assert!(high_set.is_subset(&low_set), "{high_set:?} not in {low_set:?}");
	}
}

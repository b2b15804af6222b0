use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};
use log::{info, warn};
use serde::Deserialize;

use rs_vbe_core::io::export::Exporter;
use rs_vbe_core::io::loader::{read_places, CsvColumns};
use rs_vbe_core::io::{get_filename, list_files, normalize_folder};
use rs_vbe_core::model::{AnalysisConfig, RankedSuffix, SuffixAnalysis};

const DATA_DIR: &str = "./data";

/// Query parameters of the `/v1/load_corpus` endpoint
#[derive(Deserialize)]
struct LoadParams {
	name: Option<String>,
	max_suffix_length: Option<usize>,
	min_sample_count: Option<usize>,
	min_count: Option<usize>,
	min_score: Option<f64>,
	max_score: Option<f64>,
	top_per_length: Option<usize>,
}

#[derive(Deserialize)]
struct MembersQuery {
	suffix: Option<String>,
}

/// One loaded corpus with everything renderers ask for.
///
/// The selection and background are computed once per load.
struct LoadedCorpus {
	name: String,
	analysis: SuffixAnalysis,
	exporter: Exporter,
	selection: Vec<RankedSuffix>,
}

struct SharedData {
	corpus: Option<LoadedCorpus>,
}

impl LoadParams {
	/// Builds the analysis configuration, defaults for missing parameters.
	fn config(&self) -> Result<AnalysisConfig, String> {
		let mut config = AnalysisConfig::default();
		if let Some(length) = self.max_suffix_length {
			config.set_max_suffix_length(length).map_err(|e| e.to_string())?;
		}
		if let Some(count) = self.min_sample_count {
			config.set_min_sample_count(count).map_err(|e| e.to_string())?;
		}
		config.set_score_range(self.min_score, self.max_score).map_err(|e| e.to_string())?;
		if let Some(count) = self.min_count {
			config.min_count = count;
		}
		config.top_per_length = self.top_per_length;
		Ok(config)
	}
}

/// Loads `<DATA_DIR>/<name>.csv` and runs the analysis.
fn load_corpus(name: &str, config: AnalysisConfig) -> Result<LoadedCorpus, Box<dyn std::error::Error>> {
	let path = normalize_folder(DATA_DIR).join(format!("{name}.csv"));
	let report = read_places(&path, &CsvColumns::default())?;
	let mut analysis = SuffixAnalysis::new(report.corpus()?, config)?;
	let selection = analysis.select();
	let exporter = Exporter::new(&report.places);

	info!("corpus {} loaded: {} places, {} suffixes", name, report.places.len(), selection.len());
	Ok(LoadedCorpus { name: get_filename(&path)?, analysis, exporter, selection })
}

/// HTTP GET endpoint `/v1/suffixes`
///
/// Returns the selection of the loaded corpus as JSON `(suffix, count, score)` objects.
#[get("/v1/suffixes")]
async fn get_suffixes(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Corpus lock failed"),
	};
	match &shared_data.corpus {
		Some(corpus) => HttpResponse::Ok().json(&corpus.selection),
		None => HttpResponse::NotFound().body("No corpus loaded"),
	}
}

/// HTTP GET endpoint `/v1/members`
///
/// Returns the points of the places ending with `suffix`.
/// The score is only set for suffixes of the selection.
#[get("/v1/members")]
async fn get_members(data: web::Data<Mutex<SharedData>>, query: web::Query<MembersQuery>) -> impl Responder {
	let suffix = match &query.suffix {
		Some(s) if !s.trim().is_empty() => s.trim().to_lowercase(),
		_ => return HttpResponse::BadRequest().body("Missing or empty suffix"),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Corpus lock failed"),
	};
	match &shared_data.corpus {
		Some(corpus) => HttpResponse::Ok().json(corpus.exporter.lookup(&corpus.analysis, &corpus.selection, &suffix)),
		None => HttpResponse::NotFound().body("No corpus loaded"),
	}
}

/// HTTP GET endpoint `/v1/background`
///
/// Returns every point of the loaded corpus.
#[get("/v1/background")]
async fn get_background(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Corpus lock failed"),
	};
	match &shared_data.corpus {
		Some(corpus) => HttpResponse::Ok().json(corpus.exporter.background()),
		None => HttpResponse::NotFound().body("No corpus loaded"),
	}
}

#[get("/v1/corpora")]
async fn get_corpora() -> impl Responder {
	match list_files(normalize_folder(DATA_DIR), "csv") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n").replace(".csv", "")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

#[get("/v1/loaded_corpus")]
async fn get_loaded_corpus(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Corpus lock failed"),
	};
	match &shared_data.corpus {
		Some(corpus) => HttpResponse::Ok().body(corpus.name.clone()),
		None => HttpResponse::Ok().body(""),
	}
}

#[put("/v1/load_corpus")]
async fn put_corpus(data: web::Data<Mutex<SharedData>>, query: web::Query<LoadParams>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};
	let config = match query.config() {
		Ok(config) => config,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	// Analysis runs outside the lock
	let loaded = match load_corpus(&name, config) {
		Ok(loaded) => loaded,
		Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load corpus: {e}")),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Corpus lock failed"),
	};
	shared_data.corpus = Some(loaded);
	HttpResponse::Ok().body("Corpus loaded successfully")
}

/// Main entry point for the server.
///
/// Optionally loads the corpus named by the first argument, wraps the state
/// in a `Mutex` and starts an Actix-web HTTP server.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - Corpora are read from `./data/<name>.csv`.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let corpus = match std::env::args().nth(1) {
		Some(name) => match load_corpus(&name, AnalysisConfig::default()) {
			Ok(loaded) => Some(loaded),
			Err(e) => {
				warn!("initial corpus {name} not loaded: {e}");
				None
			}
		},
		None => None,
	};
	let shared_data = web::Data::new(Mutex::new(SharedData { corpus }));

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_suffixes)
			.service(get_members)
			.service(get_background)
			.service(get_corpora)
			.service(get_loaded_corpus)
			.service(put_corpus)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}

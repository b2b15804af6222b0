use std::path::PathBuf;

use clap::Parser;
use log::info;
use rs_vbe_core::io::export::Exporter;
use rs_vbe_core::io::loader::{read_names, read_places, CsvColumns};
use rs_vbe_core::model::{AnalysisConfig, SuffixAnalysis};

/// Ranks place-name suffixes by branching entropy and exports their point sets.
#[derive(clap::Parser, Debug)]
#[command(name = "rs-vbe-exemple")]
struct Args {
    /// Input corpus: a CSV of places, or a .txt list of names
    #[arg(short, long, default_value = "./data/code-insee-postaux-geoflar.csv")]
    input: PathBuf,

    /// Output directory for ranking.json and per-suffix point sets (CSV input only)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Longest suffix considered
    #[arg(long, default_value_t = 15)]
    max_suffix_length: usize,

    /// Count below which branching entropy is undefined
    #[arg(long, default_value_t = 20)]
    min_sample_count: usize,

    /// Count a suffix must exceed to be ranked or selected
    #[arg(long, default_value_t = 50)]
    min_count: usize,

    /// Lowest normalized VBE kept
    #[arg(long)]
    min_score: Option<f64>,

    /// Highest normalized VBE kept
    #[arg(long)]
    max_score: Option<f64>,

    /// Only rank the n most common suffixes of each length
    #[arg(long)]
    top_per_length: Option<usize>,

    /// Worker threads, 0 for one per CPU
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Number of most common suffixes shown per length in the summary
    #[arg(long, default_value_t = 4)]
    summary: usize,

    /// CSV column holding the place name
    #[arg(long, default_value = "Nom Commune")]
    name_column: String,

    /// CSV column holding the x coordinate
    #[arg(long, default_value = "X Centroid")]
    x_column: String,

    /// CSV column holding the y coordinate
    #[arg(long, default_value = "Y Centroid")]
    y_column: String,
}

impl Args {
    fn config(&self) -> Result<AnalysisConfig, rs_vbe_core::VbeError> {
        let mut config = AnalysisConfig::default();
        config.set_max_suffix_length(self.max_suffix_length)?;
        config.set_min_sample_count(self.min_sample_count)?;
        config.set_score_range(self.min_score, self.max_score)?;
        config.min_count = self.min_count;
        config.top_per_length = self.top_per_length;
        config.threads = self.threads;
        Ok(config)
    }

    fn is_plain_text(&self) -> bool {
        self.input.extension().is_some_and(|ext| ext == "txt")
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let config = args.config()?;

    // Plain text corpora have no coordinates, nothing to export
    let places = if args.is_plain_text() {
        None
    } else {
        let columns = CsvColumns { name: args.name_column.clone(), x: args.x_column.clone(), y: args.y_column.clone() };
        Some(read_places(&args.input, &columns)?)
    };
    let corpus = match &places {
        Some(report) => report.corpus()?,
        None => read_names(&args.input)?,
    };
    println!("{} names", corpus.len());

    let mut analysis = SuffixAnalysis::new(corpus, config)?;

    // Index summary
    for line in analysis.summary(args.summary) {
        let top: Vec<&str> = line.top.iter().map(|(suffix, _)| suffix.as_str()).collect();
        println!("{:>3} {:>7} {}", line.length, line.distinct, top.join(", "));
    }
    let averages: Vec<String> = analysis.average_vbe().iter().map(|(k, v)| format!("{k}:{v:.3}")).collect();
    println!("average VBE: {}", averages.join(" "));

    // Selection
    let selection = analysis.select();
    for entry in &selection {
        println!("{:>16} {:>6} {:>7.3}", entry.suffix, entry.count, entry.score);
    }

    match (&args.output, &places) {
        (Some(output), Some(report)) => {
            let written = Exporter::new(&report.places).write_all(output, &analysis, &selection)?;
            info!("{} files written", written.len());
        }
        (Some(_), None) => println!("Plain text input has no coordinates, export skipped"),
        _ => (),
    }

    Ok(())
}

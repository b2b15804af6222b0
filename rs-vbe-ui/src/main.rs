use std::collections::BTreeMap;
use std::time::Duration;

use eframe::{egui, Frame};
use egui::{Align2, Color32, Context, FontId, Pos2, Rect, Sense, Vec2};

use rand::seq::IndexedRandom;
use reqwest::blocking::Client;
use reqwest::Result;
use serde::Deserialize;

const API: &str = "http://127.0.0.1:5000";

/// Tableau palette used for suffix overlays.
const PALETTE: [Color32; 10] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(255, 127, 14),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(127, 127, 127),
    Color32::from_rgb(188, 189, 34),
    Color32::from_rgb(23, 190, 207),
];

/// One entry of `/v1/suffixes`.
#[derive(Debug, Deserialize)]
struct SuffixEntry {
    suffix: String,
    count: usize,
    score: f64,
}

/// Body of `/v1/members`.
#[derive(Debug, Deserialize)]
struct PointSet {
    members: usize,
    points: Vec<[f64; 2]>,
}

/// A suffix drawn on the map.
struct Overlay {
    color: Color32,
    members: usize,
    points: Vec<[f64; 2]>,
}

/// REST context holding a reusable blocking HTTP client.
struct RESTContext {
    client: Client,
}

impl RESTContext {
    /// Creates a new REST context with a timeout.
    fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::new(30, 0))
            .build()?;
        Ok(Self { client })
    }

    /// Sends a GET request to `/v1/suffixes`.
    fn get_suffixes(&self) -> Result<Vec<SuffixEntry>> {
        self.client
            .get(format!("{API}/v1/suffixes"))
            .send()?
            .error_for_status()?
            .json()
    }

    /// Sends a GET request to `/v1/background`.
    fn get_background(&self) -> Result<Vec<[f64; 2]>> {
        self.client
            .get(format!("{API}/v1/background"))
            .send()?
            .error_for_status()?
            .json()
    }

    /// Sends a GET request to `/v1/members` for one suffix.
    fn get_members(&self, suffix: &str) -> Result<PointSet> {
        self.client
            .get(format!("{API}/v1/members"))
            .query(&[("suffix", suffix)])
            .send()?
            .error_for_status()?
            .json()
    }

    /// Sends a GET request to `/v1/corpora`.
    fn get_corpora(&self) -> Result<String> {
        let response = self.client
            .get(format!("{API}/v1/corpora"))
            .send()?
            .error_for_status()?;
        Ok(response.text()?)
    }

    /// Sends a PUT request to `/v1/load_corpus` with query parameters.
    fn put_load_corpus(&self, params: &[(String, String)]) -> Result<String> {
        let response = self.client
            .put(format!("{API}/v1/load_corpus"))
            .query(params)
            .send()?
            .error_for_status()?;
        Ok(response.text()?)
    }
}

/// Axis-aligned bounds of the background, fixed once loaded.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: [f64; 2],
    max: [f64; 2],
}

impl Bounds {
    fn of(points: &[[f64; 2]]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self { min: *first, max: *first };
        for p in points {
            for axis in 0..2 {
                bounds.min[axis] = bounds.min[axis].min(p[axis]);
                bounds.max[axis] = bounds.max[axis].max(p[axis]);
            }
        }
        Some(bounds)
    }

    /// Maps a data point into `rect`, same scale on both axes, y pointing up.
    fn project(&self, rect: Rect, p: [f64; 2]) -> Pos2 {
        let width = (self.max[0] - self.min[0]).max(f64::EPSILON);
        let height = (self.max[1] - self.min[1]).max(f64::EPSILON);
        let scale = (rect.width() as f64 / width).min(rect.height() as f64 / height);
        let x = rect.min.x + ((p[0] - self.min[0]) * scale) as f32;
        let y = rect.min.y + ((height - (p[1] - self.min[1])) * scale) as f32;
        Pos2::new(x, y)
    }
}

/// Global UI state (MUST persist between frames in egui).
struct MapUI {
    rest: RESTContext,
    status: Option<String>,

    available_corpora: Vec<String>,
    selected_corpus: String,
    min_count: usize,
    use_score_range: bool,
    min_score: f64,
    max_score: f64,

    suffixes: Vec<SuffixEntry>,
    background: Vec<[f64; 2]>,
    bounds: Option<Bounds>,
    overlays: BTreeMap<String, Overlay>,
}

impl MapUI {
    /// Initializes the UI and fetches whatever the server already has loaded.
    fn new() -> Result<Self> {
        let mut map = Self {
            rest: RESTContext::new()?,
            status: None,

            available_corpora: Vec::new(),
            selected_corpus: String::new(),
            min_count: 50,
            use_score_range: false,
            min_score: 0.0,
            max_score: 0.21,

            suffixes: Vec::new(),
            background: Vec::new(),
            bounds: None,
            overlays: BTreeMap::new(),
        };
        map.get_corpora();
        map.refresh();
        Ok(map)
    }

    /// Builds the query parameters for a corpus load.
    fn build_query(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("name".to_owned(), self.selected_corpus.clone()),
            ("min_count".to_owned(), self.min_count.to_string()),
        ];
        if self.use_score_range {
            params.push(("min_score".into(), self.min_score.to_string()));
            params.push(("max_score".into(), self.max_score.to_string()));
        }
        params
    }

    fn get_corpora(&mut self) {
        match self.rest.get_corpora() {
            Ok(body) => {
                self.available_corpora = body.lines().map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()).collect();
                if self.selected_corpus.is_empty() {
                    self.selected_corpus = self.available_corpora.first().cloned().unwrap_or_default();
                }
            }
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    /// Fetches the suffix list and the background, once per loaded corpus.
    fn refresh(&mut self) {
        self.overlays.clear();
        match self.rest.get_suffixes() {
            Ok(suffixes) => self.suffixes = suffixes,
            Err(e) => {
                self.suffixes.clear();
                self.status = Some(format!("Error: {e}"));
                return;
            }
        }
        match self.rest.get_background() {
            Ok(points) => {
                self.bounds = Bounds::of(&points);
                self.background = points;
            }
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    fn put_load_corpus(&mut self) {
        let params = self.build_query();
        match self.rest.put_load_corpus(&params) {
            Ok(body) => {
                self.status = Some(body);
                self.refresh();
            }
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    /// Adds an overlay for `suffix` in a random palette colour.
    fn add_overlay(&mut self, suffix: &str) {
        match self.rest.get_members(suffix) {
            Ok(point_set) => {
                let color = *PALETTE.choose(&mut rand::rng()).unwrap_or(&Color32::RED);
                self.overlays.insert(
                    suffix.to_owned(),
                    Overlay { color, members: point_set.members, points: point_set.points },
                );
            }
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    /// Draws the background, the overlays and their legend.
    fn draw_map(&self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, Color32::WHITE);

        let Some(bounds) = self.bounds else {
            painter.text(rect.center(), Align2::CENTER_CENTER, "No corpus loaded", FontId::proportional(16.0), Color32::GRAY);
            return;
        };

        let background = Color32::from_black_alpha(64);
        for p in &self.background {
            painter.rect_filled(Rect::from_center_size(bounds.project(rect, *p), Vec2::splat(1.0)), 0.0, background);
        }

        for (row, (suffix, overlay)) in self.overlays.iter().enumerate() {
            for p in &overlay.points {
                painter.rect_filled(Rect::from_center_size(bounds.project(rect, *p), Vec2::splat(2.0)), 0.0, overlay.color);
            }
            let anchor = rect.left_top() + Vec2::new(10.0, 10.0 + 22.0 * row as f32);
            painter.text(
                anchor,
                Align2::LEFT_TOP,
                format!("*{suffix} ({})", overlay.members),
                FontId::monospace(16.0),
                overlay.color,
            );
        }
    }
}

impl eframe::App for MapUI {
    /// UI update loop (called every frame).
    fn update(&mut self, ctx: &Context, _: &mut Frame) {
        egui::SidePanel::left("controls").resizable(true).show(ctx, |ui| {
            egui::Grid::new("load_grid")
                .num_columns(2)
                .spacing([20.0, 6.0])
                .striped(true)
                .show(ui, |ui| {
                    ui.label("Corpus");
                    egui::ComboBox::from_id_salt("corpus")
                        .selected_text(&self.selected_corpus)
                        .show_ui(ui, |ui| {
                            for corpus in &self.available_corpora {
                                ui.selectable_value(&mut self.selected_corpus, corpus.clone(), corpus);
                            }
                        });
                    ui.end_row();

                    ui.label("Minimum count");
                    ui.add(egui::DragValue::new(&mut self.min_count).range(0..=10_000).speed(1));
                    ui.end_row();

                    ui.checkbox(&mut self.use_score_range, "Limit score");
                    if self.use_score_range {
                        ui.horizontal(|ui| {
                            ui.add(egui::DragValue::new(&mut self.min_score).speed(0.01));
                            ui.add(egui::DragValue::new(&mut self.max_score).speed(0.01));
                        });
                    } else {
                        ui.label("Any positive score");
                    }
                    ui.end_row();
                });

            if ui.add_sized([200.0, 32.0], egui::Button::new("Load")).clicked() {
                self.put_load_corpus();
            }
            if let Some(status) = &self.status {
                ui.label(status);
            }
            ui.separator();

            let mut toggled: Option<(String, bool)> = None;
            egui::ScrollArea::vertical().show(ui, |ui| {
                for entry in &self.suffixes {
                    let mut checked = self.overlays.contains_key(&entry.suffix);
                    let label = format!("{:<12} {:>6} {:>6.3}", entry.suffix, entry.count, entry.score);
                    if ui.checkbox(&mut checked, egui::RichText::new(label).monospace()).changed() {
                        toggled = Some((entry.suffix.clone(), checked));
                    }
                }
            });

            match toggled {
                Some((suffix, true)) => self.add_overlay(&suffix),
                Some((suffix, false)) => {
                    self.overlays.remove(&suffix);
                }
                None => (),
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| self.draw_map(ui));
    }
}

/// Application entry point.
fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 760.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "rs-vbe-map",
        options,
        Box::new(|_| Ok(Box::new(MapUI::new()?))),
    )
}

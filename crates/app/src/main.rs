mod state;
mod ui;

use eframe::egui;
use state::AppState;
use tracing_subscriber::EnvFilter;

struct TreemapApp {
    state: AppState,
}

impl TreemapApp {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let mut state = AppState::new();
        if let Some(path) = std::env::args_os().nth(1).map(std::path::PathBuf::from) {
            if path.is_dir() {
                state.start_scan(path);
            } else {
                state.open_xml(path);
            }
        }
        Self { state }
    }
}

impl eframe::App for TreemapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::draw(&mut self.state, ctx);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1024.0, 768.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Treemap",
        options,
        Box::new(|cc| Ok(Box::new(TreemapApp::new(cc)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

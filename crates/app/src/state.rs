use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use treemap_core::human::WeightUnit;
use treemap_core::scanner::{ScanMsg, Scanner};
use treemap_core::{LayoutConfig, Progress, Rect, TreemapView, WeightedNode, XmlLoader};

pub const ZOOM_SECONDS: f64 = 0.3;

/// Visual interpolation from a clicked rect to the full viewport.
#[derive(Clone, Copy, Debug)]
pub struct Zoom {
    pub from: Rect,
    pub started: f64,
}

impl Zoom {
    pub fn progress(&self, now: f64) -> f64 {
        ((now - self.started) / ZOOM_SECONDS).clamp(0.0, 1.0)
    }

    /// Maps a rect laid out in `viewport` into the shrunken, in-flight view.
    pub fn apply(&self, r: Rect, viewport: Rect, t: f64) -> Rect {
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        let frame = Rect::new(
            lerp(self.from.x, viewport.x),
            lerp(self.from.y, viewport.y),
            lerp(self.from.w, viewport.w),
            lerp(self.from.h, viewport.h),
        );
        let sx = if viewport.w > 0.0 { frame.w / viewport.w } else { 0.0 };
        let sy = if viewport.h > 0.0 { frame.h / viewport.h } else { 0.0 };
        Rect::new(
            frame.x + (r.x - viewport.x) * sx,
            frame.y + (r.y - viewport.y) * sy,
            r.w * sx,
            r.h * sy,
        )
    }
}

pub struct AppState {
    pub source: Option<PathBuf>,
    pub cancel: Arc<AtomicBool>,
    pub scan_rx: Option<Receiver<ScanMsg>>,
    pub progress: Progress,
    pub config: LayoutConfig,
    pub tree: Option<WeightedNode>,
    pub unit: WeightUnit,
    pub view: Option<TreemapView>,
    pub zoom: Option<Zoom>,
    pub error: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            source: None,
            cancel: Arc::new(AtomicBool::new(false)),
            scan_rx: None,
            progress: Progress::default(),
            config: LayoutConfig::default(),
            tree: None,
            unit: WeightUnit::default(),
            view: None,
            zoom: None,
            error: None,
        }
    }

    fn reset(&mut self) {
        self.progress = Progress::default();
        self.tree = None;
        self.view = None;
        self.zoom = None;
        self.error = None;
    }

    pub fn open_xml(&mut self, path: PathBuf) {
        self.cancel_scan();
        self.reset();
        self.unit = WeightUnit::Plain;
        match XmlLoader::default().load_file(&path) {
            Ok(tree) => self.tree = Some(tree),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "failed to load tree");
                self.error = Some(format!("{}: {e}", path.display()));
            }
        }
        self.source = Some(path);
    }

    pub fn start_scan(&mut self, root: PathBuf) {
        self.cancel_scan();
        self.reset();
        self.unit = WeightUnit::Bytes;
        self.source = Some(root.clone());
        // A fresh flag so a cancelled scan still winding down cannot stop this one.
        self.cancel = Arc::new(AtomicBool::new(false));

        let (tx, rx): (Sender<ScanMsg>, Receiver<ScanMsg>) = unbounded();
        self.scan_rx = Some(rx);
        let cancel = self.cancel.clone();

        std::thread::spawn(move || {
            let scanner = Scanner::new(cancel);
            scanner.scan(root, tx);
        });
    }

    pub fn cancel_scan(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.scan_rx = None;
    }

    pub fn source_name(&self) -> Option<String> {
        self.source.as_ref().map(|p| p.display().to_string())
    }

    /// Builds the view on first paint, then keeps it sized to the canvas.
    pub fn sync_viewport(&mut self, viewport: Rect) {
        if viewport.is_empty() {
            return;
        }
        match (&mut self.view, &self.tree) {
            (Some(view), _) => {
                view.resize(viewport);
            }
            (None, Some(tree)) => self.view = Some(TreemapView::new(tree, viewport, self.config)),
            (None, None) => {}
        }
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        if let Some(view) = &mut self.view {
            view.set_config(config);
        }
    }

    pub fn enter(&mut self, path: &[usize], now: f64) {
        let Some(view) = &mut self.view else { return };
        match view.enter_child(path) {
            Ok(from) => self.zoom = Some(Zoom { from, started: now }),
            Err(e) => tracing::warn!(error = %e, "drill-down rejected"),
        }
    }

    pub fn back(&mut self) {
        if let Some(view) = &mut self.view {
            if view.back() {
                self.zoom = None;
            }
        }
    }
}

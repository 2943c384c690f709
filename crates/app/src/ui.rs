use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui};
use treemap_core::human::{human_bytes, make_caption};
use treemap_core::scanner::ScanMsg;
use treemap_core::Rect;

use crate::state::AppState;

const BACKGROUND: Color32 = Color32::from_rgb(0x4c, 0x4c, 0x4c);
const CAPTION: Color32 = Color32::from_rgb(0x5c, 0x5c, 0x5c);
const PAD_X: f64 = 5.0;
const PAD_Y: f64 = 3.0;

pub fn draw(app: &mut AppState, ctx: &egui::Context) {
    poll_scan(app, ctx);

    // Ensure the UI keeps repainting during active scans
    if app.scan_rx.is_some() {
        ctx.request_repaint();
    }

    if ctx.input(|i| i.key_pressed(egui::Key::Backspace)) {
        app.back();
    }

    egui::TopBottomPanel::top("top").show(ctx, |ui| {
        top_bar(ui, app);
    });

    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(BACKGROUND))
        .show(ctx, |ui| {
            if let Some(err) = &app.error {
                ui.colored_label(Color32::LIGHT_RED, err.as_str());
                return;
            }
            if app.scan_rx.is_some() {
                let p = app.progress;
                ui.label(format!("Files: {} of {}", p.scanned, p.discovered.max(p.scanned)));
                ui.label(format!("Bytes: {}", human_bytes(p.bytes)));
                ui.add(egui::ProgressBar::new(p.fraction()).show_percentage().text("Scanning…"));
                return;
            }
            if app.tree.is_none() {
                ui.centered_and_justified(|ui| ui.label("Open an XML tree or scan a folder"));
                return;
            }
            treemap(ui, app);
        });
}

fn top_bar(ui: &mut Ui, app: &mut AppState) {
    ui.horizontal(|ui| {
        if ui.button("Open XML…").clicked() {
            if let Some(path) = rfd::FileDialog::new().add_filter("xml", &["xml"]).pick_file() {
                app.open_xml(path);
            }
        }
        if ui.button("Scan Folder…").clicked() {
            if let Some(path) = rfd::FileDialog::new().pick_folder() {
                app.start_scan(path);
            }
        }
        if app.scan_rx.is_some() && ui.button("Cancel").clicked() {
            app.cancel_scan();
        }
        ui.separator();

        let can_go_back = app.view.as_ref().is_some_and(|v| !v.is_top_level());
        if ui.add_enabled(can_go_back, egui::Button::new("⬅ Back")).clicked() {
            app.back();
        }
        if let Some(view) = &app.view {
            let mut crumbs = view.breadcrumbs();
            if let Some(first) = crumbs.first_mut() {
                if first.is_empty() {
                    *first = "/";
                }
            }
            ui.label(crumbs.join(" › "));
        } else if let Some(name) = app.source_name() {
            ui.label(name);
        }
        ui.separator();

        let mut config = app.config;
        ui.label("Subdivide above:");
        let slider =
            egui::Slider::new(&mut config.min_recurse_area, 100..=200_000).logarithmic(true);
        let changed = ui.add(slider).changed()
            | ui.checkbox(&mut config.parallel, "Parallel").changed();
        if changed && config != app.config {
            app.set_config(config);
        }
    });
}

/// Captions are drawn when either dimension leaves room past the padding;
/// the item's clip rect trims whatever does not fit.
fn shows_caption(r: Rect) -> bool {
    r.h > PAD_Y * 2.0 || r.w > PAD_X * 2.0 + 20.0
}

fn to_screen(origin: Pos2, r: Rect) -> egui::Rect {
    egui::Rect::from_min_size(
        egui::pos2(origin.x + r.x as f32, origin.y + r.y as f32),
        egui::vec2(r.w as f32, r.h as f32),
    )
}

fn treemap(ui: &mut Ui, app: &mut AppState) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click());
    let origin = response.rect.min;
    let size = response.rect.size();
    app.sync_viewport(Rect::new(0.0, 0.0, size.x as f64, size.y as f64));

    let now = ui.input(|i| i.time);
    let local = |p: Pos2| ((p.x - origin.x) as f64, (p.y - origin.y) as f64);

    if response.secondary_clicked() {
        app.back();
    } else if response.clicked() {
        let target = match (&app.view, response.interact_pointer_pos()) {
            (Some(view), Some(pos)) => {
                let (x, y) = local(pos);
                view.current().layout().drill_target(x, y).map(|i| i.path.clone())
            }
            _ => None,
        };
        if let Some(path) = target {
            app.enter(&path, now);
        }
    }

    let Some(view) = &app.view else { return };
    let frame = view.current();
    let viewport = frame.bounds();
    let zoom = app.zoom.map(|z| (z, z.progress(now)));
    if let Some((_, t)) = zoom {
        if t < 1.0 {
            ui.ctx().request_repaint();
        } else {
            app.zoom = None;
        }
    }
    let place = |r: Rect| match zoom {
        Some((z, t)) if t < 1.0 => z.apply(r, viewport, t),
        _ => r,
    };

    let bounds = to_screen(origin, place(viewport));
    painter.rect_filled(bounds, 0.0, BACKGROUND);
    if !frame.caption().is_empty() {
        let (text, longest) = make_caption(frame.caption());
        let font = (bounds.width() * 1.6 / longest.max(1) as f32).clamp(8.0, 200.0);
        let font = FontId::proportional(font);
        painter.text(bounds.center(), Align2::CENTER_CENTER, text, font, CAPTION);
    }

    let hovered = response
        .hover_pos()
        .and_then(|p| {
            let (x, y) = local(p);
            frame.layout().hit_test(x, y)
        })
        .map(|i| i.path.as_slice());

    let border = Stroke::new(1.0, Color32::WHITE);
    for item in &frame.layout().items {
        let r = place(item.rect);
        let rect = to_screen(origin, r);
        let is_hovered = hovered == Some(item.path.as_slice());
        if is_hovered {
            painter.rect_filled(rect, 0.0, Color32::YELLOW);
        }
        painter.rect_stroke(rect, 0.0, border);

        if shows_caption(r) {
            let (text, longest) = make_caption(&item.name);
            let mut font = rect.width() * 1.6 / longest.max(1) as f32;
            let lines = text.lines().count().max(1) as f32;
            if font * lines > rect.height() {
                font /= 2.0;
            }
            let color = if is_hovered { Color32::BLACK } else { Color32::WHITE };
            let font = FontId::proportional(font.clamp(4.0, 96.0));
            painter
                .with_clip_rect(rect)
                .text(rect.center(), Align2::CENTER_CENTER, text, font, color);
        }
    }

    if let Some(item) = hovered.and_then(|p| frame.node().get(p)) {
        let weight = app.unit.format(item.weight);
        response.on_hover_text(format!("{}\n{weight} ({} extra)", item.name, item.secondary));
    }
}

fn poll_scan(app: &mut AppState, ctx: &egui::Context) {
    // Take ownership of the receiver to avoid borrowing while we might assign to it.
    let Some(rx) = app.scan_rx.take() else { return; };
    let mut had_msg = false;
    let mut finished = false;
    while let Ok(msg) = rx.try_recv() {
        had_msg = true;
        match msg {
            ScanMsg::Progress(p) => app.progress = p,
            ScanMsg::Done(tree) => {
                app.tree = Some(tree);
                finished = true;
                break;
            }
            ScanMsg::Error(e) => tracing::debug!(error = %e, "unreadable entry"),
        }
    }
    if !finished {
        // Put the receiver back to keep polling next frame
        app.scan_rx = Some(rx);
    }
    if had_msg {
        ctx.request_repaint();
    }
}

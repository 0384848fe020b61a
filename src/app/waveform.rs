//! Waveform plot: min/max binned rendering, axis ticks, selection overlay,
//! and the playhead marker. Pure painting; all state lives in the session.

use egui::{Color32, Pos2, Rect, Sense, Stroke};

use crate::editor::{EditorSession, ViewportController};
use crate::editor::viewport::Y_RANGE;

/// One vertical line per pixel column: (min, max) over the samples that land
/// in that column.
pub fn build_minmax(out: &mut Vec<(f32, f32)>, samples: &[f32], bins: usize) {
    out.clear();
    if samples.is_empty() || bins == 0 {
        return;
    }
    let len = samples.len();
    let step = (len as f32 / bins as f32).max(1.0);
    let mut pos = 0.0f32;
    for _ in 0..bins {
        let start = pos as usize;
        let end = ((pos + step) as usize).min(len);
        if start >= end {
            out.push((0.0, 0.0));
        } else {
            let (mut mn, mut mx) = (f32::INFINITY, f32::NEG_INFINITY);
            for &v in &samples[start..end] {
                if v < mn {
                    mn = v;
                }
                if v > mx {
                    mx = v;
                }
            }
            if !mn.is_finite() || !mx.is_finite() {
                out.push((0.0, 0.0));
            } else {
                out.push((mn, mx));
            }
        }
        pos += step;
        if (pos as usize) >= len {
            break;
        }
    }
}

fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let f = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t) as u8;
    Color32::from_rgb(f(a.r(), b.r()), f(a.g(), b.g()), f(a.b(), b.b()))
}

fn amp_to_color(a: f32) -> Color32 {
    let t = a.clamp(0.0, 1.0).powf(0.6);
    lerp_color(
        Color32::from_rgb(80, 200, 255),
        Color32::from_rgb(255, 70, 70),
        t,
    )
}

pub struct PlotResponse {
    pub response: egui::Response,
    /// Pointer position converted to a sample index, when inside the plot.
    pub pointer_sample: Option<f32>,
}

/// Draws the visible slice of the session's buffer and returns the egui
/// response so the caller can wire drag-select and context menus.
pub fn draw_waveform(ui: &mut egui::Ui, session: &EditorSession, height: f32) -> PlotResponse {
    let avail_w = ui.available_width().max(1.0);
    let (response, painter) =
        ui.allocate_painter(egui::vec2(avail_w, height), Sense::click_and_drag());
    let rect_px = response.rect;
    let w = rect_px.width().max(1.0);
    let h = rect_px.height().max(1.0);
    painter.rect_filled(rect_px, 0.0, Color32::from_rgb(16, 16, 18));

    let vp = session.viewport();
    let (view_lo, view_hi) = vp.view();
    let span = (view_hi - view_lo).max(1.0);

    let to_x = |sample: f32| rect_px.left() + (sample - view_lo) / span * w;
    // Y axis spans the fixed plot range, so clipping samples stay visible.
    let (y_lo, y_hi) = Y_RANGE;
    let to_y = |amp: f32| {
        let t = (amp - y_lo) / (y_hi - y_lo);
        rect_px.bottom() - t * h
    };

    draw_ticks(&painter, rect_px, vp, session.buffer().sample_rate(), to_y);

    // selection highlight under the waveform
    if let Some((s, e)) = session.selection() {
        let x0 = to_x(s as f32).clamp(rect_px.left(), rect_px.right());
        let x1 = to_x(e as f32).clamp(rect_px.left(), rect_px.right());
        let sel = Rect::from_min_max(Pos2::new(x0, rect_px.top()), Pos2::new(x1, rect_px.bottom()));
        painter.rect_filled(sel, 0.0, Color32::from_rgba_unmultiplied(90, 140, 255, 40));
    }

    let samples = session.buffer().samples();
    let lo = (view_lo.max(0.0) as usize).min(samples.len());
    let hi = (view_hi.max(0.0) as usize).min(samples.len());
    if lo < hi {
        let visible = &samples[lo..hi];
        let mut bins = Vec::new();
        build_minmax(&mut bins, visible, w as usize);
        let n = bins.len().max(1) as f32;
        let zero_y = to_y(0.0);
        for (idx, &(mn, mx)) in bins.iter().enumerate() {
            let x = rect_px.left() + (idx as f32 / n) * w;
            let y0 = to_y(mx);
            let y1 = to_y(mn);
            let amp = mn.abs().max(mx.abs()).clamp(0.0, 1.0);
            painter.line_segment(
                [
                    Pos2::new(x, y0.min(y1).min(zero_y)),
                    Pos2::new(x, y0.max(y1).max(zero_y)),
                ],
                Stroke::new(1.0, amp_to_color(amp)),
            );
        }
    }

    // playhead
    let pos = vp.position() as f32;
    if pos >= view_lo && pos <= view_hi {
        let x = to_x(pos);
        painter.line_segment(
            [Pos2::new(x, rect_px.top()), Pos2::new(x, rect_px.bottom())],
            Stroke::new(2.0, Color32::from_rgb(70, 140, 255)),
        );
    }

    let pointer_sample = response
        .hover_pos()
        .or_else(|| response.interact_pointer_pos())
        .filter(|p| rect_px.contains(*p))
        .map(|p| view_lo + (p.x - rect_px.left()) / w * span);

    PlotResponse {
        response,
        pointer_sample,
    }
}

fn draw_ticks(
    painter: &egui::Painter,
    rect: Rect,
    vp: &ViewportController,
    sample_rate: u32,
    to_y: impl Fn(f32) -> f32,
) {
    let grid = Stroke::new(1.0, Color32::from_rgb(45, 45, 50));
    let label_color = Color32::from_rgb(140, 140, 150);
    let font = egui::FontId::monospace(10.0);

    let (view_lo, view_hi) = vp.view();
    let span = (view_hi - view_lo).max(1.0);
    for (sample, label) in vp.x_ticks(sample_rate) {
        let x = rect.left() + (sample - view_lo) / span * rect.width();
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            grid,
        );
        if !label.is_empty() {
            painter.text(
                Pos2::new(x, rect.bottom() - 2.0),
                egui::Align2::CENTER_BOTTOM,
                label,
                font.clone(),
                label_color,
            );
        }
    }
    for (amp, label) in vp.y_ticks() {
        let y = to_y(amp);
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], grid);
        if !label.is_empty() {
            painter.text(
                Pos2::new(rect.left() + 2.0, y),
                egui::Align2::LEFT_CENTER,
                label,
                font.clone(),
                label_color,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minmax_covers_extremes() {
        let samples = vec![0.0, 1.0, -1.0, 0.5, -0.5, 0.0, 0.2, -0.2];
        let mut out = Vec::new();
        build_minmax(&mut out, &samples, 2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], (-1.0, 1.0));
        assert_eq!(out[1], (-0.5, 0.5));
    }

    #[test]
    fn minmax_empty_input() {
        let mut out = vec![(1.0, 1.0)];
        build_minmax(&mut out, &[], 8);
        assert!(out.is_empty());
    }

    #[test]
    fn minmax_more_bins_than_samples() {
        let mut out = Vec::new();
        build_minmax(&mut out, &[0.3, -0.3], 10);
        assert!(!out.is_empty());
        assert!(out.len() <= 10);
    }
}

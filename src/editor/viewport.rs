//! View-range bookkeeping: maps between sample-index space and the plotted
//! axis, and keeps the playhead marker in step with wall-clock playback.

use crate::buffer::AudioBuffer;

pub const X_TICK_COUNT: usize = 10;
pub const Y_TICK_COUNT: usize = 15;
pub const Y_RANGE: (f32, f32) = (-1.6, 1.6);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionUpdate {
    Moved(usize),
    Finished,
}

#[derive(Clone, Debug)]
pub struct ViewportController {
    view: (f32, f32),
    position: usize,
    initial_frame: usize,
}

impl ViewportController {
    pub fn new(buffer_len: usize) -> Self {
        Self {
            view: (0.0, buffer_len.max(1) as f32),
            position: 0,
            initial_frame: 0,
        }
    }

    pub fn view(&self) -> (f32, f32) {
        self.view
    }

    pub fn set_view(&mut self, view: (f32, f32)) {
        self.view = if view.1 > view.0 { view } else { (view.1, view.0) };
    }

    pub fn zoom_to(&mut self, start: usize, end: usize) {
        self.set_view((start as f32, end as f32));
    }

    pub fn zoom_full(&mut self, buffer_len: usize) {
        self.view = (0.0, buffer_len.max(1) as f32);
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Where the playback segment starts in buffer space. Non-zero when
    /// playback was started from a selection.
    pub fn initial_frame(&self) -> usize {
        self.initial_frame
    }

    pub fn set_initial_frame(&mut self, frame: usize) {
        self.initial_frame = frame;
        self.position = frame;
    }

    /// Recomputes the playhead from elapsed playback time. Elapsed time is
    /// relative to the segment handed to the player, so the initial frame
    /// offset puts the marker back into buffer space.
    pub fn update_position(&mut self, elapsed_ms: u64, buffer: &AudioBuffer) -> PositionUpdate {
        let offset = (elapsed_ms as f64 / 1000.0 * buffer.sample_rate() as f64) as usize;
        let index = self.initial_frame + offset;
        if index <= buffer.len() {
            self.position = index;
            PositionUpdate::Moved(index)
        } else {
            PositionUpdate::Finished
        }
    }

    /// Playhead back to the start of the selection, or 0 without one. This
    /// is also where the next playback will begin.
    pub fn reset_position(&mut self, selection: Option<(usize, usize)>) {
        let frame = selection.map(|(s, _)| s).unwrap_or(0);
        self.set_initial_frame(frame);
    }

    /// 10 evenly spaced x ticks over the view range, labeled in seconds at
    /// two decimals. Edge labels are blanked so they don't clip at the plot
    /// border.
    pub fn x_ticks(&self, sample_rate: u32) -> Vec<(f32, String)> {
        let (lo, hi) = self.view;
        let rate = sample_rate.max(1) as f32;
        evenly_spaced(lo, hi, X_TICK_COUNT)
            .enumerate()
            .map(|(i, x)| {
                let label = if i == 0 || i == X_TICK_COUNT - 1 {
                    String::new()
                } else {
                    format!("{:.2}", x / rate)
                };
                (x, label)
            })
            .collect()
    }

    /// 15 fixed amplitude ticks over [-1.6, 1.6], edges blanked.
    pub fn y_ticks(&self) -> Vec<(f32, String)> {
        evenly_spaced(Y_RANGE.0, Y_RANGE.1, Y_TICK_COUNT)
            .enumerate()
            .map(|(i, y)| {
                let label = if i == 0 || i == Y_TICK_COUNT - 1 {
                    String::new()
                } else {
                    format!("{y:.1}")
                };
                (y, label)
            })
            .collect()
    }
}

fn evenly_spaced(lo: f32, hi: f32, count: usize) -> impl Iterator<Item = f32> {
    let step = (hi - lo) / (count.saturating_sub(1)).max(1) as f32;
    (0..count).map(move |i| lo + step * i as f32)
}

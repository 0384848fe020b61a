//! The waveform editing core: one exclusively-owned buffer, a selection
//! model, a unified undo/redo history, and the viewport state.
//!
//! The session never talks to the playback engine or the plot directly; it
//! queues [`EditorEvent`]s which the app drains once per frame and turns
//! into engine/plot updates. That keeps the buffer single-owner: everything
//! downstream gets copies or reads, never a second mutable alias.

pub mod filter;
pub mod history;
pub mod ops;
pub mod selection;
pub mod viewport;

use std::collections::VecDeque;

use crate::buffer::AudioBuffer;

pub use history::{HistoryStack, Snapshot, DEFAULT_MAX_DEPTH};
pub use ops::{EditError, FilterKind, TrimOutcome};
pub use selection::{ClickContext, SelectionChange, SelectionModel};
pub use viewport::{PositionUpdate, ViewportController};

/// Change notifications, drained by the app once per frame.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    /// The buffer was replaced; plot and playback need reloading.
    BufferReplaced,
    /// The playback source (full buffer vs. selection sub-range) changed.
    PlaybackSourceChanged,
    SelectionChanged(Option<(usize, usize)>),
    ViewChanged,
    /// A user-facing status line (confirmations, reported no-ops).
    Status(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrimReport {
    Trimmed { zeroed: usize },
    SilentBuffer,
}

pub struct EditorSession {
    buffer: AudioBuffer,
    selection: SelectionModel,
    history: HistoryStack,
    viewport: ViewportController,
    dirty: bool,
    events: VecDeque<EditorEvent>,
}

impl EditorSession {
    pub fn new(buffer: AudioBuffer) -> Self {
        Self::with_history_depth(buffer, DEFAULT_MAX_DEPTH)
    }

    pub fn with_history_depth(buffer: AudioBuffer, depth: usize) -> Self {
        let viewport = ViewportController::new(buffer.len());
        Self {
            buffer,
            selection: SelectionModel::new(),
            history: HistoryStack::with_max_depth(depth),
            viewport,
            dirty: false,
            events: VecDeque::new(),
        }
    }

    /// Replaces the session with a freshly decoded file. History and
    /// selection do not survive a file switch.
    pub fn load(&mut self, buffer: AudioBuffer) {
        self.viewport = ViewportController::new(buffer.len());
        self.buffer = buffer;
        self.selection = SelectionModel::new();
        self.history.clear();
        self.dirty = false;
        self.events.push_back(EditorEvent::BufferReplaced);
        self.events.push_back(EditorEvent::PlaybackSourceChanged);
    }

    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection.range()
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.events.drain(..).collect()
    }

    /// The samples to hand the player: the selection sub-range when one is
    /// active, the whole buffer otherwise, always as an owned copy, plus the
    /// buffer-space frame the segment starts at.
    pub fn playback_source(&self) -> (Vec<f32>, usize) {
        match self.selection.range() {
            Some((s, e)) => (self.buffer.slice(s, e), s),
            None => (self.buffer.samples().to_vec(), 0),
        }
    }

    // ---- selection gestures -------------------------------------------

    pub fn drag_select(&mut self, x0: f32, x1: f32) {
        let change = self.selection.set_from_drag(x0, x1, self.buffer.len());
        self.after_selection_change(change);
    }

    pub fn click_primary(&mut self, x: f32) {
        let change = self.selection.click_primary(x);
        self.after_selection_change(change);
    }

    pub fn click_context(&self, x: f32) -> ClickContext {
        self.selection.click_context(x)
    }

    fn after_selection_change(&mut self, change: SelectionChange) {
        match change {
            SelectionChange::Set(s, e) => {
                self.viewport.set_initial_frame(s);
                self.events.push_back(EditorEvent::SelectionChanged(Some((s, e))));
                self.events.push_back(EditorEvent::PlaybackSourceChanged);
            }
            SelectionChange::Cleared => {
                self.viewport.set_initial_frame(0);
                self.events.push_back(EditorEvent::SelectionChanged(None));
                self.events.push_back(EditorEvent::PlaybackSourceChanged);
            }
            SelectionChange::Unchanged => {}
        }
    }

    // ---- edit operations ----------------------------------------------

    fn ensure_non_empty(&self) -> Result<(), EditError> {
        if self.buffer.is_empty() {
            Err(EditError::EmptyBuffer)
        } else {
            Ok(())
        }
    }

    fn snapshot(&mut self) {
        self.history.push(&self.buffer, self.viewport.view());
    }

    /// Installs an edited buffer: full-extent view, selection reset,
    /// playhead back to the start. Precondition: a snapshot was pushed.
    fn commit_samples(&mut self, samples: Vec<f32>) {
        self.buffer = self.buffer.with_samples(samples);
        self.selection = SelectionModel::new();
        self.viewport.zoom_full(self.buffer.len());
        self.viewport.reset_position(None);
        self.dirty = true;
        self.events.push_back(EditorEvent::BufferReplaced);
        self.events.push_back(EditorEvent::SelectionChanged(None));
        self.events.push_back(EditorEvent::PlaybackSourceChanged);
    }

    pub fn apply_filter(&mut self, kind_index: usize) -> Result<FilterKind, EditError> {
        let kind = FilterKind::from_index(kind_index)?;
        self.ensure_non_empty()?;
        self.snapshot();
        let out = ops::band_filter(self.buffer.samples(), kind);
        self.commit_samples(out);
        self.events
            .push_back(EditorEvent::Status(format!("{} filter applied", kind.label())));
        Ok(kind)
    }

    pub fn pitch_shift(&mut self, semitones: f32) -> Result<(), EditError> {
        self.ensure_non_empty()?;
        self.snapshot();
        let out = ops::pitch_shift(self.buffer.samples(), semitones);
        self.commit_samples(out);
        self.events.push_back(EditorEvent::Status(format!(
            "Pitch shifted by {semitones} semitones"
        )));
        Ok(())
    }

    pub fn trim(&mut self, db: f32) -> Result<TrimReport, EditError> {
        self.ensure_non_empty()?;
        match ops::trim_amplitude(self.buffer.samples(), db) {
            TrimOutcome::SilentBuffer => {
                // Nothing to gate against; deliberately not an error and no
                // history entry.
                self.events
                    .push_back(EditorEvent::Status("Buffer is silent, nothing to trim".into()));
                Ok(TrimReport::SilentBuffer)
            }
            TrimOutcome::Trimmed { samples, zeroed } => {
                self.snapshot();
                self.commit_samples(samples);
                self.events
                    .push_back(EditorEvent::Status(format!("Trimmed at {db} dB ({zeroed} samples gated)")));
                Ok(TrimReport::Trimmed { zeroed })
            }
        }
    }

    pub fn crop_to_selection(&mut self) -> Result<(), EditError> {
        self.ensure_non_empty()?;
        let (s, e) = self.selection.range().ok_or(EditError::NoSelection)?;
        self.snapshot();
        let out = self.buffer.slice(s, e);
        self.commit_samples(out);
        self.events
            .push_back(EditorEvent::Status("Cropped to selection".into()));
        Ok(())
    }

    pub fn crop_out_selection(&mut self) -> Result<(), EditError> {
        self.ensure_non_empty()?;
        let (s, e) = self.selection.range().ok_or(EditError::NoSelection)?;
        self.snapshot();
        let mut out = self.buffer.slice(0, s);
        out.extend_from_slice(&self.buffer.samples()[e.min(self.buffer.len())..]);
        self.commit_samples(out);
        self.events
            .push_back(EditorEvent::Status("Cropped out selection".into()));
        Ok(())
    }

    /// View-only change, but still one entry on the unified history stack so
    /// undo walks back through zoom levels as well as data edits.
    pub fn zoom_into_selection(&mut self) -> Result<(), EditError> {
        self.ensure_non_empty()?;
        let (s, e) = self.selection.range().ok_or(EditError::NoSelection)?;
        self.snapshot();
        self.viewport.zoom_to(s, e);
        let change = self.selection.clear();
        self.after_selection_change(change);
        self.events.push_back(EditorEvent::ViewChanged);
        Ok(())
    }

    pub fn zoom_out(&mut self) -> Result<(), EditError> {
        self.ensure_non_empty()?;
        self.snapshot();
        self.viewport.zoom_full(self.buffer.len());
        let change = self.selection.clear();
        self.after_selection_change(change);
        self.events.push_back(EditorEvent::ViewChanged);
        Ok(())
    }

    // ---- history ------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.buffer, self.viewport.view()) {
            Some(snap) => {
                self.restore(snap);
                true
            }
            None => {
                self.events
                    .push_back(EditorEvent::Status("Nothing to undo".into()));
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.buffer, self.viewport.view()) {
            Some(snap) => {
                self.restore(snap);
                true
            }
            None => {
                self.events
                    .push_back(EditorEvent::Status("Nothing to redo".into()));
                false
            }
        }
    }

    /// Jump straight back to the first captured state ("reset plot").
    pub fn reset_to_origin(&mut self) -> bool {
        match self.history.reset_to_origin() {
            Some(snap) => {
                self.restore(snap);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snap: Snapshot) {
        self.buffer = snap.buffer;
        self.viewport.set_view(snap.view);
        self.selection = SelectionModel::new();
        self.viewport.reset_position(None);
        self.dirty = true;
        self.events.push_back(EditorEvent::BufferReplaced);
        self.events.push_back(EditorEvent::SelectionChanged(None));
        self.events.push_back(EditorEvent::PlaybackSourceChanged);
        self.events.push_back(EditorEvent::ViewChanged);
    }

    // ---- playback sync ------------------------------------------------

    /// Advances the playhead from an elapsed-time poll; on completion the
    /// marker snaps back to the next start position.
    pub fn update_playhead(&mut self, elapsed_ms: u64) -> PositionUpdate {
        let update = self.viewport.update_position(elapsed_ms, &self.buffer);
        if update == PositionUpdate::Finished {
            self.viewport.reset_position(self.selection.range());
        }
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(vals: &[f32]) -> EditorSession {
        EditorSession::new(AudioBuffer::new(vals.to_vec(), 1000))
    }

    #[test]
    fn crop_out_selection_scenario() {
        let mut s = session(&[0.1, 0.2, 0.3, 0.4, 0.5]);
        s.drag_select(1.0, 3.0);
        s.crop_out_selection().expect("crop");
        assert_eq!(s.buffer().samples(), &[0.1, 0.4, 0.5]);
    }

    #[test]
    fn crop_to_whole_buffer_is_identity() {
        let mut s = session(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]);
        s.drag_select(0.0, 8.0);
        s.crop_to_selection().expect("crop");
        assert_eq!(s.buffer().samples(), &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]);
    }

    #[test]
    fn crop_without_selection_fails_untouched() {
        let mut s = session(&[0.1, 0.2]);
        assert_eq!(s.crop_to_selection(), Err(EditError::NoSelection));
        assert_eq!(s.crop_out_selection(), Err(EditError::NoSelection));
        assert!(!s.can_undo());
        assert_eq!(s.buffer().len(), 2);
    }

    #[test]
    fn empty_buffer_rejected_before_history() {
        let mut s = session(&[]);
        assert_eq!(s.apply_filter(0), Err(EditError::EmptyBuffer));
        assert_eq!(s.pitch_shift(3.0), Err(EditError::EmptyBuffer));
        assert_eq!(s.trim(-20.0), Err(EditError::EmptyBuffer));
        assert!(!s.can_undo());
    }

    #[test]
    fn unknown_filter_index_rejected() {
        let mut s = session(&[0.5; 64]);
        assert_eq!(s.apply_filter(7), Err(EditError::UnknownFilterKind(7)));
        assert!(!s.can_undo());
    }

    #[test]
    fn undo_sequence_restores_original_exactly() {
        let original: Vec<f32> = (0..128).map(|i| ((i as f32) * 0.21).sin() * 0.7).collect();
        let mut s = session(&original);

        s.trim(-20.0).expect("trim");
        s.pitch_shift(5.0).expect("pitch");
        s.drag_select(10.0, 90.0);
        s.crop_to_selection().expect("crop");
        assert_eq!(s.history_depth(), 3);

        assert!(s.undo());
        assert!(s.undo());
        assert!(s.undo());
        assert_eq!(s.buffer().samples(), original.as_slice());

        // and redo marches back to the final state
        let _ = s.drain_events();
        assert!(s.redo());
        assert!(s.redo());
        assert!(s.redo());
        assert_eq!(s.buffer().len(), 80);
        assert!(!s.redo());
    }

    #[test]
    fn fresh_edit_clears_redo_branch() {
        let mut s = session(&[0.5; 100]);
        s.trim(-10.0).expect("trim");
        s.undo();
        assert!(s.can_redo());
        s.pitch_shift(1.0).expect("pitch");
        assert!(!s.can_redo());
    }

    #[test]
    fn zoom_round_trip_is_undoable() {
        let mut s = session(&[0.1; 200]);
        s.drag_select(10.0, 50.0);
        s.zoom_into_selection().expect("zoom in");
        assert_eq!(s.viewport().view(), (10.0, 50.0));
        assert_eq!(s.selection(), None);

        s.zoom_out().expect("zoom out");
        assert_eq!(s.viewport().view(), (0.0, 200.0));

        assert!(s.undo());
        assert_eq!(s.viewport().view(), (10.0, 50.0));
        assert!(s.undo());
        assert_eq!(s.viewport().view(), (0.0, 200.0));
    }

    #[test]
    fn silent_trim_pushes_no_history() {
        let mut s = session(&[0.0; 32]);
        assert_eq!(s.trim(-20.0), Ok(TrimReport::SilentBuffer));
        assert!(!s.can_undo());
        assert!(!s.is_dirty());
    }

    #[test]
    fn selection_drives_playback_source() {
        let mut s = session(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]);
        let (full, frame) = s.playback_source();
        assert_eq!(full.len(), 10);
        assert_eq!(frame, 0);

        s.drag_select(2.0, 6.0);
        let (seg, frame) = s.playback_source();
        assert_eq!(seg, vec![0.3, 0.4, 0.5, 0.6]);
        assert_eq!(frame, 2);
        assert_eq!(s.viewport().position(), 2);

        s.click_primary(8.0);
        let (full, frame) = s.playback_source();
        assert_eq!(full.len(), 10);
        assert_eq!(frame, 0);
    }

    #[test]
    fn events_emitted_for_edits() {
        let mut s = session(&[0.5; 16]);
        let _ = s.drain_events();
        s.trim(0.0).expect("trim");
        let events = s.drain_events();
        assert!(events.contains(&EditorEvent::BufferReplaced));
        assert!(events.contains(&EditorEvent::PlaybackSourceChanged));
        assert!(events
            .iter()
            .any(|e| matches!(e, EditorEvent::Status(_))));
    }

    #[test]
    fn reset_to_origin_jumps_past_intermediate_states() {
        let original = vec![0.2, 0.4, 0.6, 0.8];
        let mut s = session(&original);
        s.drag_select(0.0, 2.9);
        s.crop_to_selection().expect("crop");
        s.pitch_shift(2.0).expect("pitch");
        assert!(s.reset_to_origin());
        assert_eq!(s.buffer().samples(), original.as_slice());
    }
}

use crate::buffer::AudioBuffer;

/// Full owned copy of the editable state at one point in time. Snapshots
/// never alias the live buffer, so undo entries cannot be corrupted by later
/// edits.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub buffer: AudioBuffer,
    pub view: (f32, f32),
}

impl Snapshot {
    pub fn capture(buffer: &AudioBuffer, view: (f32, f32)) -> Self {
        Self {
            buffer: buffer.clone(),
            view,
        }
    }
}

/// Bounded-depth undo/redo stack pair.
///
/// Every mutating operation pushes the pre-edit state; a push clears the redo
/// stack. When the depth cap is hit the oldest entry is evicted silently, but
/// the very first snapshot is retained separately so `reset_to_origin` always
/// has the original state to jump back to.
#[derive(Debug, Default)]
pub struct HistoryStack {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    origin: Option<Snapshot>,
    max_depth: usize,
}

pub const DEFAULT_MAX_DEPTH: usize = 100;

impl HistoryStack {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            origin: None,
            max_depth: max_depth.max(1),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.undo.len()
    }

    /// Records the pre-edit state. Any redo branch is invalidated.
    pub fn push(&mut self, buffer: &AudioBuffer, view: (f32, f32)) {
        let snap = Snapshot::capture(buffer, view);
        if self.origin.is_none() {
            self.origin = Some(snap.clone());
        }
        self.undo.push(snap);
        if self.undo.len() > self.max_depth {
            self.undo.remove(0);
        }
        self.redo.clear();
    }

    /// Pops the most recent snapshot, capturing the caller's current state
    /// onto the redo stack. Returns `None` (a reported no-op, not an error)
    /// when there is nothing to undo.
    pub fn undo(&mut self, current: &AudioBuffer, current_view: (f32, f32)) -> Option<Snapshot> {
        let snap = self.undo.pop()?;
        self.redo.push(Snapshot::capture(current, current_view));
        Some(snap)
    }

    /// Symmetric to `undo`.
    pub fn redo(&mut self, current: &AudioBuffer, current_view: (f32, f32)) -> Option<Snapshot> {
        let snap = self.redo.pop()?;
        self.undo.push(Snapshot::capture(current, current_view));
        Some(snap)
    }

    /// Direct jump to the first-ever captured state, bypassing the LIFO
    /// discipline. Used by the "reset plot" action.
    pub fn reset_to_origin(&self) -> Option<Snapshot> {
        self.origin.clone()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.origin = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(vals: &[f32]) -> AudioBuffer {
        AudioBuffer::new(vals.to_vec(), 1000)
    }

    #[test]
    fn undo_returns_pushed_state_and_arms_redo() {
        let mut hist = HistoryStack::new();
        let original = buf(&[0.1, 0.2]);
        let edited = buf(&[0.9]);
        hist.push(&original, (0.0, 2.0));

        let snap = hist.undo(&edited, (0.0, 1.0)).expect("undo");
        assert_eq!(snap.buffer, original);
        assert_eq!(snap.view, (0.0, 2.0));
        assert!(hist.can_redo());

        let redone = hist.redo(&original, (0.0, 2.0)).expect("redo");
        assert_eq!(redone.buffer, edited);
        assert_eq!(redone.view, (0.0, 1.0));
    }

    #[test]
    fn underflow_is_reported_noop() {
        let mut hist = HistoryStack::new();
        assert!(hist.undo(&buf(&[0.0]), (0.0, 1.0)).is_none());
        assert!(hist.redo(&buf(&[0.0]), (0.0, 1.0)).is_none());
    }

    #[test]
    fn push_clears_redo() {
        let mut hist = HistoryStack::new();
        let a = buf(&[0.1]);
        let b = buf(&[0.2]);
        hist.push(&a, (0.0, 1.0));
        hist.undo(&b, (0.0, 1.0));
        assert!(hist.can_redo());
        hist.push(&a, (0.0, 1.0));
        assert!(!hist.can_redo());
    }

    #[test]
    fn depth_cap_evicts_oldest_but_keeps_origin() {
        let mut hist = HistoryStack::with_max_depth(2);
        let first = buf(&[0.1]);
        hist.push(&first, (0.0, 1.0));
        hist.push(&buf(&[0.2]), (0.0, 1.0));
        hist.push(&buf(&[0.3]), (0.0, 1.0));
        assert_eq!(hist.depth(), 2);
        assert_eq!(hist.reset_to_origin().expect("origin").buffer, first);
    }

    #[test]
    fn snapshots_are_independent_copies() {
        let mut hist = HistoryStack::new();
        let mut live = buf(&[0.5, 0.5]);
        hist.push(&live, (0.0, 2.0));
        live = live.with_samples(vec![-1.0]);
        let snap = hist.undo(&live, (0.0, 1.0)).expect("undo");
        assert_eq!(snap.buffer.samples(), &[0.5, 0.5]);
    }
}

/// Where a secondary click landed relative to the active selection. The
/// context menu offers the crop/zoom-in entries only for `InsideSelection`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickContext {
    InsideSelection,
    Outside,
}

/// Outcome of a drag gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionChange {
    Set(usize, usize),
    Cleared,
    Unchanged,
}

/// Contiguous sample-index range over the current buffer.
///
/// The range is always valid against the buffer length it was set with:
/// `0 <= start < end <= len`. A drag narrower than one display unit is
/// treated as "clear", not as a micro-selection.
#[derive(Clone, Debug, Default)]
pub struct SelectionModel {
    range: Option<(usize, usize)>,
}

const MIN_DRAG_WIDTH: f32 = 1.0;

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(&self) -> Option<(usize, usize)> {
        self.range
    }

    pub fn is_active(&self) -> bool {
        self.range.is_some()
    }

    /// Sets the selection from a drag in display space (fractional sample
    /// indices). Swaps reversed endpoints and clamps to `[0, len]`.
    pub fn set_from_drag(&mut self, x0: f32, x1: f32, len: usize) -> SelectionChange {
        let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        if hi - lo <= MIN_DRAG_WIDTH {
            return self.clear();
        }
        let start = lo.max(0.0) as usize;
        let end = (hi.max(0.0) as usize).min(len);
        let start = start.min(end);
        if end - start <= MIN_DRAG_WIDTH as usize {
            return self.clear();
        }
        self.range = Some((start, end));
        SelectionChange::Set(start, end)
    }

    pub fn clear(&mut self) -> SelectionChange {
        if self.range.take().is_some() {
            SelectionChange::Cleared
        } else {
            SelectionChange::Unchanged
        }
    }

    /// Primary-button click: clicking outside the active range clears it.
    pub fn click_primary(&mut self, x: f32) -> SelectionChange {
        match self.range {
            Some((s, e)) if x < s as f32 || x > e as f32 => self.clear(),
            _ => SelectionChange::Unchanged,
        }
    }

    /// Secondary-button click: reports whether the click fell inside the
    /// selection so the caller can condition its context actions.
    pub fn click_context(&self, x: f32) -> ClickContext {
        match self.range {
            Some((s, e)) if x >= s as f32 && x <= e as f32 => ClickContext::InsideSelection,
            _ => ClickContext::Outside,
        }
    }

    /// Re-validates the range after the buffer was replaced. A range that no
    /// longer fits the new length is dropped entirely.
    pub fn clamp_to(&mut self, len: usize) -> SelectionChange {
        if let Some((s, e)) = self.range {
            if s >= len || e > len {
                return self.clear();
            }
        }
        SelectionChange::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_swaps_and_clamps() {
        let mut sel = SelectionModel::new();
        assert_eq!(sel.set_from_drag(80.0, 10.0, 50), SelectionChange::Set(10, 50));
        assert_eq!(sel.range(), Some((10, 50)));
    }

    #[test]
    fn zero_width_drag_clears() {
        let mut sel = SelectionModel::new();
        sel.set_from_drag(2.0, 40.0, 100);
        assert_eq!(sel.set_from_drag(5.0, 5.0, 100), SelectionChange::Cleared);
        assert!(!sel.is_active());
    }

    #[test]
    fn narrow_drag_is_no_selection() {
        let mut sel = SelectionModel::new();
        assert_eq!(sel.set_from_drag(5.0, 5.9, 100), SelectionChange::Unchanged);
        assert!(!sel.is_active());
    }

    #[test]
    fn primary_click_outside_clears() {
        let mut sel = SelectionModel::new();
        sel.set_from_drag(10.0, 30.0, 100);
        assert_eq!(sel.click_primary(20.0), SelectionChange::Unchanged);
        assert!(sel.is_active());
        assert_eq!(sel.click_primary(50.0), SelectionChange::Cleared);
        assert!(!sel.is_active());
    }

    #[test]
    fn context_click_reports_region() {
        let mut sel = SelectionModel::new();
        sel.set_from_drag(10.0, 30.0, 100);
        assert_eq!(sel.click_context(15.0), ClickContext::InsideSelection);
        assert_eq!(sel.click_context(45.0), ClickContext::Outside);
        sel.clear();
        assert_eq!(sel.click_context(15.0), ClickContext::Outside);
    }

    #[test]
    fn clamp_after_crop_drops_stale_range() {
        let mut sel = SelectionModel::new();
        sel.set_from_drag(40.0, 90.0, 100);
        assert_eq!(sel.clamp_to(50), SelectionChange::Cleared);
    }
}

use egui::Color32;

/// Oldest snapshots are evicted past this bound so a long session cannot
/// accumulate full-frame buffers without limit.
pub const MAX_HISTORY_SNAPSHOTS: usize = 50;

/// An immutable full-frame capture of the drawing surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    width: usize,
    height: usize,
    pixels: Vec<Color32>,
}

impl Snapshot {
    /// `pixels` must hold exactly `width * height` entries in row-major order.
    pub fn new(width: usize, height: usize, pixels: Vec<Color32>) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Color32] {
        &self.pixels
    }
}

/// Linear undo/redo history over full-frame snapshots.
///
/// The cursor marks the snapshot currently on screen; `None` means nothing has
/// been committed yet. Undo and redo clamp at the ends instead of failing, and
/// a commit after an undo discards the snapshots past the cursor.
pub struct History {
    snapshots: Vec<Snapshot>,
    cursor: Option<usize>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(MAX_HISTORY_SNAPSHOTS)
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            snapshots: Vec::new(),
            cursor: None,
            capacity,
        }
    }

    /// Append a freshly captured frame, truncating any redo branch first.
    pub fn commit(&mut self, frame: Snapshot) {
        match self.cursor {
            Some(cursor) => self.snapshots.truncate(cursor + 1),
            None => self.snapshots.clear(),
        }
        self.snapshots.push(frame);
        if self.snapshots.len() > self.capacity {
            self.snapshots.remove(0);
        }
        self.cursor = Some(self.snapshots.len() - 1);
        log::debug!(
            "committed snapshot {}/{}",
            self.snapshots.len(),
            self.capacity
        );
    }

    /// Step back one snapshot and return it for rendering. No-op at the first
    /// snapshot: the oldest committed frame is the floor of the session.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        match self.cursor {
            Some(cursor) if cursor > 0 => {
                self.cursor = Some(cursor - 1);
                Some(&self.snapshots[cursor - 1])
            }
            _ => None,
        }
    }

    /// Step forward one snapshot and return it for rendering. No-op at the
    /// newest snapshot.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.snapshots.len() => {
                self.cursor = Some(cursor + 1);
                Some(&self.snapshots[cursor + 1])
            }
            _ => None,
        }
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor + 1 < self.snapshots.len())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(shade: u8) -> Snapshot {
        Snapshot::new(2, 2, vec![Color32::from_gray(shade); 4])
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut history = History::default();
        history.commit(frame(1));
        history.commit(frame(2));
        history.commit(frame(3));

        assert_eq!(history.undo().unwrap(), &frame(2));
        assert_eq!(history.undo().unwrap(), &frame(1));
        assert!(history.undo().is_none());

        assert_eq!(history.redo().unwrap(), &frame(2));
        assert_eq!(history.redo().unwrap(), &frame(3));
        assert!(history.redo().is_none());
    }

    #[test]
    fn commit_after_undo_discards_redo_branch() {
        let mut history = History::default();
        history.commit(frame(1));
        history.commit(frame(2));
        history.commit(frame(3));

        history.undo();
        history.undo();
        history.commit(frame(4));

        assert_eq!(history.len(), 2);
        assert!(history.redo().is_none());
        assert_eq!(history.undo().unwrap(), &frame(1));
    }

    #[test]
    fn boundary_operations_are_no_ops() {
        let mut history = History::default();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert!(history.is_empty());

        history.commit(frame(1));
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn oldest_snapshot_is_evicted_at_capacity() {
        let mut history = History::with_capacity(3);
        for shade in 1..=5 {
            history.commit(frame(shade));
        }

        assert_eq!(history.len(), 3);
        assert!(!history.can_redo());
        assert_eq!(history.undo().unwrap(), &frame(4));
        assert_eq!(history.undo().unwrap(), &frame(3));
        assert!(history.undo().is_none());
    }
}

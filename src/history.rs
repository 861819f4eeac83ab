//! Operation history — the append-only log behind undo/redo and macros.
//!
//! The `applied` sequence is the single source of truth: the current image
//! is always reproducible by replaying it over the original.  Undo moves
//! the newest entry onto the `undone` tail; applying a genuinely new
//! operation destroys that tail (redo lineage is linear).
//!
//! Macro recording is an independent observer of the same log: a cursor
//! remembering where recording started.  The macro body is whatever tail of
//! `applied` sits above the cursor at stop time, so undoing during a
//! recording shrinks the macro naturally instead of desyncing it.

use crate::operation::Operation;

/// Ordered history of applied operations plus the undone tail and an
/// optional macro-recording cursor.
#[derive(Debug, Default)]
pub struct History {
    /// Oldest → newest applied operations.
    applied: Vec<Operation>,
    /// Undone operations, most recently undone last (stack order).
    undone: Vec<Operation>,
    /// `applied.len()` at the moment recording started.
    record_mark: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already-loaded operation list (sidecar ops file).
    pub fn from_ops(applied: Vec<Operation>) -> Self {
        Self { applied, undone: Vec::new(), record_mark: None }
    }

    /// Record a newly applied operation.  Clears the redo tail.
    pub fn push(&mut self, op: Operation) {
        self.undone.clear();
        self.applied.push(op);
    }

    /// Move the newest applied operation onto the undone tail.
    /// Returns the undone operation, or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<&Operation> {
        let op = self.applied.pop()?;
        self.undone.push(op);
        self.undone.last()
    }

    /// Move the most recently undone operation back onto the applied log.
    /// Only the one redone entry is consumed; the rest of the redo tail
    /// stays available for further redos.
    pub fn redo(&mut self) -> Option<&Operation> {
        let op = self.undone.pop()?;
        self.applied.push(op);
        self.applied.last()
    }

    /// The applied log, oldest first.  Replaying this over the original
    /// reproduces the current image.
    pub fn applied(&self) -> &[Operation] {
        &self.applied
    }

    pub fn can_undo(&self) -> bool {
        !self.applied.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    pub fn undone_count(&self) -> usize {
        self.undone.len()
    }

    /// Forget everything, including any recording in progress.
    pub fn clear(&mut self) {
        self.applied.clear();
        self.undone.clear();
        self.record_mark = None;
    }

    // ------------------------------------------------------------------
    // Macro recording
    // ------------------------------------------------------------------

    pub fn is_recording(&self) -> bool {
        self.record_mark.is_some()
    }

    /// Begin recording.  A recording already in progress is restarted from
    /// the current position.
    pub fn start_recording(&mut self) {
        self.record_mark = Some(self.applied.len());
    }

    /// Stop recording and return the recorded tail (possibly empty — the
    /// caller reports "nothing to save").  Returns `None` when no recording
    /// was active.
    pub fn stop_recording(&mut self) -> Option<Vec<Operation>> {
        let mark = self.record_mark.take()?;
        // Undos during recording may have shrunk the log below the mark.
        let start = mark.min(self.applied.len());
        Some(self.applied[start..].to_vec())
    }

    /// The tail recorded so far, without stopping.
    pub fn recorded(&self) -> &[Operation] {
        match self.record_mark {
            Some(mark) => &self.applied[mark.min(self.applied.len())..],
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blur(radius: u32) -> Operation {
        Operation::GaussianBlur { radius }
    }

    #[test]
    fn undo_then_redo_restores_the_log() {
        let mut h = History::new();
        h.push(blur(1));
        h.push(blur(2));
        assert_eq!(h.applied_count(), 2);

        h.undo().expect("undo");
        assert_eq!(h.applied(), &[blur(1)]);
        assert!(h.can_redo());

        h.redo().expect("redo");
        assert_eq!(h.applied(), &[blur(1), blur(2)]);
        assert!(!h.can_redo());
    }

    #[test]
    fn multiple_undos_redo_in_order() {
        let mut h = History::new();
        for r in 1..=3 {
            h.push(blur(r));
        }
        h.undo();
        h.undo();
        assert_eq!(h.applied(), &[blur(1)]);

        h.redo();
        assert_eq!(h.applied(), &[blur(1), blur(2)]);
        h.redo();
        assert_eq!(h.applied(), &[blur(1), blur(2), blur(3)]);
    }

    #[test]
    fn new_operation_destroys_redo_lineage() {
        let mut h = History::new();
        h.push(blur(1));
        h.push(blur(2));
        h.undo();
        h.push(blur(9));
        assert!(!h.can_redo());
        assert_eq!(h.applied(), &[blur(1), blur(9)]);
    }

    #[test]
    fn undo_on_empty_log_reports_nothing() {
        let mut h = History::new();
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
    }

    #[test]
    fn recording_captures_the_applied_tail() {
        let mut h = History::new();
        h.push(blur(1));
        h.start_recording();
        h.push(blur(2));
        h.push(blur(3));
        let rec = h.stop_recording().expect("was recording");
        assert_eq!(rec, vec![blur(2), blur(3)]);
        assert!(!h.is_recording());
    }

    #[test]
    fn undo_during_recording_shrinks_the_macro() {
        let mut h = History::new();
        h.start_recording();
        h.push(blur(1));
        h.push(blur(2));
        h.undo();
        assert_eq!(h.recorded(), &[blur(1)]);
        let rec = h.stop_recording().expect("was recording");
        assert_eq!(rec, vec![blur(1)]);
    }

    #[test]
    fn undo_past_the_record_mark_yields_empty_macro() {
        let mut h = History::new();
        h.push(blur(1));
        h.start_recording();
        h.undo();
        let rec = h.stop_recording().expect("was recording");
        assert!(rec.is_empty());
    }

    #[test]
    fn stop_without_start_reports_none() {
        let mut h = History::new();
        assert!(h.stop_recording().is_none());
    }
}

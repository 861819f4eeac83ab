//! The editable image — original pixels, derived current pixels, history.
//!
//! "Non-destructive" means the original buffer is never written after load:
//! `current` is always the result of replaying the applied operation log
//! over a fresh copy of `original`.  Undo therefore never inverts an
//! operation — crop, resize and block averaging have no inverses — it drops
//! the newest log entry and replays the rest.

use image::RgbaImage;

use crate::history::History;
use crate::operation::Operation;
use crate::{log_info, log_warn};

/// An image with a replayable set of operations applied to it.
#[derive(Debug)]
pub struct EditableImage {
    /// The loaded pixels.  Never mutated.
    original: RgbaImage,
    /// `original` with the applied log replayed over it.
    current: RgbaImage,
    history: History,
    /// True when the applied log has changed since load/save.
    dirty: bool,
}

impl EditableImage {
    /// Wrap a freshly decoded buffer with an empty history.
    pub fn new(original: RgbaImage) -> Self {
        let current = original.clone();
        Self { original, current, history: History::new(), dirty: false }
    }

    /// Wrap a decoded buffer and replay a previously saved operation log
    /// (the sidecar `.ops` file) to reconstruct the session.
    pub fn with_ops(original: RgbaImage, ops: Vec<Operation>) -> Self {
        let mut image = Self {
            original,
            current: RgbaImage::new(0, 0),
            history: History::from_ops(ops),
            dirty: false,
        };
        image.refresh();
        image
    }

    /// The image as loaded, untouched by any operation.
    pub fn original(&self) -> &RgbaImage {
        &self.original
    }

    /// The image with all applied operations replayed.
    pub fn current(&self) -> &RgbaImage {
        &self.current
    }

    pub fn width(&self) -> u32 {
        self.current.width()
    }

    pub fn height(&self) -> u32 {
        self.current.height()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the in-memory state as persisted (after a successful save).
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The applied log, oldest first — what gets written to an ops file.
    pub fn applied_ops(&self) -> &[Operation] {
        self.history.applied()
    }

    /// Apply an operation: transform `current`, append to the log, destroy
    /// the redo tail.
    pub fn apply(&mut self, op: Operation) {
        let current = std::mem::replace(&mut self.current, RgbaImage::new(0, 0));
        self.current = op.apply(current);
        log_info!("apply: {}", op.describe());
        self.history.push(op);
        self.dirty = true;
    }

    /// Undo the newest operation by replaying the remaining log over a
    /// fresh copy of the original.  Returns false when the log is empty
    /// ("nothing to undo" — reported, not an error).
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(op) => {
                log_info!("undo: {}", op.describe());
                self.refresh();
                self.dirty = true;
                true
            }
            None => {
                log_info!("undo requested with empty history — nothing to undo");
                false
            }
        }
    }

    /// Re-apply the most recently undone operation.  Returns false when
    /// there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        // Route the redone op through the same transform path as apply;
        // History::redo consumes exactly the one undone entry, so chained
        // redos keep working.
        match self.history.redo() {
            Some(op) => {
                let op = op.clone();
                let current = std::mem::replace(&mut self.current, RgbaImage::new(0, 0));
                self.current = op.apply(current);
                log_info!("redo: {}", op.describe());
                self.dirty = true;
                true
            }
            None => {
                log_info!("redo requested with empty redo tail — nothing to redo");
                false
            }
        }
    }

    /// Recompute `current` from scratch: fresh copy of the original, then
    /// the whole applied log in order.
    pub fn refresh(&mut self) {
        let mut current = self.original.clone();
        for op in self.history.applied() {
            current = op.apply(current);
        }
        self.current = current;
    }

    /// Replay a sequence of operations (a macro) through the normal apply
    /// path, so each becomes part of this image's own history.
    pub fn replay(&mut self, ops: &[Operation]) {
        for op in ops {
            self.apply(op.clone());
        }
    }

    // ------------------------------------------------------------------
    // Macro recording (delegates to the history's cursor)
    // ------------------------------------------------------------------

    pub fn is_recording(&self) -> bool {
        self.history.is_recording()
    }

    pub fn start_recording(&mut self) {
        log_info!("macro recording started");
        self.history.start_recording();
    }

    /// Stop recording.  `None` when no recording was active; an empty
    /// vector when recording captured nothing ("nothing to save").
    pub fn stop_recording(&mut self) -> Option<Vec<Operation>> {
        let recorded = self.history.stop_recording();
        if let Some(ops) = &recorded {
            log_info!("macro recording stopped with {} op(s)", ops.len());
        }
        recorded
    }
}

/// A single editing session: the state machine over "no image yet" and "image
/// loaded".  Operations requested with no image are reported invalid-state
/// no-ops, never panics.
#[derive(Debug, Default)]
pub struct Editor {
    image: Option<EditableImage>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Load a decoded buffer, replacing any previous image and history.
    pub fn load(&mut self, original: RgbaImage, ops: Vec<Operation>) {
        self.image = Some(if ops.is_empty() {
            EditableImage::new(original)
        } else {
            EditableImage::with_ops(original, ops)
        });
    }

    pub fn image(&self) -> Option<&EditableImage> {
        self.image.as_ref()
    }

    pub fn image_mut(&mut self) -> Option<&mut EditableImage> {
        self.image.as_mut()
    }

    /// Apply an operation to the loaded image; invalid-state no-op otherwise.
    pub fn apply(&mut self, op: Operation) -> bool {
        match &mut self.image {
            Some(image) => {
                image.apply(op);
                true
            }
            None => {
                log_warn!("operation requested with no image loaded");
                false
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        match &mut self.image {
            Some(image) => image.undo(),
            None => {
                log_warn!("undo requested with no image loaded");
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        match &mut self.image {
            Some(image) => image.redo(),
            None => {
                log_warn!("redo requested with no image loaded");
                false
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.image.as_ref().is_some_and(|i| i.is_dirty())
    }

    /// The current buffer, if an image is loaded.
    pub fn current(&self) -> Option<&RgbaImage> {
        self.image.as_ref().map(|i| i.current())
    }

    /// Export the current image, format inferred from the path's extension.
    /// Invalid-state (no image) and encoder failures are reported as errors,
    /// never panics.
    pub fn export(&self, path: &std::path::Path) -> Result<(), String> {
        let image = self.image.as_ref().ok_or_else(|| {
            log_warn!("export requested with no image loaded");
            "no image loaded".to_string()
        })?;
        crate::io::export_image(image.current(), path, 90)
            .map_err(|e| format!("export failed: {}", e))
    }
}

// ============================================================================
// pentimento — non-destructive raster image editing
// ============================================================================
//
// The original pixels are never mutated: every edit is an immutable
// `Operation` value appended to a replayable log, and the visible image is
// always reproducible by replaying that log over a fresh copy of the
// original.  Undo/redo and macro record/replay fall out of the same log.
//
// Module map:
//   kernel.rs    — convolution weight matrices
//   convolve.rs  — the edge-clamped, alpha-aware convolution engine
//   ops/         — the filter catalog (kernel filters, spatial, colour,
//                  geometric, shapes)
//   operation.rs — the closed Operation enum + dispatch
//   history.rs   — applied log, undone tail, macro cursor
//   editable.rs  — EditableImage / Editor façades
//   io.rs        — image codecs and .ops log persistence
//   cli.rs       — headless batch front-end
//   logger.rs    — session log + log_* macros
// ============================================================================

pub mod cli;
pub mod convolve;
pub mod editable;
pub mod history;
pub mod io;
pub mod kernel;
pub mod logger;
pub mod operation;
pub mod ops;

pub use editable::{EditableImage, Editor};
pub use history::History;
pub use kernel::Kernel;
pub use operation::Operation;

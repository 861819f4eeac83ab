// ============================================================================
// OPS MODULE — the filter catalog behind Operation::apply
// ============================================================================
//
//   filters.rs   — kernel-based filters over the convolution engine
//   spatial.rs   — median, block averaging, random scattering
//   color.rs     — pointwise colour adjustments
//   transform.rs — rotate, flip, crop, resize
//   shapes.rs    — shape drawing and clipping
// ============================================================================

pub mod color;
pub mod filters;
pub mod shapes;
pub mod spatial;
pub mod transform;

//! Cache invalidation for derived network indices.

/// Anything that caches derived topology (node incidence, per-branch
/// feature order, …) implements this. Every structural mutation calls it
/// before returning.
pub trait InvalidateCache {
    /// Invalidate *all* internal caches so future queries recompute correctly.
    fn invalidate_cache(&mut self);
}

//! Draw Dispatch Point
//!
//! Render code sits outside this crate, but the seam it plugs into is
//! defined here: a drawable is anything that can bind root parameters and
//! issue a draw. Variants differ in root-parameter layout, not in
//! hierarchy. This is the single dispatch point.

use crate::backend::{CommandRecorder, GpuAddress};

/// The constant-buffer addresses one draw binds as root parameters,
/// resolved against the current frame slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawBindings {
    /// Pass-global constants (camera, timers, lights).
    pub pass: GpuAddress,
    /// This draw's object transform.
    pub object: GpuAddress,
    /// This draw's material.
    pub material: GpuAddress,
}

/// Anything that can bind root parameters and issue a draw.
pub trait Drawable<R: CommandRecorder> {
    /// Records the draw into `recorder`, binding `bindings` as shader
    /// inputs.
    fn record(&self, recorder: &mut R, bindings: &DrawBindings);
}

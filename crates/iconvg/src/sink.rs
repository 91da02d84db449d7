//! The destination for decoded drawing actions.

use crate::types::{Metadata, Point};

/// Handles the actions decoded from an IconVG graphic's byte code.
///
/// When passed to [`decode`](crate::decode()), the first method called (if
/// any) is [`reset`](Sink::reset). No methods are called at all if an
/// error is encountered in the encoded form before the metadata is fully
/// decoded.
///
/// # Path Model
///
/// Path segments are issued in byte-code order. The decoder tracks a
/// current point; segment endpoints become the new current point, and
/// [`close_path_move_to`](Sink::close_path_move_to) relocates it. Jumped-over
/// regions of the byte code are parsed but produce no calls.
pub trait Sink {
    /// Called once, after the metadata is decoded and before any drawing
    /// action.
    fn reset(&mut self, metadata: &Metadata);

    /// Whether the sink's target height-in-pixels `h` satisfies
    /// `lod0 <= h && h < lod1`.
    fn query_level_of_detail(&self, lod0: f32, lod1: f32) -> bool;

    /// Close the current subpath and start a new one at `to`.
    fn close_path_move_to(&mut self, to: Point);

    /// Line to a point.
    fn line_to(&mut self, to: Point);

    /// Quadratic Bézier curve.
    fn quad_to(&mut self, ctrl: Point, to: Point);

    /// Cubic Bézier curve.
    fn cube_to(&mut self, c1: Point, c2: Point, to: Point);

    /// `n_quarters` quarter-ellipse arcs from the current point `curr`
    /// through `p1` (and, for full halves, `p2`).
    fn ellipse(&mut self, n_quarters: u32, p1: Point, p2: Point, curr: Point);

    /// A parallelogram with vertices at `curr`, `p1`, `p2` and the implied
    /// fourth corner.
    fn parallelogram(&mut self, p1: Point, p2: Point, curr: Point);

    /// Close the current subpath and fill it with the current style.
    fn close_path_fill(&mut self);
}

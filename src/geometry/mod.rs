//! Geometry for branch lines.
//!
//! The network core only needs a handful of linear-referencing operations
//! on a branch's line. [`LineGeometry`] names them; [`LineString`] is the
//! planar polyline implementation the rest of the crate uses.

pub mod line;

pub use line::{Coordinate, LineGeometry, LineString};

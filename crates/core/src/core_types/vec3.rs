//! Vector type alias for grid positions.

use nalgebra::Vector3;

/// 3D position in grid units (x, y, z), e.g. bounding box corners.
pub type Vec3 = Vector3<f64>;

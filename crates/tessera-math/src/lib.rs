//! Vector and shape math for the Tessera simulation core: f64 axis-aligned
//! boxes with single-axis clipping, block coordinates, axes and directions.

mod aabb;
mod axis;
mod block_pos;
mod vector;

pub use aabb::{Aabb, COLLISION_EPSILON, collide_axis};
pub use axis::{Axis, Direction};
pub use block_pos::BlockPos;
pub use glam::DVec3;
pub use vector::{VecExt, view_vector, wrap_degrees};

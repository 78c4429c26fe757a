//! The square world border: a horizontal boundary entities collide with
//! from the inside.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tessera_math::{Aabb, Axis, BlockPos};

/// Largest coordinate the border may reach on either side.
pub const MAX_COORDINATE: f64 = 29_999_984.0;

/// Vertical and outer extent of the slabs returned by [`WorldBorder::collision_shapes`].
const FAR: f64 = 3.0e7;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldBorder {
    pub center_x: f64,
    pub center_z: f64,
    /// Edge length of the square.
    pub size: f64,
}

impl WorldBorder {
    pub fn new(center_x: f64, center_z: f64, size: f64) -> Self {
        Self {
            center_x,
            center_z,
            size: size.clamp(1.0, MAX_COORDINATE * 2.0),
        }
    }

    pub fn min_x(&self) -> f64 {
        (self.center_x - self.size / 2.0).max(-MAX_COORDINATE)
    }

    pub fn max_x(&self) -> f64 {
        (self.center_x + self.size / 2.0).min(MAX_COORDINATE)
    }

    pub fn min_z(&self) -> f64 {
        (self.center_z - self.size / 2.0).max(-MAX_COORDINATE)
    }

    pub fn max_z(&self) -> f64 {
        (self.center_z + self.size / 2.0).min(MAX_COORDINATE)
    }

    /// `(x, z)` lies strictly inside the border grown by `margin`.
    pub fn is_within_bounds(&self, x: f64, z: f64, margin: f64) -> bool {
        x > self.min_x() - margin
            && x < self.max_x() + margin
            && z > self.min_z() - margin
            && z < self.max_z() + margin
    }

    pub fn contains_block(&self, pos: BlockPos) -> bool {
        let (x, z) = (pos.x as f64, pos.z as f64);
        x + 1.0 > self.min_x() && x < self.max_x() && z + 1.0 > self.min_z() && z < self.max_z()
    }

    /// Distance to the nearest edge; negative outside.
    pub fn distance_to_border(&self, x: f64, z: f64) -> f64 {
        let dz = (z - self.min_z()).min(self.max_z() - z);
        let dx = (x - self.min_x()).min(self.max_x() - x);
        dx.min(dz)
    }

    /// The border only collides with boxes that are inside and near it.
    pub fn is_inside_close_to_border(&self, position: DVec3, bounds: &Aabb) -> bool {
        let reach = bounds.size_on(Axis::X).max(bounds.size_on(Axis::Z)).max(1.0);
        self.distance_to_border(position.x, position.z) < reach * 2.0
            && self.is_within_bounds(position.x, position.z, reach)
    }

    /// Four slabs covering everything outside the border.
    pub fn collision_shapes(&self) -> [Aabb; 4] {
        let (min_x, max_x, min_z, max_z) = (self.min_x(), self.max_x(), self.min_z(), self.max_z());
        [
            Aabb::new(DVec3::new(-FAR, -FAR, -FAR), DVec3::new(min_x, FAR, FAR)),
            Aabb::new(DVec3::new(max_x, -FAR, -FAR), DVec3::new(FAR, FAR, FAR)),
            Aabb::new(DVec3::new(min_x, -FAR, -FAR), DVec3::new(max_x, FAR, min_z)),
            Aabb::new(DVec3::new(min_x, -FAR, max_z), DVec3::new(max_x, FAR, FAR)),
        ]
    }

    /// Nearest block position inside the border.
    pub fn clamp_to_bounds(&self, x: f64, y: f64, z: f64) -> BlockPos {
        BlockPos::new(
            x.clamp(self.min_x(), self.max_x() - 1.0).floor() as i32,
            y.floor() as i32,
            z.clamp(self.min_z(), self.max_z() - 1.0).floor() as i32,
        )
    }
}

impl Default for WorldBorder {
    fn default() -> Self {
        Self::new(0.0, 0.0, MAX_COORDINATE * 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_center_and_size() {
        let border = WorldBorder::new(10.0, -10.0, 20.0);
        assert_eq!(border.min_x(), 0.0);
        assert_eq!(border.max_x(), 20.0);
        assert_eq!(border.min_z(), -20.0);
        assert_eq!(border.max_z(), 0.0);
    }

    #[test]
    fn test_distance_negative_outside() {
        let border = WorldBorder::new(0.0, 0.0, 10.0);
        assert_eq!(border.distance_to_border(0.0, 0.0), 5.0);
        assert!(border.distance_to_border(7.0, 0.0) < 0.0);
    }

    #[test]
    fn test_close_to_border_only_near_edge() {
        let border = WorldBorder::new(0.0, 0.0, 20.0);
        let bounds = Aabb::from_feet(DVec3::ZERO, 0.6, 1.8);
        assert!(!border.is_inside_close_to_border(DVec3::ZERO, &bounds));
        let near = DVec3::new(9.0, 0.0, 0.0);
        assert!(border.is_inside_close_to_border(near, &bounds.translate(near)));
    }

    #[test]
    fn test_collision_shapes_touch_edges() {
        let border = WorldBorder::new(0.0, 0.0, 10.0);
        let shapes = border.collision_shapes();
        let inside = Aabb::from_feet(DVec3::ZERO, 1.0, 1.0);
        assert!(shapes.iter().all(|s| !s.intersects(&inside)));
        assert_eq!(shapes[1].min.x, 5.0);
    }

    #[test]
    fn test_clamp_to_bounds() {
        let border = WorldBorder::new(0.0, 0.0, 100.0);
        assert_eq!(border.clamp_to_bounds(500.0, 64.5, -500.0), BlockPos::new(49, 64, -50));
    }
}

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::{Axis, BlockPos};

/// Tolerance used by every collision comparison.
pub const COLLISION_EPSILON: f64 = 1.0e-7;

/// Axis-aligned bounding box in world space.
///
/// Invariant: `min <= max` on every axis. [`Aabb::new`] sorts the corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Create a box from two opposite corners in any order.
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box of `width` x `height` x `width` standing on `feet`.
    pub fn from_feet(feet: DVec3, width: f64, height: f64) -> Self {
        let half = width / 2.0;
        Self {
            min: DVec3::new(feet.x - half, feet.y, feet.z - half),
            max: DVec3::new(feet.x + half, feet.y + height, feet.z + half),
        }
    }

    /// Box of `size` centred on `center`.
    pub fn of_size(center: DVec3, sx: f64, sy: f64, sz: f64) -> Self {
        let half = DVec3::new(sx, sy, sz) / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// The full cube of one voxel cell.
    pub fn unit_block(pos: BlockPos) -> Self {
        let min = pos.as_dvec3();
        Self {
            min,
            max: min + DVec3::ONE,
        }
    }

    pub fn min_on(&self, axis: Axis) -> f64 {
        axis.choose(self.min)
    }

    pub fn max_on(&self, axis: Axis) -> f64 {
        axis.choose(self.max)
    }

    pub fn size_on(&self, axis: Axis) -> f64 {
        self.max_on(axis) - self.min_on(axis)
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// True if any extent is zero or negative.
    pub fn is_degenerate(&self) -> bool {
        let s = self.size();
        s.x <= 0.0 || s.y <= 0.0 || s.z <= 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Shifted copy.
    pub fn translate(&self, delta: DVec3) -> Aabb {
        Aabb {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Grow each face outward; negative values shrink. Never inverts the box.
    pub fn inflate(&self, dx: f64, dy: f64, dz: f64) -> Aabb {
        let d = DVec3::new(dx, dy, dz);
        let min = self.min - d;
        let max = self.max + d;
        Aabb {
            min: min.min((min + max) * 0.5),
            max: max.max((min + max) * 0.5),
        }
    }

    pub fn inflate_all(&self, d: f64) -> Aabb {
        self.inflate(d, d, d)
    }

    pub fn deflate(&self, d: f64) -> Aabb {
        self.inflate(-d, -d, -d)
    }

    /// Stretch the box along a motion so it covers the whole swept volume.
    pub fn expand_towards(&self, motion: DVec3) -> Aabb {
        let mut min = self.min;
        let mut max = self.max;
        if motion.x < 0.0 {
            min.x += motion.x;
        } else {
            max.x += motion.x;
        }
        if motion.y < 0.0 {
            min.y += motion.y;
        } else {
            max.y += motion.y;
        }
        if motion.z < 0.0 {
            min.z += motion.z;
        } else {
            max.z += motion.z;
        }
        Aabb { min, max }
    }

    /// Strict overlap test; touching faces do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Half-open containment: min faces inside, max faces outside.
    pub fn contains(&self, p: DVec3) -> bool {
        p.x >= self.min.x
            && p.x < self.max.x
            && p.y >= self.min.y
            && p.y < self.max.y
            && p.z >= self.min.z
            && p.z < self.max.z
    }

    /// Smallest box enclosing both.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Block cells touched by this box, floor(min) inclusive to ceil(max) exclusive.
    pub fn block_range(&self) -> (BlockPos, BlockPos) {
        (
            BlockPos::new(
                self.min.x.floor() as i32,
                self.min.y.floor() as i32,
                self.min.z.floor() as i32,
            ),
            BlockPos::new(
                self.max.x.ceil() as i32,
                self.max.y.ceil() as i32,
                self.max.z.ceil() as i32,
            ),
        )
    }

    /// Largest displacement along `axis`, no larger in magnitude than
    /// `desired`, that `self` can travel without entering `solid`.
    ///
    /// Only applies when the two boxes overlap on both perpendicular axes
    /// and `solid` lies ahead of `self` in the direction of travel.
    pub fn clip_against(&self, solid: &Aabb, axis: Axis, desired: f64) -> f64 {
        let (a, b) = axis.others();
        let overlaps = |ax: Axis| {
            self.max_on(ax) - COLLISION_EPSILON > solid.min_on(ax)
                && self.min_on(ax) + COLLISION_EPSILON < solid.max_on(ax)
        };
        if !overlaps(a) || !overlaps(b) {
            return desired;
        }
        if desired > 0.0 && solid.min_on(axis) >= self.max_on(axis) - COLLISION_EPSILON {
            desired.min(solid.min_on(axis) - self.max_on(axis))
        } else if desired < 0.0 && solid.max_on(axis) <= self.min_on(axis) + COLLISION_EPSILON {
            desired.max(solid.max_on(axis) - self.min_on(axis))
        } else {
            desired
        }
    }
}

/// Clip `desired` along `axis` against every shape in turn.
///
/// Results under [`COLLISION_EPSILON`] in magnitude collapse to zero.
pub fn collide_axis<'a>(
    axis: Axis,
    moving: &Aabb,
    shapes: impl IntoIterator<Item = &'a Aabb>,
    mut desired: f64,
) -> f64 {
    for shape in shapes {
        if desired.abs() < COLLISION_EPSILON {
            return 0.0;
        }
        desired = moving.clip_against(shape, axis, desired);
    }
    if desired.abs() < COLLISION_EPSILON {
        0.0
    } else {
        desired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(x: f64, y: f64, z: f64) -> Aabb {
        Aabb::new(DVec3::new(x, y, z), DVec3::new(x + 1.0, y + 1.0, z + 1.0))
    }

    #[test]
    fn test_new_sorts_corners() {
        let aabb = Aabb::new(DVec3::new(2.0, -1.0, 5.0), DVec3::new(0.0, 3.0, 1.0));
        assert_eq!(aabb.min, DVec3::new(0.0, -1.0, 1.0));
        assert_eq!(aabb.max, DVec3::new(2.0, 3.0, 5.0));
    }

    #[test]
    fn test_from_feet_dimensions() {
        let aabb = Aabb::from_feet(DVec3::new(0.5, 64.0, 0.5), 0.6, 1.8);
        assert!((aabb.size_on(Axis::X) - 0.6).abs() < 1e-12);
        assert!((aabb.size_on(Axis::Y) - 1.8).abs() < 1e-12);
        assert_eq!(aabb.min.y, 64.0);
    }

    #[test]
    fn test_touching_faces_do_not_intersect() {
        let a = cube(0.0, 0.0, 0.0);
        let b = cube(1.0, 0.0, 0.0);
        assert!(!a.intersects(&b));
        assert!(a.inflate_all(0.01).intersects(&b));
    }

    #[test]
    fn test_expand_towards_negative_motion() {
        let grown = cube(0.0, 0.0, 0.0).expand_towards(DVec3::new(-2.0, 0.5, 0.0));
        assert_eq!(grown.min.x, -2.0);
        assert_eq!(grown.max.y, 1.5);
        assert_eq!(grown.max.x, 1.0);
    }

    #[test]
    fn test_deflate_never_inverts() {
        let shrunk = cube(0.0, 0.0, 0.0).deflate(0.75);
        assert!(shrunk.min.x <= shrunk.max.x);
        assert!(shrunk.is_degenerate());
    }

    #[test]
    fn test_clip_stops_at_face() {
        let moving = Aabb::from_feet(DVec3::new(0.5, 1.05, 0.5), 0.6, 1.8);
        let floor = cube(0.0, 0.0, 0.0);
        let d = moving.clip_against(&floor, Axis::Y, -0.1);
        assert!((d + 0.05).abs() < 1e-9, "expected -0.05, got {d}");
    }

    #[test]
    fn test_clip_ignores_shapes_behind() {
        let moving = cube(0.0, 2.0, 0.0);
        let floor = cube(0.0, 0.0, 0.0);
        assert_eq!(moving.clip_against(&floor, Axis::Y, 0.5), 0.5);
    }

    #[test]
    fn test_clip_ignores_shapes_without_perpendicular_overlap() {
        let moving = cube(0.0, 0.0, 0.0);
        let beside = cube(3.0, 0.0, 2.0);
        assert_eq!(moving.clip_against(&beside, Axis::X, 5.0), 5.0);
    }

    #[test]
    fn test_collide_axis_takes_nearest() {
        let moving = cube(0.0, 0.0, 0.0);
        let walls = [cube(4.0, 0.0, 0.0), cube(2.5, 0.0, 0.0)];
        let d = collide_axis(Axis::X, &moving, walls.iter(), 10.0);
        assert!((d - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_collide_axis_snaps_tiny_to_zero() {
        let moving = cube(0.0, 0.0, 0.0);
        let wall = cube(1.0 + 5.0e-8, 0.0, 0.0);
        assert_eq!(collide_axis(Axis::X, &moving, [&wall], 1.0), 0.0);
    }

    #[test]
    fn test_block_range_covers_partial_cells() {
        let aabb = Aabb::new(DVec3::new(0.2, 0.0, -0.3), DVec3::new(1.1, 1.0, 0.3));
        let (lo, hi) = aabb.block_range();
        assert_eq!(lo, BlockPos::new(0, 0, -1));
        assert_eq!(hi, BlockPos::new(2, 1, 1));
    }
}

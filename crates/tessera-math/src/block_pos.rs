use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::{Axis, Direction};

/// Integer coordinates of one voxel cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ORIGIN: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The cell containing a world-space point.
    pub fn containing(p: DVec3) -> Self {
        Self::new(p.x.floor() as i32, p.y.floor() as i32, p.z.floor() as i32)
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Neighbour `n` cells away in `dir`.
    pub fn relative(self, dir: Direction, n: i32) -> Self {
        let (dx, dy, dz) = dir.normal();
        self.offset(dx * n, dy * n, dz * n)
    }

    pub fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    pub fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    pub fn get(self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Minimum corner as a world-space point.
    pub fn as_dvec3(self) -> DVec3 {
        DVec3::new(self.x as f64, self.y as f64, self.z as f64)
    }

    /// Centre of the bottom face.
    pub fn bottom_center(self) -> DVec3 {
        DVec3::new(self.x as f64 + 0.5, self.y as f64, self.z as f64 + 0.5)
    }

    pub fn dist_sqr(self, other: BlockPos) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containing_floors_negative() {
        let pos = BlockPos::containing(DVec3::new(-0.5, 64.999, 3.0));
        assert_eq!(pos, BlockPos::new(-1, 64, 3));
    }

    #[test]
    fn test_relative_and_axis_get() {
        let pos = BlockPos::new(1, 2, 3).relative(Direction::North, 2);
        assert_eq!(pos, BlockPos::new(1, 2, 1));
        assert_eq!(pos.get(Axis::Z), 1);
    }

    #[test]
    fn test_dist_sqr() {
        assert_eq!(BlockPos::ORIGIN.dist_sqr(BlockPos::new(1, 2, 2)), 9);
    }
}

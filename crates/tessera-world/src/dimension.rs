//! Dimension descriptors: vertical extent, coordinate scale and climate.

use serde::{Deserialize, Serialize};

/// The three dimension families portals connect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DimensionKind {
    Overworld,
    Nether,
    End,
}

impl DimensionKind {
    /// Where a nether portal in this dimension leads.
    pub fn nether_portal_target(self) -> DimensionKind {
        match self {
            DimensionKind::Nether => DimensionKind::Overworld,
            DimensionKind::Overworld | DimensionKind::End => DimensionKind::Nether,
        }
    }

    /// Where an end portal in this dimension leads.
    pub fn end_portal_target(self) -> DimensionKind {
        match self {
            DimensionKind::End => DimensionKind::Overworld,
            DimensionKind::Overworld | DimensionKind::Nether => DimensionKind::End,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionType {
    pub kind: DimensionKind,
    /// Horizontal distance one block here corresponds to in the overworld.
    pub coordinate_scale: f64,
    /// Hot climate; lava currents push harder.
    pub ultrawarm: bool,
    pub has_ceiling: bool,
    pub min_y: i32,
    /// Total buildable height.
    pub height: i32,
    /// Height portals and teleports may use.
    pub logical_height: i32,
}

impl DimensionType {
    pub fn overworld() -> Self {
        Self {
            kind: DimensionKind::Overworld,
            coordinate_scale: 1.0,
            ultrawarm: false,
            has_ceiling: false,
            min_y: -64,
            height: 384,
            logical_height: 384,
        }
    }

    pub fn nether() -> Self {
        Self {
            kind: DimensionKind::Nether,
            coordinate_scale: 8.0,
            ultrawarm: true,
            has_ceiling: true,
            min_y: 0,
            height: 256,
            logical_height: 128,
        }
    }

    pub fn end() -> Self {
        Self {
            kind: DimensionKind::End,
            coordinate_scale: 1.0,
            ultrawarm: false,
            has_ceiling: false,
            min_y: 0,
            height: 256,
            logical_height: 256,
        }
    }

    pub fn for_kind(kind: DimensionKind) -> Self {
        match kind {
            DimensionKind::Overworld => Self::overworld(),
            DimensionKind::Nether => Self::nether(),
            DimensionKind::End => Self::end(),
        }
    }

    /// One past the highest buildable y.
    pub fn max_y(&self) -> i32 {
        self.min_y + self.height
    }

    /// Highest y usable for portal placement.
    pub fn logical_top(&self) -> i32 {
        self.min_y + self.logical_height - 1
    }

    /// Multiplier from this dimension's horizontal coordinates into `to`'s.
    pub fn scale_to(&self, to: &DimensionType) -> f64 {
        self.coordinate_scale / to.coordinate_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nether_scale_both_ways() {
        let overworld = DimensionType::overworld();
        let nether = DimensionType::nether();
        assert_eq!(overworld.scale_to(&nether), 0.125);
        assert_eq!(nether.scale_to(&overworld), 8.0);
    }

    #[test]
    fn test_portal_targets() {
        assert_eq!(DimensionKind::Overworld.nether_portal_target(), DimensionKind::Nether);
        assert_eq!(DimensionKind::Nether.nether_portal_target(), DimensionKind::Overworld);
        assert_eq!(DimensionKind::End.end_portal_target(), DimensionKind::Overworld);
        assert_eq!(DimensionKind::Overworld.end_portal_target(), DimensionKind::End);
    }

    #[test]
    fn test_vertical_extent() {
        let nether = DimensionType::nether();
        assert_eq!(nether.max_y(), 256);
        assert_eq!(nether.logical_top(), 127);
    }
}

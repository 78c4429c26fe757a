//! Fluid kinds and the per-cell fluid state entities read while submerged.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tessera_math::{BlockPos, Direction};

use crate::error::WorldError;
use crate::query::BlockGetter;

/// Fluid families an entity can be submerged in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FluidKind {
    Water,
    Lava,
}

impl FluidKind {
    pub const ALL: [FluidKind; 2] = [FluidKind::Water, FluidKind::Lava];

    pub fn name(self) -> &'static str {
        match self {
            FluidKind::Water => "water",
            FluidKind::Lava => "lava",
        }
    }
}

/// Fluid presence, surface height and current for one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluidState {
    pub kind: Option<FluidKind>,
    /// 8 for a source, 1..=7 for flowing fluid, 0 when empty.
    pub amount: u8,
    /// Surface height inside the cell, `0.0..=1.0`.
    pub height: f32,
    /// Horizontal current, normalized or zero.
    pub flow: DVec3,
}

impl FluidState {
    pub const EMPTY: FluidState = FluidState {
        kind: None,
        amount: 0,
        height: 0.0,
        flow: DVec3::ZERO,
    };

    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
    }

    pub fn is(&self, kind: FluidKind) -> bool {
        self.kind == Some(kind)
    }

    /// Height of this cell's own fluid ignoring what sits above it.
    pub fn own_height(amount: u8) -> f32 {
        amount as f32 / 9.0
    }
}

/// Fluid state derived from block definitions around `pos`.
///
/// Height is a full cell when the same fluid sits directly above. Flow
/// points down the height gradient towards lower neighbours, including
/// open cells that drop into the same fluid.
pub fn compute_fluid_state<G>(getter: &G, pos: BlockPos) -> Result<FluidState, WorldError>
where
    G: BlockGetter + ?Sized,
{
    let Some(content) = getter.block_def(pos)?.fluid else {
        return Ok(FluidState::EMPTY);
    };
    let kind = content.kind;

    let above = getter.block_def(pos.above())?.fluid;
    let height = if above.is_some_and(|f| f.kind == kind) {
        1.0
    } else {
        FluidState::own_height(content.amount)
    };

    let own = FluidState::own_height(content.amount);
    let mut flow = DVec3::ZERO;
    for dir in Direction::HORIZONTAL {
        let neighbour = pos.relative(dir, 1);
        let def = getter.block_def(neighbour)?;
        let neighbour_height = match def.fluid {
            Some(f) if f.kind == kind => FluidState::own_height(f.amount),
            Some(_) => continue,
            None if def.blocks_motion() => continue,
            None => 0.0,
        };

        let mut delta = 0.0;
        if neighbour_height == 0.0 {
            if let Some(below) = getter.block_def(neighbour.below())?.fluid
                && below.kind == kind
            {
                let below_height = FluidState::own_height(below.amount);
                if below_height > 0.0 {
                    delta = own - (below_height - 0.888_888_9);
                }
            }
        } else {
            delta = own - neighbour_height;
        }

        if delta != 0.0 {
            let (dx, _, dz) = dir.normal();
            flow += DVec3::new(dx as f64, 0.0, dz as f64) * delta as f64;
        }
    }

    Ok(FluidState {
        kind: Some(kind),
        amount: content.amount,
        height,
        flow: flow.normalize_or_zero(),
    })
}

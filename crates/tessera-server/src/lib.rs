//! Headless driver for the Tessera entity simulation.
//!
//! A [`Simulation`] owns one [`tessera_entity::Region`] per dimension, ticks
//! them in a fixed order and carries entities through portals between them.

pub mod demo;
pub mod error;
pub mod simulation;

pub use error::SimulationError;
pub use simulation::{Simulation, TickReport};

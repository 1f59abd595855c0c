//! World simulation engine.
//!
//! This crate implements the bounded grid where organisms drift through ocean
//! layers, feed on dissolved chemicals, reproduce with inherited traits, and
//! gradually adapt to tidal zones and land. A simpler food-grid variant
//! ([`Meadow`]) shares the same day loop.

pub mod environment;
pub mod heredity;
pub mod meadow;
pub mod organism;
pub mod run;
pub mod simulation;

pub use environment::{ChemicalPool, Environment, Tile, WaterLayer};
pub use heredity::Heredity;
pub use meadow::{FoodField, Forager, Meadow};
pub use organism::Organism;
pub use run::{run, Ecosystem, RunReport};
pub use simulation::World;

//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum air breathing needed to enter a tidal zone
pub const TIDAL_AIR_BREATHING: f64 = 0.1;

/// Land-survival thresholds (all must be exceeded)
pub const LAND_AIR_BREATHING: f64 = 0.3;
pub const LAND_DESICCATION_RESISTANCE: f64 = 0.2;
pub const LAND_MOBILITY: f64 = 0.1;

/// Floors for the unbounded-positive traits
pub const MIN_METABOLISM_RATE: f64 = 0.1;
pub const MIN_SIZE: f64 = 0.05;

/// Identifier for an organism, unique within one world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganismId(pub u64);

impl fmt::Display for OrganismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 2D position in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Clamp into a bounded grid of the given dimensions
    pub fn clamp(&self, width: i32, height: i32) -> Self {
        Self {
            x: self.x.clamp(0, width - 1),
            y: self.y.clamp(0, height - 1),
        }
    }

    pub fn in_bounds(&self, width: i32, height: i32) -> bool {
        (0..width).contains(&self.x) && (0..height).contains(&self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Terrain classification of a grid column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Ocean,
    Tidal,
    Land,
}

impl Terrain {
    pub fn is_water(&self) -> bool {
        !matches!(self, Terrain::Land)
    }
}

/// Chemical resources dissolved in water layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chemical {
    Methane,
    Sulfur,
    Ammonia,
    OrganicMatter,
}

impl Chemical {
    pub const COUNT: usize = 4;

    pub fn all() -> [Chemical; Self::COUNT] {
        [
            Chemical::Methane,
            Chemical::Sulfur,
            Chemical::Ammonia,
            Chemical::OrganicMatter,
        ]
    }

    /// Affinities available to the first generation
    pub fn primordial() -> [Chemical; 3] {
        [Chemical::Methane, Chemical::Sulfur, Chemical::Ammonia]
    }

    pub fn index(&self) -> usize {
        match self {
            Chemical::Methane => 0,
            Chemical::Sulfur => 1,
            Chemical::Ammonia => 2,
            Chemical::OrganicMatter => 3,
        }
    }
}

impl fmt::Display for Chemical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Chemical::Methane => "methane",
            Chemical::Sulfur => "sulfur",
            Chemical::Ammonia => "ammonia",
            Chemical::OrganicMatter => "organic_matter",
        };
        f.write_str(name)
    }
}

/// Qualitative stage of the ocean-to-land transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvolutionaryStage {
    Primordial,
    Tidal,
    Amphibious,
    Terrestrial,
}

impl EvolutionaryStage {
    pub fn all() -> [EvolutionaryStage; 4] {
        [
            EvolutionaryStage::Primordial,
            EvolutionaryStage::Tidal,
            EvolutionaryStage::Amphibious,
            EvolutionaryStage::Terrestrial,
        ]
    }

    /// Classify a summed land-adaptation score
    pub fn from_land_score(score: f64) -> Self {
        if score < 0.3 {
            EvolutionaryStage::Primordial
        } else if score < 0.8 {
            EvolutionaryStage::Tidal
        } else if score < 1.5 {
            EvolutionaryStage::Amphibious
        } else {
            EvolutionaryStage::Terrestrial
        }
    }
}

impl fmt::Display for EvolutionaryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Heritable traits of an organism.
///
/// `metabolism_rate` and `size` are unbounded above (floored at
/// [`MIN_METABOLISM_RATE`] and [`MIN_SIZE`]); every other continuous trait
/// lives in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    pub metabolism_rate: f64,
    pub size: f64,
    pub chemical_affinity: Chemical,
    pub heat_tolerance: f64,
    pub depth_preference: f64,
    pub air_breathing: f64,
    pub land_mobility: f64,
    pub desiccation_resistance: f64,
    pub photosynthesis: f64,
}

impl Traits {
    /// Sum of the three land-adaptation traits
    pub fn land_score(&self) -> f64 {
        self.air_breathing + self.land_mobility + self.desiccation_resistance
    }

    pub fn stage(&self) -> EvolutionaryStage {
        EvolutionaryStage::from_land_score(self.land_score())
    }

    pub fn can_survive_on_land(&self) -> bool {
        self.air_breathing > LAND_AIR_BREATHING
            && self.desiccation_resistance > LAND_DESICCATION_RESISTANCE
            && self.land_mobility > LAND_MOBILITY
    }

    pub fn can_enter_tidal(&self) -> bool {
        self.air_breathing >= TIDAL_AIR_BREATHING
    }

    /// Force every trait back into its declared range
    pub fn clamp(&mut self) {
        self.metabolism_rate = self.metabolism_rate.max(MIN_METABOLISM_RATE);
        self.size = self.size.max(MIN_SIZE);
        for value in [
            &mut self.heat_tolerance,
            &mut self.depth_preference,
            &mut self.air_breathing,
            &mut self.land_mobility,
            &mut self.desiccation_resistance,
            &mut self.photosynthesis,
        ] {
            *value = value.clamp(0.0, 1.0);
        }
    }

    /// True when every trait is inside its declared range
    pub fn is_within_bounds(&self) -> bool {
        let unit = 0.0..=1.0;
        self.metabolism_rate >= MIN_METABOLISM_RATE
            && self.size >= MIN_SIZE
            && unit.contains(&self.heat_tolerance)
            && unit.contains(&self.depth_preference)
            && unit.contains(&self.air_breathing)
            && unit.contains(&self.land_mobility)
            && unit.contains(&self.desiccation_resistance)
            && unit.contains(&self.photosynthesis)
    }
}

impl Default for Traits {
    fn default() -> Self {
        Self {
            metabolism_rate: 1.0,
            size: 0.2,
            chemical_affinity: Chemical::Methane,
            heat_tolerance: 0.5,
            depth_preference: 0.5,
            air_breathing: 0.0,
            land_mobility: 0.0,
            desiccation_resistance: 0.0,
            photosynthesis: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_clamp() {
        assert_eq!(Position::new(-1, 4).clamp(10, 10), Position::new(0, 4));
        assert_eq!(Position::new(10, 12).clamp(10, 10), Position::new(9, 9));
        assert_eq!(Position::new(3, 3).clamp(10, 10), Position::new(3, 3));
    }

    #[test]
    fn test_stage_thresholds() {
        assert_eq!(EvolutionaryStage::from_land_score(0.0), EvolutionaryStage::Primordial);
        assert_eq!(EvolutionaryStage::from_land_score(0.29), EvolutionaryStage::Primordial);
        assert_eq!(EvolutionaryStage::from_land_score(0.3), EvolutionaryStage::Tidal);
        assert_eq!(EvolutionaryStage::from_land_score(0.8), EvolutionaryStage::Amphibious);
        assert_eq!(EvolutionaryStage::from_land_score(1.49), EvolutionaryStage::Amphibious);
        assert_eq!(EvolutionaryStage::from_land_score(1.5), EvolutionaryStage::Terrestrial);
    }

    #[test]
    fn test_land_survival() {
        let mut traits = Traits::default();
        assert!(!traits.can_survive_on_land());

        traits.air_breathing = 0.31;
        traits.desiccation_resistance = 0.21;
        traits.land_mobility = 0.11;
        assert!(traits.can_survive_on_land());

        // Thresholds are strict
        traits.land_mobility = 0.1;
        assert!(!traits.can_survive_on_land());
    }

    #[test]
    fn test_traits_clamp() {
        let mut traits = Traits {
            metabolism_rate: 0.01,
            size: -1.0,
            air_breathing: 1.4,
            photosynthesis: -0.2,
            ..Default::default()
        };
        assert!(!traits.is_within_bounds());

        traits.clamp();
        assert!(traits.is_within_bounds());
        assert_eq!(traits.metabolism_rate, MIN_METABOLISM_RATE);
        assert_eq!(traits.size, MIN_SIZE);
        assert_eq!(traits.air_breathing, 1.0);
        assert_eq!(traits.photosynthesis, 0.0);
    }

    #[test]
    fn test_chemical_indices_are_distinct() {
        let mut seen = [false; Chemical::COUNT];
        for chemical in Chemical::all() {
            assert!(!seen[chemical.index()]);
            seen[chemical.index()] = true;
        }
    }
}

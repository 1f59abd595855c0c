//! Configuration types for the simulation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// World geometry and initial population
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the world grid
    pub width: i32,
    /// Height of the world grid
    pub height: i32,
    /// Number of depth layers in ocean columns
    pub max_depth: i32,
    /// Number of organisms created at genesis
    pub initial_population: usize,
    /// Share of columns (from the left) that are open ocean
    pub ocean_fraction: f64,
    /// Share of columns following the ocean that are tidal
    pub tidal_fraction: f64,
}

impl WorldConfig {
    /// Number of leftmost columns classified as ocean
    pub fn ocean_columns(&self) -> i32 {
        (0..self.width)
            .take_while(|&x| (x as f64) < self.width as f64 * self.ocean_fraction)
            .count() as i32
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 15,
            height: 10,
            max_depth: 4,
            initial_population: 8,
            ocean_fraction: 0.4,
            tidal_fraction: 0.2,
        }
    }
}

/// Parameters controlling inheritance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Probability that the chemical affinity is redrawn instead of inherited
    pub mutation_rate: f64,
    /// Upper bound of the land-trait perturbation noise
    pub land_mutation_bias: f64,
    /// Minimum age (exclusive) before an organism may reproduce
    pub reproduction_age: u32,
    /// Fraction of energy a parent retains after reproducing
    pub energy_reproduction_cost: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.02,
            land_mutation_bias: 0.1,
            reproduction_age: 5,
            energy_reproduction_cost: 0.6,
        }
    }
}

/// Energy gains and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Starting energy for genesis organisms, and the cap on a newborn's endowment
    pub initial_energy: f64,
    /// Base energy required to reproduce
    pub reproduction_base: f64,
    /// Additional energy required per unit of size
    pub reproduction_size_factor: f64,
    /// Energy per unit of photosynthesis while on land
    pub photosynthesis_yield: f64,
    /// Energy gained per unit of chemical consumed
    pub feeding_efficiency: f64,
    /// Maximum chemical intake per unit of size
    pub bite_size_factor: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            initial_energy: 15.0,
            reproduction_base: 20.0,
            reproduction_size_factor: 30.0,
            photosynthesis_yield: 3.0,
            feeding_efficiency: 2.0,
            bite_size_factor: 3.0,
        }
    }
}

/// Chemical pool behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Regenerate chemicals every this many days
    pub regen_interval: u64,
    /// Maximum concentration of any chemical in a water layer
    pub chemical_cap: f64,
    /// Population above which organic matter production is boosted
    pub organic_boost_population: usize,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            regen_interval: 3,
            chemical_cap: 12.0,
            organic_boost_population: 5,
        }
    }
}

/// Parameters of the food-grid (meadow) variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeadowConfig {
    /// Food items placed at construction
    pub food_count: usize,
    /// Energy gained from eating one item
    pub food_energy: f64,
    /// Per-day chance of one extra food item appearing
    pub spawn_chance: f64,
    /// Starting energy for genesis foragers
    pub initial_energy: f64,
    /// Energy a forager must exceed to reproduce
    pub reproduction_threshold: f64,
}

impl Default for MeadowConfig {
    fn default() -> Self {
        Self {
            food_count: 20,
            food_energy: 5.0,
            spawn_chance: 0.05,
            initial_energy: 10.0,
            reproduction_threshold: 20.0,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of days to simulate
    pub days: u64,
    /// Random seed for reproducibility; drawn from entropy when absent
    pub seed: Option<u64>,
    pub world: WorldConfig,
    pub evolution: EvolutionConfig,
    pub energy: EnergyConfig,
    pub environment: EnvironmentConfig,
    pub meadow: MeadowConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            days: 300,
            seed: None,
            world: WorldConfig::default(),
            evolution: EvolutionConfig::default(),
            energy: EnergyConfig::default(),
            environment: EnvironmentConfig::default(),
            meadow: MeadowConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "Loaded simulation configuration");
        config.validate()?;
        Ok(config)
    }

    /// Reject parameters that cannot produce a consistent world
    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        if world.width <= 0 || world.height <= 0 {
            return invalid(format!(
                "grid dimensions must be positive, got {}x{}",
                world.width, world.height
            ));
        }
        if world.max_depth <= 0 {
            return invalid(format!("max_depth must be positive, got {}", world.max_depth));
        }
        if world.initial_population == 0 {
            return invalid("initial_population must be at least 1");
        }
        check_unit("world.ocean_fraction", world.ocean_fraction)?;
        check_unit("world.tidal_fraction", world.tidal_fraction)?;
        if world.ocean_fraction + world.tidal_fraction > 1.0 {
            return invalid("ocean_fraction + tidal_fraction must not exceed 1");
        }
        if world.ocean_columns() == 0 {
            return invalid("the ocean band must contain at least one column");
        }

        let evolution = &self.evolution;
        check_unit("evolution.mutation_rate", evolution.mutation_rate)?;
        if !(0.0..=1.0).contains(&evolution.land_mutation_bias) {
            return invalid(format!(
                "land_mutation_bias must be in [0, 1], got {}",
                evolution.land_mutation_bias
            ));
        }
        if !(evolution.energy_reproduction_cost > 0.0 && evolution.energy_reproduction_cost <= 1.0)
        {
            return invalid(format!(
                "energy_reproduction_cost must be in (0, 1], got {}",
                evolution.energy_reproduction_cost
            ));
        }

        let energy = &self.energy;
        check_positive("energy.initial_energy", energy.initial_energy)?;
        for (name, value) in [
            ("energy.reproduction_base", energy.reproduction_base),
            ("energy.reproduction_size_factor", energy.reproduction_size_factor),
            ("energy.photosynthesis_yield", energy.photosynthesis_yield),
            ("energy.feeding_efficiency", energy.feeding_efficiency),
            ("energy.bite_size_factor", energy.bite_size_factor),
        ] {
            check_non_negative(name, value)?;
        }

        if self.environment.regen_interval == 0 {
            return invalid("environment.regen_interval must be at least 1");
        }
        check_positive("environment.chemical_cap", self.environment.chemical_cap)?;

        let meadow = &self.meadow;
        check_unit("meadow.spawn_chance", meadow.spawn_chance)?;
        check_non_negative("meadow.food_energy", meadow.food_energy)?;
        check_non_negative("meadow.reproduction_threshold", meadow.reproduction_threshold)?;
        check_positive("meadow.initial_energy", meadow.initial_energy)?;

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Result<()> {
    Err(Error::InvalidConfig(message.into()))
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        invalid(format!("{name} must be in [0, 1], got {value}"))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        invalid(format!("{name} must be finite and not negative, got {value}"))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        invalid(format!("{name} must be finite and positive, got {value}"))
    }
}

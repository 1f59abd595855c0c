//! Trait inheritance: genesis draws and parent-to-child mutation.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tidepool_core::{Chemical, EnergyConfig, EvolutionConfig, Traits, MIN_METABOLISM_RATE, MIN_SIZE};

/// Lower bound of the land-trait perturbation; the upper bound is the configured bias
const LAND_TRAIT_DOWNSHIFT: f64 = 0.05;

pub struct Heredity {
    evolution: EvolutionConfig,
    energy: EnergyConfig,
}

impl Heredity {
    pub fn new(evolution: EvolutionConfig, energy: EnergyConfig) -> Self {
        Self { evolution, energy }
    }

    pub fn evolution(&self) -> &EvolutionConfig {
        &self.evolution
    }

    pub fn energy(&self) -> &EnergyConfig {
        &self.energy
    }

    /// Traits of a first-generation organism from the primordial soup
    pub fn genesis(&self, rng: &mut ChaCha8Rng) -> Traits {
        let affinity = Chemical::primordial()
            .choose(rng)
            .copied()
            .unwrap_or(Chemical::Methane);

        Traits {
            metabolism_rate: self.genesis_metabolism(rng),
            size: rng.gen_range(0.1..0.3),
            chemical_affinity: affinity,
            heat_tolerance: rng.gen_range(0.3..0.8),
            depth_preference: rng.gen_range(0.0..1.0),
            air_breathing: 0.0,
            land_mobility: 0.0,
            desiccation_resistance: 0.0,
            photosynthesis: 0.0,
        }
    }

    /// Copy every trait from `parent` with independent perturbation.
    ///
    /// Land-adaptation traits drift with noise skewed upwards, modelling the
    /// pressure toward the shore. The result is always within bounds.
    pub fn inherit(&self, parent: &Traits, rng: &mut ChaCha8Rng) -> Traits {
        let land_noise = -LAND_TRAIT_DOWNSHIFT..=self.evolution.land_mutation_bias;

        let chemical_affinity = if rng.gen::<f64>() < self.evolution.mutation_rate {
            Chemical::all()
                .choose(rng)
                .copied()
                .unwrap_or(parent.chemical_affinity)
        } else {
            parent.chemical_affinity
        };

        let mut child = Traits {
            metabolism_rate: self.inherit_metabolism(parent.metabolism_rate, rng),
            size: (parent.size * rng.gen_range(0.95..=1.05)).max(MIN_SIZE),
            chemical_affinity,
            heat_tolerance: parent.heat_tolerance + rng.gen_range(-0.1..=0.1),
            depth_preference: parent.depth_preference + rng.gen_range(-0.1..=0.1),
            air_breathing: parent.air_breathing + rng.gen_range(land_noise.clone()),
            land_mobility: parent.land_mobility + rng.gen_range(land_noise.clone()),
            desiccation_resistance: parent.desiccation_resistance + rng.gen_range(land_noise),
            photosynthesis: parent.photosynthesis + rng.gen_range(-0.02..=0.08),
        };
        child.clamp();
        child
    }

    pub fn genesis_metabolism(&self, rng: &mut ChaCha8Rng) -> f64 {
        rng.gen_range(0.5..1.5)
    }

    /// Multiplicative drift of the metabolic rate, floored at the minimum
    pub fn inherit_metabolism(&self, parent_rate: f64, rng: &mut ChaCha8Rng) -> f64 {
        (parent_rate * rng.gen_range(0.9..=1.1)).max(MIN_METABOLISM_RATE)
    }

    /// Energy an organism of the given size must exceed to reproduce
    pub fn reproduction_threshold(&self, size: f64) -> f64 {
        self.energy.reproduction_base + size * self.energy.reproduction_size_factor
    }

    pub fn is_fertile(&self, energy: f64, size: f64, age: u32) -> bool {
        energy > self.reproduction_threshold(size) && age > self.evolution.reproduction_age
    }
}

//! Organism state and per-day behaviour.

use crate::environment::Environment;
use crate::heredity::Heredity;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tidepool_core::{Chemical, EnergyConfig, EvolutionaryStage, OrganismId, Position, Terrain, Traits};

/// Chance per move that an organism in water changes depth
const VERTICAL_MOVE_CHANCE: f64 = 0.3;

/// Photosynthesis must exceed this before it yields energy
const PHOTOSYNTHESIS_THRESHOLD: f64 = 0.1;

/// An organism in the ocean world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organism {
    pub id: OrganismId,
    pub position: Position,
    pub depth: i32,
    pub energy: f64,
    pub age: u32,
    pub alive: bool,
    pub generation: u32,
    pub traits: Traits,
}

impl Organism {
    pub fn new(id: OrganismId, position: Position, depth: i32, energy: f64, traits: Traits) -> Self {
        Self {
            id,
            position,
            depth,
            energy,
            age: 0,
            alive: true,
            generation: 0,
            traits,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn stage(&self) -> EvolutionaryStage {
        self.traits.stage()
    }

    pub fn can_survive_on_land(&self) -> bool {
        self.traits.can_survive_on_land()
    }

    /// Random single-step move, then metabolic cost and death checks
    pub fn move_in(&mut self, env: &Environment, rng: &mut ChaCha8Rng) {
        let dx = rng.gen_range(-1..=1);
        let dy = rng.gen_range(-1..=1);
        self.step_by(env, dx, dy, rng);
    }

    /// Attempt a displacement of `(dx, dy)`, clamped to the grid.
    ///
    /// Land is refused without land-survival traits and tidal water is
    /// refused without minimal air breathing; a refused move leaves the
    /// position unchanged. The day's metabolic cost is paid either way.
    pub fn step_by(&mut self, env: &Environment, dx: i32, dy: i32, rng: &mut ChaCha8Rng) {
        if !self.alive {
            return;
        }

        let target = self.position.add(dx, dy).clamp(env.width(), env.height());
        let target_terrain = env.tile_type(target);

        let accepted = match target_terrain {
            Terrain::Land => self.can_survive_on_land(),
            Terrain::Tidal => self.traits.can_enter_tidal(),
            Terrain::Ocean => true,
        };

        if accepted {
            self.position = target;
            if target_terrain == Terrain::Land {
                self.depth = 0;
            } else {
                self.drift_vertically(env, rng);
            }
        }

        self.age += 1;

        let on_land = env.tile_type(self.position) == Terrain::Land;
        let mut cost = self.traits.metabolism_rate;
        if on_land {
            cost *= 2.0 - self.traits.land_mobility;
        }
        self.energy -= cost;

        if self.energy <= 0.0 || (on_land && !self.can_survive_on_land()) {
            self.alive = false;
        }
    }

    fn drift_vertically(&mut self, env: &Environment, rng: &mut ChaCha8Rng) {
        let deepest = (env.column_depth(self.position) - 1).max(0);

        if rng.gen::<f64>() < VERTICAL_MOVE_CHANCE {
            let preference = self.traits.depth_preference;
            let shift = if preference > 0.6 {
                rng.gen_range(0..=1)
            } else if preference < 0.4 {
                rng.gen_range(-1..=0)
            } else {
                rng.gen_range(-1..=1)
            };
            self.depth += shift;
        }

        self.depth = self.depth.clamp(0, deepest);
    }

    /// Gain energy from the current position.
    ///
    /// On land: sunlight (with photosynthesis) and detritus (for organic-matter
    /// feeders). In water: the preferred chemical of the current layer, up to a
    /// bite proportional to size.
    pub fn feed(&mut self, env: &mut Environment, energy: &EnergyConfig, rng: &mut ChaCha8Rng) -> f64 {
        if !self.alive {
            return 0.0;
        }

        let before = self.energy;

        if env.tile_type(self.position) == Terrain::Land {
            if self.traits.photosynthesis > PHOTOSYNTHESIS_THRESHOLD {
                self.energy += energy.photosynthesis_yield * self.traits.photosynthesis;
            }
            if self.traits.chemical_affinity == Chemical::OrganicMatter {
                self.energy += rng.gen_range(1.0..3.0);
            }
        } else {
            let chemical = self.traits.chemical_affinity;
            let available = env
                .resource_cell(self.position, self.depth)
                .map(|layer| layer.chemicals.level(chemical))
                .unwrap_or(0.0);

            if available > 0.0 {
                let bite = available.min(self.traits.size * energy.bite_size_factor);
                let eaten = env.consume(self.position, self.depth, chemical, bite);
                self.energy += eaten * energy.feeding_efficiency;
            }
        }

        self.energy - before
    }

    pub fn can_reproduce(&self, heredity: &Heredity) -> bool {
        self.alive && heredity.is_fertile(self.energy, self.traits.size, self.age)
    }

    /// Produce one offspring if fertile.
    ///
    /// The parent keeps `energy_reproduction_cost` of its energy. The child is
    /// endowed from the remainder, capped at the genesis energy, so no energy
    /// is created.
    pub fn reproduce(
        &mut self,
        heredity: &Heredity,
        child_id: OrganismId,
        rng: &mut ChaCha8Rng,
    ) -> Option<Organism> {
        if !self.can_reproduce(heredity) {
            return None;
        }

        let before = self.energy;
        self.energy *= heredity.evolution().energy_reproduction_cost;
        let endowment = (before - self.energy).min(heredity.energy().initial_energy);

        let mut child = Organism::new(
            child_id,
            self.position,
            self.depth,
            endowment,
            heredity.inherit(&self.traits, rng),
        );
        child.generation = self.generation + 1;
        Some(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use tidepool_core::{EnvironmentConfig, EvolutionConfig, WorldConfig};

    fn environment(rng: &mut ChaCha8Rng) -> Environment {
        Environment::new(&WorldConfig::default(), EnvironmentConfig::default(), rng)
    }

    fn heredity() -> Heredity {
        Heredity::new(EvolutionConfig::default(), EnergyConfig::default())
    }

    fn land_adapted() -> Traits {
        Traits {
            air_breathing: 0.8,
            land_mobility: 0.5,
            desiccation_resistance: 0.6,
            ..Default::default()
        }
    }

    #[test]
    fn test_organism_creation() {
        let organism = Organism::new(OrganismId(1), Position::new(2, 3), 1, 15.0, Traits::default());
        assert!(organism.is_alive());
        assert_eq!(organism.age, 0);
        assert_eq!(organism.generation, 0);
        assert_eq!(organism.stage(), EvolutionaryStage::Primordial);
    }

    #[test]
    fn test_unadapted_organism_cannot_step_onto_land() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let env = environment(&mut rng);
        // Column 8 is the last tidal column, column 9 is land
        let start = Position::new(8, 4);
        let mut organism = Organism::new(
            OrganismId(1),
            start,
            0,
            1000.0,
            Traits {
                air_breathing: 0.2,
                ..Default::default()
            },
        );

        for dy in [-1, 0, 1] {
            organism.step_by(&env, 1, dy, &mut rng);
            assert_eq!(organism.position, start);
            assert!(organism.is_alive());
        }
    }

    #[test]
    fn test_tidal_zone_requires_air_breathing() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let env = environment(&mut rng);
        let start = Position::new(5, 4);

        let mut fish = Organism::new(OrganismId(1), start, 0, 100.0, Traits::default());
        fish.step_by(&env, 1, 0, &mut rng);
        assert_eq!(fish.position, start);

        let mut wader = Organism::new(
            OrganismId(2),
            start,
            2,
            100.0,
            Traits {
                air_breathing: 0.1,
                ..Default::default()
            },
        );
        wader.step_by(&env, 1, 0, &mut rng);
        assert_eq!(wader.position, Position::new(6, 4));
        // Tidal columns have a single layer
        assert_eq!(wader.depth, 0);
    }

    #[test]
    fn test_movement_is_clamped_to_grid() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let env = environment(&mut rng);
        let mut organism = Organism::new(OrganismId(1), Position::new(0, 0), 0, 100.0, Traits::default());

        organism.step_by(&env, -1, -1, &mut rng);
        assert_eq!(organism.position, Position::new(0, 0));
        assert!(organism.depth >= 0 && organism.depth < env.max_depth());
    }

    #[test]
    fn test_metabolic_cost_and_age() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let env = environment(&mut rng);
        let mut organism = Organism::new(OrganismId(1), Position::new(2, 2), 0, 10.0, Traits::default());

        organism.step_by(&env, 0, 0, &mut rng);
        assert_eq!(organism.energy, 9.0);
        assert_eq!(organism.age, 1);
    }

    #[test]
    fn test_land_cost_scales_with_mobility() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let env = environment(&mut rng);
        let mut organism = Organism::new(OrganismId(1), Position::new(12, 2), 0, 10.0, land_adapted());

        organism.step_by(&env, 0, 0, &mut rng);
        // metabolism 1.0 * (2 - 0.5)
        assert!((organism.energy - 8.5).abs() < 1e-12);
        assert!(organism.is_alive());
        assert_eq!(organism.depth, 0);
    }

    #[test]
    fn test_dies_on_land_without_adaptations() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let env = environment(&mut rng);
        // Inherited traits fell below the land threshold while resting on land
        let mut organism = Organism::new(OrganismId(1), Position::new(12, 2), 0, 50.0, Traits::default());

        organism.step_by(&env, 0, 0, &mut rng);
        assert!(!organism.is_alive());
    }

    #[test]
    fn test_starvation() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let env = environment(&mut rng);
        let mut organism = Organism::new(OrganismId(1), Position::new(2, 2), 0, 0.5, Traits::default());

        organism.step_by(&env, 0, 0, &mut rng);
        assert!(!organism.is_alive());

        // Dead organisms no longer act
        let age = organism.age;
        organism.step_by(&env, 1, 0, &mut rng);
        assert_eq!(organism.age, age);
    }

    #[test]
    fn test_feed_in_water() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut env = environment(&mut rng);
        let pos = Position::new(1, 1);
        env.resource_cell_mut(pos, 0)
            .unwrap()
            .chemicals
            .set(Chemical::Methane, 5.0);

        let mut organism = Organism::new(
            OrganismId(1),
            pos,
            0,
            10.0,
            Traits {
                size: 0.5,
                chemical_affinity: Chemical::Methane,
                ..Default::default()
            },
        );

        let energy = EnergyConfig::default();
        let gained = organism.feed(&mut env, &energy, &mut rng);
        // Bite of 0.5 * 3 = 1.5 at efficiency 2
        assert!((gained - 3.0).abs() < 1e-12);
        let left = env.resource_cell(pos, 0).unwrap().chemicals.level(Chemical::Methane);
        assert!((left - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_feed_limited_by_availability() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut env = environment(&mut rng);
        let pos = Position::new(7, 1);
        env.resource_cell_mut(pos, 0)
            .unwrap()
            .chemicals
            .set(Chemical::Sulfur, 0.25);

        let mut organism = Organism::new(
            OrganismId(1),
            pos,
            0,
            10.0,
            Traits {
                size: 1.0,
                chemical_affinity: Chemical::Sulfur,
                ..Default::default()
            },
        );

        let gained = organism.feed(&mut env, &EnergyConfig::default(), &mut rng);
        assert!((gained - 0.5).abs() < 1e-12);
        assert_eq!(env.resource_cell(pos, 0).unwrap().chemicals.level(Chemical::Sulfur), 0.0);
    }

    #[test]
    fn test_feed_on_land() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut env = environment(&mut rng);
        let energy = EnergyConfig::default();

        let mut plant = Organism::new(
            OrganismId(1),
            Position::new(12, 2),
            0,
            10.0,
            Traits {
                photosynthesis: 0.5,
                ..land_adapted()
            },
        );
        assert!((plant.feed(&mut env, &energy, &mut rng) - 1.5).abs() < 1e-12);

        let mut scavenger = Organism::new(
            OrganismId(2),
            Position::new(12, 2),
            0,
            10.0,
            Traits {
                chemical_affinity: Chemical::OrganicMatter,
                ..land_adapted()
            },
        );
        let gained = scavenger.feed(&mut env, &energy, &mut rng);
        assert!((1.0..3.0).contains(&gained));

        let mut idle = Organism::new(OrganismId(3), Position::new(12, 2), 0, 10.0, land_adapted());
        assert_eq!(idle.feed(&mut env, &energy, &mut rng), 0.0);
    }

    #[test]
    fn test_reproduction() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let heredity = heredity();
        let mut parent = Organism::new(OrganismId(1), Position::new(2, 2), 1, 50.0, Traits::default());

        // Too young
        assert!(parent.reproduce(&heredity, OrganismId(2), &mut rng).is_none());

        parent.age = 6;
        let child = parent.reproduce(&heredity, OrganismId(2), &mut rng).unwrap();

        assert!((parent.energy - 30.0).abs() < 1e-12);
        assert_eq!(child.energy, 15.0);
        assert_eq!(child.position, parent.position);
        assert_eq!(child.depth, parent.depth);
        assert_eq!(child.generation, 1);
        assert_eq!(child.age, 0);
        assert!(child.traits.is_within_bounds());
    }

    #[test]
    fn test_reproduction_requires_size_scaled_energy() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let heredity = heredity();
        let mut parent = Organism::new(
            OrganismId(1),
            Position::new(2, 2),
            0,
            30.0,
            Traits {
                size: 0.5,
                ..Default::default()
            },
        );
        parent.age = 10;
        // Needs more than 20 + 0.5 * 30 = 35
        assert!(!parent.can_reproduce(&heredity));
        assert!(parent.reproduce(&heredity, OrganismId(2), &mut rng).is_none());
        assert_eq!(parent.energy, 30.0);
    }

    proptest! {
        #[test]
        fn proptest_reproduction_never_creates_energy(
            seed in any::<u64>(),
            energy in 0.0f64..500.0,
            size in 0.05f64..2.0,
            cost in 0.01f64..=1.0,
        ) {
            let heredity = Heredity::new(
                EvolutionConfig { energy_reproduction_cost: cost, ..Default::default() },
                EnergyConfig::default(),
            );
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut parent = Organism::new(
                OrganismId(1),
                Position::new(0, 0),
                0,
                energy,
                Traits { size, ..Default::default() },
            );
            parent.age = 100;

            if let Some(child) = parent.reproduce(&heredity, OrganismId(2), &mut rng) {
                prop_assert!(child.energy + parent.energy <= energy + 1e-9);
                prop_assert!(child.traits.is_within_bounds());
            } else {
                prop_assert_eq!(parent.energy, energy);
            }
        }

        #[test]
        fn proptest_moves_keep_organism_on_grid(seed in any::<u64>(), steps in 1usize..50) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let env = environment(&mut rng);
            let mut organism = Organism::new(OrganismId(1), Position::new(3, 5), 2, 1e6, Traits::default());

            for _ in 0..steps {
                organism.move_in(&env, &mut rng);
                prop_assert!(env.contains(organism.position));
                prop_assert!(organism.depth >= 0 && organism.depth < env.column_depth(organism.position).max(1));
                prop_assert_eq!(env.tile_type(organism.position), Terrain::Ocean);
                prop_assert!(organism.traits.is_within_bounds());
            }
        }
    }
}

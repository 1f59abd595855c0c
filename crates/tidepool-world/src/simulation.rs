//! The ocean world: owns the environment and the population and advances days.

use crate::environment::Environment;
use crate::heredity::Heredity;
use crate::organism::Organism;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tidepool_core::{
    EvolutionStats, OrganismId, Position, Result, SimConfig, StageCounts, Terrain, TraitAverages,
};
use tracing::{debug, info};

/// Days between population snapshots in the log
const SNAPSHOT_INTERVAL: u64 = 25;

pub struct World {
    environment: Environment,
    organisms: Vec<Organism>,
    heredity: Heredity,
    config: SimConfig,
    rng: ChaCha8Rng,
    day: u64,
    next_id: u64,
    births: u64,
    deaths: u64,
}

impl World {
    /// Build the world and seed the ocean with a genesis population
    pub fn new(config: SimConfig) -> Result<Self> {
        let mut world = Self::empty(config)?;

        let ocean_columns = world.config.world.ocean_columns();
        for _ in 0..world.config.world.initial_population {
            let x = world.rng.gen_range(0..ocean_columns);
            let y = world.rng.gen_range(0..world.config.world.height);
            let depth = world.rng.gen_range(0..world.config.world.max_depth);
            let traits = world.heredity.genesis(&mut world.rng);
            let id = world.allocate_id();
            world.organisms.push(Organism::new(
                id,
                Position::new(x, y),
                depth,
                world.config.energy.initial_energy,
                traits,
            ));
        }

        info!(
            width = world.config.world.width,
            height = world.config.world.height,
            max_depth = world.config.world.max_depth,
            population = world.organisms.len(),
            seed = ?world.config.seed,
            "Ocean world created"
        );

        Ok(world)
    }

    /// Build the world around a caller-supplied population.
    /// Organism ids are reassigned so they stay unique.
    pub fn with_organisms(config: SimConfig, organisms: Vec<Organism>) -> Result<Self> {
        let mut world = Self::empty(config)?;
        for mut organism in organisms {
            organism.position = organism
                .position
                .clamp(world.environment.width(), world.environment.height());
            let deepest = (world.environment.column_depth(organism.position) - 1).max(0);
            organism.depth = organism.depth.clamp(0, deepest);
            organism.id = world.allocate_id();
            world.organisms.push(organism);
        }
        Ok(world)
    }

    fn empty(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let environment = Environment::new(&config.world, config.environment.clone(), &mut rng);
        let heredity = Heredity::new(config.evolution.clone(), config.energy.clone());

        Ok(Self {
            environment,
            organisms: Vec::new(),
            heredity,
            config,
            rng,
            day: 0,
            next_id: 0,
            births: 0,
            deaths: 0,
        })
    }

    fn allocate_id(&mut self) -> OrganismId {
        let id = OrganismId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn day(&self) -> u64 {
        self.day
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_extinct(&self) -> bool {
        self.organisms.is_empty()
    }

    /// Total births and deaths since construction
    pub fn lifetime_counts(&self) -> (u64, u64) {
        (self.births, self.deaths)
    }

    /// Advance one day.
    ///
    /// Only organisms alive at the start of the day act; newborns join
    /// afterwards. Dead organisms are removed before regeneration, so the
    /// population never holds a dead organism between days.
    pub fn update(&mut self) {
        let acting = self.organisms.len();
        let mut newborns = Vec::new();

        for index in 0..acting {
            let organism = &mut self.organisms[index];
            if !organism.is_alive() {
                continue;
            }

            organism.move_in(&self.environment, &mut self.rng);
            if !organism.is_alive() {
                continue;
            }

            organism.feed(&mut self.environment, &self.config.energy, &mut self.rng);

            let child_id = OrganismId(self.next_id);
            if let Some(child) = organism.reproduce(&self.heredity, child_id, &mut self.rng) {
                self.next_id += 1;
                debug!(
                    parent_id = %organism.id,
                    child_id = %child.id,
                    generation = child.generation,
                    parent_energy = organism.energy,
                    child_energy = child.energy,
                    day = self.day + 1,
                    "Organism reproduced"
                );
                newborns.push(child);
            }
        }

        self.births += newborns.len() as u64;
        self.organisms.extend(newborns);

        let day = self.day + 1;
        let before = self.organisms.len();
        self.organisms.retain(|organism| {
            if !organism.is_alive() {
                debug!(
                    organism_id = %organism.id,
                    age = organism.age,
                    energy = organism.energy,
                    position = %organism.position,
                    day,
                    "Organism died"
                );
            }
            organism.is_alive()
        });
        let died = before - self.organisms.len();
        self.deaths += died as u64;

        if day % self.config.environment.regen_interval == 0 {
            self.environment.regenerate(self.organisms.len(), &mut self.rng);
        }

        self.day = day;

        if died > 0 && self.organisms.is_empty() {
            info!(day = self.day, "Population extinct");
        } else if self.day % SNAPSHOT_INTERVAL == 0 {
            info!(
                day = self.day,
                population = self.organisms.len(),
                births = self.births,
                deaths = self.deaths,
                "Population snapshot"
            );
        }
    }

    /// Aggregate statistics for the current day. Pure: repeated calls
    /// without an intervening update return identical results.
    pub fn statistics(&self) -> EvolutionStats {
        let mut stages = StageCounts::default();
        let mut land_population = 0;
        let mut total_energy = 0.0;
        let mut max_generation = 0;

        for organism in &self.organisms {
            stages.record(organism.stage());
            if self.environment.tile_type(organism.position) == Terrain::Land {
                land_population += 1;
            }
            total_energy += organism.energy;
            max_generation = max_generation.max(organism.generation);
        }

        let population = self.organisms.len();
        let average_energy = if population > 0 {
            total_energy / population as f64
        } else {
            0.0
        };

        EvolutionStats {
            day: self.day,
            population,
            land_population,
            stages,
            averages: TraitAverages::from_traits(self.organisms.iter().map(|o| &o.traits)),
            average_energy,
            max_generation,
            total_resources: self.environment.total_resources(),
        }
    }
}

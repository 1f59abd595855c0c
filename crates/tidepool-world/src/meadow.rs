//! The food-grid variant: an open meadow of discrete food items and foragers
//! whose only heritable trait is their metabolic rate.

use crate::heredity::Heredity;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tidepool_core::{MeadowConfig, MeadowStats, OrganismId, Position, Result, SimConfig};
use tracing::{debug, info};

/// Random cells tried before a food spawn scans for free cells
const MAX_SPAWN_ATTEMPTS: usize = 32;

/// Food items on the grid, at most one per cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodField {
    width: i32,
    height: i32,
    items: HashSet<Position>,
}

impl FoodField {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            items: HashSet::new(),
        }
    }

    /// Scatter up to `count` food items on distinct cells
    pub fn scattered(width: i32, height: i32, count: usize, rng: &mut ChaCha8Rng) -> Self {
        let mut field = Self::new(width, height);
        while field.len() < count && field.spawn(rng).is_some() {}
        field
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.items.contains(&pos)
    }

    pub fn insert(&mut self, pos: Position) -> bool {
        self.items.insert(pos.clamp(self.width, self.height))
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> + '_ {
        self.items.iter()
    }

    /// Place one item on a uniformly random free cell. Returns `None` only
    /// when every cell already holds food.
    pub fn spawn(&mut self, rng: &mut ChaCha8Rng) -> Option<Position> {
        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let pos = Position::new(rng.gen_range(0..self.width), rng.gen_range(0..self.height));
            if self.items.insert(pos) {
                return Some(pos);
            }
        }

        // Crowded grid: pick among the remaining free cells directly
        let free: Vec<Position> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| Position::new(x, y)))
            .filter(|pos| !self.items.contains(pos))
            .collect();
        let pos = *free.choose(rng)?;
        self.items.insert(pos);
        Some(pos)
    }

    pub fn maybe_spawn(&mut self, chance: f64, rng: &mut ChaCha8Rng) -> Option<Position> {
        if rng.gen::<f64>() < chance {
            self.spawn(rng)
        } else {
            None
        }
    }

    /// Eat the item at `pos`, if any, and respawn a replacement elsewhere
    pub fn consume(&mut self, pos: Position, rng: &mut ChaCha8Rng) -> bool {
        if !self.items.remove(&pos) {
            return false;
        }
        self.spawn(rng);
        true
    }
}

/// A forager in the meadow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forager {
    pub id: OrganismId,
    pub position: Position,
    pub energy: f64,
    pub age: u32,
    pub alive: bool,
    pub generation: u32,
    pub metabolism_rate: f64,
}

impl Forager {
    pub fn new(id: OrganismId, position: Position, energy: f64, metabolism_rate: f64) -> Self {
        Self {
            id,
            position,
            energy,
            age: 0,
            alive: true,
            generation: 0,
            metabolism_rate,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn move_in(&mut self, width: i32, height: i32, rng: &mut ChaCha8Rng) {
        if !self.alive {
            return;
        }

        let dx = rng.gen_range(-1..=1);
        let dy = rng.gen_range(-1..=1);
        self.position = self.position.add(dx, dy).clamp(width, height);
        self.age += 1;
        self.energy -= self.metabolism_rate;

        if self.energy <= 0.0 {
            self.alive = false;
        }
    }

    /// Eat the food item under the forager, if there is one
    pub fn feed(&mut self, food: &mut FoodField, food_energy: f64, rng: &mut ChaCha8Rng) -> bool {
        if !self.alive || !food.consume(self.position, rng) {
            return false;
        }
        self.energy += food_energy;
        true
    }

    pub fn can_reproduce(&self, threshold: f64, heredity: &Heredity) -> bool {
        self.alive && self.energy > threshold && self.age > heredity.evolution().reproduction_age
    }

    pub fn reproduce(
        &mut self,
        config: &MeadowConfig,
        heredity: &Heredity,
        child_id: OrganismId,
        rng: &mut ChaCha8Rng,
    ) -> Option<Forager> {
        if !self.can_reproduce(config.reproduction_threshold, heredity) {
            return None;
        }

        let before = self.energy;
        self.energy *= heredity.evolution().energy_reproduction_cost;
        let endowment = (before - self.energy).min(config.initial_energy);

        let mut child = Forager::new(
            child_id,
            self.position,
            endowment,
            heredity.inherit_metabolism(self.metabolism_rate, rng),
        );
        child.generation = self.generation + 1;
        Some(child)
    }
}

pub struct Meadow {
    width: i32,
    height: i32,
    food: FoodField,
    foragers: Vec<Forager>,
    heredity: Heredity,
    config: SimConfig,
    rng: ChaCha8Rng,
    day: u64,
    next_id: u64,
}

impl Meadow {
    pub fn new(config: SimConfig) -> Result<Self> {
        let mut meadow = Self::with_foragers(config, Vec::new())?;

        for _ in 0..meadow.config.world.initial_population {
            let pos = Position::new(
                meadow.rng.gen_range(0..meadow.width),
                meadow.rng.gen_range(0..meadow.height),
            );
            let metabolism = meadow.heredity.genesis_metabolism(&mut meadow.rng);
            let id = meadow.allocate_id();
            meadow.foragers.push(Forager::new(
                id,
                pos,
                meadow.config.meadow.initial_energy,
                metabolism,
            ));
        }

        info!(
            width = meadow.width,
            height = meadow.height,
            population = meadow.foragers.len(),
            food = meadow.food.len(),
            "Meadow created"
        );

        Ok(meadow)
    }

    /// Build the meadow around a caller-supplied set of foragers
    pub fn with_foragers(config: SimConfig, foragers: Vec<Forager>) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let (width, height) = (config.world.width, config.world.height);
        let food = FoodField::scattered(width, height, config.meadow.food_count, &mut rng);
        let heredity = Heredity::new(config.evolution.clone(), config.energy.clone());

        let mut meadow = Self {
            width,
            height,
            food,
            foragers: Vec::new(),
            heredity,
            config,
            rng,
            day: 0,
            next_id: 0,
        };

        for mut forager in foragers {
            forager.position = forager.position.clamp(width, height);
            forager.id = meadow.allocate_id();
            meadow.foragers.push(forager);
        }

        Ok(meadow)
    }

    fn allocate_id(&mut self) -> OrganismId {
        let id = OrganismId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn day(&self) -> u64 {
        self.day
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn foragers(&self) -> &[Forager] {
        &self.foragers
    }

    pub fn food(&self) -> &FoodField {
        &self.food
    }

    pub fn food_mut(&mut self) -> &mut FoodField {
        &mut self.food
    }

    pub fn is_extinct(&self) -> bool {
        self.foragers.is_empty()
    }

    /// Advance one day: move, feed and reproduce every forager alive at the
    /// start of the day, then remove the dead and maybe spawn extra food.
    pub fn update(&mut self) {
        let acting = self.foragers.len();
        let mut newborns = Vec::new();
        let food_energy = self.config.meadow.food_energy;

        for index in 0..acting {
            let forager = &mut self.foragers[index];
            forager.move_in(self.width, self.height, &mut self.rng);
            if !forager.is_alive() {
                continue;
            }

            forager.feed(&mut self.food, food_energy, &mut self.rng);

            let child_id = OrganismId(self.next_id);
            if let Some(child) =
                forager.reproduce(&self.config.meadow, &self.heredity, child_id, &mut self.rng)
            {
                self.next_id += 1;
                debug!(parent_id = %forager.id, child_id = %child.id, "Forager reproduced");
                newborns.push(child);
            }
        }

        self.foragers.extend(newborns);
        self.foragers.retain(|forager| forager.is_alive());
        self.food.maybe_spawn(self.config.meadow.spawn_chance, &mut self.rng);
        self.day += 1;

        if self.foragers.is_empty() {
            debug!(day = self.day, "Meadow is empty");
        }
    }

    pub fn statistics(&self) -> MeadowStats {
        let population = self.foragers.len();
        let (average_metabolism, average_energy) = if population > 0 {
            let n = population as f64;
            (
                self.foragers.iter().map(|f| f.metabolism_rate).sum::<f64>() / n,
                self.foragers.iter().map(|f| f.energy).sum::<f64>() / n,
            )
        } else {
            (0.0, 0.0)
        };

        MeadowStats {
            day: self.day,
            population,
            food_count: self.food.len(),
            average_metabolism,
            average_energy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_core::WorldConfig;

    fn meadow_config(seed: u64) -> SimConfig {
        SimConfig {
            world: WorldConfig {
                width: 10,
                height: 10,
                initial_population: 3,
                ..Default::default()
            },
            ..SimConfig::with_seed(seed)
        }
    }

    #[test]
    fn test_food_field_positions_are_unique() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let field = FoodField::scattered(5, 5, 20, &mut rng);
        assert_eq!(field.len(), 20);

        let distinct: HashSet<_> = field.positions().copied().collect();
        assert_eq!(distinct.len(), field.len());
        assert!(field.positions().all(|p| p.in_bounds(5, 5)));
    }

    #[test]
    fn test_food_field_never_overfills() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut field = FoodField::scattered(2, 2, 10, &mut rng);
        assert_eq!(field.len(), 4);
        assert!(field.spawn(&mut rng).is_none());
        assert!(!field.insert(Position::new(0, 0)));
    }

    fn free_cell(field: &FoodField) -> Position {
        (0..10)
            .flat_map(|y| (0..10).map(move |x| Position::new(x, y)))
            .find(|pos| !field.contains(*pos))
            .unwrap()
    }

    #[test]
    fn test_consume_replaces_food() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut field = FoodField::new(10, 10);
        field.insert(Position::new(3, 3));

        assert!(field.consume(Position::new(3, 3), &mut rng));
        assert_eq!(field.len(), 1);

        let empty = free_cell(&field);
        assert!(!field.consume(empty, &mut rng));
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn test_forager_eats_food() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut field = FoodField::new(10, 10);
        field.insert(Position::new(3, 3));

        let mut forager = Forager::new(OrganismId(0), Position::new(3, 3), 5.0, 1.0);
        assert!(forager.feed(&mut field, 5.0, &mut rng));
        assert_eq!(forager.energy, 10.0);
        assert_eq!(field.len(), 1);

        let mut hungry = Forager::new(OrganismId(1), free_cell(&field), 5.0, 1.0);
        assert!(!hungry.feed(&mut field, 5.0, &mut rng));
        assert_eq!(hungry.energy, 5.0);
    }

    #[test]
    fn test_population_starves_without_food() {
        let mut config = meadow_config(42);
        config.meadow.food_count = 0;
        config.meadow.spawn_chance = 0.0;
        let mut meadow = Meadow::new(config).unwrap();
        assert_eq!(meadow.foragers().len(), 3);

        for _ in 0..100 {
            meadow.update();
            assert!(meadow.foragers().iter().all(|f| f.is_alive()));
        }

        assert!(meadow.is_extinct());
        assert_eq!(meadow.day(), 100);
        assert_eq!(meadow.statistics().population, 0);
        assert_eq!(meadow.statistics().food_count, 0);
    }

    #[test]
    fn test_single_forager_reproduces_once() {
        let mut config = meadow_config(3);
        config.meadow.food_count = 0;
        config.meadow.spawn_chance = 0.0;
        let mut forager = Forager::new(OrganismId(0), Position::new(5, 5), 100.0, 1.0);
        forager.age = 10;
        let mut meadow = Meadow::with_foragers(config, vec![forager]).unwrap();

        meadow.update();
        assert_eq!(meadow.foragers().len(), 2);

        let parent = &meadow.foragers()[0];
        let child = &meadow.foragers()[1];
        assert!((parent.energy - 99.0 * 0.6).abs() < 1e-9);
        assert_eq!(child.energy, 10.0);
        assert_eq!(child.generation, 1);
        assert!(child.metabolism_rate >= 0.9 - 1e-12 && child.metabolism_rate <= 1.1 + 1e-12);
    }

    #[test]
    fn test_reproduction_conserves_energy() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let config = MeadowConfig::default();
        let heredity = Heredity::new(Default::default(), Default::default());
        let mut forager = Forager::new(OrganismId(0), Position::new(0, 0), 21.0, 1.0);
        forager.age = 6;

        let child = forager
            .reproduce(&config, &heredity, OrganismId(1), &mut rng)
            .unwrap();
        assert!(child.energy + forager.energy <= 21.0 + 1e-12);
    }

    #[test]
    fn test_meadow_statistics() {
        let mut meadow = Meadow::new(meadow_config(12)).unwrap();
        for _ in 0..10 {
            meadow.update();
        }

        let stats = meadow.statistics();
        assert_eq!(stats, meadow.statistics());
        assert_eq!(stats.day, 10);
        assert_eq!(stats.population, meadow.foragers().len());
        assert_eq!(stats.food_count, meadow.food().len());

        if stats.population > 0 {
            let mean = meadow.foragers().iter().map(|f| f.metabolism_rate).sum::<f64>()
                / stats.population as f64;
            assert!((stats.average_metabolism - mean).abs() < 1e-12);
        }
    }
}

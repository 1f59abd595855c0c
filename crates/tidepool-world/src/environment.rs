//! Terrain and depth-layered chemical pools.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tidepool_core::{Chemical, EnvironmentConfig, Position, Terrain, WorldConfig};
use tracing::trace;

/// Initial concentration ranges per chemical
const INITIAL_METHANE: (f64, f64) = (2.0, 8.0);
const INITIAL_SULFUR: (f64, f64) = (1.0, 6.0);
const INITIAL_AMMONIA: (f64, f64) = (1.0, 5.0);
const INITIAL_ORGANIC: (f64, f64) = (0.0, 2.0);

/// Layers at or below this depth are fed by thermal vents
const VENT_DEPTH: i32 = 2;

/// Concentrations of every chemical in one water layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChemicalPool {
    levels: [f64; Chemical::COUNT],
}

impl ChemicalPool {
    pub fn level(&self, chemical: Chemical) -> f64 {
        self.levels[chemical.index()]
    }

    pub fn set(&mut self, chemical: Chemical, level: f64) {
        self.levels[chemical.index()] = level.max(0.0);
    }

    pub fn add(&mut self, chemical: Chemical, amount: f64) {
        let slot = &mut self.levels[chemical.index()];
        *slot = (*slot + amount).max(0.0);
    }

    /// Remove up to `amount` and return what was actually removed
    pub fn take(&mut self, chemical: Chemical, amount: f64) -> f64 {
        let slot = &mut self.levels[chemical.index()];
        let removed = slot.min(amount.max(0.0));
        *slot -= removed;
        removed
    }

    pub fn cap(&mut self, max: f64) {
        for level in &mut self.levels {
            *level = level.min(max);
        }
    }

    pub fn total(&self) -> f64 {
        self.levels.iter().sum()
    }
}

/// One depth layer of a water column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterLayer {
    pub depth: i32,
    pub temperature: f64,
    pub chemicals: ChemicalPool,
}

/// A grid cell: its terrain and, for water, its depth layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: Terrain,
    pub layers: Vec<WaterLayer>,
}

/// Temperature of a water layer at the given depth
pub fn temperature(depth: i32) -> f64 {
    20.0 + depth as f64 * 15.0
}

/// The bounded world grid with terrain zones and chemical pools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    width: i32,
    height: i32,
    max_depth: i32,
    tiles: Vec<Tile>,
    config: EnvironmentConfig,
}

impl Environment {
    /// Lay out ocean, tidal and land columns and fill the water with chemicals
    pub fn new(world: &WorldConfig, config: EnvironmentConfig, rng: &mut ChaCha8Rng) -> Self {
        let mut tiles = Vec::with_capacity((world.width * world.height) as usize);

        for _y in 0..world.height {
            for x in 0..world.width {
                let terrain = Self::terrain_for_column(world, x);
                let depth_count = match terrain {
                    Terrain::Ocean => world.max_depth,
                    Terrain::Tidal => 1,
                    Terrain::Land => 0,
                };

                let layers = (0..depth_count)
                    .map(|depth| {
                        let mut chemicals = ChemicalPool::default();
                        chemicals.set(Chemical::Methane, rng.gen_range(INITIAL_METHANE.0..INITIAL_METHANE.1));
                        chemicals.set(Chemical::Sulfur, rng.gen_range(INITIAL_SULFUR.0..INITIAL_SULFUR.1));
                        chemicals.set(Chemical::Ammonia, rng.gen_range(INITIAL_AMMONIA.0..INITIAL_AMMONIA.1));
                        chemicals.set(
                            Chemical::OrganicMatter,
                            rng.gen_range(INITIAL_ORGANIC.0..INITIAL_ORGANIC.1),
                        );
                        chemicals.cap(config.chemical_cap);
                        WaterLayer {
                            depth,
                            temperature: temperature(depth),
                            chemicals,
                        }
                    })
                    .collect();

                tiles.push(Tile { terrain, layers });
            }
        }

        Self {
            width: world.width,
            height: world.height,
            max_depth: world.max_depth,
            tiles,
            config,
        }
    }

    /// Coastline layout: ocean on the left, then tidal, then land
    pub fn terrain_for_column(world: &WorldConfig, x: i32) -> Terrain {
        let x = x as f64;
        let width = world.width as f64;
        if x < width * world.ocean_fraction {
            Terrain::Ocean
        } else if x < width * (world.ocean_fraction + world.tidal_fraction) {
            Terrain::Tidal
        } else {
            Terrain::Land
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn max_depth(&self) -> i32 {
        self.max_depth
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.in_bounds(self.width, self.height)
    }

    /// Terrain at a position. Panics when `pos` is outside the grid.
    pub fn tile_type(&self, pos: Position) -> Terrain {
        self.tile(pos).terrain
    }

    /// Number of water layers at a position (0 on land)
    pub fn column_depth(&self, pos: Position) -> i32 {
        self.tile(pos).layers.len() as i32
    }

    /// Water layer at `depth`, clamped to the column. `None` on land.
    pub fn resource_cell(&self, pos: Position, depth: i32) -> Option<&WaterLayer> {
        let layers = &self.tile(pos).layers;
        let index = Self::layer_index(layers.len(), depth)?;
        layers.get(index)
    }

    pub fn resource_cell_mut(&mut self, pos: Position, depth: i32) -> Option<&mut WaterLayer> {
        let layers = &mut self.tile_mut(pos).layers;
        let index = Self::layer_index(layers.len(), depth)?;
        layers.get_mut(index)
    }

    /// Remove up to `amount` of a chemical from the layer at `depth`.
    /// Returns the amount actually removed; always 0 on land.
    pub fn consume(&mut self, pos: Position, depth: i32, chemical: Chemical, amount: f64) -> f64 {
        match self.resource_cell_mut(pos, depth) {
            Some(layer) => layer.chemicals.take(chemical, amount),
            None => 0.0,
        }
    }

    /// Replenish every water layer: vents feed the deep layers, the atmosphere
    /// feeds the surface, and organic matter accumulates everywhere (faster once
    /// life is established). Concentrations are capped afterwards.
    pub fn regenerate(&mut self, population: usize, rng: &mut ChaCha8Rng) {
        let cap = self.config.chemical_cap;
        let boosted = population > self.config.organic_boost_population;

        for tile in &mut self.tiles {
            for layer in &mut tile.layers {
                let pool = &mut layer.chemicals;

                if layer.depth >= VENT_DEPTH {
                    pool.add(Chemical::Sulfur, rng.gen_range(0.5..2.0));
                    pool.add(Chemical::Methane, rng.gen_range(0.3..1.5));
                }

                if layer.depth == 0 {
                    pool.add(Chemical::Ammonia, rng.gen_range(0.2..1.0));
                    pool.add(Chemical::Methane, rng.gen_range(0.1..0.8));
                }

                pool.add(Chemical::OrganicMatter, rng.gen_range(0.02..0.1));
                if boosted {
                    pool.add(Chemical::OrganicMatter, rng.gen_range(0.1..0.5));
                }

                pool.cap(cap);
            }
        }

        trace!(population, boosted, "Regenerated ocean chemistry");
    }

    /// Sum of every chemical concentration in the world
    pub fn total_resources(&self) -> f64 {
        self.tiles
            .iter()
            .flat_map(|tile| tile.layers.iter())
            .map(|layer| layer.chemicals.total())
            .sum()
    }

    pub fn chemical_cap(&self) -> f64 {
        self.config.chemical_cap
    }

    fn layer_index(len: usize, depth: i32) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some((depth.max(0) as usize).min(len - 1))
    }

    fn tile(&self, pos: Position) -> &Tile {
        &self.tiles[self.pos_to_index(pos)]
    }

    fn tile_mut(&mut self, pos: Position) -> &mut Tile {
        let index = self.pos_to_index(pos);
        &mut self.tiles[index]
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        assert!(
            self.contains(pos),
            "position {pos} outside {}x{} grid",
            self.width,
            self.height
        );
        (pos.y * self.width + pos.x) as usize
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Iterator over all tiles with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| (self.index_to_pos(i), tile))
    }
}

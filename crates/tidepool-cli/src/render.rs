//! Plain-text rendering of worlds and their statistics.

use std::collections::HashMap;
use std::fmt::Write;
use tidepool_core::{EvolutionStats, EvolutionaryStage, MeadowStats, Position, Terrain};
use tidepool_world::{Meadow, World};

fn terrain_glyph(terrain: Terrain) -> char {
    match terrain {
        Terrain::Ocean => '~',
        Terrain::Tidal => '=',
        Terrain::Land => '#',
    }
}

fn stage_glyph(stage: EvolutionaryStage) -> char {
    match stage {
        EvolutionaryStage::Primordial => 'o',
        EvolutionaryStage::Tidal => 't',
        EvolutionaryStage::Amphibious => 'a',
        EvolutionaryStage::Terrestrial => 'T',
    }
}

pub fn world_summary(stats: &EvolutionStats) -> String {
    if stats.is_extinct() {
        return format!("Day {} | Population: 0 - EXTINCTION", stats.day);
    }

    format!(
        "Day {} | Population: {} | On land: {} | Generation: {}\n\
         Stages - Primordial: {}, Tidal: {}, Amphibious: {}, Terrestrial: {}\n\
         Air breathing: {:.3} | Land mobility: {:.3} | Photosynthesis: {:.3} | Chemicals: {:.1}",
        stats.day,
        stats.population,
        stats.land_population,
        stats.max_generation,
        stats.stages.primordial,
        stats.stages.tidal,
        stats.stages.amphibious,
        stats.stages.terrestrial,
        stats.averages.air_breathing,
        stats.averages.land_mobility,
        stats.averages.photosynthesis,
        stats.total_resources,
    )
}

/// Terrain map with the first organism found on each cell drawn by its stage
pub fn world_map(world: &World) -> String {
    let env = world.environment();
    let mut occupants: HashMap<Position, EvolutionaryStage> = HashMap::new();
    for organism in world.organisms() {
        occupants.entry(organism.position).or_insert_with(|| organism.stage());
    }

    let mut out = String::new();
    for y in 0..env.height() {
        let row: Vec<String> = (0..env.width())
            .map(|x| {
                let pos = Position::new(x, y);
                occupants
                    .get(&pos)
                    .map(|stage| stage_glyph(*stage))
                    .unwrap_or_else(|| terrain_glyph(env.tile_type(pos)))
                    .to_string()
            })
            .collect();
        let _ = writeln!(out, "{}", row.join(" "));
    }
    out.push_str("Legend: ~ ocean | = tidal | # land | o primordial | t tidal | a amphibious | T terrestrial\n");
    out
}

pub fn meadow_summary(stats: &MeadowStats) -> String {
    format!(
        "Day {} | Population: {} | Food: {} | Metabolism: {:.3} | Energy: {:.1}",
        stats.day, stats.population, stats.food_count, stats.average_metabolism, stats.average_energy,
    )
}

pub fn meadow_map(meadow: &Meadow) -> String {
    let mut occupied = HashMap::new();
    for forager in meadow.foragers() {
        occupied.insert(forager.position, '@');
    }

    let mut out = String::new();
    for y in 0..meadow.height() {
        let row: Vec<String> = (0..meadow.width())
            .map(|x| {
                let pos = Position::new(x, y);
                let glyph = match occupied.get(&pos) {
                    Some(glyph) => *glyph,
                    None if meadow.food().contains(pos) => '*',
                    None => '.',
                };
                glyph.to_string()
            })
            .collect();
        let _ = writeln!(out, "{}", row.join(" "));
    }
    out
}

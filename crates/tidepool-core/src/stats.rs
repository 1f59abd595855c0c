//! Per-day aggregate statistics consumed by renderers and run history.

use crate::{EvolutionaryStage, Traits};
use serde::{Deserialize, Serialize};

/// Organism counts per evolutionary stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub primordial: usize,
    pub tidal: usize,
    pub amphibious: usize,
    pub terrestrial: usize,
}

impl StageCounts {
    pub fn get(&self, stage: EvolutionaryStage) -> usize {
        match stage {
            EvolutionaryStage::Primordial => self.primordial,
            EvolutionaryStage::Tidal => self.tidal,
            EvolutionaryStage::Amphibious => self.amphibious,
            EvolutionaryStage::Terrestrial => self.terrestrial,
        }
    }

    pub fn record(&mut self, stage: EvolutionaryStage) {
        let slot = match stage {
            EvolutionaryStage::Primordial => &mut self.primordial,
            EvolutionaryStage::Tidal => &mut self.tidal,
            EvolutionaryStage::Amphibious => &mut self.amphibious,
            EvolutionaryStage::Terrestrial => &mut self.terrestrial,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.primordial + self.tidal + self.amphibious + self.terrestrial
    }
}

/// Population means of every continuous trait
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitAverages {
    pub metabolism_rate: f64,
    pub size: f64,
    pub heat_tolerance: f64,
    pub depth_preference: f64,
    pub air_breathing: f64,
    pub land_mobility: f64,
    pub desiccation_resistance: f64,
    pub photosynthesis: f64,
}

impl TraitAverages {
    /// Arithmetic means over the given traits; all zero for an empty input
    pub fn from_traits<'a>(traits: impl IntoIterator<Item = &'a Traits>) -> Self {
        let mut sum = TraitAverages::default();
        let mut count = 0usize;

        for t in traits {
            sum.metabolism_rate += t.metabolism_rate;
            sum.size += t.size;
            sum.heat_tolerance += t.heat_tolerance;
            sum.depth_preference += t.depth_preference;
            sum.air_breathing += t.air_breathing;
            sum.land_mobility += t.land_mobility;
            sum.desiccation_resistance += t.desiccation_resistance;
            sum.photosynthesis += t.photosynthesis;
            count += 1;
        }

        if count == 0 {
            return sum;
        }

        let n = count as f64;
        TraitAverages {
            metabolism_rate: sum.metabolism_rate / n,
            size: sum.size / n,
            heat_tolerance: sum.heat_tolerance / n,
            depth_preference: sum.depth_preference / n,
            air_breathing: sum.air_breathing / n,
            land_mobility: sum.land_mobility / n,
            desiccation_resistance: sum.desiccation_resistance / n,
            photosynthesis: sum.photosynthesis / n,
        }
    }
}

/// Snapshot of the ocean world after a day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionStats {
    pub day: u64,
    pub population: usize,
    pub land_population: usize,
    pub stages: StageCounts,
    pub averages: TraitAverages,
    pub average_energy: f64,
    pub max_generation: u32,
    /// Sum of every chemical concentration in the world
    pub total_resources: f64,
}

impl EvolutionStats {
    pub fn is_extinct(&self) -> bool {
        self.population == 0
    }
}

/// Snapshot of the meadow after a day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeadowStats {
    pub day: u64,
    pub population: usize,
    pub food_count: usize,
    pub average_metabolism: f64,
    pub average_energy: f64,
}

/// Notable moments in the ocean-to-land transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Milestone {
    AirBreathing,
    LandColonised,
    Photosynthesis,
    TerrestrialDominance,
}

impl Milestone {
    /// Check the statistics of `day` for a milestone. At most one is reported per day.
    pub fn detect(day: u64, stats: &EvolutionStats) -> Option<Milestone> {
        if stats.is_extinct() {
            return None;
        }

        if day == 50 && stats.averages.air_breathing > 0.1 {
            Some(Milestone::AirBreathing)
        } else if day == 100 && stats.land_population > 0 {
            Some(Milestone::LandColonised)
        } else if stats.averages.photosynthesis > 0.3 {
            Some(Milestone::Photosynthesis)
        } else if stats.stages.terrestrial > 5 {
            Some(Milestone::TerrestrialDominance)
        } else {
            None
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Milestone::AirBreathing => "BREAKTHROUGH: first organisms developing air breathing",
            Milestone::LandColonised => "HISTORIC MOMENT: first life colonises land",
            Milestone::Photosynthesis => "PHOTOSYNTHESIS: solar-powered life emerges",
            Milestone::TerrestrialDominance => {
                "TERRESTRIAL DOMINANCE: complex land ecosystems forming"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits_with(air: f64, photo: f64) -> Traits {
        Traits {
            air_breathing: air,
            photosynthesis: photo,
            ..Default::default()
        }
    }

    #[test]
    fn test_stage_counts() {
        let mut counts = StageCounts::default();
        counts.record(EvolutionaryStage::Tidal);
        counts.record(EvolutionaryStage::Tidal);
        counts.record(EvolutionaryStage::Terrestrial);

        assert_eq!(counts.get(EvolutionaryStage::Tidal), 2);
        assert_eq!(counts.get(EvolutionaryStage::Primordial), 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_trait_averages() {
        let traits = vec![traits_with(0.2, 0.0), traits_with(0.4, 0.6), traits_with(0.9, 0.3)];
        let averages = TraitAverages::from_traits(&traits);

        assert!((averages.air_breathing - 0.5).abs() < 1e-12);
        assert!((averages.photosynthesis - 0.3).abs() < 1e-12);
        assert!((averages.metabolism_rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_trait_averages_empty() {
        let averages = TraitAverages::from_traits(std::iter::empty());
        assert_eq!(averages, TraitAverages::default());
    }

    #[test]
    fn test_milestones() {
        let mut stats = EvolutionStats {
            population: 10,
            ..Default::default()
        };
        assert_eq!(Milestone::detect(50, &stats), None);

        stats.averages.air_breathing = 0.2;
        assert_eq!(Milestone::detect(50, &stats), Some(Milestone::AirBreathing));
        assert_eq!(Milestone::detect(51, &stats), None);

        stats.land_population = 1;
        assert_eq!(Milestone::detect(100, &stats), Some(Milestone::LandColonised));

        stats.stages.terrestrial = 6;
        assert_eq!(Milestone::detect(120, &stats), Some(Milestone::TerrestrialDominance));

        stats.averages.photosynthesis = 0.4;
        assert_eq!(Milestone::detect(120, &stats), Some(Milestone::Photosynthesis));
    }

    #[test]
    fn test_no_milestone_after_extinction() {
        let stats = EvolutionStats {
            averages: TraitAverages {
                photosynthesis: 0.9,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(Milestone::detect(10, &stats), None);
    }
}

//! Running an ecosystem over many days and collecting its history.

use crate::meadow::Meadow;
use crate::simulation::World;
use serde::{Deserialize, Serialize};
use tidepool_core::{EvolutionStats, MeadowStats};
use tracing::{info, instrument};

/// Upper bound on the history entries reserved before a run starts
const HISTORY_RESERVE: u64 = 4096;

/// A simulation that advances in discrete days and reports aggregate statistics
pub trait Ecosystem {
    type Stats: Clone + Serialize;

    fn update(&mut self);
    fn day(&self) -> u64;
    fn population_len(&self) -> usize;
    fn statistics(&self) -> Self::Stats;

    fn is_extinct(&self) -> bool {
        self.population_len() == 0
    }
}

impl Ecosystem for World {
    type Stats = EvolutionStats;

    fn update(&mut self) {
        World::update(self)
    }

    fn day(&self) -> u64 {
        World::day(self)
    }

    fn population_len(&self) -> usize {
        self.organisms().len()
    }

    fn statistics(&self) -> EvolutionStats {
        World::statistics(self)
    }
}

impl Ecosystem for Meadow {
    type Stats = MeadowStats;

    fn update(&mut self) {
        Meadow::update(self)
    }

    fn day(&self) -> u64 {
        Meadow::day(self)
    }

    fn population_len(&self) -> usize {
        self.foragers().len()
    }

    fn statistics(&self) -> MeadowStats {
        Meadow::statistics(self)
    }
}

/// Outcome of a run: the per-day statistics from day 0 to the last day reached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport<S> {
    pub days_requested: u64,
    pub days_run: u64,
    /// Day on which the population was first found empty
    pub extinct_on: Option<u64>,
    pub history: Vec<S>,
}

impl<S> RunReport<S> {
    pub fn went_extinct(&self) -> bool {
        self.extinct_on.is_some()
    }
}

/// Advance `ecosystem` by up to `days` days.
///
/// `on_day` sees the ecosystem and its statistics before every update and
/// once more at the end. The run stops early once the population is empty.
#[instrument(skip(ecosystem, on_day))]
pub fn run<E, F>(ecosystem: &mut E, days: u64, mut on_day: F) -> RunReport<E::Stats>
where
    E: Ecosystem,
    F: FnMut(&E, &E::Stats),
{
    let start_day = ecosystem.day();
    let mut history = Vec::with_capacity(days.min(HISTORY_RESERVE) as usize + 1);
    let mut extinct_on = None;

    for _ in 0..days {
        let stats = ecosystem.statistics();
        on_day(ecosystem, &stats);
        history.push(stats);

        if ecosystem.is_extinct() {
            extinct_on = Some(ecosystem.day());
            break;
        }

        ecosystem.update();
    }

    if extinct_on.is_none() {
        let stats = ecosystem.statistics();
        on_day(ecosystem, &stats);
        history.push(stats);
        if ecosystem.is_extinct() {
            extinct_on = Some(ecosystem.day());
        }
    }

    let days_run = ecosystem.day() - start_day;
    info!(
        days_requested = days,
        days_run,
        extinct = extinct_on.is_some(),
        final_population = ecosystem.population_len(),
        "Run complete"
    );

    RunReport {
        days_requested: days,
        days_run,
        extinct_on,
        history,
    }
}

#![deny(warnings)]

//! Daily-task engine: scenario subset selection and choice resolution.
//!
//! At the start of a game the 12-scenario pool is shuffled uniformly and
//! the first [`MAX_DAYS`] entries are persisted as that game's daily
//! tasks, indexed by day. Resolving a choice applies the option's fixed
//! RM effect to the balance and appends a history row.

use persistence::{KvStore, SaveGame};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use sim_core::{GameState, Record, Scenario, ScenarioOption, MAX_DAYS};
use thiserror::Error;
use tracing::info;

/// Errors produced when looking up or resolving a daily task.
#[derive(Debug, Error, PartialEq)]
pub enum EventError {
    /// No scenario indexed for the day; the game is complete.
    #[error("no scenario for day {0}")]
    NoScenarioForDay(u32),
    /// Option index outside the fixed 0..=2 range.
    #[error("option index {0} is out of range 0..=2")]
    InvalidOption(usize),
}

/// The game's 7-scenario subset, selecting and persisting one on first
/// access. Subsequent calls return the stored subset unchanged.
///
/// Selection is a uniform Fisher-Yates shuffle of the full pool.
pub fn scenarios_for_game<S: KvStore>(
    save: &mut SaveGame<S>,
    rng: &mut impl Rng,
) -> Vec<Scenario> {
    if let Some(chosen) = save.load_scenarios() {
        return chosen;
    }
    let mut pool = sim_core::scenario_pool();
    pool.shuffle(rng);
    pool.truncate(MAX_DAYS as usize);
    save.store_scenarios(&pool);
    info!(count = pool.len(), "selected scenario subset for this game");
    pool
}

/// Scenario assigned to `day`, 1-based.
pub fn scenario_for_day(chosen: &[Scenario], day: u32) -> Result<&Scenario, EventError> {
    if day == 0 || day > MAX_DAYS {
        return Err(EventError::NoScenarioForDay(day));
    }
    chosen
        .get(day as usize - 1)
        .ok_or(EventError::NoScenarioForDay(day))
}

/// Apply the chosen option of `scenario` to the game state.
///
/// The effect is added to the balance unconditionally; there is no floor,
/// so a balance may go negative. Appends one history row and one series
/// point. Persistence is the caller's job.
pub fn apply_choice<'a>(
    state: &mut GameState,
    scenario: &'a Scenario,
    option_index: usize,
) -> Result<&'a ScenarioOption, EventError> {
    let option = scenario
        .options
        .get(option_index)
        .ok_or(EventError::InvalidOption(option_index))?;
    state.balance += Decimal::from(option.effect);
    state.push_settlement(Record::Event {
        day: state.day,
        scenario: scenario.text.clone(),
        amount: Decimal::from(option.effect),
    });
    info!(
        day = state.day,
        option = option_index,
        effect = option.effect,
        balance = %state.balance,
        "daily task resolved"
    );
    Ok(option)
}

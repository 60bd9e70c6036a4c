#![deny(warnings)]

//! Game runtime: day progression, reset, summaries, and the [`Game`]
//! session facade that wires the store, the rate generator, the trade
//! engine, and the daily-task engine together.
//!
//! A session owns the save store and the RNG; every mutating operation
//! runs to completion and persists before returning, so a session can be
//! dropped and reloaded from the same store at any point.

use persistence::{KvStore, SaveGame};
use rand::Rng;
use rust_decimal::Decimal;
use sim_core::{
    Catalog, Country, Direction, GameState, RateSnapshot, Record, Scenario, ScenarioOption,
    MAX_DAYS,
};
use sim_econ::{Quote, TradeError};
use sim_events::EventError;
use tracing::info;

/// Where the game goes after a daily task is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextState {
    /// Continue trading on the new day.
    DayAdvanced(u32),
    /// The final day's task was resolved; route to the summary.
    GameComplete,
}

/// Advance the day counter after a resolved daily task.
///
/// On the final day the counter stays put and the game is complete;
/// trades never call this.
pub fn advance_day(state: &mut GameState) -> NextState {
    if state.day >= MAX_DAYS {
        return NextState::GameComplete;
    }
    state.day += 1;
    NextState::DayAdvanced(state.day)
}

/// End-of-game verdict relative to the starting balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Profit,
    Loss,
    BrokeEven,
}

/// Final figures for the results view.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub final_balance: Decimal,
    pub net_change: Decimal,
    pub outcome: Outcome,
}

/// Summarize a game against the starting balance.
pub fn summarize(state: &GameState) -> Summary {
    let net_change = state.balance - sim_core::starting_balance();
    let outcome = if net_change > Decimal::ZERO {
        Outcome::Profit
    } else if net_change < Decimal::ZERO {
        Outcome::Loss
    } else {
        Outcome::BrokeEven
    };
    Summary {
        final_balance: state.balance,
        net_change,
        outcome,
    }
}

/// Plain label/value series for a charting widget.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartFeed {
    /// Synthetic step labels "T0".."Tn".
    pub labels: Vec<String>,
    pub values: Vec<Decimal>,
}

/// Balance-over-time series with synthetic step labels.
pub fn chart_feed(state: &GameState) -> ChartFeed {
    ChartFeed {
        labels: (0..state.balance_over_time.len())
            .map(|i| format!("T{i}"))
            .collect(),
        values: state.balance_over_time.clone(),
    }
}

/// One interactive game session over a save store.
#[derive(Debug)]
pub struct Game<S, R> {
    save: SaveGame<S>,
    rng: R,
    catalog: Catalog,
    state: GameState,
}

impl<S: KvStore, R: Rng> Game<S, R> {
    /// Load a session from the store, lazily defaulting missing state and
    /// making sure the current day has a rate snapshot.
    pub fn load(store: S, rng: R) -> Self {
        let save = SaveGame::new(store);
        let state = save.load_state();
        let mut game = Self {
            save,
            rng,
            catalog: Catalog::default(),
            state,
        };
        sim_econ::rates_for_day(&mut game.save, game.state.day, &mut game.rng);
        game
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn save(&self) -> &SaveGame<S> {
        &self.save
    }

    pub fn day(&self) -> u32 {
        self.state.day
    }

    pub fn balance(&self) -> Decimal {
        self.state.balance
    }

    /// Whether the final day's task has been resolved.
    ///
    /// The day counter stops at [`MAX_DAYS`], so completion is derived
    /// from the history rather than from the counter.
    pub fn is_complete(&self) -> bool {
        self.state
            .history
            .iter()
            .any(|r| matches!(r, Record::Event { day, .. } if *day == MAX_DAYS))
    }

    /// Today's rate snapshot, generating one on first access.
    pub fn rates(&mut self) -> RateSnapshot {
        sim_econ::rates_for_day(&mut self.save, self.state.day, &mut self.rng)
    }

    /// Price a trade against today's snapshot without settling it.
    pub fn quote(
        &mut self,
        direction: Direction,
        item: &str,
        country: Country,
        quantity: u32,
    ) -> Result<Quote, TradeError> {
        let snapshot = self.rates();
        sim_econ::quote(&self.catalog, &snapshot, direction, item, country, quantity)
    }

    /// Settle a trade and persist the updated state. The day is unchanged;
    /// any number of trades may settle within one day.
    pub fn trade(
        &mut self,
        direction: Direction,
        item: &str,
        country: Country,
        quantity: u32,
    ) -> Result<Quote, TradeError> {
        let snapshot = self.rates();
        let quote = sim_econ::settle(
            &mut self.state,
            &self.catalog,
            &snapshot,
            direction,
            item,
            country,
            quantity,
        )?;
        self.save.save_state(&self.state);
        Ok(quote)
    }

    /// The scenario for the current day, selecting the per-game subset on
    /// first access. Fails with [`EventError::NoScenarioForDay`] once the
    /// game is complete, which signals summary routing.
    pub fn daily_scenario(&mut self) -> Result<Scenario, EventError> {
        if self.is_complete() {
            return Err(EventError::NoScenarioForDay(self.state.day));
        }
        let chosen = sim_events::scenarios_for_game(&mut self.save, &mut self.rng);
        sim_events::scenario_for_day(&chosen, self.state.day).cloned()
    }

    /// Resolve today's task with the chosen option, persist, and advance.
    ///
    /// On a non-final day this also seeds the next day's rate snapshot so
    /// the following trading view prices consistently.
    pub fn resolve_event(
        &mut self,
        option_index: usize,
    ) -> Result<(ScenarioOption, NextState), EventError> {
        let scenario = self.daily_scenario()?;
        let option = sim_events::apply_choice(&mut self.state, &scenario, option_index)?.clone();
        self.save.save_state(&self.state);
        let next = advance_day(&mut self.state);
        match next {
            NextState::DayAdvanced(day) => {
                self.save.save_state(&self.state);
                sim_econ::rates_for_day(&mut self.save, day, &mut self.rng);
                info!(day, "advanced to next day");
            }
            NextState::GameComplete => {
                info!(balance = %self.state.balance, "game complete");
            }
        }
        Ok((option, next))
    }

    /// Wipe the save and start over: day 1, default balance, fresh day-1
    /// rates. The scenario subset is left unseeded and re-selected lazily
    /// on the next daily-task access.
    pub fn reset(&mut self) {
        self.save.clear();
        self.state = GameState::new();
        sim_econ::rates_for_day(&mut self.save, 1, &mut self.rng);
        self.save.save_state(&self.state);
        info!("game reset");
    }

    /// Final figures for the results view.
    pub fn summary(&self) -> Summary {
        summarize(&self.state)
    }

    /// Balance series for the chart.
    pub fn chart(&self) -> ChartFeed {
        chart_feed(&self.state)
    }
}

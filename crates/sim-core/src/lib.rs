#![deny(warnings)]

//! Core domain models and invariants for the import/export trading trainer.
//!
//! This crate defines the serializable types shared across the simulation:
//! the game state, the item catalogs, the partner countries with their
//! exchange-rate presets, the narrative scenario pool, and validation
//! helpers to guarantee basic invariants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of in-game days per run; the game terminates after the last one.
pub const MAX_DAYS: u32 = 7;

/// Starting cash balance in RM, the home currency.
pub fn starting_balance() -> Decimal {
    Decimal::new(5000, 0)
}

/// Trade direction. Imports spend RM, exports earn RM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Import,
    Export,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Direction::Import => "import",
            Direction::Export => "export",
        })
    }
}

/// A tradable good priced in the partner country's currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Display name, unique within its catalog.
    pub name: String,
    /// Price per unit in foreign currency units (> 0).
    pub base_price: Decimal,
}

impl Item {
    fn new(name: &str, base_price: i64) -> Self {
        Self {
            name: name.to_string(),
            base_price: Decimal::new(base_price, 0),
        }
    }
}

/// The two static item lists, one per trade direction.
#[derive(Clone, Debug)]
pub struct Catalog {
    imports: Vec<Item>,
    exports: Vec<Item>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            imports: vec![
                Item::new("Electronics", 120),
                Item::new("Machinery", 350),
                Item::new("Chemicals", 45),
                Item::new("Cars", 8000),
            ],
            exports: vec![
                Item::new("Palm Oil", 80),
                Item::new("Rubber", 60),
                Item::new("Furniture", 150),
                Item::new("Rice", 40),
                Item::new("Textiles", 30),
            ],
        }
    }
}

impl Catalog {
    /// Items available for the given direction.
    pub fn items(&self, direction: Direction) -> &[Item] {
        match direction {
            Direction::Import => &self.imports,
            Direction::Export => &self.exports,
        }
    }

    /// Look up an item by name within one direction's list.
    pub fn find(&self, direction: Direction, name: &str) -> Option<&Item> {
        self.items(direction).iter().find(|i| i.name == name)
    }
}

/// Trading partner countries with fixed currencies and rate presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Country {
    China,
    India,
    Japan,
    #[serde(rename = "USA")]
    Usa,
    Germany,
}

impl Country {
    /// All partner countries, in catalog order.
    pub const ALL: [Country; 5] = [
        Country::China,
        Country::India,
        Country::Japan,
        Country::Usa,
        Country::Germany,
    ];

    /// ISO currency code for this country.
    pub fn currency(&self) -> &'static str {
        match self {
            Country::China => "CNY",
            Country::India => "INR",
            Country::Japan => "JPY",
            Country::Usa => "USD",
            Country::Germany => "EUR",
        }
    }

    /// Daily-rate preset: rate = base + U(0,1) * spread, rounded to `dp`.
    ///
    /// A rate is the number of foreign currency units equal to 1 RM.
    pub fn rate_preset(&self) -> RatePreset {
        match self {
            Country::China => RatePreset::new(1.5, 0.4, 3),
            Country::India => RatePreset::new(18.0, 2.0, 3),
            Country::Japan => RatePreset::new(33.0, 3.0, 3),
            Country::Usa => RatePreset::new(0.22, 0.03, 4),
            Country::Germany => RatePreset::new(0.19, 0.03, 4),
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Country::China => "China",
            Country::India => "India",
            Country::Japan => "Japan",
            Country::Usa => "USA",
            Country::Germany => "Germany",
        })
    }
}

/// Parameters for drawing a country's daily exchange rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatePreset {
    /// Lower bound of the rate.
    pub base: f64,
    /// Width of the uniform band above `base`.
    pub spread: f64,
    /// Decimal places the drawn rate is rounded to.
    pub dp: u32,
}

impl RatePreset {
    fn new(base: f64, spread: f64, dp: u32) -> Self {
        Self { base, spread, dp }
    }
}

/// One country's entry in a daily rate snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrencyQuote {
    /// Foreign currency units per 1 RM (> 0).
    pub rate: Decimal,
    /// ISO currency code.
    pub currency: String,
}

/// Full exchange-rate snapshot for one day, immutable once persisted.
pub type RateSnapshot = std::collections::BTreeMap<Country, CurrencyQuote>;

/// A narrative daily-task option with a fixed monetary outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOption {
    /// Button label shown to the player.
    pub label: String,
    /// Signed RM delta applied to the balance when chosen.
    pub effect: i64,
    /// Outcome message shown after choosing.
    pub message: String,
}

/// A daily-task scenario: a prompt plus exactly three options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Prompt text.
    pub text: String,
    /// The three choices, in display order.
    pub options: Vec<ScenarioOption>,
}

impl Scenario {
    fn new(text: &str, options: [(&str, i64, &str); 3]) -> Self {
        Self {
            text: text.to_string(),
            options: options
                .into_iter()
                .map(|(label, effect, message)| ScenarioOption {
                    label: label.to_string(),
                    effect,
                    message: message.to_string(),
                })
                .collect(),
        }
    }
}

/// The full pool of 12 scenarios a game draws its 7 daily tasks from.
pub fn scenario_pool() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "Local supplier raises prices for construction materials.",
            [
                (
                    "Import cheaper from Thailand",
                    200,
                    "Imported cheaper materials. Profit RM200.",
                ),
                ("Keep buying local", -100, "Paid higher local prices. Loss RM100."),
                (
                    "Negotiate with supplier",
                    50,
                    "Negotiated a small discount. Profit RM50.",
                ),
            ],
        ),
        Scenario::new(
            "Logistics strike delays shipping.",
            [
                (
                    "Pay extra for priority shipping",
                    -150,
                    "Paid priority shipping. Loss RM150.",
                ),
                ("Wait for strike to end", 0, "Waited it out. No change."),
                (
                    "Use alternative land transport",
                    -50,
                    "Alternative transport used. Loss RM50.",
                ),
            ],
        ),
        Scenario::new(
            "A company in China wants to import palm oil.",
            [
                ("Agree to discount", 100, "Sold more at lower margin. Net RM100."),
                ("Refuse and keep price", 0, "Deal cancelled. No change."),
                (
                    "Offer partial discount for big order",
                    250,
                    "Big order accepted. Profit RM250.",
                ),
            ],
        ),
        Scenario::new(
            "Japan requests high-tech components.",
            [
                ("Accept with overtime", 150, "Overtime accepted. Profit RM150."),
                ("Decline due to capacity", 0, "Declined. No change."),
                (
                    "Subcontract part of work",
                    200,
                    "Subcontracted and profited. RM200.",
                ),
            ],
        ),
        Scenario::new(
            "Exchange rate fluctuates in your favor.",
            [
                ("Buy more imports", 100, "Bought imports cheaper. Profit RM100."),
                ("Stay cautious", 0, "No action. No change."),
                (
                    "Sell reserves abroad",
                    200,
                    "Sold reserves at good rates. Profit RM200.",
                ),
            ],
        ),
        Scenario::new(
            "Government offers export incentives.",
            [
                ("Apply for subsidy", 300, "You received subsidy. Profit RM300."),
                ("Ignore paperwork", 0, "No change."),
                ("Delay application", -50, "Missed timing. Loss RM50."),
            ],
        ),
        Scenario::new(
            "Storm damages part of your shipment.",
            [
                ("File insurance claim", 100, "Insurance covered some loss. +RM100."),
                ("Absorb the loss", -200, "You paid for the loss. -RM200."),
                ("Negotiate with buyer", -50, "Partial deal made. -RM50."),
            ],
        ),
        Scenario::new(
            "Middle East buyer requests halal-certified food.",
            [
                (
                    "Upgrade certification",
                    200,
                    "Certification boosted sales. +RM200.",
                ),
                ("Refuse deal", 0, "No change."),
                (
                    "Partner with certified supplier",
                    150,
                    "Partnered and profited. +RM150.",
                ),
            ],
        ),
        Scenario::new(
            "European Union increases import taxes.",
            [
                ("Accept tax burden", -200, "Taxes reduced profit. -RM200."),
                ("Find alternative markets", 100, "Found new market. +RM100."),
                ("Negotiate trade deal", 50, "Small success. +RM50."),
            ],
        ),
        Scenario::new(
            "US company offers a long-term contract.",
            [
                ("Accept immediately", 250, "Secured contract. +RM250."),
                ("Delay decision", 0, "No change."),
                ("Reject", -50, "Lost opportunity. -RM50."),
            ],
        ),
        Scenario::new(
            "Warehouse fire damages goods.",
            [
                ("Claim insurance", 200, "Insurance payout. +RM200."),
                (
                    "Sell damaged goods cheaply",
                    -100,
                    "Recovered some cash. -RM100.",
                ),
                ("Do nothing", -250, "Major loss. -RM250."),
            ],
        ),
        Scenario::new(
            "ASEAN free trade agreement lowers tariffs.",
            [
                ("Expand exports quickly", 200, "Expanded exports. +RM200."),
                ("Wait and see", 0, "No change."),
                ("Form new partnerships", 300, "New partnerships succeed. +RM300."),
            ],
        ),
    ]
}

/// One row of the game history, in chronological append order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    /// A settled trade. `amount` is signed: negative import, positive export.
    Trade {
        day: u32,
        direction: Direction,
        item: String,
        country: Country,
        quantity: u32,
        amount: Decimal,
    },
    /// A resolved daily task. `amount` is the chosen option's effect.
    Event {
        day: u32,
        scenario: String,
        amount: Decimal,
    },
}

impl Record {
    /// Signed RM amount of this row.
    pub fn amount(&self) -> Decimal {
        match self {
            Record::Trade { amount, .. } | Record::Event { amount, .. } => *amount,
        }
    }

    /// Day the row was appended on.
    pub fn day(&self) -> u32 {
        match self {
            Record::Trade { day, .. } | Record::Event { day, .. } => *day,
        }
    }
}

/// Complete per-game state, persisted between sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Current day in [1, MAX_DAYS].
    pub day: u32,
    /// Cash balance in RM. May go negative through event effects.
    pub balance: Decimal,
    /// Append-only trade/event history.
    pub history: Vec<Record>,
    /// Balance after every settlement; element 0 is the starting balance.
    pub balance_over_time: Vec<Decimal>,
}

impl GameState {
    /// Fresh day-1 state with the default balance.
    pub fn new() -> Self {
        Self {
            day: 1,
            balance: starting_balance(),
            history: Vec::new(),
            balance_over_time: vec![starting_balance()],
        }
    }

    /// Record a settlement: push one history row and one series point.
    ///
    /// The caller mutates `balance` first; this keeps the series and the
    /// history in lockstep.
    pub fn push_settlement(&mut self, record: Record) {
        self.history.push(record);
        self.balance_over_time.push(self.balance);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Day outside [1, MAX_DAYS].
    #[error("day {0} is out of range [1, {MAX_DAYS}]")]
    DayOutOfRange(u32),
    /// The balance series must start with the starting balance.
    #[error("balance series is empty or does not start at the starting balance")]
    BadSeriesHead,
    /// Each history row appends exactly one series point.
    #[error("balance series length {series} does not match history length {history} + 1")]
    SeriesHistoryMismatch { series: usize, history: usize },
    /// The last series point must equal the current balance.
    #[error("balance series tail does not match current balance")]
    SeriesTailMismatch,
    /// A scenario must carry exactly three options.
    #[error("scenario {0:?} does not have exactly 3 options")]
    BadOptionCount(String),
}

/// Validate a game state against the series/history invariants.
pub fn validate_state(state: &GameState) -> Result<(), ValidationError> {
    if !(1..=MAX_DAYS).contains(&state.day) {
        return Err(ValidationError::DayOutOfRange(state.day));
    }
    if state.balance_over_time.first() != Some(&starting_balance()) {
        return Err(ValidationError::BadSeriesHead);
    }
    if state.balance_over_time.len() != state.history.len() + 1 {
        return Err(ValidationError::SeriesHistoryMismatch {
            series: state.balance_over_time.len(),
            history: state.history.len(),
        });
    }
    if state.balance_over_time.last() != Some(&state.balance) {
        return Err(ValidationError::SeriesTailMismatch);
    }
    Ok(())
}

/// Validate a scenario's shape (three options, non-empty text).
pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.options.len() != 3 || scenario.text.trim().is_empty() {
        return Err(ValidationError::BadOptionCount(scenario.text.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fresh_state_is_valid() {
        let state = GameState::new();
        validate_state(&state).unwrap();
        assert_eq!(state.day, 1);
        assert_eq!(state.balance, Decimal::new(5000, 0));
        assert_eq!(state.balance_over_time, vec![Decimal::new(5000, 0)]);
    }

    #[test]
    fn settlement_keeps_series_in_lockstep() {
        let mut state = GameState::new();
        state.balance += Decimal::new(200, 0);
        state.push_settlement(Record::Event {
            day: 1,
            scenario: "x".into(),
            amount: Decimal::new(200, 0),
        });
        validate_state(&state).unwrap();
        assert_eq!(state.balance_over_time.len(), 2);
        assert_eq!(state.balance_over_time[1], Decimal::new(5200, 0));
    }

    #[test]
    fn series_mismatch_is_rejected() {
        let mut state = GameState::new();
        state.balance_over_time.push(Decimal::new(4000, 0));
        assert_eq!(
            validate_state(&state),
            Err(ValidationError::SeriesHistoryMismatch { series: 2, history: 0 })
        );
    }

    #[test]
    fn day_out_of_range_is_rejected() {
        let mut state = GameState::new();
        state.day = 8;
        assert_eq!(validate_state(&state), Err(ValidationError::DayOutOfRange(8)));
        state.day = 0;
        assert_eq!(validate_state(&state), Err(ValidationError::DayOutOfRange(0)));
    }

    #[test]
    fn pool_has_twelve_distinct_scenarios() {
        let pool = scenario_pool();
        assert_eq!(pool.len(), 12);
        for s in &pool {
            validate_scenario(s).unwrap();
        }
        let mut texts: Vec<&str> = pool.iter().map(|s| s.text.as_str()).collect();
        texts.sort_unstable();
        texts.dedup();
        assert_eq!(texts.len(), 12);
    }

    #[test]
    fn catalog_lookup_respects_direction() {
        let catalog = Catalog::default();
        assert_eq!(catalog.items(Direction::Import).len(), 4);
        assert_eq!(catalog.items(Direction::Export).len(), 5);
        assert!(catalog.find(Direction::Import, "Electronics").is_some());
        assert!(catalog.find(Direction::Export, "Electronics").is_none());
        let rice = catalog.find(Direction::Export, "Rice").unwrap();
        assert_eq!(rice.base_price, Decimal::new(40, 0));
    }

    #[test]
    fn country_serde_uses_display_names() {
        let s = serde_json::to_string(&Country::Usa).unwrap();
        assert_eq!(s, "\"USA\"");
        let back: Country = serde_json::from_str("\"Germany\"").unwrap();
        assert_eq!(back, Country::Germany);
    }

    #[test]
    fn rate_snapshot_roundtrip() {
        let mut snap = RateSnapshot::new();
        for country in Country::ALL {
            snap.insert(
                country,
                CurrencyQuote {
                    rate: Decimal::new(335, 1),
                    currency: country.currency().to_string(),
                },
            );
        }
        let s = serde_json::to_string(&snap).unwrap();
        let back: RateSnapshot = serde_json::from_str(&s).unwrap();
        assert_eq!(back, snap);
        assert_eq!(back[&Country::Japan].currency, "JPY");
    }

    #[test]
    fn record_roundtrip_keeps_tag() {
        let record = Record::Trade {
            day: 3,
            direction: Direction::Import,
            item: "Cars".into(),
            country: Country::Germany,
            quantity: 2,
            amount: Decimal::new(-842105, 2),
        };
        let s = serde_json::to_string(&record).unwrap();
        assert!(s.contains("\"kind\":\"trade\""));
        let back: Record = serde_json::from_str(&s).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.day(), 3);
    }

    proptest! {
        #[test]
        fn settlements_always_validate(deltas in proptest::collection::vec(-500i64..500, 0..20)) {
            let mut state = GameState::new();
            for (i, d) in deltas.iter().enumerate() {
                state.balance += Decimal::new(*d, 0);
                state.push_settlement(Record::Event {
                    day: 1 + (i as u32) % MAX_DAYS,
                    scenario: format!("s{i}"),
                    amount: Decimal::new(*d, 0),
                });
            }
            prop_assert!(validate_state(&state).is_ok());
        }
    }
}

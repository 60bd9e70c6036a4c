#![deny(warnings)]

//! Interactive terminal front end for the trading trainer.
//!
//! Stands in for the original browser pages: the trading view, the
//! daily-task view, and the results view. All game rules live in the
//! engine crates; this binary only parses commands and prints text.

use anyhow::Result;
use persistence::JsonFileStore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use sim_core::{Country, Direction, MAX_DAYS};
use sim_runtime::{Game, NextState, Outcome};
use std::io::{BufRead, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_SAVE: &str = "./saves/game.json";

fn parse_args() -> (Option<u64>, Option<String>) {
    let mut seed: Option<u64> = None;
    let mut save: Option<String> = None;
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seed" => seed = it.next().and_then(|s| s.parse().ok()),
            "--save" => save = it.next(),
            _ => {}
        }
    }
    (seed, save)
}

fn parse_country(s: &str) -> Option<Country> {
    match s.to_ascii_lowercase().as_str() {
        "china" => Some(Country::China),
        "india" => Some(Country::India),
        "japan" => Some(Country::Japan),
        "usa" => Some(Country::Usa),
        "germany" => Some(Country::Germany),
        _ => None,
    }
}

fn rm(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("RM {rounded:.2}")
}

type Session = Game<JsonFileStore, ChaCha8Rng>;

fn print_status(game: &Session) {
    println!(
        "Day {} of {MAX_DAYS} | balance {}",
        game.day(),
        rm(game.balance())
    );
}

fn print_rates(game: &mut Session) {
    println!("Exchange rates for day {}:", game.day());
    for (country, fx) in game.rates() {
        println!("  {country:<8} 1 RM = {} {}", fx.rate, fx.currency);
    }
}

fn print_items(game: &Session) {
    for direction in [Direction::Import, Direction::Export] {
        println!("{direction} items (price in partner currency):");
        for item in game.catalog().items(direction) {
            println!("  {:<12} {}", item.name, item.base_price);
        }
    }
}

fn print_history(game: &Session) {
    if game.state().history.is_empty() {
        println!("No history yet.");
        return;
    }
    for record in &game.state().history {
        match record {
            sim_core::Record::Trade {
                day,
                direction,
                item,
                country,
                quantity,
                amount,
            } => println!("  day {day}: {direction} {quantity} x {item} ({country})  {}", rm(*amount)),
            sim_core::Record::Event { day, scenario, amount } => {
                println!("  day {day}: task \"{scenario}\"  {}", rm(*amount))
            }
        }
    }
}

fn print_task(game: &mut Session) {
    match game.daily_scenario() {
        Ok(scenario) => {
            println!("Day {} task: {}", game.day(), scenario.text);
            for (i, option) in scenario.options.iter().enumerate() {
                println!("  {}. {}", i + 1, option.label);
            }
            println!("Resolve with: choose <1-3>");
        }
        Err(err) => {
            println!("{err} - the game is over, see `results`.");
        }
    }
}

fn print_results(game: &Session) {
    let summary = game.summary();
    println!("Final balance: {}", rm(summary.final_balance));
    let verdict = match summary.outcome {
        Outcome::Profit => "Profit",
        Outcome::Loss => "Loss",
        Outcome::BrokeEven => "Broke even",
    };
    println!("{verdict}: {}", rm(summary.net_change));
    print_history(game);
    let feed = game.chart();
    println!("Balance over time:");
    for (label, value) in feed.labels.iter().zip(&feed.values) {
        println!("  {label:<4} {}", rm(*value));
    }
}

fn run_trade(game: &mut Session, direction: Direction, args: &[&str]) {
    if args.len() < 3 {
        println!("Usage: {direction} <item> <country> <quantity>");
        return;
    }
    let quantity = match args[args.len() - 1].parse::<u32>() {
        Ok(q) => q,
        Err(_) => {
            println!("Enter a valid quantity.");
            return;
        }
    };
    let Some(country) = parse_country(args[args.len() - 2]) else {
        println!("Unknown country: {}", args[args.len() - 2]);
        return;
    };
    let item = args[..args.len() - 2].join(" ");
    match game.trade(direction, &item, country, quantity) {
        Ok(quote) => {
            println!(
                "{quantity} x {item} = {} {} = {}",
                quote.foreign_total,
                quote.currency,
                rm(quote.converted)
            );
            print_status(game);
        }
        Err(err) => println!("{err}"),
    }
}

fn run_choice(game: &mut Session, args: &[&str]) {
    let Some(choice) = args.first().and_then(|s| s.parse::<usize>().ok()) else {
        println!("Usage: choose <1-3>");
        return;
    };
    if choice == 0 {
        println!("Usage: choose <1-3>");
        return;
    }
    match game.resolve_event(choice - 1) {
        Ok((option, next)) => {
            println!("{} ({:+} RM)", option.message, option.effect);
            match next {
                NextState::DayAdvanced(day) => {
                    println!("--- Day {day} ---");
                    print_status(game);
                }
                NextState::GameComplete => {
                    println!("=== Game complete ===");
                    print_results(game);
                }
            }
        }
        Err(err) => println!("{err}"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  status                         day and balance");
    println!("  rates                          today's exchange rates");
    println!("  items                          item catalogs");
    println!("  quote <dir> <item> <country> <qty>   price a trade");
    println!("  import <item> <country> <qty>  buy foreign goods");
    println!("  export <item> <country> <qty>  sell goods abroad");
    println!("  task                           show today's scenario");
    println!("  choose <1-3>                   resolve the scenario");
    println!("  history                        all trades and tasks");
    println!("  results                        summary and balance chart");
    println!("  reset                          start a new game");
    println!("  quit");
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (seed, save) = parse_args();
    let path = save.unwrap_or_else(|| DEFAULT_SAVE.to_string());
    let rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    info!(?seed, %path, "starting session");

    let store = JsonFileStore::open(&path)?;
    let mut game = Game::load(store, rng);

    println!("Import/Export Trading Trainer");
    if game.is_complete() {
        println!("This save is finished. `results` to review, `reset` to start over.");
    } else {
        print_status(&game);
    }
    println!("Type `help` for commands.");

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = tokens.split_first() else {
            continue;
        };
        match command {
            "help" => print_help(),
            "status" => print_status(&game),
            "rates" => print_rates(&mut game),
            "items" => print_items(&game),
            "history" => print_history(&game),
            "task" => print_task(&mut game),
            "choose" => run_choice(&mut game, args),
            "import" => run_trade(&mut game, Direction::Import, args),
            "export" => run_trade(&mut game, Direction::Export, args),
            "quote" => match args.split_first() {
                Some((&"import", rest)) => run_quote(&mut game, Direction::Import, rest),
                Some((&"export", rest)) => run_quote(&mut game, Direction::Export, rest),
                _ => println!("Usage: quote import|export <item> <country> <qty>"),
            },
            "results" | "summary" => print_results(&game),
            "reset" => {
                game.reset();
                println!("New game started. Good luck!");
                print_status(&game);
            }
            "quit" | "exit" => break,
            other => println!("Unknown command: {other} (try `help`)"),
        }
    }
    Ok(())
}

fn run_quote(game: &mut Session, direction: Direction, args: &[&str]) {
    if args.len() < 3 {
        println!("Usage: quote {direction} <item> <country> <qty>");
        return;
    }
    let quantity = match args[args.len() - 1].parse::<u32>() {
        Ok(q) => q,
        Err(_) => {
            println!("Enter a valid quantity.");
            return;
        }
    };
    let Some(country) = parse_country(args[args.len() - 2]) else {
        println!("Unknown country: {}", args[args.len() - 2]);
        return;
    };
    let item = args[..args.len() - 2].join(" ");
    match game.quote(direction, &item, country, quantity) {
        Ok(quote) => println!(
            "{quantity} x {item} = {} {} = {} (not settled)",
            quote.foreign_total,
            quote.currency,
            rm(quote.converted)
        ),
        Err(err) => println!("{err}"),
    }
}

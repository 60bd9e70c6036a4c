use criterion::{criterion_group, criterion_main, Criterion};
use persistence::MemoryStore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::{Country, Direction, MAX_DAYS};
use sim_runtime::Game;

fn bench_full_game(c: &mut Criterion) {
    c.bench_function("full_game_7_days", |b| {
        b.iter(|| {
            let mut game = Game::load(MemoryStore::new(), ChaCha8Rng::seed_from_u64(42));
            for day in 1..=MAX_DAYS {
                game.trade(Direction::Export, "Palm Oil", Country::China, 3)
                    .unwrap();
                game.trade(Direction::Import, "Chemicals", Country::India, 2)
                    .unwrap();
                let _ = game.resolve_event((day as usize) % 3).unwrap();
            }
            game.summary()
        })
    });
}

criterion_group!(benches, bench_full_game);
criterion_main!(benches);

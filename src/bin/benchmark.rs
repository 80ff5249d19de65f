//! Performance benchmark for the rule engines

use std::time::Instant;

use automata_engine::domain::{HrotRule, LifeRule, Neighbourhood};
use automata_engine::{EdgePolicy, Engine, RuleKind};
use tracing_subscriber::EnvFilter;

fn benchmark_life(size: usize, generations: u32) -> f64 {
    let mut engine = Engine::new(size, size, RuleKind::life(&LifeRule::conway()), EdgePolicy::Plane);
    engine.randomize();

    let start = Instant::now();
    for _ in 0..generations {
        engine.step();
    }
    start.elapsed().as_secs_f64() * 1000.0 / generations as f64
}

fn benchmark_hrot_moore(size: usize, range: i32, generations: u32) -> f64 {
    let rule = HrotRule::new(range, Neighbourhood::Moore, &[6, 7], &[5, 6, 7, 8]).unwrap();
    let mut engine = Engine::new(size, size, RuleKind::Hrot { rule, states: None }, EdgePolicy::Plane);
    engine.randomize();

    let start = Instant::now();
    for _ in 0..generations {
        engine.step();
    }
    start.elapsed().as_secs_f64() * 1000.0 / generations as f64
}

fn benchmark_hrot_shape(size: usize, range: i32, generations: u32) -> f64 {
    let rule = HrotRule::new(range, Neighbourhood::Cross, &[2], &[2, 3]).unwrap();
    let mut engine = Engine::new(size, size, RuleKind::Hrot { rule, states: None }, EdgePolicy::Plane);
    engine.randomize();

    let start = Instant::now();
    for _ in 0..generations {
        engine.step();
    }
    start.elapsed().as_secs_f64() * 1000.0 / generations as f64
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Automata Engine Benchmark ===\n");

    let sizes = [256, 512, 1024, 2048];
    let generations = 50;

    println!(
        "{:>10} {:>12} {:>14} {:>14}",
        "Size", "Life", "HROT Moore R2", "HROT Cross R3"
    );
    println!("{:-<54}", "");

    for size in sizes {
        let life_ms = benchmark_life(size, generations);
        let moore_ms = benchmark_hrot_moore(size, 2, generations);
        let cross_ms = benchmark_hrot_shape(size, 3, generations);

        println!(
            "{:>10} {:>10.2}ms {:>12.2}ms {:>12.2}ms",
            format!("{}x{}", size, size),
            life_ms,
            moore_ms,
            cross_ms
        );
    }

    println!("\n=== Throughput at 1024x1024 ===\n");
    let cells = 1024 * 1024;
    let life_ms = benchmark_life(1024, generations);
    println!(
        "Life: {:.2} ms/gen, {:.1}M cells/sec",
        life_ms,
        cells as f64 / (life_ms / 1000.0) / 1_000_000.0
    );
}

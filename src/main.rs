use clap::{App, Arg, ArgMatches};
use deepbrot::output::{self, GridSummary};
use deepbrot::{Config, RenderError, Renderer};
use log::info;
use std::str::FromStr;

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_number<T: FromStr>(s: &str, err: &str) -> Result<(), String> {
    match T::from_str(s) {
        Ok(_) => Ok(()),
        Err(_) => Err(err.to_string()),
    }
}

const OUTPUT: &str = "output";
const REDUCED: &str = "reduced";
const SIDE: &str = "side";
const THREADS: &str = "threads";
const SEEDS: &str = "seeds";
const BATCH: &str = "batch";
const MIN: &str = "min";
const MAX: &str = "max";
const CELLS: &str = "cells";
const TRIALS: &str = "trials";
const CELL_ITERATIONS: &str = "cell-iterations";
const RNG_SEED: &str = "rng-seed";
const MAX_REJECTIONS: &str = "max-rejections";
const CHECK: &str = "check";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get() * 4;

    App::new("deepbrot")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Long-orbit Buddhabrot density grid generator")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file for the raw grid of little-endian u64 counters"),
        )
        .arg(
            Arg::with_name(REDUCED)
                .long(REDUCED)
                .help("Start from the small, quick configuration instead of the full one"),
        )
        .arg(
            Arg::with_name(SIDE)
                .long(SIDE)
                .short("s")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        100_000,
                        "Could not parse image side",
                        "Image side must be between 1 and 100000",
                    )
                })
                .help("Width and height of the output grid, in pixels"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of worker threads (default: one per CPU)"),
        )
        .arg(
            Arg::with_name(SEEDS)
                .long(SEEDS)
                .short("n")
                .takes_value(true)
                .validator(|s| validate_number::<u64>(&s, "Could not parse seed budget"))
                .help("Total number of seeds to trace"),
        )
        .arg(
            Arg::with_name(BATCH)
                .long(BATCH)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        usize::max_value(),
                        "Could not parse batch size",
                        "Batch size must be at least 1",
                    )
                })
                .help("Seeds drawn per trip to the shared generator"),
        )
        .arg(
            Arg::with_name(MIN)
                .long(MIN)
                .takes_value(true)
                .validator(|s| validate_number::<usize>(&s, "Could not parse minimum orbit length"))
                .help("Orbits this short or shorter are discarded"),
        )
        .arg(
            Arg::with_name(MAX)
                .long(MAX)
                .takes_value(true)
                .validator(|s| validate_number::<usize>(&s, "Could not parse iteration cap"))
                .help("Iteration cap per orbit"),
        )
        .arg(
            Arg::with_name(CELLS)
                .long(CELLS)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        10_000,
                        "Could not parse cell count",
                        "Cells per side must be between 1 and 10000",
                    )
                })
                .help("Width and height of the sampling grid, in cells"),
        )
        .arg(
            Arg::with_name(TRIALS)
                .long(TRIALS)
                .takes_value(true)
                .validator(|s| validate_number::<usize>(&s, "Could not parse trial count"))
                .help("Trial points sampled per cell"),
        )
        .arg(
            Arg::with_name(CELL_ITERATIONS)
                .long(CELL_ITERATIONS)
                .takes_value(true)
                .validator(|s| validate_number::<usize>(&s, "Could not parse cell iterations"))
                .help("Iterations per trial point when classifying cells"),
        )
        .arg(
            Arg::with_name(RNG_SEED)
                .long(RNG_SEED)
                .takes_value(true)
                .validator(|s| validate_number::<u64>(&s, "Could not parse random seed"))
                .help("Fix the random stream, for reproducible runs"),
        )
        .arg(
            Arg::with_name(MAX_REJECTIONS)
                .long(MAX_REJECTIONS)
                .takes_value(true)
                .validator(|s| validate_number::<u64>(&s, "Could not parse rejection cap"))
                .help("Give up after this many consecutive rejected seed draws"),
        )
        .arg(
            Arg::with_name(CHECK)
                .long(CHECK)
                .help("Read the written grid back and print a summary of it"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Option<T> {
    matches.value_of(name).and_then(|s| T::from_str(s).ok())
}

fn configure(matches: &ArgMatches) -> Config {
    let mut config = if matches.is_present(REDUCED) {
        Config::reduced()
    } else {
        Config {
            threads: num_cpus::get(),
            ..Config::default()
        }
    };
    if let Some(side) = value(matches, SIDE) {
        config.side = side;
    }
    if let Some(threads) = value(matches, THREADS) {
        config.threads = threads;
    }
    if let Some(seeds) = value(matches, SEEDS) {
        config.seed_budget = seeds;
    }
    if let Some(batch) = value(matches, BATCH) {
        config.batch_size = batch;
    }
    if let Some(min) = value(matches, MIN) {
        config.min_iterations = min;
    }
    if let Some(max) = value(matches, MAX) {
        config.max_iterations = max;
    }
    if let Some(cells) = value(matches, CELLS) {
        config.cells_per_side = cells;
    }
    if let Some(trials) = value(matches, TRIALS) {
        config.cell_trials = trials;
    }
    if let Some(iterations) = value(matches, CELL_ITERATIONS) {
        config.cell_iterations = iterations;
    }
    config.rng_seed = value(matches, RNG_SEED);
    config.max_rejections = value(matches, MAX_REJECTIONS);
    config
}

fn check(outfile: &str, side: usize) -> Result<(), RenderError> {
    let summary = GridSummary::of(&output::load(outfile, side)?);
    info!(
        "{} holds {} counters, {} visits, peak {}",
        outfile, summary.counters, summary.total, summary.max
    );
    println!(
        "counters: {} total: {} max: {}",
        summary.counters, summary.total, summary.max
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = args();
    let config = configure(&matches);
    let side = config.side;
    let outfile = matches.value_of(OUTPUT).unwrap().to_string();

    let result = Renderer::new(config)
        .and_then(|renderer| renderer.run())
        .and_then(|render| output::save(&render.histogram, &outfile))
        .and_then(|_| {
            if matches.is_present(CHECK) {
                check(&outfile, side)
            } else {
                Ok(())
            }
        });

    if let Err(e) = result {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}

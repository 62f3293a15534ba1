//! Main CLI for gmcmc.
use mimalloc::MiMalloc;
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use anyhow::{bail, Context, Result};
use clap::{value_t, App, Arg, ArgMatches};
use gmcmc::config::ChainConfig;
use gmcmc::init::from_precinct_json;
use gmcmc::recom::run::{multi_chain, run_chain};
use gmcmc::stats::{Ensemble, JSONLWriter, StatsWriter, TSVWriter};
use serde_json::json;
use sha3::{Digest, Sha3_256};
use std::fs;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

/// Parses an optional numeric flag, exiting with a usage error on bad input.
fn optional_value<T: FromStr>(matches: &ArgMatches, name: &str) -> Option<T> {
    if matches.is_present(name) {
        Some(value_t!(matches.value_of(name), T).unwrap_or_else(|e| e.exit()))
    } else {
        None
    }
}

/// Rejects chain counts and writer choices that cannot be honored together.
/// Several chains only print summaries, so per-round writers need one chain.
fn check_output(n_chains: usize, writer: &str) -> Result<()> {
    if n_chains == 0 {
        bail!("--n-chains must be positive");
    }
    if n_chains > 1 && writer != "jsonl" {
        bail!(
            "--writer {} needs --n-chains 1; several chains only print summaries",
            writer
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let matches = App::new("gmcmc")
        .version("0.1.0")
        .about("ReCom ensembles for efficiency gap outlier analysis")
        .arg(
            Arg::with_name("graph_json")
                .long("graph-json")
                .takes_value(true)
                .required(true)
                .help("The path of the precinct graph (keyed by precinct id)."),
        )
        .arg(
            Arg::with_name("config_json")
                .long("config-json")
                .takes_value(true)
                .help("A JSON chain configuration file; flags override its values."),
        )
        .arg(
            Arg::with_name("cooling_rounds")
                .long("cooling-rounds")
                .takes_value(true)
                .help("The number of burn-in rounds (default 50)."),
        )
        .arg(
            Arg::with_name("sampling_rounds")
                .long("sampling-rounds")
                .takes_value(true)
                .help("The number of recorded rounds (default 200)."),
        )
        .arg(
            Arg::with_name("tol")
                .long("tol")
                .takes_value(true)
                .help("The relative population tolerance (default 0.05)."),
        )
        .arg(
            Arg::with_name("attempt_budget")
                .long("attempt-budget")
                .takes_value(true)
                .help("Failed cut attempts allowed per round (default 1000)."),
        )
        .arg(
            Arg::with_name("rng_seed")
                .long("rng-seed")
                .takes_value(true)
                .required(true)
                .help("The seed of the RNG used to draw proposals."),
        )
        .arg(
            Arg::with_name("n_chains")
                .long("n-chains")
                .takes_value(true)
                .default_value("1")
                .help("The number of independent chains (one thread each)."),
        )
        .arg(
            Arg::with_name("writer")
                .long("writer")
                .takes_value(true)
                .possible_values(&["jsonl", "jsonl-full", "tsv"])
                .default_value("jsonl")
                .help("Per-round output format. Only jsonl is allowed with --n-chains > 1, which prints summaries."),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Log chain progress to stderr."),
        )
        .get_matches();

    let mut config = match matches.value_of("config_json") {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Could not load config {}", path))?;
            ChainConfig::from_json_str(&raw)?
        }
        None => ChainConfig::default(),
    };
    if let Some(cooling_rounds) = optional_value(&matches, "cooling_rounds") {
        config.cooling_rounds = cooling_rounds;
    }
    if let Some(sampling_rounds) = optional_value(&matches, "sampling_rounds") {
        config.sampling_rounds = sampling_rounds;
    }
    if let Some(tol) = optional_value(&matches, "tol") {
        config.balance_tolerance = tol;
    }
    if let Some(attempt_budget) = optional_value(&matches, "attempt_budget") {
        config.attempt_budget = attempt_budget;
    }
    config.verbose |= matches.is_present("verbose");
    config.validate()?;

    SubscriberBuilder::default()
        .with_target(false)
        .with_writer(io::stderr)
        .with_max_level(if config.verbose { Level::INFO } else { Level::WARN })
        .init();

    let rng_seed = value_t!(matches.value_of("rng_seed"), u64).unwrap_or_else(|e| e.exit());
    let n_chains = value_t!(matches.value_of("n_chains"), usize).unwrap_or_else(|e| e.exit());
    let writer_str = matches.value_of("writer").unwrap_or("jsonl");
    check_output(n_chains, writer_str)?;
    let graph_json = fs::canonicalize(PathBuf::from(matches.value_of("graph_json").unwrap_or_default()))
        .context("Could not resolve graph path")?
        .to_string_lossy()
        .into_owned();

    let plan = from_precinct_json(&graph_json)?;

    let mut graph_file = fs::File::open(&graph_json)?;
    let mut graph_hasher = Sha3_256::new();
    io::copy(&mut graph_file, &mut graph_hasher)?;
    let graph_hash = format!("{:x}", graph_hasher.finalize());
    let meta = json!({
        "graph_path": graph_json,
        "graph_sha3": graph_hash,
        "num_nodes": plan.node_count(),
        "num_dists": plan.num_districts(),
        "rng_seed": rng_seed,
        "num_chains": n_chains,
        "config": config,
    });
    println!("{}", json!({ "meta": meta }));

    if n_chains == 1 {
        let stdout = BufWriter::new(io::stdout());
        let mut writer: Box<dyn StatsWriter> = match writer_str {
            "tsv" => Box::new(TSVWriter::new(stdout)),
            "jsonl-full" => Box::new(JSONLWriter::new(stdout, true)),
            _ => Box::new(JSONLWriter::new(stdout, false)),
        };
        run_chain(plan, config, rng_seed, writer.as_mut())?;
    } else {
        let results = multi_chain(&plan, &config, rng_seed, n_chains)?;
        let mut pooled = Ensemble::new();
        for (chain_idx, result) in results.iter().enumerate() {
            println!(
                "{}",
                json!({
                    "chain": chain_idx,
                    "rng_seed": rng_seed.wrapping_add(chain_idx as u64),
                    "summary": result.summary(),
                    "counts": result.counts,
                })
            );
            pooled.merge(result.ensemble.clone());
        }
        let baseline = &results[0].baseline;
        println!("{}", json!({ "pooled": pooled.summary(baseline) }));
    }
    Ok(())
}

#![deny(warnings)]

//! Headless CLI: runs a scenario, saves or loads its record, and estimates
//! ROAS for one media module.

use anyhow::{bail, Context, Result};
use sim_core::SimConfig;
use sim_roas::{estimate, RoasOutput, RoasRequest};
use sim_runtime::SimulationRecord;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<String>,
    record: Option<String>,
    save: Option<String>,
    seed: Option<u64>,
    roas: Option<String>,
    proportion: Option<f64>,
    min_reps: Option<usize>,
    max_secs: Option<f64>,
    threads: Option<usize>,
    carryover: bool,
    verbose: bool,
}

fn value<T: std::str::FromStr>(flag: &str, raw: Option<String>) -> Result<T> {
    let raw = raw.with_context(|| format!("{flag} needs a value"))?;
    raw.parse()
        .map_err(|_| anyhow::anyhow!("invalid value `{raw}` for {flag}"))
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => args.scenario = it.next(),
            "--record" => args.record = it.next(),
            "--save" => args.save = it.next(),
            "--seed" => args.seed = Some(value(&arg, it.next())?),
            "--roas" => args.roas = it.next(),
            "--proportion" => args.proportion = Some(value(&arg, it.next())?),
            "--min-reps" => args.min_reps = Some(value(&arg, it.next())?),
            "--max-secs" => args.max_secs = Some(value(&arg, it.next())?),
            "--threads" => args.threads = Some(value(&arg, it.next())?),
            "--carryover" => args.carryover = true,
            "--verbose" => args.verbose = true,
            other => bail!("unknown argument `{other}`"),
        }
    }
    Ok(args)
}

/// Parses `media:start:end`.
fn roas_request(target: &str, args: &Args) -> Result<RoasRequest> {
    let mut parts = target.rsplitn(3, ':');
    let (Some(end), Some(start), Some(media)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("--roas expects <media>:<start>:<end>, got `{target}`");
    };
    let mut req = RoasRequest::new(
        media,
        start.parse().context("roas window start")?,
        end.parse().context("roas window end")?,
    );
    if let Some(p) = args.proportion {
        req.budget_proportion = p;
    }
    if let Some(n) = args.min_reps {
        req.min_reps = n;
    }
    if let Some(secs) = args.max_secs {
        req.max_time = Duration::try_from_secs_f64(secs).context("--max-secs")?;
    }
    if let Some(t) = args.threads {
        req.threads = t;
    }
    req.seed = args.seed;
    req.include_carryover = args.carryover;
    req.verbose = args.verbose;
    Ok(req)
}

fn load_scenario(path: &str) -> Result<SimConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading scenario {path}"))?;
    let config: SimConfig = serde_yaml::from_str(&text).with_context(|| format!("parsing scenario {path}"))?;
    config.validate().with_context(|| format!("validating scenario {path}"))?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = parse_args()?;

    // Logging setup
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!(scenario = ?args.scenario, record = ?args.record, seed = ?args.seed, "starting CLI");

    let record: SimulationRecord = match (&args.record, &args.scenario) {
        (Some(path), _) => persistence::load_record(path)?,
        (None, Some(path)) => {
            let config = load_scenario(path)?;
            let seed = args.seed.unwrap_or(config.rng_seed);
            sim_runtime::run(&config, seed)?
        }
        (None, None) => bail!("pass --scenario <yaml> or --record <snapshot>"),
    };
    if let Some(path) = &args.save {
        persistence::save_record(path, &record)?;
    }

    let kpi = record.summary();
    println!(
        "KPI | steps: {} | spend: {:.2} | units: {:.1} | revenue: {:.2} | share: {:.1}% | warnings: {}",
        kpi.steps,
        kpi.total_spend,
        kpi.units_sold,
        kpi.revenue,
        kpi.brand_share * 100.0,
        record.warnings.len()
    );

    if let Some(target) = &args.roas {
        let request = roas_request(target, &args)?;
        match estimate(&record, &request)? {
            RoasOutput::Mean(mean) => println!("ROAS | {}: {:.4}", request.media, mean),
            RoasOutput::Report(report) => println!("{}", serde_json::to_string_pretty(&report)?),
        }
    }

    Ok(())
}

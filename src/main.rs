//! Coin Toss entry point
//!
//! Native: headless runner that tosses to completion and prints the results.
//! Web: the page drives `coin_toss::web::WasmCoinToss` directly.
//!
//! Usage: coin-toss [single | batch N | divergence N P] [params.json]

#[cfg(not(target_arch = "wasm32"))]
use coin_toss::ParameterSet;
#[cfg(not(target_arch = "wasm32"))]
use coin_toss::sim::{Orchestrator, RunEvent, RunMode, SimError, SimResult};

#[cfg(not(target_arch = "wasm32"))]
fn arg<'a>(args: &'a [String], i: usize, what: &str) -> SimResult<&'a str> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| SimError::InvalidRunMode(format!("missing {what}")))
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_mode(args: &[String]) -> SimResult<(RunMode, usize)> {
    match args.first().map(String::as_str) {
        None | Some("single") => Ok((RunMode::Single, 1)),
        Some("batch") => {
            let n = arg(args, 1, "batch size")?
                .parse::<u32>()
                .map_err(|e| SimError::InvalidRunMode(format!("batch size: {e}")))?;
            Ok((RunMode::BatchOf(n), 2))
        }
        Some("divergence") => {
            let count = arg(args, 1, "ensemble size")?
                .parse::<u32>()
                .map_err(|e| SimError::InvalidRunMode(format!("ensemble size: {e}")))?;
            let perturbation = arg(args, 2, "perturbation")?
                .parse::<f32>()
                .map_err(|e| SimError::InvalidRunMode(format!("perturbation: {e}")))?;
            Ok((
                RunMode::Divergence {
                    count,
                    perturbation,
                },
                3,
            ))
        }
        Some(other) => Err(SimError::InvalidRunMode(format!(
            "unknown mode '{other}' (expected single, batch or divergence)"
        ))),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> SimResult<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (mode, consumed) = parse_mode(&args)?;

    let params = match args.get(consumed) {
        Some(path) => {
            log::info!("Loading parameters from {path}");
            let json = std::fs::read_to_string(path)?;
            ParameterSet::from_json(&json)?
        }
        None => ParameterSet::default(),
    };
    log::info!("Parameters: {:?}", params);

    let mut orch = Orchestrator::default();
    orch.start_run(mode, params)?;
    let events = orch.run_to_completion()?;

    for event in &events {
        match event {
            RunEvent::Classified { index, outcome, .. } => {
                println!("toss {:>4}: {}", index + 1, outcome.as_str());
            }
            RunEvent::BatchComplete { summary, .. } => {
                println!(
                    "batch: {} heads, {} tails",
                    summary.heads, summary.tails
                );
            }
            RunEvent::Divergence { summary, .. } => {
                for (i, (outcome, v)) in summary
                    .outcomes
                    .iter()
                    .zip(&summary.launch_velocities)
                    .enumerate()
                {
                    println!("coin {i}: v0 = {v:.4} m/s -> {}", outcome.as_str());
                }
                println!(
                    "ensemble: {} heads, {} tails",
                    summary.heads, summary.tails
                );
            }
            RunEvent::Failed { reason, .. } => println!("run failed: {reason}"),
        }
    }

    let stats = orch.aggregate_stats();
    println!(
        "lifetime: {} tosses, {} heads ({:.1}%), {} tails ({:.1}%)",
        stats.total,
        stats.heads,
        stats.heads_ratio() * 100.0,
        stats.tails,
        stats.tails_ratio() * 100.0
    );
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Coin Toss (native) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is coin_toss::web::WasmCoinToss, this is just to satisfy the compiler
}

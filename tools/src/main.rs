//! crr-runner: headless batch runner for the card risk scoring pipeline.
//!
//! Usage:
//!   crr-runner --db card_risk.db                  (hybrid pass, default)
//!   crr-runner --db card_risk.db --mode rules     (rule scores only)
//!   crr-runner --db card_risk.db --mode summary   (print stored tiers)
//!   crr-runner --config pipeline.json --alpha 0.5 --retrain --json

use anyhow::Result;
use crr_core::{config::PipelineConfig, pipeline::ScoringPipeline, summary::TierSummary};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Rules,
    Hybrid,
    Summary,
}

impl Mode {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "rules" => Ok(Self::Rules),
            "hybrid" => Ok(Self::Hybrid),
            "summary" => Ok(Self::Summary),
            other => anyhow::bail!("Unknown mode '{other}' (expected rules, hybrid or summary)"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mode = Mode::parse(string_arg(&args, "--mode").unwrap_or("hybrid"))?;
    let json = args.iter().any(|a| a == "--json");

    let mut config = match string_arg(&args, "--config") {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(db) = string_arg(&args, "--db") {
        config.db_path = db.to_string();
    }
    if let Some(model) = string_arg(&args, "--model") {
        config.model_path = model.to_string();
    }
    if let Some(raw) = string_arg(&args, "--alpha") {
        if raw.parse::<f64>().is_err() {
            log::warn!("Ignoring unparsable --alpha '{raw}', keeping {}", config.alpha);
        }
    }
    config.alpha = parse_arg(&args, "--alpha", config.alpha);
    config.retrain |= args.iter().any(|a| a == "--retrain");

    if !json {
        println!("Card risk scoring — crr-runner");
        println!("  mode:      {mode:?}");
        println!("  db:        {}", config.db_path);
        println!("  model:     {}", config.model_path);
        println!("  alpha:     {}", config.alpha);
        println!("  retrain:   {}", config.retrain);
        println!();
    }

    let pipeline = ScoringPipeline::open(config)?;

    match mode {
        Mode::Rules | Mode::Hybrid => {
            let outcomes = if mode == Mode::Rules {
                pipeline.score_all()?
            } else {
                pipeline.run_hybrid()?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
                return Ok(());
            }
            for outcome in &outcomes {
                print!("{}", outcome.summary);
                if outcome.drifted_scores > 0 {
                    println!("  drifted cached scores corrected: {}", outcome.drifted_scores);
                }
                if let Some(report) = &outcome.reconciliation {
                    println!(
                        "  reconciliation: {} zero-filled, {} dropped",
                        report.added.len(),
                        report.dropped.len()
                    );
                }
                println!();
            }
        }
        Mode::Summary => {
            let summaries = pipeline.summarize()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                print_summaries(&summaries);
            }
        }
    }

    Ok(())
}

fn print_summaries(summaries: &[TierSummary]) {
    for s in summaries {
        print!("{s}");
        println!();
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

//! executable part of this library. read the roster configuration and the
//! assignment history, generate one month's schedule and store it as csv

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use parish_roster::{
    GenerateRequest, generate,
    csv::{fairness_to_csv, history_from_csv, schedule_to_csv},
    load_config,
};
use std::fs;

/// Parish Roster - Generate a fair monthly service schedule for a roster of
/// volunteers, jobs and rotating positions
#[derive(Parser, Debug)]
#[command(version, about = "Parish Roster - Generate a fair monthly service schedule", long_about = None)]
struct Args {
    /// file with the roster, jobs, sibling groups and weights
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// csv file with the published assignment history
    #[arg(long)]
    history: Option<String>,

    /// year of the month to plan
    #[arg(short, long)]
    year: i32,

    /// month to plan, 1 = january
    #[arg(short, long)]
    month: u32,

    /// optional display name of the schedule
    #[arg(short, long)]
    name: Option<String>,

    /// filename of the schedule csv to generate
    #[arg(short, long, default_value = "schedule.csv")]
    out: String,

    /// optional filename for the per-person fairness summary
    #[arg(long)]
    fairness_out: Option<String>,

    /// log every slot decision
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("parish_roster=debug,info")
    } else {
        EnvFilter::new("parish_roster=info")
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let config = load_config(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config))?;
    let history = match &args.history {
        Some(path) => {
            history_from_csv(path).with_context(|| format!("loading history from {path}"))?
        }
        None => Vec::new(),
    };

    let request = GenerateRequest {
        year: args.year,
        month: args.month,
        name: args.name,
    };
    let preview = generate(&config, &history, &request)?;

    for conflict in &preview.conflicts {
        warn!("{conflict}");
    }

    fs::write(&args.out, schedule_to_csv(&preview.schedule, &config)?)
        .with_context(|| format!("could not store schedule to {}", args.out))?;
    info!("stored schedule to {}", args.out);

    if let Some(path) = &args.fairness_out {
        fs::write(path, fairness_to_csv(&preview.fairness)?)
            .with_context(|| format!("could not store fairness summary to {path}"))?;
        info!("stored fairness summary to {path}");
    }

    Ok(())
}

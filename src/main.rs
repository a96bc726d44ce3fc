use std::path::PathBuf;

use anyhow::{bail, Context};
use chassiscut::{init_logging_with, parse_profiles, plan_profiles, PlannerSettings};
use tracing::{info, warn};

const USAGE: &str = "usage: chassiscut <profiles.json> [--config <settings.toml|settings.json>]";

struct Args {
    profiles: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut profiles = None;
    let mut config = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("chassiscut {} ({})", chassiscut::VERSION, chassiscut::BUILD_STAMP);
                std::process::exit(0);
            }
            _ if profiles.is_none() => profiles = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument '{}'\n{}", arg, USAGE),
        }
    }
    Ok(Args {
        profiles: profiles.context(USAGE)?,
        config,
    })
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    let settings = match &args.config {
        Some(path) => PlannerSettings::load_from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => PlannerSettings::load_or_default().context("loading default settings")?,
    };
    init_logging_with(&settings.logging)?;

    let text = std::fs::read_to_string(&args.profiles)
        .with_context(|| format!("reading {}", args.profiles.display()))?;
    let inputs = parse_profiles(&text)
        .with_context(|| format!("parsing profiles in {}", args.profiles.display()))?;
    info!(count = inputs.len(), "planning profiles");

    let report = plan_profiles(inputs, settings.synthesis).context("planning profiles")?;
    if report.failures() > 0 {
        warn!(failed = report.failures(), "some profiles could not be planned");
    }

    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &report).context("writing plan")?;
    println!();
    Ok(())
}

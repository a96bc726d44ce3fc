//! # ChassisCut
//!
//! Laser-cutting toolpath planner for notches and cut-outs in formed
//! sheet-metal chassis parts.
//!
//! ## Architecture
//!
//! 1. **chassiscut-core** - geometry port, tooling segments, [`SynthesisConfig`]
//! 2. **chassiscut-toolpath** - segmentation, sequence synthesis and checks
//! 3. **chassiscut-settings** - settings files and their default location
//! 4. **chassiscut** - this crate: logging setup, plan reports and the binary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use chassiscut_core::{
    Bound3, Curve, Flange, GeometryError, GeometryPort, Kernel, Point3, SynthesisConfig,
    ToolingSegment, Vector3,
};
pub use chassiscut_settings::{LoggingSettings, PlannerSettings, SettingsError};
pub use chassiscut_toolpath::{
    Block, Direction, PlannedProfile, PlanningContext, ProfileInput, ProfileKind, ProfilePlanner,
    SectionKind, ToolpathError, ToolpathResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date stamp (set by build.rs)
pub const BUILD_STAMP: &str = env!("CHASSISCUT_BUILD_STAMP");

/// Initialize logging with default settings.
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with(&LoggingSettings::default())
}

/// Initialize logging
///
/// Sets up structured logging with:
/// - `RUST_LOG` support, falling back to the configured level
/// - target, level and line numbers on every event
/// - JSON lines when `settings.json` is set
///
/// Output goes to stderr so stdout stays free for the plan.
pub fn init_logging_with(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    if settings.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);
        registry.with(fmt_layer).try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);
        registry.with(fmt_layer).try_init()?;
    }

    Ok(())
}

/// A profile file holds either one profile or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileFile {
    Many(Vec<ProfileInput>),
    One(Box<ProfileInput>),
}

/// Parse profile JSON, accepting a single object or an array.
pub fn parse_profiles(text: &str) -> serde_json::Result<Vec<ProfileInput>> {
    Ok(match serde_json::from_str(text)? {
        ProfileFile::Many(inputs) => inputs,
        ProfileFile::One(input) => vec![*input],
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanHeader {
    pub version: String,
    pub build: String,
    pub generated_at: DateTime<Utc>,
    pub config: SynthesisConfig,
}

/// Result for one profile. Failures keep their position in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProfileOutcome {
    Planned(PlannedProfile),
    Failed { name: String, error: String },
}

impl ProfileOutcome {
    pub fn is_planned(&self) -> bool {
        matches!(self, ProfileOutcome::Planned(_))
    }
}

/// Everything written for one run of the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    pub header: PlanHeader,
    pub profiles: Vec<ProfileOutcome>,
    pub total_cut_length: f64,
}

impl PlanReport {
    pub fn failures(&self) -> usize {
        self.profiles.iter().filter(|p| !p.is_planned()).count()
    }
}

/// Plan every profile in order with the analytic kernel.
pub fn plan_profiles(
    inputs: Vec<ProfileInput>,
    config: SynthesisConfig,
) -> ToolpathResult<PlanReport> {
    let kernel = Kernel::new();
    let mut planner = ProfilePlanner::new(&kernel, config)?;
    let names: Vec<String> = inputs.iter().map(|i| i.name.clone()).collect();
    let profiles = planner
        .plan_all(inputs)
        .into_iter()
        .zip(names)
        .map(|(result, name)| match result {
            Ok(planned) => ProfileOutcome::Planned(planned),
            Err(e) => ProfileOutcome::Failed {
                name,
                error: e.to_string(),
            },
        })
        .collect();

    Ok(PlanReport {
        header: PlanHeader {
            version: VERSION.to_string(),
            build: BUILD_STAMP.to_string(),
            generated_at: Utc::now(),
            config: planner.config().clone(),
        },
        profiles,
        total_cut_length: planner.context().cut_length,
    })
}

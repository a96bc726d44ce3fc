//! # ChassisCut Settings
//!
//! Loads and saves [`PlannerSettings`]: the [`chassiscut_core::SynthesisConfig`]
//! handed to every planning call, plus logging preferences for the binary.

pub mod error;
pub mod settings;

pub use error::{SettingsError, SettingsResult};
pub use settings::{LoggingSettings, PlannerSettings};

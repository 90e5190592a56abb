//! Runtime-tunable optimizer coefficients, layered the usual way: built-in
//! defaults, an optional `quadcore.toml`, then `QUADCORE_*` environment
//! overrides.
//!
//! The regression-test defaults always use the literal constants in
//! `model::size` directly, never a loaded `OptimizerConfig` — keeping the
//! named constants reproducible regardless of what a deployment's
//! `quadcore.toml` says.

use crate::model::{FANOUT_FACTOR, NEXT_CONSTANT, QUAD_CONSTANT, UNIQUENESS_FACTOR};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// The tunable coefficients behind the optimizer's cost model, plus the
/// `Materialize` nesting cap and a default evaluation deadline.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub fanout_factor: i64,
    pub next_constant: i64,
    pub quad_constant: i64,
    pub uniqueness_factor: i64,
    pub materialize_max_depth: u32,
    /// `0` means no default deadline is applied.
    pub default_deadline_ms: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            fanout_factor: FANOUT_FACTOR,
            next_constant: NEXT_CONSTANT,
            quad_constant: QUAD_CONSTANT,
            uniqueness_factor: UNIQUENESS_FACTOR,
            materialize_max_depth: 10,
            default_deadline_ms: 0,
        }
    }
}

impl OptimizerConfig {
    /// Loads layered config: built-in defaults, an optional `quadcore.toml`
    /// in the current directory, then `QUADCORE_*` environment variables
    /// (e.g. `QUADCORE_FANOUT_FACTOR=30`).
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let built = Config::builder()
            .set_default("fanout_factor", defaults.fanout_factor)?
            .set_default("next_constant", defaults.next_constant)?
            .set_default("quad_constant", defaults.quad_constant)?
            .set_default("uniqueness_factor", defaults.uniqueness_factor)?
            .set_default("materialize_max_depth", defaults.materialize_max_depth as i64)?
            .set_default("default_deadline_ms", defaults.default_deadline_ms as i64)?
            .add_source(File::with_name("quadcore").required(false))
            .add_source(Environment::with_prefix("QUADCORE"))
            .build()?;
        built.try_deserialize()
    }

    pub fn default_deadline(&self) -> Option<Duration> {
        (self.default_deadline_ms > 0).then(|| Duration::from_millis(self.default_deadline_ms))
    }
}

//! Recognized configuration options, layered env-var-over-file:
//! `std::env::var(...)` overrides always win over whatever a TOML file set.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Restricted,
    Unrestricted,
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Restricted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tier: Tier,
    pub concurrency_restricted: usize,
    pub concurrency_unrestricted: usize,
    pub rate_window_seconds: u64,
    pub rate_window_budget: usize,
    pub ocr_timeout_seconds: u64,
    pub retry_max: u32,
    pub retry_backoff_base_seconds: u64,
    pub retry_backoff_cap_seconds: u64,
    pub match_fallback_threshold: u8,
    pub match_time_window_seconds: i64,
    pub hero_stack_tolerance: f64,
    pub other_stacks_tolerance: f64,
    pub other_stacks_min_fraction: f64,
    pub fuzzy_name_threshold: f64,
    /// Per-stage wallclock timeout; exceeding it marks the job `failed`
    /// with a stage-specific reason.
    pub stage_timeout_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tier: Tier::Restricted,
            concurrency_restricted: 1,
            concurrency_unrestricted: 10,
            rate_window_seconds: 60,
            rate_window_budget: 14,
            ocr_timeout_seconds: 30,
            retry_max: 3,
            retry_backoff_base_seconds: 1,
            retry_backoff_cap_seconds: 8,
            match_fallback_threshold: 70,
            match_time_window_seconds: 120,
            hero_stack_tolerance: 0.25,
            other_stacks_tolerance: 0.30,
            other_stacks_min_fraction: 0.5,
            fuzzy_name_threshold: 0.70,
            stage_timeout_seconds: 300,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, PipelineError> {
        toml::from_str(raw).map_err(|e| PipelineError::Config(e.to_string()))
    }

    pub fn load_from_file(path: &std::path::Path) -> Result<Self, PipelineError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Overrides fields from `GGREVEALER_*` env vars, the last word over
    /// whatever the config file set.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("GGREVEALER_TIER") {
            self.tier = match v.as_str() {
                "unrestricted" => Tier::Unrestricted,
                _ => Tier::Restricted,
            };
        }
        if let Ok(v) = std::env::var("GGREVEALER_CONCURRENCY_RESTRICTED") {
            if let Ok(n) = v.parse() {
                self.concurrency_restricted = n;
            }
        }
        if let Ok(v) = std::env::var("GGREVEALER_CONCURRENCY_UNRESTRICTED") {
            if let Ok(n) = v.parse() {
                self.concurrency_unrestricted = n;
            }
        }
        self
    }

    pub fn concurrency_limit(&self) -> usize {
        match self.tier {
            Tier::Restricted => self.concurrency_restricted,
            Tier::Unrestricted => self.concurrency_unrestricted,
        }
    }

    pub fn rate_budget(&self) -> Option<(usize, std::time::Duration)> {
        match self.tier {
            Tier::Restricted => Some((
                self.rate_window_budget,
                std::time::Duration::from_secs(self.rate_window_seconds),
            )),
            Tier::Unrestricted => None,
        }
    }
}

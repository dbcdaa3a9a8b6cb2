use crate::block::BlockSchedule;
use crate::stimuli::StimulusCatalog;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

/// Configuration surface consumed by the session engine. Owned by the
/// deployment (TOML file plus env overrides), read-only everywhere else.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Minimum seconds between trial creation and the next `next`.
    pub trial_delay: f64,
    /// Minimum seconds between a stored answer and its retry.
    pub retry_delay: f64,
    /// Enables the synthetic fast-forward capability. Never on in production.
    pub debug: bool,
    /// Endowment for the payoff-relevant decision, in currency points.
    pub endowment: f64,
    /// Target iteration count per round.
    pub num_iterations: BTreeMap<u32, u32>,
    /// (left, right) primary categories of the first administration.
    pub primary: Option<[String; 2]>,
    pub secondary: Option<[String; 2]>,
    /// (left, right) primary categories of the second administration.
    pub primary2: Option<[String; 2]>,
    pub secondary2: Option<[String; 2]>,
    /// Category name → stimulus items (words or image file names).
    pub stimuli: BTreeMap<String, Vec<String>>,
    pub gateway: GatewayConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

/// Scoring thresholds. These are the published constants; overriding them
/// is for tests only, and they apply identically to every scoring variant.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub fast_guess_secs: f64,
    pub max_latency_secs: f64,
    pub error_penalty_secs: f64,
    pub fast_guess_max_proportion: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            fast_guess_secs: 0.300,
            max_latency_secs: 10.0,
            error_penalty_secs: 0.600,
            fast_guess_max_proportion: 0.10,
        }
    }
}

impl Default for LabConfig {
    fn default() -> Self {
        // Rounds 1-7 and 8-14 are the two IAT administrations, 15-16 the
        // payoff decisions.
        let num_iterations = BTreeMap::from([
            (1, 5),
            (2, 5),
            (3, 10),
            (4, 20),
            (5, 5),
            (6, 10),
            (7, 20),
            (8, 5),
            (9, 5),
            (10, 10),
            (11, 20),
            (12, 5),
            (13, 10),
            (14, 20),
            (15, 1),
            (16, 1),
        ]);
        Self {
            trial_delay: 0.5,
            retry_delay: 0.5,
            debug: false,
            endowment: 100.0,
            num_iterations,
            primary: None,
            secondary: None,
            primary2: None,
            secondary2: None,
            stimuli: BTreeMap::new(),
            gateway: GatewayConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl LabConfig {
    /// Load config from a TOML file, falling back to defaults for missing
    /// fields. Env var overrides are applied afterwards.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: LabConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return
    /// defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SESGO_TRIAL_DELAY") {
            if let Ok(n) = v.parse() {
                self.trial_delay = n;
            }
        }
        if let Ok(v) = std::env::var("SESGO_RETRY_DELAY") {
            if let Ok(n) = v.parse() {
                self.retry_delay = n;
            }
        }
        if let Ok(v) = std::env::var("SESGO_DEBUG") {
            self.debug = matches!(v.as_str(), "1" | "true" | "yes");
        }
        if let Ok(v) = std::env::var("SESGO_GATEWAY_HOST") {
            self.gateway.host = v;
        }
        if let Ok(v) = std::env::var("SESGO_GATEWAY_PORT") {
            if let Ok(n) = v.parse() {
                self.gateway.port = n;
            }
        }
    }

    /// Configured target iteration count for a round (0 if unknown).
    pub fn num_iterations_for(&self, round: u32) -> u32 {
        self.num_iterations.get(&round).copied().unwrap_or(0)
    }

    /// Build the full block schedule from the configured category pairs.
    pub fn block_schedule(&self) -> BlockSchedule {
        let mut schedule = BlockSchedule::new();
        if let (Some(p), Some(s)) = (&self.primary, &self.secondary) {
            schedule.push_seven_block(1, (&p[0], &p[1]), (&s[0], &s[1]));
        }
        if let (Some(p), Some(s)) = (&self.primary2, &self.secondary2) {
            schedule.push_seven_block(8, (&p[0], &p[1]), (&s[0], &s[1]));
        }
        schedule
    }

    pub fn catalog(&self) -> StimulusCatalog {
        StimulusCatalog::from_map(self.stimuli.clone())
    }
}

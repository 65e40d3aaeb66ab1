//! Engine configuration.
//!
//! [`EngineConfig::default`] carries the standard knobs; [`from_env`]
//! applies `CODEJUDGE_*` environment overrides in the same style the rest
//! of the deployment surface is configured.
//!
//! [`from_env`]: EngineConfig::from_env

use std::time::Duration;

use codejudge_ast::Weights;

/// Tunable knobs for the comparison pipeline.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Reference-cache entry lifetime.
    pub cache_ttl: Duration,
    /// Entry count above which a writer triggers an eviction sweep.
    pub cache_soft_limit: usize,
    /// Deadline for one sandboxed compile or run.
    pub exec_timeout: Duration,
    /// Deadline for one IR acquisition.
    pub ir_timeout: Duration,
    /// Deadline for one secondary-judge consultation.
    pub judge_timeout: Duration,
    /// Per-axis weights for the syntactic comparator.
    pub weights: Weights,
    /// Score boost applied when a pair is semantically equivalent.
    pub boost_intermediate: u32,
    /// Minimum adjusted IR similarity for an equivalent pair with a minor
    /// instruction-count gap.
    pub ir_minor_diff_floor: u32,
    /// Maximum instruction-count gap still considered minor.
    pub ir_minor_diff_margin: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cache_ttl: Duration::from_millis(3_600_000),
            cache_soft_limit: 100,
            exec_timeout: Duration::from_millis(10_000),
            ir_timeout: Duration::from_millis(15_000),
            judge_timeout: Duration::from_millis(30_000),
            weights: Weights::default(),
            boost_intermediate: 10,
            ir_minor_diff_floor: 95,
            ir_minor_diff_margin: 2,
        }
    }
}

impl EngineConfig {
    /// Defaults with `CODEJUDGE_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = EngineConfig::default();
        if let Some(ms) = env_u64("CODEJUDGE_CACHE_TTL_MS") {
            config.cache_ttl = Duration::from_millis(ms);
        }
        if let Some(limit) = env_u64("CODEJUDGE_CACHE_SOFT_LIMIT") {
            config.cache_soft_limit = limit as usize;
        }
        if let Some(ms) = env_u64("CODEJUDGE_EXEC_TIMEOUT_MS") {
            config.exec_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("CODEJUDGE_IR_TIMEOUT_MS") {
            config.ir_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("CODEJUDGE_JUDGE_TIMEOUT_MS") {
            config.judge_timeout = Duration::from_millis(ms);
        }
        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}

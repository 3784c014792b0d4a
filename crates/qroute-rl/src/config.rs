//! Learning parameters

use serde::{Deserialize, Serialize};

use qroute_core::{Result, RouteError};

fn default_alpha() -> f64 {
    0.1
}
fn default_gamma() -> f64 {
    0.9
}
fn default_epsilon() -> f64 {
    0.3
}
fn default_episodes() -> usize {
    2000
}
fn default_max_steps_per_episode() -> usize {
    10_000
}
fn default_revisit_penalty() -> f64 {
    10.0
}

/// Q-learning configuration, passed explicitly into every run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Learning rate α, in (0, 1]
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Discount factor γ, in (0, 1]
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    /// Exploration rate ε, in [0, 1]
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Number of episodes per run
    #[serde(default = "default_episodes")]
    pub episodes: usize,

    /// Step cap guaranteeing termination on graphs with cycles
    #[serde(default = "default_max_steps_per_episode")]
    pub max_steps_per_episode: usize,

    /// Subtracted from the reward when a step revisits a node of the same episode
    #[serde(default = "default_revisit_penalty")]
    pub revisit_penalty: f64,

    /// RNG seed; `None` draws from OS entropy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            gamma: default_gamma(),
            epsilon: default_epsilon(),
            episodes: default_episodes(),
            max_steps_per_episode: default_max_steps_per_episode(),
            revisit_penalty: default_revisit_penalty(),
            seed: None,
        }
    }
}

impl LearningConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    /// Check every parameter is inside its admissible range
    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f64| v > 0.0 && v <= 1.0;

        if !in_unit(self.alpha) {
            return Err(invalid("alpha", self.alpha, "(0, 1]"));
        }
        if !in_unit(self.gamma) {
            return Err(invalid("gamma", self.gamma, "(0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(invalid("epsilon", self.epsilon, "[0, 1]"));
        }
        if self.episodes == 0 {
            return Err(RouteError::InvalidConfig(
                "episodes must be greater than 0".to_string(),
            ));
        }
        if self.max_steps_per_episode == 0 {
            return Err(RouteError::InvalidConfig(
                "max_steps_per_episode must be greater than 0".to_string(),
            ));
        }
        if !self.revisit_penalty.is_finite() || self.revisit_penalty < 0.0 {
            return Err(invalid("revisit_penalty", self.revisit_penalty, "[0, inf)"));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: f64, range: &str) -> RouteError {
    RouteError::InvalidConfig(format!("{name} must be in {range}, got {value}"))
}

//! Blood pressure classification against configured thresholds.
//!
//! Pure and total: every `(systolic, diastolic)` pair maps to exactly one
//! class. Boundary values count toward the stricter class, so a pair sitting
//! exactly on `optimal_upper`/`optimal_lower` is still optimal.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Verdict for one arm's pressure pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Optimal,
    Normal,
    Elevated,
}

/// Classification boundaries, loaded from user preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_optimal_upper")]
    pub optimal_upper: u16,
    #[serde(default = "default_optimal_lower")]
    pub optimal_lower: u16,
    #[serde(default = "default_good_upper")]
    pub good_upper: u16,
    #[serde(default = "default_good_lower")]
    pub good_lower: u16,
}

fn default_optimal_upper() -> u16 {
    120
}
fn default_optimal_lower() -> u16 {
    80
}
fn default_good_upper() -> u16 {
    140
}
fn default_good_lower() -> u16 {
    90
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            optimal_upper: default_optimal_upper(),
            optimal_lower: default_optimal_lower(),
            good_upper: default_good_upper(),
            good_lower: default_good_lower(),
        }
    }
}

impl Thresholds {
    /// Invariant: the optimal band sits inside the good band.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.optimal_upper > self.good_upper {
            return Err(ConfigError::InvalidValue {
                key: "thresholds.optimal_upper".into(),
                message: format!(
                    "optimal_upper ({}) must not exceed good_upper ({})",
                    self.optimal_upper, self.good_upper
                ),
            });
        }
        if self.optimal_lower > self.good_lower {
            return Err(ConfigError::InvalidValue {
                key: "thresholds.optimal_lower".into(),
                message: format!(
                    "optimal_lower ({}) must not exceed good_lower ({})",
                    self.optimal_lower, self.good_lower
                ),
            });
        }
        Ok(())
    }

    /// Classify one arm's pair. Evaluated separately per arm.
    pub fn classify(&self, systolic: u16, diastolic: u16) -> Classification {
        if systolic <= self.optimal_upper && diastolic <= self.optimal_lower {
            Classification::Optimal
        } else if systolic <= self.good_upper && diastolic <= self.good_lower {
            Classification::Normal
        } else {
            Classification::Elevated
        }
    }
}

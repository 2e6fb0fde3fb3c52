//! Engine configuration with validation and defaults.

use crate::errors::{EngineError, EngineResult};
use crate::games::towers::CommitmentPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable engine policy. Every field has a working default, so an empty
/// config file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Smallest accepted bet.
    pub min_bet: f64,
    /// Largest accepted bet; `None` means unlimited.
    pub max_bet: Option<f64>,
    /// When Towers bomb layouts are committed.
    pub towers_commitment: CommitmentPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_bet: 0.01,
            max_bet: None,
            towers_commitment: CommitmentPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Check the configuration for logical consistency.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.min_bet.is_finite() || self.min_bet <= 0.0 {
            return Err(EngineError::Validation {
                field: "min_bet",
                reason: "must be a positive amount".to_string(),
            });
        }
        if let Some(max) = self.max_bet {
            if !max.is_finite() || max < self.min_bet {
                return Err(EngineError::Validation {
                    field: "max_bet",
                    reason: format!("must be at least the minimum bet {}", self.min_bet),
                });
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| EngineError::Validation {
            field: "config",
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk.
    pub fn load_from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EngineError::Validation {
            field: "config",
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Bet amount check shared by every wagering entry point.
    pub fn check_bet(&self, amount: f64) -> EngineResult<()> {
        if !amount.is_finite() || amount < self.min_bet {
            return Err(EngineError::Validation {
                field: "amount",
                reason: format!("bet must be at least {}", self.min_bet),
            });
        }
        if let Some(max) = self.max_bet {
            if amount > max {
                return Err(EngineError::Validation {
                    field: "amount",
                    reason: format!("bet must not exceed {}", max),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.towers_commitment, CommitmentPolicy::PerRow);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.min_bet, 0.01);
        assert_eq!(config.max_bet, None);
    }

    #[test]
    fn test_toml_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            min_bet = 1.0
            max_bet = 500.0
            towers_commitment = "full_board"
            "#,
        )
        .unwrap();
        assert_eq!(config.min_bet, 1.0);
        assert_eq!(config.max_bet, Some(500.0));
        assert_eq!(config.towers_commitment, CommitmentPolicy::FullBoard);
    }

    #[test]
    fn test_inconsistent_limits_rejected() {
        let config = EngineConfig {
            min_bet: 10.0,
            max_bet: Some(1.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(EngineConfig::from_toml_str("min_bet = -5.0").is_err());
    }

    #[test]
    fn test_bet_range_check() {
        let config = EngineConfig {
            min_bet: 1.0,
            max_bet: Some(100.0),
            ..Default::default()
        };
        assert!(config.check_bet(1.0).is_ok());
        assert!(config.check_bet(100.0).is_ok());
        assert!(config.check_bet(0.5).is_err());
        assert!(config.check_bet(100.01).is_err());
        assert!(config.check_bet(f64::NAN).is_err());
    }
}

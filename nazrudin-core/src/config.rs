//! Rules configuration.
//!
//! Every value has a built-in default, so a config file only needs the keys
//! it changes.

use crate::attack::{AttackMode, DEFAULT_CRITICAL_THRESHOLD};
use crate::progression::ThresholdTable;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// AP charged per attack, by mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackCosts {
    pub normal: f64,
    pub advantage: f64,
    pub disadvantage: f64,
}

impl Default for AttackCosts {
    fn default() -> Self {
        Self {
            normal: 1.0,
            advantage: 2.0,
            disadvantage: 2.0,
        }
    }
}

impl AttackCosts {
    pub fn for_mode(&self, mode: AttackMode) -> f64 {
        match mode {
            AttackMode::Normal => self.normal,
            AttackMode::Advantage => self.advantage,
            AttackMode::Disadvantage => self.disadvantage,
        }
    }
}

/// Floating combat text colours (CSS hex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextColors {
    pub damage: String,
    pub critical: String,
    pub healing: String,
}

impl Default for TextColors {
    fn default() -> Self {
        Self {
            damage: "#ffffff".to_string(),
            critical: "#ff3c00".to_string(),
            healing: "#3cff3c".to_string(),
        }
    }
}

/// Values a character reset returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterDefaults {
    pub level: u32,
    pub xp_value: u32,
    pub xp_max: u32,
    pub health_value: i32,
    pub health_max: i32,
    pub shield_value: i32,
    pub shield_max: i32,
    pub open_hp_points: u32,
    pub open_attribute_points: u32,
}

impl Default for CharacterDefaults {
    fn default() -> Self {
        Self {
            level: 1,
            xp_value: 0,
            xp_max: 5,
            health_value: 80,
            health_max: 80,
            shield_value: 0,
            shield_max: 0,
            open_hp_points: 0,
            open_attribute_points: 0,
        }
    }
}

/// Tunables of the rules engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub thresholds: ThresholdTable,
    /// Minimum raw d20 face that counts as a critical hit.
    pub critical_threshold: u32,
    /// Health restored at the start of each turn.
    pub health_regen_per_turn: i32,
    /// Canvas pixels per grid field.
    pub grid_size: f64,
    pub attack_costs: AttackCosts,
    pub text_colors: TextColors,
    pub defaults: CharacterDefaults,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdTable::default(),
            critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
            health_regen_per_turn: 5,
            grid_size: 100.0,
            attack_costs: AttackCosts::default(),
            text_colors: TextColors::default(),
            defaults: CharacterDefaults::default(),
        }
    }
}

impl RulesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdTable) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_critical_threshold(mut self, threshold: u32) -> Self {
        self.critical_threshold = threshold;
        self
    }

    pub fn with_health_regen(mut self, amount: i32) -> Self {
        self.health_regen_per_turn = amount;
        self
    }

    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_attack_costs(mut self, costs: AttackCosts) -> Self {
        self.attack_costs = costs;
        self
    }

    pub fn with_defaults(mut self, defaults: CharacterDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=20).contains(&self.critical_threshold) {
            return Err(ConfigError::Invalid(format!(
                "critical_threshold must be within 1..=20, got {}",
                self.critical_threshold
            )));
        }
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }
        if self.health_regen_per_turn < 0 {
            return Err(ConfigError::Invalid(
                "health_regen_per_turn must not be negative".to_string(),
            ));
        }
        let costs = self.attack_costs;
        if [costs.normal, costs.advantage, costs.disadvantage]
            .iter()
            .any(|c| !c.is_finite() || *c < 0.0)
        {
            return Err(ConfigError::Invalid(
                "attack costs must be finite and non-negative".to_string(),
            ));
        }
        let d = self.defaults;
        if d.level < 1 || d.xp_max == 0 || d.xp_value >= d.xp_max {
            return Err(ConfigError::Invalid(
                "default level/XP must satisfy level >= 1 and 0 <= xp < max".to_string(),
            ));
        }
        if d.health_max <= 0 || !(0..=d.health_max).contains(&d.health_value) {
            return Err(ConfigError::Invalid(
                "default health must satisfy 0 <= value <= max, max > 0".to_string(),
            ));
        }
        if d.shield_max < 0 || !(0..=d.shield_max).contains(&d.shield_value) {
            return Err(ConfigError::Invalid(
                "default shield must satisfy 0 <= value <= max".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RulesConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).await?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "Loaded rules configuration");
        Ok(config)
    }

    /// Write this configuration as pretty JSON.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RulesConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.critical_threshold, 18);
        assert_eq!(config.health_regen_per_turn, 5);
        assert_eq!(config.attack_costs.for_mode(AttackMode::Advantage), 2.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RulesConfig::from_json_str(
            r#"{"critical_threshold": 20, "thresholds": [{"level": 2, "xp": 10}]}"#,
        )
        .unwrap();
        assert_eq!(config.critical_threshold, 20);
        assert_eq!(config.thresholds.xp_for(2), Some(10));
        assert_eq!(config.thresholds.max_level(), Some(2));
        assert_eq!(config.grid_size, 100.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            RulesConfig::from_json_str(r#"{"critical_threshold": 21}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RulesConfig::from_json_str(r#"{"grid_size": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RulesConfig::from_json_str(r#"{"thresholds": [{"level": 3, "xp": 4}, {"level": 2, "xp": 4}]}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(RulesConfig::new().with_health_regen(-1).validate().is_err());
    }
}

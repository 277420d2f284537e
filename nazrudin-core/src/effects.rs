//! Status effects (buffs and debuffs) stored on items.
//!
//! Effects are plain data. Applying one adds `amount_to_change` to each
//! listed ability value of the target; nothing here counts rounds down, so
//! `duration` is informational.

use crate::update::CombatantUpdate;
use crate::world::{Ability, Combatant};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_EFFECT_NAME: &str = "Unnamed Effect";
pub const DEFAULT_EFFECT_DURATION: u32 = 1;
pub const DEFAULT_EFFECT_DESCRIPTION: &str = "No description";

/// Unique identifier for a stored effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId(pub Uuid);

impl EffectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A configured status effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub id: EffectId,
    pub name: String,
    /// Rounds. Not ticked down by the engine.
    pub duration: u32,
    pub stat_to_changes: Vec<Ability>,
    pub amount_to_change: i32,
    pub description: String,
}

/// Either one ability key or a list of them, as the configuration form sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatSelection {
    One(Ability),
    Many(Vec<Ability>),
}

impl StatSelection {
    pub fn into_vec(self) -> Vec<Ability> {
        match self {
            StatSelection::One(a) => vec![a],
            StatSelection::Many(list) => list,
        }
    }
}

/// Raw effect configuration. Every field may be missing or malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    pub id: Option<EffectId>,
    pub name: Option<String>,
    pub duration: Option<i64>,
    pub stat_to_changes: Option<StatSelection>,
    pub amount_to_change: Option<i32>,
    pub description: Option<String>,
}

impl EffectConfig {
    /// Read the configuration dialog's form fields.
    ///
    /// Recognised names are `effect-name`, `effect-duration`, `effect-stat`,
    /// `effect-value` and `effect-description`. Unparseable numbers and
    /// unknown ability keys are dropped so the defaults apply.
    pub fn from_form<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut config = EffectConfig::default();
        for (name, value) in fields {
            match name {
                "effect-name" => config.name = Some(value.to_string()),
                "effect-duration" => config.duration = value.trim().parse().ok(),
                "effect-value" => config.amount_to_change = value.trim().parse().ok(),
                "effect-description" => config.description = Some(value.to_string()),
                "effect-stat" => match value.parse::<Ability>() {
                    Ok(ability) => {
                        let mut stats = config
                            .stat_to_changes
                            .take()
                            .map(StatSelection::into_vec)
                            .unwrap_or_default();
                        stats.push(ability);
                        config.stat_to_changes = Some(StatSelection::Many(stats));
                    }
                    Err(e) => tracing::warn!("Ignoring effect stat: {}", e),
                },
                _ => {}
            }
        }
        config
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl StatusEffect {
    /// Build an effect, falling back to defaults for anything missing.
    pub fn from_config(config: EffectConfig) -> Self {
        let duration = match config.duration {
            Some(d) if d >= 0 => u32::try_from(d).unwrap_or(u32::MAX),
            _ => DEFAULT_EFFECT_DURATION,
        };

        Self {
            id: config.id.unwrap_or_default(),
            name: non_blank(config.name).unwrap_or_else(|| DEFAULT_EFFECT_NAME.to_string()),
            duration,
            stat_to_changes: config
                .stat_to_changes
                .map(StatSelection::into_vec)
                .unwrap_or_default(),
            amount_to_change: config.amount_to_change.unwrap_or(0),
            description: non_blank(config.description)
                .unwrap_or_else(|| DEFAULT_EFFECT_DESCRIPTION.to_string()),
        }
    }

    /// The update that applies this effect to `target`.
    ///
    /// Listing an ability twice applies the change twice.
    pub fn apply_to(&self, target: &Combatant) -> CombatantUpdate {
        let mut update = CombatantUpdate::new(target.id);
        for &ability in &self.stat_to_changes {
            let current = update
                .ability_value(ability)
                .unwrap_or_else(|| target.abilities.value(ability));
            update.set_ability_value(ability, current.saturating_add(self.amount_to_change));
        }
        update
    }
}

impl Default for StatusEffect {
    fn default() -> Self {
        Self::from_config(EffectConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::AbilityScore;

    #[test]
    fn test_empty_config_uses_defaults() {
        let effect = StatusEffect::from_config(EffectConfig::default());
        assert_eq!(effect.name, DEFAULT_EFFECT_NAME);
        assert_eq!(effect.duration, DEFAULT_EFFECT_DURATION);
        assert_eq!(effect.amount_to_change, 0);
        assert_eq!(effect.description, DEFAULT_EFFECT_DESCRIPTION);
        assert!(effect.stat_to_changes.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = StatusEffect::default();
        let b = StatusEffect::default();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_negative_duration_falls_back() {
        let effect = StatusEffect::from_config(EffectConfig {
            duration: Some(-3),
            ..EffectConfig::default()
        });
        assert_eq!(effect.duration, DEFAULT_EFFECT_DURATION);

        let effect = StatusEffect::from_config(EffectConfig {
            duration: Some(0),
            ..EffectConfig::default()
        });
        assert_eq!(effect.duration, 0);
    }

    #[test]
    fn test_from_form() {
        let config = EffectConfig::from_form([
            ("effect-name", "Weakened"),
            ("effect-duration", "three"),
            ("effect-stat", "kkf"),
            ("effect-stat", "not-a-stat"),
            ("effect-value", "-2"),
            ("effect-description", ""),
        ]);
        let effect = StatusEffect::from_config(config);
        assert_eq!(effect.name, "Weakened");
        assert_eq!(effect.duration, DEFAULT_EFFECT_DURATION);
        assert_eq!(effect.stat_to_changes, vec![Ability::Kkf]);
        assert_eq!(effect.amount_to_change, -2);
        assert_eq!(effect.description, DEFAULT_EFFECT_DESCRIPTION);
    }

    #[test]
    fn test_stat_selection_accepts_key_or_list() {
        let one: EffectConfig = serde_json::from_str(r#"{"stat_to_changes": "agi"}"#).unwrap();
        assert_eq!(one.stat_to_changes, Some(StatSelection::One(Ability::Agi)));

        let many: EffectConfig =
            serde_json::from_str(r#"{"stat_to_changes": ["agi", "tal"]}"#).unwrap();
        assert_eq!(
            many.stat_to_changes.map(StatSelection::into_vec),
            Some(vec![Ability::Agi, Ability::Tal])
        );
    }

    #[test]
    fn test_apply_saturates_instead_of_overflowing() {
        let mut target = Combatant::new("Target");
        target.abilities.kkf = AbilityScore::new(10, 0);
        target.abilities.ges = AbilityScore::new(-10, 0);

        let boost = StatusEffect::from_config(EffectConfig {
            stat_to_changes: Some(StatSelection::One(Ability::Kkf)),
            amount_to_change: Some(i32::MAX),
            ..EffectConfig::default()
        });
        assert_eq!(boost.apply_to(&target).ability_value(Ability::Kkf), Some(i32::MAX));

        let drain = StatusEffect::from_config(EffectConfig {
            stat_to_changes: Some(StatSelection::Many(vec![Ability::Ges, Ability::Ges])),
            amount_to_change: Some(i32::MIN),
            ..EffectConfig::default()
        });
        assert_eq!(drain.apply_to(&target).ability_value(Ability::Ges), Some(i32::MIN));
    }

    #[test]
    fn test_apply_adds_amount_to_each_stat() {
        let mut target = Combatant::new("Target");
        target.abilities.agi = AbilityScore::new(10, 0);
        target.abilities.tal = AbilityScore::new(7, -1);

        let effect = StatusEffect::from_config(EffectConfig {
            stat_to_changes: Some(StatSelection::Many(vec![Ability::Agi, Ability::Tal])),
            amount_to_change: Some(2),
            ..EffectConfig::default()
        });
        let update = effect.apply_to(&target);
        assert_eq!(update.ability_value(Ability::Agi), Some(12));
        assert_eq!(update.ability_value(Ability::Tal), Some(9));
        assert_eq!(update.ability_value(Ability::Ges), None);
    }
}

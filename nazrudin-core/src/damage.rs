//! Damage calculation and application.
//!
//! # Formula
//!
//! ```text
//! scaling     = scaling_stat × stat_value
//! base        = (weapon_base + scaling + weapon_type_level + skill + item) × personal_multiplier
//! outgoing    = base × (critical ? 1.5 + critical_damage_multiplier : 1)
//! elemental   = weakness + (resistance − penetration × resistance) × (ignore_effect ? 1 : immunity)
//! calculated  = outgoing × elemental
//! final       = calculated − (magic ? magic_resist : armor)
//! ```
//!
//! Unset contributors are neutral: 0 for additive terms, 1 for the personal
//! multiplier, resistance and immunity.

use crate::items::Item;
use crate::world::{Combatant, Pool};
use serde::{Deserialize, Serialize};

/// Base critical multiplier before the attacker's own bonus.
pub const CRITICAL_BASE_MULTIPLIER: f64 = 1.5;

/// Attacker-side damage contributors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffenseProfile {
    pub personal_multiplier: f64,
    pub critical_damage_multiplier: f64,
    pub penetration: f64,
    pub weapon_type_level_damage: f64,
    pub skill_damage: f64,
    pub item_damage: f64,
}

impl Default for OffenseProfile {
    fn default() -> Self {
        Self {
            personal_multiplier: 1.0,
            critical_damage_multiplier: 0.0,
            penetration: 0.0,
            weapon_type_level_damage: 0.0,
            skill_damage: 0.0,
            item_damage: 0.0,
        }
    }
}

/// Defender-side modifiers and mitigation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseProfile {
    pub armor: f64,
    pub magic_resist: f64,
    pub weakness: f64,
    pub resistance: f64,
    pub immunity: f64,
    /// Skip the immunity factor entirely.
    pub ignore_effect: bool,
}

impl Default for DefenseProfile {
    fn default() -> Self {
        Self {
            armor: 0.0,
            magic_resist: 0.0,
            weakness: 0.0,
            resistance: 1.0,
            immunity: 1.0,
            ignore_effect: false,
        }
    }
}

/// Every input of the damage formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageInputs {
    pub weapon_base_damage: f64,
    pub scaling_stat: f64,
    pub stat_value: f64,
    pub weapon_type_level_damage: f64,
    pub skill_damage: f64,
    pub item_damage: f64,
    pub personal_multiplier: f64,
    pub is_critical: bool,
    pub critical_damage_multiplier: f64,
    pub weakness: f64,
    pub resistance: f64,
    pub penetration: f64,
    pub immunity: f64,
    pub ignore_effect: bool,
    pub is_magic_attack: bool,
    pub armor: f64,
    pub magic_resist: f64,
}

impl Default for DamageInputs {
    fn default() -> Self {
        let offense = OffenseProfile::default();
        let defense = DefenseProfile::default();
        Self {
            weapon_base_damage: 0.0,
            scaling_stat: 0.0,
            stat_value: 0.0,
            weapon_type_level_damage: offense.weapon_type_level_damage,
            skill_damage: offense.skill_damage,
            item_damage: offense.item_damage,
            personal_multiplier: offense.personal_multiplier,
            is_critical: false,
            critical_damage_multiplier: offense.critical_damage_multiplier,
            weakness: defense.weakness,
            resistance: defense.resistance,
            penetration: offense.penetration,
            immunity: defense.immunity,
            ignore_effect: defense.ignore_effect,
            is_magic_attack: false,
            armor: defense.armor,
            magic_resist: defense.magic_resist,
        }
    }
}

impl DamageInputs {
    /// Neutral inputs with only the weapon's base damage set.
    pub fn new(weapon_base_damage: f64) -> Self {
        Self {
            weapon_base_damage,
            ..Self::default()
        }
    }

    /// Gather the inputs for `attacker` hitting `target` with `weapon`.
    pub fn for_attack(
        weapon: &Item,
        attacker: &Combatant,
        target: &Combatant,
        is_critical: bool,
    ) -> Self {
        let (scaling_stat, stat_value) = weapon
            .scaling
            .map(|s| (s.factor, attacker.abilities.value(s.ability) as f64))
            .unwrap_or((0.0, 0.0));
        let offense = attacker.offense;
        let defense = target.defense;

        Self {
            weapon_base_damage: weapon.damage,
            scaling_stat,
            stat_value,
            weapon_type_level_damage: offense.weapon_type_level_damage,
            skill_damage: offense.skill_damage,
            item_damage: offense.item_damage,
            personal_multiplier: offense.personal_multiplier,
            is_critical,
            critical_damage_multiplier: offense.critical_damage_multiplier,
            weakness: defense.weakness,
            resistance: defense.resistance,
            penetration: offense.penetration,
            immunity: defense.immunity,
            ignore_effect: defense.ignore_effect,
            is_magic_attack: weapon.magical,
            armor: defense.armor,
            magic_resist: defense.magic_resist,
        }
    }

    pub fn critical(mut self, is_critical: bool) -> Self {
        self.is_critical = is_critical;
        self
    }

    pub fn magic(mut self, is_magic_attack: bool) -> Self {
        self.is_magic_attack = is_magic_attack;
        self
    }

    /// Run the formula, keeping every intermediate stage.
    pub fn breakdown(&self) -> DamageBreakdown {
        let scaling = self.scaling_stat * self.stat_value;
        let base = (self.weapon_base_damage
            + scaling
            + self.weapon_type_level_damage
            + self.skill_damage
            + self.item_damage)
            * self.personal_multiplier;

        let critical_factor = if self.is_critical {
            CRITICAL_BASE_MULTIPLIER + self.critical_damage_multiplier
        } else {
            1.0
        };
        let outgoing = base * critical_factor;

        let immunity = if self.ignore_effect { 1.0 } else { self.immunity };
        let elemental_multiplier =
            self.weakness + (self.resistance - self.penetration * self.resistance) * immunity;
        let calculated = outgoing * elemental_multiplier;

        let mitigation = if self.is_magic_attack {
            self.magic_resist
        } else {
            self.armor
        };
        let raw = calculated - mitigation;

        DamageBreakdown {
            scaling,
            base,
            outgoing,
            elemental_multiplier,
            calculated,
            mitigation,
            raw,
            final_damage: clamp_damage(raw),
        }
    }
}

/// Intermediate values of one damage computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageBreakdown {
    pub scaling: f64,
    pub base: f64,
    pub outgoing: f64,
    pub elemental_multiplier: f64,
    pub calculated: f64,
    pub mitigation: f64,
    /// Before clamping; negative when mitigation exceeds the hit.
    pub raw: f64,
    pub final_damage: i32,
}

/// Negative results deal no damage rather than heal; fractions round down.
fn clamp_damage(raw: f64) -> i32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    raw.floor().min(i32::MAX as f64) as i32
}

/// Final integer damage for `inputs`, never negative.
pub fn compute_damage(inputs: &DamageInputs) -> i32 {
    inputs.breakdown().final_damage
}

/// Subtract `damage` from `health`, flooring at zero. Returns damage taken.
pub fn apply_damage(health: &mut Pool, damage: i32) -> i32 {
    health.take_damage(damage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_inputs_pass_base_through() {
        assert_eq!(compute_damage(&DamageInputs::new(10.0)), 10);
    }

    #[test]
    fn test_critical_applies_one_and_a_half() {
        let inputs = DamageInputs::new(10.0).critical(true);
        assert_eq!(compute_damage(&inputs), 15);

        let inputs = DamageInputs {
            critical_damage_multiplier: 0.5,
            ..DamageInputs::new(10.0).critical(true)
        };
        assert_eq!(compute_damage(&inputs), 20);
    }

    #[test]
    fn test_scaling_and_contributors() {
        let inputs = DamageInputs {
            scaling_stat: 0.5,
            stat_value: 12.0,
            weapon_type_level_damage: 2.0,
            skill_damage: 1.0,
            item_damage: 1.0,
            personal_multiplier: 2.0,
            ..DamageInputs::new(10.0)
        };
        let breakdown = inputs.breakdown();
        assert_eq!(breakdown.scaling, 6.0);
        assert_eq!(breakdown.base, 40.0);
        assert_eq!(breakdown.final_damage, 40);
    }

    #[test]
    fn test_elemental_multiplier() {
        // Weak to the element and half resisted, half penetrated
        let inputs = DamageInputs {
            weakness: 0.5,
            resistance: 0.5,
            penetration: 0.5,
            ..DamageInputs::new(20.0)
        };
        let breakdown = inputs.breakdown();
        assert_eq!(breakdown.elemental_multiplier, 0.75);
        assert_eq!(breakdown.final_damage, 15);
    }

    #[test]
    fn test_ignore_effect_skips_immunity() {
        let immune = DamageInputs {
            immunity: 0.0,
            ..DamageInputs::new(10.0)
        };
        assert_eq!(compute_damage(&immune), 0);

        let ignored = DamageInputs {
            ignore_effect: true,
            ..immune
        };
        assert_eq!(compute_damage(&ignored), 10);
    }

    #[test]
    fn test_mitigation_picks_armor_or_magic_resist() {
        let inputs = DamageInputs {
            armor: 3.0,
            magic_resist: 7.0,
            ..DamageInputs::new(10.0)
        };
        assert_eq!(compute_damage(&inputs), 7);
        assert_eq!(compute_damage(&inputs.magic(true)), 3);
    }

    #[test]
    fn test_overmitigated_hit_deals_zero() {
        let inputs = DamageInputs {
            armor: 25.0,
            ..DamageInputs::new(10.0)
        };
        let breakdown = inputs.breakdown();
        assert_eq!(breakdown.raw, -15.0);
        assert_eq!(breakdown.final_damage, 0);
    }

    #[test]
    fn test_apply_damage_clamps_to_zero() {
        let mut hp = Pool::with_value(12, 80);
        assert_eq!(apply_damage(&mut hp, 30), 12);
        assert_eq!(hp.value, 0);
    }
}

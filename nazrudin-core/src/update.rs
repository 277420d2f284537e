//! Typed partial updates for combatant records.
//!
//! Each `Some` field (or ability entry) is the new absolute value for that
//! field. Updates are validated against the current record before they reach
//! the registry.

use crate::world::{Ability, CharacterId, Combatant, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// An update that would leave the record in an invalid state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpdateError {
    #[error("Update for {expected} was addressed to {found}")]
    WrongTarget {
        expected: CharacterId,
        found: CharacterId,
    },

    #[error("Level must be at least 1")]
    InvalidLevel,

    #[error("Max XP must be positive")]
    InvalidMaxXp,

    #[error("XP value {value} exceeds max {max}")]
    XpOverflow { value: u32, max: u32 },

    #[error("{pool} {value} is outside 0..={max}")]
    PoolOutOfRange {
        pool: &'static str,
        value: i32,
        max: i32,
    },

    #[error("Action points must be finite and non-negative ({field} = {value})")]
    InvalidActionPoints { field: &'static str, value: f64 },

    #[error("Position must be finite")]
    InvalidPosition,
}

/// New values for a subset of a combatant's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantUpdate {
    pub target: CharacterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_value: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shield_value: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shield_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap_current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap_temp_bonus: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub abilities: BTreeMap<Ability, i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_attribute_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_hp_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl CombatantUpdate {
    pub fn new(target: CharacterId) -> Self {
        Self {
            target,
            level: None,
            xp_value: None,
            xp_max: None,
            health_value: None,
            health_max: None,
            shield_value: None,
            shield_max: None,
            ap_current: None,
            ap_max: None,
            ap_temp_bonus: None,
            abilities: BTreeMap::new(),
            open_attribute_points: None,
            open_hp_points: None,
            position: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::new(self.target)
    }

    pub fn ability_value(&self, ability: Ability) -> Option<i32> {
        self.abilities.get(&ability).copied()
    }

    pub fn set_ability_value(&mut self, ability: Ability, value: i32) {
        self.abilities.insert(ability, value);
    }

    /// Fold `other` into `self`; `other` wins where both set a field.
    pub fn merge(&mut self, other: CombatantUpdate) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            level,
            xp_value,
            xp_max,
            health_value,
            health_max,
            shield_value,
            shield_max,
            ap_current,
            ap_max,
            ap_temp_bonus,
            open_attribute_points,
            open_hp_points,
            position
        );
        self.abilities.extend(other.abilities);
    }

    /// The record as it would look after this update.
    pub fn preview(&self, current: &Combatant) -> Combatant {
        let mut next = current.clone();
        self.write_into(&mut next);
        next
    }

    fn write_into(&self, c: &mut Combatant) {
        if let Some(v) = self.level {
            c.level = v;
        }
        if let Some(v) = self.xp_value {
            c.xp.value = v;
        }
        if let Some(v) = self.xp_max {
            c.xp.max = v;
        }
        if let Some(v) = self.health_value {
            c.health.value = v;
        }
        if let Some(v) = self.health_max {
            c.health.max = v;
        }
        if let Some(v) = self.shield_value {
            c.shield.value = v;
        }
        if let Some(v) = self.shield_max {
            c.shield.max = v;
        }
        if let Some(v) = self.ap_current {
            c.action_points.current = v;
        }
        if let Some(v) = self.ap_max {
            c.action_points.max = v;
        }
        if let Some(v) = self.ap_temp_bonus {
            c.action_points.temp_bonus = v;
        }
        for (&ability, &value) in &self.abilities {
            c.abilities.get_mut(ability).value = value;
        }
        if let Some(v) = self.open_attribute_points {
            c.open_attribute_points = v;
        }
        if let Some(v) = self.open_hp_points {
            c.open_hp_points = v;
        }
        if let Some(v) = self.position {
            c.position = v;
        }
    }

    /// Check that applying this update to `current` yields a valid record.
    ///
    /// XP may equal its max: that is where progression parks a combatant
    /// that has run out of levels.
    pub fn validate(&self, current: &Combatant) -> Result<(), UpdateError> {
        if self.target != current.id {
            return Err(UpdateError::WrongTarget {
                expected: current.id,
                found: self.target,
            });
        }

        let next = self.preview(current);

        if next.level < 1 {
            return Err(UpdateError::InvalidLevel);
        }
        if next.xp.max == 0 {
            return Err(UpdateError::InvalidMaxXp);
        }
        if next.xp.value > next.xp.max {
            return Err(UpdateError::XpOverflow {
                value: next.xp.value,
                max: next.xp.max,
            });
        }
        for (pool, p, allow_zero_max) in [
            ("health", next.health, false),
            ("shield", next.shield, true),
        ] {
            let max_ok = if allow_zero_max { p.max >= 0 } else { p.max > 0 };
            if !max_ok || p.value < 0 || p.value > p.max {
                return Err(UpdateError::PoolOutOfRange {
                    pool,
                    value: p.value,
                    max: p.max,
                });
            }
        }
        for (field, value) in [
            ("current", next.action_points.current),
            ("max", next.action_points.max),
            ("temp_bonus", next.action_points.temp_bonus),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(UpdateError::InvalidActionPoints { field, value });
            }
        }
        if !next.position.x.is_finite() || !next.position.y.is_finite() {
            return Err(UpdateError::InvalidPosition);
        }

        Ok(())
    }

    /// Validate, then write into `current`.
    pub fn apply(&self, current: &mut Combatant) -> Result<(), UpdateError> {
        self.validate(current)?;
        self.write_into(current);
        Ok(())
    }
}

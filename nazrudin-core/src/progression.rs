//! Experience, levels and the open point pools they feed.

use crate::config::CharacterDefaults;
use crate::update::CombatantUpdate;
use crate::world::{Ability, Combatant};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors building a threshold table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdError {
    #[error("Threshold table must start at level 2 (found {0})")]
    FirstLevel(u32),
    #[error("Threshold levels must be consecutive ({previous} then {next})")]
    Gap { previous: u32, next: u32 },
    #[error("XP cost for level {0} must be positive")]
    ZeroCost(u32),
}

/// XP needed to fill the bar of `level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThreshold {
    pub level: u32,
    pub xp: u32,
}

/// Ordered level → XP lookup. Levels past the last entry do not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LevelThreshold>", into = "Vec<LevelThreshold>")]
pub struct ThresholdTable {
    entries: Vec<LevelThreshold>,
}

impl ThresholdTable {
    /// Entries must run 2, 3, 4... without gaps, so every level up to the
    /// last entry is reachable from level 1.
    pub fn new(entries: Vec<LevelThreshold>) -> Result<Self, ThresholdError> {
        let mut previous: Option<u32> = None;
        for entry in &entries {
            match previous {
                None if entry.level != 2 => return Err(ThresholdError::FirstLevel(entry.level)),
                Some(prev) if Some(entry.level) != prev.checked_add(1) => {
                    return Err(ThresholdError::Gap {
                        previous: prev,
                        next: entry.level,
                    });
                }
                _ => {}
            }
            if entry.xp == 0 {
                return Err(ThresholdError::ZeroCost(entry.level));
            }
            previous = Some(entry.level);
        }
        Ok(Self { entries })
    }

    /// XP cost of the bar at `level`, or `None` when no such level exists.
    pub fn xp_for(&self, level: u32) -> Option<u32> {
        self.entries
            .binary_search_by_key(&level, |e| e.level)
            .ok()
            .map(|idx| self.entries[idx].xp)
    }

    pub fn max_level(&self) -> Option<u32> {
        self.entries.last().map(|e| e.level)
    }

    pub fn entries(&self) -> &[LevelThreshold] {
        &self.entries
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let entries = [8, 12, 17, 23, 30, 38, 47, 57, 68]
            .into_iter()
            .zip(2..)
            .map(|(xp, level)| LevelThreshold { level, xp })
            .collect();
        Self { entries }
    }
}

impl TryFrom<Vec<LevelThreshold>> for ThresholdTable {
    type Error = ThresholdError;

    fn try_from(entries: Vec<LevelThreshold>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<ThresholdTable> for Vec<LevelThreshold> {
    fn from(table: ThresholdTable) -> Self {
        table.entries
    }
}

/// Result of adding XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpOutcome {
    pub new_level: u32,
    pub new_current_xp: u32,
    pub new_max_xp: u32,
    /// One per level gained, credited to both open point pools.
    pub points_awarded: u32,
    /// XP lost because the table ran out of levels.
    pub xp_discarded: u32,
}

impl XpOutcome {
    pub fn leveled_up(&self) -> bool {
        self.points_awarded > 0
    }
}

/// Add `xp_delta` to a bar at `current_xp / max_xp` on `level`.
///
/// Every time the running total reaches the accumulated bar size, the next
/// level's threshold is looked up; when there is none, leveling stops and the
/// remainder past the final bar is discarded. Non-positive deltas change
/// nothing.
pub fn apply_xp(
    current_xp: u32,
    max_xp: u32,
    level: u32,
    xp_delta: i64,
    table: &ThresholdTable,
) -> XpOutcome {
    let unchanged = XpOutcome {
        new_level: level,
        new_current_xp: current_xp,
        new_max_xp: max_xp,
        points_awarded: 0,
        xp_discarded: 0,
    };
    if xp_delta <= 0 {
        return unchanged;
    }

    let new_xp = u64::from(current_xp) + xp_delta as u64;
    let mut new_level = level;
    let mut bar = u64::from(max_xp);
    let mut accumulated = bar;
    let mut points = 0u32;

    while new_xp >= accumulated {
        let Some(cost) = table.xp_for(new_level + 1) else {
            tracing::debug!(level = new_level, "No further levels in threshold table");
            break;
        };
        new_level += 1;
        accumulated += u64::from(cost);
        bar = u64::from(cost);
        points += 1;
    }

    let mut remaining = new_xp - (accumulated - bar);
    let mut discarded = 0;
    if remaining > bar {
        discarded = remaining - bar;
        remaining = bar;
    }

    let clamp = |v: u64| u32::try_from(v).unwrap_or(u32::MAX);
    XpOutcome {
        new_level,
        new_current_xp: clamp(remaining),
        new_max_xp: clamp(bar),
        points_awarded: points,
        xp_discarded: clamp(discarded),
    }
}

/// The update that grants `xp_delta` to `combatant`.
pub fn award_xp(
    combatant: &Combatant,
    xp_delta: i64,
    table: &ThresholdTable,
) -> (XpOutcome, CombatantUpdate) {
    let outcome = apply_xp(
        combatant.xp.value,
        combatant.xp.max,
        combatant.level,
        xp_delta,
        table,
    );

    let mut update = CombatantUpdate::new(combatant.id);
    if xp_delta <= 0 {
        return (outcome, update);
    }
    update.xp_value = Some(outcome.new_current_xp);
    if outcome.leveled_up() {
        update.level = Some(outcome.new_level);
        update.xp_max = Some(outcome.new_max_xp);
        update.open_hp_points =
            Some(combatant.open_hp_points.saturating_add(outcome.points_awarded));
        update.open_attribute_points =
            Some(combatant.open_attribute_points.saturating_add(outcome.points_awarded));
    }
    (outcome, update)
}

/// Spend one open attribute point on `ability`. `None` when no point is open.
pub fn spend_attribute_point(combatant: &Combatant, ability: Ability) -> Option<CombatantUpdate> {
    if combatant.open_attribute_points == 0 {
        return None;
    }
    let mut update = CombatantUpdate::new(combatant.id);
    update.set_ability_value(ability, combatant.abilities.value(ability).saturating_add(1));
    update.open_attribute_points = Some(combatant.open_attribute_points - 1);
    Some(update)
}

/// Spend one open HP point on max health. `None` when no point is open.
pub fn spend_hp_point(combatant: &Combatant) -> Option<CombatantUpdate> {
    if combatant.open_hp_points == 0 {
        return None;
    }
    let mut update = CombatantUpdate::new(combatant.id);
    update.health_max = Some(combatant.health.max.saturating_add(1));
    update.open_hp_points = Some(combatant.open_hp_points - 1);
    Some(update)
}

/// Restore progression and pools to the configured starting values.
pub fn reset_character(combatant: &Combatant, defaults: &CharacterDefaults) -> CombatantUpdate {
    let mut update = CombatantUpdate::new(combatant.id);
    update.level = Some(defaults.level);
    update.xp_value = Some(defaults.xp_value);
    update.xp_max = Some(defaults.xp_max);
    update.health_value = Some(defaults.health_value);
    update.health_max = Some(defaults.health_max);
    update.shield_value = Some(defaults.shield_value);
    update.shield_max = Some(defaults.shield_max);
    update.open_hp_points = Some(defaults.open_hp_points);
    update.open_attribute_points = Some(defaults.open_attribute_points);
    update
}

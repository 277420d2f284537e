//! Item records: weapons, spells and gear, plus the status effects they carry.

use crate::effects::{EffectId, StatusEffect};
use crate::world::{Ability, ItemId};
use serde::{Deserialize, Serialize};

/// Kind of item record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Item,
    Weapon,
    Spell,
    Feature,
}

/// Descriptive roll formula shown on the item sheet.
///
/// The bonus may reference host roll data (`@str.mod`, `@lvl`), so the
/// engine keeps it as text and never evaluates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollFormula {
    pub dice_num: u32,
    pub dice_size: String,
    pub dice_bonus: String,
}

impl Default for RollFormula {
    fn default() -> Self {
        Self {
            dice_num: 1,
            dice_size: "d20".to_string(),
            dice_bonus: "+@str.mod+ceil(@lvl / 2)".to_string(),
        }
    }
}

/// Weapon damage that grows with one of the wielder's abilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    pub ability: Ability,
    /// Damage per point of the ability's value.
    pub factor: f64,
}

/// Spell-only fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellData {
    /// 1..=15
    pub skill_quality: u8,
    pub casting_time: String,
    pub range: String,
    pub targetable: String,
    pub kind: String,
    pub spell_damage: i32,
}

impl Default for SpellData {
    fn default() -> Self {
        Self {
            skill_quality: 1,
            casting_time: "1 action".to_string(),
            range: "6 Felder".to_string(),
            targetable: "V, S".to_string(),
            kind: "Buff".to_string(),
            spell_damage: 10,
        }
    }
}

impl SpellData {
    pub const MIN_SKILL_QUALITY: u8 = 1;
    pub const MAX_SKILL_QUALITY: u8 = 15;

    pub fn with_skill_quality(mut self, quality: u8) -> Self {
        self.skill_quality = quality.clamp(Self::MIN_SKILL_QUALITY, Self::MAX_SKILL_QUALITY);
        self
    }

    pub fn with_damage(mut self, damage: i32) -> Self {
        self.spell_damage = damage.max(0);
        self
    }
}

/// An item owned by a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub kind: ItemKind,
    pub quantity: u32,
    pub weight: f64,
    /// Base damage for weapons.
    #[serde(default)]
    pub damage: f64,
    /// Ability whose modifier feeds the attack roll.
    #[serde(default)]
    pub hit_chance: Option<Ability>,
    #[serde(default)]
    pub roll: RollFormula,
    #[serde(default)]
    pub scaling: Option<Scaling>,
    /// Magic attacks are mitigated by magic resist instead of armor.
    #[serde(default)]
    pub magical: bool,
    #[serde(default)]
    pub spell: Option<SpellData>,
    #[serde(default)]
    pub effects: Vec<StatusEffect>,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            kind: ItemKind::Item,
            quantity: 1,
            weight: 0.0,
            damage: 0.0,
            hit_chance: None,
            roll: RollFormula::default(),
            scaling: None,
            magical: false,
            spell: None,
            effects: Vec::new(),
        }
    }

    pub fn weapon(name: impl Into<String>, damage: f64, hit_chance: Ability) -> Self {
        Self {
            kind: ItemKind::Weapon,
            damage,
            hit_chance: Some(hit_chance),
            ..Self::new(name)
        }
    }

    pub fn spell(name: impl Into<String>, data: SpellData) -> Self {
        Self {
            kind: ItemKind::Spell,
            magical: true,
            spell: Some(data),
            ..Self::new(name)
        }
    }

    pub fn with_scaling(mut self, ability: Ability, factor: f64) -> Self {
        self.scaling = Some(Scaling { ability, factor });
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity.max(1);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.max(0.0);
        self
    }

    pub fn with_roll(mut self, roll: RollFormula) -> Self {
        self.roll = roll;
        self
    }

    pub fn magical(mut self) -> Self {
        self.magical = true;
        self
    }

    pub fn with_effect(mut self, effect: StatusEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// The sheet formula: dice, bonus, then the hit-chance modifier if any.
    pub fn formula(&self) -> String {
        let hit_chance = self
            .hit_chance
            .map(|a| format!("+@{}.mod", a.key()))
            .unwrap_or_default();
        format!(
            "{}{}{}{}",
            self.roll.dice_num, self.roll.dice_size, self.roll.dice_bonus, hit_chance
        )
    }

    pub fn find_effect(&self, id: EffectId) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.id == id)
    }

    /// Insert a new effect or replace the stored one with the same id.
    pub fn upsert_effect(&mut self, effect: StatusEffect) {
        match self.effects.iter_mut().find(|e| e.id == effect.id) {
            Some(existing) => *existing = effect,
            None => self.effects.push(effect),
        }
    }

    /// Remove an effect by id. Returns whether anything was removed.
    pub fn remove_effect(&mut self, id: EffectId) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.id != id);
        self.effects.len() != before
    }
}

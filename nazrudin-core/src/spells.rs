//! Casting spell items.

use crate::dice::{DiceExpression, DieRoller, RollResult};
use crate::items::{Item, SpellData};
use crate::update::CombatantUpdate;
use crate::world::Combatant;

/// What casting a spell at a target produces.
#[derive(Debug, Clone, PartialEq)]
pub struct SpellCast {
    /// Every stored effect applied to the target, in order.
    pub update: CombatantUpdate,
    /// `1d20 + spell_damage`. Reported, never applied to health.
    pub damage_roll: RollResult,
    /// Announces the spell's flat `spell_damage`, not the roll total.
    pub message: String,
}

/// Cast `spell` at `target`.
///
/// Effects stack: each one sees the ability values left by the previous.
/// Items without spell data roll with the default spell damage.
pub fn cast_spell(spell: &Item, target: &Combatant, roller: &mut impl DieRoller) -> SpellCast {
    let mut update = CombatantUpdate::new(target.id);
    for effect in &spell.effects {
        let current = update.preview(target);
        update.merge(effect.apply_to(&current));
    }

    let spell_damage = spell
        .spell
        .as_ref()
        .map(|s| s.spell_damage)
        .unwrap_or_else(|| SpellData::default().spell_damage);
    let damage_roll = DiceExpression::d20_plus(spell_damage).roll_with(roller);
    let message = format!("{} deals {} damage!", spell.name, spell_damage);

    tracing::debug!(
        spell = %spell.name,
        target = %target.name,
        effects = spell.effects.len(),
        roll = %damage_roll,
        "Spell cast"
    );

    SpellCast {
        update,
        damage_roll,
        message,
    }
}

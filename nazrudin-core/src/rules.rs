//! Rules engine with an Event/Change pipeline.
//!
//! 1. The host reports an [`Event`] (XP granted, turn started, attack made...)
//! 2. [`RulesEngine::resolve`] reads the records it needs from a [`Registry`]
//!    and rolls any dice
//! 3. The result is a [`Resolution`]: narrative text plus [`Change`]s
//! 4. [`apply_resolution`] commits the combatant updates
//!
//! Resolving never writes to the registry and applying never rolls, so a
//! resolution can be inspected, logged or discarded before it takes effect.

use crate::action_points::regenerate_health;
use crate::attack::{resolve_attack, roll_initiative, AttackMode, AttackRoll};
use crate::config::{ConfigError, RulesConfig};
use crate::damage::{DamageBreakdown, DamageInputs};
use crate::dice::{DieRoller, RollResult};
use crate::effects::EffectId;
use crate::progression::{award_xp, reset_character, spend_attribute_point, spend_hp_point};
use crate::registry::{Registry, RegistryError};
use crate::spells::cast_spell;
use crate::update::CombatantUpdate;
use crate::world::{Ability, CharacterId, Combatant, ItemId, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something that happened on the host side and needs rules applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Grant experience. Non-positive amounts change nothing.
    AwardXp { target: CharacterId, amount: i64 },

    /// The combat turn passed to this combatant.
    StartTurn { combatant: CharacterId },

    /// Attack `target` with a weapon item.
    Attack {
        attacker: CharacterId,
        target: CharacterId,
        weapon: ItemId,
        mode: AttackMode,
    },

    /// Run the damage pipeline on fully specified inputs.
    DealDamage {
        target: CharacterId,
        inputs: DamageInputs,
    },

    SpendAttributePoint {
        combatant: CharacterId,
        ability: Ability,
    },

    SpendHpPoint { combatant: CharacterId },

    ResetCharacter { combatant: CharacterId },

    /// Apply one stored effect of an item to a target.
    ApplyEffect {
        target: CharacterId,
        item: ItemId,
        effect: EffectId,
    },

    CastSpell {
        caster: CharacterId,
        target: CharacterId,
        spell: ItemId,
    },

    RollInitiative { combatant: CharacterId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Info,
    Warning,
}

/// A message for the host's notification area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }
}

/// Text to float over a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingText {
    pub text: String,
    pub color: String,
    pub position: Position,
}

/// One outcome of resolving an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Change {
    /// A partial record update to commit.
    Update(CombatantUpdate),

    AttackRolled {
        attacker: CharacterId,
        roll: AttackRoll,
    },

    DiceRolled { roll: RollResult, purpose: String },

    DamageDealt {
        target: CharacterId,
        breakdown: DamageBreakdown,
        taken: i32,
        new_health: i32,
        dropped_to_zero: bool,
    },

    Notify(Notification),

    FloatingText(FloatingText),
}

/// The result of resolving an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub narrative: String,
    pub changes: Vec<Change>,
}

impl Resolution {
    pub fn new(narrative: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            changes: Vec::new(),
        }
    }

    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    pub fn with_changes(mut self, changes: impl IntoIterator<Item = Change>) -> Self {
        self.changes.extend(changes);
        self
    }

    /// Updates in commit order.
    pub fn updates(&self) -> impl Iterator<Item = &CombatantUpdate> {
        self.changes.iter().filter_map(|c| match c {
            Change::Update(u) => Some(u),
            _ => None,
        })
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.changes.iter().filter_map(|c| match c {
            Change::Notify(n) => Some(n),
            _ => None,
        })
    }

    pub fn floating_texts(&self) -> impl Iterator<Item = &FloatingText> {
        self.changes.iter().filter_map(|c| match c {
            Change::FloatingText(t) => Some(t),
            _ => None,
        })
    }

    /// True when the event was refused with a warning and nothing changes.
    pub fn is_soft_failure(&self) -> bool {
        self.updates().next().is_none()
            && self
                .notifications()
                .any(|n| n.level == NotificationLevel::Warning)
    }
}

/// Kind of record an event referred to.
#[derive(Debug, Clone, Copy)]
enum Missing {
    Combatant(CharacterId),
    Item(ItemId),
    Effect(EffectId),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Combatant(id) => write!(f, "combatant {id}"),
            Missing::Item(id) => write!(f, "item {id}"),
            Missing::Effect(id) => write!(f, "effect {id}"),
        }
    }
}

/// Resolves events into changes.
#[derive(Debug, Clone, Default)]
pub struct RulesEngine {
    config: RulesConfig,
}

impl RulesEngine {
    /// Build an engine, refusing configurations that fail
    /// [`RulesConfig::validate`].
    pub fn new(config: RulesConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Resolve an event against the current records.
    pub fn resolve<R: Registry + ?Sized>(
        &self,
        registry: &R,
        event: Event,
        roller: &mut impl DieRoller,
    ) -> Resolution {
        match event {
            Event::AwardXp { target, amount } => self.resolve_award_xp(registry, target, amount),
            Event::StartTurn { combatant } => self.resolve_start_turn(registry, combatant),
            Event::Attack {
                attacker,
                target,
                weapon,
                mode,
            } => self.resolve_attack(registry, attacker, target, weapon, mode, roller),
            Event::DealDamage { target, inputs } => {
                self.resolve_deal_damage(registry, target, inputs)
            }
            Event::SpendAttributePoint { combatant, ability } => {
                self.resolve_spend_attribute_point(registry, combatant, ability)
            }
            Event::SpendHpPoint { combatant } => self.resolve_spend_hp_point(registry, combatant),
            Event::ResetCharacter { combatant } => self.resolve_reset(registry, combatant),
            Event::ApplyEffect {
                target,
                item,
                effect,
            } => self.resolve_apply_effect(registry, target, item, effect),
            Event::CastSpell {
                caster,
                target,
                spell,
            } => self.resolve_cast_spell(registry, caster, target, spell, roller),
            Event::RollInitiative { combatant } => {
                self.resolve_roll_initiative(registry, combatant, roller)
            }
        }
    }

    fn missing(&self, what: Missing) -> Resolution {
        tracing::warn!(%what, "Event refers to a missing record");
        let message = format!("Could not find {what}");
        Resolution::new(message.clone()).with_change(Change::Notify(Notification::warning(message)))
    }

    fn soft_failure(&self, message: String) -> Resolution {
        tracing::warn!("{}", message);
        Resolution::new(message.clone()).with_change(Change::Notify(Notification::warning(message)))
    }

    fn resolve_award_xp<R: Registry + ?Sized>(
        &self,
        registry: &R,
        target: CharacterId,
        amount: i64,
    ) -> Resolution {
        let Some(combatant) = registry.combatant(target) else {
            return self.missing(Missing::Combatant(target));
        };

        let (outcome, update) = award_xp(combatant, amount, &self.config.thresholds);
        if update.is_empty() {
            return Resolution::new(format!("{} gains no experience.", combatant.name));
        }

        let mut resolution = Resolution::new(format!("{} gains {} XP.", combatant.name, amount))
            .with_change(Change::Update(update));

        if outcome.leveled_up() {
            tracing::info!(
                combatant = %combatant.name,
                level = outcome.new_level,
                points = outcome.points_awarded,
                "Level up"
            );
            resolution = resolution.with_change(Change::Notify(Notification::info(format!(
                "{} reached level {}!",
                combatant.name, outcome.new_level
            ))));
        }
        if outcome.xp_discarded > 0 {
            tracing::debug!(
                combatant = %combatant.name,
                discarded = outcome.xp_discarded,
                "XP past the final level discarded"
            );
        }
        resolution
    }

    fn resolve_start_turn<R: Registry + ?Sized>(
        &self,
        registry: &R,
        id: CharacterId,
    ) -> Resolution {
        let Some(combatant) = registry.combatant(id) else {
            return self.missing(Missing::Combatant(id));
        };

        let mut ap = combatant.action_points;
        ap.reset_for_turn();
        let mut health = combatant.health;
        let healed = regenerate_health(&mut health, self.config.health_regen_per_turn);

        let mut update = CombatantUpdate::new(id);
        update.ap_current = Some(ap.current);
        update.ap_temp_bonus = Some(ap.temp_bonus);
        update.health_value = Some(health.value);

        tracing::debug!(combatant = %combatant.name, ap = ap.current, healed, "Turn started");

        let mut resolution = Resolution::new(format!("{}'s turn begins.", combatant.name))
            .with_change(Change::Update(update));
        if healed > 0 {
            resolution = resolution.with_change(Change::FloatingText(FloatingText {
                text: format!("+{healed}"),
                color: self.config.text_colors.healing.clone(),
                position: combatant.position,
            }));
        }
        resolution
    }

    /// Damage `target` with `inputs`, returning the health update and the
    /// record of what happened.
    fn damage_changes(&self, target: &Combatant, inputs: &DamageInputs) -> Vec<Change> {
        let breakdown = inputs.breakdown();
        let mut health = target.health;
        let taken = health.take_damage(breakdown.final_damage);
        let dropped_to_zero = health.is_empty() && !target.health.is_empty();

        let mut update = CombatantUpdate::new(target.id);
        update.health_value = Some(health.value);

        if dropped_to_zero {
            tracing::info!(target = %target.name, "Combatant dropped to 0 health");
        }

        let color = if inputs.is_critical {
            &self.config.text_colors.critical
        } else {
            &self.config.text_colors.damage
        };

        vec![
            Change::Update(update),
            Change::DamageDealt {
                target: target.id,
                breakdown,
                taken,
                new_health: health.value,
                dropped_to_zero,
            },
            Change::FloatingText(FloatingText {
                text: breakdown.final_damage.to_string(),
                color: color.clone(),
                position: target.position,
            }),
        ]
    }

    fn resolve_attack<R: Registry + ?Sized>(
        &self,
        registry: &R,
        attacker_id: CharacterId,
        target_id: CharacterId,
        weapon_id: ItemId,
        mode: AttackMode,
        roller: &mut impl DieRoller,
    ) -> Resolution {
        let Some(attacker) = registry.combatant(attacker_id) else {
            return self.missing(Missing::Combatant(attacker_id));
        };
        let Some(target) = registry.combatant(target_id) else {
            return self.missing(Missing::Combatant(target_id));
        };
        let Some(weapon) = registry.item(weapon_id) else {
            return self.missing(Missing::Item(weapon_id));
        };

        let modifier = weapon
            .hit_chance
            .map(|a| attacker.abilities.modifier(a))
            .unwrap_or(0);
        let roll = resolve_attack(modifier, mode, self.config.critical_threshold, roller);

        let mut ap = attacker.action_points;
        ap.debit(self.config.attack_costs.for_mode(mode));
        let mut ap_update = CombatantUpdate::new(attacker.id);
        ap_update.ap_current = Some(ap.current);

        let inputs = DamageInputs::for_attack(weapon, attacker, target, roll.is_critical);
        let damage = self.damage_changes(target, &inputs);

        tracing::debug!(
            attacker = %attacker.name,
            target = %target.name,
            weapon = %weapon.name,
            %mode,
            roll = %roll,
            damage = inputs.breakdown().final_damage,
            "Attack resolved"
        );

        let narrative = format!(
            "{} attacks {} with {} ({}): {}. {} damage.",
            attacker.name,
            target.name,
            weapon.name,
            mode,
            roll,
            inputs.breakdown().final_damage
        );

        Resolution::new(narrative)
            .with_change(Change::AttackRolled {
                attacker: attacker.id,
                roll,
            })
            .with_change(Change::Update(ap_update))
            .with_changes(damage)
    }

    fn resolve_deal_damage<R: Registry + ?Sized>(
        &self,
        registry: &R,
        target_id: CharacterId,
        inputs: DamageInputs,
    ) -> Resolution {
        let Some(target) = registry.combatant(target_id) else {
            return self.missing(Missing::Combatant(target_id));
        };
        let damage = self.damage_changes(target, &inputs);
        Resolution::new(format!(
            "{} takes {} damage.",
            target.name,
            inputs.breakdown().final_damage
        ))
        .with_changes(damage)
    }

    fn resolve_spend_attribute_point<R: Registry + ?Sized>(
        &self,
        registry: &R,
        id: CharacterId,
        ability: Ability,
    ) -> Resolution {
        let Some(combatant) = registry.combatant(id) else {
            return self.missing(Missing::Combatant(id));
        };
        match spend_attribute_point(combatant, ability) {
            Some(update) => Resolution::new(format!(
                "{} raises {}.",
                combatant.name,
                ability.abbreviation()
            ))
            .with_change(Change::Update(update)),
            None => self.soft_failure(format!(
                "{} has no open attribute points.",
                combatant.name
            )),
        }
    }

    fn resolve_spend_hp_point<R: Registry + ?Sized>(
        &self,
        registry: &R,
        id: CharacterId,
    ) -> Resolution {
        let Some(combatant) = registry.combatant(id) else {
            return self.missing(Missing::Combatant(id));
        };
        match spend_hp_point(combatant) {
            Some(update) => Resolution::new(format!("{} raises max health.", combatant.name))
                .with_change(Change::Update(update)),
            None => self.soft_failure(format!("{} has no open HP points.", combatant.name)),
        }
    }

    fn resolve_reset<R: Registry + ?Sized>(&self, registry: &R, id: CharacterId) -> Resolution {
        let Some(combatant) = registry.combatant(id) else {
            return self.missing(Missing::Combatant(id));
        };
        tracing::info!(combatant = %combatant.name, "Character reset");
        Resolution::new(format!("{} is reset to starting values.", combatant.name))
            .with_change(Change::Update(reset_character(
                combatant,
                &self.config.defaults,
            )))
    }

    fn resolve_apply_effect<R: Registry + ?Sized>(
        &self,
        registry: &R,
        target_id: CharacterId,
        item_id: ItemId,
        effect_id: EffectId,
    ) -> Resolution {
        let Some(target) = registry.combatant(target_id) else {
            return self.missing(Missing::Combatant(target_id));
        };
        let Some(item) = registry.item(item_id) else {
            return self.missing(Missing::Item(item_id));
        };
        let Some(effect) = item.find_effect(effect_id) else {
            return self.missing(Missing::Effect(effect_id));
        };

        let message = format!("{} applied to {}.", effect.name, target.name);
        Resolution::new(message.clone())
            .with_change(Change::Update(effect.apply_to(target)))
            .with_change(Change::Notify(Notification::info(message)))
    }

    fn resolve_cast_spell<R: Registry + ?Sized>(
        &self,
        registry: &R,
        caster_id: CharacterId,
        target_id: CharacterId,
        spell_id: ItemId,
        roller: &mut impl DieRoller,
    ) -> Resolution {
        let Some(caster) = registry.combatant(caster_id) else {
            return self.missing(Missing::Combatant(caster_id));
        };
        let Some(target) = registry.combatant(target_id) else {
            return self.missing(Missing::Combatant(target_id));
        };
        let Some(spell) = registry.item(spell_id) else {
            return self.missing(Missing::Item(spell_id));
        };

        let cast = cast_spell(spell, target, roller);
        let mut resolution = Resolution::new(format!(
            "{} casts {} on {}.",
            caster.name, spell.name, target.name
        ));
        if !cast.update.is_empty() {
            resolution = resolution.with_change(Change::Update(cast.update));
        }
        resolution
            .with_change(Change::DiceRolled {
                roll: cast.damage_roll,
                purpose: format!("{} damage", spell.name),
            })
            .with_change(Change::Notify(Notification::info(cast.message)))
    }

    fn resolve_roll_initiative<R: Registry + ?Sized>(
        &self,
        registry: &R,
        id: CharacterId,
        roller: &mut impl DieRoller,
    ) -> Resolution {
        let Some(combatant) = registry.combatant(id) else {
            return self.missing(Missing::Combatant(id));
        };
        let roll = roll_initiative(combatant.abilities.modifier(Ability::Agi), roller);
        Resolution::new(format!(
            "{} rolls initiative: {}.",
            combatant.name, roll.total
        ))
        .with_change(Change::DiceRolled {
            roll,
            purpose: "initiative".to_string(),
        })
    }
}

/// Commit the updates of a resolution in order. Returns how many were
/// written.
///
/// Stops at the first rejected update; updates before it stay committed.
pub fn apply_resolution<R: Registry + ?Sized>(
    registry: &mut R,
    resolution: &Resolution,
) -> Result<usize, RegistryError> {
    let mut committed = 0;
    for update in resolution.updates().filter(|u| !u.is_empty()) {
        registry.commit(update)?;
        committed += 1;
    }
    Ok(committed)
}

//! Testing utilities.
//!
//! - `FixedRolls` replays scripted die faces
//! - `TestHarness` bundles a registry, an engine and a roller for scripted
//!   scenarios

use crate::action_points::ActionPoints;
use crate::attack::AttackMode;
use crate::config::{ConfigError, RulesConfig};
use crate::dice::{DieRoller, DieType};
use crate::items::Item;
use crate::registry::{InMemoryRegistry, Registry, RegistryError};
use crate::rules::{apply_resolution, Event, Resolution, RulesEngine};
use crate::world::{Abilities, Ability, AbilityScore, CharacterId, Combatant, ItemId};

/// A [`DieRoller`] that returns scripted faces in order, cycling when it
/// runs out. Faces are clamped to the die being rolled; an empty script
/// always rolls 1.
#[derive(Debug, Clone, Default)]
pub struct FixedRolls {
    faces: Vec<u32>,
    next: usize,
}

impl FixedRolls {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
            next: 0,
        }
    }

    /// Faces handed out so far.
    pub fn rolled(&self) -> usize {
        self.next
    }
}

impl DieRoller for FixedRolls {
    fn roll_die(&mut self, die: DieType) -> u32 {
        if self.faces.is_empty() {
            return 1;
        }
        let face = self.faces[self.next % self.faces.len()];
        self.next += 1;
        face.clamp(1, die.sides())
    }
}

/// A combatant with every ability at `value`/`modifier`, full health and
/// six AP.
pub fn sample_combatant(name: &str, value: i32, modifier: i32) -> Combatant {
    let score = AbilityScore::new(value, modifier);
    Combatant::new(name)
        .with_abilities(Abilities {
            ges: score,
            agi: score,
            gen: score,
            kon: score,
            kkf: score,
            tal: score,
        })
        .with_action_points(ActionPoints::new(6.0))
}

/// Scripted scenario runner.
pub struct TestHarness {
    pub registry: InMemoryRegistry,
    pub engine: RulesEngine,
    pub rolls: FixedRolls,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            registry: InMemoryRegistry::new(),
            engine: RulesEngine::default(),
            rolls: FixedRolls::default(),
        }
    }

    pub fn with_config(config: RulesConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            registry: InMemoryRegistry::new(),
            engine: RulesEngine::new(config)?,
            rolls: FixedRolls::default(),
        })
    }

    /// Script the next die faces.
    pub fn script_rolls(&mut self, faces: impl IntoIterator<Item = u32>) -> &mut Self {
        self.rolls = FixedRolls::new(faces);
        self
    }

    pub fn add_combatant(&mut self, combatant: Combatant) -> CharacterId {
        self.registry.insert_combatant(combatant)
    }

    pub fn add_item(&mut self, item: Item) -> ItemId {
        self.registry.insert_item(item)
    }

    /// Resolve without committing.
    pub fn resolve(&mut self, event: Event) -> Resolution {
        self.engine.resolve(&self.registry, event, &mut self.rolls)
    }

    /// Resolve and commit.
    pub fn run(&mut self, event: Event) -> Result<Resolution, RegistryError> {
        let resolution = self.resolve(event);
        apply_resolution(&mut self.registry, &resolution)?;
        Ok(resolution)
    }

    /// Attack with a weapon and commit the result.
    pub fn attack(
        &mut self,
        attacker: CharacterId,
        target: CharacterId,
        weapon: ItemId,
        mode: AttackMode,
    ) -> Result<Resolution, RegistryError> {
        self.run(Event::Attack {
            attacker,
            target,
            weapon,
            mode,
        })
    }

    pub fn combatant(&self, id: CharacterId) -> Option<&Combatant> {
        self.registry.combatant(id)
    }

    /// Current health as (value, max).
    pub fn health(&self, id: CharacterId) -> Option<(i32, i32)> {
        self.combatant(id).map(|c| (c.health.value, c.health.max))
    }

    pub fn action_points(&self, id: CharacterId) -> Option<f64> {
        self.combatant(id).map(|c| c.action_points.current)
    }

    pub fn ability_value(&self, id: CharacterId, ability: Ability) -> Option<i32> {
        self.combatant(id).map(|c| c.abilities.value(ability))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_rolls_cycle_and_clamp() {
        let mut rolls = FixedRolls::new([3, 25]);
        assert_eq!(rolls.roll_die(DieType::D20), 3);
        assert_eq!(rolls.roll_die(DieType::D20), 20);
        assert_eq!(rolls.roll_die(DieType::D6), 3);
        assert_eq!(rolls.rolled(), 3);

        let mut empty = FixedRolls::default();
        assert_eq!(empty.roll_die(DieType::D20), 1);
    }

    #[test]
    fn test_harness_attack() {
        let mut harness = TestHarness::new();
        let hero = harness.add_combatant(sample_combatant("Hero", 10, 1));
        let foe = harness.add_combatant(sample_combatant("Foe", 10, 0));
        let sword = harness.add_item(Item::weapon("Sword", 7.0, Ability::Kkf));

        harness.script_rolls([5]);
        harness
            .attack(hero, foe, sword, AttackMode::Normal)
            .unwrap();

        assert_eq!(harness.health(foe), Some((73, 80)));
        assert_eq!(harness.action_points(hero), Some(5.0));
    }
}

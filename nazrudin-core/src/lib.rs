//! Character progression and combat resolution for the Nazrudin tabletop
//! system.
//!
//! This crate provides:
//! - Experience thresholds, level-ups and point spending
//! - An action-point ledger with provisional, confirmable movement
//! - Attack rolls with advantage/disadvantage and a critical threshold
//! - A damage pipeline with elemental modifiers and mitigation
//! - Status effects and spells stored on items
//! - An Event/Change rules engine over a host-owned record registry
//!
//! # Quick Start
//!
//! ```ignore
//! use nazrudin_core::{
//!     apply_resolution, AttackMode, Combatant, Event, InMemoryRegistry, Item, Ability,
//!     RandomRoller, RulesConfig, RulesEngine,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = RulesEngine::new(RulesConfig::load("rules.json").await?)?;
//!     let mut registry = InMemoryRegistry::new();
//!     let hero = registry.insert_combatant(Combatant::new("Hero"));
//!     let foe = registry.insert_combatant(Combatant::new("Foe"));
//!     let sword = registry.insert_item(Item::weapon("Sword", 8.0, Ability::Kkf));
//!
//!     let event = Event::Attack { attacker: hero, target: foe, weapon: sword, mode: AttackMode::Normal };
//!     let resolution = engine.resolve(&registry, event, &mut RandomRoller::thread());
//!     println!("{}", resolution.narrative);
//!     apply_resolution(&mut registry, &resolution)?;
//!     Ok(())
//! }
//! ```

pub mod action_points;
pub mod attack;
pub mod config;
pub mod damage;
pub mod dice;
pub mod effects;
pub mod items;
pub mod movement;
pub mod progression;
pub mod registry;
pub mod rules;
pub mod spells;
pub mod testing;
pub mod update;
pub mod world;

// Primary public API
pub use action_points::ActionPoints;
pub use attack::{AttackMode, AttackRoll};
pub use config::{ConfigError, RulesConfig};
pub use damage::{compute_damage, DamageInputs};
pub use dice::{DieRoller, RandomRoller};
pub use effects::{EffectConfig, StatusEffect};
pub use items::{Item, SpellData};
pub use movement::{MoveOutcome, MovementController, MovementError};
pub use progression::{apply_xp, ThresholdTable, XpOutcome};
pub use registry::{InMemoryRegistry, Registry, RegistryError};
pub use rules::{apply_resolution, Change, Event, Resolution, RulesEngine};
pub use testing::{FixedRolls, TestHarness};
pub use update::{CombatantUpdate, UpdateError};
pub use world::{Ability, CharacterId, Combatant, ItemId, Position};

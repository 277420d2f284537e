//! Combatant records and the value types they are built from.
//!
//! The host owns and persists these records. The engine only ever receives
//! snapshots of them and hands back typed updates (see [`crate::update`]).

use crate::action_points::ActionPoints;
use crate::damage::{DefenseProfile, OffenseProfile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for combatants (the host's actors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for items (weapons, spells, gear).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Abilities
// ============================================================================

/// The six fixed ability keys of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Ges,
    Agi,
    Gen,
    Kon,
    Kkf,
    Tal,
}

impl Ability {
    /// Lowercase key as stored on host records.
    pub fn key(&self) -> &'static str {
        match self {
            Ability::Ges => "ges",
            Ability::Agi => "agi",
            Ability::Gen => "gen",
            Ability::Kon => "kon",
            Ability::Kkf => "kkf",
            Ability::Tal => "tal",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Ges => "GES",
            Ability::Agi => "AGI",
            Ability::Gen => "GEN",
            Ability::Kon => "KON",
            Ability::Kkf => "KKF",
            Ability::Tal => "TAL",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Ges,
            Ability::Agi,
            Ability::Gen,
            Ability::Kon,
            Ability::Kkf,
            Ability::Tal,
        ]
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown ability key: {0}")]
pub struct UnknownAbility(pub String);

impl FromStr for Ability {
    type Err = UnknownAbility;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Ability::all()
            .into_iter()
            .find(|a| a.key() == key)
            .ok_or_else(|| UnknownAbility(s.to_string()))
    }
}

/// One ability entry: the raw value and its modifier.
///
/// The modifier comes from a house rule applied by the host, so the engine
/// treats it as input and never recomputes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbilityScore {
    pub value: i32,
    #[serde(rename = "mod")]
    pub modifier: i32,
}

impl AbilityScore {
    pub fn new(value: i32, modifier: i32) -> Self {
        Self { value, modifier }
    }
}

/// Ability scores container.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Abilities {
    pub ges: AbilityScore,
    pub agi: AbilityScore,
    pub gen: AbilityScore,
    pub kon: AbilityScore,
    pub kkf: AbilityScore,
    pub tal: AbilityScore,
}

impl Abilities {
    pub fn get(&self, ability: Ability) -> AbilityScore {
        match ability {
            Ability::Ges => self.ges,
            Ability::Agi => self.agi,
            Ability::Gen => self.gen,
            Ability::Kon => self.kon,
            Ability::Kkf => self.kkf,
            Ability::Tal => self.tal,
        }
    }

    pub fn get_mut(&mut self, ability: Ability) -> &mut AbilityScore {
        match ability {
            Ability::Ges => &mut self.ges,
            Ability::Agi => &mut self.agi,
            Ability::Gen => &mut self.gen,
            Ability::Kon => &mut self.kon,
            Ability::Kkf => &mut self.kkf,
            Ability::Tal => &mut self.tal,
        }
    }

    pub fn value(&self, ability: Ability) -> i32 {
        self.get(ability).value
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        self.get(ability).modifier
    }
}

// ============================================================================
// Pools
// ============================================================================

/// Experience towards the next level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub value: u32,
    pub max: u32,
}

impl Experience {
    pub fn new(value: u32, max: u32) -> Self {
        Self { value, max }
    }
}

/// A bounded `{value, max}` pool used for health and shield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub value: i32,
    pub max: i32,
}

impl Pool {
    pub fn new(max: i32) -> Self {
        Self { value: max, max }
    }

    pub fn with_value(value: i32, max: i32) -> Self {
        Self { value, max }
    }

    /// Reduce the pool, never below zero. Returns the amount actually removed.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let old = self.value;
        self.value = self.value.saturating_sub(amount.max(0)).max(0);
        old - self.value
    }

    /// Restore the pool, never above `max`. Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let old = self.value;
        self.value = self.value.saturating_add(amount.max(0)).min(self.max);
        self.value - old
    }

    pub fn is_empty(&self) -> bool {
        self.value <= 0
    }
}

// ============================================================================
// Canvas
// ============================================================================

/// Token position on the scene canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// Combatant
// ============================================================================

/// A character or creature taking part in play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CharacterId,
    pub name: String,
    pub level: u32,
    pub xp: Experience,
    pub health: Pool,
    pub shield: Pool,
    pub action_points: ActionPoints,
    pub abilities: Abilities,
    pub open_attribute_points: u32,
    pub open_hp_points: u32,
    pub evasion: i32,
    pub counter: i32,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub offense: OffenseProfile,
    #[serde(default)]
    pub defense: DefenseProfile,
}

impl Combatant {
    /// A fresh level 1 combatant with the stock starting pools.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            level: 1,
            xp: Experience::new(0, 5),
            health: Pool::new(80),
            shield: Pool::with_value(0, 0),
            action_points: ActionPoints::new(0.0),
            abilities: Abilities::default(),
            open_attribute_points: 0,
            open_hp_points: 0,
            evasion: 0,
            counter: 0,
            position: Position::default(),
            offense: OffenseProfile::default(),
            defense: DefenseProfile::default(),
        }
    }

    pub fn with_abilities(mut self, abilities: Abilities) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_health(mut self, value: i32, max: i32) -> Self {
        self.health = Pool::with_value(value, max);
        self
    }

    pub fn with_action_points(mut self, action_points: ActionPoints) -> Self {
        self.action_points = action_points;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_offense(mut self, offense: OffenseProfile) -> Self {
        self.offense = offense;
        self
    }

    pub fn with_defense(mut self, defense: DefenseProfile) -> Self {
        self.defense = defense;
        self
    }

    pub fn is_down(&self) -> bool {
        self.health.is_empty()
    }
}

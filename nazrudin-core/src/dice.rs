//! Dice rolling.
//!
//! Expressions are built in code (attack and spell rolls are always one d20
//! plus a modifier). All rolls go through a [`DieRoller`] so callers can swap
//! the thread RNG for a seeded one or for scripted faces.

use rand::rngs::ThreadRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// Source of die faces.
pub trait DieRoller {
    /// Roll one die, returning a face in `1..=die.sides()`.
    fn roll_die(&mut self, die: DieType) -> u32;
}

/// [`DieRoller`] backed by a `rand` RNG.
#[derive(Debug, Clone)]
pub struct RandomRoller<R> {
    rng: R,
}

impl RandomRoller<ThreadRng> {
    pub fn thread() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl<R: Rng> RandomRoller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> DieRoller for RandomRoller<R> {
    fn roll_die(&mut self, die: DieType) -> u32 {
        self.rng.gen_range(1..=die.sides())
    }
}

/// A single die component of a dice expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceComponent {
    pub count: u32,
    pub die_type: DieType,
}

/// A complete dice expression (e.g., 1d20+10).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub components: Vec<DiceComponent>,
    pub modifier: i32,
    pub original: String,
}

impl DiceExpression {
    /// `1d20` plus a flat modifier.
    pub fn d20_plus(modifier: i32) -> Self {
        let original = if modifier < 0 {
            format!("1d20-{}", modifier.abs())
        } else {
            format!("1d20+{modifier}")
        };
        DiceExpression {
            components: vec![DiceComponent {
                count: 1,
                die_type: DieType::D20,
            }],
            modifier,
            original,
        }
    }

    /// Roll the expression with the given roller.
    pub fn roll_with(&self, roller: &mut impl DieRoller) -> RollResult {
        let component_results: Vec<ComponentResult> = self
            .components
            .iter()
            .map(|component| {
                let rolls: Vec<u32> = (0..component.count)
                    .map(|_| roller.roll_die(component.die_type))
                    .collect();
                ComponentResult {
                    die_type: component.die_type,
                    subtotal: rolls.iter().sum(),
                    rolls,
                }
            })
            .collect();

        let dice_total: i32 = component_results.iter().map(|c| c.subtotal as i32).sum();

        RollResult {
            expression: self.clone(),
            component_results,
            modifier: self.modifier,
            total: dice_total + self.modifier,
        }
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Result of rolling a single dice component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentResult {
    pub die_type: DieType,
    pub rolls: Vec<u32>,
    pub subtotal: u32,
}

/// Complete result of a dice roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub expression: DiceExpression,
    pub component_results: Vec<ComponentResult>,
    pub modifier: i32,
    pub total: i32,
}

impl RollResult {
    /// Format the individual dice results for display.
    pub fn dice_display(&self) -> String {
        let dice_str = self
            .component_results
            .iter()
            .map(|c| {
                format!(
                    "[{}]",
                    c.rolls
                        .iter()
                        .map(|r| r.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join(" + ");

        match self.modifier {
            0 => dice_str,
            m if m > 0 => format!("{dice_str} + {m}"),
            m => format!("{} - {}", dice_str, m.abs()),
        }
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.dice_display(), self.total)
    }
}

//! Attack roll resolution.
//!
//! An attack is `1d20 + modifier`, rolled once or twice depending on the
//! [`AttackMode`]. There is no miss state: every resolved attack goes on to
//! the damage step, so the roll only decides whether that damage is critical.

use crate::dice::{DiceExpression, DieRoller, DieType, RollResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default minimum raw face that counts as a critical hit.
pub const DEFAULT_CRITICAL_THRESHOLD: u32 = 18;

/// How many d20s are rolled and which one is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttackMode {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl AttackMode {
    pub fn dice_count(&self) -> usize {
        match self {
            AttackMode::Normal => 1,
            AttackMode::Advantage | AttackMode::Disadvantage => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttackMode::Normal => "normal",
            AttackMode::Advantage => "advantage",
            AttackMode::Disadvantage => "disadvantage",
        }
    }
}

impl fmt::Display for AttackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One evaluated `1d20 + modifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    /// Raw die face before modifiers.
    pub face: u32,
    pub total: i32,
}

/// Outcome of an attack roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRoll {
    pub mode: AttackMode,
    pub modifier: i32,
    /// Every evaluation, in roll order.
    pub rolls: Vec<D20Roll>,
    /// The evaluation the mode keeps.
    pub chosen: D20Roll,
    pub is_critical: bool,
}

impl AttackRoll {
    /// Build the result from already-rolled faces.
    ///
    /// Returns `None` when `faces` is empty. A normal attack uses only the
    /// first face. Advantage keeps the first roll on ties (`>=`),
    /// disadvantage likewise (`<=`).
    pub fn from_faces(
        faces: &[u32],
        modifier: i32,
        mode: AttackMode,
        critical_threshold: u32,
    ) -> Option<Self> {
        faces.split_first().map(|(&first, rest)| {
            Self::from_rolls(first, rest.first().copied(), modifier, mode, critical_threshold)
        })
    }

    fn from_rolls(
        first: u32,
        second: Option<u32>,
        modifier: i32,
        mode: AttackMode,
        critical_threshold: u32,
    ) -> Self {
        let eval = |face: u32| D20Roll {
            face,
            total: (face as i32).saturating_add(modifier),
        };
        let first = eval(first);
        let second = second.filter(|_| mode.dice_count() > 1).map(eval);
        let rolls: Vec<D20Roll> = std::iter::once(first).chain(second).collect();

        let chosen = match (mode, second) {
            (AttackMode::Advantage, Some(second)) => {
                if first.total >= second.total {
                    first
                } else {
                    second
                }
            }
            (AttackMode::Disadvantage, Some(second)) => {
                if first.total <= second.total {
                    first
                } else {
                    second
                }
            }
            _ => first,
        };

        AttackRoll {
            mode,
            modifier,
            rolls,
            chosen,
            is_critical: chosen.face >= critical_threshold,
        }
    }

    pub fn total(&self) -> i32 {
        self.chosen.total
    }

    /// Format the individual rolls for display, dropped rolls in parentheses.
    pub fn dice_display(&self) -> String {
        let mut kept_shown = false;
        let faces: Vec<String> = self
            .rolls
            .iter()
            .map(|r| {
                if !kept_shown && *r == self.chosen {
                    kept_shown = true;
                    r.face.to_string()
                } else {
                    format!("({})", r.face)
                }
            })
            .collect();
        match self.modifier {
            0 => format!("[{}]", faces.join(", ")),
            m if m > 0 => format!("[{}] + {}", faces.join(", "), m),
            m => format!("[{}] - {}", faces.join(", "), m.abs()),
        }
    }
}

impl fmt::Display for AttackRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.dice_display(), self.total())?;
        if self.is_critical {
            write!(f, " (critical)")?;
        }
        Ok(())
    }
}

/// Roll an attack: one or two independent `1d20 + modifier` evaluations.
pub fn resolve_attack(
    modifier: i32,
    mode: AttackMode,
    critical_threshold: u32,
    roller: &mut impl DieRoller,
) -> AttackRoll {
    let first = roller.roll_die(DieType::D20);
    let second = (mode.dice_count() > 1).then(|| roller.roll_die(DieType::D20));
    AttackRoll::from_rolls(first, second, modifier, mode, critical_threshold)
}

/// Initiative is `1d20 + agi.mod`.
pub fn roll_initiative(agi_modifier: i32, roller: &mut impl DieRoller) -> RollResult {
    DiceExpression::d20_plus(agi_modifier).roll_with(roller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::RandomRoller;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_advantage_keeps_higher() {
        let roll = AttackRoll::from_faces(&[12, 17], 0, AttackMode::Advantage, 18).unwrap();
        assert_eq!(roll.chosen.face, 17);
        assert!(!roll.is_critical);

        let roll = AttackRoll::from_faces(&[18, 5], 0, AttackMode::Advantage, 18).unwrap();
        assert_eq!(roll.chosen.face, 18);
        assert!(roll.is_critical);
    }

    #[test]
    fn test_disadvantage_keeps_lower() {
        let roll = AttackRoll::from_faces(&[19, 4], 3, AttackMode::Disadvantage, 18).unwrap();
        assert_eq!(roll.chosen, D20Roll { face: 4, total: 7 });
        assert!(!roll.is_critical);
    }

    #[test]
    fn test_normal_uses_single_roll() {
        let roll = AttackRoll::from_faces(&[18, 2], 1, AttackMode::Normal, 18).unwrap();
        assert_eq!(roll.rolls.len(), 1);
        assert_eq!(roll.total(), 19);
        assert!(roll.is_critical);
    }

    #[test]
    fn test_critical_uses_raw_face_not_total() {
        // 17 + 5 = 22 is a high total but not a critical
        let roll = AttackRoll::from_faces(&[17], 5, AttackMode::Normal, 18).unwrap();
        assert_eq!(roll.total(), 22);
        assert!(!roll.is_critical);
    }

    #[test]
    fn test_no_faces_gives_no_roll() {
        assert_eq!(AttackRoll::from_faces(&[], 0, AttackMode::Normal, 18), None);
        assert_eq!(AttackRoll::from_faces(&[], 4, AttackMode::Advantage, 18), None);

        // Advantage with a single face keeps that face
        let roll = AttackRoll::from_faces(&[6], 0, AttackMode::Advantage, 18).unwrap();
        assert_eq!(roll.rolls.len(), 1);
        assert_eq!(roll.chosen.face, 6);
    }

    #[test]
    fn test_tie_keeps_first_roll() {
        let roll = AttackRoll::from_faces(&[9, 9], 0, AttackMode::Advantage, 18).unwrap();
        assert_eq!(roll.dice_display(), "[9, (9)]");
    }

    #[test]
    fn test_resolve_attack_rolls_per_mode() {
        let mut roller = RandomRoller::new(StdRng::seed_from_u64(42));
        for mode in [AttackMode::Normal, AttackMode::Advantage, AttackMode::Disadvantage] {
            let roll = resolve_attack(2, mode, DEFAULT_CRITICAL_THRESHOLD, &mut roller);
            assert_eq!(roll.rolls.len(), mode.dice_count());
            assert!(roll.chosen.face >= 1 && roll.chosen.face <= 20);
        }
    }

    #[test]
    fn test_initiative_notation() {
        let mut roller = RandomRoller::new(StdRng::seed_from_u64(1));
        let roll = roll_initiative(-2, &mut roller);
        assert_eq!(roll.expression.original, "1d20-2");
        assert_eq!(roll.total, roll.component_results[0].subtotal as i32 - 2);
    }
}

//! Action-point ledger and movement pricing.

use crate::world::{Pool, Position};
use serde::{Deserialize, Serialize};

/// Per-turn action budget of a combatant.
///
/// Effective AP is `current + temp_bonus`. Only `current` is debited; the
/// bonus lives until the next turn reset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionPoints {
    pub current: f64,
    pub max: f64,
    pub temp_bonus: f64,
}

impl ActionPoints {
    /// A full ledger with no bonus.
    pub fn new(max: f64) -> Self {
        Self {
            current: max,
            max,
            temp_bonus: 0.0,
        }
    }

    pub fn with_temp_bonus(mut self, bonus: f64) -> Self {
        self.temp_bonus = bonus.max(0.0);
        self
    }

    pub fn effective(&self) -> f64 {
        self.current + self.temp_bonus
    }

    /// Spend `amount` AP. Floors at zero instead of rejecting the action;
    /// negative amounts are treated as zero.
    pub fn debit(&mut self, amount: f64) {
        let amount = amount.max(0.0);
        self.current = (self.current - amount).max(0.0);
    }

    /// Refill for the start of the owner's turn and drop any temporary bonus.
    pub fn reset_for_turn(&mut self) {
        self.current = self.max;
        self.temp_bonus = 0.0;
    }
}

/// Add the per-turn regeneration to a health pool, capped at its max.
pub fn regenerate_health(health: &mut Pool, amount: i32) -> i32 {
    health.heal(amount)
}

/// Displacement between two canvas positions, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridDelta {
    pub dx: f64,
    pub dy: f64,
}

impl GridDelta {
    pub fn between(from: Position, to: Position) -> Self {
        Self {
            dx: to.x - from.x,
            dy: to.y - from.y,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }

    /// Equal, non-zero displacement on both axes.
    pub fn is_diagonal(&self) -> bool {
        !self.is_zero() && self.dx.abs() == self.dy.abs()
    }
}

/// AP cost of a displacement on a grid of `grid_size` pixels per field.
///
/// Orthogonal (and mixed) moves cost half a point per field crossed on each
/// axis. Pure diagonals are priced as `2 * 0.5 * fields` along one axis.
pub fn movement_cost(delta: GridDelta, grid_size: f64) -> f64 {
    if grid_size <= 0.0 || delta.is_zero() {
        return 0.0;
    }
    let fields_x = delta.dx.abs() / grid_size;
    let fields_y = delta.dy.abs() / grid_size;

    if delta.is_diagonal() {
        2.0 * 0.5 * fields_x
    } else {
        0.5 * (fields_x + fields_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_floors_at_zero() {
        let mut ap = ActionPoints::new(6.0);
        ap.current = 3.0;
        ap.debit(5.0);
        assert_eq!(ap.current, 0.0);

        // Re-debiting an empty ledger is a no-op
        ap.debit(1.0);
        assert_eq!(ap.current, 0.0);
    }

    #[test]
    fn test_negative_debit_is_ignored() {
        let mut ap = ActionPoints::new(4.0);
        ap.debit(-2.0);
        assert_eq!(ap.current, 4.0);
    }

    #[test]
    fn test_reset_clears_bonus() {
        let mut ap = ActionPoints::new(6.0).with_temp_bonus(2.0);
        ap.debit(4.0);
        assert_eq!(ap.effective(), 4.0);

        ap.reset_for_turn();
        assert_eq!(ap.current, 6.0);
        assert_eq!(ap.temp_bonus, 0.0);
    }

    #[test]
    fn test_regeneration_caps_at_max() {
        let mut hp = Pool::with_value(77, 80);
        assert_eq!(regenerate_health(&mut hp, 5), 3);
        assert_eq!(hp.value, 80);
    }

    #[test]
    fn test_orthogonal_cost() {
        let delta = GridDelta::between(Position::new(0.0, 0.0), Position::new(300.0, 0.0));
        assert_eq!(movement_cost(delta, 100.0), 1.5);

        let mixed = GridDelta { dx: 200.0, dy: -100.0 };
        assert_eq!(movement_cost(mixed, 100.0), 1.5);
    }

    #[test]
    fn test_diagonal_cost() {
        let delta = GridDelta { dx: -200.0, dy: 200.0 };
        assert!(delta.is_diagonal());
        assert_eq!(movement_cost(delta, 100.0), 2.0);
    }

    #[test]
    fn test_no_movement_is_free() {
        let delta = GridDelta { dx: 0.0, dy: 0.0 };
        assert!(!delta.is_diagonal());
        assert_eq!(movement_cost(delta, 100.0), 0.0);
    }
}

//! Provisional token movement.
//!
//! A move is priced when the host reports it, held while the player decides,
//! and then either committed (AP debited, new position kept) or rolled back
//! (original position restored, AP untouched). Only one move may wait for a
//! decision at a time.

use crate::action_points::{movement_cost, GridDelta};
use crate::config::RulesConfig;
use crate::update::CombatantUpdate;
use crate::world::{CharacterId, Combatant, Position};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MovementError {
    #[error("A move by {0} is already awaiting confirmation")]
    AlreadyInFlight(CharacterId),

    #[error("No move is awaiting confirmation")]
    NothingInFlight,

    #[error("Pending move belongs to {expected}, not {found}")]
    WrongMover {
        expected: CharacterId,
        found: CharacterId,
    },

    #[error("Position must be finite")]
    InvalidPosition,

    #[error("Grid size must be finite and positive, got {0}")]
    InvalidGridSize(f64),
}

/// A priced move waiting for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingMove {
    pub mover: CharacterId,
    pub from: Position,
    pub to: Position,
    pub cost: f64,
}

/// How a pending move ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Committed {
        cost: f64,
        position: Position,
        update: CombatantUpdate,
    },
    RolledBack {
        position: Position,
        update: CombatantUpdate,
    },
}

impl MoveOutcome {
    pub fn update(&self) -> &CombatantUpdate {
        match self {
            MoveOutcome::Committed { update, .. } | MoveOutcome::RolledBack { update, .. } => {
                update
            }
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, MoveOutcome::Committed { .. })
    }
}

/// Owns the pending move and the echo guard.
#[derive(Debug, Clone)]
pub struct MovementController {
    grid_size: f64,
    in_flight: Option<PendingMove>,
    /// Position write we issued on rollback; the host will report it back.
    rollback_echo: Option<(CharacterId, Position)>,
}

impl MovementController {
    pub fn new(grid_size: f64) -> Result<Self, MovementError> {
        if !grid_size.is_finite() || grid_size <= 0.0 {
            return Err(MovementError::InvalidGridSize(grid_size));
        }
        Ok(Self {
            grid_size,
            in_flight: None,
            rollback_echo: None,
        })
    }

    /// Controller using the configured grid size.
    pub fn from_config(config: &RulesConfig) -> Result<Self, MovementError> {
        Self::new(config.grid_size)
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn pending(&self) -> Option<&PendingMove> {
        self.in_flight.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Price a move of `mover` from its recorded position to `to`.
    pub fn propose(&mut self, mover: &Combatant, to: Position) -> Result<PendingMove, MovementError> {
        if let Some(pending) = &self.in_flight {
            return Err(MovementError::AlreadyInFlight(pending.mover));
        }
        if !to.x.is_finite() || !to.y.is_finite() {
            return Err(MovementError::InvalidPosition);
        }

        let cost = movement_cost(GridDelta::between(mover.position, to), self.grid_size);
        let pending = PendingMove {
            mover: mover.id,
            from: mover.position,
            to,
            cost,
        };
        tracing::debug!(
            mover = %mover.name,
            from = %pending.from,
            to = %pending.to,
            cost,
            "Movement awaiting confirmation"
        );
        self.in_flight = Some(pending);
        Ok(pending)
    }

    /// Whether a position report from the host should be ignored.
    ///
    /// Reports for the mover of the pending move are ignored, as is the echo
    /// of our own rollback write (consumed on first sight).
    pub fn is_suppressed(&mut self, id: CharacterId, position: Position) -> bool {
        if self.in_flight.is_some_and(|p| p.mover == id) {
            return true;
        }
        if self.rollback_echo == Some((id, position)) {
            self.rollback_echo = None;
            return true;
        }
        false
    }

    /// Finish the pending move. `mover` is the current record of the mover.
    pub fn resolve(
        &mut self,
        mover: &Combatant,
        accepted: bool,
    ) -> Result<MoveOutcome, MovementError> {
        let pending = self.in_flight.ok_or(MovementError::NothingInFlight)?;
        if pending.mover != mover.id {
            return Err(MovementError::WrongMover {
                expected: pending.mover,
                found: mover.id,
            });
        }
        self.in_flight = None;

        let mut update = CombatantUpdate::new(mover.id);
        if accepted {
            let mut ap = mover.action_points;
            ap.debit(pending.cost);
            update.ap_current = Some(ap.current);
            update.position = Some(pending.to);
            tracing::info!(
                mover = %mover.name,
                cost = pending.cost,
                remaining = ap.current,
                "Movement committed"
            );
            Ok(MoveOutcome::Committed {
                cost: pending.cost,
                position: pending.to,
                update,
            })
        } else {
            update.position = Some(pending.from);
            self.rollback_echo = Some((mover.id, pending.from));
            tracing::info!(mover = %mover.name, position = %pending.from, "Movement rolled back");
            Ok(MoveOutcome::RolledBack {
                position: pending.from,
                update,
            })
        }
    }

    /// Wait for the player's answer. A sender dropped without answering
    /// counts as declined.
    pub async fn await_decision(
        &mut self,
        mover: &Combatant,
        answer: oneshot::Receiver<bool>,
    ) -> Result<MoveOutcome, MovementError> {
        let accepted = answer.await.unwrap_or(false);
        self.resolve(mover, accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_points::ActionPoints;

    fn mover() -> Combatant {
        Combatant::new("Runner")
            .with_action_points(ActionPoints::new(6.0))
            .with_position(Position::new(0.0, 0.0))
    }

    #[test]
    fn test_accept_debits_and_keeps_position() {
        let runner = mover();
        let mut controller = MovementController::new(100.0).unwrap();

        let pending = controller.propose(&runner, Position::new(200.0, 0.0)).unwrap();
        assert_eq!(pending.cost, 1.0);

        let outcome = controller.resolve(&runner, true).unwrap();
        assert!(outcome.is_committed());
        assert_eq!(outcome.update().ap_current, Some(5.0));
        assert_eq!(outcome.update().position, Some(Position::new(200.0, 0.0)));
        assert!(!controller.is_busy());
    }

    #[test]
    fn test_grid_size_must_be_positive() {
        for size in [0.0, -50.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                MovementController::new(size),
                Err(MovementError::InvalidGridSize(_))
            ));
        }

        let controller = MovementController::from_config(&RulesConfig::default()).unwrap();
        assert_eq!(controller.grid_size(), RulesConfig::default().grid_size);

        // A positive grid always prices a real move above zero
        let mut controller = MovementController::new(1.0).unwrap();
        let pending = controller.propose(&mover(), Position::new(3.0, 4.0)).unwrap();
        assert!(pending.cost.is_finite() && pending.cost > 0.0);
    }

    #[test]
    fn test_reject_restores_position_without_debit() {
        let runner = mover();
        let mut controller = MovementController::new(100.0).unwrap();
        controller.propose(&runner, Position::new(300.0, 300.0)).unwrap();

        let outcome = controller.resolve(&runner, false).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::RolledBack {
                position: Position::new(0.0, 0.0),
                update: {
                    let mut u = CombatantUpdate::new(runner.id);
                    u.position = Some(Position::new(0.0, 0.0));
                    u
                },
            }
        );
        assert_eq!(outcome.update().ap_current, None);
    }

    #[test]
    fn test_single_move_in_flight() {
        let runner = mover();
        let other = mover();
        let mut controller = MovementController::new(100.0).unwrap();
        controller.propose(&runner, Position::new(100.0, 0.0)).unwrap();

        assert_eq!(
            controller.propose(&other, Position::new(0.0, 100.0)),
            Err(MovementError::AlreadyInFlight(runner.id))
        );
        assert!(matches!(
            controller.resolve(&other, true),
            Err(MovementError::WrongMover { .. })
        ));
    }

    #[test]
    fn test_echo_suppression() {
        let runner = mover();
        let mut controller = MovementController::new(100.0).unwrap();
        controller.propose(&runner, Position::new(100.0, 0.0)).unwrap();
        assert!(controller.is_suppressed(runner.id, Position::new(100.0, 0.0)));

        controller.resolve(&runner, false).unwrap();
        assert!(controller.is_suppressed(runner.id, Position::new(0.0, 0.0)));
        // Consumed
        assert!(!controller.is_suppressed(runner.id, Position::new(0.0, 0.0)));
    }

    #[test]
    fn test_resolve_without_proposal() {
        let mut controller = MovementController::new(100.0).unwrap();
        assert_eq!(
            controller.resolve(&mover(), true),
            Err(MovementError::NothingInFlight)
        );
    }

    #[tokio::test]
    async fn test_dropped_sender_declines() {
        let runner = mover();
        let mut controller = MovementController::new(100.0).unwrap();
        controller.propose(&runner, Position::new(100.0, 100.0)).unwrap();

        let (tx, rx) = oneshot::channel::<bool>();
        drop(tx);
        let outcome = controller.await_decision(&runner, rx).await.unwrap();
        assert!(!outcome.is_committed());
    }

    #[tokio::test]
    async fn test_answer_accepts() {
        let runner = mover();
        let mut controller = MovementController::new(100.0).unwrap();
        controller.propose(&runner, Position::new(100.0, 100.0)).unwrap();

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(true);
        });
        let outcome = controller.await_decision(&runner, rx).await.unwrap();
        assert_eq!(outcome.update().ap_current, Some(5.0));
    }
}

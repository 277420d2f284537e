//! Async paths: loading rules configuration and confirming movement.

use nazrudin_core::action_points::ActionPoints;
use nazrudin_core::rules::Change;
use nazrudin_core::testing::sample_combatant;
use nazrudin_core::{
    Ability, AttackMode, ConfigError, InMemoryRegistry, Item, MoveOutcome, MovementController,
    MovementError, Position, Registry, RulesConfig, TestHarness,
};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn test_load_config_from_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");
    tokio::fs::write(
        &path,
        r##"{
            "critical_threshold": 20,
            "health_regen_per_turn": 2,
            "attack_costs": { "advantage": 3 },
            "text_colors": { "critical": "#ff00ff" }
        }"##,
    )
    .await
    .unwrap();

    let config = RulesConfig::load(&path).await.unwrap();
    assert_eq!(config.critical_threshold, 20);
    assert_eq!(config.health_regen_per_turn, 2);
    assert_eq!(config.attack_costs.advantage, 3.0);
    assert_eq!(config.attack_costs.normal, 1.0);
    assert_eq!(config.text_colors.critical, "#ff00ff");
    assert_eq!(config.defaults.health_max, 80);

    // A face of 18 is no longer critical
    let mut harness = TestHarness::with_config(config).unwrap();
    let hero = harness.add_combatant(sample_combatant("Hero", 10, 0));
    let foe = harness.add_combatant(sample_combatant("Foe", 10, 0));
    let sword = harness.add_item(Item::weapon("Sword", 10.0, Ability::Kkf));
    harness.script_rolls([18, 2]);
    let resolution = harness
        .attack(hero, foe, sword, AttackMode::Advantage)
        .unwrap();

    assert!(resolution.changes.iter().any(|c| matches!(
        c,
        Change::AttackRolled { roll, .. } if !roll.is_critical
    )));
    assert_eq!(harness.health(foe), Some((70, 80)));
    assert_eq!(harness.action_points(hero), Some(3.0));
}

#[tokio::test]
async fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");

    let config = RulesConfig::new().with_grid_size(50.0).with_health_regen(0);
    config.save(&path).await.unwrap();
    let loaded = RulesConfig::load(&path).await.unwrap();
    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_load_rejects_bad_files() {
    let dir = tempfile::tempdir().unwrap();

    let missing = RulesConfig::load(dir.path().join("absent.json")).await;
    assert!(matches!(missing, Err(ConfigError::Io(_))));

    let path = dir.path().join("bad.json");
    tokio::fs::write(&path, r#"{"grid_size": -10}"#).await.unwrap();
    assert!(matches!(
        RulesConfig::load(&path).await,
        Err(ConfigError::Invalid(_))
    ));

    tokio::fs::write(&path, "not json").await.unwrap();
    assert!(matches!(
        RulesConfig::load(&path).await,
        Err(ConfigError::Json(_))
    ));
}

// =============================================================================
// Movement
// =============================================================================

fn registry_with_runner() -> (InMemoryRegistry, nazrudin_core::CharacterId) {
    let mut registry = InMemoryRegistry::new();
    let runner = sample_combatant("Runner", 10, 0)
        .with_action_points(ActionPoints::new(3.0))
        .with_position(Position::new(100.0, 100.0));
    let id = registry.insert_combatant(runner);
    (registry, id)
}

#[tokio::test]
async fn test_confirmed_move_is_committed() {
    init_tracing();
    let (mut registry, id) = registry_with_runner();
    let mut controller = MovementController::from_config(&RulesConfig::default()).unwrap();

    let runner = registry.combatant(id).cloned().unwrap();
    let pending = controller
        .propose(&runner, Position::new(400.0, 200.0))
        .unwrap();
    // 0.5 * (3 + 1)
    assert_eq!(pending.cost, 2.0);

    let (tx, rx) = oneshot::channel();
    let dialog = tokio::spawn(async move {
        tx.send(true).unwrap();
    });
    let outcome = controller.await_decision(&runner, rx).await.unwrap();
    dialog.await.unwrap();

    registry.commit(outcome.update()).unwrap();
    let runner = registry.combatant(id).unwrap();
    assert_eq!(runner.position, Position::new(400.0, 200.0));
    assert_eq!(runner.action_points.current, 1.0);
}

#[tokio::test]
async fn test_closed_dialog_rolls_back() {
    let (mut registry, id) = registry_with_runner();
    let mut controller = MovementController::new(100.0).unwrap();

    let runner = registry.combatant(id).cloned().unwrap();
    controller
        .propose(&runner, Position::new(300.0, 300.0))
        .unwrap();

    // The host moved the token before asking
    let mut moved = nazrudin_core::CombatantUpdate::new(id);
    moved.position = Some(Position::new(300.0, 300.0));
    registry.commit(&moved).unwrap();
    assert!(controller.is_suppressed(id, Position::new(300.0, 300.0)));

    let (tx, rx) = oneshot::channel::<bool>();
    drop(tx);
    let outcome = controller.await_decision(&runner, rx).await.unwrap();
    assert!(matches!(outcome, MoveOutcome::RolledBack { .. }));

    registry.commit(outcome.update()).unwrap();
    let after = registry.combatant(id).unwrap();
    assert_eq!(after.position, Position::new(100.0, 100.0));
    assert_eq!(after.action_points.current, 3.0);
    assert!(controller.is_suppressed(id, Position::new(100.0, 100.0)));
}

#[tokio::test]
async fn test_second_mover_waits() {
    let (mut registry, id) = registry_with_runner();
    let other = registry.insert_combatant(sample_combatant("Other", 10, 0));
    let mut controller = MovementController::new(100.0).unwrap();

    let runner = registry.combatant(id).cloned().unwrap();
    let other = registry.combatant(other).cloned().unwrap();
    controller
        .propose(&runner, Position::new(200.0, 100.0))
        .unwrap();
    assert_eq!(
        controller.propose(&other, Position::new(100.0, 0.0)),
        Err(MovementError::AlreadyInFlight(id))
    );

    let (tx, rx) = oneshot::channel();
    tx.send(false).unwrap();
    controller.await_decision(&runner, rx).await.unwrap();

    // Free again
    assert!(controller.propose(&other, Position::new(100.0, 0.0)).is_ok());
}

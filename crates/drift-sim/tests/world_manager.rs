//! World manager behaviour against the scripted simulator.

use drift_core::error::SimError;
use drift_core::types::Control;
use drift_sim::retry::RetryPolicy;
use drift_sim::world::WorldManager;
use drift_test_utils::{ScriptedFactory, ScriptedSimulator, SimCall};

fn world(factory: &ScriptedFactory, attempts: u32) -> WorldManager {
    WorldManager::new(Box::new(factory.clone()), RetryPolicy::immediate(attempts))
        .with_scenario("Shanghai_center.mat")
}

#[test]
fn scenario_loaded_into_each_new_session() {
    let factory = ScriptedFactory::new(ScriptedSimulator::new());
    let log = factory.call_log();
    let mut world = world(&factory, 3);

    world.restart().unwrap();
    world.restart().unwrap();

    let loads = log.count(|c| matches!(c, SimCall::Load(s) if s == "Shanghai_center.mat"));
    assert_eq!(loads, 2);
    assert_eq!(world.sessions_opened(), 2);
}

#[test]
fn reset_player_stops_before_respawning() {
    let factory = ScriptedFactory::new(ScriptedSimulator::new());
    let log = factory.call_log();
    let mut world = world(&factory, 1);

    world.reset_player().unwrap();
    assert_eq!(
        log.calls(),
        vec![
            SimCall::Load("Shanghai_center.mat".into()),
            SimCall::Stop,
            SimCall::Reset,
        ]
    );
}

#[test]
fn reset_after_driving_sends_no_further_control() {
    let factory = ScriptedFactory::new(ScriptedSimulator::new());
    let log = factory.call_log();
    let mut world = world(&factory, 1);
    world.reset_player().unwrap();
    let control = Control {
        steer: 0.3,
        throttle: 0.7,
        brake: 0.0,
    };
    world.advance(control).unwrap();
    log.clear();

    let raw = world.reset_player().unwrap();
    assert_eq!(log.calls(), vec![SimCall::Stop, SimCall::Reset]);
    assert!(raw.s.abs() < f64::EPSILON);
    assert!(raw.yaw_rate.abs() < f64::EPSILON);
}

#[test]
fn refused_connects_are_retried() {
    let factory = ScriptedFactory::new(ScriptedSimulator::new()).with_failed_connects(2);
    let mut world = world(&factory, 3);
    world.reset_player().unwrap();
    assert!(world.has_vehicle());
    assert_eq!(factory.connects(), 3);
}

#[test]
fn acquisition_bound_is_reported() {
    let factory = ScriptedFactory::new(ScriptedSimulator::new()).with_failed_connects(100);
    let mut world = world(&factory, 4);
    let err = world.reset_player().unwrap_err();
    assert!(matches!(
        err,
        SimError::VehicleAcquisitionTimeout { attempts: 4 }
    ));
    assert_eq!(factory.connects(), 4);
}

#[test]
fn fault_then_reset_reacquires() {
    let factory = ScriptedFactory::new(ScriptedSimulator::new().with_fault_at(2));
    let mut world = world(&factory, 2);

    world.reset_player().unwrap();
    world.advance(Control::ZERO).unwrap();
    assert!(world.advance(Control::ZERO).is_err());
    assert!(!world.has_vehicle());

    let raw = world.reset_player().unwrap();
    assert!(raw.s.abs() < f64::EPSILON);
    assert!(world.has_vehicle());
    assert_eq!(world.sessions_opened(), 2);
}

#[test]
fn controls_forwarded_unchanged() {
    let factory = ScriptedFactory::new(ScriptedSimulator::new());
    let log = factory.call_log();
    let mut world = world(&factory, 1);
    world.reset_player().unwrap();

    let control = Control {
        steer: -0.75,
        throttle: 0.5,
        brake: 0.0,
    };
    world.advance(control).unwrap();
    assert_eq!(log.calls().last(), Some(&SimCall::Advance(control)));
}

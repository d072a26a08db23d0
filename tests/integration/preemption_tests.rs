//! Preemption and cancellation with the drive loop on a real thread.
//!
//! Virtual time comes from [`SimClock`]; each tick also yields for a real
//! millisecond, so a full 0→100 move takes roughly 100 ms of wall time.

use std::time::Duration;

use zbshade::app::motion::{Direction, MoveStatus};
use zbshade::app::ports::Clock;
use zbshade::app::state::ShadeState;

use crate::mock_hw::{MemStore, MotorCall, Rig, pct, wait_until};

fn wait_for_virtual_ms(rig: &Rig, ms: u64) {
    assert!(
        wait_until(Duration::from_secs(10), || rig.clock.now_ms() >= ms),
        "virtual clock never reached {ms} ms"
    );
}

#[test]
fn reversal_mid_move_stops_before_driving_back() {
    let rig = Rig::threaded(MemStore::default());

    rig.shade.set_tilt_percentage(100).unwrap();
    assert!(rig.shade.is_moving());
    wait_for_virtual_ms(&rig, 200);

    let status = rig.shade.set_tilt_percentage(0).unwrap();
    assert!(matches!(status, MoveStatus::Started(_)));
    assert_eq!(rig.shade.state(), ShadeState::Closing);
    rig.wait_idle();

    assert_eq!(
        rig.motor.calls(),
        vec![
            MotorCall::Forward,
            MotorCall::Stop,
            MotorCall::Backward,
            MotorCall::Stop
        ]
    );
    assert_eq!(rig.shade.get_tilt_percentage(), pct(0));
    // Only the completed move is persisted.
    assert_eq!(rig.store.writes(), vec![pct(0)]);
    assert_eq!(rig.reporter.reports(), vec![pct(0)]);
}

#[test]
fn burst_of_requests_never_overlaps_drives() {
    let rig = Rig::threaded(MemStore::default());

    for (i, t) in [90u8, 10, 60, 30, 80].into_iter().enumerate() {
        rig.shade.set_tilt_percentage(t).unwrap();
        wait_for_virtual_ms(&rig, 30 * (i as u64 + 1));
    }
    rig.wait_idle();

    assert!(rig.motor.stop_between_directions());
    assert_eq!(rig.motor.calls().last(), Some(&MotorCall::Stop));
    assert_eq!(rig.shade.get_tilt_percentage(), pct(80));
    assert_eq!(rig.store.writes().last(), Some(&pct(80)));
}

#[test]
fn estimate_moves_monotonically_towards_target() {
    let rig = Rig::threaded(MemStore::with(10));

    rig.shade.set_tilt_percentage(70).unwrap();
    let mut seen = Vec::new();
    while rig.shade.is_moving() {
        seen.push(rig.shade.get_tilt_percentage().get());
        std::thread::sleep(Duration::from_millis(1));
    }
    seen.push(rig.shade.get_tilt_percentage().get());

    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "went backwards: {seen:?}");
    assert!(seen.iter().all(|&t| (10..=70).contains(&t)));
    assert_eq!(seen.last(), Some(&70));
}

#[test]
fn stop_command_does_not_halt_a_tilt_move() {
    let rig = Rig::threaded(MemStore::default());

    rig.shade.set_tilt_percentage(40).unwrap();
    rig.shade.set_state(ShadeState::Idle);
    rig.wait_idle();

    assert_eq!(rig.shade.get_tilt_percentage(), pct(40));
    assert_eq!(rig.store.writes(), vec![pct(40)]);
}

#[test]
fn halt_stops_motor_and_keeps_partial_estimate() {
    let rig = Rig::threaded(MemStore::default());

    rig.shade.set_tilt_percentage(100).unwrap();
    wait_for_virtual_ms(&rig, 150);

    assert_eq!(rig.shade.halt(), Ok(true));
    assert!(!rig.shade.is_moving());
    assert_eq!(rig.motor.calls(), vec![MotorCall::Forward, MotorCall::Stop]);

    let t = rig.shade.get_tilt_percentage().get();
    assert!(t > 0 && t < 100, "expected a partial estimate, got {t}");
    assert!(rig.reporter.reports().is_empty());

    // Nothing left to halt.
    assert_eq!(rig.shade.halt(), Ok(false));
}

#[test]
fn request_for_partial_position_after_halt_is_a_no_op() {
    let rig = Rig::threaded(MemStore::default());

    rig.shade.set_tilt_percentage(100).unwrap();
    wait_for_virtual_ms(&rig, 100);
    rig.shade.halt().unwrap();

    let here = rig.shade.get_tilt_percentage().get();
    assert_eq!(rig.shade.set_tilt_percentage(here), Ok(MoveStatus::AtTarget));
    assert_eq!(rig.motor.calls(), vec![MotorCall::Forward, MotorCall::Stop]);
}

#[test]
fn request_for_position_the_move_is_passing_retires_it() {
    let rig = Rig::threaded(MemStore::default());

    rig.shade.set_tilt_percentage(100).unwrap();
    assert!(
        wait_until(Duration::from_secs(10), || rig.shade.get_tilt_percentage() >= pct(20)),
        "move never reached 20%"
    );

    let here = rig.shade.get_tilt_percentage();
    let status = rig.shade.set_tilt_percentage(here.get()).unwrap();
    match status {
        // Stopped exactly on `here`: the old drive must be gone already.
        MoveStatus::AtTarget => {
            assert!(!rig.shade.is_moving());
            assert_eq!(rig.motor.calls(), vec![MotorCall::Forward, MotorCall::Stop]);
        }
        // The estimate crept past `here` before the cancel landed.
        MoveStatus::Started(req) => assert_eq!(req.direction, Direction::Backward),
    }
    rig.wait_idle();

    assert_eq!(rig.shade.get_tilt_percentage(), here);
    assert!(!rig.store.writes().contains(&pct(100)));
    assert!(!rig.reporter.reports().contains(&pct(100)));
    assert_eq!(&rig.motor.calls()[..2], &[MotorCall::Forward, MotorCall::Stop]);
}

//! Position persistence across controller restarts.

use std::sync::Arc;
use std::time::Duration;

use zbshade::adapters::nvs::NvsPositionStore;
use zbshade::app::ports::{Clock, PositionStore, StoreError};
use zbshade::app::service::ShadeController;
use zbshade::config::ShadeConfig;

use crate::mock_hw::{InlineSpawner, MemStore, MockMotor, Rig, SimClock, pct, wait_until};

fn controller_on(store: Arc<dyn PositionStore>) -> ShadeController {
    let mut shade = ShadeController::new(
        ShadeConfig::with_ms_per_tilt_percent(10),
        store,
        Arc::new(SimClock::default()),
        Arc::new(InlineSpawner),
    );
    shade.register_motor(Arc::new(MockMotor::default()));
    shade
}

#[test]
fn first_boot_starts_at_zero() {
    let rig = Rig::inline(MemStore::default());
    assert_eq!(rig.shade.get_tilt_percentage(), pct(0));
}

#[test]
fn settled_position_survives_restart() {
    let store = Arc::new(NvsPositionStore::new().unwrap());

    let shade = controller_on(store.clone());
    shade.set_tilt_percentage(50).unwrap();
    drop(shade);

    let restarted = controller_on(store.clone());
    assert_eq!(restarted.get_tilt_percentage(), pct(50));
    assert_eq!(store.read_raw(), Some(50));
}

#[test]
fn corrupted_record_falls_back_to_zero() {
    let store = Arc::new(NvsPositionStore::new().unwrap());
    store.write_raw(250);

    let shade = controller_on(store);
    assert_eq!(shade.get_tilt_percentage(), pct(0));
}

#[test]
fn unreadable_store_falls_back_to_zero() {
    let rig = Rig::inline(MemStore::failing_load(StoreError::IoError));
    assert_eq!(rig.shade.get_tilt_percentage(), pct(0));
}

#[test]
fn failed_save_still_settles_and_reports() {
    let rig = Rig::inline(MemStore::default());
    rig.store.fail_saves();

    rig.shade.set_tilt_percentage(25).unwrap();

    assert_eq!(rig.shade.get_tilt_percentage(), pct(25));
    assert_eq!(rig.reporter.reports(), vec![pct(25)]);
    assert!(rig.store.writes().is_empty());
    assert!(!rig.shade.is_moving());
}

/// A cancelled move is deliberately not persisted: after a restart the
/// shade comes back at the last *settled* position, not where it stopped.
#[test]
fn cancelled_position_is_not_durable() {
    let rig = Rig::threaded(MemStore::with(20));

    rig.shade.set_tilt_percentage(90).unwrap();
    assert!(wait_until(Duration::from_secs(10), || rig.clock.now_ms() >= 200));
    rig.shade.halt().unwrap();

    let stopped_at = rig.shade.get_tilt_percentage();
    assert!(stopped_at > pct(20) && stopped_at < pct(90));
    assert!(rig.store.writes().is_empty());

    let restarted = controller_on(rig.store.clone());
    assert_eq!(restarted.get_tilt_percentage(), pct(20));
}

//! Integration tests for the routine controller over a real SQLite store.

use std::sync::Arc;

use morning_routine_core::{
    DateKey, Event, FixedClock, KeyValueStore, Routine, RoutineController, SqliteStore,
};
use tempfile::TempDir;

fn key(s: &str) -> DateKey {
    s.parse().unwrap()
}

fn open(dir: &TempDir, clock: &FixedClock) -> RoutineController<SqliteStore> {
    let store = SqliteStore::open_at(&dir.path().join("routine.db")).unwrap();
    RoutineController::new(Routine::morning(), store, Arc::new(clock.clone()))
}

fn complete_day(controller: &mut RoutineController<SqliteStore>) -> Vec<Event> {
    let ids: Vec<_> = controller.routine().ids().collect();
    let mut events = Vec::new();
    for id in ids {
        if !controller.is_completed(id) {
            events.extend(controller.toggle_task(id));
        }
    }
    events
}

#[test]
fn test_week_of_routines() {
    let dir = TempDir::new().unwrap();
    let clock = FixedClock::new(key("2024-02-26"));

    // Five consecutive days, across the leap day.
    for _ in 0..5 {
        let mut controller = open(&dir, &clock);
        assert_eq!(controller.total_completed(), 0);
        complete_day(&mut controller);
        clock.advance_days(1);
    }

    let controller = open(&dir, &clock);
    let stats = controller.stats();
    assert_eq!(stats.current_streak, 5);
    assert_eq!(stats.best_streak, 5);
    assert_eq!(stats.completed_days, 5);
    assert_eq!(controller.last_completed_date(), Some(key("2024-03-01")));
}

#[test]
fn test_gap_breaks_streak_but_keeps_best() {
    let dir = TempDir::new().unwrap();
    let clock = FixedClock::new(key("2024-06-01"));

    for _ in 0..3 {
        let mut controller = open(&dir, &clock);
        complete_day(&mut controller);
        clock.advance_days(1);
    }
    // Skip four days.
    clock.advance_days(4);

    let mut controller = open(&dir, &clock);
    let events = complete_day(&mut controller);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::StreakCredited { stats, .. } if stats.current_streak == 1
    )));
    let stats = controller.stats();
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.best_streak, 3);
    assert_eq!(stats.completed_days, 4);
}

#[test]
fn test_storage_layout() {
    let dir = TempDir::new().unwrap();
    let clock = FixedClock::new(key("2024-06-10"));
    let mut controller = open(&dir, &clock);
    complete_day(&mut controller);
    drop(controller);

    let store = SqliteStore::open_at(&dir.path().join("routine.db")).unwrap();
    assert_eq!(
        store.get("morning-routine-2024-06-10").unwrap().as_deref(),
        Some(r#"{"1":true,"2":true,"3":true,"4":true,"5":true,"6":true,"7":true}"#)
    );
    let stats: serde_json::Value =
        serde_json::from_str(&store.get("morning-routine-stats").unwrap().unwrap()).unwrap();
    assert_eq!(
        stats,
        serde_json::json!({"streak": 1, "bestStreak": 1, "completedDays": 1})
    );
    assert_eq!(
        store.get("last-completed-date").unwrap().as_deref(),
        Some("2024-06-10")
    );
}

#[test]
fn test_corrupt_rows_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("routine.db");
    {
        let mut store = SqliteStore::open_at(&path).unwrap();
        store.set("morning-routine-2024-06-10", "not json").unwrap();
        store.set("morning-routine-stats", "{\"streak\": -4}").unwrap();
    }

    let clock = FixedClock::new(key("2024-06-10"));
    let mut controller = open(&dir, &clock);
    assert_eq!(controller.total_completed(), 0);
    assert_eq!(controller.stats().completed_days, 0);

    // Writing over the corrupt rows works normally.
    controller.toggle_task(2);
    drop(controller);
    let controller = open(&dir, &clock);
    assert!(controller.is_completed(2));
}

#[test]
fn test_reset_after_credit_does_not_undo_streak() {
    let dir = TempDir::new().unwrap();
    let clock = FixedClock::new(key("2024-06-10"));
    let mut controller = open(&dir, &clock);
    complete_day(&mut controller);
    controller.reset_routine();

    // Completing again after the reset is still the same day.
    complete_day(&mut controller);
    assert_eq!(controller.stats().completed_days, 1);
    assert_eq!(controller.stats().current_streak, 1);
}

use chrono::{DateTime, TimeZone, Utc};
use lazygoal_core::db::{open_db, open_db_in_memory};
use lazygoal_core::{
    GoalId, GoalStatus, GoalStore, KeyValueStore, NewGoal, PeriodKind, SqliteKeyValueStore,
    StoreError, StoreResult, GOALS_STORAGE_KEY,
};
use std::cell::Cell;

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

#[test]
fn create_appends_one_record_with_assigned_identity() {
    let conn = open_db_in_memory().unwrap();
    let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    store
        .create(NewGoal::new(PeriodKind::Day, day(2024, 3, 9), "stretch"))
        .unwrap();
    let before = store.list().unwrap();

    let started = Utc::now();
    let input = NewGoal::new(PeriodKind::Day, day(2024, 3, 10), "run 5k").with_description("easy pace");
    let created = store.create(input.clone()).unwrap();
    let after = store.list().unwrap();

    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after.last(), Some(&created));
    assert_eq!(created.title, input.title);
    assert_eq!(created.description, input.description);
    assert_eq!(created.status, GoalStatus::Todo);
    assert_eq!(created.kind, PeriodKind::Day);
    assert_eq!(created.date, day(2024, 3, 10));
    assert!(created.created_at >= started);
    assert!(!created.id.as_str().is_empty());
    assert!(before.iter().all(|goal| goal.id != created.id));
}

#[test]
fn delete_removes_only_the_target_and_keeps_order() {
    let conn = open_db_in_memory().unwrap();
    let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    let ids = ["a", "b", "c"]
        .iter()
        .map(|title| {
            store
                .create(NewGoal::new(PeriodKind::Month, day(2024, 3, 1), *title))
                .unwrap()
                .id
        })
        .collect::<Vec<_>>();
    let before = store.list().unwrap();

    let returned = store.delete(&ids[1]).unwrap();
    let after = store.list().unwrap();

    assert_eq!(returned, after);
    assert_eq!(after, vec![before[0].clone(), before[2].clone()]);
}

#[test]
fn delete_of_missing_id_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    store
        .create(NewGoal::new(PeriodKind::Year, day(2024, 1, 1), "learn piano"))
        .unwrap();
    let before = store.list().unwrap();

    let after = store.delete(&GoalId::from("missing")).unwrap();
    assert_eq!(after, before);
}

#[test]
fn update_overwrites_and_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    let goal = store
        .create(NewGoal::new(PeriodKind::Day, day(2024, 3, 10), "draft"))
        .unwrap();

    let mut edited = goal.clone();
    edited.title = "final".to_string();
    edited.status = GoalStatus::InProgress;

    let once = store.update(&edited).unwrap();
    let twice = store.update(&edited).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once, vec![edited]);
}

#[test]
fn update_of_missing_id_succeeds_without_change() {
    let conn = open_db_in_memory().unwrap();
    let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    let goal = store
        .create(NewGoal::new(PeriodKind::Day, day(2024, 3, 10), "real"))
        .unwrap();

    let mut ghost = goal.clone();
    ghost.id = GoalId::from("ghost");
    ghost.title = "ghost".to_string();

    assert_eq!(store.update(&ghost).unwrap(), vec![goal]);
}

#[test]
fn update_rejects_kind_change() {
    let conn = open_db_in_memory().unwrap();
    let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    let goal = store
        .create(NewGoal::new(PeriodKind::Day, day(2024, 3, 10), "fixed kind"))
        .unwrap();

    let mut changed = goal.clone();
    changed.kind = PeriodKind::Month;
    let err = store.update(&changed).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.list().unwrap(), vec![goal]);
}

#[test]
fn rollover_moves_date_and_resets_status_only() {
    let conn = open_db_in_memory().unwrap();
    let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    let goal = store
        .create(NewGoal::new(PeriodKind::Day, day(2024, 3, 10), "write report"))
        .unwrap();
    store.advance_status(&goal.id).unwrap();

    let goals = store.rollover(&goal.id, day(2024, 3, 12)).unwrap();
    let moved = &goals[0];

    assert_eq!(moved.date, day(2024, 3, 12));
    assert_eq!(moved.status, GoalStatus::Todo);
    assert_eq!(moved.id, goal.id);
    assert_eq!(moved.title, goal.title);
    assert_eq!(moved.kind, goal.kind);
    assert_eq!(moved.created_at, goal.created_at);
}

#[test]
fn rollover_of_missing_id_fails_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let medium = SqliteKeyValueStore::try_new(&conn).unwrap();
    let store = GoalStore::new(medium);
    store
        .create(NewGoal::new(PeriodKind::Day, day(2024, 3, 10), "kept"))
        .unwrap();
    let raw_before = store.storage().get_item(GOALS_STORAGE_KEY).unwrap();

    let err = store
        .rollover(&GoalId::from("nope"), day(2024, 3, 11))
        .unwrap_err();

    assert!(matches!(err, StoreError::NotFound(ref id) if id.as_str() == "nope"));
    assert_eq!(store.storage().get_item(GOALS_STORAGE_KEY).unwrap(), raw_before);
}

#[test]
fn persisted_payload_is_a_flat_json_array() {
    let conn = open_db_in_memory().unwrap();
    let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    let goal = store
        .create(NewGoal::new(PeriodKind::Month, day(2024, 3, 1), "budget"))
        .unwrap();

    let raw = store
        .storage()
        .get_item(GOALS_STORAGE_KEY)
        .unwrap()
        .expect("payload stored");
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value.as_array().expect("array payload")[0];

    assert_eq!(record["id"], goal.id.as_str());
    assert_eq!(record["type"], "month");
    assert_eq!(record["status"], "todo");
    assert!(record["date"].as_str().unwrap().starts_with("2024-03-01T00:00:00"));
    assert!(record["createdAt"].is_string());
}

#[test]
fn legacy_payload_with_numeric_ids_loads() {
    let conn = open_db_in_memory().unwrap();
    let medium = SqliteKeyValueStore::try_new(&conn).unwrap();
    medium
        .set_item(
            GOALS_STORAGE_KEY,
            r#"[{"id":"1710028800000","title":"Run","description":"","status":"done",
                "type":"day","date":"2024-03-10T00:00:00.000Z",
                "createdAt":"2024-03-10T06:00:00.000Z"}]"#,
        )
        .unwrap();
    let store = GoalStore::new(medium);

    let goals = store.list().unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].id, GoalId::from("1710028800000"));

    let after = store.advance_status(&goals[0].id).unwrap();
    assert_eq!(after[0].status, GoalStatus::Todo);
}

#[test]
fn goals_survive_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("goals.db");

    let created = {
        let conn = open_db(&path).unwrap();
        let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
        store
            .create(NewGoal::new(PeriodKind::Year, day(2024, 1, 1), "move abroad"))
            .unwrap()
    };

    let conn = open_db(&path).unwrap();
    let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    assert_eq!(store.list().unwrap(), vec![created]);
}

#[test]
fn concurrent_writers_on_separate_connections_lose_no_goals() {
    const WRITERS: usize = 4;
    const GOALS_PER_WRITER: usize = 25;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    drop(open_db(&path).unwrap());

    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let path = &path;
            scope.spawn(move || {
                let conn = open_db(path).unwrap();
                let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
                for n in 0..GOALS_PER_WRITER {
                    let title = format!("writer {writer} goal {n}");
                    store
                        .create(NewGoal::new(PeriodKind::Day, day(2024, 3, 10), title))
                        .unwrap();
                }
            });
        }
    });

    let conn = open_db(&path).unwrap();
    let store = GoalStore::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    let goals = store.list().unwrap();
    assert_eq!(goals.len(), WRITERS * GOALS_PER_WRITER);
    for writer in 0..WRITERS {
        let prefix = format!("writer {writer} ");
        let written = goals
            .iter()
            .filter(|goal| goal.title.starts_with(&prefix))
            .count();
        assert_eq!(written, GOALS_PER_WRITER);
    }
}

/// Medium whose writes can be switched off to simulate an unavailable device.
#[derive(Default)]
struct FlakyStore {
    inner: lazygoal_core::MemoryKeyValueStore,
    fail_writes: Cell<bool>,
}

impl KeyValueStore for FlakyStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.fail_writes.get() {
            return Err(StoreError::InvalidData("medium unavailable".to_string()));
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.inner.remove_item(key)
    }
}

#[test]
fn write_failure_is_reported_and_leaves_collection_unchanged() {
    let store = GoalStore::new(FlakyStore::default());
    let goal = store
        .create(NewGoal::new(PeriodKind::Day, day(2024, 3, 10), "steady"))
        .unwrap();

    store.storage().fail_writes.set(true);
    assert!(store
        .create(NewGoal::new(PeriodKind::Day, day(2024, 3, 10), "lost"))
        .is_err());
    assert!(store.delete(&goal.id).is_err());

    assert_eq!(store.list().unwrap(), vec![goal]);
}

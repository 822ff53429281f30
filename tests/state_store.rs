use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reel_engine::config::EngineConfig;
use reel_engine::{PersistedState, StateStore};

#[test]
fn first_load_writes_defaults_with_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::default();
    let store = StateStore::new(dir.path().join("data").join("state.json"));
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let state = store.load(&config, &mut StdRng::seed_from_u64(1), now).unwrap();
    assert_eq!(state.run_count, 0);
    assert_eq!(state.category_cycle_index, 0);
    assert_eq!(state.last_analysis_timestamp, Some(now));
    assert!(config.story_style(&state.best_performing_story_style).is_some());
    assert!(config.edit_style(&state.best_performing_edit_style).is_some());
    assert!(store.path().exists());
}

#[test]
fn saved_state_loads_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::default();
    let store = StateStore::new(dir.path().join("state.json"));
    let state = PersistedState {
        run_count: 12,
        category_cycle_index: 12,
        last_analysis_timestamp: Some(Utc.with_ymd_and_hms(2024, 4, 2, 8, 30, 0).unwrap()),
        best_performing_story_style: config.story_styles[1].key.clone(),
        best_performing_edit_style: config.edit_styles[0].key.clone(),
        last_story_key: Some(config.story_styles[2].key.clone()),
    };
    store.save(&state).unwrap();

    let loaded = store
        .load(&config, &mut StdRng::seed_from_u64(2), Utc::now())
        .unwrap();
    assert_eq!(loaded, state);
}

#[test]
fn malformed_document_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::default();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = StateStore::new(path.clone());

    let state = store
        .load(&config, &mut StdRng::seed_from_u64(3), Utc::now())
        .unwrap();
    assert_eq!(state.run_count, 0);
    assert_eq!(state.last_analysis_timestamp, None);
    // nothing is written on fallback
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn wrong_field_types_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::default();
    let path = dir.path().join("state.json");
    std::fs::write(&path, r#"{"run_count": "lots"}"#).unwrap();

    let state = StateStore::new(path)
        .load(&config, &mut StdRng::seed_from_u64(3), Utc::now())
        .unwrap();
    assert_eq!(state.run_count, 0);

    let array_path = dir.path().join("array.json");
    std::fs::write(&array_path, "[1, 2, 3]").unwrap();
    let state = StateStore::new(array_path)
        .load(&config, &mut StdRng::seed_from_u64(3), Utc::now())
        .unwrap();
    assert_eq!(state.category_cycle_index, 0);
}

#[test]
fn partial_document_merges_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::default();
    let path = dir.path().join("state.json");
    std::fs::write(&path, r#"{"run_count": 7, "category_cycle_index": 7}"#).unwrap();

    let state = StateStore::new(path)
        .load(&config, &mut StdRng::seed_from_u64(8), Utc::now())
        .unwrap();
    assert_eq!(state.run_count, 7);
    assert_eq!(state.category_cycle_index, 7);
    assert!(config.story_style(&state.best_performing_story_style).is_some());
    assert_eq!(state.last_story_key, None);
}

#[test]
fn retired_best_styles_are_replaced_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::default();
    let path = dir.path().join("state.json");
    std::fs::write(
        &path,
        r#"{"run_count": 3, "best_performing_story_style": "gone", "best_performing_edit_style": "also_gone"}"#,
    )
    .unwrap();

    let state = StateStore::new(path)
        .load(&config, &mut StdRng::seed_from_u64(5), Utc::now())
        .unwrap();
    assert_eq!(state.run_count, 3);
    assert!(config.story_style(&state.best_performing_story_style).is_some());
    assert!(config.edit_style(&state.best_performing_edit_style).is_some());
}

#[test]
fn completed_run_moves_both_counters() {
    let config = EngineConfig::default();
    let mut state = PersistedState::defaults(&config, &mut StdRng::seed_from_u64(6)).unwrap();
    state.record_completed_run();
    state.record_completed_run();
    assert_eq!(state.run_count, 2);
    assert_eq!(state.category_cycle_index, 2);
}

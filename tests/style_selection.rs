use rand::rngs::StdRng;
use rand::SeedableRng;
use reel_engine::config::EngineConfig;
use reel_engine::{select_category_and_story_style, select_editing_style, EngineError, PersistedState};

fn fresh_state(config: &EngineConfig) -> PersistedState {
    let mut rng = StdRng::seed_from_u64(1);
    PersistedState::defaults(config, &mut rng).unwrap()
}

#[test]
fn categories_rotate_round_robin() {
    let config = EngineConfig::default();
    let mut state = fresh_state(&config);
    let mut rng = StdRng::seed_from_u64(7);
    let total = config.categories.len() * 3 + 4;

    for run in 0..total {
        let selection = select_category_and_story_style(&mut state, &config, &mut rng).unwrap();
        assert_eq!(selection.category, config.categories[run % config.categories.len()].name);
        state.record_completed_run();
    }
    assert_eq!(state.run_count, total as u64);
    assert_eq!(state.category_cycle_index, total as u64);
}

#[test]
fn selection_without_completed_run_repeats_category() {
    let config = EngineConfig::default();
    let mut state = fresh_state(&config);
    let mut rng = StdRng::seed_from_u64(3);

    let first = select_category_and_story_style(&mut state, &config, &mut rng).unwrap();
    let second = select_category_and_story_style(&mut state, &config, &mut rng).unwrap();
    assert_eq!(first.category, second.category);
}

#[test]
fn best_story_style_wins_about_seventy_percent_plus_exploration() {
    let config = EngineConfig::default();
    let mut state = fresh_state(&config);
    state.best_performing_story_style = config.story_styles[2].key.clone();
    let mut rng = StdRng::seed_from_u64(42);

    let draws = 20_000;
    let mut best = 0;
    for _ in 0..draws {
        let selection = select_category_and_story_style(&mut state, &config, &mut rng).unwrap();
        if selection.story_key == state.best_performing_story_style {
            best += 1;
        }
    }
    // exploit 0.7, plus 0.3 of uniform draws over four styles landing on it
    let expected = 0.7 + 0.3 / config.story_styles.len() as f64;
    let fraction = best as f64 / draws as f64;
    assert!((fraction - expected).abs() < 0.02, "fraction was {}", fraction);
}

#[test]
fn selection_records_last_story_key_and_prompt() {
    let config = EngineConfig::default();
    let mut state = fresh_state(&config);
    let mut rng = StdRng::seed_from_u64(9);

    let selection = select_category_and_story_style(&mut state, &config, &mut rng).unwrap();
    assert_eq!(state.last_story_key.as_deref(), Some(selection.story_key.as_str()));
    let style = config.story_style(&selection.story_key).unwrap();
    assert_eq!(selection.story_prompt, style.prompt);
}

#[test]
fn always_exploit_returns_best_edit_style() {
    let mut config = EngineConfig::default();
    config.selection.exploit_probability = 1.0;
    let mut state = fresh_state(&config);
    state.best_performing_edit_style = config.edit_styles[1].key.clone();
    let mut rng = StdRng::seed_from_u64(5);

    for _ in 0..50 {
        let selection = select_editing_style(&state, &config, &mut rng).unwrap();
        assert_eq!(selection.key, config.edit_styles[1].key);
        assert_eq!(selection.style, config.edit_styles[1]);
    }
}

#[test]
fn unknown_best_style_falls_back_to_catalog() {
    let mut config = EngineConfig::default();
    config.selection.exploit_probability = 1.0;
    let mut state = fresh_state(&config);
    state.best_performing_edit_style = "retired_style".to_string();
    let mut rng = StdRng::seed_from_u64(11);

    let selection = select_editing_style(&state, &config, &mut rng).unwrap();
    assert!(config.edit_style(&selection.key).is_some());
}

#[test]
fn empty_catalogs_are_configuration_errors() {
    let config = EngineConfig::default();
    let mut state = fresh_state(&config);
    let mut rng = StdRng::seed_from_u64(2);

    let mut no_categories = config.clone();
    no_categories.categories.clear();
    let err = select_category_and_story_style(&mut state, &no_categories, &mut rng).unwrap_err();
    assert!(matches!(err, EngineError::Configuration(_)));

    let mut no_edits = config.clone();
    no_edits.edit_styles.clear();
    let err = select_editing_style(&state, &no_edits, &mut rng).unwrap_err();
    assert!(matches!(err, EngineError::Configuration(_)));
}

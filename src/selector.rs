use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{EditStyle, EngineConfig};
use crate::error::{EngineError, Result};
use crate::state::PersistedState;

#[derive(Debug, Clone, PartialEq)]
pub struct StorySelection {
    pub category: String,
    pub story_key: String,
    pub story_prompt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditSelection {
    pub key: String,
    pub style: EditStyle,
}

/// Round-robin category plus an explore/exploit storytelling style.
///
/// Records the chosen key in `state.last_story_key`; nothing is persisted here.
pub fn select_category_and_story_style<R: Rng + ?Sized>(
    state: &mut PersistedState,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<StorySelection> {
    if config.categories.is_empty() {
        return Err(EngineError::Configuration("no categories configured".into()));
    }
    let position = (state.category_cycle_index % config.categories.len() as u64) as usize;
    let category = config.categories[position].name.clone();

    let style = epsilon_greedy(
        &config.story_styles,
        |style| style.key.as_str(),
        &state.best_performing_story_style,
        config.selection.exploit_probability,
        rng,
    )
    .ok_or_else(|| EngineError::Configuration("no storytelling styles configured".into()))?;

    state.last_story_key = Some(style.key.clone());
    Ok(StorySelection {
        category,
        story_key: style.key.clone(),
        story_prompt: style.prompt.clone(),
    })
}

pub fn select_editing_style<R: Rng + ?Sized>(
    state: &PersistedState,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<EditSelection> {
    let style = epsilon_greedy(
        &config.edit_styles,
        |style| style.key.as_str(),
        &state.best_performing_edit_style,
        config.selection.exploit_probability,
        rng,
    )
    .ok_or_else(|| EngineError::Configuration("no editing styles configured".into()))?;

    Ok(EditSelection {
        key: style.key.clone(),
        style: style.clone(),
    })
}

/// Exploits `best` with probability `exploit_probability`, otherwise draws
/// uniformly from the whole catalog. A `best` missing from the catalog
/// always explores.
fn epsilon_greedy<'a, T, R: Rng + ?Sized>(
    catalog: &'a [T],
    key_of: impl Fn(&T) -> &str,
    best: &str,
    exploit_probability: f64,
    rng: &mut R,
) -> Option<&'a T> {
    if catalog.is_empty() {
        return None;
    }
    if rng.gen::<f64>() < exploit_probability {
        if let Some(item) = catalog.iter().find(|item| key_of(item) == best) {
            return Some(item);
        }
    }
    catalog.choose(rng)
}

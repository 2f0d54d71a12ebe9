//! Game slice: score keeping and saving

use crate::api::Backend;
use saga_store::{Action, Dispatcher, Reducer, State, Store, StoreError};
use serde_json::json;
use std::sync::Arc;

pub const GAME_ENABLE: &str = "GAME_ENABLE";
pub const GAME_DISABLE: &str = "GAME_DISABLE";
pub const GAME_SCORE_ADD: &str = "GAME_SCORE_ADD";
pub const GAME_REQUEST_SAVE: &str = "GAME_REQUEST_SAVE";
pub const GAME_RECEIVE_SAVE: &str = "GAME_RECEIVE_SAVE";

pub fn reducer() -> Result<Reducer, StoreError> {
    // Static patches where no reducer logic is needed
    Reducer::new(json!({"enabled": false, "score": 0, "saving": false}))?
        .set(GAME_ENABLE, json!({"enabled": true}))?
        .set(GAME_DISABLE, json!({"enabled": false}))?
        .on(GAME_SCORE_ADD, |slice, action| {
            let score = slice.get("score").and_then(|s| s.as_i64()).unwrap_or(0);
            let add = action
                .get_i64("score")
                .ok_or_else(|| anyhow::anyhow!("GAME_SCORE_ADD without a numeric score"))?;
            let total = score
                .checked_add(add)
                .ok_or_else(|| anyhow::anyhow!("Score {} + {} is out of range", score, add))?;
            Ok(Some(json!({ "score": total })))
        })?
        .set(GAME_REQUEST_SAVE, json!({"saving": true, "saveError": null}))?
        .on(GAME_RECEIVE_SAVE, |_, action| {
            Ok(Some(json!({
                "saving": false,
                "saveError": action.get("error"),
            })))
        })
}

/// Save the current score whenever a save is requested
///
/// The handler reads the score from the state snapshot it is invoked with,
/// which already includes the `GAME_REQUEST_SAVE` commit.
pub fn register_sagas(store: &Store, backend: Arc<dyn Backend>) {
    store.effect_with_state(GAME_REQUEST_SAVE, move |_, dispatcher, state| {
        let backend = Arc::clone(&backend);
        async move { save(backend.as_ref(), &dispatcher, state).await }
    });
}

async fn save(backend: &dyn Backend, dispatcher: &Dispatcher, state: State) -> anyhow::Result<()> {
    let score = state["game"]["score"].as_i64().unwrap_or(0);
    let received = match backend.save_game(score).await {
        Ok(()) => Action::new(GAME_RECEIVE_SAVE),
        Err(e) => {
            log::warn!("Saving game failed: {}", e);
            Action::new(GAME_RECEIVE_SAVE).with("error", e.to_string())
        }
    };
    dispatcher.dispatch(received)?;
    Ok(())
}

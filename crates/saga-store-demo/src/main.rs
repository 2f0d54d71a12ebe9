use saga_store::{Action, StoreConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

mod api;
mod app;
mod game;
mod nested;
mod user;

use api::SimulatedBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up RUST_LOG and friends from .env if present
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = StoreConfig::load();
    log::info!("Starting saga-store demo '{}'", config.name);

    let backend = Arc::new(SimulatedBackend::new("Ada Lovelace", Duration::from_millis(50)));
    let store = app::build_store(config, backend.clone())?;

    // Stand-in for a view: derive props and watch for the follow-up actions
    let header = store.project(|state, _| {
        format!(
            "user={} loading={} score={}",
            state["user"]["name"], state["user"]["isLoading"], state["game"]["score"]
        )
    });
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
    store.subscribe(move |state| {
        let _ = tx.send(state.clone());
    });

    store.dispatch(Action::new(user::USER_REQUEST_PROFILE))?;
    store.dispatch(Action::new(game::GAME_ENABLE))?;
    store.dispatch(Action::new(game::GAME_SCORE_ADD).with("score", 10))?;
    store.dispatch(Action::new(game::GAME_SCORE_ADD).with("score", 5))?;
    store.dispatch(Action::new(game::GAME_REQUEST_SAVE))?;
    store.dispatch(Action::new(nested::NESTED_REQ_ONE).with("id", "1"))?;
    store.dispatch(
        Action::new(nested::NESTED_REC_ONE)
            .with("nested", serde_json::json!({"id": "1", "name": "Root"})),
    )?;
    log::info!("{}", header.current());

    // Effects finish on their own schedule; wait for both follow-ups
    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(state) = rx.recv().await {
            let profile_done = !state["user"]["isLoading"].as_bool().unwrap_or(true);
            let save_done = !state["game"]["saving"].as_bool().unwrap_or(true);
            if profile_done && save_done {
                break;
            }
        }
    })
    .await;
    if settled.is_err() {
        log::warn!("Timed out waiting for effect handlers");
    }
    log::info!("{}", header.current());

    // A request that fails still ends in a follow-up action carrying the error
    backend.set_offline(true);
    store.dispatch(Action::new(user::USER_REQUEST_PROFILE))?;
    let failed = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(state) = rx.recv().await {
            if state["user"]["error"].is_string() {
                break;
            }
        }
    })
    .await;
    if failed.is_err() {
        log::warn!("Timed out waiting for the failed profile request");
    }

    println!("{}", serde_json::to_string_pretty(store.get_state().as_ref())?);

    log::info!("Exiting saga-store demo");
    Ok(())
}

//! User slice: profile loading

use crate::api::Backend;
use saga_store::{Action, Dispatcher, Reducer, Store, StoreError};
use serde_json::json;
use std::sync::Arc;

pub const USER_REQUEST_PROFILE: &str = "USER_REQUEST_PROFILE";
pub const USER_RECEIVE_PROFILE: &str = "USER_RECEIVE_PROFILE";

pub fn reducer() -> Result<Reducer, StoreError> {
    Reducer::new(json!({"isLoading": false, "name": ""}))?
        .set(
            USER_REQUEST_PROFILE,
            json!({"isLoading": true, "error": null, "name": ""}),
        )?
        .on(USER_RECEIVE_PROFILE, |_, action| {
            Ok(Some(json!({
                "isLoading": false,
                "name": action.get_str("name").unwrap_or(""),
                "error": action.get("error"),
            })))
        })
}

/// Fetch the profile whenever it is requested
pub fn register_sagas(store: &Store, backend: Arc<dyn Backend>) {
    store.effect(USER_REQUEST_PROFILE, move |_, dispatcher| {
        let backend = Arc::clone(&backend);
        async move { request_profile(backend.as_ref(), &dispatcher).await }
    });
}

async fn request_profile(backend: &dyn Backend, dispatcher: &Dispatcher) -> anyhow::Result<()> {
    let received = match backend.fetch_profile().await {
        Ok(profile) => Action::new(USER_RECEIVE_PROFILE).with("name", profile.name),
        Err(e) => {
            log::warn!("Profile request failed ({:?}): {}", e.status(), e);
            Action::new(USER_RECEIVE_PROFILE).with("error", e.to_string())
        }
    };
    dispatcher.dispatch(received)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, Profile};
    use async_trait::async_trait;
    use saga_store::{create_store, Branch};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct FailingBackend;

    #[async_trait]
    impl Backend for FailingBackend {
        async fn fetch_profile(&self) -> Result<Profile, ApiError> {
            Err(ApiError::Status {
                status: 404,
                status_text: "Not Found".to_string(),
            })
        }

        async fn save_game(&self, _score: i64) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[test]
    fn test_request_sets_loading_and_clears_error() {
        let reducer = reducer().unwrap();
        let mut slice = reducer.initial().clone();
        slice.insert("error".to_string(), json!("old"));

        let next = reducer
            .reduce(&slice, &Action::new(USER_REQUEST_PROFILE))
            .unwrap();

        assert_eq!(next["isLoading"], json!(true));
        assert_eq!(next["error"], json!(null));
    }

    #[test]
    fn test_receive_with_error() {
        let reducer = reducer().unwrap();
        let next = reducer
            .reduce(
                reducer.initial(),
                &Action::new(USER_RECEIVE_PROFILE).with("error", "Not Found"),
            )
            .unwrap();

        assert_eq!(next["isLoading"], json!(false));
        assert_eq!(next["name"], json!(""));
        assert_eq!(next["error"], json!("Not Found"));
    }

    #[tokio::test]
    async fn test_failed_profile_request_surfaces_error() {
        let store = create_store(Branch::new().with("user", reducer().unwrap()).unwrap(), None)
            .unwrap();
        register_sagas(&store, Arc::new(FailingBackend));
        let (tx, mut rx) = mpsc::unbounded_channel();
        store.subscribe(move |state| {
            let _ = tx.send(state["user"].clone());
        });

        store.dispatch(Action::new(USER_REQUEST_PROFILE)).unwrap();

        let requested = rx.recv().await.unwrap();
        assert_eq!(requested["isLoading"], json!(true));
        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received["isLoading"], json!(false));
        assert_eq!(received["error"], json!("Not Found"));
    }
}

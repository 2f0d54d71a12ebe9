//! Store wiring for the demo
//!
//! Sagas are registered right after the store is built, before anything is
//! dispatched, so none of them misses an action.

use crate::api::Backend;
use crate::{game, nested, user};
use saga_store::{Branch, Store, StoreConfig, StoreError};
use std::sync::Arc;

/// `{ user, game, admin: { nested } }`
pub fn reducer_tree() -> Result<Branch, StoreError> {
    Branch::new()
        .with("user", user::reducer()?)?
        .with("game", game::reducer()?)?
        .with("admin", Branch::new().with("nested", nested::reducer()?)?)
}

pub fn build_store(config: StoreConfig, backend: Arc<dyn Backend>) -> Result<Store, StoreError> {
    let store = Store::builder(reducer_tree()?).config(config).build()?;

    user::register_sagas(&store, Arc::clone(&backend));
    game::register_sagas(&store, backend);

    Ok(store)
}

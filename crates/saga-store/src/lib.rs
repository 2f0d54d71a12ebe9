//! Action-driven state container
//!
//! This crate provides:
//! - A state tree whose shape mirrors a tree of reducers (branches and leaves)
//! - Leaf reducers with a per-tag handler registry and shallow-merge patches
//! - A store whose `dispatch` reduces, commits, notifies, then starts effects
//! - Effect handlers ("sagas") that run as detached tokio tasks and may
//!   dispatch follow-up actions
//!
//! ## Design
//!
//! ```text
//! Action → Tree Reducer → Commit → Listeners/Observers → Effect Handlers
//!                                                              │
//!                         Dispatcher ◄─────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use saga_store::{create_store, Action, Branch, Reducer};
//! use serde_json::json;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let user = Reducer::new(json!({"isLoading": false, "name": ""}))?
//!     .set("USER_REQUEST_PROFILE", json!({"isLoading": true}))?
//!     .on("USER_RECEIVE_PROFILE", |_, action| {
//!         Ok(Some(json!({"isLoading": false, "name": action.get_str("name")})))
//!     })?;
//! let store = create_store(Branch::new().with("user", user)?, None)?;
//!
//! store.effect("USER_REQUEST_PROFILE", |_, dispatcher| async move {
//!     dispatcher.dispatch(Action::new("USER_RECEIVE_PROFILE").with("name", "Ada"))?;
//!     Ok(())
//! });
//!
//! store.dispatch(Action::new("USER_REQUEST_PROFILE"))?;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod config;
pub mod dispatcher;
pub mod effect;
pub mod error;
mod listener;
pub mod observer;
pub mod projection;
pub mod reducer;
pub mod store;
pub mod tree;

pub use action::{Action, INIT_TAG};
pub use config::StoreConfig;
pub use dispatcher::Dispatcher;
pub use effect::{EffectHandler, EffectRegistry};
pub use error::StoreError;
pub use listener::Subscription;
pub use observer::{LoggingObserver, Observer};
pub use projection::Projection;
pub use reducer::{Handler, Patch, Reducer, Slice};
pub use store::{create_store, Store, StoreBuilder};
pub use tree::{Branch, ReducerNode};

/// Snapshot of the whole state tree
pub type State = std::sync::Arc<serde_json::Value>;

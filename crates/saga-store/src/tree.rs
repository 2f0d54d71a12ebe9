//! Reducer tree
//!
//! The reducer tree is built once and fixes the shape of the state tree:
//! every branch yields a nested object keyed by its children, every leaf
//! yields the slice owned by that leaf. The tree reducer folds an action
//! over the whole tree; siblings never see each other's output for the
//! same dispatch.

use crate::action::Action;
use crate::error::{kind_of, StoreError};
use crate::reducer::Reducer;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A node of the reducer tree
#[derive(Debug, Clone)]
pub enum ReducerNode {
    Leaf(Reducer),
    Branch(Branch),
}

impl From<Reducer> for ReducerNode {
    fn from(reducer: Reducer) -> Self {
        ReducerNode::Leaf(reducer)
    }
}

impl From<Branch> for ReducerNode {
    fn from(branch: Branch) -> Self {
        ReducerNode::Branch(branch)
    }
}

/// Named children of a branch node
#[derive(Debug, Clone, Default)]
pub struct Branch {
    children: BTreeMap<String, ReducerNode>,
}

impl Branch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child under `key`; a key can only be used once per branch
    pub fn with(
        mut self,
        key: impl Into<String>,
        node: impl Into<ReducerNode>,
    ) -> Result<Self, StoreError> {
        let key = key.into();
        if self.children.contains_key(&key) {
            return Err(StoreError::DuplicateKey { key });
        }
        self.children.insert(key, node.into());
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&ReducerNode> {
        self.children.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Dotted key path used in error messages (`admin.nested`)
#[derive(Debug, Clone, Default)]
struct KeyPath(Vec<String>);

impl KeyPath {
    fn child(&self, key: &str) -> Self {
        let mut path = self.0.clone();
        path.push(key.to_string());
        Self(path)
    }

    fn render(&self) -> String {
        if self.0.is_empty() {
            "<root>".to_string()
        } else {
            self.0.join(".")
        }
    }
}

impl ReducerNode {
    /// Build the initial state tree
    ///
    /// Each leaf starts from its seed value when one is supplied for its key
    /// path, otherwise from its declared initial slice, and then sees the
    /// synthetic init action once.
    pub fn initial_state(&self, seed: Option<&Value>) -> Result<Value, StoreError> {
        initial_at(self, seed, &KeyPath::default())
    }

    /// Compute the next state tree for `action`
    ///
    /// Pure: the same `(tree, prior, action)` always yields the same result.
    /// `prior` must have the tree's shape, which holds for every state the
    /// store produced.
    pub fn compute_next(&self, prior: &Value, action: &Action) -> Result<Value, StoreError> {
        next_at(self, prior, action, &KeyPath::default())
    }

    /// Every leaf key path in the tree, in key order
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_leaf_paths(self, &KeyPath::default(), &mut paths);
        paths
    }
}

fn initial_at(node: &ReducerNode, seed: Option<&Value>, path: &KeyPath) -> Result<Value, StoreError> {
    match node {
        ReducerNode::Leaf(reducer) => {
            let slice = match seed {
                None => reducer.initial().clone(),
                Some(Value::Object(seeded)) => seeded.clone(),
                Some(other) => {
                    return Err(StoreError::SeedShapeMismatch {
                        path: path.render(),
                        reason: format!("leaf seed must be an object, got {}", kind_of(other)),
                    })
                }
            };
            let slice = reducer
                .reduce(&slice, &Action::init())
                .map_err(|source| StoreError::Reducer {
                    path: path.render(),
                    tag: crate::action::INIT_TAG.to_string(),
                    source,
                })?;
            Ok(Value::Object(slice))
        }
        ReducerNode::Branch(branch) => {
            let seeded = match seed {
                None => None,
                Some(Value::Object(seeded)) => Some(seeded),
                Some(other) => {
                    return Err(StoreError::SeedShapeMismatch {
                        path: path.render(),
                        reason: format!("branch seed must be an object, got {}", kind_of(other)),
                    })
                }
            };
            if let Some(seeded) = seeded {
                if let Some(unknown) = seeded.keys().find(|key| branch.get(key).is_none()) {
                    return Err(StoreError::SeedShapeMismatch {
                        path: path.child(unknown).render(),
                        reason: "no reducer for this key".to_string(),
                    });
                }
            }

            let mut state = Map::new();
            for (key, child) in &branch.children {
                let child_seed = seeded.and_then(|seeded| seeded.get(key));
                state.insert(key.clone(), initial_at(child, child_seed, &path.child(key))?);
            }
            Ok(Value::Object(state))
        }
    }
}

fn next_at(
    node: &ReducerNode,
    prior: &Value,
    action: &Action,
    path: &KeyPath,
) -> Result<Value, StoreError> {
    match node {
        ReducerNode::Leaf(reducer) => {
            let empty = Map::new();
            let slice = prior.as_object().unwrap_or(&empty);
            reducer
                .reduce(slice, action)
                .map(Value::Object)
                .map_err(|source| StoreError::Reducer {
                    path: path.render(),
                    tag: action.tag().to_string(),
                    source,
                })
        }
        ReducerNode::Branch(branch) => {
            let mut next = Map::new();
            for (key, child) in &branch.children {
                let child_prior = prior.get(key).unwrap_or(&Value::Null);
                next.insert(key.clone(), next_at(child, child_prior, action, &path.child(key))?);
            }
            Ok(Value::Object(next))
        }
    }
}

fn collect_leaf_paths(node: &ReducerNode, path: &KeyPath, out: &mut Vec<String>) {
    match node {
        ReducerNode::Leaf(_) => out.push(path.render()),
        ReducerNode::Branch(branch) => {
            for (key, child) in &branch.children {
                collect_leaf_paths(child, &path.child(key), out);
            }
        }
    }
}

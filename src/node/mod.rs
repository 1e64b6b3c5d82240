//! Node descriptor and its bind mounts
//!
//! A [`Node`] is created by the lab allocator, filled in by
//! [`resolve_node`](crate::resolve::resolve_node) and consumed by
//! [`materialize`](crate::materialize::materialize). The [`NodeState`] it
//! carries makes sure those steps happen in order and at most once.

mod layout;

pub use layout::{NodeLayout, CONFIG_MOUNT, LOG_MOUNT, SSHD_CONFIG_MOUNT};

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Environment variables forwarded to a node
pub type Env = BTreeMap<String, String>;

/// Errors raised by node mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeError {
    /// A bind for the same container path already exists
    #[error("container path {container} is already bound (existing bind: {existing})")]
    DuplicateBind { container: String, existing: String },
}

/// A `host:container` bind mount
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct Bind {
    pub host: PathBuf,
    pub container: String,
}

impl Bind {
    pub fn new(host: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
        }
    }
}

impl fmt::Display for Bind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host.display(), self.container)
    }
}

impl From<Bind> for String {
    fn from(bind: Bind) -> Self {
        bind.to_string()
    }
}

/// Provisioning lifecycle of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// Freshly allocated, attributes unset
    #[default]
    Declared,
    /// All attributes resolved, ready for materialization
    Resolved,
    /// Lab directory populated
    Materialized,
    /// Resolution failed; the partial state must be discarded
    Failed,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Declared => write!(f, "declared"),
            NodeState::Resolved => write!(f, "resolved"),
            NodeState::Materialized => write!(f, "materialized"),
            NodeState::Failed => write!(f, "failed"),
        }
    }
}

/// Resolved descriptor of one lab node
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Node {
    /// Human readable identifier, used for diagnostics
    pub short_name: String,
    /// Container name
    pub long_name: String,
    /// Type tag selecting templates and resolution behavior
    pub kind: String,
    /// Exclusive working directory, set by the lab allocator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_dir: Option<PathBuf>,
    /// Startup configuration source (template or user override)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
    pub image: String,
    pub group: String,
    pub position: String,
    pub user: String,
    /// License source; `None` when no license was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<PathBuf>,
    pub binds: Vec<Bind>,
    pub state: NodeState,
    /// Merged environment, also exposed to config templates
    pub env: Env,
}

impl Node {
    /// Create an unresolved node of the given kind
    pub fn new(short_name: impl Into<String>, kind: impl Into<String>) -> Self {
        let short_name = short_name.into();
        Self {
            long_name: short_name.clone(),
            short_name,
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Set the container name
    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = long_name.into();
        self
    }

    /// Assign the node's lab directory
    pub fn with_lab_dir(mut self, lab_dir: impl Into<PathBuf>) -> Self {
        self.lab_dir = Some(lab_dir.into());
        self
    }

    /// Layout of the lab directory, if one was assigned
    pub fn layout(&self) -> Option<NodeLayout> {
        self.lab_dir.as_deref().map(NodeLayout::new)
    }

    /// Find the bind targeting a container path
    pub fn bind_for(&self, container: &str) -> Option<&Bind> {
        self.binds.iter().find(|b| b.container == container)
    }

    /// Append a bind, refusing to shadow an existing container path
    pub fn push_bind(&mut self, bind: Bind) -> Result<(), NodeError> {
        if let Some(existing) = self.bind_for(&bind.container) {
            return Err(NodeError::DuplicateBind {
                container: bind.container,
                existing: existing.to_string(),
            });
        }
        self.binds.push(bind);
        Ok(())
    }
}

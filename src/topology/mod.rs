//! Topology file loading
//!
//! A topology is a TOML document naming the lab and its nodes. Settings are
//! looked up node first, then in the node's kind section, then in
//! `[defaults]`:
//!
//! ```toml
//! name = "lab1"
//!
//! [defaults]
//! user = "root"
//!
//! [kinds.crpd]
//! image = "crpd:23.2R1"
//! license = "~/licenses/crpd.lic"
//!
//! [nodes.node1]
//! kind = "crpd"
//! position = "10,20"
//! ```

mod lab;

pub use lab::Lab;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::TopologyError;
use crate::node::Env;

/// Optional per-node settings, shared by nodes, kinds and defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Settings {
    pub image: Option<String>,
    pub group: Option<String>,
    pub position: Option<String>,
    pub user: Option<String>,
    /// License file path
    pub license: Option<String>,
    /// Startup config path overriding the kind's default template
    pub config: Option<String>,
    #[serde(default)]
    pub env: Env,
    /// Keys that match no setting, rejected by validation
    #[serde(flatten)]
    pub unknown: BTreeMap<String, toml::Value>,
}

/// Scalar settings that follow the node > kind > defaults precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Image,
    Group,
    Position,
    User,
    License,
    Config,
}

impl Settings {
    /// Get a setting, treating empty strings as unset
    pub fn get(&self, setting: Setting) -> Option<&str> {
        let value = match setting {
            Setting::Image => &self.image,
            Setting::Group => &self.group,
            Setting::Position => &self.position,
            Setting::User => &self.user,
            Setting::License => &self.license,
            Setting::Config => &self.config,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }
}

/// Declaration of one node
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeConfig {
    pub kind: String,
    #[serde(flatten)]
    pub settings: Settings,
}

impl NodeConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            settings: Settings::default(),
        }
    }
}

/// A parsed topology
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Topology {
    /// Lab name, used for directory and container names
    pub name: String,
    #[serde(default)]
    pub defaults: Settings,
    #[serde(default)]
    pub kinds: BTreeMap<String, Settings>,
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeConfig>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Topology {
    /// Load a topology from a TOML file.
    ///
    /// Relative paths inside the file are resolved against the file's
    /// directory.
    pub fn from_file(path: &Path) -> Result<Self, TopologyError> {
        let content = std::fs::read_to_string(path).map_err(|source| TopologyError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let base_dir = if parent.is_absolute() {
            parent.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|source| TopologyError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?
                .join(parent)
        };

        let mut topology = Self::from_str(&content)?;
        topology.base_dir = base_dir;
        Ok(topology)
    }

    /// Load a topology from a TOML string, resolving relative paths against
    /// the current directory.
    pub fn from_str(content: &str) -> Result<Self, TopologyError> {
        let mut topology: Topology = toml::from_str(content)?;
        topology.base_dir = PathBuf::from(".");
        topology.validate()?;
        Ok(topology)
    }

    /// Set the directory relative paths are resolved against
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    fn validate(&self) -> Result<(), TopologyError> {
        if self.name.trim().is_empty() {
            return Err(TopologyError::invalid("lab name must not be empty"));
        }
        if self.name.contains('/') {
            return Err(TopologyError::invalid(format!(
                "lab name '{}' must not contain '/'",
                self.name
            )));
        }
        for (name, node) in &self.nodes {
            if name.is_empty() || name.contains('/') {
                return Err(TopologyError::invalid(format!(
                    "invalid node name '{}'",
                    name
                )));
            }
            if node.kind.trim().is_empty() {
                return Err(TopologyError::invalid(format!(
                    "node '{}' has an empty kind",
                    name
                )));
            }
            check_unknown(&node.settings, &format!("node '{}'", name))?;
        }
        for (kind, settings) in &self.kinds {
            check_unknown(settings, &format!("kind '{}'", kind))?;
        }
        check_unknown(&self.defaults, "defaults")
    }

    /// Get a node declaration by name
    pub fn node(&self, name: &str) -> Option<&NodeConfig> {
        self.nodes.get(name)
    }

    /// Look up a setting for a node: node, then kind, then defaults
    pub fn setting<'a>(&'a self, cfg: &'a NodeConfig, setting: Setting) -> Option<&'a str> {
        cfg.settings
            .get(setting)
            .or_else(|| self.kinds.get(&cfg.kind).and_then(|k| k.get(setting)))
            .or_else(|| self.defaults.get(setting))
    }

    /// Environment for a node, later levels overriding earlier ones:
    /// defaults, kind, node
    pub fn env(&self, cfg: &NodeConfig) -> Env {
        let mut env = self.defaults.env.clone();
        if let Some(kind) = self.kinds.get(&cfg.kind) {
            env.extend(kind.env.clone());
        }
        env.extend(cfg.settings.env.clone());
        env
    }
}

fn check_unknown(settings: &Settings, section: &str) -> Result<(), TopologyError> {
    match settings.unknown.keys().next() {
        Some(key) => Err(TopologyError::invalid(format!(
            "unknown setting '{}' in {}",
            key, section
        ))),
        None => Ok(()),
    }
}

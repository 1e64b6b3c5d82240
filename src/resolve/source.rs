//! Attribute lookups backed by a parsed topology

use std::path::{Path, PathBuf};

use crate::node::{Env, Node};
use crate::template::TemplateRegistry;
use crate::topology::{NodeConfig, Setting, Topology};

use super::path::resolve_path;
use super::{AttributeSource, SourceError};

/// [`AttributeSource`] reading node > kind > defaults settings from a
/// [`Topology`], falling back to the [`TemplateRegistry`] for per-kind
/// defaults.
#[derive(Debug, Clone)]
pub struct TopologySource<'a> {
    topology: &'a Topology,
    registry: &'a TemplateRegistry,
    /// Used for `~` when the node env carries no HOME
    home: Option<PathBuf>,
}

impl<'a> TopologySource<'a> {
    pub fn new(topology: &'a Topology, registry: &'a TemplateRegistry) -> Self {
        Self {
            topology,
            registry,
            home: None,
        }
    }

    /// Set the home directory used to expand `~`
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    fn home<'e>(&'e self, env: &'e Env) -> Option<&'e Path> {
        env.get("HOME")
            .map(Path::new)
            .or(self.home.as_deref())
    }

    fn text(&self, cfg: &NodeConfig, setting: Setting) -> String {
        self.topology
            .setting(cfg, setting)
            .unwrap_or_default()
            .to_string()
    }
}

impl AttributeSource for TopologySource<'_> {
    fn startup_config(
        &self,
        cfg: &NodeConfig,
        kind: &str,
        env: &Env,
    ) -> Result<PathBuf, SourceError> {
        if let Some(raw) = self.topology.setting(cfg, Setting::Config) {
            if let Some(path) = resolve_path(raw, &self.topology.base_dir, self.home(env))? {
                return Ok(path);
            }
        }

        match self.registry.get(kind) {
            Some(templates) => Ok(templates.startup_config.clone()),
            None => {
                let mut known: Vec<_> = self.registry.kinds().collect();
                known.sort_unstable();
                Err(SourceError::UnknownKind {
                    kind: kind.to_string(),
                    known: known.join(", "),
                })
            }
        }
    }

    fn image(&self, cfg: &NodeConfig, kind: &str) -> String {
        self.topology
            .setting(cfg, Setting::Image)
            .or_else(|| {
                self.registry
                    .get(kind)
                    .and_then(|t| t.default_image.as_deref())
            })
            .unwrap_or_default()
            .to_string()
    }

    fn group(&self, cfg: &NodeConfig, _kind: &str) -> String {
        self.text(cfg, Setting::Group)
    }

    fn position(&self, cfg: &NodeConfig, _kind: &str) -> String {
        self.text(cfg, Setting::Position)
    }

    fn license(
        &self,
        cfg: &NodeConfig,
        _node: &Node,
        env: &Env,
    ) -> Result<Option<PathBuf>, SourceError> {
        match self.topology.setting(cfg, Setting::License) {
            Some(raw) => Ok(resolve_path(raw, &self.topology.base_dir, self.home(env))?),
            None => Ok(None),
        }
    }
}

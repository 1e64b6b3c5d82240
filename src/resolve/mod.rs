//! Node attribute resolution
//!
//! [`resolve_node`] fills in a freshly allocated [`Node`] from its
//! [`NodeConfig`]. It is a pure in-memory step: lookups are delegated to an
//! [`AttributeSource`] and nothing touches the filesystem, so a missing
//! license file only shows up when the node is materialized.

mod path;
mod source;

pub use path::{resolve_path, PathError};
pub use source::TopologySource;

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::node::{Env, Node, NodeError, NodeState};
use crate::topology::NodeConfig;

/// Errors reported by an [`AttributeSource`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// No override given and the kind has no registered default
    #[error("no default startup config for kind {kind} (known kinds: {known})")]
    UnknownKind { kind: String, known: String },

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Lookups a node's attributes are resolved from.
///
/// Image, group and position are total: implementations fall back to
/// defaults instead of failing.
pub trait AttributeSource {
    /// Startup config source: the user override, or the kind's default template
    fn startup_config(&self, cfg: &NodeConfig, kind: &str, env: &Env)
        -> Result<PathBuf, SourceError>;

    fn image(&self, cfg: &NodeConfig, kind: &str) -> String;

    fn group(&self, cfg: &NodeConfig, kind: &str) -> String;

    fn position(&self, cfg: &NodeConfig, kind: &str) -> String;

    /// License file, `None` when no license is configured
    fn license(&self, cfg: &NodeConfig, node: &Node, env: &Env)
        -> Result<Option<PathBuf>, SourceError>;
}

/// Errors that can occur while resolving a node
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Resolution runs once, on a freshly allocated node
    #[error("node {node} is {state}, only declared nodes can be resolved")]
    NotDeclared { node: String, state: NodeState },

    #[error("node {node} has no lab directory")]
    MissingLabDir { node: String },

    #[error("node {node} is of kind {node_kind} but its config declares kind {config_kind}")]
    KindMismatch {
        node: String,
        node_kind: String,
        config_kind: String,
    },

    #[error("node {node}: failed to resolve startup config: {source}")]
    StartupConfig {
        node: String,
        #[source]
        source: SourceError,
    },

    #[error("node {node}: failed to resolve license: {source}")]
    License {
        node: String,
        #[source]
        source: SourceError,
    },

    #[error("node {node}: {source}")]
    Bind {
        node: String,
        #[source]
        source: NodeError,
    },
}

/// Resolve all runtime attributes of `node`.
///
/// Steps run in a fixed order and stop at the first failure: startup config,
/// image/group/position, user, license, env, mandatory binds. On failure the
/// node keeps whatever the earlier steps wrote and is marked
/// [`NodeState::Failed`]; it must be discarded rather than materialized.
#[instrument(skip_all, fields(node = %node.short_name, kind = %node.kind), err)]
pub fn resolve_node<S: AttributeSource + ?Sized>(
    source: &S,
    cfg: &NodeConfig,
    node: &mut Node,
    user: &str,
    env: &Env,
) -> Result<(), ResolveError> {
    if node.state != NodeState::Declared {
        return Err(ResolveError::NotDeclared {
            node: node.short_name.clone(),
            state: node.state,
        });
    }

    match resolve_attributes(source, cfg, node, user, env) {
        Ok(()) => {
            node.state = NodeState::Resolved;
            debug!(
                image = %node.image,
                license = ?node.license,
                binds = node.binds.len(),
                "node resolved"
            );
            Ok(())
        }
        Err(e) => {
            node.state = NodeState::Failed;
            Err(e)
        }
    }
}

fn resolve_attributes<S: AttributeSource + ?Sized>(
    source: &S,
    cfg: &NodeConfig,
    node: &mut Node,
    user: &str,
    env: &Env,
) -> Result<(), ResolveError> {
    if cfg.kind != node.kind {
        return Err(ResolveError::KindMismatch {
            node: node.short_name.clone(),
            node_kind: node.kind.clone(),
            config_kind: cfg.kind.clone(),
        });
    }
    let layout = node.layout().ok_or_else(|| ResolveError::MissingLabDir {
        node: node.short_name.clone(),
    })?;

    let config = source
        .startup_config(cfg, &node.kind, env)
        .map_err(|e| ResolveError::StartupConfig {
            node: node.short_name.clone(),
            source: e,
        })?;
    node.config = Some(config);

    node.image = source.image(cfg, &node.kind);
    node.group = source.group(cfg, &node.kind);
    node.position = source.position(cfg, &node.kind);
    node.user = user.to_string();

    let license = source
        .license(cfg, node, env)
        .map_err(|e| ResolveError::License {
            node: node.short_name.clone(),
            source: e,
        })?;
    node.license = license;
    node.env = env.clone();

    for bind in layout.mandatory_binds() {
        node.push_bind(bind).map_err(|e| ResolveError::Bind {
            node: node.short_name.clone(),
            source: e,
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Bind;
    use pretty_assertions::assert_eq;

    /// Fixed answers, optionally failing
    struct StaticSource {
        license: Result<Option<PathBuf>, SourceError>,
        config: Result<PathBuf, SourceError>,
    }

    impl Default for StaticSource {
        fn default() -> Self {
            Self {
                license: Ok(None),
                config: Ok(PathBuf::from("/tpl/crpd/juniper.conf")),
            }
        }
    }

    impl AttributeSource for StaticSource {
        fn startup_config(&self, _: &NodeConfig, _: &str, _: &Env) -> Result<PathBuf, SourceError> {
            self.config.clone()
        }
        fn image(&self, _: &NodeConfig, _: &str) -> String {
            "crpd:latest".to_string()
        }
        fn group(&self, _: &NodeConfig, _: &str) -> String {
            "g".to_string()
        }
        fn position(&self, _: &NodeConfig, _: &str) -> String {
            "1,2".to_string()
        }
        fn license(&self, _: &NodeConfig, _: &Node, _: &Env) -> Result<Option<PathBuf>, SourceError> {
            self.license.clone()
        }
    }

    fn node() -> Node {
        Node::new("node1", "crpd").with_lab_dir("/tmp/lab1/node1")
    }

    #[test]
    fn test_resolve_populates_node() {
        let mut node = node();
        let env: Env = [("K".to_string(), "V".to_string())].into_iter().collect();
        resolve_node(&StaticSource::default(), &NodeConfig::new("crpd"), &mut node, "admin", &env)
            .expect("should resolve");

        assert_eq!(node.state, NodeState::Resolved);
        assert_eq!(node.config, Some(PathBuf::from("/tpl/crpd/juniper.conf")));
        assert_eq!(node.image, "crpd:latest");
        assert_eq!(node.group, "g");
        assert_eq!(node.position, "1,2");
        assert_eq!(node.user, "admin");
        assert_eq!(node.license, None);
        assert_eq!(node.env, env);
        assert_eq!(
            node.binds,
            vec![
                Bind::new("/tmp/lab1/node1/config", "/config"),
                Bind::new("/tmp/lab1/node1/log", "/var/log"),
                Bind::new("/tmp/lab1/node1/config/sshd_config", "/etc/ssh/sshd_config"),
            ]
        );
    }

    #[test]
    fn test_config_failure_appends_no_binds() {
        let source = StaticSource {
            config: Err(SourceError::UnknownKind {
                kind: "crpd".to_string(),
                known: String::new(),
            }),
            ..Default::default()
        };
        let mut node = node();
        let err = resolve_node(&source, &NodeConfig::new("crpd"), &mut node, "u", &Env::new())
            .unwrap_err();

        assert!(matches!(err, ResolveError::StartupConfig { .. }));
        assert_eq!(node.state, NodeState::Failed);
        assert!(node.config.is_none());
        assert!(node.image.is_empty());
        assert!(node.binds.is_empty());
    }

    #[test]
    fn test_license_failure_keeps_earlier_steps() {
        let source = StaticSource {
            license: Err(SourceError::Path(PathError::MissingHome {
                path: "~/l.lic".to_string(),
            })),
            ..Default::default()
        };
        let mut node = node();
        let err = resolve_node(&source, &NodeConfig::new("crpd"), &mut node, "u", &Env::new())
            .unwrap_err();

        assert!(matches!(err, ResolveError::License { .. }));
        assert_eq!(node.state, NodeState::Failed);
        // steps before the license ran, binds were never appended
        assert_eq!(node.image, "crpd:latest");
        assert_eq!(node.user, "u");
        assert!(node.binds.is_empty());
    }

    #[test]
    fn test_resolve_runs_once() {
        let source = StaticSource::default();
        let mut node = node();
        resolve_node(&source, &NodeConfig::new("crpd"), &mut node, "u", &Env::new()).unwrap();

        let err = resolve_node(&source, &NodeConfig::new("crpd"), &mut node, "u", &Env::new())
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotDeclared {
                node: "node1".to_string(),
                state: NodeState::Resolved,
            }
        );
        assert_eq!(node.binds.len(), 3);
    }

    #[test]
    fn test_kind_mismatch() {
        let mut node = node();
        let err = resolve_node(
            &StaticSource::default(),
            &NodeConfig::new("srl"),
            &mut node,
            "u",
            &Env::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::KindMismatch { .. }));
        assert_eq!(node.state, NodeState::Failed);
    }

    #[test]
    fn test_missing_lab_dir() {
        let mut node = Node::new("node1", "crpd");
        let err = resolve_node(
            &StaticSource::default(),
            &NodeConfig::new("crpd"),
            &mut node,
            "u",
            &Env::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::MissingLabDir { .. }));
        assert!(node.config.is_none());
    }

    #[test]
    fn test_preexisting_bind_is_not_shadowed() {
        let mut node = node();
        node.push_bind(Bind::new("/elsewhere", "/var/log")).unwrap();

        let err = resolve_node(
            &StaticSource::default(),
            &NodeConfig::new("crpd"),
            &mut node,
            "u",
            &Env::new(),
        )
        .unwrap_err();

        assert!(matches!(err, ResolveError::Bind { .. }));
        let containers: Vec<_> = node.binds.iter().map(|b| b.container.as_str()).collect();
        assert_eq!(containers, vec!["/var/log", "/config"]);
    }
}

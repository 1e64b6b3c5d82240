//! labnode - provisioning of containerized routing daemon lab nodes
//!
//! This library turns a node declared in a lab topology into a launchable
//! container description and prepares the directory tree the container
//! mounts. Provisioning happens in two phases:
//!
//! 1. [`resolve_node`] fills in image, group, position, user, license,
//!    startup config and bind mounts without touching the filesystem.
//! 2. [`materialize`] creates `config/` and `log/` below the node's lab
//!    directory and writes `juniper.conf`, `sshd_config` and
//!    `license.conf` into it.
//!
//! # Example
//!
//! ```rust
//! use labnode::{resolve_node, Env, Lab, TemplateRegistry, Topology, TopologySource};
//!
//! let topology = Topology::from_str(r#"
//!     name = "lab1"
//!
//!     [nodes.node1]
//!     kind = "crpd"
//! "#).unwrap();
//! let registry = TemplateRegistry::builtin("/etc/containerlab/templates");
//! let lab = Lab::new(topology, "/tmp");
//!
//! let (cfg, mut node) = lab.allocate("node1").unwrap();
//! let source = TopologySource::new(lab.topology(), &registry);
//! resolve_node(&source, cfg, &mut node, "root", &Env::new()).unwrap();
//!
//! assert_eq!(node.long_name, "clab-lab1-node1");
//! assert_eq!(node.binds.len(), 3);
//! ```

pub mod error;
pub mod logging;
pub mod materialize;
pub mod node;
pub mod resolve;
pub mod template;
pub mod topology;

pub use error::TopologyError;
pub use materialize::{materialize, MaterializeError, Report, Stage, StageOutcome, Warning};
pub use node::{Bind, Env, Node, NodeLayout, NodeState};
pub use resolve::{resolve_node, AttributeSource, ResolveError, SourceError, TopologySource};
pub use template::{KindTemplates, TemplateError, TemplateRegistry};
pub use topology::{Lab, NodeConfig, Setting, Topology};

use thiserror::Error;

/// Errors that can occur while provisioning a node
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The topology does not declare the node
    #[error("node {name} is not declared in the topology")]
    UnknownNode { name: String },

    /// Error during attribute resolution
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Error while creating the node's files
    #[error("materialization failed: {0}")]
    Materialize(#[from] MaterializeError),
}

/// Resolve and materialize one node of a lab
///
/// The user and environment follow the topology's node > kind > defaults
/// precedence. A node that fails resolution is never materialized.
///
/// # Example
///
/// ```rust
/// use labnode::{provision_node, template, Lab, TemplateRegistry, Topology, TopologySource};
///
/// let tmp = tempfile::TempDir::new().unwrap();
/// let templates = tmp.path().join("templates");
/// template::install(&templates).unwrap();
///
/// let topology = Topology::from_str(r#"
///     name = "lab1"
///     [nodes.node1]
///     kind = "crpd"
/// "#).unwrap();
/// let registry = TemplateRegistry::builtin(&templates);
/// let lab = Lab::new(topology, tmp.path());
/// let source = TopologySource::new(lab.topology(), &registry);
///
/// let (node, report) = provision_node(&lab, &registry, &source, "node1").unwrap();
/// assert!(!report.is_degraded());
/// assert!(tmp.path().join("clab-lab1/node1/config/juniper.conf").is_file());
/// # drop(node);
/// ```
pub fn provision_node<S: AttributeSource + ?Sized>(
    lab: &Lab,
    registry: &TemplateRegistry,
    source: &S,
    name: &str,
) -> Result<(Node, Report), ProvisionError> {
    let (cfg, mut node) = lab
        .allocate(name)
        .ok_or_else(|| ProvisionError::UnknownNode {
            name: name.to_string(),
        })?;

    let topology = lab.topology();
    let user = topology.setting(cfg, Setting::User).unwrap_or_default();
    let env = topology.env(cfg);

    resolve_node(source, cfg, &mut node, user, &env)?;
    let report = materialize(&mut node, registry)?;
    Ok((node, report))
}

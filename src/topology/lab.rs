//! Lab directory allocation

use std::path::{Path, PathBuf};

use crate::node::Node;

use super::{NodeConfig, Topology};

/// Prefix of lab directories and container names
const LAB_PREFIX: &str = "clab";

/// A topology placed below a lab root directory.
///
/// Each node gets `<root>/clab-<lab>/<node>` as its exclusive `LabDir`. A
/// relative root is taken relative to the current directory.
#[derive(Debug, Clone)]
pub struct Lab {
    topology: Topology,
    root: PathBuf,
}

impl Lab {
    pub fn new(topology: Topology, root: impl Into<PathBuf>) -> Self {
        Self {
            topology,
            root: absolute(root.into()),
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every node directory of this lab
    pub fn dir(&self) -> PathBuf {
        self.root.join(format!("{}-{}", LAB_PREFIX, self.topology.name))
    }

    /// Names of all declared nodes, in sorted order
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.topology.nodes.keys().map(|s| s.as_str())
    }

    /// Allocate a fresh, unresolved node for a declared name
    pub fn allocate(&self, name: &str) -> Option<(&NodeConfig, Node)> {
        let cfg = self.topology.node(name)?;
        let node = Node::new(name, cfg.kind.clone())
            .with_long_name(format!("{}-{}-{}", LAB_PREFIX, self.topology.name, name))
            .with_lab_dir(self.dir().join(name));
        Some((cfg, node))
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeState;

    fn lab() -> Lab {
        let topo = Topology::from_str(
            "name = \"lab1\"\n[nodes.node1]\nkind = \"crpd\"\n[nodes.a]\nkind = \"crpd\"\n",
        )
        .unwrap();
        Lab::new(topo, "/tmp")
    }

    #[test]
    fn test_allocate_assigns_lab_dir_and_names() {
        let lab = lab();
        let (cfg, node) = lab.allocate("node1").expect("node1 is declared");

        assert_eq!(cfg.kind, "crpd");
        assert_eq!(node.short_name, "node1");
        assert_eq!(node.long_name, "clab-lab1-node1");
        assert_eq!(node.kind, "crpd");
        assert_eq!(node.lab_dir, Some(PathBuf::from("/tmp/clab-lab1/node1")));
        assert_eq!(node.state, NodeState::Declared);
    }

    #[test]
    fn test_allocate_unknown_node() {
        assert!(lab().allocate("missing").is_none());
    }

    #[test]
    fn test_node_names_sorted() {
        let lab = lab();
        let names: Vec<_> = lab.node_names().collect();
        assert_eq!(names, vec!["a", "node1"]);
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let topo = Topology::from_str("name = \"lab1\"\n[nodes.node1]\nkind = \"crpd\"\n")
            .unwrap();
        let lab = Lab::new(topo, "labs");

        let cwd = std::env::current_dir().unwrap();
        assert_eq!(lab.root(), cwd.join("labs"));

        let (_, node) = lab.allocate("node1").unwrap();
        assert_eq!(node.lab_dir, Some(cwd.join("labs/clab-lab1/node1")));
    }
}

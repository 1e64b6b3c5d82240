//! Fixed on-disk layout of a node's lab directory

use std::path::{Path, PathBuf};

use super::Bind;

/// Container path of the config directory mount
pub const CONFIG_MOUNT: &str = "/config";
/// Container path of the log directory mount
pub const LOG_MOUNT: &str = "/var/log";
/// Container path of the sshd config file mount
pub const SSHD_CONFIG_MOUNT: &str = "/etc/ssh/sshd_config";

/// Paths below a node's `LabDir`.
///
/// Both resolution (bind sources) and materialization (file targets) go
/// through this type, so the two phases can't disagree on a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLayout {
    lab_dir: PathBuf,
}

impl NodeLayout {
    pub fn new(lab_dir: impl Into<PathBuf>) -> Self {
        Self {
            lab_dir: lab_dir.into(),
        }
    }

    pub fn lab_dir(&self) -> &Path {
        &self.lab_dir
    }

    pub fn config_dir(&self) -> PathBuf {
        self.lab_dir.join("config")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.lab_dir.join("log")
    }

    /// Generated startup configuration
    pub fn startup_config(&self) -> PathBuf {
        self.config_dir().join("juniper.conf")
    }

    pub fn sshd_config(&self) -> PathBuf {
        self.config_dir().join("sshd_config")
    }

    /// Destination of the license copy, only populated when a license is set
    pub fn license(&self) -> PathBuf {
        self.config_dir().join("license.conf")
    }

    /// The mandatory bind mounts, in the order they are appended
    pub fn mandatory_binds(&self) -> [Bind; 3] {
        [
            Bind::new(self.config_dir(), CONFIG_MOUNT),
            Bind::new(self.log_dir(), LOG_MOUNT),
            Bind::new(self.sshd_config(), SSHD_CONFIG_MOUNT),
        ]
    }
}

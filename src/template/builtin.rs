//! Templates shipped with the crate
//!
//! These are the files expected below the templates root. They are compiled
//! into the binary so a fresh host can be prepared with
//! `labnode --install-templates`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::registry::{KindTemplates, TemplateError};

/// System-wide templates root
pub const DEFAULT_TEMPLATES_ROOT: &str = "/etc/containerlab/templates";

/// Kind tag of the containerized Junos routing daemon
pub const CRPD_KIND: &str = "crpd";

/// Fallback image for crpd nodes
pub const CRPD_DEFAULT_IMAGE: &str = "crpd:latest";

/// File name of the startup config template inside a kind directory
pub const STARTUP_CONFIG_FILE: &str = "juniper.conf";

/// File name of the sshd config inside a kind directory
pub const SSHD_CONFIG_FILE: &str = "sshd_config";

/// Default crpd startup configuration (tera template, rendered per node)
const CRPD_STARTUP_CONFIG: &str = r#"system {
    host-name {{ short_name }};
    root-authentication {
        encrypted-password "$6$lB5c6$Zeud8c6IhCTE6hnZxXBl3ZMZTC2hOx9pxxYUWTHKW1oC32SATWLMH2EXarxWS5k685qMggUfFur1lq.o4p4cg1"; ## SECRET-DATA
    }
    services {
        ssh {
            root-login allow;
        }
        netconf {
            ssh;
        }
    }
}
"#;

/// sshd config mounted over the image's own
const CRPD_SSHD_CONFIG: &str = r#"Port 22
PermitRootLogin yes
PasswordAuthentication yes
ChallengeResponseAuthentication no
UsePAM yes
X11Forwarding no
PrintMotd no
AcceptEnv LANG LC_*
Subsystem sftp /usr/lib/openssh/sftp-server
Subsystem netconf /usr/sbin/cli -c 'netconf'
"#;

/// All built-in template files: (kind, file name, content)
pub const BUILTIN_FILES: &[(&str, &str, &str)] = &[
    (CRPD_KIND, STARTUP_CONFIG_FILE, CRPD_STARTUP_CONFIG),
    (CRPD_KIND, SSHD_CONFIG_FILE, CRPD_SSHD_CONFIG),
];

/// Registry entries for the built-in kinds below `root`
pub(super) fn kinds(root: &Path) -> Vec<KindTemplates> {
    vec![KindTemplates::under_root(CRPD_KIND, root).with_default_image(CRPD_DEFAULT_IMAGE)]
}

/// Write the built-in template files below `root`.
///
/// Existing files are left untouched so local edits survive a reinstall.
/// Returns the paths that were written.
pub fn install(root: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    let mut written = Vec::new();

    for (kind, file, content) in BUILTIN_FILES {
        let dir = root.join(kind);
        fs::create_dir_all(&dir).map_err(|source| TemplateError::Install {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(file);
        if path.exists() {
            debug!(path = %path.display(), "template already present, keeping it");
            continue;
        }

        fs::write(&path, content).map_err(|source| TemplateError::Install {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }

    info!(root = %root.display(), count = written.len(), "installed built-in templates");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_writes_all_files_once() {
        let tmp = tempfile::TempDir::new().unwrap();

        let written = install(tmp.path()).expect("install should succeed");
        assert_eq!(written.len(), BUILTIN_FILES.len());
        assert!(tmp.path().join("crpd/juniper.conf").is_file());
        assert!(tmp.path().join("crpd/sshd_config").is_file());

        let again = install(tmp.path()).expect("reinstall should succeed");
        assert!(again.is_empty());
    }

    #[test]
    fn test_install_keeps_local_edits() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("crpd")).unwrap();
        fs::write(tmp.path().join("crpd/sshd_config"), "Port 2222\n").unwrap();

        install(tmp.path()).unwrap();

        assert_eq!(
            fs::read_to_string(tmp.path().join("crpd/sshd_config")).unwrap(),
            "Port 2222\n"
        );
    }

    #[test]
    fn test_startup_template_uses_node_name() {
        assert!(CRPD_STARTUP_CONFIG.contains("{{ short_name }}"));
    }
}

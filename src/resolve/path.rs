//! Path rules for user-supplied file references

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Errors for malformed path references
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    /// `~` used but no home directory is known
    #[error("cannot expand '~' in {path}: HOME is not set")]
    MissingHome { path: String },

    /// `~user` style references
    #[error("unsupported home reference in {path}: only '~' and '~/' are expanded")]
    UnsupportedTilde { path: String },

    #[error("path {path:?} contains a NUL byte")]
    Nul { path: String },
}

/// Turn a raw path from the topology into an absolute-ish path.
///
/// - empty means unset and yields `None`
/// - `~` and `~/...` expand to `home`
/// - relative paths are joined to `base_dir`
/// - `.` components are dropped
///
/// No filesystem access happens here; whether the file exists is found out
/// when it is used.
pub fn resolve_path(
    raw: &str,
    base_dir: &Path,
    home: Option<&Path>,
) -> Result<Option<PathBuf>, PathError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if raw.contains('\0') {
        return Err(PathError::Nul {
            path: raw.to_string(),
        });
    }

    let path = if let Some(rest) = raw.strip_prefix('~') {
        let rest = match rest {
            "" => "",
            _ => rest.strip_prefix('/').ok_or_else(|| PathError::UnsupportedTilde {
                path: raw.to_string(),
            })?,
        };
        let home = home
            .filter(|h| !h.as_os_str().is_empty())
            .ok_or_else(|| PathError::MissingHome {
                path: raw.to_string(),
            })?;
        home.join(rest)
    } else {
        base_dir.join(raw)
    };

    Ok(Some(
        path.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::absolute("/licenses/l1.lic", Some("/licenses/l1.lic"))]
    #[case::relative("licenses/l1.lic", Some("/topo/licenses/l1.lic"))]
    #[case::dot_relative("./l1.lic", Some("/topo/l1.lic"))]
    #[case::home("~/l1.lic", Some("/home/lab/l1.lic"))]
    #[case::bare_home("~", Some("/home/lab"))]
    #[case::empty("", None)]
    fn test_resolve_path(#[case] raw: &str, #[case] expected: Option<&str>) {
        let resolved = resolve_path(raw, Path::new("/topo"), Some(Path::new("/home/lab")))
            .expect("must resolve");
        assert_eq!(resolved, expected.map(PathBuf::from));
    }

    #[rstest]
    #[case::other_user("~bob/l1.lic")]
    #[case::tilde_suffix("~x")]
    fn test_resolve_path_rejects_user_tilde(#[case] raw: &str) {
        let err = resolve_path(raw, Path::new("/topo"), Some(Path::new("/home/lab"))).unwrap_err();
        assert!(matches!(err, PathError::UnsupportedTilde { .. }));
    }

    #[test]
    fn test_resolve_path_without_home() {
        let err = resolve_path("~/l1.lic", Path::new("/topo"), None).unwrap_err();
        assert_eq!(
            err,
            PathError::MissingHome {
                path: "~/l1.lic".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_path_rejects_nul() {
        let err = resolve_path("/a\0b", Path::new("/topo"), None).unwrap_err();
        assert!(matches!(err, PathError::Nul { .. }));
    }
}

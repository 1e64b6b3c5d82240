//! Directory creation and file copies

use std::fs::{self, File};
use std::io;
use std::path::Path;

/// Mode for directories bind mounted into the container
pub const DIR_MODE: u32 = 0o777;

/// Create `path` and its parents, like `mkdir -p`.
///
/// An existing directory is fine; an existing non-directory is an error.
/// The process umask still applies to `mode`.
pub fn create_dir(path: &Path, mode: u32) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path)
}

/// Copy a regular file byte for byte, replacing `dst`.
///
/// `dst` is created with default permissions instead of inheriting the
/// source's, so a read-only source can be copied again later. Copying a file
/// onto itself does nothing. Returns the number of bytes written.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let src_meta = fs::metadata(src)?;
    if !src_meta.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("non-regular source file {}", src.display()),
        ));
    }

    if let Ok(dst_meta) = fs::metadata(dst) {
        if same_file(&src_meta, &dst_meta) {
            return Ok(0);
        }
    }

    let mut reader = File::open(src)?;
    let mut writer = File::create(dst)?;
    let copied = io::copy(&mut reader, &mut writer)?;
    writer.sync_all()?;
    Ok(copied)
}

#[cfg(unix)]
fn same_file(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_file(_: &fs::Metadata, _: &fs::Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_dir_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b/config");

        create_dir(&dir, DIR_MODE).unwrap();
        create_dir(&dir, DIR_MODE).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_create_dir_blocked_by_file() {
        let tmp = TempDir::new().unwrap();
        let blocked = tmp.path().join("config");
        fs::write(&blocked, "not a dir").unwrap();

        assert!(create_dir(&blocked, DIR_MODE).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_create_dir_applies_mode() {
        use nix::sys::stat::{umask, Mode};
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let shared = tmp.path().join("lab/config");
        let private = tmp.path().join("private");

        let old = umask(Mode::empty());
        let created = create_dir(&shared, DIR_MODE).and_then(|_| create_dir(&private, 0o700));
        umask(old);
        created.unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&shared), 0o777);
        assert_eq!(mode(&tmp.path().join("lab")), 0o777);
        assert_eq!(mode(&private), 0o700);
    }

    #[test]
    fn test_copy_file_overwrites() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::write(&src, b"new content").unwrap();
        fs::write(&dst, b"old content that is longer").unwrap();

        let copied = copy_file(&src, &dst).unwrap();
        assert_eq!(copied, 11);
        assert_eq!(fs::read(&dst).unwrap(), b"new content");
    }

    #[test]
    fn test_copy_file_onto_itself() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::write(&src, b"keep me").unwrap();

        assert_eq!(copy_file(&src, &src).unwrap(), 0);
        assert_eq!(fs::read(&src).unwrap(), b"keep me");
    }

    #[test]
    fn test_copy_file_rejects_directory_source() {
        let tmp = TempDir::new().unwrap();
        let err = copy_file(tmp.path(), &tmp.path().join("dst")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_copy_file_missing_source() {
        let tmp = TempDir::new().unwrap();
        let err = copy_file(&tmp.path().join("missing"), &tmp.path().join("dst")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!tmp.path().join("dst").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_read_only_source_twice() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("license");
        let dst = tmp.path().join("license.conf");
        fs::write(&src, b"lic").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o444)).unwrap();

        copy_file(&src, &dst).unwrap();
        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"lic");
    }
}

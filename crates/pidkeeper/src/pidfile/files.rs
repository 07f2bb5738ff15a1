//! Durable replacement of small files.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

#[cfg(unix)]
use std::fs::Permissions;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Directory holding `path`; bare file names live in the current directory.
fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn staging_file(directory: &Path) -> io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(".pidkeeper-").suffix(".staged");
    #[cfg(unix)]
    builder.permissions(Permissions::from_mode(0o600));
    builder.tempfile_in(directory)
}

#[cfg(unix)]
fn sync_dir(directory: &Path) -> io::Result<()> {
    File::open(directory)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_directory: &Path) -> io::Result<()> {
    Ok(())
}

/// Stages `contents` in an owner-only sibling of `path`, renames it into
/// place and syncs the directory entry.
///
/// Readers observe either the old contents or the new ones.
pub(super) fn replace_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = parent_dir(path);
    let mut staged = staging_file(directory)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|error| error.error)?;
    sync_dir(directory)
}

/// Fails when no file can be created next to `path`.
pub(super) fn check_writable_dir(path: &Path) -> io::Result<()> {
    staging_file(parent_dir(path)).map(drop)
}

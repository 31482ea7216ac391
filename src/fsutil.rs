// CLASSIFICATION: COMMUNITY
// Filename: fsutil.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use std::fs;
use std::io::Write;
use std::path::Path;

use log::debug;
use tempfile::Builder;

use crate::error::{CloudInitError, Result};

pub(crate) fn file_exists(path: &Path) -> bool {
    path.exists()
}

pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| CloudInitError::io("cannot make cloud config dir", e))
}

pub(crate) fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    debug!("copying {} to {}", src.display(), dst.display());
    fs::copy(src, dst).map_err(|e| {
        CloudInitError::io(
            format!("cannot copy {} to {}", src.display(), dst.display()),
            e,
        )
    })?;
    Ok(())
}

/// Write `contents` to `path` via a synced temporary file in the same
/// directory, so readers never observe a partially written file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        CloudInitError::Configuration(format!("{} has no parent directory", path.display()))
    })?;
    ensure_dir(parent)?;
    let context = || format!("cannot write {}", path.display());
    let mut tmp = Builder::new()
        .prefix(".cohcloud")
        .tempfile_in(parent)
        .map_err(|e| CloudInitError::io(context(), e))?;
    tmp.write_all(contents)
        .map_err(|e| CloudInitError::io(context(), e))?;
    // tempfile creates 0600; cloud-init config must stay world-readable
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| CloudInitError::io(context(), e))?;
    }
    tmp.as_file_mut()
        .sync_all()
        .map_err(|e| CloudInitError::io(context(), e))?;
    tmp.persist(path)
        .map_err(|e| CloudInitError::io(context(), e.error))?;
    Ok(())
}

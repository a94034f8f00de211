//! Plain-file secret store.
//!
//! Each master secret is written as raw bytes to `{dir}/{id}.secret`. The
//! directory is created with mode `0700` and files with mode `0600` on Unix.
//! Writes go through a temporary file and a rename; symlinks at a secret path
//! are never followed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{validate_id, SecretStore};
use crate::error::Result;
use crate::sensitive::{ByteSecret, SensitiveValue};

/// File-system-backed secret store, available on every platform.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    dir: PathBuf,
    enabled: bool,
}

impl FileSecretStore {
    /// Create a store rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            enabled: true,
        }
    }

    /// Enable or disable the backend.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve the path of the secret file for `id`.
    pub fn secret_path(&self, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{id}.secret")))
    }

    /// Ensure the directory exists with restrictive permissions.
    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o700))?;
        }

        Ok(())
    }
}

/// Replace the file at `path` with `data`, mode 0600 on Unix.
///
/// The blob is written and synced to `<path>.tmp`, then renamed over
/// `path`. A failed write leaves any previous secret untouched, and a
/// symlink at `path` is replaced rather than written through.
fn write_secret_file(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);

    // Whatever sits at the tmp path (stale file or link) is unlinked, never opened.
    match fs::remove_file(&tmp) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let written = options.open(&tmp).and_then(|mut file| {
        file.write_all(data)?;
        file.sync_all()?;

        // umask may have cleared bits; pin the mode exactly.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    });

    if let Err(e) = written.and_then(|()| fs::rename(&tmp, path)) {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %cleanup, "failed to remove temporary secret file");
            }
        }
        return Err(e.into());
    }

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Whether `path` is a regular file, without following symlinks.
fn is_regular_file(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl SecretStore for FileSecretStore {
    fn name(&self) -> &str {
        "file"
    }

    fn is_available(&self) -> Result<bool> {
        Ok(self.enabled)
    }

    fn has_secret(&self, id: &str) -> Result<bool> {
        let path = self.secret_path(id)?;
        is_regular_file(&path)
    }

    fn get_secret(&self, id: &str) -> Result<Option<ByteSecret>> {
        let path = self.secret_path(id)?;
        if !is_regular_file(&path)? {
            if fs::symlink_metadata(&path).is_ok() {
                warn!(id, path = %path.display(), "ignoring secret path that is not a regular file");
            }
            return Ok(None);
        }

        match fs::read(&path) {
            Ok(data) => {
                debug!(id, path = %path.display(), "read secret file");
                Ok(Some(SensitiveValue::wrap(data)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_secret(&self, id: &str, secret: &[u8]) -> Result<()> {
        let path = self.secret_path(id)?;
        self.ensure_dir()?;
        debug!(id, path = %path.display(), "writing secret file");
        write_secret_file(&path, secret)
    }

    fn delete_secret(&self, id: &str) -> Result<()> {
        let path = self.secret_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(id, path = %path.display(), "deleted secret file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

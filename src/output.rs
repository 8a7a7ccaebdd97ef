use std::{fs, io, path::Path};

use anyhow::Context;
use tracing::debug;

/// Whether [`write_if_changed`] touched the destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Write `contents` to `path` only when it differs byte-for-byte from what is already there.
///
/// Missing parent directories are created. A missing destination counts as empty, so an empty
/// `contents` against a missing file is reported as unchanged and nothing is created.
pub fn write_if_changed(path: &Path, contents: &str) -> anyhow::Result<WriteOutcome> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let old = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    if old == contents.as_bytes() {
        debug!(path = %path.display(), "output unchanged, skipping write");
        return Ok(WriteOutcome::Unchanged);
    }

    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), bytes = contents.len(), "output written");
    Ok(WriteOutcome::Written)
}

//! Reading the binding context and delivering the patch document.

use std::fmt::Display;
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Where the binding context is read from. `-` selects stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    pub fn from_path(path: &Path) -> Self {
        if path == Path::new("-") {
            Source::Stdin
        } else {
            Source::File(path.to_path_buf())
        }
    }

    pub fn read(&self) -> Result<Vec<u8>, Error> {
        match self {
            Source::Stdin => {
                let mut buf = Vec::new();
                std::io::stdin()
                    .lock()
                    .read_to_end(&mut buf)
                    .map_err(|e| Error::io("read", "<stdin>", e))?;
                Ok(buf)
            }
            Source::File(path) => std::fs::read(path).map_err(|e| Error::io("read", path, e)),
        }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Stdin => write!(f, "<stdin>"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Where the patch document goes. `-` selects stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    File(PathBuf),
}

impl Sink {
    pub fn from_path(path: &Path) -> Self {
        if path == Path::new("-") {
            Sink::Stdout
        } else {
            Sink::File(path.to_path_buf())
        }
    }

    /// Deliver `document` in full, or leave the sink untouched.
    ///
    /// Files are written to a temporary sibling and renamed over the target,
    /// so readers never observe a partial document. The temporary file is
    /// removed on every failure path.
    ///
    /// Stdout is best-effort: the document goes out in one `write_all`, but
    /// a stream that breaks midway (e.g. `EPIPE`) may have received a
    /// prefix of it. The error is still returned.
    pub fn write_atomic(&self, document: &[u8]) -> Result<(), Error> {
        match self {
            Sink::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(document)
                    .and_then(|()| out.flush())
                    .map_err(|e| Error::io("write", "<stdout>", e))
            }
            Sink::File(path) => write_file_atomic(path, document),
        }
    }
}

impl Display for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sink::Stdout => write!(f, "<stdout>"),
            Sink::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn write_file_atomic(path: &Path, document: &[u8]) -> Result<(), Error> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".envinjector-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::io("create a temporary file in", dir, e))?;

    // Same mode a plain create would give, instead of tempfile's 0600
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::io("set permissions of", tmp.path(), e))?;
    }

    tmp.write_all(document)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| Error::io("write", tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| Error::io("replace", path, e.error))?;
    Ok(())
}

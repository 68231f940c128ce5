//! Filesystem IPC channel for passing the generated program to the solver.
//!
//! A named pipe inside a private temporary directory is preferred: the solver
//! opens it as an ordinary input file and the program text never touches the
//! disk. Where `mkfifo` is unavailable the channel falls back to a plain
//! temporary file, which must be written before the solver starts.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::SolverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IpcKind {
    /// Write after spawning the solver; opening the pipe blocks until the
    /// solver opens the read end.
    Pipe,
    /// Write before spawning the solver.
    File,
}

#[derive(Debug)]
pub(crate) struct IpcChannel {
    /// Owns the directory; removal on drop also removes the pipe or file.
    _dir: TempDir,
    path: PathBuf,
    kind: IpcKind,
}

impl IpcChannel {
    pub(crate) fn new() -> Result<Self, SolverError> {
        let dir = tempfile::Builder::new()
            .prefix("sesh_")
            .tempdir()
            .map_err(|e| SolverError::Ipc {
                message: format!("cannot create temporary directory: {e}"),
            })?;

        #[cfg(unix)]
        {
            let path = dir.path().join("pipe");
            match mkfifo(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "created solver input pipe");
                    return Ok(Self {
                        _dir: dir,
                        path,
                        kind: IpcKind::Pipe,
                    });
                }
                Err(e) => {
                    debug!(error = %e, "mkfifo failed, falling back to a temporary file");
                }
            }
        }

        let path = dir.path().join("input");
        Ok(Self {
            _dir: dir,
            path,
            kind: IpcKind::File,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn kind(&self) -> IpcKind {
        self.kind
    }
}

#[cfg(unix)]
fn mkfifo(path: &Path) -> std::io::Result<()> {
    use std::os::unix::ffi::OsStrExt;

    let cpath = std::ffi::CString::new(path.as_os_str().as_bytes())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    if unsafe { libc::mkfifo(cpath.as_ptr(), 0o600) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

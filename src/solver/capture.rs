//! Background capture of the solver's stderr stream.
//!
//! The solver blocks once the OS pipe buffer for stderr fills up, so stderr
//! must be drained concurrently with the stdout line reads. A dedicated
//! thread reads the stream to the end and hands the bytes back on join.

use std::io::Read;
use std::process::ChildStderr;
use std::thread::JoinHandle;

pub(crate) struct StderrCapture {
    handle: Option<JoinHandle<Vec<u8>>>,
}

impl StderrCapture {
    pub(crate) fn spawn(mut stderr: ChildStderr) -> Self {
        let handle = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            buf
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Wait for the stream to end and return everything the solver wrote.
    /// Returns an empty string on the second call.
    pub(crate) fn join(&mut self) -> String {
        match self.handle.take() {
            Some(handle) => {
                let bytes = handle.join().unwrap_or_default();
                String::from_utf8_lossy(&bytes).into_owned()
            }
            None => String::new(),
        }
    }
}

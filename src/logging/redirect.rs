//! Capture of the real process output streams
//!
//! Code that writes straight to file descriptors 1 and 2 (third-party crates,
//! child processes inheriting the descriptors) bypasses the injected
//! `OutputStreams`. On Unix the descriptors are pointed at a pipe and a reader
//! thread feeds complete lines into a bridge. Bytes that arrive together
//! become one record; a line split across reads is joined first.

use std::fs::File;
use std::io::{self, Read};
use std::thread::JoinHandle;

use super::bridge::SharedStream;

/// A redirected descriptor and the thread draining it
pub struct CapturedStream {
    original: File,
    reader: JoinHandle<()>,
}

impl CapturedStream {
    /// A handle to the terminal the descriptor pointed at before capture
    pub fn original(&self) -> io::Result<File> {
        self.original.try_clone()
    }

    /// Wait for the reader to drain; returns once every write end is closed
    pub fn join(self) {
        let _ = self.reader.join();
    }
}

/// Partial output held back before it is emitted anyway
const MAX_PENDING: usize = 64 * 1024;

/// Length of the prefix of `pending` that is ready to become a record.
///
/// Complete lines are ready. An unterminated line is held until it grows past
/// `MAX_PENDING`, and then only up to the last complete UTF-8 character.
fn ready_len(pending: &[u8]) -> Option<usize> {
    if let Some(pos) = pending.iter().rposition(|&b| b == b'\n') {
        return Some(pos + 1);
    }
    if pending.len() < MAX_PENDING {
        return None;
    }
    let len = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => pending.len(),
    };
    (len > 0).then_some(len)
}

/// Copy `reader` into `bridge` until end of stream, one record per batch of
/// complete lines
fn pump(mut reader: impl Read, bridge: SharedStream) {
    let mut buf = [0u8; 8192];
    let mut pending = Vec::new();
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                if let Some(len) = ready_len(&pending) {
                    let _ = bridge.emit(&pending[..len]);
                    pending.drain(..len);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    if !pending.is_empty() {
        let _ = bridge.emit(&pending);
    }
}

#[cfg(unix)]
pub use unix::capture_fd;

#[cfg(unix)]
mod unix {
    use std::os::fd::{FromRawFd, RawFd};

    use super::*;

    fn check(ret: libc::c_int) -> io::Result<libc::c_int> {
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(ret)
        }
    }

    /// Redirect `fd` into a pipe drained into `bridge`
    pub fn capture_fd(fd: RawFd, bridge: SharedStream) -> io::Result<CapturedStream> {
        let mut fds = [0 as libc::c_int; 2];
        // SAFETY: `fds` is a valid two-element buffer for pipe(2).
        check(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
        let (read_fd, write_fd) = (fds[0], fds[1]);

        // SAFETY: plain descriptor syscalls; every descriptor created here is
        // either handed to a `File` or closed on the error path.
        let original = unsafe {
            let original = match check(libc::dup(fd)) {
                Ok(original) => original,
                Err(e) => {
                    libc::close(read_fd);
                    libc::close(write_fd);
                    return Err(e);
                }
            };
            if let Err(e) = check(libc::dup2(write_fd, fd)) {
                libc::close(read_fd);
                libc::close(write_fd);
                libc::close(original);
                return Err(e);
            }
            libc::close(write_fd);
            File::from_raw_fd(original)
        };

        // SAFETY: `read_fd` is a fresh pipe descriptor owned by nobody else.
        let reader = unsafe { File::from_raw_fd(read_fd) };
        let reader = std::thread::Builder::new()
            .name(format!("capture-fd{}", fd))
            .spawn(move || pump(reader, bridge))?;

        Ok(CapturedStream { original, reader })
    }
}

//! `poll(2)` multiplexer.
//!
//! Blocks with no timeout until at least one handle is readable or a
//! signal interrupts the call (`EINTR`, surfaced as an error so the loop
//! can check for quit).

use std::io;
use std::os::fd::AsRawFd;

use crate::app::ports::{Multiplexer, NotifyHandle, ReadyList, WaitSource};

const READY_MASK: libc::c_short = libc::POLLIN | libc::POLLPRI | libc::POLLERR | libc::POLLHUP;

#[derive(Default)]
pub struct PollMultiplexer {
    fds: Vec<libc::pollfd>,
}

impl PollMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: NotifyHandle + AsRawFd> Multiplexer<H> for PollMultiplexer {
    fn wait(&mut self, sources: &[WaitSource<'_, H>], ready: &mut ReadyList) -> io::Result<()> {
        self.fds.clear();
        self.fds.extend(sources.iter().map(|s| libc::pollfd {
            fd: s.handle.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        }));

        // SAFETY: `fds` is a live, correctly sized array of pollfd.
        let rc = unsafe {
            libc::poll(self.fds.as_mut_ptr(), self.fds.len() as libc::nfds_t, -1)
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        for (src, pfd) in sources.iter().zip(&self.fds) {
            if pfd.revents & READY_MASK != 0 {
                // Capacity equals the device table's.
                let _ = ready.push(src.slot);
            }
        }
        Ok(())
    }
}

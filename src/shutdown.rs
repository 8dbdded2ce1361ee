//! Cooperative cancellation.
//!
//! Signal handlers only flip the shared flag; the event loop polls it
//! before and after each blocking wait.

use std::sync::Arc;
use std::{io, mem, ptr};
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};

/// Signals that request a clean exit.
pub const QUIT_SIGNALS: [i32; 3] = [SIGINT, SIGHUP, SIGTERM];

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Route SIGINT, SIGHUP and SIGTERM to [`cancel`](Self::cancel).
    ///
    /// A signal the process inherited as ignored stays ignored, so a
    /// reactor started under `nohup` survives a hangup.  A blocked
    /// `poll(2)` returns `EINTR` when a routed signal lands, so the loop
    /// observes the flag without waiting for a device.
    pub fn install_signal_handlers(&self) -> io::Result<()> {
        for sig in QUIT_SIGNALS {
            if is_ignored(sig)? {
                info!("signal {} ignored at start-up; leaving it ignored", sig);
                continue;
            }
            signal_hook::flag::register(sig, Arc::clone(&self.0))?;
        }
        Ok(())
    }
}

/// Whether `sig` is currently disposed to `SIG_IGN`.
fn is_ignored(sig: i32) -> io::Result<bool> {
    // SAFETY: a null new action only queries the disposition into `old`.
    let mut old: libc::sigaction = unsafe { mem::zeroed() };
    if unsafe { libc::sigaction(sig, ptr::null(), &mut old) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(old.sa_sigaction == libc::SIG_IGN)
}

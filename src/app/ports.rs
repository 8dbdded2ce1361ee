//! Port traits: the hexagonal boundary between the reactor and the OS.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ EventLoop / handler (domain)
//! ```
//!
//! Driven adapters (UIO devices, the wait set, event sinks) implement
//! these traits.  The [`EventLoop`](super::service::EventLoop) consumes
//! them via generics, so the reactor never touches a file descriptor
//! directly and runs unchanged against the mocks in `tests/`.

use std::io;

use heapless::Vec;

use crate::config::MAX_GPIO_DEVICES;
use crate::drivers::regs::RegisterWindow;
use crate::error::Result;

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Notification handle (driven adapter: interrupt line ↔ domain)
// ───────────────────────────────────────────────────────────────

/// An OS handle that becomes readable when a peripheral interrupt fires.
pub trait NotifyHandle {
    /// Ordering key.  Ready handles are serviced in increasing token order.
    fn token(&self) -> u64;

    /// Read and return the interrupt count delivered by the driver.
    fn drain(&mut self) -> io::Result<u32>;

    /// Write a 4-byte control word to the driver.
    fn write_control(&mut self, word: [u8; 4]) -> io::Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Multiplexer (driven adapter: blocking wait on many handles)
// ───────────────────────────────────────────────────────────────

/// Device slots reported ready by one wait.
pub type ReadyList = Vec<usize, MAX_GPIO_DEVICES>;

/// One member of the wait set.
pub struct WaitSource<'a, H> {
    /// Slot of the owning device in the GPIO table.
    pub slot: usize,
    pub handle: &'a H,
}

/// Blocks on a set of notification handles.
pub trait Multiplexer<H> {
    /// Block until at least one source is ready, then push the slot of
    /// every ready source into `ready`.  `ready` is empty on entry.
    ///
    /// Errors are transient from the caller's point of view.
    fn wait(&mut self, sources: &[WaitSource<'_, H>], ready: &mut ReadyList) -> io::Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Device port (driven adapter: discovery + register mapping)
// ───────────────────────────────────────────────────────────────

/// Where a hardware block was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLocation {
    /// UIO device index (`/dev/uioN`).
    pub uio: u32,
    /// Map index within that device.
    pub map: u32,
}

/// One register map reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredBlock {
    pub location: BlockLocation,
    /// Physical base address of the map.
    pub addr: u64,
    /// Map size in bytes.
    pub size: usize,
    /// Driver-reported device name.
    pub name: std::string::String,
}

/// Enumerates hardware blocks and hands out mapped windows.
///
/// Dropping the returned window unmaps it; dropping the handle closes it.
pub trait DevicePort {
    type Window: RegisterWindow;
    type Handle: NotifyHandle;

    /// List every register map currently exposed by the platform.
    fn discover(&mut self) -> Result<std::vec::Vec<DiscoveredBlock>>;

    /// Open the notification handle for `block` and map its window.
    fn open(&mut self, block: &DiscoveredBlock) -> Result<(Self::Window, Self::Handle)>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / trace)
// ───────────────────────────────────────────────────────────────

/// The reactor emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

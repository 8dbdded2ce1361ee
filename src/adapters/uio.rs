//! Linux UIO adapter.
//!
//! Implements [`DevicePort`] over the userspace-I/O class:
//!
//! ```text
//! /sys/class/uio/uioN/name
//! /sys/class/uio/uioN/maps/mapM/{addr,size}
//! /dev/uioN                      read: 4-byte irq count, write: unmask
//! ```
//!
//! Map `M` of a device is mapped by passing `M * page_size` as the mmap
//! offset on `/dev/uioN`.  Every opened block gets its own descriptor.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};

use log::{debug, warn};

use crate::app::ports::{BlockLocation, DevicePort, DiscoveredBlock, NotifyHandle};
use crate::config::UioPaths;
use crate::drivers::regs::{RegisterWindow, cell_index};
use crate::error::{DeviceError, Result};

const FALLBACK_PAGE_SIZE: usize = 4096;

// ───────────────────────────────────────────────────────────────
// UioBus
// ───────────────────────────────────────────────────────────────

/// Discovery and mapping over `/sys/class/uio` and `/dev/uioN`.
pub struct UioBus {
    paths: UioPaths,
    page_size: usize,
}

impl UioBus {
    pub fn new(paths: UioPaths) -> Self {
        Self { paths, page_size: page_size() }
    }

    fn device_node(&self, uio: u32) -> PathBuf {
        Path::new(&self.paths.dev_dir).join(format!("uio{uio}"))
    }
}

impl DevicePort for UioBus {
    type Window = MmioWindow;
    type Handle = UioHandle;

    fn discover(&mut self) -> Result<Vec<DiscoveredBlock>> {
        scan_class_dir(Path::new(&self.paths.class_dir))
    }

    fn open(&mut self, block: &DiscoveredBlock) -> Result<(MmioWindow, UioHandle)> {
        let node = self.device_node(block.location.uio);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&node)
            .map_err(|e| DeviceError::OpenFailed(e.kind()))?;

        let offset = (block.location.map as usize)
            .checked_mul(self.page_size)
            .ok_or(DeviceError::NoSuchMap {
                uio: block.location.uio,
                map: block.location.map,
            })?;
        let window = MmioWindow::map(&file, offset, block.size)
            .map_err(|e| DeviceError::MapFailed(e.kind()))?;

        debug!("{} map{} -> {} bytes", node.display(), block.location.map, block.size);
        Ok((window, UioHandle { file }))
    }
}

/// Every register map under `class_dir`, ordered by (uio, map).
///
/// Entries that are not `uioN` directories are skipped; a map whose
/// attributes cannot be parsed is skipped with a warning.
pub fn scan_class_dir(class_dir: &Path) -> Result<Vec<DiscoveredBlock>> {
    let entries = fs::read_dir(class_dir).map_err(|e| DeviceError::DiscoveryFailed(e.kind()))?;

    let mut blocks = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(uio) = file_name.to_str().and_then(|n| index_after(n, "uio")) else {
            continue;
        };
        let dir = entry.path();
        let name = fs::read_to_string(dir.join("name"))
            .map(|s| s.trim().to_owned())
            .unwrap_or_default();

        let Ok(maps) = fs::read_dir(dir.join("maps")) else {
            debug!("uio{}: no maps", uio);
            continue;
        };
        for map_entry in maps.flatten() {
            let map_name = map_entry.file_name();
            let Some(map) = map_name.to_str().and_then(|n| index_after(n, "map")) else {
                continue;
            };
            match read_map(&map_entry.path()) {
                Ok((addr, size)) => blocks.push(DiscoveredBlock {
                    location: BlockLocation { uio, map },
                    addr,
                    size,
                    name: name.clone(),
                }),
                Err(e) => warn!("uio{} map{}: {}", uio, map, e),
            }
        }
    }

    blocks.sort_by_key(|b| (b.location.uio, b.location.map));
    Ok(blocks)
}

fn read_map(dir: &Path) -> Result<(u64, usize)> {
    let addr = read_hex(&dir.join("addr"))?;
    let size = read_hex(&dir.join("size"))?;
    let size = usize::try_from(size).map_err(|_| DeviceError::BadAttribute)?;
    Ok((addr, size))
}

fn read_hex(path: &Path) -> Result<u64> {
    let text = fs::read_to_string(path).map_err(|_| DeviceError::BadAttribute)?;
    parse_hex(&text).ok_or_else(|| DeviceError::BadAttribute.into())
}

/// Parse a sysfs hex attribute such as `0x41210000\n`.
pub fn parse_hex(text: &str) -> Option<u64> {
    let t = text.trim();
    let digits = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    u64::from_str_radix(digits, 16).ok()
}

fn index_after(name: &str, prefix: &str) -> Option<u32> {
    name.strip_prefix(prefix)?.parse().ok()
}

fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let sz = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(sz).ok().filter(|&s| s > 0).unwrap_or(FALLBACK_PAGE_SIZE)
}

// ───────────────────────────────────────────────────────────────
// MmioWindow
// ───────────────────────────────────────────────────────────────

/// A shared, volatile mapping of one register map.  Unmapped on drop.
pub struct MmioWindow {
    base: NonNull<u32>,
    size: usize,
}

impl MmioWindow {
    fn map(file: &File, offset: usize, size: usize) -> io::Result<Self> {
        let offset = libc::off_t::try_from(offset).map_err(|_| io::ErrorKind::InvalidInput)?;
        // SAFETY: a fresh shared mapping of a device node; the kernel
        // picks the address and validates offset and length.
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                offset,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        NonNull::new(ptr.cast::<u32>())
            .map(|base| Self { base, size })
            .ok_or_else(|| io::Error::other("mmap returned null"))
    }
}

impl RegisterWindow for MmioWindow {
    fn size(&self) -> usize {
        self.size
    }

    fn read(&self, offset: usize) -> u32 {
        let idx = cell_index(offset, self.size);
        // SAFETY: `cell_index` bounds the access to the mapping.
        unsafe { ptr::read_volatile(self.base.as_ptr().add(idx)) }
    }

    fn write(&mut self, offset: usize, value: u32) {
        let idx = cell_index(offset, self.size);
        // SAFETY: as in `read`.
        unsafe { ptr::write_volatile(self.base.as_ptr().add(idx), value) }
    }
}

impl Drop for MmioWindow {
    fn drop(&mut self) {
        // SAFETY: `base`/`size` are exactly what mmap returned and the
        // window is the sole owner of the mapping.
        let rc = unsafe { libc::munmap(self.base.as_ptr().cast(), self.size) };
        if rc != 0 {
            warn!("munmap failed: {}", io::Error::last_os_error());
        }
    }
}

// ───────────────────────────────────────────────────────────────
// UioHandle
// ───────────────────────────────────────────────────────────────

/// An open `/dev/uioN`.  Closed on drop.
pub struct UioHandle {
    file: File,
}

impl NotifyHandle for UioHandle {
    fn token(&self) -> u64 {
        self.file.as_raw_fd() as u64
    }

    fn drain(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.file.read_exact(&mut buf)?;
        Ok(u32::from_ne_bytes(buf))
    }

    fn write_control(&mut self, word: [u8; 4]) -> io::Result<()> {
        self.file.write_all(&word)
    }
}

impl AsRawFd for UioHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

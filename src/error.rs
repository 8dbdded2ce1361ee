//! Unified error types for the UIO RGB reactor.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! start-up path's error handling uniform.  All variants are `Copy` so
//! they can be passed through the event sink without allocation.
//!
//! Nothing in the event loop is fatal: colour lookups report
//! [`ColorError`] to the caller, wait failures are logged and retried,
//! and unavailable devices are dropped from the wait set at bring-up.

use core::fmt;
use std::io;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A colour channel request could not be satisfied.
    Color(ColorError),
    /// A hardware block could not be discovered, opened, or mapped.
    Device(DeviceError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(e) => write!(f, "color: {e}"),
            Self::Device(e) => write!(f, "device: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Colour model errors
// ---------------------------------------------------------------------------

/// Configuration mismatches raised by the colour model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorError {
    /// No channel in the LED table matches this (silk, colour) pair.
    NoSuchChannel { silk: u8, color: char },
    /// The PWM bank owning the channel has no mapped register window.
    BankUnavailable(usize),
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchChannel { silk, color } => {
                write!(f, "no channel for LED{silk} colour '{color}'")
            }
            Self::BankUnavailable(bank) => write!(f, "PWM bank {bank} not mapped"),
        }
    }
}

impl From<ColorError> for Error {
    fn from(e: ColorError) -> Self {
        Self::Color(e)
    }
}

// ---------------------------------------------------------------------------
// Device errors
// ---------------------------------------------------------------------------

/// Failures while discovering or mapping UIO devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// The sysfs UIO class directory could not be scanned.
    DiscoveryFailed(io::ErrorKind),
    /// A sysfs attribute was present but could not be parsed.
    BadAttribute,
    /// `/dev/uioN` could not be opened.
    OpenFailed(io::ErrorKind),
    /// `mmap` of the register window failed.
    MapFailed(io::ErrorKind),
    /// The requested map index does not exist on that UIO device.
    NoSuchMap { uio: u32, map: u32 },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiscoveryFailed(kind) => write!(f, "UIO discovery failed ({kind})"),
            Self::BadAttribute => write!(f, "malformed sysfs attribute"),
            Self::OpenFailed(kind) => write!(f, "open failed ({kind})"),
            Self::MapFailed(kind) => write!(f, "mmap failed ({kind})"),
            Self::NoSuchMap { uio, map } => write!(f, "uio{uio} has no map{map}"),
        }
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

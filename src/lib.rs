//! uio-rgb library.
//!
//! Interrupt-driven reactor for AXI GPIO inputs exposed through Linux
//! UIO, driving an AXI PWM RGB indicator.  The core (`app`, `board`,
//! `drivers`) is platform-agnostic and exercised by the integration
//! tests through mock adapters; `adapters` holds the Linux side.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod board;
pub mod config;
pub mod drivers;
pub mod error;
pub mod shutdown;

//! Application core: reactor logic, no OS calls.
//!
//! Event loop, handler, palette rules and the state they share.  All
//! interaction with the platform happens through the **port traits**
//! in [`ports`], so the whole core runs against mock adapters.

pub mod context;
pub mod events;
pub mod handler;
pub mod ports;
pub mod rules;
pub mod service;

//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no UIO
//! devices required.

mod bring_up_tests;
mod handler_tests;

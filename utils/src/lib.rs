//! Shared infrastructure utilities for as3kit.
//!
//! - **`atomic_write`**: crash-safe persistence (temp + rename) for generated
//!   `asconfig.json` files and the user config.

pub mod atomic_write;

pub use atomic_write::{AtomicWriteOptions, Existing, atomic_write_with_options};

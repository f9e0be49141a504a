//! clonelib-core: Core traits, types, and error definitions for clonelib.
//!
//! This crate defines the radio-agnostic pieces every clone backend shares.
//! Radio drivers describe their model with a [`RadioDescriptor`] and get a
//! [`MemoryMap`] back, without depending on any particular link.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`RadioDescriptor`] -- clone-mode parameters for one radio model
//! - [`MemoryMap`] -- the radio's memory image
//! - [`CloneEvent`] -- asynchronous progress notifications
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod events;
pub mod memmap;
pub mod radio;
pub mod transport;

// Re-export key types at crate root for ergonomic `use clonelib_core::*`.
pub use error::{Error, Result};
pub use events::{CloneEvent, CloneState, Direction};
pub use memmap::MemoryMap;
pub use radio::{CloneRange, RadioDescriptor};
pub use transport::Transport;

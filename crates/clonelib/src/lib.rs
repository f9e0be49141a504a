//! # clonelib -- Icom Clone-Mode Memory Transfer
//!
//! `clonelib` is an asynchronous Rust library for reading and writing the
//! memory image of Icom handhelds and mobiles over the clone-mode protocol
//! on their programming cable. It is the transport layer for radio
//! programming tools: it moves the raw image; decoding channels, banks and
//! settings out of that image is left to the caller.
//!
//! ## Quick Start
//!
//! Read the image out of an IC-2820H:
//!
//! ```no_run
//! use clonelib::icom::{CloneBuilder, models::ic_2820h};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let radio = ic_2820h();
//!     let mut session = CloneBuilder::new(&radio)
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     let image = session.clone_from_radio().await?;
//!     println!("read {} bytes", image.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                    | Purpose                                         |
//! |--------------------------|-------------------------------------------------|
//! | `clonelib-core`          | [`Transport`] trait, descriptors, memory map, events, errors |
//! | `clonelib-transport`     | Serial transport over `tokio-serial`            |
//! | `clonelib-icom`          | Clone-mode framing, payload codecs, sessions    |
//! | `clonelib-test-harness`  | Scripted mock transport for tests               |
//! | **`clonelib`**           | This facade crate -- re-exports everything      |
//!
//! ## Event Subscription
//!
//! Sessions publish [`CloneEvent`]s through a broadcast channel: a
//! `StateChanged` on every stage transition and a `Progress` after every
//! data block.
//!
//! ```no_run
//! use clonelib::CloneEvent;
//! # async fn example(session: &clonelib::icom::CloneSession<'_>) {
//! let mut events = session.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let CloneEvent::Progress { direction, current, total } = event {
//!             println!("{direction}: {current}/{total}");
//!         }
//!     }
//! });
//! # }
//! ```
//!
//! ## Supported Radios
//!
//! Any Icom radio using the clone-mode protocol can be described with a
//! [`RadioDescriptor`]. Ready-made descriptors ship for the IC-2100H,
//! IC-2200H, IC-V82/U82, IC-2820H, IC-2730A, ID-31A and ID-4100A.

pub use clonelib_core::*;

/// Icom clone-mode protocol engine.
///
/// Provides [`CloneSession`](icom::CloneSession) and
/// [`CloneBuilder`](icom::CloneBuilder) plus the frame and payload codecs
/// they are built on.
pub mod icom {
    pub use clonelib_icom::*;
}

/// Serial transport for the programming cable.
pub mod transport {
    pub use clonelib_transport::*;
}

/// Returns every radio model with a ready-made descriptor.
///
/// # Example
///
/// ```
/// for radio in clonelib::supported_radios() {
///     println!("{} ({} bytes)", radio.name, radio.memsize);
/// }
/// ```
pub fn supported_radios() -> Vec<RadioDescriptor> {
    icom::models::all_models()
}

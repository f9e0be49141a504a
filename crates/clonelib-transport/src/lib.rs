//! Transport implementations for clonelib.
//!
//! This crate provides the serial implementation of the
//! [`Transport`](clonelib_core::Transport) trait used to talk to Icom radios
//! in clone mode over a programming cable (OPC-478, OPC-1799, or a USB
//! adapter presenting a virtual COM port).
//!
//! # Example
//!
//! ```no_run
//! use clonelib_transport::SerialTransport;
//! use clonelib_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> clonelib_core::Result<()> {
//! // Clone mode always starts at 9600 baud
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 9600).await?;
//!
//! // Send an identify probe
//! transport
//!     .send(&[0xFE, 0xFE, 0xEE, 0xEF, 0xE0, 0x00, 0x00, 0x00, 0x00, 0xFD])
//!     .await?;
//!
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_millis(100)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};

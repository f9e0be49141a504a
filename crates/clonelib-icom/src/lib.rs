//! Icom clone-mode protocol engine for clonelib.
//!
//! Icom handhelds and mobiles exchange their whole memory image with a
//! computer over a dedicated "clone mode" on the programming cable. This
//! crate implements that link:
//!
//! - **Frame codec** ([`frame`]) -- encode and decode `FE FE src dst cmd
//!   payload FD` frames.
//! - **Payload codecs** ([`payload`]) -- BCD-ASCII and escaped-raw payload
//!   encodings plus the data-block checksum.
//! - **Data blocks** ([`block`]) -- the address/length/data/checksum layout
//!   inside data frames.
//! - **Frame stream** ([`stream`]) -- buffered frame reader with echoing
//!   cable detection.
//! - **Model data** ([`ident`]) -- decoding of the identify reply.
//! - **CloneSession** ([`session`]) -- the clone state machine in both
//!   directions, with progress events and cancellation.
//! - **CloneBuilder** ([`builder`]) -- fluent builder for sessions.
//! - **Models** ([`models`]) -- descriptors for a handful of real radios.
//!
//! # Example
//!
//! ```
//! use clonelib_icom::frame::{CMD_CLONE_DAT, IcfFrame, parse_next, serialize};
//! use clonelib_icom::payload::PayloadCodec;
//!
//! let payload = PayloadCodec::Encoded.encode(&[0x00, 0x20, 0x10], true);
//! assert_eq!(payload, b"002010D0");
//!
//! let wire = serialize(CMD_CLONE_DAT, &payload);
//! let (frame, rest) = parse_next(&wire).unwrap();
//! assert_eq!(frame, Some(IcfFrame::to_radio(CMD_CLONE_DAT, payload)));
//! assert!(rest.is_empty());
//! ```

pub mod block;
pub mod builder;
pub mod frame;
pub mod ident;
pub mod models;
pub mod payload;
pub mod session;
pub mod stream;

pub use builder::{CloneBuilder, CloneConfig};
pub use frame::IcfFrame;
pub use ident::ModelInfo;
pub use payload::PayloadCodec;
pub use session::CloneSession;

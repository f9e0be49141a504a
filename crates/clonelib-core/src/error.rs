//! Error types for clonelib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Link failures, wire-format errors, and
//! errors reported by the radio itself are all captured here.
//!
//! Every variant is fatal for the clone attempt in progress: a clone is
//! re-run from the start, never resumed.

/// The error type for all clonelib operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The receive buffer did not start with the `FE FE` preamble.
    ///
    /// The stream is out of step with the radio and cannot be trusted.
    #[error("out of sync with radio: {0}")]
    Desync(String),

    /// The radio answered the identify probe with a different model id.
    ///
    /// Usually the wrong driver was selected or the cable is connected to a
    /// different radio.
    #[error("identify: radio model {found:02X?} does not match expected {expected:02X?}")]
    ModelMismatch {
        /// Model id from the radio descriptor.
        expected: [u8; 4],
        /// Leading bytes of the identify reply (up to four).
        found: Vec<u8>,
    },

    /// A data block's trailing checksum did not validate.
    #[error(
        "data transfer: checksum error in block at 0x{addr:04X} \
         (calculated 0x{expected:02X}, radio sent 0x{found:02X})"
    )]
    Checksum {
        /// Start address of the bad block.
        addr: usize,
        /// Checksum computed over the received header and data.
        expected: u8,
        /// Checksum byte the radio sent.
        found: u8,
    },

    /// A raw-encoded payload ended with a dangling `0xFF` escape byte.
    #[error("data transfer: unexpected escape character at end of payload")]
    TruncatedEscape,

    /// A BCD-ASCII payload held a non-hex pair or an odd trailing byte.
    #[error("data transfer: malformed hex payload at byte {offset}")]
    MalformedPayload {
        /// Offset into the encoded payload of the first bad pair.
        offset: usize,
    },

    /// A read or write would fall outside the memory map.
    #[error("memory access of {len} bytes at 0x{addr:05X} exceeds image size 0x{size:05X}")]
    OutOfBounds {
        /// Start address of the access.
        addr: usize,
        /// Length of the access.
        len: usize,
        /// Size of the memory map.
        size: usize,
    },

    /// The radio's clone result frame reported a failure.
    #[error("clone result: radio reported failure: {0}")]
    RadioReportedFailure(String),

    /// The radio's memory map revision differs from the image being written.
    #[error("identify: radio revision {radio} does not match image revision {image}")]
    RevisionMismatch {
        /// Revision reported in the identify reply.
        radio: u8,
        /// Revision the image was built for.
        image: u8,
    },

    /// A transport-level error (serial port failure, stalled stream).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (unexpected reply, malformed data block).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for data from the radio.
    #[error("timeout waiting for response")]
    Timeout,

    /// The requested operation is not supported by this transport.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An invalid parameter was passed in (bad descriptor, wrong image size).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the radio has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the radio was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// The clone was cancelled by the caller between blocks.
    #[error("clone cancelled")]
    Cancelled,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for errors raised by the physical link rather than by
    /// the protocol: timeouts, I/O failures, and lost or missing connections.
    pub fn is_link_failure(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::Timeout
                | Error::NotConnected
                | Error::ConnectionLost
                | Error::Io(_)
        )
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_desync() {
        let e = Error::Desync("[01, 02, 03, 04, 05]".into());
        assert_eq!(e.to_string(), "out of sync with radio: [01, 02, 03, 04, 05]");
    }

    #[test]
    fn error_display_model_mismatch() {
        let e = Error::ModelMismatch {
            expected: [0x29, 0x70, 0x00, 0x01],
            found: vec![0x33, 0x22, 0x00, 0x01],
        };
        assert_eq!(
            e.to_string(),
            "identify: radio model [33, 22, 00, 01] does not match expected [29, 70, 00, 01]"
        );
    }

    #[test]
    fn error_display_checksum() {
        let e = Error::Checksum {
            addr: 0x0120,
            expected: 0x3C,
            found: 0x3D,
        };
        assert_eq!(
            e.to_string(),
            "data transfer: checksum error in block at 0x0120 \
             (calculated 0x3C, radio sent 0x3D)"
        );
    }

    #[test]
    fn error_display_out_of_bounds() {
        let e = Error::OutOfBounds {
            addr: 0x3F0,
            len: 32,
            size: 0x400,
        };
        assert_eq!(
            e.to_string(),
            "memory access of 32 bytes at 0x003F0 exceeds image size 0x00400"
        );
    }

    #[test]
    fn error_display_radio_failure() {
        let e = Error::RadioReportedFailure("result code 0x01".into());
        assert_eq!(
            e.to_string(),
            "clone result: radio reported failure: result code 0x01"
        );
    }

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("identify: timeout waiting for response".into());
        assert_eq!(
            e.to_string(),
            "transport error: identify: timeout waiting for response"
        );
    }

    #[test]
    fn error_display_truncated_escape() {
        assert_eq!(
            Error::TruncatedEscape.to_string(),
            "data transfer: unexpected escape character at end of payload"
        );
    }

    #[test]
    fn error_display_malformed_payload() {
        let e = Error::MalformedPayload { offset: 6 };
        assert_eq!(e.to_string(), "data transfer: malformed hex payload at byte 6");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn link_failure_classification() {
        assert!(Error::Timeout.is_link_failure());
        assert!(Error::ConnectionLost.is_link_failure());
        assert!(Error::NotConnected.is_link_failure());
        assert!(Error::Transport("x".into()).is_link_failure());
        assert!(!Error::TruncatedEscape.is_link_failure());
        assert!(!Error::Desync("x".into()).is_link_failure());
        assert!(!Error::Cancelled.is_link_failure());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<u32> = Ok(42);
        assert!(matches!(ok, Ok(42)));

        let err: Result<u32> = Err(Error::Timeout);
        assert!(err.is_err());
    }
}

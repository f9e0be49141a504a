//! Asynchronous clone event types.
//!
//! Events are emitted by a clone session through a `tokio::sync::broadcast`
//! channel as the clone moves through its stages and as data blocks are
//! transferred. Front ends subscribe to these for progress bars and status
//! lines without polling the session.

use std::fmt;

/// Which way the memory image is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Radio to computer.
    FromRadio,
    /// Computer to radio.
    ToRadio,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::FromRadio => write!(f, "Cloning from radio"),
            Direction::ToRadio => write!(f, "Cloning to radio"),
        }
    }
}

/// Stage of a clone session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloneState {
    /// Built, not yet started.
    Idle,
    /// Probing the radio for its model id.
    Identifying,
    /// Switching the link to the hi-speed baud rate.
    SwitchingBaud,
    /// Data blocks are flowing.
    Transferring,
    /// All data is through: the end frame arrived (read) or the radio's
    /// clone result is awaited (write).
    Finishing,
    /// The clone completed successfully.
    Done,
    /// The clone failed; the session must be rebuilt to retry.
    Failed,
}

impl CloneState {
    /// Returns `true` once the session can make no further progress.
    pub fn is_terminal(self) -> bool {
        matches!(self, CloneState::Done | CloneState::Failed)
    }
}

/// An event emitted by a clone session.
///
/// Subscribe via `CloneSession::subscribe()`. Events are delivered on a
/// best-effort basis through a bounded broadcast channel; slow consumers may
/// miss progress events on fast links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneEvent {
    /// The session moved to a new stage.
    StateChanged(CloneState),

    /// A data block was transferred.
    Progress {
        /// Which way the image is travelling.
        direction: Direction,
        /// Bytes transferred so far (the end address of the last block).
        current: usize,
        /// Size of the image.
        total: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(CloneState::Done.is_terminal());
        assert!(CloneState::Failed.is_terminal());
        assert!(!CloneState::Idle.is_terminal());
        assert!(!CloneState::Transferring.is_terminal());
    }

    #[test]
    fn direction_display() {
        assert_eq!(Direction::FromRadio.to_string(), "Cloning from radio");
        assert_eq!(Direction::ToRadio.to_string(), "Cloning to radio");
    }

    #[tokio::test]
    async fn events_travel_over_broadcast() {
        let (tx, mut rx) = tokio::sync::broadcast::channel(4);
        tx.send(CloneEvent::StateChanged(CloneState::Identifying))
            .unwrap();
        tx.send(CloneEvent::Progress {
            direction: Direction::FromRadio,
            current: 32,
            total: 1024,
        })
        .unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            CloneEvent::StateChanged(CloneState::Identifying)
        );
        assert!(matches!(
            rx.recv().await.unwrap(),
            CloneEvent::Progress { current: 32, total: 1024, .. }
        ));
    }
}

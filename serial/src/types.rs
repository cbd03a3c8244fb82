//! Types shared by every transport backend.

use std::fmt;
use std::time::Duration;

/// Identifies one open connection to the backend that produced it.
///
/// A handle is an index into the backend's session table, tagged with the
/// generation the slot had when the session was allocated. Once the session
/// is released the slot's generation moves on, so a stale handle is rejected
/// by every later operation instead of silently aliasing the slot's next
/// occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.index, self.generation)
    }
}

/// How long a read is allowed to block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Return immediately when no byte is buffered.
    Poll,
    /// Block until a byte, end of stream, or a transport failure.
    Forever,
    /// Block for at most this long.
    After(Duration),
}

impl Timeout {
    /// Map the conventional integer-seconds argument: zero polls, negative
    /// waits forever, positive bounds the wait.
    pub fn from_secs(secs: i64) -> Self {
        match secs {
            0 => Timeout::Poll,
            s if s < 0 => Timeout::Forever,
            s => Timeout::After(Duration::from_secs(s as u64)),
        }
    }
}

/// What a read produced.
///
/// Timeouts and end-of-stream are expected results the caller reacts to,
/// not errors: a timeout invites a retry, EOF says to stop reading this
/// handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The oldest unread byte.
    Byte(u8),
    /// No byte arrived within the requested deadline.
    TimedOut,
    /// The connection is gone and every buffered byte has been consumed.
    Eof,
}

/// Opaque line state. Backends without a physical line report an empty
/// state and accept any state without effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TtyState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    OneAndHalf,
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_follows_the_integer_seconds_convention() {
        assert_eq!(Timeout::from_secs(0), Timeout::Poll);
        assert_eq!(Timeout::from_secs(-1), Timeout::Forever);
        assert_eq!(Timeout::from_secs(5), Timeout::After(Duration::from_secs(5)));
    }

    #[test]
    fn handles_with_different_generations_are_distinct() {
        let first = Handle::new(3, 0);
        let second = Handle::new(3, 1);
        assert_ne!(first, second);
        assert_eq!(first.index(), second.index());
        assert_eq!(format!("{first}"), "3.0");
    }
}

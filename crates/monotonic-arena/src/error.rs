//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during storage operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The system allocator refused to provide a new heap block.
    OutOfMemory {
        /// Size of the heap block that was requested, in bytes.
        requested: usize,
    },
    /// The requested alignment is zero or not a power of two.
    InvalidAlignment {
        /// The rejected alignment.
        align: usize,
    },
    /// The size and alignment cannot form a valid layout (the rounded size
    /// would overflow `isize`).
    SizeOverflow {
        /// Requested size in bytes.
        size: usize,
        /// Requested alignment in bytes.
        align: usize,
    },
    /// Opening a new heap block would exceed the configured heap limit.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Configured heap limit in bytes.
        capacity: usize,
    },
    /// A [`StorageConfig`](crate::StorageConfig) failed validation.
    InvalidConfig {
        /// Which constraint was violated.
        reason: &'static str,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(
                    f,
                    "system allocator failed to provide a {requested} byte heap block"
                )
            }
            Self::InvalidAlignment { align } => {
                write!(f, "invalid alignment {align}: must be a non-zero power of two")
            }
            Self::SizeOverflow { size, align } => {
                write!(
                    f,
                    "allocation of {size} bytes aligned to {align} overflows the address space"
                )
            }
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "heap limit exceeded: requested {requested} bytes, limit {capacity} bytes"
                )
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid storage config: {reason}")
            }
        }
    }
}

impl Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_the_offending_values() {
        let err = ArenaError::CapacityExceeded {
            requested: 4096,
            capacity: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("4096"));
        assert!(msg.contains("1024"));

        let err = ArenaError::InvalidAlignment { align: 3 };
        assert!(err.to_string().contains('3'));
    }
}

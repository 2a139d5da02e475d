//! Error types for the event log
//!
//! Errors only exist on the configuration and retrieval paths. Recording a
//! message has no failure path at all. At the query and device boundaries
//! every error collapses into the single [`KlogError::SYSCALL_FAILURE`] value.

use core::fmt;

/// Main event log error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlogError {
    /// A caller-supplied argument was out of range
    InvalidArgument {
        name: &'static str,
        value: &'static str,
    },
    /// Destination address does not lie inside the caller's region
    InvalidAddress {
        addr: usize,
    },
    /// Destination region is smaller than the request implies
    BufferTooSmall {
        required: usize,
        provided: usize,
    },
    /// Staging storage for a snapshot could not be allocated
    OutOfMemory {
        requested: usize,
    },
    /// Core id outside the ring arena
    InvalidCoreId {
        core: usize,
    },
    OperationNotSupported {
        operation: &'static str,
    },
}

/// Result type alias for event log operations
pub type KlogResult<T> = Result<T, KlogError>;

impl KlogError {
    /// Uniform failure value returned by the syscall-style boundaries.
    pub const SYSCALL_FAILURE: isize = -1;
}

impl fmt::Display for KlogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { name, value } => {
                write!(f, "Invalid argument '{}': {}", name, value)
            }
            Self::InvalidAddress { addr } => write!(f, "Invalid address: 0x{:x}", addr),
            Self::BufferTooSmall { required, provided } => {
                write!(
                    f,
                    "Buffer too small: required {} bytes, {} provided",
                    required, provided
                )
            }
            Self::OutOfMemory { requested } => {
                write!(f, "Out of memory: requested {} bytes", requested)
            }
            Self::InvalidCoreId { core } => write!(f, "Invalid core id: {}", core),
            Self::OperationNotSupported { operation } => {
                write!(f, "Operation not supported: {}", operation)
            }
        }
    }
}

/// Collapse a boundary result into the `count | -1` convention.
pub fn into_syscall_return(result: KlogResult<usize>) -> isize {
    match result {
        Ok(n) => n as isize,
        Err(_) => KlogError::SYSCALL_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_display_messages() {
        let err = KlogError::InvalidAddress { addr: 0x1000 };
        assert_eq!(err.to_string(), "Invalid address: 0x1000");

        let err = KlogError::OperationNotSupported {
            operation: "write to klog device",
        };
        assert_eq!(
            err.to_string(),
            "Operation not supported: write to klog device"
        );
    }

    #[test]
    fn test_syscall_collapse() {
        assert_eq!(into_syscall_return(Ok(12)), 12);
        assert_eq!(into_syscall_return(Ok(0)), 0);
        assert_eq!(
            into_syscall_return(Err(KlogError::OutOfMemory { requested: 4096 })),
            -1
        );
        assert_eq!(
            into_syscall_return(Err(KlogError::InvalidCoreId { core: 9 })),
            KlogError::SYSCALL_FAILURE
        );
    }
}

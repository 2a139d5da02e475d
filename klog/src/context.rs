//! Caller identification
//!
//! The engine needs to know which core a record comes from and, if any,
//! which subject it is produced for. [`ExecutionContext`] is the seam the
//! host environment plugs into: a scheduler knows its current core, a test
//! knows which core it is pretending to be.

/// Source of the calling core's identity.
pub trait ExecutionContext {
    /// Index of the core the caller is running on, or `None` if the caller
    /// is not bound to any core.
    fn current_core(&self) -> Option<usize>;

    /// Subject (task, process) the caller is acting for. 0 means none.
    fn current_subject(&self) -> u32 {
        0
    }
}

impl<C: ExecutionContext + ?Sized> ExecutionContext for &C {
    fn current_core(&self) -> Option<usize> {
        (**self).current_core()
    }

    fn current_subject(&self) -> u32 {
        (**self).current_subject()
    }
}

/// A context that always reports the same core and subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCore {
    pub core: usize,
    pub subject: u32,
}

impl FixedCore {
    /// Core `core` with no active subject.
    pub const fn new(core: usize) -> Self {
        Self { core, subject: 0 }
    }

    pub const fn with_subject(mut self, subject: u32) -> Self {
        self.subject = subject;
        self
    }
}

impl ExecutionContext for FixedCore {
    fn current_core(&self) -> Option<usize> {
        Some(self.core)
    }

    fn current_subject(&self) -> u32 {
        self.subject
    }
}

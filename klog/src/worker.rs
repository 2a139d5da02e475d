//! Thread-bound worker contexts
//!
//! On a hosted runtime each OS thread that logs is bound to exactly one core
//! index for as long as it runs. The binding lives in thread-local storage,
//! so it cannot follow the logical thread anywhere else: identification on
//! a thread always yields that thread's own ring.

use std::cell::Cell;

use crate::context::ExecutionContext;

#[derive(Clone, Copy)]
struct Binding {
    core: usize,
    subject: u32,
}

thread_local! {
    static BINDING: Cell<Option<Binding>> = const { Cell::new(None) };
}

/// Bind the calling thread to `core`. Rebinding replaces the old core and
/// clears the active subject.
pub fn bind_current_thread(core: usize) {
    BINDING.with(|b| b.set(Some(Binding { core, subject: 0 })));
}

/// Remove the calling thread's binding. Records from it are then discarded.
pub fn unbind_current_thread() {
    BINDING.with(|b| b.set(None));
}

/// Set the subject the calling thread acts for. No-op on unbound threads.
pub fn set_subject(subject: u32) {
    BINDING.with(|b| {
        if let Some(mut binding) = b.get() {
            binding.subject = subject;
            b.set(Some(binding));
        }
    });
}

pub fn clear_subject() {
    set_subject(0);
}

/// Core the calling thread is bound to.
pub fn current_core() -> Option<usize> {
    BINDING.with(|b| b.get().map(|binding| binding.core))
}

/// [`ExecutionContext`] reading the calling thread's binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadWorker;

impl ExecutionContext for ThreadWorker {
    fn current_core(&self) -> Option<usize> {
        current_core()
    }

    fn current_subject(&self) -> u32 {
        BINDING.with(|b| b.get().map_or(0, |binding| binding.subject))
    }
}

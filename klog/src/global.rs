//! Process-wide log instance
//!
//! Call sites scattered across unrelated subsystems log through one shared
//! engine instead of threading a reference everywhere. The engine is built
//! by the first [`klog_init`] and lives for the rest of the process; until
//! then every logging call is a silent no-op.
//!
//! ```
//! use veridian_klog::{global, klog_info, FixedCore, KlogConfig};
//!
//! let cpu0 = FixedCore::new(0);
//! global::klog_init(KlogConfig::new(1), &cpu0).unwrap();
//! klog_info!(&cpu0, "mounted %s at %x", "rootfs", veridian_klog::Arg::Hex(0x1000));
//! ```

use alloc::vec::Vec;

use spin::Once;

use crate::{
    config::KlogConfig,
    context::ExecutionContext,
    engine::KlogEngine,
    error::KlogResult,
    format::Arg,
    record::{KlogEntry, Severity},
};

static KLOG: Once<KlogEngine> = Once::new();

/// Build the global engine. Later calls return the existing engine and
/// ignore `config`.
///
/// The call that actually builds the engine records an initialization
/// message on the caller's core.
pub fn klog_init<C: ExecutionContext + ?Sized>(
    config: KlogConfig,
    ctx: &C,
) -> KlogResult<&'static KlogEngine> {
    if let Some(engine) = KLOG.get() {
        return Ok(engine);
    }

    let candidate = KlogEngine::new(config)?;
    let mut built = false;
    let engine = KLOG.call_once(|| {
        built = true;
        candidate
    });
    if built {
        engine.log(ctx, "klog: logging subsystem initialized", &[]);
    }
    Ok(engine)
}

/// The global engine, if initialized.
pub fn engine() -> Option<&'static KlogEngine> {
    KLOG.get()
}

/// Record through the global engine. Dropped silently before init.
pub fn klog<C: ExecutionContext + ?Sized>(
    ctx: &C,
    severity: Severity,
    template: &str,
    args: &[Arg<'_>],
) {
    if let Some(engine) = engine() {
        engine.record(ctx, severity, template, args);
    }
}

/// Snapshot of the global engine; empty before init.
pub fn klog_snapshot(max_entries: usize) -> Vec<KlogEntry> {
    engine().map_or_else(Vec::new, |engine| engine.collect(max_entries))
}

pub fn klog_clear() {
    if let Some(engine) = engine() {
        engine.clear();
    }
}

/// Total unread overwrites, `None` before init.
pub fn klog_dropped() -> Option<u64> {
    engine().map(KlogEngine::dropped)
}

#[macro_export]
macro_rules! klog_debug {
    ($ctx:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::global::klog(
            $ctx,
            $crate::Severity::Debug,
            $template,
            &[$($crate::Arg::from($arg)),*],
        )
    };
}

#[macro_export]
macro_rules! klog_info {
    ($ctx:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::global::klog(
            $ctx,
            $crate::Severity::Info,
            $template,
            &[$($crate::Arg::from($arg)),*],
        )
    };
}

#[macro_export]
macro_rules! klog_warn {
    ($ctx:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::global::klog(
            $ctx,
            $crate::Severity::Warn,
            $template,
            &[$($crate::Arg::from($arg)),*],
        )
    };
}

#[macro_export]
macro_rules! klog_error {
    ($ctx:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::global::klog(
            $ctx,
            $crate::Severity::Error,
            $template,
            &[$($crate::Arg::from($arg)),*],
        )
    };
}

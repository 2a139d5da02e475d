//! Free-running cycle counter
//!
//! Timestamps are raw per-core counter values split into two 32-bit halves.
//! They are not synchronized across cores and are never used for ordering;
//! the sequence number is the only merge key.

/// Sample the counter as `(high, low)` halves.
#[inline]
pub fn now() -> (u32, u32) {
    split(read_timestamp())
}

/// Split a 64-bit counter value into `(high, low)` halves.
#[inline]
pub const fn split(ts: u64) -> (u32, u32) {
    ((ts >> 32) as u32, ts as u32)
}

/// Read the architecture's cycle counter.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn read_timestamp() -> u64 {
    // SAFETY: _rdtsc reads the x86_64 Time Stamp Counter. It is available at
    // every privilege level unless CR4.TSD is set, and has no side effects.
    unsafe { core::arch::x86_64::_rdtsc() }
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
pub fn read_timestamp() -> u64 {
    let val: u64;
    // SAFETY: cntvct_el0 is the AArch64 virtual counter. Reading it produces
    // no side effects beyond returning a monotonically increasing value.
    unsafe {
        core::arch::asm!("mrs {}, cntvct_el0", out(reg) val);
    }
    val
}

#[cfg(target_arch = "riscv64")]
#[inline(always)]
pub fn read_timestamp() -> u64 {
    let val: u64;
    // SAFETY: rdtime reads the RISC-V time CSR, which is readable from user
    // mode and has no side effects.
    unsafe {
        core::arch::asm!("rdtime {}", out(reg) val);
    }
    val
}

#[cfg(all(
    feature = "std",
    not(any(
        target_arch = "x86_64",
        target_arch = "aarch64",
        target_arch = "riscv64"
    ))
))]
pub fn read_timestamp() -> u64 {
    use std::{sync::OnceLock, time::Instant};

    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

#[cfg(all(
    not(feature = "std"),
    not(any(
        target_arch = "x86_64",
        target_arch = "aarch64",
        target_arch = "riscv64"
    ))
))]
#[inline(always)]
pub fn read_timestamp() -> u64 {
    0
}

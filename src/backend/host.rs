//! Host Backend
//!
//! A software implementation of the backend traits on plain heap memory.
//! It backs the test suite and any CPU-side simulation of the frame loop:
//! the "device" is whatever code advances [`HostFence`] by calling
//! [`GpuFence::signal`].
//!
//! Simulated GPU virtual addresses are handed out from a global bump
//! counter so distinct allocations never alias.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::backend::{CommandRecorder, GpuAddress, GpuFence, UploadAllocator, UploadMemory};
use crate::errors::{InflightError, Result};

// Virtual address space for host allocations. Bases stay 256-aligned so
// address arithmetic matches what a constant-binding-aligned region expects.
static NEXT_VIRTUAL_BASE: AtomicU64 = AtomicU64::new(0x1000_0000);

fn assign_virtual_base(size: u64) -> GpuAddress {
    let aligned = size.next_multiple_of(256).max(256);
    GpuAddress(NEXT_VIRTUAL_BASE.fetch_add(aligned, Ordering::Relaxed))
}

/// Heap-backed upload memory with a simulated device address.
#[derive(Debug)]
pub struct HostMemory {
    bytes: Box<[u8]>,
    base: GpuAddress,
}

impl UploadMemory for HostMemory {
    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn write_bytes(&mut self, offset: u64, bytes: &[u8]) {
        let offset = offset as usize;
        self.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn read_bytes(&self, offset: u64, out: &mut [u8]) {
        let offset = offset as usize;
        out.copy_from_slice(&self.bytes[offset..offset + out.len()]);
    }

    fn gpu_address(&self) -> GpuAddress {
        self.base
    }
}

/// Command recorder stub that counts resets.
///
/// Tests use the reset count to observe that a slot's recorder is only
/// recycled after its fence watermark cleared.
#[derive(Debug, Default)]
pub struct HostCommandRecorder {
    label: String,
    resets: u64,
}

impl HostCommandRecorder {
    /// Number of times this recorder has been reset.
    #[must_use]
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Debug label given at creation.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl CommandRecorder for HostCommandRecorder {
    fn reset(&mut self) {
        self.resets += 1;
    }
}

/// Software upload allocator.
///
/// Unbounded by default; [`with_budget`](Self::with_budget) caps the total
/// bytes it will hand out so allocation-failure paths are reachable.
#[derive(Debug, Default)]
pub struct HostAllocator {
    remaining: Option<Mutex<u64>>,
}

impl HostAllocator {
    /// Creates an allocator with no budget.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator that refuses requests once `bytes` are spent.
    #[must_use]
    pub fn with_budget(bytes: u64) -> Self {
        Self {
            remaining: Some(Mutex::new(bytes)),
        }
    }
}

impl UploadAllocator for HostAllocator {
    type Memory = HostMemory;
    type Commands = HostCommandRecorder;

    fn allocate_upload(&self, size: u64, label: &str) -> Result<HostMemory> {
        if let Some(remaining) = &self.remaining {
            let mut remaining = remaining.lock();
            if size > *remaining {
                return Err(InflightError::AllocationFailed {
                    label: label.to_string(),
                    size,
                    reason: format!("host budget exhausted ({} bytes left)", *remaining),
                });
            }
            *remaining -= size;
        }
        Ok(HostMemory {
            bytes: vec![0u8; size as usize].into_boxed_slice(),
            base: assign_virtual_base(size),
        })
    }

    fn create_command_recorder(&self, label: &str) -> Result<HostCommandRecorder> {
        Ok(HostCommandRecorder {
            label: label.to_string(),
            resets: 0,
        })
    }
}

/// Software fence: a monotonic counter plus a condvar for blocking waits.
///
/// `signal` only ever advances the counter. Any thread may signal; in the
/// frame loop that role belongs to whatever stands in for the device.
#[derive(Debug, Default)]
pub struct HostFence {
    value: Mutex<u64>,
    cond: Condvar,
}

impl HostFence {
    /// Creates a fence with completed value 0 (nothing submitted yet).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GpuFence for HostFence {
    fn signal(&self, value: u64) {
        let mut current = self.value.lock();
        if value > *current {
            *current = value;
            self.cond.notify_all();
        }
    }

    fn completed_value(&self) -> u64 {
        *self.value.lock()
    }

    fn wait_until(&self, value: u64, timeout: Option<Duration>) -> Result<()> {
        let mut current = self.value.lock();
        match timeout {
            None => {
                while *current < value {
                    self.cond.wait(&mut current);
                }
                Ok(())
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while *current < value {
                    if self.cond.wait_until(&mut current, deadline).timed_out() {
                        return Err(InflightError::FenceTimeout {
                            target: value,
                            completed: *current,
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

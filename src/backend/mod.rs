//! Backend Boundary
//!
//! The crate never talks to a graphics API directly. Everything it needs
//! from one is expressed by the traits in this module:
//!
//! - [`UploadMemory`]: a persistently mapped, CPU-writable, device-readable
//!   block of memory.
//! - [`UploadAllocator`]: a device-like object that hands out upload memory
//!   and command recorders.
//! - [`GpuFence`]: a monotonic counter the submission queue advances and the
//!   CPU waits on.
//! - [`CommandRecorder`]: an opaque command-recording context. The ring only
//!   ever resets it.
//!
//! The built-in [`host`] backend implements all of these on plain heap
//! memory, which is what the test suite runs against.

use std::time::Duration;

use crate::errors::Result;

pub mod host;

/// An address the rendering backend can bind as a shader input.
///
/// For a hardware backend this is a GPU virtual address; the host backend
/// simulates one. It is opaque to this crate beyond offset arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GpuAddress(pub u64);

impl GpuAddress {
    /// Returns this address shifted forward by `bytes`.
    #[must_use]
    pub fn offset(self, bytes: u64) -> Self {
        Self(self.0 + bytes)
    }
}

/// CPU-writable, device-readable memory.
///
/// The memory is mapped for CPU writes for its entire lifetime; there is no
/// per-write map/unmap. It must never be written while the device may still
/// be reading it; that ordering is enforced by the frame-resource ring, not
/// by the memory itself.
pub trait UploadMemory {
    /// Size of the block in bytes.
    fn len(&self) -> u64;

    /// Whether the block is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies `bytes` into the block at `offset`.
    ///
    /// The caller guarantees `offset + bytes.len() <= len()`; the
    /// [`UploadRegion`](crate::upload::UploadRegion) wrapper checks this
    /// before calling.
    fn write_bytes(&mut self, offset: u64, bytes: &[u8]);

    /// Copies `out.len()` bytes out of the block at `offset`.
    ///
    /// Same bounds contract as [`write_bytes`](Self::write_bytes). Used for
    /// readback and verification.
    fn read_bytes(&self, offset: u64, out: &mut [u8]);

    /// Base device address of the block.
    fn gpu_address(&self) -> GpuAddress;
}

/// An opaque command-recording context.
///
/// One recorder belongs to each frame slot. The ring resets it once the
/// fence proves the device has finished consuming the commands it stored;
/// it never inspects the contents.
pub trait CommandRecorder {
    /// Discards recorded commands so the context can record a new frame.
    fn reset(&mut self);
}

/// A device-like object that allocates upload memory and command recorders.
pub trait UploadAllocator {
    /// The upload memory type this allocator hands out.
    type Memory: UploadMemory;
    /// The command-recording context type this allocator hands out.
    type Commands: CommandRecorder;

    /// Allocates `size` bytes of CPU-writable, device-readable memory.
    ///
    /// Fails with [`InflightError::AllocationFailed`] when the backing
    /// allocator rejects the request (e.g. out of memory).
    ///
    /// [`InflightError::AllocationFailed`]: crate::errors::InflightError::AllocationFailed
    fn allocate_upload(&self, size: u64, label: &str) -> Result<Self::Memory>;

    /// Creates a fresh command recorder.
    fn create_command_recorder(&self, label: &str) -> Result<Self::Commands>;
}

/// A monotonic counter synchronizing CPU submission with device completion.
///
/// The counter only ever advances; it is never reset. It is the single
/// resource shared across all frame slots.
pub trait GpuFence {
    /// Advances the completed value to at least `value`.
    ///
    /// Called from the producer's submission path once per frame. Hardware
    /// backends forward this to their queue-signal primitive.
    fn signal(&self, value: u64);

    /// The highest value the device has confirmed complete.
    fn completed_value(&self) -> u64;

    /// Blocks until the completed value reaches `value`.
    ///
    /// With `timeout: None` the wait is unbounded, matching the classic
    /// frames-in-flight loop. A bounded wait fails with
    /// [`InflightError::FenceTimeout`] once the duration elapses; backends
    /// that can detect device removal report
    /// [`InflightError::DeviceLost`] instead of blocking forever.
    ///
    /// [`InflightError::FenceTimeout`]: crate::errors::InflightError::FenceTimeout
    /// [`InflightError::DeviceLost`]: crate::errors::InflightError::DeviceLost
    fn wait_until(&self, value: u64, timeout: Option<Duration>) -> Result<()>;
}

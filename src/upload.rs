//! Upload Regions
//!
//! An [`UploadRegion`] slices a block of CPU-writable, device-readable
//! memory into fixed-stride elements and supports random-access writes to
//! any slot index. When the region backs shader-constant bindings the
//! stride is rounded up to the hardware alignment (256 bytes), because
//! constant data can only be viewed at 256-byte offsets.
//!
//! The region itself does not synchronize with the device: it stays
//! writable for its entire lifetime, and the frame-resource ring is what
//! guarantees the device is no longer reading before the CPU writes.

use bytemuck::{Pod, Zeroable};

use crate::backend::{GpuAddress, UploadAllocator, UploadMemory};
use crate::errors::{InflightError, Result};

/// Required stride alignment for shader-constant bindings, in bytes.
pub const CONSTANT_BINDING_ALIGNMENT: u64 = 256;

/// Rounds `size` up to the next multiple of `align`.
///
/// Idempotent at exact multiples: `align_up(256, 256) == 256`.
#[must_use]
pub fn align_up(size: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two());
    (size + align - 1) & !(align - 1)
}

/// A fixed-stride view over one block of upload memory.
#[derive(Debug)]
pub struct UploadRegion<M: UploadMemory> {
    memory: M,
    stride: u64,
    element_count: usize,
    label: String,
}

impl<M: UploadMemory> UploadRegion<M> {
    /// Allocates a region of `element_count` elements of `layout_size`
    /// bytes each.
    ///
    /// With `align_for_binding` the per-element stride is rounded up to
    /// [`CONSTANT_BINDING_ALIGNMENT`]; otherwise elements are packed at
    /// `layout_size`. Fails with [`InflightError::AllocationFailed`] when
    /// the backing allocator rejects the request.
    pub fn new<A>(
        allocator: &A,
        layout_size: u64,
        element_count: usize,
        align_for_binding: bool,
        label: &str,
    ) -> Result<Self>
    where
        A: UploadAllocator<Memory = M>,
    {
        let stride = if align_for_binding {
            align_up(layout_size, CONSTANT_BINDING_ALIGNMENT)
        } else {
            layout_size
        };
        let memory = allocator.allocate_upload(stride * element_count as u64, label)?;
        Ok(Self {
            memory,
            stride,
            element_count,
            label: label.to_string(),
        })
    }

    /// Copies `value` into the element at `index`.
    ///
    /// `size_of::<T>()` must fit within the stride chosen at construction;
    /// regions are created for one layout and written with that layout.
    pub fn write<T: Pod>(&mut self, index: usize, value: &T) -> Result<()> {
        self.check_index(index)?;
        debug_assert!(size_of::<T>() as u64 <= self.stride);
        self.memory
            .write_bytes(index as u64 * self.stride, bytemuck::bytes_of(value));
        Ok(())
    }

    /// Copies a run of elements starting at `first_index`, one stride apart.
    pub fn write_slice<T: Pod>(&mut self, first_index: usize, values: &[T]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        // Validate the whole run up front so a partial copy never happens.
        self.check_index(first_index + values.len() - 1)?;
        for (i, value) in values.iter().enumerate() {
            self.memory.write_bytes(
                (first_index + i) as u64 * self.stride,
                bytemuck::bytes_of(value),
            );
        }
        Ok(())
    }

    /// Reads the element at `index` back out of the backing memory.
    pub fn read<T: Pod>(&self, index: usize) -> Result<T> {
        self.check_index(index)?;
        debug_assert!(size_of::<T>() as u64 <= self.stride);
        let mut value = T::zeroed();
        self.memory
            .read_bytes(index as u64 * self.stride, bytemuck::bytes_of_mut(&mut value));
        Ok(value)
    }

    /// Device address of the element at `index`.
    ///
    /// A pure function of the base address and the stride: the rendering
    /// backend binds the result as a shader input.
    #[must_use]
    pub fn address_of(&self, index: usize) -> GpuAddress {
        debug_assert!(index < self.element_count);
        self.memory.gpu_address().offset(index as u64 * self.stride)
    }

    /// Per-element stride in bytes, after any binding alignment.
    #[must_use]
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Number of elements in the region.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Debug label given at creation.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.element_count {
            return Err(InflightError::IndexOutOfRange {
                label: self.label.clone(),
                index,
                len: self.element_count,
            });
        }
        Ok(())
    }
}

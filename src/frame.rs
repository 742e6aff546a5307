//! Frame Resources
//!
//! A [`FrameResource`] bundles everything one in-flight frame owns: a
//! command recorder, one upload region per named constant-buffer category,
//! and the fence watermark the device must reach before any of it can be
//! reused. Slots are owned exclusively by the [`FrameResourceRing`] and are
//! move-only, since duplicating a slot would alias memory the device may be
//! reading.
//!
//! [`FrameResourceRing`]: crate::ring::FrameResourceRing

use bytemuck::Pod;

use crate::backend::{CommandRecorder, UploadAllocator};
use crate::errors::{InflightError, Result};
use crate::upload::UploadRegion;

/// Handle for one region within a [`FrameLayout`].
///
/// Returned when the region is declared; valid for every frame built from
/// the same layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(usize);

/// Declaration of one named upload region.
#[derive(Debug, Clone)]
pub struct RegionDesc {
    name: String,
    element_size: u64,
    element_count: usize,
    align_for_binding: bool,
}

impl RegionDesc {
    /// Region name, e.g. `"pass"`, `"object"`, `"material"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw per-element layout size in bytes, before binding alignment.
    #[must_use]
    pub fn element_size(&self) -> u64 {
        self.element_size
    }

    /// Number of elements the region holds.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.element_count
    }
}

/// Ordered set of named region declarations shared by every frame slot.
///
/// Built once before the ring is constructed; every slot allocates the same
/// regions from it.
#[derive(Debug, Clone, Default)]
pub struct FrameLayout {
    regions: Vec<RegionDesc>,
}

impl FrameLayout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a region from a raw element size.
    pub fn push_region(
        &mut self,
        name: &str,
        element_size: u64,
        element_count: usize,
        align_for_binding: bool,
    ) -> RegionId {
        let id = RegionId(self.regions.len());
        self.regions.push(RegionDesc {
            name: name.to_string(),
            element_size,
            element_count,
            align_for_binding,
        });
        id
    }

    /// Declares a shader-constant region sized for `element_count` values
    /// of `T`, with binding alignment applied.
    pub fn push_constants<T: Pod>(&mut self, name: &str, element_count: usize) -> RegionId {
        self.push_region(name, size_of::<T>() as u64, element_count, true)
    }

    /// Looks a region up by name.
    pub fn region_id(&self, name: &str) -> Result<RegionId> {
        self.regions
            .iter()
            .position(|desc| desc.name == name)
            .map(RegionId)
            .ok_or_else(|| InflightError::RegionNotFound {
                name: name.to_string(),
            })
    }

    /// The declarations, in declaration order.
    #[must_use]
    pub fn regions(&self) -> &[RegionDesc] {
        &self.regions
    }

    /// Number of declared regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether no regions are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// One in-flight frame's command recorder, upload regions and watermark.
pub struct FrameResource<A: UploadAllocator> {
    commands: A::Commands,
    regions: Vec<UploadRegion<A::Memory>>,
    // Fence value stamped at submission; 0 = never submitted.
    fence_watermark: u64,
}

impl<A: UploadAllocator> FrameResource<A> {
    /// Builds the slot's recorder and regions from `layout`.
    ///
    /// `slot` only feeds debug labels (`frame2/material` and the like).
    pub(crate) fn new(allocator: &A, layout: &FrameLayout, slot: usize) -> Result<Self> {
        let commands = allocator.create_command_recorder(&format!("frame{slot}/commands"))?;
        let regions = layout
            .regions
            .iter()
            .map(|desc| {
                UploadRegion::new(
                    allocator,
                    desc.element_size,
                    desc.element_count,
                    desc.align_for_binding,
                    &format!("frame{slot}/{}", desc.name),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            commands,
            regions,
            fence_watermark: 0,
        })
    }

    /// The upload region declared as `id`.
    #[must_use]
    pub fn region(&self, id: RegionId) -> &UploadRegion<A::Memory> {
        &self.regions[id.0]
    }

    /// Mutable access to the upload region declared as `id`.
    pub fn region_mut(&mut self, id: RegionId) -> &mut UploadRegion<A::Memory> {
        &mut self.regions[id.0]
    }

    /// The slot's command recorder.
    #[must_use]
    pub fn commands(&self) -> &A::Commands {
        &self.commands
    }

    /// The slot's command recorder, for the render code to record into.
    pub fn commands_mut(&mut self) -> &mut A::Commands {
        &mut self.commands
    }

    /// Fence value the device must reach before this slot is reusable.
    /// 0 means the slot was never submitted.
    #[must_use]
    pub fn fence_watermark(&self) -> u64 {
        self.fence_watermark
    }

    pub(crate) fn set_fence_watermark(&mut self, value: u64) {
        debug_assert!(value > self.fence_watermark, "fence values are monotonic");
        self.fence_watermark = value;
    }

    // Only the ring calls this, after the fence cleared the watermark.
    pub(crate) fn reset_commands(&mut self) {
        self.commands.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::host::HostAllocator;

    #[test]
    fn layout_lookup_by_name() {
        let mut layout = FrameLayout::new();
        let pass = layout.push_constants::<[f32; 4]>("pass", 1);
        let object = layout.push_constants::<[f32; 16]>("object", 8);
        assert_eq!(layout.region_id("pass").unwrap(), pass);
        assert_eq!(layout.region_id("object").unwrap(), object);
        assert!(matches!(
            layout.region_id("material"),
            Err(InflightError::RegionNotFound { .. })
        ));
    }

    #[test]
    fn frame_builds_all_declared_regions() {
        let mut layout = FrameLayout::new();
        let pass = layout.push_constants::<[f32; 16]>("pass", 1);
        let object = layout.push_constants::<[f32; 16]>("object", 4);

        let allocator = HostAllocator::new();
        let frame = FrameResource::new(&allocator, &layout, 0).unwrap();
        assert_eq!(frame.region(pass).element_count(), 1);
        assert_eq!(frame.region(object).element_count(), 4);
        assert_eq!(frame.fence_watermark(), 0);
    }

    #[test]
    fn frame_construction_propagates_allocation_failure() {
        let mut layout = FrameLayout::new();
        layout.push_region("pass", 256, 1024, true);

        let allocator = HostAllocator::with_budget(1024);
        assert!(matches!(
            FrameResource::new(&allocator, &layout, 0),
            Err(InflightError::AllocationFailed { .. })
        ));
    }
}

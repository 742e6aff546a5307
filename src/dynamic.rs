//! Dynamic Constant Mirroring
//!
//! The [`DynamicResourceManager`] keeps the CPU-side source of truth for
//! the three constant-buffer categories and pushes it into whichever frame
//! slot is current:
//!
//! - pass constants are rewritten every frame (camera and timers are
//!   inherently per-frame data),
//! - object transforms are rewritten wholesale every frame for the same
//!   reason,
//! - materials change rarely, so each carries a dirty counter and is only
//!   copied until every in-flight slot has seen the new value.
//!
//! The asymmetry is a bandwidth optimization: there is no point tracking
//! data that changes every frame, and no point re-copying data that does
//! not.

use bytemuck::{Pod, Zeroable};

use crate::backend::{GpuAddress, UploadAllocator};
use crate::draw::DrawBindings;
use crate::errors::{InflightError, Result};
use crate::frame::{FrameLayout, FrameResource, RegionId};

/// Conventional region name for pass-global constants.
pub const PASS_REGION: &str = "pass";
/// Conventional region name for per-object constants.
pub const OBJECT_REGION: &str = "object";
/// Conventional region name for per-material constants.
pub const MATERIAL_REGION: &str = "material";

/// A value plus the number of frame slots that still hold a stale copy.
///
/// Every write re-arms the counter to the ring's slot count N: any of the
/// N slots could be the next one the device reads, so the value must
/// propagate into all of them before it is considered clean.
#[derive(Debug, Clone, Copy)]
pub struct DirtyTracked<T> {
    value: T,
    frames_dirty: usize,
}

impl<T> DirtyTracked<T> {
    /// Wraps `value`, initially dirty for all `frames_in_flight` slots.
    pub fn new(value: T, frames_in_flight: usize) -> Self {
        Self {
            value,
            frames_dirty: frames_in_flight,
        }
    }

    /// Replaces the value and re-arms the dirty counter.
    pub fn set(&mut self, value: T, frames_in_flight: usize) {
        self.value = value;
        self.frames_dirty = frames_in_flight;
    }

    /// The current CPU-side value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Slots that still need a copy before the value is clean.
    #[must_use]
    pub fn frames_dirty(&self) -> usize {
        self.frames_dirty
    }

    /// Returns the value and decrements the counter if a copy is still
    /// owed, or `None` once every slot has been refreshed.
    pub fn take_pending(&mut self) -> Option<&T> {
        if self.frames_dirty == 0 {
            return None;
        }
        self.frames_dirty -= 1;
        Some(&self.value)
    }
}

/// CPU-side mirror of pass / object / material constants with per-frame
/// propagation into the current frame slot.
pub struct DynamicResourceManager<P, O, M> {
    pass: P,
    objects: Vec<O>,
    materials: Vec<DirtyTracked<M>>,
    frames_in_flight: usize,
    pass_region: RegionId,
    object_region: RegionId,
    material_region: RegionId,
}

impl<P: Pod, O: Pod, M: Pod> DynamicResourceManager<P, O, M> {
    /// Builds the layout this manager expects: one pass element, one object
    /// element per entry of the object mirror, one material element per
    /// entry of the material mirror, all binding-aligned.
    #[must_use]
    pub fn standard_layout(object_count: usize, material_count: usize) -> FrameLayout {
        let mut layout = FrameLayout::new();
        layout.push_constants::<P>(PASS_REGION, 1);
        layout.push_constants::<O>(OBJECT_REGION, object_count);
        layout.push_constants::<M>(MATERIAL_REGION, material_count);
        layout
    }

    /// Creates a manager over `layout`, resolving the three conventional
    /// region names.
    ///
    /// `frames_in_flight` must match the ring's slot count: it is how many
    /// slots a freshly written material must propagate into. The initial
    /// object and material data are considered dirty everywhere, so the
    /// first N updates populate every slot.
    pub fn new(
        layout: &FrameLayout,
        frames_in_flight: usize,
        initial_objects: Vec<O>,
        initial_materials: Vec<M>,
    ) -> Result<Self> {
        let pass_region = layout.region_id(PASS_REGION)?;
        let object_region = layout.region_id(OBJECT_REGION)?;
        let material_region = layout.region_id(MATERIAL_REGION)?;
        Ok(Self {
            pass: P::zeroed(),
            objects: initial_objects,
            materials: initial_materials
                .into_iter()
                .map(|m| DirtyTracked::new(m, frames_in_flight))
                .collect(),
            frames_in_flight,
            pass_region,
            object_region,
            material_region,
        })
    }

    /// Replaces the pass-global constants. No dirty tracking: the pass
    /// block is rewritten into the current slot every frame regardless.
    pub fn set_pass_constants(&mut self, pass: P) {
        self.pass = pass;
    }

    /// The current pass-global constants.
    #[must_use]
    pub fn pass_constants(&self) -> P {
        self.pass
    }

    /// Replaces one object transform. Objects are rewritten wholesale every
    /// frame, so no dirty tracking here either.
    pub fn set_object_transform(&mut self, index: usize, transform: O) -> Result<()> {
        let len = self.objects.len();
        *self
            .objects
            .get_mut(index)
            .ok_or_else(|| Self::out_of_range(OBJECT_REGION, index, len))? = transform;
        Ok(())
    }

    /// The CPU-side transform of object `index`.
    pub fn object_transform(&self, index: usize) -> Result<O> {
        self.objects
            .get(index)
            .copied()
            .ok_or_else(|| Self::out_of_range(OBJECT_REGION, index, self.objects.len()))
    }

    /// Replaces one material and re-arms its dirty counter so the value
    /// reaches every in-flight slot.
    pub fn set_material(&mut self, index: usize, material: M) -> Result<()> {
        let len = self.materials.len();
        let frames = self.frames_in_flight;
        self.materials
            .get_mut(index)
            .ok_or_else(|| Self::out_of_range(MATERIAL_REGION, index, len))?
            .set(material, frames);
        Ok(())
    }

    /// The CPU-side value of material `index`.
    pub fn material(&self, index: usize) -> Result<M> {
        self.materials
            .get(index)
            .map(|m| *m.value())
            .ok_or_else(|| Self::out_of_range(MATERIAL_REGION, index, self.materials.len()))
    }

    /// Slots material `index` still has to propagate into.
    pub fn material_frames_dirty(&self, index: usize) -> Result<usize> {
        self.materials
            .get(index)
            .map(DirtyTracked::frames_dirty)
            .ok_or_else(|| Self::out_of_range(MATERIAL_REGION, index, self.materials.len()))
    }

    /// Pushes the mirror into `frame`'s upload regions.
    ///
    /// Call once per frame, after `advance()` selected the slot and before
    /// recording binds any of its addresses. Object transforms and pass
    /// constants are written unconditionally; materials only while their
    /// dirty counter says a slot is still stale.
    pub fn update_constant_buffers<A>(&mut self, frame: &mut FrameResource<A>) -> Result<()>
    where
        A: UploadAllocator,
    {
        frame
            .region_mut(self.object_region)
            .write_slice(0, &self.objects)?;
        frame.region_mut(self.pass_region).write(0, &self.pass)?;

        let materials = frame.region_mut(self.material_region);
        for (index, material) in self.materials.iter_mut().enumerate() {
            if let Some(value) = material.take_pending() {
                materials.write(index, value)?;
            }
        }
        Ok(())
    }

    /// Address of the pass block in `frame`.
    #[must_use]
    pub fn pass_address<A: UploadAllocator>(&self, frame: &FrameResource<A>) -> GpuAddress {
        frame.region(self.pass_region).address_of(0)
    }

    /// Address of object `index` in `frame`.
    #[must_use]
    pub fn object_address<A: UploadAllocator>(
        &self,
        frame: &FrameResource<A>,
        index: usize,
    ) -> GpuAddress {
        frame.region(self.object_region).address_of(index)
    }

    /// Address of material `index` in `frame`.
    #[must_use]
    pub fn material_address<A: UploadAllocator>(
        &self,
        frame: &FrameResource<A>,
        index: usize,
    ) -> GpuAddress {
        frame.region(self.material_region).address_of(index)
    }

    /// The three addresses a drawable binds for one draw.
    #[must_use]
    pub fn bindings<A: UploadAllocator>(
        &self,
        frame: &FrameResource<A>,
        object_index: usize,
        material_index: usize,
    ) -> DrawBindings {
        DrawBindings {
            pass: self.pass_address(frame),
            object: self.object_address(frame, object_index),
            material: self.material_address(frame, material_index),
        }
    }

    /// Number of mirrored objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of mirrored materials.
    #[must_use]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    fn out_of_range(label: &str, index: usize, len: usize) -> InflightError {
        InflightError::IndexOutOfRange {
            label: label.to_string(),
            index,
            len,
        }
    }
}

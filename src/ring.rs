//! Frame-Resource Ring
//!
//! The ring owns a fixed number of [`FrameResource`] slots and hands out
//! exactly one "current" slot per frame. Advancing the cursor blocks until
//! the fence proves the device finished the work that last used the
//! incoming slot, which throttles the CPU to at most N frames ahead of the
//! device and guarantees that no CPU write ever lands on memory the device
//! is still reading.
//!
//! Per frame the loop is:
//!
//! ```text
//! ring.advance()?;                      // wait-before-reuse, reset recorder
//! // write constants into ring.current_mut(), record, submit
//! fence_value += 1;
//! queue-signal(fence_value);            // backend submission path
//! ring.mark_submitted(fence_value);     // stamp the slot's watermark
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{GpuFence, UploadAllocator};
use crate::errors::Result;
use crate::frame::{FrameLayout, FrameResource};

/// Fixed ring of frame slots guarded by one shared fence.
pub struct FrameResourceRing<A: UploadAllocator, F: GpuFence> {
    slots: Vec<FrameResource<A>>,
    cursor: usize,
    fence: Arc<F>,
    wait_timeout: Option<Duration>,
}

impl<A: UploadAllocator, F: GpuFence> FrameResourceRing<A, F> {
    /// Builds `frames_in_flight` slots from `layout`.
    ///
    /// The slot count is fixed for the life of the ring; the ring is never
    /// resized. Allocation failure for any slot aborts construction.
    ///
    /// # Panics
    /// Panics if `frames_in_flight < 2`; a single slot cannot overlap CPU
    /// and device work.
    pub fn new(
        allocator: &A,
        layout: &FrameLayout,
        fence: Arc<F>,
        frames_in_flight: usize,
    ) -> Result<Self> {
        assert!(
            frames_in_flight >= 2,
            "a frame ring needs at least 2 frames in flight"
        );
        let slots = (0..frames_in_flight)
            .map(|slot| FrameResource::new(allocator, layout, slot))
            .collect::<Result<Vec<_>>>()?;
        log::info!(
            "frame ring created: {} frames in flight, {} regions per frame",
            frames_in_flight,
            layout.len()
        );
        Ok(Self {
            slots,
            cursor: 0,
            fence,
            wait_timeout: None,
        })
    }

    /// Bounds every fence wait the ring performs.
    ///
    /// Without a timeout the ring blocks indefinitely, like the classic
    /// frames-in-flight loop; if the device never completes (removal,
    /// driver crash) that wait never returns. With a timeout, `advance`
    /// and `wait_idle` surface [`InflightError::FenceTimeout`] instead.
    ///
    /// [`InflightError::FenceTimeout`]: crate::errors::InflightError::FenceTimeout
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Moves the cursor to the next slot, waiting until it is safe to reuse.
    ///
    /// If the incoming slot was submitted before (watermark != 0) and the
    /// fence has not yet reached its watermark, this blocks. Slots that were
    /// never submitted are taken without any wait. Once the slot is safe its
    /// command recorder is reset for the new frame.
    ///
    /// On a bounded-wait failure the ring is left pointing at the stalled
    /// slot with its recorder untouched; callers typically treat that as
    /// device loss rather than retrying.
    pub fn advance(&mut self) -> Result<()> {
        self.cursor = (self.cursor + 1) % self.slots.len();
        let slot = &mut self.slots[self.cursor];

        let watermark = slot.fence_watermark();
        if watermark != 0 {
            let completed = self.fence.completed_value();
            if completed < watermark {
                log::debug!(
                    "frame ring stalled on slot {}: fence at {completed}, watermark {watermark}",
                    self.cursor
                );
                self.fence.wait_until(watermark, self.wait_timeout)?;
            }
        }

        slot.reset_commands();
        Ok(())
    }

    /// The current frame slot.
    ///
    /// Valid between `advance` calls only; references must not be retained
    /// across an `advance` (the borrow checker enforces this).
    #[must_use]
    pub fn current(&self) -> &FrameResource<A> {
        &self.slots[self.cursor]
    }

    /// Mutable access to the current frame slot.
    pub fn current_mut(&mut self) -> &mut FrameResource<A> {
        &mut self.slots[self.cursor]
    }

    /// Stamps `new_fence_value` onto the current slot.
    ///
    /// Called once per frame, immediately after the submission path signals
    /// the queue with the same value. The slot becomes safe to reuse once
    /// the fence reaches this value.
    pub fn mark_submitted(&mut self, new_fence_value: u64) {
        self.slots[self.cursor].set_fence_watermark(new_fence_value);
    }

    /// Blocks until the device has completed every frame ever submitted
    /// through this ring.
    ///
    /// The startup/resize full flush: after this returns, every slot is
    /// safe to reuse or destroy.
    pub fn wait_idle(&self) -> Result<()> {
        let Some(high) = self
            .slots
            .iter()
            .map(FrameResource::fence_watermark)
            .max()
            .filter(|&w| w != 0)
        else {
            return Ok(());
        };
        if self.fence.completed_value() < high {
            log::debug!("frame ring flush: waiting for fence {high}");
            self.fence.wait_until(high, self.wait_timeout)?;
        }
        Ok(())
    }

    /// Number of slots, fixed at construction.
    #[must_use]
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Index of the current slot.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The fence shared by every slot.
    #[must_use]
    pub fn fence(&self) -> &F {
        &self.fence
    }
}

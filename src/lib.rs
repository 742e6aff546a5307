//! Frames-in-flight resource management, independent of any graphics API.
//!
//! A ring of N frame slots (command recorder plus named constant-buffer
//! upload regions, each guarded by a shared GPU fence) lets the CPU race
//! ahead of the device without ever writing memory the device is still
//! reading. The backend (allocator, fence, command context) is supplied
//! through the traits in [`backend`]; a software [`backend::host`]
//! implementation backs the tests.
//!
//! See [`ring::FrameResourceRing`] for the per-frame protocol and
//! [`dynamic::DynamicResourceManager`] for dirty-tracked constant
//! propagation.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod backend;
pub mod constants;
pub mod draw;
pub mod dynamic;
pub mod errors;
pub mod frame;
pub mod ring;
pub mod upload;

pub use backend::{CommandRecorder, GpuAddress, GpuFence, UploadAllocator, UploadMemory};
pub use constants::{Light, MaterialConstants, ObjectConstants, PassConstants, MAX_LIGHTS};
pub use draw::{DrawBindings, Drawable};
pub use dynamic::{DirtyTracked, DynamicResourceManager};
pub use errors::{InflightError, Result};
pub use frame::{FrameLayout, FrameResource, RegionId};
pub use ring::FrameResourceRing;
pub use upload::{UploadRegion, CONSTANT_BINDING_ALIGNMENT};

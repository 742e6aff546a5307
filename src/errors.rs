//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`InflightError`] covers all failure modes including:
//! - Upload memory allocation failures
//! - Out-of-range slot indexing
//! - Fence waits that time out or observe a lost device
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, InflightError>`.

use thiserror::Error;

/// The main error type for the crate.
///
/// Allocation failures are fatal at startup and unrecoverable mid-run.
/// Indexing errors are programmer errors that the checked accessors
/// surface instead of corrupting adjacent memory. Fence errors only
/// occur on bounded waits or when the backend reports device loss.
#[derive(Error, Debug)]
pub enum InflightError {
    // ========================================================================
    // Allocation Errors
    // ========================================================================
    /// The backing allocator rejected an upload memory request.
    #[error("upload allocation '{label}' of {size} bytes failed: {reason}")]
    AllocationFailed {
        /// Debug label of the requested region.
        label: String,
        /// Requested size in bytes.
        size: u64,
        /// Backend-specific failure description.
        reason: String,
    },

    // ========================================================================
    // Indexing Errors
    // ========================================================================
    /// A slot index was outside the element range of a region or mirror.
    #[error("index {index} out of range for '{label}' (len {len})")]
    IndexOutOfRange {
        /// Debug label of the indexed container.
        label: String,
        /// The offending index.
        index: usize,
        /// Number of elements in the container.
        len: usize,
    },

    /// A frame layout does not declare a region with the requested name.
    #[error("frame layout has no region named '{name}'")]
    RegionNotFound {
        /// The missing region name.
        name: String,
    },

    // ========================================================================
    // Fence Errors
    // ========================================================================
    /// A bounded fence wait elapsed before the fence reached its target.
    #[error("fence wait timed out: completed {completed}, target {target}")]
    FenceTimeout {
        /// The fence value the wait was targeting.
        target: u64,
        /// The last completed value observed.
        completed: u64,
    },

    /// The backend reported that the device was removed or reset.
    #[error("device lost: {0}")]
    DeviceLost(String),
}

/// Convenience alias used by all fallible APIs in this crate.
pub type Result<T> = std::result::Result<T, InflightError>;

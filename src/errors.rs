//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`FrameGenError`] covers the failure kinds described
//! in the pipeline's error-handling design:
//! - GPU initialization failures (fatal to the core)
//! - Resource allocation failures after a resize
//! - Shader compilation / pipeline creation failures
//! - Capture-fatal conditions surfaced from the capture backend
//!
//! Transient conditions (no new frame available, a frame arriving late) are
//! deliberately *not* variants of this enum — they are recovered locally by
//! skipping an iteration and are represented with `Option`/`bool`, not
//! `Result`. See [`crate::capture`] for the transient-vs-fatal split.
//!
//! All public fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, FrameGenError>`.

use thiserror::Error;

/// The main error type for the frame-generation core.
///
/// Each variant corresponds to one of the error kinds from the error-handling
/// design: initialization, resource allocation, shader execution, and
/// capture-fatal. Transient errors are not represented here.
#[derive(Error, Debug)]
pub enum FrameGenError {
    // ========================================================================
    // Initialization Errors (fatal)
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("failed to request a GPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// A required compute shader failed to compile.
    #[error("shader compilation failed for `{pipeline}`: {detail}")]
    ShaderCompilationFailed {
        /// Name of the pipeline whose shader failed to compile.
        pipeline: &'static str,
        /// Compiler diagnostic.
        detail: String,
    },

    // ========================================================================
    // Resource Allocation Errors
    // ========================================================================
    /// Texture or buffer allocation failed after a resize.
    ///
    /// Recoverable the first time (the caller should skip the current
    /// iteration); repeated failures should be escalated to a fatal
    /// condition by the caller.
    #[error("GPU resource allocation failed: {0}")]
    ResourceAllocationFailed(String),

    // ========================================================================
    // Shader Execution Errors (fatal)
    // ========================================================================
    /// The device was lost or removed mid-execution.
    #[error("GPU device was lost or removed: {0}")]
    DeviceLost(String),

    // ========================================================================
    // Capture Errors (fatal)
    // ========================================================================
    /// The capture source handle was invalidated or the backend was lost.
    ///
    /// Capture-transient conditions (no new frame this call, a timed-out
    /// acquire) are represented as `Ok(None)` from
    /// [`crate::capture::CaptureBackend::acquire_latest`], not as this
    /// variant.
    #[error("capture source failed fatally: {0}")]
    CaptureFatal(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A setter was called with a value outside its documented range.
    #[error("invalid configuration for `{field}`: {detail}")]
    InvalidConfig {
        /// Name of the configuration field.
        field: &'static str,
        /// Why the value was rejected.
        detail: String,
    },
}

/// Alias for `Result<T, FrameGenError>`.
pub type Result<T> = std::result::Result<T, FrameGenError>;

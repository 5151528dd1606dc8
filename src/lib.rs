//! # framepace
//!
//! Motion-compensated GPU frame-generation core for real-time
//! screen-capture frame-rate multiplication. Ingests a stream of captured
//! color frames, estimates dense pixel motion on the GPU, and synthesizes
//! intermediate frames at arbitrary sub-frame phases so the presented
//! stream runs at a higher effective rate than the capture source.
//!
//! The concrete capture backends, the settings UI, and window enumeration
//! are out of scope for this crate (see [`capture`] for the interface the
//! core consumes). This crate is the five-component dataflow pipeline: the
//! [`queue`], the [`estimator`], the [`postprocess`]or, the [`interpolate`]
//! engine, and the [`scheduler`] that drives them — exposed to a host
//! application as [`FrameGenerator`].

pub mod capture;
pub mod config;
pub mod errors;
pub mod estimator;
mod fps;
pub mod generator;
pub mod gpu;
pub mod graph;
pub mod interpolate;
pub mod postprocess;
pub mod queue;
pub mod scheduler;

pub use config::{DebugViewMode, FrameGenSettings, MotionModel, OutputMode, QualityMode, TemporalStabilizationSettings};
pub use errors::{FrameGenError, Result};
pub use generator::{FrameGenerator, Observables, TickOutcome};

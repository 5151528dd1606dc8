//! Capture Backend Interface
//!
//! The concrete capture backends (compositor capture, desktop-duplication
//! capture, an injected in-process hook) are out of scope (`spec.md` §1); this
//! module defines only the minimal interface the core consumes (`spec.md`
//! §6) and the capture-drain worker loop that bridges a backend to the
//! [`crate::queue::FrameQueue`]. The three concrete backends are a dispatch
//! polymorphism case (§9 REDESIGN FLAGS): the core depends on `dyn
//! CaptureBackend`, never on a backend-specific type.

use crate::errors::Result;

/// A capture target: either a window or a display. Opaque to the core —
/// backends interpret the handle, the core only threads it through `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureTarget {
    Window(u64),
    Display(u32),
}

/// One frame handed from a capture backend to the core.
pub struct Frame {
    /// The captured color texture, already resident on the shared device.
    pub color_texture: wgpu::Texture,
    pub width: u32,
    pub height: u32,
    /// High-resolution performance-counter sample taken at capture time.
    pub qpc_time: f64,
    /// Capture timestamp, 100-ns ticks on a monotonic clock.
    pub capture_time_100ns: i64,
}

/// The minimal interface a capture backend exposes (`spec.md` §6): start,
/// stop, poll for the newest frame, and report capturing state. Backends
/// differ in `CaptureTarget` interpretation and in whether they can capture
/// occluded windows; the core treats every backend as a black box behind
/// this trait.
pub trait CaptureBackend: Send {
    /// Begins capturing `target`. Idempotent if already capturing the same
    /// target; switches target otherwise.
    fn start(&mut self, target: CaptureTarget) -> Result<()>;

    /// Stops capturing and releases backend-owned resources.
    fn stop(&mut self);

    /// Returns the most recent frame produced since the last call, or
    /// `Ok(None)` if none has arrived (capture-transient, not an error).
    /// A capture-fatal condition (source handle invalidated, backend lost)
    /// is surfaced as `Err(FrameGenError::CaptureFatal(..))`.
    fn acquire_latest(&mut self) -> Result<Option<Frame>>;

    fn is_capturing(&self) -> bool;
}

/// Runs a capture-drain loop (`spec.md` §5 "dedicated capture-drain
/// worker... pulls newest-frame-wins from the source... pushes onto the
/// queue"): polls `backend` for new frames and hands each one to `on_frame`,
/// which is expected to copy into the next free slot and push onto the
/// queue. Intended to be spawned on its own `std::thread` by the caller; a
/// `flume::Receiver<()>` or similar can be layered on `should_stop` for
/// cooperative shutdown.
///
/// Returns once `should_stop` returns `true` or the backend reports a fatal
/// error, which is propagated to the caller after `backend.stop()` runs.
pub fn run_capture_drain<B: CaptureBackend + ?Sized>(
    backend: &mut B,
    mut on_frame: impl FnMut(Frame),
    mut should_stop: impl FnMut() -> bool,
    poll_wait: impl Fn(),
) -> Result<()> {
    while !should_stop() {
        match backend.acquire_latest() {
            Ok(Some(frame)) => on_frame(frame),
            Ok(None) => poll_wait(),
            Err(err) => {
                backend.stop();
                return Err(err);
            }
        }
    }
    backend.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FrameGenError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubBackend {
        capturing: bool,
        frames_left: u32,
        fail_after: Option<u32>,
    }

    impl CaptureBackend for StubBackend {
        fn start(&mut self, _target: CaptureTarget) -> Result<()> {
            self.capturing = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.capturing = false;
        }

        fn acquire_latest(&mut self) -> Result<Option<Frame>> {
            if let Some(fail_after) = self.fail_after {
                if fail_after == 0 {
                    return Err(FrameGenError::CaptureFatal("source lost".into()));
                }
                self.fail_after = Some(fail_after - 1);
            }
            if self.frames_left == 0 {
                return Ok(None);
            }
            self.frames_left -= 1;
            Ok(None)
        }

        fn is_capturing(&self) -> bool {
            self.capturing
        }
    }

    #[test]
    fn drain_stops_cooperatively() {
        let mut backend = StubBackend { capturing: true, frames_left: 0, fail_after: None };
        let calls = AtomicU32::new(0);
        let result = run_capture_drain(
            &mut backend,
            |_| {},
            || calls.fetch_add(1, Ordering::SeqCst) >= 3,
            || {},
        );
        assert!(result.is_ok());
        assert!(!backend.is_capturing());
    }

    #[test]
    fn fatal_error_stops_backend_and_propagates() {
        let mut backend = StubBackend { capturing: true, frames_left: 0, fail_after: Some(0) };
        let result = run_capture_drain(&mut backend, |_| {}, || false, || {});
        assert!(result.is_err());
        assert!(!backend.is_capturing());
    }
}

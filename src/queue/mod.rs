//! Frame Queue
//!
//! Bounded, strictly-FIFO ordered sequence of frame slots (`spec.md` §3/§4.1):
//! insertion at the back, removal from the front, exposing the `(prev, curr)`
//! window the scheduler addresses. Single-writer (capture thread) /
//! single-reader (render thread) in the concurrent sense; the lock exists to
//! make that boundary safe to cross, not because the common single-threaded
//! render-loop case needs it — grounded on the parking_lot-protected
//! `VecDeque` pattern used for frame buffering elsewhere in the pack, adapted
//! to this crate's slot-index-plus-timestamp model instead of owning pixel
//! data directly.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// One entry in the [`FrameQueue`]: a slot index plus its timestamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedFrame {
    pub slot_index: usize,
    /// Raw capture timestamp, 100-ns ticks on a monotonic clock.
    pub capture_ts: i64,
    /// De-jittered timestamp (see [`FrameQueue::push`]).
    pub smoothed_ts: i64,
}

/// Drop policy applied when [`FrameQueue::push`] is called while full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Pop the front to make room (default; bounds latency).
    DropOldest,
    /// Reject the push and let the producer stall.
    NeverDrop,
}

const INTERVAL_WINDOW: usize = 20;
const OFFSET_RETENTION: f64 = 0.995;

struct Inner {
    deque: VecDeque<QueuedFrame>,
    capacity: usize,
    policy: OverflowPolicy,

    dims_set: bool,

    // Running averages feeding the scheduler.
    interval_samples: VecDeque<i64>,
    average_interval: i64,
    last_capture_ts: Option<i64>,
    last_smoothed_ts: Option<i64>,
    capture_to_qpc_offset: Option<f64>,
    jitter_suppression: f32,

    pushed: u64,
    popped: u64,
    dropped: u64,
}

impl Inner {
    fn new(capacity: usize, policy: OverflowPolicy, jitter_suppression: f32) -> Self {
        Self {
            deque: VecDeque::with_capacity(capacity),
            capacity,
            policy,
            dims_set: false,
            interval_samples: VecDeque::with_capacity(INTERVAL_WINDOW),
            average_interval: 0,
            last_capture_ts: None,
            last_smoothed_ts: None,
            capture_to_qpc_offset: None,
            jitter_suppression,
            pushed: 0,
            popped: 0,
            dropped: 0,
        }
    }

    /// Updates the capture->QPC offset via a stiff exponential average,
    /// §4.1: first sample sets it exactly, thereafter `0.995*old + 0.005*new`.
    fn update_offset(&mut self, qpc_now: f64, capture_ts: i64) {
        let new_offset = qpc_now - capture_ts as f64;
        self.capture_to_qpc_offset = Some(match self.capture_to_qpc_offset {
            None => new_offset,
            Some(old) => OFFSET_RETENTION * old + (1.0 - OFFSET_RETENTION) * new_offset,
        });
    }

    /// Rolls `interval` into the 20-sample sliding mean.
    fn update_average_interval(&mut self, interval: i64) {
        if self.interval_samples.len() == INTERVAL_WINDOW {
            self.interval_samples.pop_front();
        }
        self.interval_samples.push_back(interval);
        let sum: i64 = self.interval_samples.iter().sum();
        self.average_interval = sum / self.interval_samples.len() as i64;
    }

    /// De-jitters `capture_ts` into a smoothed timestamp per §4.1.
    fn smooth_timestamp(&self, capture_ts: i64) -> i64 {
        let Some(prev) = self.last_smoothed_ts else {
            return capture_ts;
        };
        if self.average_interval == 0 {
            return capture_ts;
        }
        let expected = prev + self.average_interval;
        let threshold = (self.jitter_suppression as f64 * self.average_interval as f64).abs();
        let deviation = (capture_ts - expected).abs() as f64;
        if deviation < threshold {
            expected
        } else {
            (capture_ts + expected) / 2
        }
    }
}

/// Bounded ordered deque of frame slots addressed by presentation time.
pub struct FrameQueue {
    inner: Mutex<Inner>,
}

impl FrameQueue {
    /// Creates an empty queue with bound `capacity` (clamped to `[2, 12]`
    /// per `spec.md` §3) and the given overflow policy.
    #[must_use]
    pub fn new(capacity: usize, policy: OverflowPolicy, jitter_suppression: f32) -> Self {
        let capacity = capacity.clamp(2, 12);
        Self {
            inner: Mutex::new(Inner::new(capacity, policy, jitter_suppression)),
        }
    }

    /// Marks the queue ready to accept frames (called once dimensions are
    /// known); `push` silently fails before this.
    pub fn set_dimensions_ready(&self) {
        self.inner.lock().dims_set = true;
    }

    /// Updates the jitter-suppression coefficient without resetting state.
    pub fn set_jitter_suppression(&self, s: f32) {
        self.inner.lock().jitter_suppression = s;
    }

    /// Appends `(slot_idx, capture_ts)` to the back, updating the running
    /// averages and the smoothed timestamp. `qpc_now` is the caller's
    /// high-resolution performance counter sample taken at push time.
    ///
    /// Returns `false` (and logs at `debug`) if called before
    /// [`Self::set_dimensions_ready`], or if the queue is full under
    /// [`OverflowPolicy::NeverDrop`].
    pub fn push(&self, slot_index: usize, capture_ts: i64, qpc_now: f64) -> bool {
        let mut inner = self.inner.lock();

        if !inner.dims_set {
            log::debug!("frame queue push before dimension setup; dropped silently");
            return false;
        }

        if inner.deque.len() >= inner.capacity {
            match inner.policy {
                OverflowPolicy::DropOldest => {
                    inner.deque.pop_front();
                    inner.dropped += 1;
                }
                OverflowPolicy::NeverDrop => return false,
            }
        }

        if let Some(last) = inner.last_capture_ts {
            inner.update_average_interval(capture_ts - last);
        }
        inner.update_offset(qpc_now, capture_ts);
        let smoothed_ts = inner.smooth_timestamp(capture_ts);

        inner.deque.push_back(QueuedFrame {
            slot_index,
            capture_ts,
            smoothed_ts,
        });
        inner.last_capture_ts = Some(capture_ts);
        inner.last_smoothed_ts = Some(smoothed_ts);
        inner.pushed += 1;
        true
    }

    /// Returns `(front, front+1)`, or `None` if fewer than two frames are
    /// queued.
    #[must_use]
    pub fn peek_pair(&self) -> Option<(QueuedFrame, QueuedFrame)> {
        let inner = self.inner.lock();
        let front = *inner.deque.front()?;
        let second = *inner.deque.get(1)?;
        Some((front, second))
    }

    /// Removes and returns the front slot, if any.
    pub fn pop_front(&self) -> Option<QueuedFrame> {
        let mut inner = self.inner.lock();
        let popped = inner.deque.pop_front();
        if popped.is_some() {
            inner.popped += 1;
        }
        popped
    }

    /// Drops all queued slots and resets the running-average state. Used on
    /// source resize and capture restart.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.deque.clear();
        inner.interval_samples.clear();
        inner.average_interval = 0;
        inner.last_capture_ts = None;
        inner.last_smoothed_ts = None;
        inner.capture_to_qpc_offset = None;
        log::debug!("frame queue cleared");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().deque.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().deque.is_empty()
    }

    /// Source's running-average inter-capture interval, 100-ns ticks.
    #[must_use]
    pub fn average_interval(&self) -> i64 {
        self.inner.lock().average_interval
    }

    /// Smoothed capture->QPC offset, if at least one frame has been pushed.
    #[must_use]
    pub fn capture_to_qpc_offset(&self) -> Option<f64> {
        self.inner.lock().capture_to_qpc_offset
    }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock();
        QueueStats {
            pushed: inner.pushed,
            popped: inner.popped,
            dropped: inner.dropped,
        }
    }
}

/// Read-only push/pop/drop counters, serving the observables in `spec.md` §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub pushed: u64,
    pub popped: u64,
    pub dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_before_dimensions_ready_fails_silently() {
        let queue = FrameQueue::new(4, OverflowPolicy::DropOldest, 0.2);
        assert!(!queue.push(0, 0, 0.0));
        assert!(queue.is_empty());
    }

    #[test]
    fn fifo_order_is_preserved() {
        let queue = FrameQueue::new(4, OverflowPolicy::DropOldest, 0.2);
        queue.set_dimensions_ready();
        for i in 0..3 {
            assert!(queue.push(i, i as i64 * 1_000_000, i as f64 * 1_000_000.0));
        }
        let (front, second) = queue.peek_pair().unwrap();
        assert_eq!(front.slot_index, 0);
        assert_eq!(second.slot_index, 1);
        assert_eq!(queue.pop_front().unwrap().slot_index, 0);
    }

    #[test]
    fn drop_oldest_bounds_queue_length() {
        let queue = FrameQueue::new(2, OverflowPolicy::DropOldest, 0.2);
        queue.set_dimensions_ready();
        for i in 0..5 {
            queue.push(i, i as i64 * 1_000_000, i as f64 * 1_000_000.0);
        }
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.stats().dropped, 3);
    }

    #[test]
    fn never_drop_rejects_push_when_full() {
        let queue = FrameQueue::new(2, OverflowPolicy::NeverDrop, 0.2);
        queue.set_dimensions_ready();
        assert!(queue.push(0, 0, 0.0));
        assert!(queue.push(1, 1_000_000, 1_000_000.0));
        assert!(!queue.push(2, 2_000_000, 2_000_000.0));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn clear_resets_running_averages() {
        let queue = FrameQueue::new(4, OverflowPolicy::DropOldest, 0.2);
        queue.set_dimensions_ready();
        for i in 0..5 {
            queue.push(i, i as i64 * 1_000_000, i as f64 * 1_000_000.0);
        }
        assert!(queue.average_interval() > 0);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.average_interval(), 0);
        assert!(queue.capture_to_qpc_offset().is_none());
    }

    #[test]
    fn small_jitter_snaps_to_expected_timestamp() {
        let queue = FrameQueue::new(6, OverflowPolicy::DropOldest, 0.2);
        queue.set_dimensions_ready();
        // Establish a steady ~16.67ms cadence (in 100ns ticks: ~166700).
        let step = 166_700i64;
        let mut ts = 0i64;
        for i in 0..10 {
            queue.push(i, ts, ts as f64);
            ts += step;
        }
        // A slightly early frame within the jitter band should be smoothed
        // toward the expected time rather than passed through raw.
        let jittered = ts - step / 10;
        queue.push(10, jittered, jittered as f64);
        let frames: Vec<_> = std::iter::from_fn(|| queue.pop_front()).collect();
        let last = frames.last().unwrap();
        assert_ne!(last.smoothed_ts, jittered);
    }
}

//! FPS Counter
//!
//! Rolling one-second frame-rate sampler backing the `capture fps`/`present
//! fps` observables (`spec.md` §6). Grounded on the teacher's
//! `utils::fps_counter::FpsCounter`, unchanged in shape — this crate samples
//! it from two independent call sites (capture drain, present) instead of
//! the teacher's single render loop.

use std::time::{Duration, Instant};

pub struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
    accumulated_time: Duration,
    current_fps: f32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
            accumulated_time: Duration::new(0, 0),
            current_fps: 0.0,
        }
    }

    /// Records one frame, updating `current_fps` about once per second.
    pub fn tick(&mut self) {
        self.frame_count += 1;
        let now = Instant::now();
        self.accumulated_time += now - self.last_update;
        self.last_update = now;

        if self.accumulated_time.as_secs_f32() >= 1.0 {
            self.current_fps = self.frame_count as f32 / self.accumulated_time.as_secs_f32();
            self.accumulated_time = Duration::new(0, 0);
            self.frame_count = 0;
        }
    }

    #[must_use]
    pub fn current(&self) -> f32 {
        self.current_fps
    }
}

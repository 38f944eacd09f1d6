use bevy_ecs::prelude::Resource;

/// Logical milliseconds supplied by the frame driver.
pub type TimeMs = u64;

/// Timestamp of the frame currently being processed.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameClock {
    pub current_ms: TimeMs,
    pub elapsed_ms: TimeMs,
    pub frame: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock to an externally supplied timestamp.
    pub fn set(&mut self, current_ms: TimeMs, elapsed_ms: TimeMs) {
        self.current_ms = current_ms;
        self.elapsed_ms = elapsed_ms;
        self.frame += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_counts_frames() {
        let mut clock = FrameClock::new();
        clock.set(16, 16);
        clock.set(1_500, 20);
        assert_eq!((clock.current_ms, clock.elapsed_ms, clock.frame), (1_500, 20, 2));
    }
}

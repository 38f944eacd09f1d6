use bevy_ecs::prelude::Resource;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Clone, Copy, Debug)]
pub struct PhaseTimingSummary {
    pub phase: &'static str,
    pub last_us: f32,
    pub average_us: f32,
    pub max_us: f32,
    pub samples: u64,
}

#[derive(Default)]
struct PhaseTiming {
    last_us: f32,
    total_us: f64,
    max_us: f32,
    samples: u64,
}

/// Wall-clock cost of each phase of the storyboard pass.
#[derive(Resource, Default)]
pub struct FrameProfiler {
    timings: HashMap<&'static str, PhaseTiming>,
}

impl FrameProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&mut self, phase: &'static str) -> PhaseScope<'_> {
        PhaseScope { phase, profiler: self, start: Instant::now() }
    }

    fn record(&mut self, phase: &'static str, duration_us: f32) {
        let entry = self.timings.entry(phase).or_default();
        entry.last_us = duration_us;
        entry.max_us = entry.max_us.max(duration_us);
        entry.total_us += duration_us as f64;
        entry.samples += 1;
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }

    /// Most expensive phase of the last frame first.
    pub fn summaries(&self) -> Vec<PhaseTimingSummary> {
        let mut out: Vec<PhaseTimingSummary> = self
            .timings
            .iter()
            .map(|(&phase, timing)| PhaseTimingSummary {
                phase,
                last_us: timing.last_us,
                average_us: if timing.samples == 0 {
                    0.0
                } else {
                    (timing.total_us / timing.samples as f64) as f32
                },
                max_us: timing.max_us,
                samples: timing.samples,
            })
            .collect();
        out.sort_by(|a, b| b.last_us.partial_cmp(&a.last_us).unwrap_or(std::cmp::Ordering::Equal));
        out
    }
}

pub struct PhaseScope<'a> {
    phase: &'static str,
    profiler: &'a mut FrameProfiler,
    start: Instant,
}

impl Drop for PhaseScope<'_> {
    fn drop(&mut self) {
        let duration_us = self.start.elapsed().as_secs_f32() * 1_000_000.0;
        self.profiler.record(self.phase, duration_us);
    }
}

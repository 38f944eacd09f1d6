use crate::active_animations::FrameReport;
use crate::config::CompactionConfig;
use crate::time::TimeMs;
use bevy_ecs::prelude::Resource;

/// What the driver should do with the registry after a traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReclaimAction {
    None,
    /// No entry is active any more; drop everything.
    Clear,
    /// The pass ran with compaction requested and erased finished entries.
    Compacted,
}

/// Debounces the garbage-overflow signal into a compaction request.
///
/// Overflow has to be observed continuously for longer than `debounce_ms` before
/// a compaction is requested; a single healthy frame restarts the countdown.
#[derive(Resource, Clone, Debug)]
pub struct CompactionHeuristic {
    debounce_ms: TimeMs,
    garbage_ratio: usize,
    requested: bool,
    overflow_since: Option<TimeMs>,
}

impl Default for CompactionHeuristic {
    fn default() -> Self {
        Self::new(&CompactionConfig::default())
    }
}

impl CompactionHeuristic {
    pub fn new(config: &CompactionConfig) -> Self {
        Self {
            debounce_ms: config.debounce_ms,
            garbage_ratio: config.garbage_ratio.max(1),
            requested: false,
            overflow_since: None,
        }
    }

    /// Whether the next traversal should erase finished entries.
    pub fn compaction_requested(&self) -> bool {
        self.requested
    }

    pub fn overflow_since(&self) -> Option<TimeMs> {
        self.overflow_since
    }

    pub fn debounce_ms(&self) -> TimeMs {
        self.debounce_ms
    }

    /// Folds the result of the pass that just ran into the heuristic state.
    ///
    /// `compacted` tells whether that pass ran with compaction requested.
    pub fn observe(&mut self, report: &FrameReport, compacted: bool, now: TimeMs) -> ReclaimAction {
        let action = if report.active == 0 {
            self.overflow_since = Some(now);
            ReclaimAction::Clear
        } else if compacted {
            self.overflow_since = Some(now);
            ReclaimAction::Compacted
        } else {
            ReclaimAction::None
        };
        self.requested = self.overflow_persisted(report.garbage_overflow(self.garbage_ratio), now);
        action
    }

    fn overflow_persisted(&mut self, overflow: bool, now: TimeMs) -> bool {
        if !overflow {
            self.overflow_since = Some(now);
            return false;
        }
        let since = *self.overflow_since.get_or_insert(now);
        now.saturating_sub(since) > self.debounce_ms
    }
}

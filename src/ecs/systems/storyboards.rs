use crate::active_animations::{ActiveAnimations, FrameReport};
use crate::commands::{AnimationCommand, AnimationCommandQueue};
use crate::compaction::{CompactionHeuristic, ReclaimAction};
use crate::ecs::profiler::FrameProfiler;
use crate::ecs::resolve::resolve_storyboard;
use crate::ecs::{BehaviorChain, Parent, SceneAnimation, Storyboard};
use crate::events::{EventBus, StoryboardEvent};
use crate::status::AnimationStatus;
use crate::time::FrameClock;
use bevy_ecs::prelude::{Entity, Query, Res, ResMut, Resource};
use tracing::{debug, error, info};

/// Running counters for the storyboard pass.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoryboardStats {
    pub frames: u64,
    pub commands_applied: u64,
    pub active_entries: usize,
    pub total_entries: usize,
    pub full_clears: u64,
    pub compactions: u64,
    pub reclaimed_entries: u64,
    pub notifications: u64,
    pub resolve_failures: u64,
    pub skipped_references: u64,
}

/// Drains queued registrations, advances every running scene, reclaims finished
/// entries, notifies storyboards that finished this frame and publishes the
/// running set for other threads.
#[allow(clippy::too_many_arguments)]
pub fn sys_drive_storyboards(
    mut profiler: ResMut<FrameProfiler>,
    clock: Res<FrameClock>,
    queue: Res<AnimationCommandQueue>,
    mut registry: ResMut<ActiveAnimations>,
    mut heuristic: ResMut<CompactionHeuristic>,
    mut stats: ResMut<StoryboardStats>,
    mut events: ResMut<EventBus>,
    status: Res<AnimationStatus>,
    parents: Query<&Parent>,
    chains: Query<&BehaviorChain>,
    mut storyboards: Query<&mut Storyboard>,
    mut scenes: Query<&mut SceneAnimation>,
) {
    stats.frames += 1;
    {
        let _span = profiler.scope("drain");
        for command in queue.drain() {
            stats.commands_applied += 1;
            match command {
                AnimationCommand::RegisterScene { scene } => {
                    let Some(storyboard) = resolve_storyboard(scene, &scenes, &parents, &chains) else {
                        error!(scene = ?scene, "Failed to find parent storyboard for the scene");
                        stats.resolve_failures += 1;
                        events.push(StoryboardEvent::ResolveFailed { scene });
                        continue;
                    };
                    let Ok(mut board) = storyboards.get_mut(storyboard) else {
                        error!(scene = ?scene, storyboard = ?storyboard, "Storyboard behavior points at a missing storyboard");
                        stats.resolve_failures += 1;
                        events.push(StoryboardEvent::ResolveFailed { scene });
                        continue;
                    };
                    // An endless storyboard restarted by the notifier is already active.
                    if registry.insert_scene(storyboard, scene) && !board.is_active() {
                        fire_changed(storyboard, &mut board, true, &mut events);
                        stats.notifications += 1;
                    }
                }
                AnimationCommand::UnregisterScene { scene } => {
                    match resolve_storyboard(scene, &scenes, &parents, &chains) {
                        Some(storyboard) => {
                            registry.remove_storyboard(storyboard);
                        }
                        None => debug!(scene = ?scene, "unregister: scene has no owning storyboard"),
                    }
                }
                AnimationCommand::UnregisterStoryboard { storyboard } => {
                    registry.remove_storyboard(storyboard);
                }
            }
        }
    }

    let compact = heuristic.compaction_requested();
    let report = {
        let _span = profiler.scope("traverse");
        let FrameClock { current_ms, elapsed_ms, .. } = *clock;
        registry.advance(
            |scene| scenes.get_mut(scene).ok().map(|mut animation| animation.update(current_ms, elapsed_ms)),
            compact,
        )
    };
    stats.active_entries = report.active;
    stats.total_entries = report.total;
    stats.skipped_references += report.skipped as u64;

    {
        let _span = profiler.scope("reclaim");
        reclaim(&mut registry, &mut heuristic, &report, compact, clock.current_ms, &mut stats, &mut events);
    }

    {
        let _span = profiler.scope("notify");
        notify_finished(&report.finished, &mut storyboards, &mut stats, &mut events);
    }

    let _span = profiler.scope("publish");
    status.publish(&registry);
}

fn reclaim(
    registry: &mut ActiveAnimations,
    heuristic: &mut CompactionHeuristic,
    report: &FrameReport,
    compacted: bool,
    now: u64,
    stats: &mut StoryboardStats,
    events: &mut EventBus,
) {
    match heuristic.observe(report, compacted, now) {
        ReclaimAction::Clear => {
            // A compacting pass may already have erased the finished entries.
            let entries = report.total.max(registry.len());
            registry.clear();
            if entries > 0 {
                stats.full_clears += 1;
                debug!(entries, "no active storyboards left, registry cleared");
                events.push(StoryboardEvent::RegistryCleared { entries });
            }
        }
        ReclaimAction::Compacted => {
            let remaining = registry.len();
            stats.compactions += 1;
            stats.reclaimed_entries += report.reclaimed as u64;
            info!(
                reclaimed = report.reclaimed,
                remaining,
                "Active animation registry compacted; finished storyboards are not being unregistered"
            );
            events.push(StoryboardEvent::RegistryCompacted { reclaimed: report.reclaimed, remaining });
        }
        ReclaimAction::None => {}
    }
}

fn notify_finished(
    finished: &[Entity],
    storyboards: &mut Query<&mut Storyboard>,
    stats: &mut StoryboardStats,
    events: &mut EventBus,
) {
    for &storyboard in finished {
        let Ok(mut board) = storyboards.get_mut(storyboard) else {
            debug!(storyboard = ?storyboard, "finished storyboard no longer exists");
            stats.skipped_references += 1;
            continue;
        };
        if !board.is_active() {
            continue;
        }
        fire_changed(storyboard, &mut board, false, events);
        stats.notifications += 1;
        if board.is_endless() {
            fire_changed(storyboard, &mut board, true, events);
            stats.notifications += 1;
        }
    }
}

fn fire_changed(entity: Entity, board: &mut Storyboard, active: bool, events: &mut EventBus) {
    board.set_active(active);
    board.bump_revision();
    events.push(StoryboardEvent::changed(entity, active));
}

use super::profiler::{FrameProfiler, PhaseTimingSummary};
use super::resolve::resolve_storyboard_in;
use super::systems::{sys_drive_storyboards, StoryboardStats};
use super::types::*;
use crate::active_animations::ActiveAnimations;
use crate::commands::{AnimationCommand, AnimationCommandQueue, AnimationCommandSender};
use crate::compaction::CompactionHeuristic;
use crate::config::RuntimeConfig;
use crate::events::{EventBus, StoryboardEvent};
use crate::status::{AnimationStatus, AnimationStatusReader};
use crate::time::{FrameClock, TimeMs};
use bevy_ecs::prelude::{Entity, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;
use std::borrow::Cow;

// ---------- World container ----------
pub struct EcsWorld {
    pub world: World,
    schedule_frame: Schedule,
    schedule_post: Schedule,
    installed: bool,
}

impl Default for EcsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EcsWorld {
    pub fn new() -> Self {
        Self::with_config(&RuntimeConfig::default())
    }

    pub fn with_config(config: &RuntimeConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(EventBus::default());
        world.insert_resource(FrameClock::new());
        world.insert_resource(AnimationStatus::new());
        let mut ecs =
            Self { world, schedule_frame: Schedule::default(), schedule_post: Schedule::default(), installed: false };
        ecs.install(config);
        ecs
    }

    /// Hooks the storyboard pass into the frame schedule. Re-installing resets the
    /// registry and drops queued commands.
    pub fn install(&mut self, config: &RuntimeConfig) {
        if self.installed {
            self.shutdown();
        }
        self.world.insert_resource(ActiveAnimations::new());
        self.world.insert_resource(AnimationCommandQueue::new());
        self.world.insert_resource(CompactionHeuristic::new(&config.compaction));
        self.world.insert_resource(StoryboardStats::default());
        self.world.insert_resource(FrameProfiler::new());
        let mut schedule_frame = Schedule::default();
        schedule_frame.add_systems(sys_drive_storyboards);
        self.schedule_frame = schedule_frame;
        self.installed = true;
        tracing::debug!(
            debounce_ms = config.compaction.debounce_ms,
            garbage_ratio = config.compaction.garbage_ratio,
            "storyboard driver installed"
        );
    }

    /// Detaches the storyboard pass. Pending commands are discarded and the
    /// registry is dropped; storyboards keep their last active flag.
    pub fn shutdown(&mut self) {
        if !self.installed {
            return;
        }
        let dropped = self.world.remove_resource::<AnimationCommandQueue>().map_or(0, |queue| queue.drain().len());
        let entries = self.world.remove_resource::<ActiveAnimations>().map_or(0, |registry| registry.len());
        self.world.remove_resource::<CompactionHeuristic>();
        self.world.resource::<AnimationStatus>().clear();
        self.schedule_frame = Schedule::default();
        self.installed = false;
        tracing::debug!(dropped, entries, "storyboard driver shut down");
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Runs one frame: the storyboard pass first, then the post-frame hooks.
    pub fn update(&mut self, current_ms: TimeMs, elapsed_ms: TimeMs) {
        self.world.resource_mut::<FrameClock>().set(current_ms, elapsed_ms);
        if self.installed {
            self.schedule_frame.run(&mut self.world);
        }
        self.schedule_post.run(&mut self.world);
    }

    /// Advances the logical clock by `elapsed_ms` and runs a frame.
    pub fn step(&mut self, elapsed_ms: TimeMs) -> TimeMs {
        let current_ms = self.now().saturating_add(elapsed_ms);
        self.update(current_ms, elapsed_ms);
        current_ms
    }

    pub fn now(&self) -> TimeMs {
        self.world.resource::<FrameClock>().current_ms
    }

    /// Systems that must observe this frame's storyboard state, such as the
    /// deactivation animations driven by the state machine.
    pub fn add_post_frame_systems<M>(&mut self, systems: impl IntoSystemConfigs<M>) {
        self.schedule_post.add_systems(systems);
    }

    fn enqueue(&self, command: AnimationCommand) {
        match self.world.get_resource::<AnimationCommandQueue>() {
            Some(queue) => queue.enqueue(command),
            None => tracing::warn!(?command, "storyboard driver not installed, command dropped"),
        }
    }

    /// Queues `scene` for registration under its owning storyboard.
    pub fn register_scene(&self, scene: Entity) -> bool {
        self.enqueue(AnimationCommand::RegisterScene { scene });
        true
    }

    /// Queues removal of the whole entry of the storyboard owning `scene`.
    pub fn unregister_scene(&self, scene: Entity) {
        self.enqueue(AnimationCommand::UnregisterScene { scene });
    }

    pub fn unregister_storyboard(&self, storyboard: Entity) {
        self.enqueue(AnimationCommand::UnregisterStoryboard { storyboard });
    }

    pub fn command_sender(&self) -> Option<AnimationCommandSender> {
        self.world.get_resource::<AnimationCommandQueue>().map(AnimationCommandQueue::sender)
    }

    pub fn pending_commands(&self) -> usize {
        self.world.get_resource::<AnimationCommandQueue>().map_or(0, AnimationCommandQueue::pending)
    }

    pub fn is_storyboard_running(&self, storyboard: Entity) -> bool {
        self.world.get_resource::<ActiveAnimations>().map_or(false, |registry| registry.is_running(storyboard))
    }

    /// Handle answering `is_running` from other threads. It reflects the state
    /// published at the end of the last frame and stays valid across reinstalls.
    pub fn status_reader(&self) -> AnimationStatusReader {
        self.world.resource::<AnimationStatus>().reader()
    }

    pub fn active_animations(&self) -> Option<&ActiveAnimations> {
        self.world.get_resource::<ActiveAnimations>()
    }

    pub fn compaction_requested(&self) -> bool {
        self.world.get_resource::<CompactionHeuristic>().map_or(false, CompactionHeuristic::compaction_requested)
    }

    pub fn resolve_storyboard(&self, scene: Entity) -> Option<Entity> {
        resolve_storyboard_in(&self.world, scene)
    }

    pub fn storyboard(&self, storyboard: Entity) -> Option<&Storyboard> {
        self.world.get::<Storyboard>(storyboard)
    }

    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.world.get::<Name>(entity).map(|name| &*name.0)
    }

    pub fn is_storyboard_active(&self, storyboard: Entity) -> bool {
        self.storyboard(storyboard).map_or(false, Storyboard::is_active)
    }

    pub fn set_storyboard_endless(&mut self, storyboard: Entity, endless: bool) -> bool {
        match self.world.get_mut::<Storyboard>(storyboard) {
            Some(mut board) => {
                board.set_endless(endless);
                true
            }
            None => false,
        }
    }

    pub fn stats(&self) -> StoryboardStats {
        self.world.get_resource::<StoryboardStats>().copied().unwrap_or_default()
    }

    pub fn phase_timings(&self) -> Vec<PhaseTimingSummary> {
        self.world.get_resource::<FrameProfiler>().map(FrameProfiler::summaries).unwrap_or_default()
    }

    pub fn drain_events(&mut self) -> Vec<StoryboardEvent> {
        self.world.resource_mut::<EventBus>().drain()
    }

    // ---------- Scene graph ----------

    /// Spawns a node carrying a storyboard behavior that refers to itself.
    pub fn spawn_storyboard(&mut self, name: impl Into<Cow<'static, str>>, endless: bool) -> Entity {
        let name = name.into();
        let entity = self
            .world
            .spawn((Name(name.clone()), Storyboard::new(name).endless(endless)))
            .id();
        self.world.entity_mut(entity).insert(BehaviorChain::with(Behavior::Storyboard(entity)));
        entity
    }

    /// Spawns a plain node, optionally under `parent`.
    pub fn spawn_node(&mut self, name: impl Into<Cow<'static, str>>, parent: Option<Entity>) -> Entity {
        let entity = self.world.spawn(Name(name.into())).id();
        if let Some(parent) = parent {
            self.world.entity_mut(entity).insert(Parent(parent));
        }
        entity
    }

    /// Spawns a scene animation node as a direct child of `parent`.
    pub fn spawn_scene(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        parent: Entity,
        player: impl ScenePlayer,
    ) -> Entity {
        self.world.spawn((Name(name.into()), SceneAnimation::new(player), Parent(parent))).id()
    }

    pub fn attach_behavior(&mut self, node: Entity, behavior: Behavior) -> bool {
        let Ok(mut node_ref) = self.world.get_entity_mut(node) else {
            return false;
        };
        if let Some(mut chain) = node_ref.get_mut::<BehaviorChain>() {
            chain.push(behavior);
            return true;
        }
        node_ref.insert(BehaviorChain::with(behavior));
        true
    }

    /// Removes a node from the scene graph. Registry entries referring to it
    /// are skipped by the next pass rather than removed here.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity)
    }
}

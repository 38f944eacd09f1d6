use crate::active_animations::ActiveAnimations;
use bevy_ecs::prelude::{Entity, Resource};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

type SharedRunning = Arc<RwLock<HashSet<Entity>>>;

/// Running storyboards as of the end of the last storyboard pass.
///
/// The update thread republishes the set once per frame; readers on other
/// threads may observe the previous frame's state.
#[derive(Resource, Default)]
pub struct AnimationStatus {
    running: SharedRunning,
}

impl AnimationStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, registry: &ActiveAnimations) {
        let mut running = self.running.write().unwrap_or_else(PoisonError::into_inner);
        running.clear();
        running.extend(registry.running_storyboards());
    }

    pub fn clear(&self) {
        self.running.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn reader(&self) -> AnimationStatusReader {
        AnimationStatusReader { running: Arc::clone(&self.running) }
    }
}

/// Read-only view of [`AnimationStatus`] that can be sent to any thread.
#[derive(Clone)]
pub struct AnimationStatusReader {
    running: SharedRunning,
}

impl AnimationStatusReader {
    pub fn is_running(&self, storyboard: Entity) -> bool {
        self.running.read().unwrap_or_else(PoisonError::into_inner).contains(&storyboard)
    }

    pub fn running_count(&self) -> usize {
        self.running.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

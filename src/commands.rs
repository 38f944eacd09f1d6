use bevy_ecs::prelude::{Entity, Resource};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A deferred registry mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationCommand {
    RegisterScene { scene: Entity },
    UnregisterScene { scene: Entity },
    UnregisterStoryboard { storyboard: Entity },
}

type SharedQueue = Arc<Mutex<Vec<AnimationCommand>>>;

fn lock(queue: &SharedQueue) -> MutexGuard<'_, Vec<AnimationCommand>> {
    // Push and take are single calls, so a poisoned vector is still consistent.
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// FIFO of registry mutations, drained once per frame on the update thread.
///
/// Commands enqueued while a drained batch is executing land in the next drain.
#[derive(Resource, Default)]
pub struct AnimationCommandQueue {
    pending: SharedQueue,
}

impl AnimationCommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, command: AnimationCommand) {
        lock(&self.pending).push(command);
    }

    /// Takes every queued command in submission order.
    pub fn drain(&self) -> Vec<AnimationCommand> {
        std::mem::take(&mut *lock(&self.pending))
    }

    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    /// A handle that can enqueue from any thread.
    pub fn sender(&self) -> AnimationCommandSender {
        AnimationCommandSender { pending: Arc::clone(&self.pending) }
    }
}

#[derive(Clone)]
pub struct AnimationCommandSender {
    pending: SharedQueue,
}

impl AnimationCommandSender {
    /// Always acknowledges; resolution failures are logged when the command runs.
    pub fn register_scene(&self, scene: Entity) -> bool {
        self.send(AnimationCommand::RegisterScene { scene });
        true
    }

    pub fn unregister_scene(&self, scene: Entity) {
        self.send(AnimationCommand::UnregisterScene { scene });
    }

    pub fn unregister_storyboard(&self, storyboard: Entity) {
        self.send(AnimationCommand::UnregisterStoryboard { storyboard });
    }

    pub fn send(&self, command: AnimationCommand) {
        lock(&self.pending).push(command);
    }

    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }
}

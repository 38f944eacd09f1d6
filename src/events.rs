use bevy_ecs::prelude::{Entity, Resource};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryboardEvent {
    /// A storyboard's active flag changed and its change notification fired.
    Changed { storyboard: Entity, active: bool },
    /// A registration could not find the owning storyboard of `scene`.
    ResolveFailed { scene: Entity },
    /// The registry had no active entries left and was dropped wholesale.
    RegistryCleared { entries: usize },
    /// The debounced compaction erased `reclaimed` finished entries.
    RegistryCompacted { reclaimed: usize, remaining: usize },
}

impl StoryboardEvent {
    pub fn changed(storyboard: Entity, active: bool) -> Self {
        StoryboardEvent::Changed { storyboard, active }
    }
}

impl fmt::Display for StoryboardEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryboardEvent::Changed { storyboard, active } => {
                write!(f, "Changed storyboard={} active={}", storyboard.index(), active)
            }
            StoryboardEvent::ResolveFailed { scene } => {
                write!(f, "ResolveFailed scene={}", scene.index())
            }
            StoryboardEvent::RegistryCleared { entries } => write!(f, "RegistryCleared entries={entries}"),
            StoryboardEvent::RegistryCompacted { reclaimed, remaining } => {
                write!(f, "RegistryCompacted reclaimed={reclaimed} remaining={remaining}")
            }
        }
    }
}

#[derive(Default, Resource)]
pub struct EventBus {
    events: Vec<StoryboardEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: StoryboardEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<StoryboardEvent> {
        self.events.drain(..).collect()
    }
}

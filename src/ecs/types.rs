use crate::time::TimeMs;
use bevy_ecs::prelude::*;
use smallvec::SmallVec;
use std::borrow::Cow;

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(pub Entity);
#[derive(Component, Clone, Debug)]
pub struct Name(pub Cow<'static, str>);

/// Behaviors attached to a scene-graph node, in attachment order.
#[derive(Clone, Debug, PartialEq)]
pub enum Behavior {
    /// The node owns the storyboard stored on the referenced entity.
    Storyboard(Entity),
    /// Forwards a named trigger to the state machine when the node is activated.
    Trigger(Cow<'static, str>),
    /// Toggles node visibility alongside the parent's activity.
    Visibility { visible: bool },
}

#[derive(Component, Clone, Debug, Default)]
pub struct BehaviorChain(pub SmallVec<[Behavior; 2]>);

impl BehaviorChain {
    pub fn with(behavior: Behavior) -> Self {
        let mut chain = SmallVec::new();
        chain.push(behavior);
        Self(chain)
    }

    pub fn push(&mut self, behavior: Behavior) {
        self.0.push(behavior);
    }

    pub fn first_storyboard(&self) -> Option<Entity> {
        self.0.iter().find_map(|behavior| match behavior {
            Behavior::Storyboard(entity) => Some(*entity),
            _ => None,
        })
    }
}

#[derive(Component, Clone, Debug, Default)]
pub struct Storyboard {
    pub name: Cow<'static, str>,
    active: bool,
    endless: bool,
    revision: u64,
}

impl Storyboard {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn endless(mut self, endless: bool) -> Self {
        self.endless = endless;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_endless(&self) -> bool {
        self.endless
    }

    pub fn set_endless(&mut self, endless: bool) {
        self.endless = endless;
    }

    /// Number of change notifications fired so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
    }
}

/// A running animation that the storyboard driver advances every frame.
pub trait ScenePlayer: Send + Sync + 'static {
    /// Returns `true` while the animation still has work to do.
    fn update(&mut self, current_ms: TimeMs, elapsed_ms: TimeMs) -> bool;
}

impl<F> ScenePlayer for F
where
    F: FnMut(TimeMs, TimeMs) -> bool + Send + Sync + 'static,
{
    fn update(&mut self, current_ms: TimeMs, elapsed_ms: TimeMs) -> bool {
        self(current_ms, elapsed_ms)
    }
}

#[derive(Component)]
pub struct SceneAnimation {
    player: Box<dyn ScenePlayer>,
}

impl SceneAnimation {
    pub fn new(player: impl ScenePlayer) -> Self {
        Self { player: Box::new(player) }
    }

    pub fn update(&mut self, current_ms: TimeMs, elapsed_ms: TimeMs) -> bool {
        self.player.update(current_ms, elapsed_ms)
    }
}

/// Fixed-length playback; loops forever when `looped` is set.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipPlayer {
    pub duration_ms: TimeMs,
    pub looped: bool,
    pub speed: f32,
    elapsed_ms: f64,
}

impl ClipPlayer {
    pub fn new(duration_ms: TimeMs) -> Self {
        Self { duration_ms, looped: false, speed: 1.0, elapsed_ms: 0.0 }
    }

    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.max(0.0);
        self
    }

    /// Normalised playback position in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms as f64).clamp(0.0, 1.0) as f32
    }
}

impl ScenePlayer for ClipPlayer {
    fn update(&mut self, _current_ms: TimeMs, elapsed_ms: TimeMs) -> bool {
        let duration = self.duration_ms as f64;
        if duration <= 0.0 {
            return false;
        }
        let mut time = self.elapsed_ms + elapsed_ms as f64 * self.speed as f64;
        if self.looped {
            time = time.rem_euclid(duration);
            self.elapsed_ms = time;
            return true;
        }
        self.elapsed_ms = time.min(duration);
        time < duration
    }
}

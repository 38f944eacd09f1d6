use crate::commands::AnimationCommand;
use crate::ecs::{Behavior, BehaviorChain, ClipPlayer, EcsWorld};
use crate::time::TimeMs;
use anyhow::{Context, Result};
use bevy_ecs::prelude::Entity;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Declarative storyboard layout plus a timed list of registry cues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryboardScene {
    #[serde(default)]
    pub storyboards: Vec<StoryboardData>,
    /// Scenes spawned without an owning storyboard.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detached_scenes: Vec<SceneClipData>,
    #[serde(default)]
    pub cues: Vec<CueData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryboardData {
    pub name: String,
    #[serde(default)]
    pub endless: bool,
    /// Behaviors attached ahead of the storyboard behavior on the same node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behaviors: Vec<BehaviorData>,
    #[serde(default)]
    pub scenes: Vec<SceneClipData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BehaviorData {
    Trigger { name: String },
    Visibility { visible: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneClipData {
    pub name: String,
    pub duration_ms: TimeMs,
    #[serde(default)]
    pub looped: bool,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

const fn default_speed() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueData {
    pub at_ms: TimeMs,
    #[serde(flatten)]
    pub action: CueAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CueAction {
    RegisterScene { scene: String },
    UnregisterScene { scene: String },
    UnregisterStoryboard { storyboard: String },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("duplicate storyboard name '{0}'")]
    DuplicateStoryboard(String),
    #[error("duplicate scene name '{0}'")]
    DuplicateScene(String),
    #[error("cue at {at_ms}ms refers to unknown scene '{name}'")]
    UnknownScene { at_ms: TimeMs, name: String },
    #[error("cue at {at_ms}ms refers to unknown storyboard '{name}'")]
    UnknownStoryboard { at_ms: TimeMs, name: String },
}

/// Registry command scheduled for a logical timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub at_ms: TimeMs,
    pub command: AnimationCommand,
}

/// Entities created by [`StoryboardScene::spawn_into`].
#[derive(Debug, Clone, Default)]
pub struct SpawnedScene {
    pub storyboards: BTreeMap<String, Entity>,
    pub scenes: BTreeMap<String, Entity>,
    cues: Vec<Cue>,
    next_cue: usize,
}

impl StoryboardScene {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read scene file {}", path.display()))?;
        Self::from_json_slice(&bytes).with_context(|| format!("Failed to parse scene file {}", path.display()))
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks names and cue references without touching any world.
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut storyboards = HashSet::new();
        let mut scenes = HashSet::new();
        for board in &self.storyboards {
            if !storyboards.insert(board.name.as_str()) {
                return Err(SceneError::DuplicateStoryboard(board.name.clone()));
            }
            for scene in &board.scenes {
                if !scenes.insert(scene.name.as_str()) {
                    return Err(SceneError::DuplicateScene(scene.name.clone()));
                }
            }
        }
        for scene in &self.detached_scenes {
            if !scenes.insert(scene.name.as_str()) {
                return Err(SceneError::DuplicateScene(scene.name.clone()));
            }
        }
        for cue in &self.cues {
            match &cue.action {
                CueAction::RegisterScene { scene } | CueAction::UnregisterScene { scene } => {
                    if !scenes.contains(scene.as_str()) {
                        return Err(SceneError::UnknownScene { at_ms: cue.at_ms, name: scene.clone() });
                    }
                }
                CueAction::UnregisterStoryboard { storyboard } => {
                    if !storyboards.contains(storyboard.as_str()) {
                        return Err(SceneError::UnknownStoryboard {
                            at_ms: cue.at_ms,
                            name: storyboard.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Builds the node hierarchy in `ecs`: one node per storyboard owning its
    /// scene nodes as direct children.
    pub fn spawn_into(&self, ecs: &mut EcsWorld) -> Result<SpawnedScene, SceneError> {
        self.validate()?;
        let mut spawned = SpawnedScene::default();
        for board in &self.storyboards {
            let entity = ecs.spawn_storyboard(Cow::Owned(board.name.clone()), board.endless);
            if !board.behaviors.is_empty() {
                let mut chain: SmallVec<[Behavior; 2]> =
                    board.behaviors.iter().map(BehaviorData::to_behavior).collect();
                chain.push(Behavior::Storyboard(entity));
                ecs.world.entity_mut(entity).insert(BehaviorChain(chain));
            }
            spawned.storyboards.insert(board.name.clone(), entity);
            for scene in &board.scenes {
                let scene_entity = ecs.spawn_scene(Cow::Owned(scene.name.clone()), entity, scene.player());
                spawned.scenes.insert(scene.name.clone(), scene_entity);
            }
        }
        if !self.detached_scenes.is_empty() {
            let holder = ecs.spawn_node("detached", None);
            for scene in &self.detached_scenes {
                let scene_entity = ecs.spawn_scene(Cow::Owned(scene.name.clone()), holder, scene.player());
                spawned.scenes.insert(scene.name.clone(), scene_entity);
            }
        }
        let mut cues: Vec<Cue> = self
            .cues
            .iter()
            .map(|cue| {
                let command = match &cue.action {
                    CueAction::RegisterScene { scene } => {
                        AnimationCommand::RegisterScene { scene: spawned.scenes[scene.as_str()] }
                    }
                    CueAction::UnregisterScene { scene } => {
                        AnimationCommand::UnregisterScene { scene: spawned.scenes[scene.as_str()] }
                    }
                    CueAction::UnregisterStoryboard { storyboard } => AnimationCommand::UnregisterStoryboard {
                        storyboard: spawned.storyboards[storyboard.as_str()],
                    },
                };
                Cue { at_ms: cue.at_ms, command }
            })
            .collect();
        cues.sort_by_key(|cue| cue.at_ms);
        spawned.cues = cues;
        Ok(spawned)
    }
}

impl BehaviorData {
    fn to_behavior(&self) -> Behavior {
        match self {
            BehaviorData::Trigger { name } => Behavior::Trigger(Cow::Owned(name.clone())),
            BehaviorData::Visibility { visible } => Behavior::Visibility { visible: *visible },
        }
    }
}

impl SceneClipData {
    fn player(&self) -> ClipPlayer {
        ClipPlayer::new(self.duration_ms).looped(self.looped).with_speed(self.speed)
    }
}

impl SpawnedScene {
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn remaining_cues(&self) -> usize {
        self.cues.len() - self.next_cue
    }

    /// Enqueues every cue due at or before `now_ms`; returns how many were sent.
    pub fn dispatch_due(&mut self, ecs: &EcsWorld, now_ms: TimeMs) -> usize {
        let mut sent = 0;
        while let Some(cue) = self.cues.get(self.next_cue) {
            if cue.at_ms > now_ms {
                break;
            }
            match cue.command {
                AnimationCommand::RegisterScene { scene } => {
                    ecs.register_scene(scene);
                }
                AnimationCommand::UnregisterScene { scene } => ecs.unregister_scene(scene),
                AnimationCommand::UnregisterStoryboard { storyboard } => ecs.unregister_storyboard(storyboard),
            }
            self.next_cue += 1;
            sent += 1;
        }
        sent
    }
}

use super::types::{BehaviorChain, Parent, SceneAnimation};
use bevy_ecs::prelude::*;

/// Finds the storyboard owning `scene`.
///
/// Storyboards own their scenes as direct structural children: the scene node's
/// parent carries the behavior chain holding the storyboard.
pub fn resolve_storyboard(
    scene: Entity,
    scenes: &Query<&mut SceneAnimation>,
    parents: &Query<&Parent>,
    chains: &Query<&BehaviorChain>,
) -> Option<Entity> {
    if !scenes.contains(scene) {
        return None;
    }
    let Parent(owner) = *parents.get(scene).ok()?;
    chains.get(owner).ok()?.first_storyboard()
}

/// Same lookup as [`resolve_storyboard`] against a plain `World`.
pub fn resolve_storyboard_in(world: &World, scene: Entity) -> Option<Entity> {
    world.get::<SceneAnimation>(scene)?;
    let Parent(owner) = *world.get::<Parent>(scene)?;
    world.get::<BehaviorChain>(owner)?.first_storyboard()
}

use bevy_ecs::prelude::{Entity, Resource};
use smallvec::SmallVec;
use std::collections::HashMap;

pub type SceneList = SmallVec<[Entity; 4]>;

/// Outcome of a single traversal over the registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Entries that still had at least one running scene.
    pub active: usize,
    /// Entries visited, finished ones included.
    pub total: usize,
    /// Entries erased during this pass (only non-zero for compacting passes).
    pub reclaimed: usize,
    /// Scene references that no longer resolved to a live animation.
    pub skipped: usize,
    /// Storyboards whose last running scene finished during this pass.
    pub finished: Vec<Entity>,
}

impl FrameReport {
    /// True when fewer than `1 / ratio` of the visited entries are still active.
    pub fn garbage_overflow(&self, ratio: usize) -> bool {
        self.active.saturating_mul(ratio) < self.total
    }
}

/// Storyboards that currently own running scene animations.
///
/// Finished entries are emptied in place and only dropped by [`ActiveAnimations::clear`]
/// or by a compacting [`ActiveAnimations::advance`], so a storyboard that just
/// finished stays visible as an empty entry until the next reclaim.
#[derive(Resource, Clone, Debug, Default)]
pub struct ActiveAnimations {
    entries: HashMap<Entity, SceneList>,
}

impl ActiveAnimations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `scene` under `storyboard`. Returns `true` when the storyboard had no
    /// running scenes before, i.e. this registration activates it.
    pub fn insert_scene(&mut self, storyboard: Entity, scene: Entity) -> bool {
        let scenes = self.entries.entry(storyboard).or_default();
        let activated = scenes.is_empty();
        if !scenes.contains(&scene) {
            scenes.push(scene);
        }
        activated
    }

    pub fn remove_storyboard(&mut self, storyboard: Entity) -> Option<SceneList> {
        self.entries.remove(&storyboard)
    }

    pub fn is_running(&self, storyboard: Entity) -> bool {
        self.entries.get(&storyboard).map_or(false, |scenes| !scenes.is_empty())
    }

    pub fn contains(&self, storyboard: Entity) -> bool {
        self.entries.contains_key(&storyboard)
    }

    pub fn scenes(&self, storyboard: Entity) -> Option<&[Entity]> {
        self.entries.get(&storyboard).map(|scenes| scenes.as_slice())
    }

    pub fn storyboards(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entries.keys().copied()
    }

    /// Storyboards whose entry still holds at least one scene.
    pub fn running_storyboards(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entries.iter().filter(|(_, scenes)| !scenes.is_empty()).map(|(&storyboard, _)| storyboard)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Swaps in `other` wholesale and hands back the previous contents.
    pub fn replace_with(&mut self, other: ActiveAnimations) -> ActiveAnimations {
        std::mem::replace(self, other)
    }

    /// Advances every registered scene once.
    ///
    /// `update_scene` returns `Some(true)` while a scene keeps running, `Some(false)`
    /// once it finished and `None` when the reference is stale. When `compact` is set
    /// finished entries are erased in the same pass instead of lingering empty.
    pub fn advance<F>(&mut self, mut update_scene: F, compact: bool) -> FrameReport
    where
        F: FnMut(Entity) -> Option<bool>,
    {
        let mut report = FrameReport::default();
        self.entries.retain(|&storyboard, scenes| {
            report.total += 1;
            let mut running = false;
            for &scene in scenes.iter() {
                match update_scene(scene) {
                    Some(true) => running = true,
                    Some(false) => {}
                    None => report.skipped += 1,
                }
            }
            if running {
                report.active += 1;
                return true;
            }
            if !scenes.is_empty() {
                scenes.clear();
                report.finished.push(storyboard);
            }
            if compact {
                report.reclaimed += 1;
                false
            } else {
                true
            }
        });
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn first_scene_activates_storyboard() {
        let mut registry = ActiveAnimations::new();
        assert!(registry.insert_scene(entity(1), entity(10)));
        assert!(!registry.insert_scene(entity(1), entity(11)), "sibling scene must not re-activate");
        assert!(!registry.insert_scene(entity(1), entity(10)));
        assert_eq!(registry.scenes(entity(1)), Some(&[entity(10), entity(11)][..]));
    }

    #[test]
    fn empty_entry_counts_as_fresh_activation() {
        let mut registry = ActiveAnimations::new();
        registry.insert_scene(entity(1), entity(10));
        let report = registry.advance(|_| Some(false), false);
        assert_eq!(report.finished, vec![entity(1)]);
        assert!(registry.contains(entity(1)));
        assert!(registry.insert_scene(entity(1), entity(12)), "lingering empty entry restarts");
    }

    #[test]
    fn advance_keeps_entry_alive_while_any_scene_runs() {
        let mut registry = ActiveAnimations::new();
        registry.insert_scene(entity(1), entity(10));
        registry.insert_scene(entity(1), entity(11));
        let report = registry.advance(|scene| Some(scene == entity(11)), false);
        assert_eq!((report.active, report.total), (1, 1));
        assert!(report.finished.is_empty());
        assert!(registry.is_running(entity(1)));
    }

    #[test]
    fn finished_entries_only_reported_once() {
        let mut registry = ActiveAnimations::new();
        registry.insert_scene(entity(1), entity(10));
        let first = registry.advance(|_| Some(false), false);
        let second = registry.advance(|_| Some(false), false);
        assert_eq!(first.finished, vec![entity(1)]);
        assert!(second.finished.is_empty());
        assert_eq!((second.active, second.total), (0, 1));
    }

    #[test]
    fn stale_scene_references_are_skipped() {
        let mut registry = ActiveAnimations::new();
        registry.insert_scene(entity(1), entity(10));
        registry.insert_scene(entity(1), entity(11));
        registry.insert_scene(entity(2), entity(20));
        let report = registry.advance(
            |scene| match scene.index() {
                10 => None,
                11 => Some(true),
                _ => None,
            },
            false,
        );
        assert_eq!(report.skipped, 2);
        assert_eq!((report.active, report.total), (1, 2));
        assert_eq!(report.finished, vec![entity(2)]);
    }

    #[test]
    fn compacting_pass_erases_finished_entries() {
        let mut registry = ActiveAnimations::new();
        for index in 0..6 {
            registry.insert_scene(entity(index), entity(100 + index));
        }
        let report = registry.advance(|scene| Some(scene == entity(100)), true);
        assert_eq!(report.reclaimed, 5);
        assert_eq!(registry.len(), 1);
        let remaining: HashSet<Entity> = registry.storyboards().collect();
        assert!(remaining.contains(&entity(0)));
    }

    #[test]
    fn replace_with_returns_previous_contents() {
        let mut registry = ActiveAnimations::new();
        registry.insert_scene(entity(1), entity(10));
        let mut other = ActiveAnimations::new();
        other.insert_scene(entity(2), entity(20));
        let previous = registry.replace_with(other);
        assert!(previous.is_running(entity(1)));
        assert!(!registry.contains(entity(1)));
        assert!(registry.is_running(entity(2)));
    }

    #[test]
    fn garbage_overflow_is_a_ratio_test() {
        let report = FrameReport { active: 1, total: 5, ..FrameReport::default() };
        assert!(!report.garbage_overflow(5));
        let report = FrameReport { active: 1, total: 6, ..FrameReport::default() };
        assert!(report.garbage_overflow(5));
        let report = FrameReport { active: 20, total: 100, ..FrameReport::default() };
        assert!(!report.garbage_overflow(5));
    }
}

pub mod active_animations;
pub mod cli;
pub mod commands;
pub mod compaction;
pub mod config;
pub mod ecs;
pub mod events;
pub mod scene;
pub mod status;
pub mod time;

pub use active_animations::{ActiveAnimations, FrameReport};
pub use commands::{AnimationCommand, AnimationCommandQueue, AnimationCommandSender};
pub use compaction::{CompactionHeuristic, ReclaimAction};
pub use ecs::EcsWorld;
pub use events::StoryboardEvent;
pub use status::{AnimationStatus, AnimationStatusReader};
pub use time::TimeMs;

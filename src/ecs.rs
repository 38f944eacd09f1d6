pub mod profiler;
pub mod resolve;
pub mod systems;
mod types;
mod world;

pub use profiler::{FrameProfiler, PhaseTimingSummary};
pub use resolve::{resolve_storyboard, resolve_storyboard_in};
pub use systems::{sys_drive_storyboards, StoryboardStats};
pub use types::*;
pub use world::EcsWorld;

mod storyboards;

pub use storyboards::*;

use crate::config::RuntimeOverrides;
use crate::time::TimeMs;
use clap::Parser;
use std::path::PathBuf;

/// Drives a storyboard scene description frame by frame and reports what the
/// registry did.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "storyboard_sim", version)]
pub struct SimArgs {
    /// Scene description JSON.
    pub scene: PathBuf,

    /// Runtime config JSON; defaults are used when omitted or unreadable.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Logical milliseconds per frame.
    #[arg(long = "step-ms", value_parser = clap::value_parser!(u64).range(1..))]
    pub step_ms: Option<TimeMs>,

    /// How long garbage overflow must persist before compaction.
    #[arg(long = "debounce-ms")]
    pub debounce_ms: Option<TimeMs>,

    /// Print per-phase timings after the run.
    #[arg(long, default_value_t = false)]
    pub timings: bool,

    /// Stop as soon as every cue ran and no storyboard is running.
    #[arg(long, default_value_t = false)]
    pub until_idle: bool,
}

impl SimArgs {
    pub fn overrides(&self) -> RuntimeOverrides {
        RuntimeOverrides { debounce_ms: self.debounce_ms, step_ms: self.step_ms, max_frames: self.frames }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scene_and_overrides() {
        let args = SimArgs::try_parse_from([
            "storyboard_sim",
            "scene.json",
            "--frames",
            "120",
            "--step-ms",
            "20",
            "--debounce-ms",
            "500",
        ])
        .expect("parse args");
        assert_eq!(args.scene, PathBuf::from("scene.json"));
        let overrides = args.overrides();
        assert_eq!(overrides.applied_fields(), vec!["debounce_ms", "step_ms", "max_frames"]);
        assert_eq!(overrides.step_ms, Some(20));
    }

    #[test]
    fn overrides_empty_without_flags() {
        let args = SimArgs::try_parse_from(["storyboard_sim", "scene.json"]).expect("parse args");
        assert!(args.overrides().is_empty());
        assert!(!args.timings);
    }

    #[test]
    fn missing_scene_errors() {
        assert!(SimArgs::try_parse_from(["storyboard_sim"]).is_err(), "scene path is required");
    }

    #[test]
    fn rejects_zero_step() {
        let err = SimArgs::try_parse_from(["storyboard_sim", "scene.json", "--step-ms", "0"]);
        assert!(err.is_err(), "a zero step would never advance the clock");
    }

    #[test]
    fn rejects_unknown_flags() {
        let err = SimArgs::try_parse_from(["storyboard_sim", "scene.json", "--foo", "bar"]);
        assert!(err.is_err(), "unknown flags should error");
    }
}

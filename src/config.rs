use crate::time::TimeMs;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompactionConfig {
    /// How long garbage overflow has to persist before the registry is compacted.
    #[serde(default = "CompactionConfig::default_debounce_ms")]
    pub debounce_ms: TimeMs,
    /// Overflow is flagged when `active * garbage_ratio < total`.
    #[serde(default = "CompactionConfig::default_garbage_ratio")]
    pub garbage_ratio: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrameConfig {
    #[serde(default = "FrameConfig::default_step_ms")]
    pub step_ms: TimeMs,
    #[serde(default = "FrameConfig::default_max_frames")]
    pub max_frames: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub compaction: CompactionConfig,
    #[serde(default)]
    pub frame: FrameConfig,
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub debounce_ms: Option<TimeMs>,
    pub step_ms: Option<TimeMs>,
    pub max_frames: Option<u32>,
}

impl CompactionConfig {
    const fn default_debounce_ms() -> TimeMs {
        10_000
    }

    const fn default_garbage_ratio() -> usize {
        5
    }
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self { debounce_ms: Self::default_debounce_ms(), garbage_ratio: Self::default_garbage_ratio() }
    }
}

impl FrameConfig {
    const fn default_step_ms() -> TimeMs {
        16
    }

    const fn default_max_frames() -> u32 {
        600
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { step_ms: Self::default_step_ms(), max_frames: Self::default_max_frames() }
    }
}

impl RuntimeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &RuntimeOverrides) {
        if let Some(debounce_ms) = overrides.debounce_ms {
            self.compaction.debounce_ms = debounce_ms;
        }
        if let Some(step_ms) = overrides.step_ms {
            self.frame.step_ms = step_ms;
        }
        if let Some(max_frames) = overrides.max_frames {
            self.frame.max_frames = max_frames;
        }
    }
}

impl RuntimeOverrides {
    pub fn is_empty(&self) -> bool {
        self.debounce_ms.is_none() && self.step_ms.is_none() && self.max_frames.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.debounce_ms.is_some() {
            fields.push("debounce_ms");
        }
        if self.step_ms.is_some() {
            fields.push("step_ms");
        }
        if self.max_frames.is_some() {
            fields.push("max_frames");
        }
        fields
    }
}

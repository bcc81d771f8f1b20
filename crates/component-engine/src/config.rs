#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Runtime tuning knobs. Everything has a usable default.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct EngineConfig {
    /// Upper bound on render passes in one `flush`. Updates that keep
    /// scheduling each other past this bound fail with `RenderLoop`.
    pub max_render_passes: usize,
    /// Turn hook-order warnings into `HookOrder` errors.
    pub strict_hooks: bool,
    /// Measure per-instance render durations.
    pub track_render_time: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_render_passes: 64,
            strict_hooks: false,
            track_render_time: true,
        }
    }
}

impl EngineConfig {
    pub fn strict() -> Self {
        Self {
            strict_hooks: true,
            ..Self::default()
        }
    }
}

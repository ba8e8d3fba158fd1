//! Runtime configuration for a simulated RAM instance.

/// Default ceiling on the number of blocks one instance may register.
pub const DEFAULT_MAX_BLOCKS: usize = 128;

/// Default number of leading row bytes logged after a successful load.
pub const DEFAULT_PREVIEW_BYTES: usize = 4;

/// Immutable configuration for a [`crate::SimRam`] instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RamConfig {
    /// Maximum number of blocks the registry accepts.
    pub max_blocks: usize,
    /// Leading bytes of the target row included in the post-load debug log.
    pub preview_bytes: usize,
}

impl Default for RamConfig {
    fn default() -> Self {
        Self {
            max_blocks: DEFAULT_MAX_BLOCKS,
            preview_bytes: DEFAULT_PREVIEW_BYTES,
        }
    }
}

impl RamConfig {
    /// Returns a copy of this configuration with a different block ceiling.
    #[must_use]
    pub const fn with_max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = max_blocks;
        self
    }
}

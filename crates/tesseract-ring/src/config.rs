//! Ring configuration.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default bound on in-flight frames per channel.
///
/// Only one token exists, so a channel never holds more than a handful of
/// frames; the bound just keeps a runaway sender from growing memory.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Default largest dimension a run will launch (`16 · 2^16` channels).
pub const DEFAULT_MAX_DIMENSION: u32 = 16;

/// Configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingConfig {
    /// Hypercube dimension `n`.
    pub dimension: u32,

    /// Directory under which the `<n>/` artifact directory is created.
    pub output_root: PathBuf,

    /// Bounded capacity of every channel.
    pub channel_capacity: usize,

    /// Base seed for neighbour choice. `None` draws from OS entropy.
    ///
    /// Each worker mixes its vertex id into the seed so that vertices do not
    /// all pick the same dimension sequence.
    pub seed: Option<u64>,

    /// Launch refuses dimensions above this with `ResourceExhausted`.
    pub max_dimension: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            dimension: 1,
            output_root: PathBuf::from("."),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            seed: None,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl RingConfig {
    /// Create a config for a cube of dimension `n` with default settings.
    #[must_use]
    pub fn new(dimension: u32) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    /// Set the cube dimension.
    #[must_use]
    pub fn with_dimension(mut self, dimension: u32) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the directory the artifact directory is created under.
    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Set the per-channel capacity.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Make neighbour choice reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the largest dimension a launch accepts.
    #[must_use]
    pub fn with_max_dimension(mut self, max: u32) -> Self {
        self.max_dimension = max;
        self
    }

    /// Directory holding the per-vertex artifacts: `<output_root>/<n>`.
    pub fn artifact_dir(&self) -> PathBuf {
        self.output_root.join(self.dimension.to_string())
    }

    /// Check values that would otherwise fail deep inside a launch.
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(Error::Usage("channel capacity must be at least 1".into()));
        }
        if self.dimension > self.max_dimension {
            return Err(Error::ResourceExhausted(format!(
                "a {}-cube needs {}·2^{} channels; the limit is dimension {}",
                self.dimension, self.dimension, self.dimension, self.max_dimension
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let config = RingConfig::new(3)
            .with_output_root("/tmp/out")
            .with_channel_capacity(4)
            .with_seed(7);
        assert_eq!(config.dimension, 3);
        assert_eq!(config.channel_capacity, 4);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.artifact_dir(), PathBuf::from("/tmp/out/3"));
    }

    #[test]
    fn validate_rejects_zero_capacity() {
        let config = RingConfig::new(2).with_channel_capacity(0);
        assert!(matches!(config.validate(), Err(Error::Usage(_))));
    }

    #[test]
    fn validate_rejects_oversized_cube() {
        let config = RingConfig::new(10).with_max_dimension(8);
        assert!(matches!(config.validate(), Err(Error::ResourceExhausted(_))));
        assert!(RingConfig::new(8).with_max_dimension(8).validate().is_ok());
    }
}

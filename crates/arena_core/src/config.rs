//! Arena configuration.
//!
//! Configuration is layered: built-in defaults, then an optional RON file,
//! then whatever the caller overrides. Every field is optional in the file.
//!
//! ```ron
//! (
//!     world: (min_x: 0.0, max_x: 500.0, min_y: 0.0, max_y: 500.0),
//!     population: 30,
//!     timing: (move_interval_ms: 200),
//!     seed: Some(42),
//! )
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::kind::{Kind, KindTable};
use crate::math::Bounds;

/// Default number of entities created at session start.
pub const DEFAULT_POPULATION: usize = 50;

/// Default session length in seconds.
pub const DEFAULT_SESSION_SECS: u64 = 30;

/// Periods for the three session actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Mover period.
    pub move_interval_ms: u64,
    /// Resolver period between passes.
    pub combat_interval_ms: u64,
    /// Upper bound on one resolver wait for pending work.
    pub resolver_wait_ms: u64,
    /// Reporter period.
    pub display_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            move_interval_ms: 300,
            combat_interval_ms: 50,
            resolver_wait_ms: 100,
            display_interval_ms: 1000,
        }
    }
}

impl TimingConfig {
    /// Mover period.
    #[must_use]
    pub fn move_interval(&self) -> Duration {
        Duration::from_millis(self.move_interval_ms)
    }

    /// Resolver period.
    #[must_use]
    pub fn combat_interval(&self) -> Duration {
        Duration::from_millis(self.combat_interval_ms)
    }

    /// Resolver wait bound.
    #[must_use]
    pub fn resolver_wait(&self) -> Duration {
        Duration::from_millis(self.resolver_wait_ms)
    }

    /// Reporter period.
    #[must_use]
    pub fn display_interval(&self) -> Duration {
        Duration::from_millis(self.display_interval_ms)
    }
}

/// Complete arena configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// World bounds.
    pub world: Bounds,
    /// Entities created at session start.
    pub population: usize,
    /// Per-kind movement and reach.
    pub kinds: KindTable,
    /// Actor periods.
    pub timing: TimingConfig,
    /// Master seed; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            world: Bounds::default(),
            population: DEFAULT_POPULATION,
            kinds: KindTable::default(),
            timing: TimingConfig::default(),
            seed: None,
        }
    }
}

impl ArenaConfig {
    /// Load and validate a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a configuration from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: ArenaConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration describes a usable arena.
    pub fn validate(&self) -> Result<()> {
        if !self.world.is_valid() {
            return Err(ArenaError::InvalidConfig(format!(
                "world bounds must be finite and non-empty, got {:?}",
                self.world
            )));
        }
        for kind in Kind::ALL {
            let traits = self.kinds.get(kind);
            if !(traits.move_step > 0.0 && traits.move_step.is_finite()) {
                return Err(ArenaError::InvalidConfig(format!(
                    "{kind} move_step must be positive, got {}",
                    traits.move_step
                )));
            }
            if !(traits.attack_reach > 0.0 && traits.attack_reach.is_finite()) {
                return Err(ArenaError::InvalidConfig(format!(
                    "{kind} attack_reach must be positive, got {}",
                    traits.attack_reach
                )));
            }
        }
        let timing = &self.timing;
        if timing.move_interval_ms == 0
            || timing.resolver_wait_ms == 0
            || timing.display_interval_ms == 0
        {
            return Err(ArenaError::InvalidConfig(
                "move, resolver wait and display intervals must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

//! Battle session configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it wants
//! to change:
//!
//! ```
//! use battle_sync::core::BattleConfig;
//!
//! let config = BattleConfig::from_toml_str("speed = 2.0\nseed = 7").unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.speed, 2.0);
//! assert_eq!(config.send_grace_ms, BattleConfig::default().send_grace_ms);
//! ```

use serde::{Deserialize, Serialize};

use super::error::SyncError;
use crate::sync::message::PROTOCOL_VERSION;
use crate::sync::timing::{MAX_SPEED, MIN_SPEED};

/// Per-peer battle configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Seed for the host's battle RNG. Ignored on the guest.
    pub seed: u64,

    /// Local animation speed multiplier (1.0 = normal, 2.0 = twice as fast).
    /// Clamped to `[MIN_SPEED, MAX_SPEED]`.
    pub speed: f64,

    /// Fixed wait between sending an action and starting the host's own
    /// animation. Not speed adjusted.
    pub send_grace_ms: u64,

    /// Maximum combat log lines kept (0 = unlimited).
    pub combat_log_capacity: usize,

    /// Wire protocol version stamped on outbound envelopes and required on
    /// inbound ones.
    pub protocol_version: u16,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            speed: 1.0,
            send_grace_ms: 40,
            combat_log_capacity: 0,
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

impl BattleConfig {
    /// Parse from TOML, filling missing keys with defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, SyncError> {
        let config: Self = toml::from_str(text)?;
        Ok(config.validated())
    }

    /// Clamp out-of-range values.
    #[must_use]
    pub fn validated(mut self) -> Self {
        if !self.speed.is_finite() {
            self.speed = 1.0;
        }
        self.speed = self.speed.clamp(MIN_SPEED, MAX_SPEED);
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the animation speed multiplier.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self.validated()
    }

    /// Set the post-send grace period.
    pub fn with_send_grace(mut self, ms: u64) -> Self {
        self.send_grace_ms = ms;
        self
    }

    /// Cap the combat log length.
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.combat_log_capacity = capacity;
        self
    }
}

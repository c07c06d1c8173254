//! Materialization settings.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{EngineError, Result};

/// How newly generated diffusions are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Confirm new diffusions unless they are late imports or overlap
    /// another program's broadcast.
    #[default]
    Auto,
    /// Every generated diffusion waits for operator confirmation.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Occurrences starting more than this many days before "now" are
    /// created as unconfirmed.
    pub grace_days: i64,
    pub approval: ApprovalMode,
    pub dst_policy: DstPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grace_days: 20,
            approval: ApprovalMode::Auto,
            dst_policy: DstPolicy::WallClock,
        }
    }
}

impl EngineConfig {
    /// # Errors
    /// Returns `EngineError::InvalidConfig` for a negative or out-of-range
    /// `grace_days`.
    pub fn grace_window(&self) -> Result<Duration> {
        if self.grace_days < 0 {
            return Err(EngineError::InvalidConfig(format!(
                "grace_days must not be negative, got {}",
                self.grace_days
            )));
        }
        Duration::try_days(self.grace_days).ok_or_else(|| {
            EngineError::InvalidConfig(format!("grace_days out of range: {}", self.grace_days))
        })
    }

    /// Occurrences starting strictly before this instant are late imports.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfig` when the grace window is invalid or
    /// reaches past the earliest representable instant.
    pub fn late_cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        now.checked_sub_signed(self.grace_window()?).ok_or_else(|| {
            EngineError::InvalidConfig(format!(
                "grace_days {} reaches before the earliest supported date",
                self.grace_days
            ))
        })
    }
}

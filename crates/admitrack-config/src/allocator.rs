//! Admission-number allocator policies.
//!
//! Two trade-offs of the allocator are configuration rather than hidden
//! behavior:
//!
//! - `ADMISSION_OVERFLOW_POLICY`: what `generate` does once a course's serial
//!   range is exhausted. `reject` (default) fails the allocation, `warn` logs a
//!   warning and still returns the over-wide number.
//! - `ADMISSION_REGENERATION_MODE`: how bulk renumbering commits. `atomic`
//!   (default) applies the whole batch in one transaction, `per_record`
//!   commits each student on its own and logs failures.
//!
//! Unrecognised values fall back to the defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    #[default]
    Reject,
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationMode {
    #[default]
    Atomic,
    PerRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicy(pub String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown policy value '{}'", self.0)
    }
}

impl std::error::Error for UnknownPolicy {}

impl FromStr for OverflowPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "warn" => Ok(Self::Warn),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl FromStr for RegenerationMode {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "atomic" => Ok(Self::Atomic),
            "per_record" => Ok(Self::PerRecord),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => f.write_str("reject"),
            Self::Warn => f.write_str("warn"),
        }
    }
}

impl fmt::Display for RegenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic => f.write_str("atomic"),
            Self::PerRecord => f.write_str("per_record"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorConfig {
    pub overflow_policy: OverflowPolicy,
    pub regeneration_mode: RegenerationMode,
}

impl AllocatorConfig {
    pub fn from_env() -> Self {
        let overflow_policy = env::var("ADMISSION_OVERFLOW_POLICY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let regeneration_mode = env::var("ADMISSION_REGENERATION_MODE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            overflow_policy,
            regeneration_mode,
        }
    }

    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    pub fn with_regeneration_mode(mut self, mode: RegenerationMode) -> Self {
        self.regeneration_mode = mode;
        self
    }
}

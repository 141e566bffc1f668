//! Turns the per-frame in-hoop count into hit emissions and a draw style.

use crate::error::ParseSettingError;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Points that must be inside the hoop (strictly more than this) for a hit.
pub const DEFAULT_HIT_THRESHOLD: usize = 100;

/// When a frame above threshold produces an emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitPolicy {
    /// Every frame above threshold emits.
    #[default]
    Level,
    /// Only the frame that crosses from below to above emits.
    Edge,
    /// At most one emission per interval while above threshold.
    Cooldown(Duration),
}

impl FromStr for HitPolicy {
    type Err = ParseSettingError;

    /// Accepts `level`, `edge` or `cooldown=<millis>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSettingError {
            kind: "hit policy",
            value: s.to_owned(),
            expected: "level, edge, cooldown=<millis>",
        };
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "level" => Ok(Self::Level),
            "edge" => Ok(Self::Edge),
            other => {
                let ms = other
                    .strip_prefix("cooldown=")
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or_else(err)?;
                Ok(Self::Cooldown(Duration::from_millis(ms)))
            }
        }
    }
}

impl fmt::Display for HitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level => f.write_str("level"),
            Self::Edge => f.write_str("edge"),
            Self::Cooldown(d) => write!(f, "cooldown={}", d.as_millis()),
        }
    }
}

/// Visual cue for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoopStyle {
    /// Drawn filled while enough points are inside.
    Filled,
    Outline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitDecision {
    pub above_threshold: bool,
    pub emit: bool,
    pub style: HoopStyle,
}

#[derive(Debug, Clone)]
pub struct HitReporter {
    threshold: usize,
    policy: HitPolicy,
    was_above: bool,
    last_emit: Option<Instant>,
}

impl HitReporter {
    pub fn new(threshold: usize, policy: HitPolicy) -> Self {
        Self {
            threshold,
            policy,
            was_above: false,
            last_emit: None,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn policy(&self) -> HitPolicy {
        self.policy
    }

    pub fn evaluate(&mut self, hit_count: usize, now: Instant) -> HitDecision {
        let above = hit_count > self.threshold;
        let emit = above
            && match self.policy {
                HitPolicy::Level => true,
                HitPolicy::Edge => !self.was_above,
                HitPolicy::Cooldown(interval) => self
                    .last_emit
                    .map_or(true, |t| now.saturating_duration_since(t) >= interval),
            };

        self.was_above = above;
        if emit {
            self.last_emit = Some(now);
        }

        HitDecision {
            above_threshold: above,
            emit,
            style: if above {
                HoopStyle::Filled
            } else {
                HoopStyle::Outline
            },
        }
    }
}

impl Default for HitReporter {
    fn default() -> Self {
        Self::new(DEFAULT_HIT_THRESHOLD, HitPolicy::Level)
    }
}

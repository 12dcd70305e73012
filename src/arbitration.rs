//! Arbitration between the two controls that set the active slot's rate.

use std::time::Duration;

use crate::config::ArbitrationPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Pad,
    Light,
}

/// Decides whether a rate update from one control may reach the sound.
#[derive(Debug, Clone)]
pub struct RateArbiter {
    policy: ArbitrationPolicy,
    last_write: Option<(RateSource, Duration)>,
}

impl RateArbiter {
    pub fn new(policy: ArbitrationPolicy) -> Self {
        Self {
            policy,
            last_write: None,
        }
    }

    pub fn policy(&self) -> ArbitrationPolicy {
        self.policy
    }

    pub fn last_writer(&self) -> Option<RateSource> {
        self.last_write.map(|(source, _)| source)
    }

    /// Whether an update from `source`, stamped `at`, should be applied.
    ///
    /// Under every policy an update older than the last accepted one is
    /// dropped, so late events never overwrite fresher ones.
    pub fn admit(
        &mut self,
        source: RateSource,
        at: Duration,
        pad_pressed: bool,
        sensor_active: bool,
    ) -> bool {
        if self.last_write.is_some_and(|(_, last)| at < last) {
            return false;
        }

        let allowed = match (self.policy, source) {
            (ArbitrationPolicy::LastWriterWins, _) => true,
            (ArbitrationPolicy::PadPriority, RateSource::Light) => !pad_pressed,
            (ArbitrationPolicy::LightPriority, RateSource::Pad) => !sensor_active,
            (ArbitrationPolicy::PadPriority, RateSource::Pad)
            | (ArbitrationPolicy::LightPriority, RateSource::Light) => true,
        };

        if allowed {
            self.last_write = Some((source, at));
        }
        allowed
    }

    /// Forget the last writer, e.g. when the active slot changes.
    pub fn reset(&mut self) {
        self.last_write = None;
    }
}

//! Status codes and haptic pulses fired on slot transitions.

use std::fmt;

/// Short code shown on the instrument's display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCode {
    Ready,
    Loading,
    UserReady,
    Cleared,
    Recording,
    Saving,
    MicReady,
    Error,
    Killed,
    Stopped,
    Locked,
    /// Label of the slot just selected.
    Slot(&'static str),
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            StatusCode::Ready => "RDY",
            StatusCode::Loading => "LOA",
            StatusCode::UserReady => "USR",
            StatusCode::Cleared => "CLR",
            StatusCode::Recording => "REC",
            StatusCode::Saving => "SAV",
            StatusCode::MicReady => "MIC",
            StatusCode::Error => "ERR",
            StatusCode::Killed => "KLL",
            StatusCode::Stopped => "STP",
            StatusCode::Locked => "LCK",
            StatusCode::Slot(label) => label,
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticKind {
    Success,
    Warning,
    Error,
    ImpactHeavy,
    ImpactMedium,
}

/// A display status plus an optional haptic pulse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub status: StatusCode,
    pub haptic: Option<HapticKind>,
}

impl Feedback {
    pub fn new(status: StatusCode, haptic: HapticKind) -> Self {
        Self {
            status,
            haptic: Some(haptic),
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            haptic: None,
        }
    }

    /// Failures only show `ERR`; no pulse.
    pub fn error() -> Self {
        Self::status(StatusCode::Error)
    }
}

/// Fire-and-forget receiver of feedback. Implementations must not block.
pub trait FeedbackSink {
    fn status(&mut self, status: &StatusCode);

    fn haptic(&mut self, kind: HapticKind);

    fn emit(&mut self, feedback: &Feedback) {
        self.status(&feedback.status);
        if let Some(kind) = feedback.haptic {
            self.haptic(kind);
        }
    }
}

/// Sink that only writes to the log, at debug level.
#[derive(Debug, Default)]
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn status(&mut self, status: &StatusCode) {
        log::debug!("status: {status}");
    }

    fn haptic(&mut self, kind: HapticKind) {
        log::debug!("haptic: {kind:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_display() {
        assert_eq!(StatusCode::Ready.to_string(), "RDY");
        assert_eq!(StatusCode::Killed.to_string(), "KLL");
        assert_eq!(StatusCode::Locked.to_string(), "LCK");
        assert_eq!(StatusCode::Slot("CICCIO").to_string(), "CICCIO");
    }

    #[test]
    fn test_emit_forwards_status_and_haptic() {
        let mut sink = crate::testing::RecordingSink::default();
        sink.emit(&Feedback::new(StatusCode::Killed, HapticKind::Error));
        sink.emit(&Feedback::error());
        assert_eq!(sink.statuses(), vec!["KLL", "ERR"]);
        assert_eq!(sink.haptics, vec![HapticKind::Error]);
    }
}

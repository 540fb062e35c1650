//! Per-request generation state machine.

use serde::Serialize;
use std::fmt;

/// `VALIDATING -> LOADING -> PREPROCESSING -> GENERATING -> POSTPROCESSING -> DONE`,
/// or `FAILED` from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Validating,
    Loading,
    Preprocessing,
    Generating,
    Postprocessing,
    Done,
    Failed,
}

impl Stage {
    /// Next stage on success. Terminal stages have none.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Validating => Some(Self::Loading),
            Self::Loading => Some(Self::Preprocessing),
            Self::Preprocessing => Some(Self::Generating),
            Self::Generating => Some(Self::Postprocessing),
            Self::Postprocessing => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "VALIDATING",
            Self::Loading => "LOADING",
            Self::Preprocessing => "PREPROCESSING",
            Self::Generating => "GENERATING",
            Self::Postprocessing => "POSTPROCESSING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks one request through [`Stage`]s and logs each transition.
#[derive(Debug)]
pub(crate) struct StageTracker<'a> {
    model: &'a str,
    current: Stage,
}

impl<'a> StageTracker<'a> {
    pub(crate) fn new(model: &'a str) -> Self {
        tracing::debug!(model, stage = %Stage::Validating, "Generation started");
        Self {
            model,
            current: Stage::Validating,
        }
    }

    pub(crate) fn current(&self) -> Stage {
        self.current
    }

    /// Move to the following stage.
    pub(crate) fn advance(&mut self) {
        if let Some(next) = self.current.next() {
            tracing::debug!(model = self.model, from = %self.current, to = %next, "Stage transition");
            self.current = next;
        }
    }

    /// Record a failure at the current stage and return that stage.
    pub(crate) fn fail(&mut self) -> Stage {
        let failed_at = self.current;
        if !failed_at.is_terminal() {
            self.current = Stage::Failed;
        }
        failed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_order() {
        let mut stage = Stage::Validating;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(
            seen,
            vec![
                Stage::Validating,
                Stage::Loading,
                Stage::Preprocessing,
                Stage::Generating,
                Stage::Postprocessing,
                Stage::Done
            ]
        );
        assert!(Stage::Failed.next().is_none());
    }

    #[test]
    fn test_tracker_fail_reports_stage() {
        let mut tracker = StageTracker::new("m");
        tracker.advance();
        tracker.advance();
        assert_eq!(tracker.fail(), Stage::Preprocessing);
        assert_eq!(tracker.current(), Stage::Failed);
    }

    #[test]
    fn test_stage_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Stage::Postprocessing).unwrap(), r#""POSTPROCESSING""#);
    }
}

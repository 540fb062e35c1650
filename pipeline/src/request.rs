//! Generation request - one caller's intent.

use crate::backend::SamplingParams;
use crate::chords::ChordProgression;
use crate::error::{PipelineError, Result};
use crate::types::TASK_CHORD_GEM;
use serde::{Deserialize, Serialize};

fn default_p() -> f32 {
    0.95
}

fn default_temperature() -> f32 {
    1.0
}

fn default_split_measure() -> u32 {
    999
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationRequest {
    /// Exact catalog name of the model to run
    pub model_type: String,

    /// Instrument programs, in track order
    pub program: Vec<u8>,

    pub tempo: u32,

    /// Task identifier; only meaningful for task-tuned models. Required,
    /// may be empty.
    pub task: String,

    #[serde(default = "default_p")]
    pub p: f32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub chord_item: Option<Vec<String>>,

    #[serde(default)]
    pub chord_times: Option<Vec<f64>>,

    #[serde(default = "default_split_measure")]
    pub split_measure: u32,
}

impl GenerationRequest {
    /// Request with defaults for everything but the model and programs.
    pub fn new(model_type: impl Into<String>, program: Vec<u8>, tempo: u32) -> Self {
        Self {
            model_type: model_type.into(),
            program,
            tempo,
            task: String::new(),
            p: default_p(),
            temperature: default_temperature(),
            chord_item: None,
            chord_times: None,
            split_measure: default_split_measure(),
        }
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    pub fn with_chords(mut self, items: Vec<String>, times: Vec<f64>) -> Self {
        self.chord_item = Some(items);
        self.chord_times = Some(times);
        self
    }

    /// Check field ranges before any stage runs.
    pub fn validate(&self) -> Result<()> {
        if self.model_type.trim().is_empty() {
            return Err(invalid("model_type", "must not be empty"));
        }
        if self.program.is_empty() {
            return Err(invalid("program", "at least one instrument program is required"));
        }
        if let Some(bad) = self.program.iter().find(|&&p| p > 127) {
            return Err(invalid("program", format!("{} is outside the MIDI program range 0..=127", bad)));
        }
        if self.tempo == 0 {
            return Err(invalid("tempo", "must be positive"));
        }
        if !(self.p > 0.0 && self.p <= 1.0) {
            return Err(invalid("p", format!("{} is outside (0, 1]", self.p)));
        }
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(invalid("temperature", format!("{} must be a positive number", self.temperature)));
        }
        if self.split_measure == 0 {
            return Err(invalid("split_measure", "must be positive"));
        }

        // Length mismatch is reported by the same check the encoder path uses
        self.chord_progression().map(|_| ())
    }

    /// Chord progression, when both parallel sequences are present.
    ///
    /// One side missing means "unconditioned", not an error.
    pub fn chord_progression(&self) -> Result<Option<ChordProgression>> {
        match (&self.chord_item, &self.chord_times) {
            (Some(items), Some(times)) => ChordProgression::from_parallel(items, times).map(Some),
            _ => Ok(None),
        }
    }

    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature,
            p: self.p,
            split_measure: self.split_measure,
        }
    }

    pub fn is_chord_task(&self) -> bool {
        self.task == TASK_CHORD_GEM
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> PipelineError {
    PipelineError::InvalidRequest {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let req: GenerationRequest =
            serde_json::from_str(r#"{"model_type": "MORTM4.1-SAX", "program": [0, 33], "tempo": 120, "task": ""}"#)
                .expect("Deserialization failed");

        assert_eq!(req.p, 0.95);
        assert_eq!(req.temperature, 1.0);
        assert_eq!(req.split_measure, 999);
        assert_eq!(req.task, "");
        assert!(req.chord_item.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_missing_task_rejected() {
        let result = serde_json::from_str::<GenerationRequest>(
            r#"{"model_type": "MORTM4.1Pro-SAX", "program": [0], "tempo": 120}"#,
        );
        let err = result.expect_err("request without task must not deserialize");
        assert!(err.to_string().contains("missing field `task`"), "{}", err);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = serde_json::from_str::<GenerationRequest>(
            r#"{"model_type": "m", "program": [0], "tempo": 120, "task": "", "seed": 7}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let base = GenerationRequest::new("m", vec![0], 120);

        let mut req = base.clone();
        req.p = 0.0;
        assert!(matches!(req.validate(), Err(PipelineError::InvalidRequest { field: "p", .. })));

        let mut req = base.clone();
        req.temperature = -1.0;
        assert!(matches!(req.validate(), Err(PipelineError::InvalidRequest { field: "temperature", .. })));

        let mut req = base.clone();
        req.program = vec![0, 200];
        assert!(matches!(req.validate(), Err(PipelineError::InvalidRequest { field: "program", .. })));

        let mut req = base.clone();
        req.tempo = 0;
        assert!(matches!(req.validate(), Err(PipelineError::InvalidRequest { field: "tempo", .. })));

        let mut req = base;
        req.model_type = "  ".into();
        assert!(matches!(req.validate(), Err(PipelineError::InvalidRequest { field: "model_type", .. })));
    }

    #[test]
    fn test_chord_lengths_must_match() {
        let req = GenerationRequest::new("m", vec![0], 120).with_chords(vec!["C".into(), "G".into()], vec![0.0]);
        assert!(matches!(
            req.validate(),
            Err(PipelineError::InvalidRequest { field: "chord_times", .. })
        ));
    }

    #[test]
    fn test_half_chord_data_is_unconditioned() {
        let mut req = GenerationRequest::new("m", vec![0], 120);
        req.chord_item = Some(vec!["C".into()]);

        assert!(req.validate().is_ok());
        assert!(req.chord_progression().unwrap().is_none());
    }
}

/// Pipeline kinds and file-name constants - NO string literals in routing!
///
/// `PipelineKind` is the behavior branch a loaded model runs; it is derived
/// from the descriptor's [`KindTag`] by the pipeline family.
use cadenza_registry::KindTag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token id produced by a model or a chord encoder.
pub type Token = u32;

/// Task identifier for chord extraction/generation (text transcript output).
pub const TASK_CHORD_GEM: &str = "CHORD_GEM";

/// Tonal center assumed when encoding chord-conditioning prompts.
pub const DEFAULT_TONAL_CENTER: &str = "C minor";

/// Canonical name of the accepted upload inside a save directory.
pub const INPUT_FILE: &str = "input.mid";

/// Canonical name of the generated performance.
pub const OUTPUT_FILE: &str = "output.mid";

/// Name of the chord transcript written for [`TASK_CHORD_GEM`].
pub const CHORD_OUTPUT_FILE: &str = "chord_output.txt";

/// Prefix of the raw backend output before it is renamed.
pub const RAW_OUTPUT_PREFIX: &str = "generated_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineKind {
    /// Unconditional continuation of the uploaded performance
    #[serde(rename = "pretrained")]
    Pretrained,

    /// Task-conditioned generation (optionally chord-conditioned)
    #[serde(rename = "task-tuned")]
    TaskTuned,
}

impl PipelineKind {
    /// Map a descriptor tag onto a pipeline kind.
    pub fn from_kind_tag(tag: &KindTag) -> Option<Self> {
        match tag {
            KindTag::Pretrained => Some(Self::Pretrained),
            KindTag::Sft => Some(Self::TaskTuned),
            KindTag::Other(_) | KindTag::Unspecified => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretrained => "pretrained",
            Self::TaskTuned => "task-tuned",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_tag() {
        assert_eq!(PipelineKind::from_kind_tag(&KindTag::Pretrained), Some(PipelineKind::Pretrained));
        assert_eq!(PipelineKind::from_kind_tag(&KindTag::Sft), Some(PipelineKind::TaskTuned));
        assert_eq!(PipelineKind::from_kind_tag(&KindTag::Other("lora".into())), None);
        assert_eq!(PipelineKind::from_kind_tag(&KindTag::Unspecified), None);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&PipelineKind::TaskTuned).expect("Serialization failed");
        assert_eq!(json, r#""task-tuned""#);
    }
}

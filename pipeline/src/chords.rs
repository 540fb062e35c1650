//! Chord progressions, tonal centers and the reference chord vocabulary.
//!
//! A progression arrives as two parallel sequences (labels and onset times in
//! seconds). Encoding it into a conditioning prompt is the job of a
//! [`ChordEncoder`]; the reference encoder here lays tokens out as
//!
//! ```text
//! KEY_<tonic><m?>  MEASURE_<n>  CHORD_<symbol>  CHORD_<symbol>  MEASURE_<n+1> ...
//! ```

use crate::backend::{ChordEncoder, Vocabulary};
use crate::error::{BackendError, PipelineError, Result};
use crate::types::Token;
use std::fmt;
use std::str::FromStr;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Assumed meter for measure arithmetic.
const BEATS_PER_MEASURE: f64 = 4.0;

// Reference vocabulary layout
const PITCH_BASE: Token = 0;
const CHORD_BASE: Token = 128;
const KEY_BASE: Token = 256;
const MEASURE_BASE: Token = 512;
const MAX_MEASURES: Token = 4096;

/// One chord onset.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordEvent {
    pub label: String,
    pub time: f64,
}

/// Ordered chord events built from parallel label/time sequences.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChordProgression {
    events: Vec<ChordEvent>,
}

impl ChordProgression {
    /// Pair labels with onset times; both sequences must have equal length.
    pub fn from_parallel(labels: &[String], times: &[f64]) -> Result<Self> {
        if labels.len() != times.len() {
            return Err(PipelineError::InvalidRequest {
                field: "chord_times",
                reason: format!(
                    "chord_item has {} entries but chord_times has {}",
                    labels.len(),
                    times.len()
                ),
            });
        }

        let events = labels
            .iter()
            .zip(times)
            .map(|(label, &time)| ChordEvent {
                label: label.clone(),
                time,
            })
            .collect();

        Ok(Self { events })
    }

    pub fn events(&self) -> &[ChordEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Parse a note name (`C`, `F#`, `Bb`) at the start of `s`.
///
/// Returns the pitch class and the unparsed remainder.
fn parse_pitch_class(s: &str) -> Option<(u8, &str)> {
    let mut chars = s.chars();
    let base = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    if let Some(rest) = rest.strip_prefix('#') {
        Some(((base + 1) % 12, rest))
    } else if let Some(rest) = rest.strip_prefix('b') {
        Some(((base + 11) % 12, rest))
    } else {
        Some((base, rest))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Major,
    Minor,
}

/// Tonal center used to key a chord-conditioning prompt, e.g. `C minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tonality {
    pub tonic: u8,
    pub mode: Mode,
}

impl FromStr for Tonality {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PipelineError::Preprocess(format!("invalid tonal center '{}'", s));

        let mut parts = s.split_whitespace();
        let (tonic, rest) = parts.next().and_then(parse_pitch_class).ok_or_else(invalid)?;
        if !rest.is_empty() {
            return Err(invalid());
        }

        let mode = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("major") => Mode::Major,
            Some("minor") => Mode::Minor,
            Some(_) => return Err(invalid()),
        };

        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { tonic, mode })
    }
}

impl fmt::Display for Tonality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            Mode::Major => "major",
            Mode::Minor => "minor",
        };
        write!(f, "{} {}", NOTE_NAMES[self.tonic as usize], mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
    Dominant7,
    Major7,
    Minor7,
    Diminished,
    Augmented,
    Sus4,
}

impl ChordQuality {
    const ALL: [ChordQuality; 8] = [
        Self::Major,
        Self::Minor,
        Self::Dominant7,
        Self::Major7,
        Self::Minor7,
        Self::Diminished,
        Self::Augmented,
        Self::Sus4,
    ];

    fn suffix(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Dominant7 => "7",
            Self::Major7 => "M7",
            Self::Minor7 => "m7",
            Self::Diminished => "dim",
            Self::Augmented => "aug",
            Self::Sus4 => "sus4",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" | "maj" => Some(Self::Major),
            "m" | "min" => Some(Self::Minor),
            "7" => Some(Self::Dominant7),
            "M7" | "maj7" => Some(Self::Major7),
            "m7" | "min7" => Some(Self::Minor7),
            "dim" => Some(Self::Diminished),
            "aug" | "+" => Some(Self::Augmented),
            "sus4" => Some(Self::Sus4),
            _ => None,
        }
    }

    fn index(&self) -> Token {
        Self::ALL.iter().position(|q| q == self).unwrap_or(0) as Token
    }
}

/// A parsed chord symbol such as `Am7` or `F#dim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordSymbol {
    pub root: u8,
    pub quality: ChordQuality,
}

impl ChordSymbol {
    fn token(&self) -> Token {
        CHORD_BASE + self.root as Token * ChordQuality::ALL.len() as Token + self.quality.index()
    }

    fn from_token(token: Token) -> Option<Self> {
        let offset = token.checked_sub(CHORD_BASE)?;
        let per_root = ChordQuality::ALL.len() as Token;
        let root = offset / per_root;
        if root >= 12 {
            return None;
        }
        Some(Self {
            root: root as u8,
            quality: ChordQuality::ALL[(offset % per_root) as usize],
        })
    }
}

impl FromStr for ChordSymbol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        let (root, suffix) =
            parse_pitch_class(s.trim()).ok_or_else(|| format!("unrecognised chord root in '{}'", s))?;
        let quality =
            ChordQuality::from_suffix(suffix).ok_or_else(|| format!("unrecognised chord quality in '{}'", s))?;
        Ok(Self { root, quality })
    }
}

impl fmt::Display for ChordSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NOTE_NAMES[self.root as usize], self.quality.suffix())
    }
}

/// Measure index of an onset at `tempo` BPM in 4/4.
fn measure_of(time: f64, tempo: u32) -> Token {
    let beats = time.max(0.0) * tempo as f64 / 60.0;
    (beats / BEATS_PER_MEASURE).floor() as Token
}

pub fn pitch_token(pitch: u8) -> Token {
    PITCH_BASE + (pitch & 0x7f) as Token
}

/// Reference chord encoder.
///
/// Drops chords whose measure is at or beyond `split_measure`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceChordEncoder;

impl ChordEncoder for ReferenceChordEncoder {
    fn encode(
        &self,
        progression: &ChordProgression,
        tonality: &Tonality,
        split_measure: u32,
        tempo: u32,
    ) -> std::result::Result<Vec<Token>, BackendError> {
        if tempo == 0 {
            return Err(BackendError::new("tempo must be positive"));
        }

        let minor_offset = match tonality.mode {
            Mode::Major => 0,
            Mode::Minor => 12,
        };
        let mut tokens = vec![KEY_BASE + minor_offset + tonality.tonic as Token];
        let mut current_measure = None;

        for event in progression.events() {
            let symbol: ChordSymbol = event.label.parse().map_err(BackendError::new)?;
            let measure = measure_of(event.time, tempo);
            if measure >= split_measure.min(MAX_MEASURES) {
                continue;
            }
            if current_measure != Some(measure) {
                tokens.push(MEASURE_BASE + measure);
                current_measure = Some(measure);
            }
            tokens.push(symbol.token());
        }

        Ok(tokens)
    }
}

/// Reference vocabulary matching [`ReferenceChordEncoder`] and pitch tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceVocabulary;

impl Vocabulary for ReferenceVocabulary {
    fn label(&self, token: Token) -> Option<String> {
        match token {
            t if t < CHORD_BASE => Some(format!("PITCH_{}", t - PITCH_BASE)),
            t if t < KEY_BASE => ChordSymbol::from_token(t).map(|c| format!("CHORD_{}", c)),
            t if t < KEY_BASE + 24 => {
                let offset = t - KEY_BASE;
                let suffix = if offset >= 12 { "m" } else { "" };
                Some(format!("KEY_{}{}", NOTE_NAMES[(offset % 12) as usize], suffix))
            }
            t if (MEASURE_BASE..MEASURE_BASE + MAX_MEASURES).contains(&t) => {
                Some(format!("MEASURE_{}", t - MEASURE_BASE))
            }
            _ => None,
        }
    }
}

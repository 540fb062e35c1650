//! Standard MIDI File helpers built on `midly`.

use crate::error::BackendError;
use midly::num::{u28, u4, u7};
use midly::{MidiMessage, Smf, TrackEvent, TrackEventKind};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// General MIDI percussion channel (zero-based).
pub const DRUM_CHANNEL: u8 = 9;

/// What a parsed performance contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceSummary {
    pub tracks: usize,
    pub notes: usize,
}

/// Parse `bytes` as a Standard MIDI File with at least one track.
pub fn validate_performance(bytes: &[u8]) -> Result<PerformanceSummary, BackendError> {
    let smf = Smf::parse(bytes)?;
    if smf.tracks.is_empty() {
        return Err(BackendError::new("performance has no tracks"));
    }

    let notes = smf
        .tracks
        .iter()
        .flatten()
        .filter(|event| is_sounding_note(&event.kind).is_some())
        .count();

    Ok(PerformanceSummary {
        tracks: smf.tracks.len(),
        notes,
    })
}

pub fn validate_performance_file(path: &Path) -> Result<PerformanceSummary, BackendError> {
    let bytes = fs::read(path)?;
    validate_performance(&bytes)
}

/// Pitches of every sounding note-on, track by track.
pub fn note_pitches(bytes: &[u8]) -> Result<Vec<u8>, BackendError> {
    let smf = Smf::parse(bytes)?;
    Ok(smf
        .tracks
        .iter()
        .flatten()
        .filter_map(|event| is_sounding_note(&event.kind))
        .collect())
}

/// Rewrite instrument programs and serialize the result.
///
/// Channel `c` plays `programs[c % programs.len()]`. The drum channel is left
/// alone. A channel that never selects a program gets a program change at the
/// start of its track.
pub fn reinstrument(bytes: &[u8], programs: &[u8]) -> Result<Vec<u8>, BackendError> {
    let mut smf = Smf::parse(bytes)?;

    if !programs.is_empty() {
        let program_for = |channel: u4| -> u7 {
            let index = channel.as_int() as usize % programs.len();
            u7::new(programs[index] & 0x7f)
        };

        for track in smf.tracks.iter_mut() {
            let mut used = BTreeSet::new();
            let mut assigned = BTreeSet::new();

            for event in track.iter_mut() {
                if let TrackEventKind::Midi { channel, message } = &mut event.kind {
                    if channel.as_int() == DRUM_CHANNEL {
                        continue;
                    }
                    used.insert(channel.as_int());
                    if let MidiMessage::ProgramChange { program } = message {
                        *program = program_for(*channel);
                        assigned.insert(channel.as_int());
                    }
                }
            }

            // Inserted at delta 0 so existing timing is unchanged
            let missing: Vec<TrackEvent<'_>> = used
                .difference(&assigned)
                .map(|&channel| {
                    let channel = u4::new(channel);
                    TrackEvent {
                        delta: u28::new(0),
                        kind: TrackEventKind::Midi {
                            channel,
                            message: MidiMessage::ProgramChange {
                                program: program_for(channel),
                            },
                        },
                    }
                })
                .collect();
            track.splice(0..0, missing);
        }
    }

    let mut out = Vec::with_capacity(bytes.len() + 16);
    smf.write_std(&mut out)?;
    Ok(out)
}

fn is_sounding_note(kind: &TrackEventKind<'_>) -> Option<u8> {
    match kind {
        TrackEventKind::Midi {
            message: MidiMessage::NoteOn { key, vel },
            ..
        } if vel.as_int() > 0 => Some(key.as_int()),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use midly::num::{u15, u28, u4, u7};
    use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

    fn midi(delta: u32, channel: u8, message: MidiMessage) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(channel),
                message,
            },
        }
    }

    /// Two-channel performance: a piano line on 0 (with a program change)
    /// and a bass line on 1 (without one), plus one drum hit.
    pub fn performance_bytes() -> Vec<u8> {
        let mut track = vec![midi(0, 0, MidiMessage::ProgramChange { program: u7::new(0) })];
        for (i, key) in [60u8, 64, 67].iter().enumerate() {
            let delta = if i == 0 { 0 } else { 120 };
            track.push(midi(delta, 0, MidiMessage::NoteOn { key: u7::new(*key), vel: u7::new(90) }));
            track.push(midi(240, 0, MidiMessage::NoteOff { key: u7::new(*key), vel: u7::new(0) }));
        }
        track.push(midi(0, 1, MidiMessage::NoteOn { key: u7::new(36), vel: u7::new(80) }));
        track.push(midi(480, 1, MidiMessage::NoteOn { key: u7::new(36), vel: u7::new(0) }));
        track.push(midi(0, 9, MidiMessage::NoteOn { key: u7::new(38), vel: u7::new(100) }));
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        let smf = Smf {
            header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(480))),
            tracks: vec![track],
        };
        let mut out = Vec::new();
        smf.write_std(&mut out).expect("Failed to serialize fixture");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::performance_bytes;
    use super::*;

    fn programs_by_channel(bytes: &[u8]) -> Vec<(u8, u8)> {
        let smf = Smf::parse(bytes).unwrap();
        smf.tracks
            .iter()
            .flatten()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::ProgramChange { program },
                } => Some((channel.as_int(), program.as_int())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_validate_counts_sounding_notes() {
        let summary = validate_performance(&performance_bytes()).unwrap();
        assert_eq!(summary.tracks, 1);
        // velocity-0 note-on is a note-off
        assert_eq!(summary.notes, 5);
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(validate_performance(b"not a midi file").is_err());
        assert!(validate_performance(&[]).is_err());
    }

    #[test]
    fn test_note_pitches_in_order() {
        assert_eq!(note_pitches(&performance_bytes()).unwrap(), vec![60, 64, 67, 36, 38]);
    }

    #[test]
    fn test_reinstrument_rewrites_and_inserts() {
        let out = reinstrument(&performance_bytes(), &[25, 33]).unwrap();
        let mut programs = programs_by_channel(&out);
        programs.sort();
        assert_eq!(programs, vec![(0, 25), (1, 33)]);

        // Notes survive untouched
        assert_eq!(note_pitches(&out).unwrap(), note_pitches(&performance_bytes()).unwrap());
    }

    #[test]
    fn test_reinstrument_cycles_programs() {
        let out = reinstrument(&performance_bytes(), &[40]).unwrap();
        let mut programs = programs_by_channel(&out);
        programs.sort();
        assert_eq!(programs, vec![(0, 40), (1, 40)]);
    }
}

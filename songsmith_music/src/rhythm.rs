// Rhythm patterns: one bar of on/off steps with per-step velocities.
//
// The step grid follows the meter. Quarter-note meters (x/4, x/2) are
// counted in eighths, so a bar has `numerator * 2` steps and every other
// step is a beat: 4/4 gives the classic eight-step backbeat with velocities
// 100, 80, 90, 85 on the beats and 60 on the offbeats. Eighth-note meters
// (x/8) have one step per eighth, grouped into pulses of three when the
// numerator divides by three (6/8 is 3+3) and otherwise into twos closed by
// a three (7/8 is 2+2+3). Only pulse starts sound.
//
// A pattern is per (genre, section category), not per bar; the renderer
// loops it across the section. `beats` and `velocities` always have the
// same, non-zero length.
//
// Depends on structure.rs for `SectionKind` and theory.rs for the meter.

use crate::genre::Genre;
use crate::structure::SectionKind;
use crate::theory::TimeSignature;
use serde::{Deserialize, Serialize};

const DOWNBEAT: u8 = 100;
const PULSE: u8 = 90;
const OFFBEAT: u8 = 60;
/// Velocities for quarter beats after the downbeat, cycled.
const BEAT_ACCENTS: [u8; 3] = [80, 90, 85];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RhythmPattern {
    /// `"{genre}_{section}"`, e.g. `"pop_Chorus"`.
    pub name: String,
    pub beats: Vec<bool>,
    pub velocities: Vec<u8>,
}

impl RhythmPattern {
    /// Steps per bar.
    pub fn steps(&self) -> usize {
        self.beats.len()
    }

    /// Number of sounding steps.
    pub fn hits(&self) -> usize {
        self.beats.iter().filter(|&&on| on).count()
    }

    pub fn is_well_formed(&self) -> bool {
        !self.beats.is_empty() && self.beats.len() == self.velocities.len()
    }
}

/// Pulse-group start offsets for an eighth-note meter of `steps` eighths.
fn eighth_groups(steps: usize) -> Vec<usize> {
    if steps < 4 {
        return vec![0];
    }
    if steps % 3 == 0 {
        return (0..steps).step_by(3).collect();
    }
    // Twos, with the last group stretched to three when the count is odd.
    let twos = if steps % 2 == 0 { steps / 2 } else { (steps - 3) / 2 };
    let mut starts: Vec<usize> = (0..twos).map(|g| g * 2).collect();
    if steps % 2 == 1 {
        starts.push(twos * 2);
    }
    starts
}

fn quarter_meter(numerator: usize) -> (Vec<bool>, Vec<u8>) {
    let steps = numerator * 2;
    let beats = (0..steps).map(|s| s % 2 == 0).collect();
    let velocities = (0..steps)
        .map(|s| match s {
            0 => DOWNBEAT,
            s if s % 2 == 0 => BEAT_ACCENTS[(s / 2 - 1) % BEAT_ACCENTS.len()],
            _ => OFFBEAT,
        })
        .collect();
    (beats, velocities)
}

fn eighth_meter(numerator: usize) -> (Vec<bool>, Vec<u8>) {
    let starts = eighth_groups(numerator);
    let beats = (0..numerator).map(|s| starts.contains(&s)).collect();
    let velocities = (0..numerator)
        .map(|s| match s {
            0 => DOWNBEAT,
            s if starts.contains(&s) => PULSE,
            _ => OFFBEAT,
        })
        .collect();
    (beats, velocities)
}

/// Whether this genre fills in the offbeats for a section.
fn drives_offbeats(genre: Genre, kind: SectionKind) -> bool {
    kind == SectionKind::Chorus && matches!(genre, Genre::Pop | Genre::Rock | Genre::Electronic)
}

/// One-bar pattern for `genre` in a section of `kind`.
pub fn generate_pattern(genre: &str, kind: SectionKind, time_signature: TimeSignature) -> RhythmPattern {
    let numerator = usize::from(time_signature.numerator.max(1));
    let (mut beats, velocities) = if time_signature.denominator == 8 {
        eighth_meter(numerator)
    } else {
        quarter_meter(numerator)
    };

    if drives_offbeats(Genre::from_name(genre), kind) {
        beats.iter_mut().for_each(|on| *on = true);
    }

    RhythmPattern {
        name: format!("{}_{}", genre.trim(), kind.name()),
        beats,
        velocities,
    }
}
